use request_desk_lib::analytics::{self, AnalyticsQuery, MonthKey};
use request_desk_lib::models::{NewRequestPayload, RequestPatch, RequestStatus, RequestView, ServiceRequest};
use request_desk_lib::{AppError, DeskCore};

fn payload(name: &str) -> NewRequestPayload {
    NewRequestPayload {
        name: name.to_string(),
        city: "Zaporizhzhia".to_string(),
        request_type: "Technical support".to_string(),
        status: RequestStatus::New,
    }
}

fn fixed(id: &str, name: &str, status: RequestStatus, created_at: &str) -> ServiceRequest {
    ServiceRequest {
        id: id.to_string(),
        name: name.to_string(),
        city: "Dnipro".to_string(),
        request_type: "Complaint".to_string(),
        status,
        created_at: created_at.to_string(),
        archived: None,
        extra: Default::default(),
    }
}

#[tokio::test]
async fn channel_client_runs_all_operations() {
    let root = tempfile::tempdir().expect("temp data dir");
    let core = DeskCore::new(root.path().to_path_buf()).expect("core");
    let (client, host) = core.channel_client();
    let serving = tokio::spawn(host.serve());

    let created = client.add_request(payload("A")).await.expect("add");
    let updated = client
        .update_request(&created.id, RequestPatch::status(RequestStatus::Completed))
        .await
        .expect("update")
        .expect("request exists");
    assert_eq!(updated.archived, Some(true));

    let missing = client
        .update_request("missing", RequestPatch::status(RequestStatus::New))
        .await
        .expect("update");
    assert!(missing.is_none());

    client.save_requests(vec![updated.clone()]).await.expect("save");
    assert_eq!(client.get_requests().await.expect("get"), vec![updated.clone()]);

    assert!(client.remove_request(&updated.id).await.expect("remove"));
    assert!(client.remove_request(&updated.id).await.expect("remove again"));
    assert!(client.get_requests().await.expect("get").is_empty());

    drop(client);
    serving.await.expect("host exits once callers are gone");
}

#[tokio::test]
async fn concurrent_callers_are_served_in_turn() {
    let root = tempfile::tempdir().expect("temp data dir");
    let core = DeskCore::new(root.path().to_path_buf()).expect("core");
    let (client, host) = core.channel_client();
    tokio::spawn(host.serve());

    let mut handles = Vec::new();
    for index in 0..8 {
        let client = client.clone();
        handles.push(tokio::spawn(async move {
            client.add_request(payload(&format!("caller-{}", index))).await
        }));
    }
    for handle in handles {
        handle.await.expect("join").expect("add");
    }

    assert_eq!(client.get_requests().await.expect("get").len(), 8);
}

#[tokio::test]
async fn missing_host_reports_transport_unavailable() {
    let root = tempfile::tempdir().expect("temp data dir");
    let core = DeskCore::new(root.path().to_path_buf()).expect("core");
    let (client, host) = core.channel_client();
    drop(host);

    let error = client.add_request(payload("A")).await.expect_err("no host");
    assert!(matches!(error, AppError::TransportUnavailable(_)));
    assert!(!root.path().join("requests.json").exists());
}

#[tokio::test]
async fn read_side_projects_records_fetched_over_the_channel() {
    let root = tempfile::tempdir().expect("temp data dir");
    let core = DeskCore::new(root.path().to_path_buf()).expect("core");
    let (client, host) = core.channel_client();
    tokio::spawn(host.serve());

    let open = fixed("1", "open", RequestStatus::New, "02.03.2026");
    let done = fixed("2", "done", RequestStatus::New, "15.03.2026");
    client.save_requests(vec![open.clone(), done.clone()]).await.expect("save");
    client
        .update_request(&done.id, RequestPatch::status(RequestStatus::Completed))
        .await
        .expect("update")
        .expect("request exists");

    let records = client.get_requests().await.expect("get");
    assert_eq!(analytics::view(&records, RequestView::All), vec![open]);
    assert_eq!(analytics::stats(&records).archived, 1);

    let month = MonthKey::new(2026, 3).expect("month");
    let report = core.analytics_of(&records, AnalyticsQuery::Month { month }, 1);
    assert_eq!(report.stats.total, 2);
    assert_eq!(report.archived.total, 1);

    let export = core.export_records(&records).expect("export");
    assert!(export.path.ends_with("requests.xlsx"));
    let bytes = std::fs::read(&export.path).expect("workbook written");
    assert!(bytes.starts_with(b"PK"));
}
