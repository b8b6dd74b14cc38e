use crate::errors::{AppError, AppResult};
use crate::models::{NewRequestPayload, RequestPatch, ServiceRequest};
use crate::service::RequestService;
use serde::{Deserialize, Serialize};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::{mpsc, oneshot};
use uuid::Uuid;

/// Operations the UI may invoke, named as they travel over the wire.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "op", content = "args", rename_all = "kebab-case")]
pub enum BridgeCall {
    GetRequests,
    SaveRequests { requests: Vec<ServiceRequest> },
    AddRequest { request: NewRequestPayload },
    UpdateRequest { id: String, updates: RequestPatch },
    RemoveRequest { id: String },
}

impl BridgeCall {
    pub fn name(&self) -> &'static str {
        match self {
            Self::GetRequests => "get-requests",
            Self::SaveRequests { .. } => "save-requests",
            Self::AddRequest { .. } => "add-request",
            Self::UpdateRequest { .. } => "update-request",
            Self::RemoveRequest { .. } => "remove-request",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", content = "value", rename_all = "camelCase")]
pub enum BridgeReply {
    Requests(Vec<ServiceRequest>),
    Saved,
    Created(ServiceRequest),
    Updated(Option<ServiceRequest>),
    Removed(bool),
}

impl BridgeReply {
    fn kind(&self) -> &'static str {
        match self {
            Self::Requests(_) => "requests",
            Self::Saved => "saved",
            Self::Created(_) => "created",
            Self::Updated(_) => "updated",
            Self::Removed(_) => "removed",
        }
    }
}

pub fn dispatch(service: &RequestService, call: BridgeCall) -> AppResult<BridgeReply> {
    match call {
        BridgeCall::GetRequests => service.list().map(BridgeReply::Requests),
        BridgeCall::SaveRequests { requests } => service.replace_all(requests).map(|_| BridgeReply::Saved),
        BridgeCall::AddRequest { request } => service.create(request).map(BridgeReply::Created),
        BridgeCall::UpdateRequest { id, updates } => service.update(&id, updates).map(BridgeReply::Updated),
        BridgeCall::RemoveRequest { id } => service.remove(&id).map(BridgeReply::Removed),
    }
}

pub trait Bridge: Send + Sync {
    fn call(&self, call: BridgeCall) -> impl Future<Output = AppResult<BridgeReply>> + Send;
}

/// Calls the service directly on the caller's task.
#[derive(Debug, Clone)]
pub struct LocalBridge {
    service: Arc<RequestService>,
}

impl LocalBridge {
    pub fn new(service: Arc<RequestService>) -> Self {
        Self { service }
    }
}

impl Bridge for LocalBridge {
    fn call(&self, call: BridgeCall) -> impl Future<Output = AppResult<BridgeReply>> + Send {
        let service = Arc::clone(&self.service);
        async move { dispatch(&service, call) }
    }
}

#[derive(Debug)]
struct BridgeEnvelope {
    call_id: Uuid,
    call: BridgeCall,
    reply: oneshot::Sender<AppResult<BridgeReply>>,
}

/// Caller half of the message-passing transport.
#[derive(Debug, Clone)]
pub struct ChannelBridge {
    sender: mpsc::Sender<BridgeEnvelope>,
}

impl Bridge for ChannelBridge {
    fn call(&self, call: BridgeCall) -> impl Future<Output = AppResult<BridgeReply>> + Send {
        let sender = self.sender.clone();
        async move {
            let call_id = Uuid::new_v4();
            let op = call.name();
            let (reply, receiver) = oneshot::channel();
            if sender.send(BridgeEnvelope { call_id, call, reply }).await.is_err() {
                return Err(AppError::TransportUnavailable(format!(
                    "bridge host is not running ({})",
                    op
                )));
            }
            match receiver.await {
                Ok(result) => result,
                Err(_) => Err(AppError::TransportUnavailable(format!(
                    "bridge host dropped {} call {}",
                    op, call_id
                ))),
            }
        }
    }
}

/// Owner half of the transport. Handles one call at a time, in arrival order.
#[derive(Debug)]
pub struct BridgeHost {
    service: Arc<RequestService>,
    receiver: mpsc::Receiver<BridgeEnvelope>,
}

pub fn channel(service: Arc<RequestService>, capacity: usize) -> (ChannelBridge, BridgeHost) {
    let (sender, receiver) = mpsc::channel(capacity.max(1));
    (ChannelBridge { sender }, BridgeHost { service, receiver })
}

impl BridgeHost {
    pub async fn serve(mut self) {
        while let Some(envelope) = self.receiver.recv().await {
            let BridgeEnvelope { call_id, call, reply } = envelope;
            let op = call.name();
            tracing::debug!(call_id = %call_id, op, "bridge call received");

            let service = Arc::clone(&self.service);
            let result = match tokio::task::spawn_blocking(move || dispatch(&service, call)).await {
                Ok(result) => result,
                Err(error) => Err(AppError::Internal(format!("{} handler panicked: {}", op, error))),
            };
            if let Err(error) = &result {
                tracing::warn!(call_id = %call_id, op, error = %error, "bridge call failed");
            }
            if reply.send(result).is_err() {
                tracing::debug!(call_id = %call_id, op, "bridge caller went away before reply");
            }
        }
        tracing::info!("bridge host stopped");
    }
}

/// Typed consumer view of the five bridge operations.
#[derive(Debug, Clone)]
pub struct RequestClient<B> {
    bridge: B,
}

impl<B: Bridge> RequestClient<B> {
    pub fn new(bridge: B) -> Self {
        Self { bridge }
    }

    pub async fn get_requests(&self) -> AppResult<Vec<ServiceRequest>> {
        match self.bridge.call(BridgeCall::GetRequests).await? {
            BridgeReply::Requests(requests) => Ok(requests),
            other => Err(unexpected_reply("get-requests", &other)),
        }
    }

    pub async fn save_requests(&self, requests: Vec<ServiceRequest>) -> AppResult<()> {
        match self.bridge.call(BridgeCall::SaveRequests { requests }).await? {
            BridgeReply::Saved => Ok(()),
            other => Err(unexpected_reply("save-requests", &other)),
        }
    }

    pub async fn add_request(&self, request: NewRequestPayload) -> AppResult<ServiceRequest> {
        match self.bridge.call(BridgeCall::AddRequest { request }).await? {
            BridgeReply::Created(request) => Ok(request),
            other => Err(unexpected_reply("add-request", &other)),
        }
    }

    pub async fn update_request(&self, id: &str, updates: RequestPatch) -> AppResult<Option<ServiceRequest>> {
        let call = BridgeCall::UpdateRequest {
            id: id.to_string(),
            updates,
        };
        match self.bridge.call(call).await? {
            BridgeReply::Updated(request) => Ok(request),
            other => Err(unexpected_reply("update-request", &other)),
        }
    }

    pub async fn remove_request(&self, id: &str) -> AppResult<bool> {
        match self.bridge.call(BridgeCall::RemoveRequest { id: id.to_string() }).await? {
            BridgeReply::Removed(success) => Ok(success),
            other => Err(unexpected_reply("remove-request", &other)),
        }
    }
}

fn unexpected_reply(op: &str, reply: &BridgeReply) -> AppError {
    AppError::Internal(format!("{} answered with a {} reply", op, reply.kind()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RequestStatus;
    use crate::store::RecordStore;

    fn temp_service() -> (tempfile::TempDir, Arc<RequestService>) {
        let root = tempfile::tempdir().expect("temp data dir");
        let service = RequestService::new(RecordStore::new(root.path().join("requests.json")));
        (root, Arc::new(service))
    }

    struct FixedBridge(BridgeReply);

    impl Bridge for FixedBridge {
        fn call(&self, _call: BridgeCall) -> impl Future<Output = AppResult<BridgeReply>> + Send {
            let reply = self.0.clone();
            async move { Ok(reply) }
        }
    }

    #[test]
    fn calls_use_dashed_operation_names() {
        let value = serde_json::to_value(BridgeCall::UpdateRequest {
            id: "42".to_string(),
            updates: RequestPatch::status(RequestStatus::Completed),
        })
        .expect("serialize call");
        assert_eq!(value["op"], "update-request");
        assert_eq!(value["args"]["id"], "42");
        assert_eq!(value["args"]["updates"]["status"], "completed");

        let call: BridgeCall = serde_json::from_value(serde_json::json!({ "op": "get-requests" })).expect("parse call");
        assert_eq!(call, BridgeCall::GetRequests);
    }

    #[test]
    fn dispatch_maps_each_operation() {
        let (_root, service) = temp_service();
        let created = match dispatch(
            &service,
            BridgeCall::AddRequest {
                request: NewRequestPayload {
                    name: "A".to_string(),
                    city: "Kyiv".to_string(),
                    request_type: "General".to_string(),
                    status: RequestStatus::New,
                },
            },
        )
        .expect("add")
        {
            BridgeReply::Created(request) => request,
            other => panic!("unexpected reply {:?}", other),
        };

        let missing = dispatch(
            &service,
            BridgeCall::UpdateRequest {
                id: "nope".to_string(),
                updates: RequestPatch::default(),
            },
        )
        .expect("update");
        assert_eq!(missing, BridgeReply::Updated(None));

        let removed = dispatch(&service, BridgeCall::RemoveRequest { id: created.id }).expect("remove");
        assert_eq!(removed, BridgeReply::Removed(true));
        assert_eq!(
            dispatch(&service, BridgeCall::GetRequests).expect("get"),
            BridgeReply::Requests(Vec::new())
        );
    }

    #[tokio::test]
    async fn local_bridge_round_trips_through_client() {
        let (_root, service) = temp_service();
        let client = RequestClient::new(LocalBridge::new(service));
        let created = client
            .add_request(NewRequestPayload {
                name: "B".to_string(),
                city: "Lviv".to_string(),
                request_type: "Complaint".to_string(),
                status: RequestStatus::InProgress,
            })
            .await
            .expect("add");
        let listed = client.get_requests().await.expect("get");
        assert_eq!(listed, vec![created]);
    }

    #[tokio::test]
    async fn host_dropping_reply_is_transport_unavailable() {
        let (_root, service) = temp_service();
        let (bridge, mut host) = channel(service, 1);
        let host_task = tokio::spawn(async move {
            let envelope = host.receiver.recv().await.expect("one call");
            assert_eq!(envelope.call, BridgeCall::GetRequests);
            drop(envelope);
        });

        let error = RequestClient::new(bridge).get_requests().await.expect_err("no reply");
        host_task.await.expect("host task");
        assert!(matches!(error, AppError::TransportUnavailable(_)));
        assert!(error.to_string().contains("dropped get-requests call"));
    }

    #[tokio::test]
    async fn mismatched_reply_is_internal_error() {
        let client = RequestClient::new(FixedBridge(BridgeReply::Saved));
        let error = client.get_requests().await.expect_err("wrong reply kind");
        assert!(matches!(error, AppError::Internal(_)));
        assert!(error.to_string().contains("saved"));
    }
}
