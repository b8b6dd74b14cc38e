use crate::analytics::{self, AnalyticsQuery};
use crate::bridge::{self, BridgeHost, ChannelBridge, LocalBridge, RequestClient};
use crate::config::AppConfig;
use crate::errors::AppResult;
use crate::export;
use crate::models::{
    AnalyticsReport, ExportResponse, NewRequestPayload, RequestPatch, RequestStats, RequestView, ServiceRequest,
};
use crate::service::RequestService;
use crate::store::RecordStore;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Everything the privileged side owns: config, the request service and the
/// data directory the store and exports live in.
#[derive(Debug, Clone)]
pub struct DeskCore {
    config: AppConfig,
    service: Arc<RequestService>,
    app_data_dir: PathBuf,
}

impl DeskCore {
    pub fn new(app_data_dir: PathBuf) -> AppResult<Self> {
        let config = AppConfig::load(&app_data_dir);
        Self::with_config(app_data_dir, config)
    }

    pub fn with_config(app_data_dir: PathBuf, config: AppConfig) -> AppResult<Self> {
        std::fs::create_dir_all(&app_data_dir)?;
        let store = RecordStore::new(config.data_file(&app_data_dir));
        let service = if config.strict_storage {
            RequestService::strict(store)
        } else {
            RequestService::new(store)
        };
        tracing::info!(
            path = %service.store().path().display(),
            strict = config.strict_storage,
            "request store ready"
        );

        Ok(Self {
            config,
            service: Arc::new(service),
            app_data_dir,
        })
    }

    pub fn config(&self) -> &AppConfig {
        &self.config
    }

    pub fn app_data_dir(&self) -> &Path {
        &self.app_data_dir
    }

    pub fn service(&self) -> Arc<RequestService> {
        Arc::clone(&self.service)
    }

    pub fn local_client(&self) -> RequestClient<LocalBridge> {
        RequestClient::new(LocalBridge::new(self.service()))
    }

    /// Client plus the host that must be spawned to serve it.
    pub fn channel_client(&self) -> (RequestClient<ChannelBridge>, BridgeHost) {
        let (bridge, host) = bridge::channel(self.service(), self.config.bridge_capacity);
        (RequestClient::new(bridge), host)
    }

    pub fn list(&self) -> AppResult<Vec<ServiceRequest>> {
        self.service.list()
    }

    pub fn replace_all(&self, records: Vec<ServiceRequest>) -> AppResult<()> {
        self.service.replace_all(records)
    }

    pub fn create(&self, payload: NewRequestPayload) -> AppResult<ServiceRequest> {
        self.service.create(payload)
    }

    pub fn update(&self, id: &str, patch: RequestPatch) -> AppResult<Option<ServiceRequest>> {
        self.service.update(id, patch)
    }

    pub fn remove(&self, id: &str) -> AppResult<bool> {
        self.service.remove(id)
    }

    pub fn view(&self, view: RequestView) -> AppResult<Vec<ServiceRequest>> {
        Ok(analytics::view(&self.service.list()?, view))
    }

    pub fn stats(&self) -> AppResult<RequestStats> {
        Ok(analytics::stats(&self.service.list()?))
    }

    pub fn analytics(&self, query: AnalyticsQuery, page: usize) -> AppResult<AnalyticsReport> {
        Ok(self.analytics_of(&self.service.list()?, query, page))
    }

    /// Analytics over records the caller already fetched, e.g. through the bridge.
    pub fn analytics_of(&self, records: &[ServiceRequest], query: AnalyticsQuery, page: usize) -> AnalyticsReport {
        analytics::report(records, query, page, self.config.archive_page_size)
    }

    pub fn export_requests(&self) -> AppResult<ExportResponse> {
        self.export_records(&self.service.list()?)
    }

    pub fn export_records(&self, records: &[ServiceRequest]) -> AppResult<ExportResponse> {
        let workbook = export::group_by_month(records);
        export::write_workbook(&self.app_data_dir.join("exports"), &workbook)
    }
}
