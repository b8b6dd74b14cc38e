pub mod analytics;
pub mod bridge;
pub mod config;
pub mod desk;
pub mod errors;
pub mod export;
pub mod models;
pub mod service;
pub mod store;

pub use crate::desk::DeskCore;
pub use crate::errors::{AppError, AppResult};

use std::path::Path;
use tracing_appender::non_blocking::WorkerGuard;

static LOG_GUARD: std::sync::OnceLock<WorkerGuard> = std::sync::OnceLock::new();

/// JSON logs to `<data dir>/logs/requests.log`, rotated daily. `RUST_LOG`
/// wins over `default_filter`.
pub fn init_tracing(app_data_dir: &Path, default_filter: &str) -> Result<(), String> {
    let log_dir = app_data_dir.join("logs");
    std::fs::create_dir_all(&log_dir).map_err(|error| error.to_string())?;
    let file_appender = tracing_appender::rolling::daily(log_dir, "requests.log");
    let (non_blocking, guard) = tracing_appender::non_blocking(file_appender);
    let _ = LOG_GUARD.set(guard);

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .or_else(|_| tracing_subscriber::EnvFilter::try_new(default_filter))
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info")),
        )
        .json()
        .with_writer(non_blocking)
        .try_init()
        .map_err(|error| error.to_string())
}

pub fn to_client_error(error: impl std::fmt::Display) -> String {
    error.to_string()
}

#[cfg(feature = "desktop")]
mod desktop {
    use crate::analytics::{self, AnalyticsQuery};
    use crate::bridge::{ChannelBridge, RequestClient};
    use crate::config::AppConfig;
    use crate::models::{
        AnalyticsReport, ExportResponse, NewRequestPayload, RequestPatch, RequestStats, RequestView,
        ServiceRequest,
    };
    use crate::{init_tracing, to_client_error, DeskCore};
    use tauri::Manager;

    struct AppState {
        core: DeskCore,
        client: RequestClient<ChannelBridge>,
    }

    #[tauri::command]
    async fn get_requests(state: tauri::State<'_, AppState>) -> Result<Vec<ServiceRequest>, String> {
        state.client.get_requests().await.map_err(to_client_error)
    }

    #[tauri::command]
    async fn save_requests(state: tauri::State<'_, AppState>, requests: Vec<ServiceRequest>) -> Result<(), String> {
        state.client.save_requests(requests).await.map_err(to_client_error)
    }

    #[tauri::command]
    async fn add_request(
        state: tauri::State<'_, AppState>,
        request: NewRequestPayload,
    ) -> Result<ServiceRequest, String> {
        state.client.add_request(request).await.map_err(to_client_error)
    }

    #[tauri::command]
    async fn update_request(
        state: tauri::State<'_, AppState>,
        id: String,
        updates: RequestPatch,
    ) -> Result<Option<ServiceRequest>, String> {
        state.client.update_request(&id, updates).await.map_err(to_client_error)
    }

    #[tauri::command]
    async fn remove_request(state: tauri::State<'_, AppState>, id: String) -> Result<bool, String> {
        state.client.remove_request(&id).await.map_err(to_client_error)
    }

    // Read-side commands fetch through the bridge host so they never race a
    // host write; the projection itself runs on the command task.
    #[tauri::command]
    async fn requests_view(
        state: tauri::State<'_, AppState>,
        view: RequestView,
    ) -> Result<Vec<ServiceRequest>, String> {
        let records = state.client.get_requests().await.map_err(to_client_error)?;
        Ok(analytics::view(&records, view))
    }

    #[tauri::command]
    async fn requests_stats(state: tauri::State<'_, AppState>) -> Result<RequestStats, String> {
        let records = state.client.get_requests().await.map_err(to_client_error)?;
        Ok(analytics::stats(&records))
    }

    #[tauri::command]
    async fn requests_analytics(
        state: tauri::State<'_, AppState>,
        query: AnalyticsQuery,
        page: Option<usize>,
    ) -> Result<AnalyticsReport, String> {
        let records = state.client.get_requests().await.map_err(to_client_error)?;
        Ok(state.core.analytics_of(&records, query, page.unwrap_or(1)))
    }

    #[tauri::command]
    async fn export_requests(state: tauri::State<'_, AppState>) -> Result<ExportResponse, String> {
        let records = state.client.get_requests().await.map_err(to_client_error)?;
        state.core.export_records(&records).map_err(to_client_error)
    }

    pub fn run() {
        tauri::Builder::default()
            .setup(|app| {
                let app_data_dir = app.path().app_data_dir().map_err(|error| error.to_string())?;
                std::fs::create_dir_all(&app_data_dir).map_err(|error| error.to_string())?;
                let config = AppConfig::load(&app_data_dir);
                init_tracing(&app_data_dir, &config.log_filter)?;

                let core = DeskCore::with_config(app_data_dir, config).map_err(|error| error.to_string())?;
                let (client, host) = core.channel_client();
                tauri::async_runtime::spawn(host.serve());

                app.manage(AppState { core, client });
                Ok(())
            })
            .invoke_handler(tauri::generate_handler![
                get_requests,
                save_requests,
                add_request,
                update_request,
                remove_request,
                requests_view,
                requests_stats,
                requests_analytics,
                export_requests
            ])
            .run(tauri::generate_context!())
            .expect("failed to run tauri app");
    }
}

#[cfg(feature = "desktop")]
pub use crate::desktop::run;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_errors_keep_their_code_prefix() {
        let message = to_client_error(AppError::TransportUnavailable("host gone".to_string()));
        assert_eq!(message, "TRANSPORT_UNAVAILABLE: host gone");
    }
}
