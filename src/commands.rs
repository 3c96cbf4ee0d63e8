//! Tauri IPC commands
//!
//! Thin wrappers over [`ComparisonService`](crate::application::ComparisonService):
//! parse the frontend's arguments, run, and map errors to strings. Progress
//! reaches the webview as Tauri events while a run is in flight.

use tauri::{AppHandle, State};
use tracing::{info, warn};

use crate::application::events::EventEmitter;
use crate::application::state::AppState;
use crate::domain::comparison::RecordStatus;
use crate::domain::entities::EntityKind;
use crate::domain::environment::Environment;
use crate::domain::errors::SyncEngineError;
use crate::domain::reports::{CompareReport, SyncReport};
use crate::types::frontend_api::{ComparisonRow, EnvironmentSettingsUpdate, EnvironmentSettingsView};

fn parse_kind(kind: &str) -> Result<EntityKind, String> {
    kind.parse()
}

fn parse_environment(environment: &str) -> Result<Environment, String> {
    environment.parse()
}

#[tauri::command(async)]
pub async fn compare_entities(
    app: AppHandle,
    state: State<'_, AppState>,
    kind: String,
) -> Result<CompareReport, String> {
    let kind = parse_kind(&kind)?;
    info!("Frontend requested compare of {}", kind.plural());

    let reporter = EventEmitter::new(app);
    state
        .service()
        .await
        .compare(kind, &reporter)
        .await
        .map_err(|e| e.to_string())
}

/// Incomplete syncs still resolve with their report; only setup failures reject
#[tauri::command(async)]
pub async fn sync_entities(
    app: AppHandle,
    state: State<'_, AppState>,
    kind: String,
    keys: Vec<String>,
    target: String,
) -> Result<SyncReport, String> {
    let kind = parse_kind(&kind)?;
    let target = parse_environment(&target)?;
    info!("Frontend requested sync of {} {} to {}", keys.len(), kind.plural(), target);

    let reporter = EventEmitter::new(app);
    match state.service().await.sync(kind, &keys, target, &reporter).await {
        Ok(report) => Ok(report),
        Err(SyncEngineError::SyncIncomplete(report)) => {
            warn!("{}", report.summary());
            Ok(report)
        }
        Err(e) => Err(e.to_string()),
    }
}

#[tauri::command(async)]
pub async fn get_comparisons(
    state: State<'_, AppState>,
    kind: String,
    status: Option<RecordStatus>,
) -> Result<Vec<ComparisonRow>, String> {
    let kind = parse_kind(&kind)?;
    let records = state
        .service()
        .await
        .comparisons(kind)
        .await
        .map_err(|e| e.to_string())?;

    Ok(records
        .into_iter()
        .map(ComparisonRow::from)
        .filter(|row| status.is_none_or(|wanted| row.status == wanted))
        .collect())
}

#[tauri::command(async)]
pub async fn get_comparison(
    state: State<'_, AppState>,
    kind: String,
    key: String,
) -> Result<Option<ComparisonRow>, String> {
    let kind = parse_kind(&kind)?;
    let record = state
        .service()
        .await
        .comparison(kind, &key)
        .await
        .map_err(|e| e.to_string())?;
    Ok(record.map(ComparisonRow::from))
}

#[tauri::command(async)]
pub async fn clear_comparisons(state: State<'_, AppState>, kind: String) -> Result<(), String> {
    let kind = parse_kind(&kind)?;
    state.service().await.clear(kind).await.map_err(|e| e.to_string())
}

#[tauri::command(async)]
pub async fn get_environment_settings(state: State<'_, AppState>) -> Result<Vec<EnvironmentSettingsView>, String> {
    let config = state.config().await;
    Ok(Environment::ALL
        .into_iter()
        .map(|environment| EnvironmentSettingsView::from_config(environment, &config))
        .collect())
}

#[tauri::command(async)]
pub async fn update_environment_settings(
    state: State<'_, AppState>,
    environment: String,
    settings: EnvironmentSettingsUpdate,
) -> Result<EnvironmentSettingsView, String> {
    let environment = parse_environment(&environment)?;
    let config = state
        .update_environment(environment, settings.into())
        .await
        .map_err(|e| format!("Failed to update {environment} settings: {e:#}"))?;
    Ok(EnvironmentSettingsView::from_config(environment, &config))
}
