//! Writes the TypeScript bindings of the frontend API types
//!
//! Usage: `ts_export [out_dir]` (default `bindings/`)

use std::path::PathBuf;

use anyhow::{Context, Result};
use store_sync_lib::domain::comparison::{ComparisonRecord, RecordStatus};
use store_sync_lib::domain::entities::EntityKind;
use store_sync_lib::domain::environment::{Environment, SyncDirection};
use store_sync_lib::domain::errors::FailureCategory;
use store_sync_lib::domain::reports::{CompareReport, KeyFailure, ProgressUpdate, SyncReport};
use store_sync_lib::types::frontend_api::{ComparisonRow, EnvironmentSettingsUpdate, EnvironmentSettingsView};
use ts_rs::TS;

fn export<T: TS + 'static>(out_dir: &PathBuf) -> Result<()> {
    T::export_all_to(out_dir).with_context(|| format!("Failed to export {}", T::name()))?;
    println!("exported {}", T::name());
    Ok(())
}

fn main() -> Result<()> {
    let out_dir = std::env::args()
        .nth(1)
        .map_or_else(|| PathBuf::from("bindings"), PathBuf::from);

    export::<EntityKind>(&out_dir)?;
    export::<Environment>(&out_dir)?;
    export::<SyncDirection>(&out_dir)?;
    export::<RecordStatus>(&out_dir)?;
    export::<ComparisonRecord>(&out_dir)?;
    export::<FailureCategory>(&out_dir)?;
    export::<KeyFailure>(&out_dir)?;
    export::<CompareReport>(&out_dir)?;
    export::<SyncReport>(&out_dir)?;
    export::<ProgressUpdate>(&out_dir)?;
    export::<ComparisonRow>(&out_dir)?;
    export::<EnvironmentSettingsView>(&out_dir)?;
    export::<EnvironmentSettingsUpdate>(&out_dir)?;

    println!("TypeScript bindings written to {}", out_dir.display());
    Ok(())
}
