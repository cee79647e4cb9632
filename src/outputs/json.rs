//! JSON file helpers.
//!
//! Every data file this crate produces is pretty-printed so it can be
//! diffed and inspected by hand.

use serde::Serialize;
use serde::de::DeserializeOwned;
use std::error::Error;
use std::path::Path;
use tokio::fs;
use tracing::{error, info, instrument};

/// Serialize `value` as pretty JSON into `path`, creating parent directories.
#[instrument(level = "debug", skip_all, fields(path = %path.display()))]
pub async fn write_pretty<T: Serialize + ?Sized>(path: &Path, value: &T) -> Result<(), Box<dyn Error>> {
    let json = serde_json::to_string_pretty(value)?;
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        if let Err(e) = fs::create_dir_all(parent).await {
            error!(dir = %parent.display(), error = %e, "Failed to create JSON dir");
            return Err(e.into());
        }
    }
    fs::write(path, json).await?;
    info!(path = %path.display(), "Wrote JSON file");
    Ok(())
}

/// Read and deserialize a JSON file.
pub async fn read<T: DeserializeOwned>(path: &Path) -> Result<T, Box<dyn Error>> {
    let text = fs::read_to_string(path)
        .await
        .map_err(|e| format!("cannot read {}: {e}", path.display()))?;
    let value = serde_json::from_str(&text).map_err(|e| format!("cannot parse {}: {e}", path.display()))?;
    Ok(value)
}
