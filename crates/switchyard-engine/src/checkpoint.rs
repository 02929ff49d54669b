//! Walker-state persistence for audit and post-mortem inspection.
//!
//! A walk that ends in `error` keeps every step recorded before the failure.
//! [`save_state`] writes that record to `<dir>/walker-state.json`.

use std::path::{Path, PathBuf};

use switchyard_types::{Result, WalkerState};

pub const STATE_FILE: &str = "walker-state.json";

/// Writes the state, creating `dir` if needed. Returns the file path.
pub async fn save_state(state: &WalkerState, dir: &Path) -> Result<PathBuf> {
    tokio::fs::create_dir_all(dir).await?;
    let path = dir.join(STATE_FILE);
    let json = serde_json::to_string_pretty(state)?;
    tokio::fs::write(&path, json).await?;
    tracing::debug!(path = %path.display(), walker = %state.id, "Walker state saved");
    Ok(path)
}

/// Returns `Ok(None)` when nothing has been saved in `dir`.
pub async fn load_state(dir: &Path) -> Result<Option<WalkerState>> {
    let path = dir.join(STATE_FILE);
    if !tokio::fs::try_exists(&path).await? {
        return Ok(None);
    }
    let json = tokio::fs::read_to_string(&path).await?;
    let state: WalkerState = serde_json::from_str(&json)?;
    Ok(Some(state))
}

pub async fn clear_state(dir: &Path) -> Result<()> {
    let path = dir.join(STATE_FILE);
    if tokio::fs::try_exists(&path).await? {
        tokio::fs::remove_file(&path).await?;
    }
    Ok(())
}
