//! Environment/runtime helpers
//!
//! Sanity checks to ensure expected directories exist at startup.

use tracing::warn;

/// Ensure the data directory exists (SQLite files live there); warn when the
/// optional static frontend directory is missing.
pub async fn ensure_env(frontend_dir: Option<&str>, data_dir: &str) -> anyhow::Result<()> {
    if let Some(frontend_dir) = frontend_dir {
        if tokio::fs::metadata(frontend_dir).await.is_err() {
            warn!(%frontend_dir, "frontend assets directory not found; console will not be served");
        }
    }
    tokio::fs::create_dir_all(data_dir)
        .await
        .map_err(|e| anyhow::anyhow!("cannot create {data_dir}: {e}"))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::ensure_env;

    #[tokio::test]
    async fn ensure_env_creates_data_dir() -> anyhow::Result<()> {
        let dir = std::env::temp_dir().join(format!("spa_env_{}", uuid::Uuid::new_v4()));
        let data_dir = dir.to_string_lossy().to_string();
        ensure_env(Some("/nonexistent-frontend-dir"), &data_dir).await?;
        assert!(tokio::fs::metadata(&dir).await?.is_dir());
        let _ = tokio::fs::remove_dir_all(&dir).await;
        Ok(())
    }
}
