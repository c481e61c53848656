//! Access-log excerpts

use std::path::{Path, PathBuf};

use tracing::{instrument, trace};

use crate::config::LogConfig;
use crate::error::{DashboardError, DashboardResult};

/// Return the last `n` lines of the file at `path`, oldest first
///
/// Line terminators are stripped and invalid UTF-8 is replaced.
pub async fn tail(path: &Path, n: usize) -> DashboardResult<Vec<String>> {
    let bytes = tokio::fs::read(path)
        .await
        .map_err(|source| DashboardError::LogUnavailable {
            path: path.to_path_buf(),
            source,
        })?;

    let text = String::from_utf8_lossy(&bytes);
    let lines: Vec<&str> = text.lines().collect();
    let start = lines.len().saturating_sub(n);

    Ok(lines[start..].iter().map(|line| line.to_string()).collect())
}

#[derive(Debug, Clone)]
pub struct LogTailer {
    path: PathBuf,
    lines: usize,
}

impl LogTailer {
    pub fn new(config: &LogConfig) -> Self {
        Self {
            path: config.path.clone(),
            lines: config.lines,
        }
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    pub async fn tail(&self) -> DashboardResult<Vec<String>> {
        let lines = tail(&self.path, self.lines).await?;
        trace!("read {} log lines", lines.len());
        Ok(lines)
    }
}
