/*!
 * External renderer supervision.
 *
 * Rendering the mutated document (for thumbnails or PDF export) is done by
 * an out-of-process converter such as LibreOffice. The supervisor health-
 * checks the binary before a job, serializes invocations behind an async
 * mutex because the converter misbehaves when run concurrently, and bounds
 * every invocation with a timeout. Render output is never read back; only
 * the exit status matters.
 */

use std::path::Path;
use std::process::Stdio;
use std::time::Duration;

use log::{info, warn};
use tokio::process::Command;
use tokio::sync::Mutex;
use tokio::time::timeout;

use crate::app_config::RendererConfig;
use crate::errors::RenderError;

/// Timeout for the health-check invocation
const HEALTH_CHECK_TIMEOUT: Duration = Duration::from_secs(10);

/// Supervised handle on the external renderer binary
#[derive(Debug)]
pub struct RendererSupervisor {
    binary: String,
    render_timeout: Duration,
    // One render at a time
    lock: Mutex<()>,
}

impl RendererSupervisor {
    /// Supervisor for the configured binary
    pub fn new(config: &RendererConfig) -> Self {
        Self {
            binary: config.binary.clone(),
            render_timeout: Duration::from_secs(config.timeout_secs),
            lock: Mutex::new(()),
        }
    }

    /// Verify the binary exists and answers `--version` promptly
    pub async fn health_check(&self) -> Result<(), RenderError> {
        let mut child = Command::new(&self.binary)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RenderError::Unavailable(format!("{}: {}", self.binary, e)))?;

        match timeout(HEALTH_CHECK_TIMEOUT, child.wait()).await {
            Ok(Ok(status)) if status.success() => Ok(()),
            Ok(Ok(status)) => Err(RenderError::Unavailable(format!(
                "{} --version exited with {}",
                self.binary,
                status.code().unwrap_or(-1)
            ))),
            Ok(Err(e)) => Err(RenderError::Unavailable(e.to_string())),
            Err(_) => {
                let _ = child.kill().await;
                Err(RenderError::Unavailable(format!(
                    "{} --version did not finish within {:?}",
                    self.binary, HEALTH_CHECK_TIMEOUT
                )))
            }
        }
    }

    /// Render the document at `path`, one invocation at a time.
    ///
    /// The child is killed when the timeout elapses.
    pub async fn render(&self, path: &Path) -> Result<(), RenderError> {
        let _guard = self.lock.lock().await;

        let outdir = path.parent().unwrap_or_else(|| Path::new("."));
        let mut child = Command::new(&self.binary)
            .arg("--headless")
            .arg("--convert-to")
            .arg("pdf")
            .arg("--outdir")
            .arg(outdir)
            .arg(path)
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .spawn()
            .map_err(|e| RenderError::Unavailable(format!("{}: {}", self.binary, e)))?;

        match timeout(self.render_timeout, child.wait()).await {
            Ok(Ok(status)) if status.success() => {
                info!("Rendered {}", path.display());
                Ok(())
            }
            Ok(Ok(status)) => Err(RenderError::ExitStatus(status.code().unwrap_or(-1))),
            Ok(Err(e)) => Err(RenderError::Unavailable(e.to_string())),
            Err(_) => {
                warn!("Render of {} timed out, killing the converter", path.display());
                let _ = child.kill().await;
                Err(RenderError::Timeout(self.render_timeout.as_secs()))
            }
        }
    }

    /// Re-establish the renderer after a failure: wait for in-flight work,
    /// then re-run the health check as a warm-up
    pub async fn restart(&self) -> Result<(), RenderError> {
        let _guard = self.lock.lock().await;
        info!("Restarting renderer {}", self.binary);
        self.health_check().await
    }
}
