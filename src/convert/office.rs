//! DOCX conversion through a headless office suite.

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;
use tokio::process::Command;
use tracing::debug;

use super::{DocxStrategy, StrategyFailure};

/// Runs `<binary> --headless --convert-to pdf` with a time limit.
///
/// Success requires a zero exit code and the expected PDF on disk; the exit
/// code alone is not trusted. Each conversion gets its own staging
/// directory (also used as the office user profile) so concurrent
/// conversions do not collide.
pub struct OfficeConverter {
    binary: PathBuf,
    timeout: Duration,
}

impl OfficeConverter {
    /// Create a converter for the given office binary.
    pub fn new(binary: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            binary: binary.into(),
            timeout,
        }
    }

    fn staging_dir(output: &Path) -> PathBuf {
        let mut name = output.file_name().map(|n| n.to_os_string()).unwrap_or_default();
        name.push(".office");
        output.with_file_name(name)
    }

    async fn run(&self, input: &Path, output: &Path, staging: &Path) -> Result<(), StrategyFailure> {
        tokio::fs::create_dir_all(staging).await?;
        let profile = staging.join("profile");

        let mut command = Command::new(&self.binary);
        command
            .arg(format!("-env:UserInstallation=file://{}", profile.display()))
            .args(["--headless", "--convert-to", "pdf", "--outdir"])
            .arg(staging)
            .arg(input)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        debug!(binary = %self.binary.display(), input = %input.display(), "Starting office conversion");

        let result = tokio::time::timeout(self.timeout, command.output())
            .await
            .map_err(|_| StrategyFailure::TimedOut(self.timeout))?
            .map_err(|source| StrategyFailure::Spawn {
                program: self.binary.display().to_string(),
                source,
            })?;

        if !result.status.success() {
            return Err(StrategyFailure::ExitStatus {
                status: result.status.to_string(),
                stderr: String::from_utf8_lossy(&result.stderr).trim().to_string(),
            });
        }

        // The office suite keeps dots inside the stem: `a.b.docx` -> `a.b.pdf`
        let mut produced_name = input.file_stem().unwrap_or_default().to_os_string();
        produced_name.push(".pdf");
        let produced = staging.join(produced_name);
        if !tokio::fs::try_exists(&produced).await.unwrap_or(false) {
            return Err(StrategyFailure::MissingOutput(produced));
        }

        tokio::fs::rename(&produced, output).await?;
        Ok(())
    }
}

#[async_trait]
impl DocxStrategy for OfficeConverter {
    fn name(&self) -> &'static str {
        "office"
    }

    async fn convert(&self, input: &Path, output: &Path) -> Result<(), StrategyFailure> {
        let staging = Self::staging_dir(output);
        let result = self.run(input, output, &staging).await;
        let _ = tokio::fs::remove_dir_all(&staging).await;
        result
    }
}
