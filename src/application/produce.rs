use std::{
    io::{self, ErrorKind},
    path::{Path, PathBuf},
    process::Stdio,
    time::{Duration, Instant},
};

use async_trait::async_trait;
use thiserror::Error;
use tokio::process::Command;
use tracing::{debug, warn};

/// Environment variable through which the request query reaches a script.
pub const QUERY_STRING_ENV: &str = "QUERY_STRING";

#[derive(Debug, Error)]
pub enum ProduceError {
    #[error("producer unavailable: {0}")]
    Spawn(io::Error),
    #[error("producer exited with status {exit_code:?}: {stderr}")]
    Exit {
        exit_code: Option<i32>,
        stderr: String,
    },
    #[error("producer did not finish within {0:?}")]
    Timeout(Duration),
    #[error("producer output is not valid UTF-8")]
    Encoding,
    #[error("failed to read page content: {0}")]
    Read(io::Error),
}

/// Runs a resource's template and captures what it writes.
#[async_trait]
pub trait Producer: Send + Sync {
    async fn produce(&self, script: &Path, query: &str) -> Result<String, ProduceError>;
}

/// Executes template scripts with an interpreter, CGI-style: the query is
/// passed in `QUERY_STRING`, stdout is the raw content.
#[derive(Debug, Clone)]
pub struct ScriptProducer {
    interpreter: PathBuf,
    timeout: Duration,
}

impl ScriptProducer {
    pub fn new(interpreter: impl Into<PathBuf>, timeout: Duration) -> Self {
        Self {
            interpreter: interpreter.into(),
            timeout,
        }
    }
}

#[async_trait]
impl Producer for ScriptProducer {
    async fn produce(&self, script: &Path, query: &str) -> Result<String, ProduceError> {
        let started_at = Instant::now();
        let mut command = Command::new(&self.interpreter);
        // The script runs from its own directory so relative includes resolve.
        match (script.parent(), script.file_name()) {
            (Some(dir), Some(name)) if !dir.as_os_str().is_empty() => {
                command.current_dir(dir).arg(name);
            }
            _ => {
                command.arg(script);
            }
        }
        command
            .env(QUERY_STRING_ENV, query)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);

        let output = match tokio::time::timeout(self.timeout, command.output()).await {
            Ok(Ok(output)) => output,
            Ok(Err(err)) => {
                warn!(
                    target = "application::produce",
                    op = "produce::spawn",
                    result = "error",
                    interpreter = %self.interpreter.display(),
                    script = %script.display(),
                    not_found = err.kind() == ErrorKind::NotFound,
                    error = %err,
                    "Failed to spawn template producer"
                );
                return Err(ProduceError::Spawn(err));
            }
            Err(_) => {
                warn!(
                    target = "application::produce",
                    op = "produce::wait",
                    result = "timeout",
                    script = %script.display(),
                    timeout_ms = self.timeout.as_millis() as u64,
                    "Template producer timed out"
                );
                return Err(ProduceError::Timeout(self.timeout));
            }
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr).into_owned();
            return Err(ProduceError::Exit {
                exit_code: output.status.code(),
                stderr,
            });
        }

        let content = String::from_utf8(output.stdout).map_err(|_| ProduceError::Encoding)?;
        debug!(
            target = "application::produce",
            op = "produce::run",
            result = "ok",
            script = %script.display(),
            elapsed_ms = started_at.elapsed().as_millis() as u64,
            bytes = content.len(),
            "Template produced content"
        );
        Ok(content)
    }
}
