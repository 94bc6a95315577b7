/// Generative text service: the one blocking call in a build.

use std::process::Stdio;
use std::time::Duration;
use thiserror::Error;
use tokio::process::Command;
use tokio::time;
use tracing::{debug, warn};

#[derive(Debug, Error)]
pub enum ServiceError {
    #[error("generative service invocation failed: {0}")]
    Invocation(String),
    #[error("generative service timed out after {0:?}; run again")]
    Timeout(Duration),
}

/// Anything that turns a prompt into a reply within a deadline.
pub trait GenerativeTextService {
    fn submit(&self, prompt: &str, timeout: Duration) -> Result<String, ServiceError>;
}

/// Command line of the external service. The prompt is appended as the
/// final argument.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CliService {
    pub program: String,
    pub args: Vec<String>,
    /// Environment variables removed from the child's environment.
    pub env_remove: Vec<String>,
}

impl Default for CliService {
    fn default() -> Self {
        Self {
            program: "claude".to_string(),
            args: vec!["-p".to_string()],
            env_remove: vec!["CLAUDECODE".to_string()],
        }
    }
}

impl GenerativeTextService for CliService {
    fn submit(&self, prompt: &str, timeout: Duration) -> Result<String, ServiceError> {
        let runtime = tokio::runtime::Builder::new_current_thread()
            .enable_all()
            .build()
            .map_err(|e| ServiceError::Invocation(format!("failed to start runtime: {}", e)))?;
        runtime.block_on(self.run(prompt, timeout))
    }
}

impl CliService {
    /// Spawn the service and collect its output. The deadline covers the
    /// child's exit and both pipes reaching EOF, so a background process
    /// that inherited stdout cannot extend the call.
    async fn run(&self, prompt: &str, timeout: Duration) -> Result<String, ServiceError> {
        let mut command = Command::new(&self.program);
        command
            .args(&self.args)
            .arg(prompt)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true);
        for key in &self.env_remove {
            command.env_remove(key);
        }
        // Own process group, so expiry takes down helpers the service forked.
        #[cfg(unix)]
        command.process_group(0);

        let child = command.spawn().map_err(|e| {
            if e.kind() == std::io::ErrorKind::NotFound {
                ServiceError::Invocation(format!("command not found: {}", self.program))
            } else {
                ServiceError::Invocation(format!("failed to start {}: {}", self.program, e))
            }
        })?;
        let pid = child.id();
        debug!(program = %self.program, pid = ?pid, "service started");

        let output = match time::timeout(timeout, child.wait_with_output()).await {
            Ok(result) => {
                result.map_err(|e| ServiceError::Invocation(format!("wait failed: {}", e)))?
            }
            Err(_) => {
                // The direct child is killed when its future is dropped
                if let Some(pid) = pid {
                    kill_process_group(pid);
                }
                return Err(ServiceError::Timeout(timeout));
            }
        };

        if !output.status.success() {
            return Err(ServiceError::Invocation(format!(
                "{} exited with {}:\n{}",
                self.program,
                output.status,
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}

#[cfg(unix)]
fn kill_process_group(pgid: u32) {
    let Ok(pgid) = libc::pid_t::try_from(pgid) else {
        return;
    };
    // SAFETY: killpg takes plain integers and has no memory effects.
    let rc = unsafe { libc::killpg(pgid, libc::SIGKILL) };
    if rc == -1 {
        let err = std::io::Error::last_os_error();
        if err.raw_os_error() != Some(libc::ESRCH) {
            warn!(pgid, "failed to kill service process group: {}", err);
        }
    }
}

#[cfg(not(unix))]
fn kill_process_group(_pgid: u32) {}
