//! Model gateway abstraction.
//!
//! The [`ModelGateway`] trait decouples the run pipeline from the actual
//! text-completion backend (currently `ollama run`). Tests use scripted
//! gateways that return predetermined replies without spawning processes.
//!
//! No retry is performed here: a failure is terminal for the run, and the
//! caller guarantees nothing has been written when it surfaces.

use std::process::Command;
use std::time::Duration;

use tracing::{debug, info, instrument, warn};

use crate::core::error::GatewayError;
use crate::io::config::BuilderConfig;
use crate::io::process::run_command_with_timeout;

/// Abstraction over text-completion backends.
pub trait ModelGateway {
    /// Send the composed prompt and return the raw reply text.
    ///
    /// The call may block for an unbounded but finite duration; the pipeline
    /// treats it as synchronous.
    fn complete(&self, prompt: &str) -> Result<String, GatewayError>;
}

/// Gateway that pipes the prompt into `ollama run <model>`.
#[derive(Debug, Clone)]
pub struct OllamaGateway {
    /// Executable to spawn. Overridable so tests can exercise failure mapping.
    program: String,
    model: String,
    timeout: Duration,
    reply_limit_bytes: usize,
}

impl OllamaGateway {
    pub fn new(config: &BuilderConfig) -> Self {
        Self {
            program: "ollama".to_string(),
            model: config.model.clone(),
            timeout: Duration::from_secs(config.gateway_timeout_secs),
            reply_limit_bytes: config.reply_limit_bytes,
        }
    }

    #[cfg(test)]
    fn with_program(mut self, program: &str) -> Self {
        self.program = program.to_string();
        self
    }
}

impl ModelGateway for OllamaGateway {
    #[instrument(skip_all, fields(model = %self.model, timeout_secs = self.timeout.as_secs()))]
    fn complete(&self, prompt: &str) -> Result<String, GatewayError> {
        info!("starting backend completion");

        let mut cmd = Command::new(&self.program);
        cmd.arg("run").arg(&self.model);
        // Consistent UTF-8 output regardless of the host locale.
        cmd.env("LANG", "C.UTF-8");

        let output = run_command_with_timeout(
            cmd,
            Some(prompt.as_bytes()),
            self.timeout,
            self.reply_limit_bytes,
        )
        .map_err(|err| GatewayError::Unreachable(format!("{err:#}")))?;

        if output.timed_out {
            warn!(timeout_secs = self.timeout.as_secs(), "backend timed out");
            return Err(GatewayError::Unreachable(format!(
                "backend timed out after {:?}",
                self.timeout
            )));
        }
        if !output.status.success() {
            warn!(exit_code = ?output.status.code(), "backend returned failure");
            return Err(GatewayError::Backend(format!(
                "exit status {:?}: {}",
                output.status.code(),
                String::from_utf8_lossy(&output.stderr).trim()
            )));
        }
        // A reply that hit the limit is incomplete; committing it could
        // persist a file block cut mid-content as if it were the full file.
        if output.stdout_truncated > 0 {
            warn!(
                dropped_bytes = output.stdout_truncated,
                limit_bytes = self.reply_limit_bytes,
                "reply exceeded the configured limit"
            );
            return Err(GatewayError::Backend(format!(
                "reply truncated: {} bytes dropped beyond the {}-byte limit",
                output.stdout_truncated, self.reply_limit_bytes
            )));
        }

        debug!(reply_bytes = output.stdout.len(), "backend completed");
        Ok(String::from_utf8_lossy(&output.stdout).into_owned())
    }
}
