//! Windows service control manager probe

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{wait_for_running, ServiceProbe, ServiceState, ServiceStatus};

/// Talks to the service control manager through `sc.exe`
pub struct WindowsServiceProbe;

impl WindowsServiceProbe {
    async fn sc(&self, args: &[&str]) -> Result<std::process::Output, String> {
        let program = which::which("sc.exe").map_err(|_| "sc.exe not found".to_string())?;

        debug!("Running sc.exe {:?}", args);
        Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("Failed to run sc.exe: {}", e))
    }
}

#[async_trait]
impl ServiceProbe for WindowsServiceProbe {
    async fn check_status(&self, name: &str) -> ServiceStatus {
        match self.sc(&["query", name]).await {
            Ok(output) => parse_query_output(
                name,
                output.status.success(),
                &String::from_utf8_lossy(&output.stdout),
            ),
            Err(e) => ServiceStatus::error(name, e),
        }
    }

    async fn start(&self, name: &str, timeout: Duration) -> bool {
        let status = self.check_status(name).await;
        match status.state {
            ServiceState::Running => return true,
            ServiceState::Stopped => {}
            state => {
                debug!("Not starting {} from state {}", name, state);
                return false;
            }
        }

        info!("Starting service {}", name);
        match self.sc(&["start", name]).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(
                    "Failed to start service {}: {}",
                    name,
                    last_line(&String::from_utf8_lossy(&output.stdout))
                );
                return false;
            }
            Err(e) => {
                warn!("Failed to start service {}: {}", name, e);
                return false;
            }
        }

        wait_for_running(self, name, timeout).await
    }
}

/// Parse `sc.exe query <name>` output
pub(crate) fn parse_query_output(name: &str, success: bool, stdout: &str) -> ServiceStatus {
    if !success {
        let message = last_line(stdout);
        let message = if message.is_empty() {
            format!("Service {} not found", name)
        } else {
            message.to_string()
        };
        return ServiceStatus::error(name, message);
    }

    // STATE              : 4  RUNNING
    let state_name = stdout
        .lines()
        .map(str::trim)
        .find(|line| line.starts_with("STATE"))
        .and_then(|line| line.split_once(':'))
        .and_then(|(_, value)| value.split_whitespace().nth(1));

    let state = match state_name {
        Some("STOPPED") => ServiceState::Stopped,
        Some("START_PENDING") => ServiceState::Starting,
        Some("STOP_PENDING") => ServiceState::Stopping,
        Some("RUNNING") => ServiceState::Running,
        _ => ServiceState::Unknown,
    };

    ServiceStatus::new(name, state)
}

fn last_line(text: &str) -> &str {
    text.lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .unwrap_or("")
}
