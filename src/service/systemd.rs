//! systemd-backed service probe

use async_trait::async_trait;
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, info, warn};

use super::{wait_for_running, ServiceProbe, ServiceState, ServiceStatus};

/// Talks to systemd through `systemctl`
pub struct SystemdServiceProbe {
    systemctl: String,
}

impl SystemdServiceProbe {
    pub fn new() -> Self {
        Self {
            systemctl: "systemctl".to_string(),
        }
    }

    /// Use a specific `systemctl` binary
    pub fn with_program(program: impl Into<String>) -> Self {
        Self {
            systemctl: program.into(),
        }
    }

    async fn systemctl(&self, args: &[&str]) -> Result<std::process::Output, String> {
        let program = which::which(&self.systemctl)
            .map_err(|_| format!("{} not found", self.systemctl))?;

        debug!("Running {} {:?}", program.display(), args);
        Command::new(program)
            .args(args)
            .output()
            .await
            .map_err(|e| format!("Failed to run {}: {}", self.systemctl, e))
    }
}

impl Default for SystemdServiceProbe {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ServiceProbe for SystemdServiceProbe {
    async fn check_status(&self, name: &str) -> ServiceStatus {
        let unit = format!("{}.service", name);
        let output = match self
            .systemctl(&["show", unit.as_str(), "--property=LoadState,ActiveState"])
            .await
        {
            Ok(output) => output,
            Err(e) => return ServiceStatus::error(name, e),
        };

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return ServiceStatus::error(name, stderr.trim().to_string());
        }

        parse_show_output(name, &String::from_utf8_lossy(&output.stdout))
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
        let unit = format!("{}.service", name);
        match self.systemctl(&["start", "--no-block", unit.as_str()]).await {
            Ok(output) if output.status.success() => {}
            Ok(output) => {
                warn!(
                    "Failed to start service {}: {}",
                    name,
                    String::from_utf8_lossy(&output.stderr).trim()
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

/// Parse `systemctl show --property=LoadState,ActiveState` output
pub(crate) fn parse_show_output(name: &str, stdout: &str) -> ServiceStatus {
    let mut load_state = None;
    let mut active_state = None;

    for line in stdout.lines() {
        if let Some((key, value)) = line.split_once('=') {
            match key.trim() {
                "LoadState" => load_state = Some(value.trim()),
                "ActiveState" => active_state = Some(value.trim()),
                _ => {}
            }
        }
    }

    match load_state {
        Some("loaded") => {}
        Some("not-found") | None => {
            return ServiceStatus::error(name, format!("Service {} not found", name));
        }
        Some(other) => {
            return ServiceStatus::error(name, format!("Service {} is {}", name, other));
        }
    }

    let state = match active_state {
        Some("active") | Some("reloading") => ServiceState::Running,
        Some("inactive") | Some("failed") => ServiceState::Stopped,
        Some("activating") => ServiceState::Starting,
        Some("deactivating") => ServiceState::Stopping,
        _ => ServiceState::Unknown,
    };

    ServiceStatus::new(name, state)
}
