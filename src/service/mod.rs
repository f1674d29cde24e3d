//! Service probing and starting
//!
//! [`ServiceProbe`] is the capability the launch sequence uses to check and
//! start OS-managed background services. Each platform provides one
//! implementation; failures inside an adapter are reported through
//! [`ServiceStatus::error_message`] or a `false` return, never as errors.

use async_trait::async_trait;
use serde::Serialize;
use std::fmt;
use std::time::Duration;
use tracing::debug;

use crate::constants::{primary, secondary, timing::SERVICE_POLL_INTERVAL};

mod systemd;
mod windows;


pub use systemd::SystemdServiceProbe;
pub use windows::WindowsServiceProbe;

/// Normalized state of a service across platforms
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ServiceState {
    Unknown,
    Stopped,
    Running,
    Starting,
    Stopping,
    Error,
}

impl fmt::Display for ServiceState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            ServiceState::Unknown => "unknown",
            ServiceState::Stopped => "stopped",
            ServiceState::Running => "running",
            ServiceState::Starting => "starting",
            ServiceState::Stopping => "stopping",
            ServiceState::Error => "error",
        };
        f.write_str(s)
    }
}

/// Result of a single probe. Never mutated after construction.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceStatus {
    pub service_key: String,
    pub display_name: String,
    pub state: ServiceState,
    pub is_running: bool,
    pub error_message: Option<String>,
}

impl ServiceStatus {
    pub fn new(service_key: impl Into<String>, state: ServiceState) -> Self {
        let service_key = service_key.into();
        Self {
            display_name: service_key.clone(),
            service_key,
            state,
            is_running: state == ServiceState::Running,
            error_message: None,
        }
    }

    pub fn error(service_key: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            error_message: Some(message.into()),
            ..Self::new(service_key, ServiceState::Error)
        }
    }

    pub fn with_display_name(self, display_name: impl Into<String>) -> Self {
        Self {
            display_name: display_name.into(),
            ..self
        }
    }

    /// True when the probe found the service, whatever its state
    pub fn is_found(&self) -> bool {
        self.error_message.as_deref().map_or(true, str::is_empty)
    }
}

/// Capability for querying and starting named services
#[async_trait]
pub trait ServiceProbe: Send + Sync {
    /// Query the current state of `name`
    async fn check_status(&self, name: &str) -> ServiceStatus;

    /// Start `name` and wait up to `timeout` for it to reach Running
    async fn start(&self, name: &str, timeout: Duration) -> bool;

    /// Probe the candidates in order and return the first one that exists
    async fn check_candidates(
        &self,
        candidates: &[&str],
        canonical_name: &str,
        display_name: &str,
    ) -> ServiceStatus {
        for name in candidates {
            let status = self.check_status(name).await;
            if status.is_found() {
                return status.with_display_name(display_name);
            }
            debug!("Service candidate {} not usable: {:?}", name, status.error_message);
        }

        ServiceStatus::error(canonical_name, format!("{} service not found", canonical_name))
            .with_display_name(display_name)
    }

    /// Try to start each candidate in order, stopping at the first success
    async fn start_candidates(&self, candidates: &[&str], timeout: Duration) -> bool {
        for name in candidates {
            if self.start(name, timeout).await {
                return true;
            }
        }
        false
    }

    async fn check_primary(&self) -> ServiceStatus {
        self.check_candidates(
            primary::CANDIDATES,
            primary::CANONICAL_NAME,
            primary::DISPLAY_NAME,
        )
        .await
    }

    async fn start_primary(&self, timeout: Duration) -> bool {
        self.start_candidates(primary::CANDIDATES, timeout).await
    }

    async fn check_fixed(&self) -> ServiceStatus {
        self.check_candidates(
            secondary::CANDIDATES,
            secondary::CANONICAL_NAME,
            secondary::DISPLAY_NAME,
        )
        .await
    }

    async fn start_fixed(&self, timeout: Duration) -> bool {
        self.start_candidates(secondary::CANDIDATES, timeout).await
    }
}

/// Poll `name` until it reports Running or `timeout` elapses.
///
/// On timeout the service is left alone; only the wait is abandoned.
pub async fn wait_for_running<P>(probe: &P, name: &str, timeout: Duration) -> bool
where
    P: ServiceProbe + ?Sized,
{
    let wait = async {
        loop {
            let status = probe.check_status(name).await;
            match status.state {
                ServiceState::Running => return true,
                ServiceState::Error => return false,
                _ => tokio::time::sleep(SERVICE_POLL_INTERVAL).await,
            }
        }
    };

    match tokio::time::timeout(timeout, wait).await {
        Ok(running) => running,
        Err(_) => {
            debug!("Timed out after {:?} waiting for {} to run", timeout, name);
            false
        }
    }
}

/// Probe for platforms without a service manager integration
pub struct UnsupportedServiceProbe;

#[async_trait]
impl ServiceProbe for UnsupportedServiceProbe {
    async fn check_status(&self, name: &str) -> ServiceStatus {
        ServiceStatus::error(name, "service management is not supported on this platform")
    }

    async fn start(&self, _name: &str, _timeout: Duration) -> bool {
        false
    }
}
