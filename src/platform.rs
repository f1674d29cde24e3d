//! Platform capability selection
//!
//! The launch sequence is identical everywhere; only the leaf adapters
//! differ. They are picked here from the build target.

use std::sync::Arc;

use crate::launcher::{ProcessLauncher, SpawnLauncher};
use crate::locator::{CandidateLocator, ClientLocator};
use crate::service::ServiceProbe;
use crate::startup::StartupRegistrar;

/// The adapters the launch sequence depends on
#[derive(Clone)]
pub struct Capabilities {
    pub probe: Arc<dyn ServiceProbe>,
    pub registrar: Arc<dyn StartupRegistrar>,
    pub locator: Arc<dyn ClientLocator>,
    pub launcher: Arc<dyn ProcessLauncher>,
}

impl Capabilities {
    /// Adapters for the platform this binary was built for
    pub fn platform_default() -> Self {
        Self {
            probe: default_probe(),
            registrar: default_registrar(),
            locator: Arc::new(CandidateLocator::platform_default()),
            launcher: Arc::new(SpawnLauncher),
        }
    }
}

/// Short name of the adapter set in use
pub fn platform_name() -> &'static str {
    if cfg!(target_os = "windows") {
        "windows"
    } else if cfg!(target_os = "linux") {
        "linux"
    } else if cfg!(target_os = "macos") {
        "macos"
    } else {
        "unsupported"
    }
}

#[cfg(target_os = "windows")]
fn default_probe() -> Arc<dyn ServiceProbe> {
    Arc::new(crate::service::WindowsServiceProbe)
}

#[cfg(target_os = "linux")]
fn default_probe() -> Arc<dyn ServiceProbe> {
    Arc::new(crate::service::SystemdServiceProbe::new())
}

#[cfg(not(any(target_os = "windows", target_os = "linux")))]
fn default_probe() -> Arc<dyn ServiceProbe> {
    Arc::new(crate::service::UnsupportedServiceProbe)
}

#[cfg(target_os = "windows")]
fn default_registrar() -> Arc<dyn StartupRegistrar> {
    Arc::new(crate::startup::RunKeyRegistrar)
}

#[cfg(target_os = "macos")]
fn default_registrar() -> Arc<dyn StartupRegistrar> {
    Arc::new(crate::startup::LaunchAgentRegistrar::new())
}

#[cfg(not(any(target_os = "windows", target_os = "macos")))]
fn default_registrar() -> Arc<dyn StartupRegistrar> {
    Arc::new(crate::startup::XdgAutostartRegistrar::new())
}
