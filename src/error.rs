use thiserror::Error;

/// Errors that abort the launch sequence
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LaunchError {
    /// A required service did not reach Running
    #[error("Failed to start {service}: {reason}")]
    ServiceStart { service: String, reason: String },

    /// The client could not be resolved or did not stay up
    #[error("Failed to launch Commerce_Client application")]
    ClientLaunch,

    /// `run()` was called while a sequence was already in progress
    #[error("Launch sequence is already running")]
    AlreadyRunning,
}
