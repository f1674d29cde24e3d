//! Launch sequence orchestration
//!
//! Runs the four steps in a fixed order: boot registration, primary service,
//! secondary service, client launch. Registration is best-effort; any later
//! step failing aborts the rest of the sequence. Progress is published to
//! subscribed [`LaunchObserver`]s as discrete, ordered [`LaunchEvent`]s.

use std::collections::BTreeMap;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard};
use std::time::Duration;
use tracing::{error, info, warn};

use crate::config::{ConfigStore, Configuration};
use crate::constants::timing::MINIMIZE_DELAY;
use crate::error::LaunchError;
use crate::launcher::ClientLauncher;
use crate::platform::Capabilities;
use crate::service::{ServiceProbe, ServiceStatus};
use crate::startup::StartupRegistrar;


/// One phase of the launch sequence, in execution order
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum Step {
    StartupRegistration,
    PrimaryService,
    SecondaryService,
    ClientLaunch,
}

impl Step {
    pub const ALL: [Step; 4] = [
        Step::StartupRegistration,
        Step::PrimaryService,
        Step::SecondaryService,
        Step::ClientLaunch,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            Step::StartupRegistration => "Startup Registration",
            Step::PrimaryService => "PostgreSQL Database",
            Step::SecondaryService => "JMC FIXED Service",
            Step::ClientLaunch => "Commerce_Client",
        }
    }
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOutcome {
    Success,
    Failure,
    InProgress,
}

/// Last known display state of a step
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StepStatus {
    pub message: String,
    pub outcome: StepOutcome,
}

/// A single state change, delivered to observers in order
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LaunchEvent {
    StatusMessage(String),
    StepUpdated {
        step: Step,
        message: String,
        outcome: StepOutcome,
    },
    RunningChanged(bool),
    RetryAvailableChanged(bool),
    /// The UI may minimise itself after `delay`
    MinimizeRequested { delay: Duration },
}

/// Receives launch events synchronously, in the order they happen
pub trait LaunchObserver: Send + Sync {
    fn on_event(&self, event: &LaunchEvent);
}

impl<F> LaunchObserver for F
where
    F: Fn(&LaunchEvent) + Send + Sync,
{
    fn on_event(&self, event: &LaunchEvent) {
        self(event)
    }
}

/// Snapshot of the orchestrator's observable state
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct OrchestratorState {
    pub current_step_message: String,
    pub per_step_status: BTreeMap<Step, StepStatus>,
    pub is_running: bool,
    pub is_retry_available: bool,
}

impl Default for OrchestratorState {
    fn default() -> Self {
        Self {
            current_step_message: "Initializing...".to_string(),
            per_step_status: BTreeMap::new(),
            is_running: false,
            is_retry_available: true,
        }
    }
}

/// A required service step: which probe calls to make and how to name it
#[derive(Clone, Copy)]
enum RequiredService {
    Primary,
    Secondary,
}

impl RequiredService {
    fn step(self) -> Step {
        match self {
            RequiredService::Primary => Step::PrimaryService,
            RequiredService::Secondary => Step::SecondaryService,
        }
    }

    /// Name used in progress messages
    fn short_name(self) -> &'static str {
        match self {
            RequiredService::Primary => "PostgreSQL",
            RequiredService::Secondary => "JMC FIXED",
        }
    }

    /// Name used in the sequence failure message
    fn error_name(self) -> &'static str {
        match self {
            RequiredService::Primary => "PostgreSQL",
            RequiredService::Secondary => "JMC FIXED service",
        }
    }

    async fn check(self, probe: &dyn ServiceProbe) -> ServiceStatus {
        match self {
            RequiredService::Primary => probe.check_primary().await,
            RequiredService::Secondary => probe.check_fixed().await,
        }
    }

    async fn start(self, probe: &dyn ServiceProbe, timeout: Duration) -> bool {
        match self {
            RequiredService::Primary => probe.start_primary(timeout).await,
            RequiredService::Secondary => probe.start_fixed(timeout).await,
        }
    }
}

pub struct LaunchOrchestrator {
    config: Arc<ConfigStore>,
    probe: Arc<dyn ServiceProbe>,
    registrar: Arc<dyn StartupRegistrar>,
    client: ClientLauncher,
    running: AtomicBool,
    state: Mutex<OrchestratorState>,
    observers: Mutex<Vec<Arc<dyn LaunchObserver>>>,
}

/// Resets the running flags however `run()` exits, including panics and
/// a dropped future.
struct RunGuard<'a> {
    orchestrator: &'a LaunchOrchestrator,
}

impl Drop for RunGuard<'_> {
    fn drop(&mut self) {
        if std::thread::panicking() {
            self.orchestrator
                .set_status("Launch sequence failed: unexpected error");
        }
        self.orchestrator.finish_run();
    }
}

impl LaunchOrchestrator {
    pub fn new(config: Arc<ConfigStore>, capabilities: Capabilities) -> Self {
        let client = ClientLauncher::new(
            config.clone(),
            capabilities.locator,
            capabilities.launcher,
        );
        Self {
            config,
            probe: capabilities.probe,
            registrar: capabilities.registrar,
            client,
            running: AtomicBool::new(false),
            state: Mutex::new(OrchestratorState::default()),
            observers: Mutex::new(Vec::new()),
        }
    }

    pub fn subscribe(&self, observer: Arc<dyn LaunchObserver>) {
        lock(&self.observers).push(observer);
    }

    pub fn state(&self) -> OrchestratorState {
        lock(&self.state).clone()
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn is_retry_available(&self) -> bool {
        lock(&self.state).is_retry_available
    }

    /// Run the launch sequence once.
    ///
    /// Rejects the call with [`LaunchError::AlreadyRunning`] while another run
    /// is in progress. On a fatal step failure the status message and retry
    /// flag are already updated when the error is returned.
    pub async fn run(&self) -> Result<(), LaunchError> {
        if self
            .running
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .is_err()
        {
            warn!("Launch sequence already running, ignoring request");
            return Err(LaunchError::AlreadyRunning);
        }

        let guard = RunGuard { orchestrator: self };
        self.begin_run();

        let config = self.config.get();
        let result = self.run_steps(&config).await;

        match &result {
            Ok(()) => {
                info!("Launch sequence completed");
                self.set_status("Launch sequence completed successfully!");
            }
            Err(e) => {
                error!("Launch sequence failed: {}", e);
                self.set_status(format!("Launch sequence failed: {}", e));
            }
        }
        drop(guard);

        if result.is_ok() && config.minimize_on_complete {
            self.emit(&LaunchEvent::MinimizeRequested {
                delay: MINIMIZE_DELAY,
            });
        }
        result
    }

    /// Run the sequence again after a previous attempt finished
    pub async fn retry(&self) -> Result<(), LaunchError> {
        if self.is_running() {
            return Err(LaunchError::AlreadyRunning);
        }
        info!("Retrying launch sequence");
        self.run().await
    }

    async fn run_steps(&self, config: &Configuration) -> Result<(), LaunchError> {
        self.register_startup(config).await;

        let timeout = config.service_timeout();
        self.ensure_service(RequiredService::Primary, timeout).await?;
        self.ensure_service(RequiredService::Secondary, timeout).await?;

        self.launch_client().await
    }

    async fn register_startup(&self, config: &Configuration) {
        let step = Step::StartupRegistration;
        self.set_status("Configuring startup registration...");

        if !config.auto_start_on_boot {
            self.set_step(step, "Disabled in configuration", StepOutcome::Success);
            return;
        }

        self.set_step(step, "Checking...", StepOutcome::InProgress);
        if self.registrar.is_registered().await {
            self.set_step(step, "Already configured", StepOutcome::Success);
            return;
        }

        self.registrar.register().await;
        if self.registrar.is_registered().await {
            self.set_step(step, "Successfully configured", StepOutcome::Success);
        } else {
            warn!("Startup registration failed, continuing");
            self.set_step(step, "Failed to configure", StepOutcome::Failure);
        }
    }

    async fn ensure_service(
        &self,
        service: RequiredService,
        timeout: Duration,
    ) -> Result<(), LaunchError> {
        let step = service.step();
        let name = service.short_name();

        self.set_status(format!("Checking {} service...", name));
        self.set_step(step, "Checking status...", StepOutcome::InProgress);

        let status = service.check(self.probe.as_ref()).await;
        if status.is_running {
            self.set_step(step, "Running", StepOutcome::Success);
            return Ok(());
        }

        self.set_step(step, "Starting...", StepOutcome::InProgress);
        self.set_status(format!("Starting {} service...", name));

        if service.start(self.probe.as_ref(), timeout).await {
            self.set_step(step, "Successfully started", StepOutcome::Success);
            return Ok(());
        }

        let reason = status
            .error_message
            .filter(|message| !message.is_empty())
            .unwrap_or_else(|| "Failed to start".to_string());
        self.set_step(step, &reason, StepOutcome::Failure);

        Err(LaunchError::ServiceStart {
            service: service.error_name().to_string(),
            reason,
        })
    }

    async fn launch_client(&self) -> Result<(), LaunchError> {
        let step = Step::ClientLaunch;
        self.set_status("Launching Commerce_Client application...");
        self.set_step(step, "Launching...", StepOutcome::InProgress);

        if self.client.launch_client().await {
            self.set_step(step, "Successfully launched", StepOutcome::Success);
            Ok(())
        } else {
            self.set_step(
                step,
                "Failed to launch - check configuration",
                StepOutcome::Failure,
            );
            Err(LaunchError::ClientLaunch)
        }
    }

    fn begin_run(&self) {
        {
            let mut state = lock(&self.state);
            state.per_step_status.clear();
            state.is_running = true;
            state.is_retry_available = false;
        }
        self.emit(&LaunchEvent::RunningChanged(true));
        self.emit(&LaunchEvent::RetryAvailableChanged(false));
        self.set_status("Starting launch sequence...");
    }

    fn finish_run(&self) {
        {
            let mut state = lock(&self.state);
            state.is_retry_available = true;
            state.is_running = false;
        }
        self.running.store(false, Ordering::SeqCst);
        self.emit(&LaunchEvent::RetryAvailableChanged(true));
        self.emit(&LaunchEvent::RunningChanged(false));
    }

    fn set_status(&self, message: impl Into<String>) {
        let message = message.into();
        lock(&self.state).current_step_message = message.clone();
        self.emit(&LaunchEvent::StatusMessage(message));
    }

    fn set_step(&self, step: Step, detail: &str, outcome: StepOutcome) {
        let message = format!("{}: {}", step.label(), detail);
        lock(&self.state).per_step_status.insert(
            step,
            StepStatus {
                message: message.clone(),
                outcome,
            },
        );
        self.emit(&LaunchEvent::StepUpdated {
            step,
            message,
            outcome,
        });
    }

    fn emit(&self, event: &LaunchEvent) {
        let observers = lock(&self.observers).clone();
        for observer in observers {
            observer.on_event(event);
        }
    }
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
}
