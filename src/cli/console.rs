//! Terminal rendering of launch progress

use std::io::Write;
use std::sync::Mutex;

use crate::orchestrator::{LaunchEvent, LaunchObserver, StepOutcome};

/// Prints launch events as timestamped lines.
///
/// With `show_updates` off, only the final status message is printed.
pub struct ConsoleObserver<W: Write + Send> {
    inner: Mutex<ConsoleState<W>>,
    show_updates: bool,
}

struct ConsoleState<W> {
    writer: W,
    last_status: Option<String>,
}

impl ConsoleObserver<std::io::Stdout> {
    pub fn stdout(show_updates: bool) -> Self {
        Self::new(std::io::stdout(), show_updates)
    }
}

impl<W: Write + Send> ConsoleObserver<W> {
    pub fn new(writer: W, show_updates: bool) -> Self {
        Self {
            inner: Mutex::new(ConsoleState {
                writer,
                last_status: None,
            }),
            show_updates,
        }
    }

    pub fn into_inner(self) -> W {
        let state = self
            .inner
            .into_inner()
            .unwrap_or_else(|poisoned| poisoned.into_inner());
        state.writer
    }
}

impl<W: Write + Send> LaunchObserver for ConsoleObserver<W> {
    fn on_event(&self, event: &LaunchEvent) {
        let mut state = self
            .inner
            .lock()
            .unwrap_or_else(|poisoned| poisoned.into_inner());

        if let LaunchEvent::StatusMessage(message) = event {
            state.last_status = Some(message.clone());
        }

        let line = if self.show_updates {
            format_event(event)
        } else {
            match event {
                LaunchEvent::RunningChanged(false) => state.last_status.clone(),
                _ => None,
            }
        };

        if let Some(line) = line {
            let timestamp = chrono::Local::now().format("%H:%M:%S");
            // Nothing useful to do if the terminal is gone
            let _ = writeln!(state.writer, "[{}] {}", timestamp, line);
        }
    }
}

/// Text for an event, or `None` for events that are not shown
pub fn format_event(event: &LaunchEvent) -> Option<String> {
    match event {
        LaunchEvent::StatusMessage(message) => Some(message.clone()),
        LaunchEvent::StepUpdated {
            message, outcome, ..
        } => {
            let glyph = match outcome {
                StepOutcome::Success => "✓",
                StepOutcome::Failure => "✗",
                StepOutcome::InProgress => "…",
            };
            Some(format!("  {} {}", glyph, message))
        }
        LaunchEvent::MinimizeRequested { delay } => Some(format!(
            "Client is running; the launcher can be minimized in {}s",
            delay.as_secs()
        )),
        LaunchEvent::RunningChanged(_) | LaunchEvent::RetryAvailableChanged(_) => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::orchestrator::Step;
    use std::time::Duration;

    fn render(show_updates: bool, events: &[LaunchEvent]) -> String {
        let observer = ConsoleObserver::new(Vec::new(), show_updates);
        for event in events {
            observer.on_event(event);
        }
        String::from_utf8(observer.into_inner()).unwrap()
    }

    fn sample_events() -> Vec<LaunchEvent> {
        vec![
            LaunchEvent::RunningChanged(true),
            LaunchEvent::StatusMessage("Checking PostgreSQL service...".to_string()),
            LaunchEvent::StepUpdated {
                step: Step::PrimaryService,
                message: "PostgreSQL Database: Running".to_string(),
                outcome: StepOutcome::Success,
            },
            LaunchEvent::StatusMessage("Launch sequence completed successfully!".to_string()),
            LaunchEvent::RetryAvailableChanged(true),
            LaunchEvent::RunningChanged(false),
        ]
    }

    #[test]
    fn test_format_step_event() {
        let line = format_event(&LaunchEvent::StepUpdated {
            step: Step::ClientLaunch,
            message: "Commerce_Client: Failed to launch - check configuration".to_string(),
            outcome: StepOutcome::Failure,
        });
        assert_eq!(
            line.as_deref(),
            Some("  ✗ Commerce_Client: Failed to launch - check configuration")
        );
        assert!(format_event(&LaunchEvent::RunningChanged(true)).is_none());
        assert_eq!(
            format_event(&LaunchEvent::MinimizeRequested {
                delay: Duration::from_secs(5)
            })
            .as_deref(),
            Some("Client is running; the launcher can be minimized in 5s")
        );
    }

    #[test]
    fn test_all_updates_printed() {
        let output = render(true, &sample_events());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 3);
        assert!(lines[0].ends_with("Checking PostgreSQL service..."));
        assert!(lines[1].ends_with("✓ PostgreSQL Database: Running"));
        assert!(lines[2].ends_with("Launch sequence completed successfully!"));
    }

    #[test]
    fn test_quiet_mode_prints_only_final_status() {
        let output = render(false, &sample_events());
        let lines: Vec<&str> = output.lines().collect();
        assert_eq!(lines.len(), 1);
        assert!(lines[0].ends_with("Launch sequence completed successfully!"));
    }
}
