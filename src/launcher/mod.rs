use async_trait::async_trait;
use std::path::Path;
use std::process::Stdio;
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::config::ConfigStore;
use crate::locator::ClientLocator;

#[cfg(test)]
mod tests;

/// Capability for starting an external process without a shell.
///
/// Start failures are reported as `false`.
#[async_trait]
pub trait ProcessLauncher: Send + Sync {
    async fn launch(&self, path: &Path, arguments: &str) -> bool;
}

/// Spawns the client in its own process group, detached from the launcher's
/// terminal. The runtime reaps the child once it exits.
pub struct SpawnLauncher;

impl SpawnLauncher {
    fn command(path: &Path, arguments: &str) -> std::process::Command {
        let mut cmd = std::process::Command::new(path);

        #[cfg(windows)]
        {
            use std::os::windows::process::CommandExt;
            const DETACHED_PROCESS: u32 = 0x0000_0008;
            const CREATE_NEW_PROCESS_GROUP: u32 = 0x0000_0200;

            if !arguments.trim().is_empty() {
                cmd.raw_arg(arguments);
            }
            cmd.creation_flags(DETACHED_PROCESS | CREATE_NEW_PROCESS_GROUP);
        }
        #[cfg(unix)]
        {
            use std::os::unix::process::CommandExt;
            cmd.args(split_arguments(arguments));
            cmd.process_group(0);
        }
        #[cfg(not(any(windows, unix)))]
        cmd.args(split_arguments(arguments));

        if let Some(dir) = path.parent() {
            cmd.current_dir(dir);
        }
        cmd.stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::null());
        cmd
    }
}

#[async_trait]
impl ProcessLauncher for SpawnLauncher {
    async fn launch(&self, path: &Path, arguments: &str) -> bool {
        let cmd = Self::command(path, arguments);
        debug!("Running command: {:?}", cmd);

        let mut child = match tokio::process::Command::from(cmd).spawn() {
            Ok(child) => child,
            Err(e) => {
                warn!("Failed to start {}: {}", path.display(), e);
                return false;
            }
        };

        // Only a snapshot: the client may still exit right after this check
        match child.try_wait() {
            Ok(None) => {
                info!(
                    "Started {} (pid {})",
                    path.display(),
                    child.id().unwrap_or_default()
                );
                true
            }
            Ok(Some(status)) => {
                warn!("{} exited immediately with {}", path.display(), status);
                false
            }
            Err(e) => {
                warn!("Could not check {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// Launches the configured client, discovering it first when needed
pub struct ClientLauncher {
    config: Arc<ConfigStore>,
    locator: Arc<dyn ClientLocator>,
    launcher: Arc<dyn ProcessLauncher>,
}

impl ClientLauncher {
    pub fn new(
        config: Arc<ConfigStore>,
        locator: Arc<dyn ClientLocator>,
        launcher: Arc<dyn ProcessLauncher>,
    ) -> Self {
        Self {
            config,
            locator,
            launcher,
        }
    }

    /// Run discovery once and persist the match.
    ///
    /// The filesystem scan runs on the blocking pool.
    pub async fn discover(&self) -> bool {
        let locator = self.locator.clone();
        let target = match tokio::task::spawn_blocking(move || locator.discover()).await {
            Ok(target) => target,
            Err(e) => {
                warn!("Client discovery did not complete: {}", e);
                None
            }
        };
        let Some(target) = target else {
            return false;
        };

        let path = target.path.display().to_string();
        if let Err(e) = self.config.update_client_settings(&path, &target.arguments) {
            warn!("Failed to persist discovered client path: {:#}", e);
        }
        true
    }

    pub async fn launch_client(&self) -> bool {
        let mut config = self.config.get();

        if config.resolved_client_path().is_none() {
            info!(
                "Configured client path {:?} is not usable, searching for the client",
                config.client_executable_path
            );
            self.discover().await;
            config = self.config.get();
        }

        let Some(path) = config.resolved_client_path() else {
            warn!("No client executable available to launch");
            return false;
        };

        info!("Launching {}", path.display());
        self.launcher.launch(&path, &config.client_arguments).await
    }
}

/// Split an argument string on whitespace, honouring double quotes.
///
/// Inside or outside quotes, `\"` is a literal quote; other backslashes are
/// kept as-is so Windows paths survive.
pub fn split_arguments(arguments: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut chars = arguments.chars().peekable();

    while let Some(c) = chars.next() {
        match c {
            '\\' if chars.peek() == Some(&'"') => {
                current.push('"');
                chars.next();
                in_token = true;
            }
            '"' => {
                in_quotes = !in_quotes;
                in_token = true;
            }
            c if c.is_whitespace() && !in_quotes => {
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            c => {
                current.push(c);
                in_token = true;
            }
        }
    }

    if in_token {
        args.push(current);
    }
    args
}

/// Inverse of [`split_arguments`]
pub fn join_arguments<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.is_empty() || arg.chars().any(|c| c.is_whitespace() || c == '"') {
                format!("\"{}\"", arg.replace('"', "\\\""))
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
