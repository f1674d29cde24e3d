//! Boot-time registration of the launcher itself

use async_trait::async_trait;
use std::path::{Path, PathBuf};
use tokio::process::Command;
use tracing::{debug, info, warn};

use crate::constants::startup::{APP_NAME, AUTOSTART_FILE, LAUNCH_AGENT_LABEL, RUN_KEY};

#[cfg(test)]
mod tests;

/// Capability for registering the launcher to run at boot.
///
/// All operations report failure as `false`.
#[async_trait]
pub trait StartupRegistrar: Send + Sync {
    async fn is_registered(&self) -> bool;

    async fn register(&self) -> bool;

    async fn unregister(&self) -> bool;

    /// Register only if not already registered
    async fn ensure_registered(&self) -> bool {
        if self.is_registered().await {
            return true;
        }
        self.register().await
    }
}

fn current_exe() -> Option<PathBuf> {
    match std::env::current_exe() {
        Ok(path) => Some(path),
        Err(e) => {
            warn!("Could not determine launcher executable: {}", e);
            None
        }
    }
}

/// Registers under the machine-wide Windows `Run` key via `reg.exe`
pub struct RunKeyRegistrar;

impl RunKeyRegistrar {
    async fn reg(&self, args: &[&str]) -> Option<std::process::Output> {
        let program = which::which("reg.exe").ok()?;
        debug!("Running reg.exe {:?}", args);
        match Command::new(program).args(args).output().await {
            Ok(output) => Some(output),
            Err(e) => {
                warn!("Failed to run reg.exe: {}", e);
                None
            }
        }
    }
}

#[async_trait]
impl StartupRegistrar for RunKeyRegistrar {
    async fn is_registered(&self) -> bool {
        self.reg(&["query", RUN_KEY, "/v", APP_NAME])
            .await
            .is_some_and(|output| output.status.success())
    }

    async fn register(&self) -> bool {
        let Some(exe) = current_exe() else {
            return false;
        };
        let data = format!("\"{}\"", exe.display());

        info!("Adding {} to {}", APP_NAME, RUN_KEY);
        self.reg(&["add", RUN_KEY, "/v", APP_NAME, "/t", "REG_SZ", "/d", data.as_str(), "/f"])
            .await
            .is_some_and(|output| output.status.success())
    }

    async fn unregister(&self) -> bool {
        if !self.is_registered().await {
            return true;
        }
        info!("Removing {} from {}", APP_NAME, RUN_KEY);
        self.reg(&["delete", RUN_KEY, "/v", APP_NAME, "/f"])
            .await
            .is_some_and(|output| output.status.success())
    }
}

/// Shared behaviour of registrars that write a single file
struct EntryFile {
    path: Option<PathBuf>,
}

impl EntryFile {
    fn exists(&self) -> bool {
        self.path.as_deref().is_some_and(Path::is_file)
    }

    fn write(&self, content: &str) -> bool {
        let Some(path) = self.path.as_deref() else {
            warn!("No location available for the startup entry");
            return false;
        };

        let result = path
            .parent()
            .map_or(Ok(()), std::fs::create_dir_all)
            .and_then(|_| std::fs::write(path, content));

        match result {
            Ok(()) => {
                info!("Wrote startup entry {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to write startup entry {}: {}", path.display(), e);
                false
            }
        }
    }

    fn remove(&self) -> bool {
        let Some(path) = self.path.as_deref() else {
            return false;
        };
        if !path.exists() {
            return true;
        }
        match std::fs::remove_file(path) {
            Ok(()) => {
                info!("Removed startup entry {}", path.display());
                true
            }
            Err(e) => {
                warn!("Failed to remove startup entry {}: {}", path.display(), e);
                false
            }
        }
    }
}

/// freedesktop autostart entry under `<config dir>/autostart`
pub struct XdgAutostartRegistrar {
    entry: EntryFile,
    exe: Option<PathBuf>,
}

impl XdgAutostartRegistrar {
    pub fn new() -> Self {
        let path = dirs::config_dir().map(|dir| dir.join("autostart").join(AUTOSTART_FILE));
        Self::with_paths(path, current_exe())
    }

    /// Write to `entry_path`, pointing at `exe`
    pub fn with_paths(entry_path: Option<PathBuf>, exe: Option<PathBuf>) -> Self {
        Self {
            entry: EntryFile { path: entry_path },
            exe,
        }
    }

    fn desktop_entry(exe: &Path) -> String {
        format!(
            "[Desktop Entry]\n\
             Type=Application\n\
             Name={}\n\
             Exec=\"{}\"\n\
             X-GNOME-Autostart-enabled=true\n",
            APP_NAME,
            exe.display()
        )
    }
}

impl Default for XdgAutostartRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StartupRegistrar for XdgAutostartRegistrar {
    async fn is_registered(&self) -> bool {
        self.entry.exists()
    }

    async fn register(&self) -> bool {
        match self.exe.as_deref() {
            Some(exe) => self.entry.write(&Self::desktop_entry(exe)),
            None => false,
        }
    }

    async fn unregister(&self) -> bool {
        self.entry.remove()
    }
}

/// Per-user launch agent under `~/Library/LaunchAgents`
pub struct LaunchAgentRegistrar {
    entry: EntryFile,
    exe: Option<PathBuf>,
}

impl LaunchAgentRegistrar {
    pub fn new() -> Self {
        let path = dirs::home_dir().map(|home| {
            home.join("Library")
                .join("LaunchAgents")
                .join(format!("{}.plist", LAUNCH_AGENT_LABEL))
        });
        Self::with_paths(path, current_exe())
    }

    pub fn with_paths(entry_path: Option<PathBuf>, exe: Option<PathBuf>) -> Self {
        Self {
            entry: EntryFile { path: entry_path },
            exe,
        }
    }

    fn plist(exe: &Path) -> String {
        format!(
            r#"<?xml version="1.0" encoding="UTF-8"?>
<!DOCTYPE plist PUBLIC "-//Apple//DTD PLIST 1.0//EN" "http://www.apple.com/DTDs/PropertyList-1.0.dtd">
<plist version="1.0">
<dict>
    <key>Label</key>
    <string>{}</string>
    <key>ProgramArguments</key>
    <array>
        <string>{}</string>
    </array>
    <key>RunAtLoad</key>
    <true/>
</dict>
</plist>
"#,
            LAUNCH_AGENT_LABEL,
            exe.display()
        )
    }
}

impl Default for LaunchAgentRegistrar {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl StartupRegistrar for LaunchAgentRegistrar {
    async fn is_registered(&self) -> bool {
        self.entry.exists()
    }

    async fn register(&self) -> bool {
        match self.exe.as_deref() {
            Some(exe) => self.entry.write(&Self::plist(exe)),
            None => false,
        }
    }

    async fn unregister(&self) -> bool {
        self.entry.remove()
    }
}
