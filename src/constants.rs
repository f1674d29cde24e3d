/// Primary (database) service identifiers
pub mod primary {
    /// Service names tried in order when probing or starting the database
    pub const CANDIDATES: &[&str] = &[
        "postgresql-x64-16",
        "postgresql-x64-15",
        "postgresql-x64-14",
        "postgresql",
        "PostgreSQL",
    ];

    /// Name reported when none of the candidates exist
    pub const CANONICAL_NAME: &str = "PostgreSQL";

    /// Display name attached to every primary probe result
    pub const DISPLAY_NAME: &str = "PostgreSQL Database Server";
}

/// Secondary (auxiliary) service identifiers
pub mod secondary {
    /// Service names tried in order
    pub const CANDIDATES: &[&str] = &["fixed"];

    /// Name reported when none of the candidates exist
    pub const CANONICAL_NAME: &str = "fixed";

    /// Display name attached to every secondary probe result
    pub const DISPLAY_NAME: &str = "JMC FIXED";
}

/// Boot registration identifiers
pub mod startup {
    /// Value name under the Windows Run key
    pub const APP_NAME: &str = "POSLauncher";

    /// Windows Run key
    pub const RUN_KEY: &str = r"HKLM\SOFTWARE\Microsoft\Windows\CurrentVersion\Run";

    /// File name of the freedesktop autostart entry
    pub const AUTOSTART_FILE: &str = "poslauncher.desktop";

    /// Label of the macOS launch agent
    pub const LAUNCH_AGENT_LABEL: &str = "com.poslauncher.launcher";
}

/// Client discovery locations
pub mod client {
    /// Shortcut file stems, in priority order
    pub const SHORTCUT_NAMES: &[&str] = &["Commerce-Client", "Commerce_Client", "Commerce Client"];

    /// Well-known Windows installation paths
    pub const WINDOWS_INSTALL_PATHS: &[&str] = &[
        r"C:\Program Files\Commerce\Commerce-Client.exe",
        r"C:\Program Files (x86)\Commerce\Commerce-Client.exe",
        r"C:\Commerce\Commerce-Client.exe",
        r"C:\Program Files\Commerce-Client\Commerce-Client.exe",
        r"C:\Program Files (x86)\Commerce-Client\Commerce-Client.exe",
    ];

    /// Well-known Unix installation paths
    pub const UNIX_INSTALL_PATHS: &[&str] = &[
        "/opt/commerce/Commerce-Client",
        "/usr/local/bin/Commerce-Client",
    ];

    /// System-wide freedesktop application directory
    pub const SYSTEM_APPLICATIONS_DIR: &str = "/usr/share/applications";
}

/// Launch sequence timing
pub mod timing {
    use std::time::Duration;

    /// Default time allowed for a service to reach Running
    pub const DEFAULT_SERVICE_TIMEOUT_SECS: u64 = 30;

    /// Delay before a UI should minimise after a successful launch
    pub const MINIMIZE_DELAY: Duration = Duration::from_secs(5);

    /// Interval between status polls while waiting on a service
    pub const SERVICE_POLL_INTERVAL: Duration = Duration::from_millis(500);
}
