//! Discovery of the client executable
//!
//! When the configured path is missing or stale, the launcher scans a fixed,
//! ordered list of shortcut and installation locations and takes the first one
//! that resolves to an existing file.

use std::path::{Path, PathBuf};
use tracing::{debug, info};

use crate::constants::client::{
    SHORTCUT_NAMES, SYSTEM_APPLICATIONS_DIR, UNIX_INSTALL_PATHS, WINDOWS_INSTALL_PATHS,
};
use crate::launcher::{join_arguments, split_arguments};


/// A resolved client executable and its argument string
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClientTarget {
    pub path: PathBuf,
    pub arguments: String,
}

/// Capability for finding the client when configuration has no usable path
pub trait ClientLocator: Send + Sync {
    /// First resolvable candidate in priority order
    fn discover(&self) -> Option<ClientTarget>;
}

/// One place the client might be found
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Candidate {
    /// A desktop shortcut (`.lnk` or `.desktop`)
    Shortcut(PathBuf),
    /// The executable itself
    Executable(PathBuf),
}

impl Candidate {
    pub fn path(&self) -> &Path {
        match self {
            Candidate::Shortcut(path) | Candidate::Executable(path) => path,
        }
    }
}

/// Scans an ordered candidate list
pub struct CandidateLocator {
    candidates: Vec<Candidate>,
    /// Targets a `.lnk` shortcut may point at, in priority order
    shortcut_targets: Vec<PathBuf>,
}

impl CandidateLocator {
    pub fn new(candidates: Vec<Candidate>) -> Self {
        Self {
            candidates,
            shortcut_targets: Vec::new(),
        }
    }

    pub fn with_shortcut_targets(mut self, targets: Vec<PathBuf>) -> Self {
        self.shortcut_targets = targets;
        self
    }

    pub fn candidates(&self) -> &[Candidate] {
        &self.candidates
    }

    /// Shortcuts on the common then the user desktop, then the install paths
    pub fn windows() -> Self {
        let common_desktop = std::env::var_os("PUBLIC")
            .map(|public| PathBuf::from(public).join("Desktop"));
        let desktops: Vec<PathBuf> = common_desktop
            .into_iter()
            .chain(dirs::desktop_dir())
            .collect();

        let install_paths: Vec<PathBuf> = WINDOWS_INSTALL_PATHS.iter().map(PathBuf::from).collect();

        let mut candidates = Vec::new();
        for name in SHORTCUT_NAMES {
            for desktop in &desktops {
                candidates.push(Candidate::Shortcut(desktop.join(format!("{}.lnk", name))));
            }
        }
        candidates.extend(install_paths.iter().cloned().map(Candidate::Executable));

        Self::new(candidates).with_shortcut_targets(install_paths)
    }

    /// freedesktop entries on the desktop and in the application menus, then the install paths
    pub fn unix() -> Self {
        let dirs: Vec<PathBuf> = dirs::desktop_dir()
            .into_iter()
            .chain(dirs::data_dir().map(|dir| dir.join("applications")))
            .chain(std::iter::once(PathBuf::from(SYSTEM_APPLICATIONS_DIR)))
            .collect();

        let mut candidates = Vec::new();
        for name in SHORTCUT_NAMES {
            for dir in &dirs {
                candidates.push(Candidate::Shortcut(dir.join(format!("{}.desktop", name))));
            }
        }
        candidates.extend(
            UNIX_INSTALL_PATHS
                .iter()
                .map(|path| Candidate::Executable(PathBuf::from(path))),
        );

        Self::new(candidates)
    }

    pub fn platform_default() -> Self {
        if cfg!(windows) {
            Self::windows()
        } else {
            Self::unix()
        }
    }

    fn resolve(&self, candidate: &Candidate) -> Option<ClientTarget> {
        match candidate {
            Candidate::Executable(path) => path.is_file().then(|| ClientTarget {
                path: path.clone(),
                arguments: String::new(),
            }),
            Candidate::Shortcut(path) => self.resolve_shortcut(path),
        }
    }

    fn resolve_shortcut(&self, path: &Path) -> Option<ClientTarget> {
        if !path.is_file() {
            return None;
        }

        let extension = path.extension().and_then(|ext| ext.to_str());
        let target = match extension {
            Some(ext) if ext.eq_ignore_ascii_case("desktop") => {
                let content = std::fs::read_to_string(path).ok()?;
                parse_desktop_entry(&content)
            }
            Some(ext) if ext.eq_ignore_ascii_case("lnk") => {
                self.shortcut_targets
                    .iter()
                    .find(|target| target.is_file())
                    .map(|target| ClientTarget {
                        path: target.clone(),
                        arguments: String::new(),
                    })
            }
            _ => None,
        };

        match target {
            Some(target) if target.path.is_file() => Some(target),
            Some(target) => {
                debug!(
                    "Shortcut {} points at missing {}",
                    path.display(),
                    target.path.display()
                );
                None
            }
            None => {
                debug!("Could not resolve shortcut {}", path.display());
                None
            }
        }
    }
}

impl ClientLocator for CandidateLocator {
    fn discover(&self) -> Option<ClientTarget> {
        info!("Searching {} locations for the client", self.candidates.len());

        for candidate in &self.candidates {
            debug!("Checking {}", candidate.path().display());
            if let Some(target) = self.resolve(candidate) {
                info!(
                    "Found client at {} via {}",
                    target.path.display(),
                    candidate.path().display()
                );
                return Some(target);
            }
        }

        info!("Client not found in any known location");
        None
    }
}

/// Extract the target of a freedesktop `.desktop` file's `Exec=` key
pub fn parse_desktop_entry(content: &str) -> Option<ClientTarget> {
    let mut in_entry = false;
    let mut exec = None;

    for line in content.lines().map(str::trim) {
        if line.starts_with('[') {
            in_entry = line == "[Desktop Entry]";
            continue;
        }
        if in_entry {
            if let Some(value) = line.strip_prefix("Exec=") {
                exec = Some(value.trim());
                break;
            }
        }
    }

    let mut tokens: Vec<String> = split_arguments(exec?)
        .into_iter()
        .filter(|token| !is_field_code(token))
        .map(|token| token.replace("%%", "%"))
        .collect();
    if tokens.is_empty() {
        return None;
    }

    let program = tokens.remove(0);
    let path = if Path::new(&program).is_absolute() {
        PathBuf::from(&program)
    } else {
        which::which(&program).unwrap_or_else(|_| PathBuf::from(&program))
    };

    Some(ClientTarget {
        path,
        arguments: join_arguments(&tokens),
    })
}

fn is_field_code(token: &str) -> bool {
    matches!(
        token,
        "%f" | "%F" | "%u" | "%U" | "%d" | "%D" | "%n" | "%N" | "%i" | "%c" | "%k" | "%v" | "%m"
    )
}
