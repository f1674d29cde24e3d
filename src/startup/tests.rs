//! Tests for the startup module

#[cfg(test)]
mod tests {
    use super::super::*;
    use tempfile::tempdir;

    #[tokio::test]
    async fn test_xdg_register_and_unregister() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("autostart").join("poslauncher.desktop");
        let registrar = XdgAutostartRegistrar::with_paths(
            Some(entry.clone()),
            Some(PathBuf::from("/usr/bin/poslauncher")),
        );

        assert!(!registrar.is_registered().await);
        assert!(registrar.register().await);
        assert!(registrar.is_registered().await);

        let content = std::fs::read_to_string(&entry).unwrap();
        assert!(content.contains("[Desktop Entry]"));
        assert!(content.contains("Exec=\"/usr/bin/poslauncher\""));

        assert!(registrar.unregister().await);
        assert!(!registrar.is_registered().await);
        // Removing an absent entry is not a failure
        assert!(registrar.unregister().await);
    }

    #[tokio::test]
    async fn test_ensure_registered_only_writes_once() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("poslauncher.desktop");
        std::fs::write(&entry, "existing").unwrap();

        let registrar =
            XdgAutostartRegistrar::with_paths(Some(entry.clone()), Some(PathBuf::from("/bin/x")));
        assert!(registrar.ensure_registered().await);
        assert_eq!(std::fs::read_to_string(&entry).unwrap(), "existing");
    }

    #[tokio::test]
    async fn test_register_without_location_fails() {
        let registrar = XdgAutostartRegistrar::with_paths(None, Some(PathBuf::from("/bin/x")));
        assert!(!registrar.is_registered().await);
        assert!(!registrar.register().await);
        assert!(!registrar.unregister().await);
    }

    #[tokio::test]
    async fn test_launch_agent_plist() {
        let dir = tempdir().unwrap();
        let entry = dir.path().join("com.poslauncher.launcher.plist");
        let registrar = LaunchAgentRegistrar::with_paths(
            Some(entry.clone()),
            Some(PathBuf::from("/Applications/POSLauncher")),
        );

        assert!(registrar.register().await);
        let content = std::fs::read_to_string(&entry).unwrap();
        assert!(content.contains("<string>com.poslauncher.launcher</string>"));
        assert!(content.contains("<string>/Applications/POSLauncher</string>"));
        assert!(content.contains("<key>RunAtLoad</key>"));
    }
}
