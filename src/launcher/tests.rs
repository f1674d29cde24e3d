//! Tests for the launcher module

#[cfg(test)]
mod tests {
    use super::super::*;
    use crate::config::Configuration;
    use crate::locator::{Candidate, CandidateLocator};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::Mutex;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingLauncher {
        launched: Mutex<Vec<(PathBuf, String)>>,
    }

    #[async_trait]
    impl ProcessLauncher for RecordingLauncher {
        async fn launch(&self, path: &Path, arguments: &str) -> bool {
            self.launched
                .lock()
                .unwrap()
                .push((path.to_path_buf(), arguments.to_string()));
            true
        }
    }

    fn client_launcher(
        store: Arc<ConfigStore>,
        candidates: Vec<Candidate>,
    ) -> (ClientLauncher, Arc<RecordingLauncher>) {
        let recorder = Arc::new(RecordingLauncher::default());
        let launcher = ClientLauncher::new(
            store,
            Arc::new(CandidateLocator::new(candidates)),
            recorder.clone(),
        );
        (launcher, recorder)
    }

    #[test]
    fn test_split_arguments() {
        assert!(split_arguments("").is_empty());
        assert!(split_arguments("   ").is_empty());
        assert_eq!(split_arguments("--a  -b c"), vec!["--a", "-b", "c"]);
        assert_eq!(
            split_arguments(r#"--store "Main St" --path C:\data"#),
            vec!["--store", "Main St", "--path", r"C:\data"]
        );
        assert_eq!(split_arguments(r#"--name \"x\""#), vec!["--name", "\"x\""]);
        assert_eq!(split_arguments(r#"--empty """#), vec!["--empty", ""]);
    }

    #[test]
    fn test_join_arguments_quotes_when_needed() {
        let joined = join_arguments(&["--store", "Main St", ""]);
        assert_eq!(joined, r#"--store "Main St" """#);
        assert_eq!(split_arguments(&joined), vec!["--store", "Main St", ""]);
    }

    #[tokio::test]
    async fn test_configured_path_is_launched_without_discovery() {
        let dir = tempdir().unwrap();
        let exe = dir.path().join("client");
        fs::write(&exe, "").unwrap();
        let decoy = dir.path().join("decoy");
        fs::write(&decoy, "").unwrap();

        let store = Arc::new(ConfigStore::open(dir.path().join("config.toml")));
        store
            .update_client_settings(&exe.display().to_string(), "--kiosk")
            .unwrap();

        let (launcher, recorder) = client_launcher(store, vec![Candidate::Executable(decoy)]);
        assert!(launcher.launch_client().await);
        assert_eq!(
            *recorder.launched.lock().unwrap(),
            vec![(exe, "--kiosk".to_string())]
        );
    }

    #[tokio::test]
    async fn test_discovery_picks_first_candidate_and_updates_config() {
        let dir = tempdir().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        fs::write(&first, "").unwrap();
        fs::write(&second, "").unwrap();

        let config_path = dir.path().join("config.toml");
        let store = Arc::new(ConfigStore::open(&config_path));
        store
            .update_client_settings("/stale/path/client", "--old")
            .unwrap();

        let (launcher, recorder) = client_launcher(
            store.clone(),
            vec![
                Candidate::Executable(first.clone()),
                Candidate::Executable(second),
            ],
        );
        assert!(launcher.launch_client().await);

        let expected = first.display().to_string();
        assert_eq!(store.get().client_executable_path, expected);
        assert_eq!(store.get().client_arguments, "");
        assert_eq!(
            ConfigStore::open(&config_path).get().client_executable_path,
            expected
        );
        assert_eq!(recorder.launched.lock().unwrap()[0].0, first);
    }

    #[tokio::test]
    async fn test_no_client_available_spawns_nothing() {
        let dir = tempdir().unwrap();
        let store = Arc::new(ConfigStore::open(dir.path().join("config.toml")));
        assert_eq!(store.get(), Configuration::default());

        let (launcher, recorder) = client_launcher(
            store,
            vec![Candidate::Executable(dir.path().join("missing"))],
        );
        assert!(!launcher.launch_client().await);
        assert!(recorder.launched.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_spawn_launcher_missing_executable() {
        let dir = tempdir().unwrap();
        assert!(!SpawnLauncher.launch(&dir.path().join("missing"), "").await);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_spawn_launcher_running_process() {
        let sleep = which::which("sleep").unwrap();
        assert!(SpawnLauncher.launch(&sleep, "2").await);
    }

    /// Process group id from a `/proc/<pid>/stat` line
    #[cfg(target_os = "linux")]
    fn process_group(stat: &str) -> Option<i32> {
        let (_, rest) = stat.rsplit_once(')')?;
        rest.split_whitespace().nth(2)?.parse().ok()
    }

    #[cfg(target_os = "linux")]
    #[tokio::test]
    async fn test_spawned_client_gets_its_own_process_group() {
        let dir = tempdir().unwrap();
        let stat_path = dir.path().join("stat");
        let script = format!("cat /proc/self/stat > {}; sleep 1", stat_path.display());
        let args = join_arguments(&["-c", script.as_str()]);

        assert!(SpawnLauncher.launch(Path::new("/bin/sh"), &args).await);

        let mut client_stat = String::new();
        for _ in 0..50 {
            client_stat = fs::read_to_string(&stat_path).unwrap_or_default();
            if client_stat.ends_with('\n') {
                break;
            }
            tokio::time::sleep(std::time::Duration::from_millis(50)).await;
        }

        let launcher_stat = fs::read_to_string("/proc/self/stat").unwrap();
        let client_group = process_group(&client_stat).expect("client wrote its stat line");
        assert_ne!(client_group, process_group(&launcher_stat).unwrap());
    }
}
