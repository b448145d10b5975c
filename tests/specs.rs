//! Workspace-level end-to-end specs, driving the built `recon` binary
//! exactly as an operator would (spec §6).

mod prelude {
    use assert_cmd::assert::Assert;
    use assert_cmd::Command;
    use std::path::{Path, PathBuf};

    pub struct Project {
        dir: tempfile::TempDir,
    }

    impl Project {
        pub fn empty() -> Self {
            Self { dir: tempfile::tempdir().expect("tempdir") }
        }

        pub fn path(&self) -> &Path {
            self.dir.path()
        }

        pub fn file(&self, relative: &str, contents: &str) -> PathBuf {
            let path = self.dir.path().join(relative);
            if let Some(parent) = path.parent() {
                std::fs::create_dir_all(parent).expect("create parent dir");
            }
            std::fs::write(&path, contents).expect("write fixture file");
            path
        }

        pub fn recon(&self) -> Command {
            let mut cmd = Command::cargo_bin("recon").expect("recon binary");
            cmd.current_dir(self.dir.path());
            cmd
        }
    }

    pub fn recon() -> Command {
        Command::cargo_bin("recon").expect("recon binary")
    }

    pub trait AssertExt {
        fn passes(self) -> Assert;
        fn fails(self) -> Assert;
    }

    impl AssertExt for Assert {
        fn passes(self) -> Assert {
            self.success()
        }

        fn fails(self) -> Assert {
            self.failure()
        }
    }
}

mod cli {
    use crate::prelude::*;
    use predicates::str::contains;

    #[test]
    fn no_mode_and_no_monitor_targets_exits_nonzero() {
        let project = Project::empty();
        project
            .recon()
            .assert()
            .fails()
            .code(1)
            .stderr(contains("--mode"));
    }

    #[test]
    fn monitor_targets_with_onetime_mode_is_rejected() {
        let project = Project::empty();
        let mt = project.file("monitor.txt", "example.com\n");
        project
            .recon()
            .arg("--mode")
            .arg("onetime")
            .arg("--monitor-targets")
            .arg(&mt)
            .assert()
            .fails()
            .code(1)
            .stderr(contains("automated"));
    }

    #[test]
    fn onetime_mode_without_scan_targets_is_rejected() {
        let project = Project::empty();
        project
            .recon()
            .arg("--mode")
            .arg("onetime")
            .assert()
            .fails()
            .code(1)
            .stderr(contains("--scan-targets"));
    }

    #[test]
    fn onetime_mode_with_all_comment_scan_targets_file_exits_zero() {
        let project = Project::empty();
        let targets = project.file("scan.txt", "# nothing but comments\n\n");
        let config = project.file(
            "config.yaml",
            &format!("storage_config:\n  parquet_base_path: {}\n", project.path().join("data").display()),
        );

        project
            .recon()
            .arg("--mode")
            .arg("onetime")
            .arg("--scan-targets")
            .arg(&targets)
            .arg("--globalconfig")
            .arg(&config)
            .assert()
            .passes();
    }

    #[test]
    fn onetime_mode_with_scan_targets_runs_to_completion() {
        let project = Project::empty();
        let targets = project.file("scan.txt", "example.com\n");
        let config = project.file(
            "config.yaml",
            &format!("storage_config:\n  parquet_base_path: {}\n", project.path().join("data").display()),
        );

        project
            .recon()
            .arg("--mode")
            .arg("onetime")
            .arg("--scan-targets")
            .arg(&targets)
            .arg("--globalconfig")
            .arg(&config)
            .assert()
            .passes();

        assert!(project.path().join("data").exists(), "storage root must be created");
    }
}

mod config {
    use crate::prelude::*;
    use predicates::str::contains;

    #[test]
    fn validate_accepts_a_well_formed_config() {
        let project = Project::empty();
        let config = project.file(
            "config.yaml",
            &format!("storage_config:\n  parquet_base_path: {}\n", project.path().join("data").display()),
        );

        project
            .recon()
            .args(["config", "validate", "--globalconfig"])
            .arg(&config)
            .assert()
            .passes()
            .stdout(contains("valid"));
    }

    #[test]
    fn validate_rejects_a_config_failing_validation() {
        let project = Project::empty();
        let config = project.file(
            "config.yaml",
            "resource_limiter_config:\n  memory_threshold: 5.0\n",
        );

        project
            .recon()
            .args(["config", "validate", "--globalconfig"])
            .arg(&config)
            .assert()
            .fails()
            .code(1);
    }

    #[test]
    fn validate_without_a_config_path_is_a_usage_error() {
        let project = Project::empty();
        project.recon().args(["config", "validate"]).assert().fails().code(1);
    }
}
