//! Integration tests for Bunch

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    const FOOBAR_FINGERPRINT: &str = "8843d7f92416211de9ebb963ff4ce28125932878";

    /// Command isolated from the user's config and S3 environment
    fn bunch(dir: &Path) -> Command {
        let mut cmd = cargo_bin_cmd!("bunch");
        cmd.current_dir(dir)
            .arg("--config")
            .arg(dir.join("config.toml"))
            .arg("--no-local")
            .env_remove("BUNCH_CONFIG")
            .env_remove("S3_KEY")
            .env_remove("S3_SECRET")
            .env_remove("S3_BUCKET")
            .env_remove("S3_ENDPOINT")
            .env_remove("S3_REGION")
            .env_remove("CI");
        cmd
    }

    fn with_credentials(mut cmd: Command) -> Command {
        cmd.env("S3_KEY", "AKIDEXAMPLE")
            .env("S3_SECRET", "secret")
            .env("S3_BUCKET", "ci-deps");
        cmd
    }

    fn ruby_project() -> TempDir {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("Gemfile.lock"), "foobar").unwrap();
        dir
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("bunch")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("dependency bundle cache"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("bunch")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("bunch"));
    }

    #[test]
    fn key_prints_fingerprint() {
        let project = ruby_project();
        bunch(project.path())
            .args(["key", "--prefix", "app", "--platform", "linux-x86_64"])
            .assert()
            .success()
            .stdout(predicate::str::contains(FOOBAR_FINGERPRINT))
            .stdout(predicate::str::contains(format!(
                "app_{}_linux-x86_64",
                FOOBAR_FINGERPRINT
            )));
    }

    #[test]
    fn key_json_includes_url() {
        let project = ruby_project();
        bunch(project.path())
            .args([
                "key",
                "--prefix",
                "app",
                "--platform",
                "linux-x86_64",
                "--s3-bucket",
                "ci-deps",
                "--format",
                "json",
            ])
            .assert()
            .success()
            .stdout(predicate::str::contains(format!(
                "https://s3.amazonaws.com/ci-deps/app_{}_linux-x86_64.tar.gz",
                FOOBAR_FINGERPRINT
            )));
    }

    #[test]
    fn key_without_manifest_fails() {
        let dir = TempDir::new().unwrap();
        bunch(dir.path())
            .arg("key")
            .assert()
            .failure()
            .stderr(predicate::str::contains("No manifest found"))
            .stderr(predicate::str::contains("--manifest"));
    }

    #[test]
    fn key_unusable_directory_name_suggests_prefix() {
        let dir = tempfile::Builder::new().prefix("pkg+1").tempdir().unwrap();
        fs::write(dir.path().join("Gemfile.lock"), "foobar").unwrap();
        bunch(dir.path())
            .arg("key")
            .assert()
            .failure()
            .stderr(predicate::str::contains("as prefix"))
            .stderr(predicate::str::contains("--prefix"));
    }

    #[test]
    fn key_empty_manifest_fails() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("yarn.lock"), "").unwrap();
        bunch(dir.path())
            .arg("key")
            .assert()
            .failure()
            .stderr(predicate::str::contains("file is empty"));
    }

    #[test]
    fn status_unmarked_directory() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("package-lock.json"), "{}").unwrap();
        fs::create_dir(dir.path().join("node_modules")).unwrap();

        bunch(dir.path())
            .arg("status")
            .assert()
            .success()
            .stdout(predicate::str::contains("not a downloaded bundle"));
    }

    #[test]
    fn status_json_cached() {
        let dir = TempDir::new().unwrap();
        let bundle = dir.path().join("deps");
        fs::create_dir(&bundle).unwrap();
        fs::write(bundle.join(".bunch"), "").unwrap();

        bunch(dir.path())
            .args(["status", "--path", "deps", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("\"state\": \"cached\""));
    }

    #[test]
    fn download_into_existing_directory_fails() {
        let project = ruby_project();
        fs::create_dir_all(project.path().join("vendor/bundle")).unwrap();

        with_credentials(bunch(project.path()))
            .arg("download")
            .assert()
            .code(1)
            .stderr(predicate::str::contains("already exists"));
    }

    #[test]
    fn upload_from_cached_directory_fails() {
        let project = ruby_project();
        let bundle = project.path().join("vendor/bundle");
        fs::create_dir_all(&bundle).unwrap();
        fs::write(bundle.join(".bunch"), "{}").unwrap();

        with_credentials(bunch(project.path()))
            .args(["publish", "--prefix", "app"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("already holds a cached bundle"));
    }

    #[test]
    fn upload_missing_directory_fails() {
        let project = ruby_project();

        with_credentials(bunch(project.path()))
            .arg("upload")
            .assert()
            .failure()
            .stderr(predicate::str::contains("Path not found"));
    }

    #[test]
    fn download_without_credentials_fails() {
        let project = ruby_project();
        bunch(project.path())
            .arg("download")
            .assert()
            .failure()
            .stderr(predicate::str::contains("S3 access key is not set"))
            .stderr(predicate::str::contains("S3_KEY"));
    }

    #[test]
    fn credentials_from_config_file() {
        let project = ruby_project();
        fs::write(
            project.path().join("config.toml"),
            "[store]\naccess_key = \"AKID\"\nsecret_key = \"secret\"\n",
        )
        .unwrap();

        bunch(project.path())
            .arg("download")
            .assert()
            .failure()
            .stderr(predicate::str::contains("S3 bucket name is not set"));
    }

    #[test]
    fn config_path() {
        let dir = TempDir::new().unwrap();
        bunch(dir.path())
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_show_masks_secrets() {
        let dir = TempDir::new().unwrap();
        fs::write(
            dir.path().join("config.toml"),
            "[store]\nbucket = \"ci-deps\"\nsecret_key = \"hunter2\"\n",
        )
        .unwrap();

        bunch(dir.path())
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("ci-deps"))
            .stdout(predicate::str::contains("hunter2").not());
    }

    #[test]
    fn config_init_creates_file() {
        let dir = TempDir::new().unwrap();
        bunch(dir.path())
            .args(["config", "init"])
            .assert()
            .success();

        assert!(dir.path().join("config.toml").exists());
    }

    #[test]
    fn invalid_config_is_reported() {
        let dir = TempDir::new().unwrap();
        fs::write(dir.path().join("config.toml"), "[store\n").unwrap();

        bunch(dir.path())
            .args(["config", "show"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("Invalid configuration"));
    }
}
