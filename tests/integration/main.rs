//! Integration tests for modbake

mod cli_tests {
    use assert_cmd::{cargo::cargo_bin_cmd, Command};
    use predicates::prelude::*;
    use std::fs;
    use std::path::{Path, PathBuf};
    use tempfile::TempDir;

    /// Isolated data root and config file for one test
    struct Sandbox {
        temp: TempDir,
    }

    impl Sandbox {
        fn new() -> Self {
            Self {
                temp: TempDir::new().unwrap(),
            }
        }

        fn data_root(&self) -> PathBuf {
            self.temp.path().join("data")
        }

        fn config_path(&self) -> PathBuf {
            self.temp.path().join("config/config.toml")
        }

        fn modbake(&self) -> Command {
            let mut cmd = cargo_bin_cmd!("modbake");
            cmd.env("MODBAKE_CONFIG", self.config_path())
                .env("MODBAKE_DATA_ROOT", self.data_root());
            cmd
        }

        fn add_base(&self, name: &str) -> PathBuf {
            let base = self.data_root().join("games").join(name);
            fs::create_dir_all(&base).unwrap();
            fs::write(base.join("modinfo.lua"), "return { name = 'demo' }").unwrap();
            fs::write(base.join("data.txt"), "base").unwrap();
            base
        }

        fn add_overlay(&self, name: &str, content: &str) -> PathBuf {
            let overlay = self.temp.path().join("overlays").join(name);
            fs::create_dir_all(&overlay).unwrap();
            fs::write(overlay.join("data.txt"), content).unwrap();
            overlay
        }
    }

    fn overlay_arg(name: &str, version: &str, path: &Path) -> String {
        format!("{}:{}:{}", name, version, path.display())
    }

    fn bake_json(sandbox: &Sandbox, overlay: &str) -> serde_json::Value {
        let output = sandbox
            .modbake()
            .args(["bake", "demo", "--engine", "ev1", "--format", "json"])
            .args(["--overlay", overlay])
            .output()
            .unwrap();
        assert!(output.status.success(), "bake failed: {:?}", output);
        serde_json::from_slice(&output.stdout).unwrap()
    }

    #[test]
    fn help_displays() {
        cargo_bin_cmd!("modbake")
            .arg("--help")
            .assert()
            .success()
            .stdout(predicate::str::contains("bake game overlays"));
    }

    #[test]
    fn version_displays() {
        cargo_bin_cmd!("modbake")
            .arg("--version")
            .assert()
            .success()
            .stdout(predicate::str::contains("modbake"));
    }

    #[test]
    fn config_path_honours_env() {
        let sandbox = Sandbox::new();
        sandbox
            .modbake()
            .args(["config", "path"])
            .assert()
            .success()
            .stdout(predicate::str::contains("config.toml"));
    }

    #[test]
    fn config_init_then_show() {
        let sandbox = Sandbox::new();
        sandbox
            .modbake()
            .args(["config", "init"])
            .assert()
            .success();
        assert!(sandbox.config_path().exists());

        sandbox
            .modbake()
            .args(["config", "show"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[cache]"))
            .stdout(predicate::str::contains("max_age_days = 7"));
    }

    #[test]
    fn bake_then_reuse() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo.sdd");
        let patch = sandbox.add_overlay("patch", "patched");
        let arg = overlay_arg("patch", "v1", &patch);

        let first = bake_json(&sandbox, &arg);
        assert_eq!(first["was_cached"], false);
        assert_eq!(
            first["hash"],
            "e4ea396bb511ba99049a6fa89b387396e76838c797b55b5eb48157f3e62907b2"
        );
        assert_eq!(first["name"], "baked-e4ea396bb511ba99");

        let path = PathBuf::from(first["archive_path"].as_str().unwrap());
        assert!(path.starts_with(sandbox.data_root().join("baked-games")));
        assert_eq!(fs::read_to_string(path.join("data.txt")).unwrap(), "patched");
        let manifest = fs::read_to_string(path.join("modinfo.lua")).unwrap();
        assert!(manifest.contains("baked-e4ea396bb511ba99"));

        let second = bake_json(&sandbox, &arg);
        assert_eq!(second["was_cached"], true);
        assert_eq!(second["archive_path"], first["archive_path"]);
    }

    #[test]
    fn bake_plain_prints_path() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo.sdd");

        sandbox
            .modbake()
            .args(["bake", "demo", "--engine", "ev1", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("baked-games"));
    }

    #[test]
    fn bake_missing_base_fails() {
        let sandbox = Sandbox::new();

        sandbox
            .modbake()
            .args(["bake", "ghost", "--engine", "ev1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"))
            .stderr(predicate::str::contains("Hint:"));
    }

    #[test]
    fn bake_missing_overlay_leaves_cache_empty() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo.sdd");
        let missing = sandbox.temp.path().join("nowhere");

        sandbox
            .modbake()
            .args(["bake", "demo", "--engine", "ev1"])
            .args(["--overlay", &overlay_arg("gone", "1", &missing)])
            .assert()
            .failure()
            .stderr(predicate::str::contains("nowhere"));

        sandbox
            .modbake()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("[]"));
    }

    #[test]
    fn bake_rejects_malformed_overlay() {
        let sandbox = Sandbox::new();

        sandbox
            .modbake()
            .args(["bake", "demo", "--engine", "ev1", "--overlay", "patch"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("NAME:VERSION:PATH"));
    }

    #[test]
    fn list_shows_baked_games() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo.sdd");
        let patch = sandbox.add_overlay("patch", "patched");
        bake_json(&sandbox, &overlay_arg("patch", "v1", &patch));

        sandbox
            .modbake()
            .args(["list", "--format", "plain"])
            .assert()
            .success()
            .stdout(predicate::str::contains("baked-e4ea396bb511ba99"));

        sandbox
            .modbake()
            .args(["list", "--format", "json"])
            .assert()
            .success()
            .stdout(predicate::str::contains("demo + patch v1"));
    }

    #[test]
    fn resolve_prints_base_path() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo-test.sdd");

        sandbox
            .modbake()
            .args(["resolve", "DEMO", "--engine", "ev1"])
            .assert()
            .success()
            .stdout(predicate::str::contains("demo-test.sdd"));
    }

    #[test]
    fn resolve_missing_base_fails() {
        let sandbox = Sandbox::new();

        sandbox
            .modbake()
            .args(["resolve", "ghost", "--engine", "ev1"])
            .assert()
            .failure()
            .stderr(predicate::str::contains("not found"));
    }

    #[test]
    fn fingerprint_matches_bake_key() {
        cargo_bin_cmd!("modbake")
            .args(["fingerprint", "demo", "--engine", "ev1", "--overlay", "patch:v1"])
            .assert()
            .success()
            .stdout(predicate::str::contains(
                "e4ea396bb511ba99049a6fa89b387396e76838c797b55b5eb48157f3e62907b2",
            ))
            .stdout(predicate::str::contains("baked-e4ea396bb511ba99"));
    }

    #[test]
    fn sweep_empty_cache() {
        let sandbox = Sandbox::new();

        sandbox
            .modbake()
            .args(["sweep", "--dry-run"])
            .assert()
            .success()
            .stdout(predicate::str::contains("No baked games older than 7 days"));

        sandbox
            .modbake()
            .arg("sweep")
            .assert()
            .success()
            .stdout(predicate::str::contains("removed 0 baked game(s)"));
    }

    #[test]
    fn sweep_keeps_fresh_bakes() {
        let sandbox = Sandbox::new();
        sandbox.add_base("demo.sdd");
        let patch = sandbox.add_overlay("patch", "patched");
        let baked = bake_json(&sandbox, &overlay_arg("patch", "v1", &patch));

        sandbox
            .modbake()
            .args(["sweep", "--days", "1"])
            .assert()
            .success();

        let path = PathBuf::from(baked["archive_path"].as_str().unwrap());
        assert!(path.exists());
    }

    #[test]
    fn sweep_disabled_with_zero_days() {
        let sandbox = Sandbox::new();

        sandbox
            .modbake()
            .args(["sweep", "--days", "0"])
            .assert()
            .success()
            .stdout(predicate::str::contains("disabled"));
    }
}
