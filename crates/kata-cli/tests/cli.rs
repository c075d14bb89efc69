use std::fs;
use std::path::{Path, PathBuf};

use assert_cmd::Command;
use kata_testkit::{FakeGemini, Reply};
use predicates::str::contains;
use tempfile::TempDir;

const KEY_VAR: &str = "KATA_CLI_TEST_API_KEY";

struct TestEnv {
    tmp: TempDir,
}

impl TestEnv {
    fn new() -> Self {
        Self {
            tmp: TempDir::new().expect("create temp dir"),
        }
    }

    fn path(&self, name: &str) -> PathBuf {
        self.tmp.path().join(name)
    }

    fn cmd(&self) -> Command {
        let mut cmd = Command::cargo_bin("kata").unwrap();
        cmd.env("HOME", self.tmp.path())
            .env("XDG_CONFIG_HOME", self.path("config"))
            .env_remove(KEY_VAR)
            .env_remove("GEMINI_API_KEY");
        cmd
    }

    /// Write a config file pointing at `endpoint` and using the test key variable.
    fn config(&self, endpoint: &str) -> PathBuf {
        let path = self.path("kata.json");
        let config = serde_json::json!({
            "model": {
                "endpoint": endpoint,
                "api_key_env": KEY_VAR,
                "timeout_secs": 10,
                "max_retries": 0
            }
        });
        fs::write(&path, config.to_string()).unwrap();
        path
    }

    fn png(&self, name: &str) -> PathBuf {
        let path = self.path(name);
        let image = image::RgbImage::from_pixel(16, 16, image::Rgb([240, 240, 240]));
        image.save_with_format(&path, image::ImageFormat::Png).unwrap();
        path
    }
}

/// Fake endpoint answering every request with `text`.
fn fake_gemini(text: &str) -> FakeGemini {
    FakeGemini::start(vec![Reply::text(text)])
}

fn arg(path: &Path) -> &str {
    path.to_str().unwrap()
}

#[test]
fn help_lists_commands() {
    TestEnv::new()
        .cmd()
        .arg("--help")
        .assert()
        .success()
        .stdout(contains("extract"))
        .stdout(contains("batch"))
        .stdout(contains("config"));
}

#[test]
fn extract_without_key_fails_fast() {
    let env = TestEnv::new();
    let config = env.config("http://127.0.0.1:9");
    let image = env.png("plate.png");

    env.cmd()
        .args(["--config", arg(&config), "extract", arg(&image)])
        .assert()
        .failure()
        .stderr(contains("configuration error"))
        .stderr(contains(KEY_VAR));
}

#[test]
fn extract_rejects_unsupported_file() {
    let env = TestEnv::new();
    let input = env.path("plate.gif");
    fs::write(&input, b"GIF89a").unwrap();

    env.cmd()
        .env(KEY_VAR, "k")
        .args(["extract", arg(&input)])
        .assert()
        .failure()
        .stderr(contains("Unsupported file format"));
}

#[test]
fn extract_missing_file() {
    let env = TestEnv::new();

    env.cmd()
        .args(["extract", arg(&env.path("nope.jpg"))])
        .assert()
        .failure()
        .stderr(contains("Input file not found"));
}

#[test]
fn extract_prints_table() {
    let env = TestEnv::new();
    let fake = fake_gemini(
        "```json\n{\"型番\": \"AY-L22DH\", \"製造年\": \"2019\", \"定格暖房能力\": {\"標準\": \"2.5kW\", \"低温\": \"3.6kW\"}}\n```",
    );
    let config = env.config(fake.url());
    let image = env.png("plate.png");

    env.cmd()
        .env(KEY_VAR, "test-key")
        .args(["--config", arg(&config), "extract", arg(&image)])
        .assert()
        .success()
        .stdout(contains("AY-L22DH"))
        .stdout(contains("2019"))
        .stdout(contains("3.6kW"));

    assert_eq!(fake.requests().len(), 1);
}

#[test]
fn extract_rejects_empty_model_override() {
    let env = TestEnv::new();
    let fake = fake_gemini("{}");
    let config = env.config(fake.url());
    let image = env.png("plate.png");

    env.cmd()
        .env(KEY_VAR, "test-key")
        .args(["--config", arg(&config), "extract", "--model", "", arg(&image)])
        .assert()
        .failure()
        .stderr(contains("model.name must not be empty"));

    assert!(fake.requests().is_empty());
}

#[test]
fn extract_reports_unparseable_answer() {
    let env = TestEnv::new();
    let fake = fake_gemini("型番は AY-L22DH です。");
    let config = env.config(fake.url());
    let image = env.png("plate.png");

    env.cmd()
        .env(KEY_VAR, "test-key")
        .args(["--config", arg(&config), "extract", arg(&image)])
        .assert()
        .failure()
        .stderr(contains("Model response:"))
        .stderr(contains("型番は AY-L22DH です。"));
}

#[test]
fn extract_raw_prints_model_text() {
    let env = TestEnv::new();
    let fake = fake_gemini("型番は AY-L22DH です。");
    let config = env.config(fake.url());
    let image = env.png("plate.png");

    env.cmd()
        .env(KEY_VAR, "test-key")
        .args(["--config", arg(&config), "extract", "--raw", arg(&image)])
        .assert()
        .success()
        .stdout(contains("型番は AY-L22DH です。"));
}

#[test]
fn config_init_then_get_and_set() {
    let env = TestEnv::new();

    env.cmd().args(["config", "init"]).assert().success();
    env.cmd()
        .args(["config", "get", "model.name"])
        .assert()
        .success()
        .stdout(contains("gemini-1.5-flash"));

    env.cmd()
        .args(["config", "set", "model.timeout_secs", "30"])
        .assert()
        .success();
    env.cmd()
        .args(["config", "get", "model.timeout_secs"])
        .assert()
        .success()
        .stdout(contains("30"));

    env.cmd()
        .args(["config", "set", "model.api_key", "secret"])
        .assert()
        .failure();
}

#[test]
fn batch_without_matches() {
    let env = TestEnv::new();
    let pattern = env.path("*.jpg");

    env.cmd()
        .args(["batch", arg(&pattern)])
        .assert()
        .failure()
        .stderr(contains("No matching files"));
}

#[test]
fn batch_keeps_model_text_of_unparseable_answers() {
    let env = TestEnv::new();
    let fake = fake_gemini("型番は AY-L22DH です。");
    let config = env.config(fake.url());
    env.png("a.png");
    env.png("b.png");
    let out = env.path("out");

    env.cmd()
        .env(KEY_VAR, "test-key")
        .args([
            "--config",
            arg(&config),
            "batch",
            arg(&env.path("*.png")),
            "--continue-on-error",
            "--summary",
            "--output-dir",
            arg(&out),
        ])
        .assert()
        .success()
        .stderr(contains("Model response:"))
        .stderr(contains("型番は AY-L22DH です。"))
        .stdout(contains("0 successful, 2 failed"));

    let summary = fs::read_to_string(out.join("summary.csv")).unwrap();
    assert!(summary.lines().next().unwrap().ends_with(",error,raw_response"));
    assert_eq!(summary.matches("型番は AY-L22DH です。").count(), 2);
    assert_eq!(fake.requests().len(), 2);
}
