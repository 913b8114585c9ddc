use std::{
    collections::HashMap,
    env, fs,
    time::{SystemTime, UNIX_EPOCH},
};

use super::*;

fn scratch_dir(tag: &str) -> PathBuf {
    let suffix = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .expect("clock")
        .as_nanos();
    let dir = env::temp_dir().join(format!("ops_desktop_config_{tag}_{suffix}"));
    fs::create_dir_all(&dir).expect("temp dir");
    dir
}

fn no_env(_: &str) -> Option<String> {
    None
}

#[test]
fn missing_file_yields_defaults() {
    let dir = scratch_dir("missing");
    let settings = load_settings_with(&dir.join(DEFAULT_CONFIG_FILE), no_env).expect("settings");
    assert_eq!(settings, Settings::default());
    assert!(settings.credential_path.ends_with("ops_desktop/token"));
    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn file_overrides_defaults_and_env_overrides_file() {
    let dir = scratch_dir("layered");
    let path = dir.join(DEFAULT_CONFIG_FILE);
    fs::write(
        &path,
        "api_url = \"http://10.0.0.5:8000/\"\ncredential_path = \"/tmp/ops-token\"\n",
    )
    .expect("write config");

    let from_file = load_settings_with(&path, no_env).expect("settings");
    assert_eq!(from_file.api_url, "http://10.0.0.5:8000");
    assert_eq!(from_file.credential_path, PathBuf::from("/tmp/ops-token"));

    let vars: HashMap<&str, &str> = HashMap::from([
        ("API_URL", "http://plain:8000"),
        ("APP__API_URL", "http://prefixed:8000"),
        ("APP__LOG_FILTER", "debug"),
    ]);
    let layered =
        load_settings_with(&path, |key| vars.get(key).map(|v| v.to_string())).expect("settings");
    assert_eq!(layered.api_url, "http://prefixed:8000");
    assert_eq!(layered.log_filter, "debug");
    assert_eq!(layered.credential_path, PathBuf::from("/tmp/ops-token"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn malformed_file_is_reported() {
    let dir = scratch_dir("malformed");
    let path = dir.join(DEFAULT_CONFIG_FILE);
    fs::write(&path, "api_url = [1, 2").expect("write config");

    let err = load_settings_with(&path, no_env).expect_err("invalid toml");
    assert!(err.to_string().contains("invalid config file"));

    fs::remove_dir_all(dir).expect("cleanup");
}

#[test]
fn blank_api_url_falls_back_to_default() {
    let dir = scratch_dir("blank");
    let settings = load_settings_with(&dir.join(DEFAULT_CONFIG_FILE), |key| {
        (key == "APP__API_URL").then(|| "  ".to_string())
    })
    .expect("settings");
    assert_eq!(settings.api_url, "http://localhost:8000");
    fs::remove_dir_all(dir).expect("cleanup");
}
