use std::fs;
use std::path::Path;

use assert_cmd::Command;
use predicates::str::contains;
use serde_json::Value;
use tempfile::TempDir;

const EXPORT: &str = r#"{
  "5": [
    {"id": 1, "parentId": 0, "title": "Home", "url": "/"},
    {"id": 2, "parentId": 1, "title": "Team", "url": "/team"},
    {"id": 3, "parentId": 0, "title": "Blog", "url": "/blog", "target": "_blank"},
    {"id": 4, "parentId": 99, "title": "Stray", "url": "/stray"}
  ],
  "6": null
}"#;

fn workspace() -> TempDir {
    let dir = TempDir::new().expect("temp dir");
    fs::write(dir.path().join("menus.json"), EXPORT).expect("write export");
    dir
}

fn menutree(dir: &Path) -> Command {
    let mut cmd = Command::new(assert_cmd::cargo::cargo_bin!("menutree"));
    cmd.current_dir(dir)
        .env_remove("MENUTREE_CONFIG_FILE")
        .env_remove("RUST_LOG");
    cmd
}

fn ids(nodes: &Value) -> Vec<u64> {
    nodes
        .as_array()
        .expect("array of nodes")
        .iter()
        .map(|node| node["id"].as_u64().expect("numeric id"))
        .collect()
}

#[test]
fn tree_prints_organized_menu() {
    let dir = workspace();

    let assert = menutree(dir.path())
        .args(["tree", "--menu-id", "5", "--cache-backend", "none"])
        .assert()
        .success();

    let tree: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json output");
    assert_eq!(ids(&tree), vec![1, 3, 4]);
    assert_eq!(ids(&tree[0]["children"]), vec![2]);
    assert!(tree[1].get("children").is_none());
}

#[test]
fn null_menu_prints_empty_tree() {
    let dir = workspace();

    menutree(dir.path())
        .args(["tree", "--menu-id", "6", "--cache-backend", "none"])
        .assert()
        .success()
        .stdout("[]\n");
}

#[test]
fn file_cache_serves_second_run_without_source() {
    let dir = workspace();
    let cache_dir = dir.path().join("cache");
    let cache_dir = cache_dir.to_str().expect("utf8 path");

    menutree(dir.path())
        .args(["tree", "--menu-id", "5", "--cache-backend", "file"])
        .args(["--cache-dir", cache_dir])
        .assert()
        .success();
    assert!(dir.path().join("cache").join("menu_5.json").exists());

    fs::remove_file(dir.path().join("menus.json")).expect("remove export");

    let assert = menutree(dir.path())
        .args(["tree", "--menu-id", "5", "--cache-backend", "file"])
        .args(["--cache-dir", cache_dir])
        .assert()
        .success();
    let tree: Value = serde_json::from_slice(&assert.get_output().stdout).expect("json output");
    assert_eq!(ids(&tree), vec![1, 3, 4]);

    menutree(dir.path())
        .args(["tree", "--menu-id", "5", "--cache-backend", "file", "--refresh"])
        .args(["--cache-dir", cache_dir])
        .assert()
        .failure()
        .stderr(contains("menus.json"));
}

#[test]
fn render_writes_nested_html() {
    let dir = workspace();

    menutree(dir.path())
        .args(["render", "--menu-id", "5", "--template", "nested"])
        .assert()
        .success()
        .stdout(contains(r#"<ul class="menu menu--depth-1">"#))
        .stdout(contains(r#"rel="noopener noreferrer""#));
}

#[test]
fn unknown_template_fails() {
    let dir = workspace();

    menutree(dir.path())
        .args(["render", "--menu-id", "5", "--template", "mega-menu"])
        .assert()
        .failure()
        .stderr(contains("unknown menu template `mega-menu`"));
}

#[test]
fn environment_overrides_config_file() {
    let dir = workspace();
    fs::write(
        dir.path().join("menutree.toml"),
        "[source]\npath = \"missing.json\"\n",
    )
    .expect("write config");

    menutree(dir.path())
        .args(["tree", "--menu-id", "5"])
        .env("MENUTREE__SOURCE__PATH", "menus.json")
        .env("MENUTREE__CACHE__BACKEND", "none")
        .assert()
        .success();

    menutree(dir.path())
        .args(["tree", "--menu-id", "5"])
        .env_remove("MENUTREE__SOURCE__PATH")
        .assert()
        .failure()
        .stderr(contains("missing.json"));
}

#[test]
fn invalid_cache_backend_is_a_configuration_error() {
    let dir = workspace();

    menutree(dir.path())
        .args(["tree", "--menu-id", "5", "--cache-backend", "redis"])
        .assert()
        .failure()
        .stderr(contains("cache.backend"));
}
