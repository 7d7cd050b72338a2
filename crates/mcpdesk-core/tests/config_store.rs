use std::collections::BTreeMap;
use std::fs;

use serde_json::{Value, json};
use tempfile::TempDir;

use mcpdesk_core::config::ConfigStore;
use mcpdesk_core::error::ConfigError;
use mcpdesk_core::types::{ServerRecord, SourceType};

fn store(temp: &TempDir) -> ConfigStore {
    ConfigStore::new(temp.path().join("claude_desktop_config.json"))
}

fn read_json(store: &ConfigStore) -> Value {
    serde_json::from_slice(&fs::read(store.config_path()).unwrap()).unwrap()
}

fn sample(name: &str) -> ServerRecord {
    let mut record = ServerRecord::new(name, "npx", vec!["-y".to_string(), format!("@mcp/{name}")]);
    record.description = format!("{name} server");
    record.category = "utility".to_string();
    record
        .env
        .insert("API_KEY".to_string(), format!("{name}-key"));
    record
}

#[test]
fn set_then_get_roundtrip() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let mut third = sample("gamma");
    third.installation_options.insert("npm".to_string());
    third.source_type = Some(SourceType::Official);
    third.enabled = false;
    let servers = vec![sample("alpha"), sample("beta"), third];

    store.set_servers(&servers).unwrap();

    assert_eq!(store.get_servers(), servers);
}

#[test]
fn order_survives_repeated_save_cycles() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let names = ["zeta", "alpha", "mu", "beta", "omega"];
    let servers: Vec<_> = names.iter().map(|n| sample(n)).collect();
    store.set_servers(&servers).unwrap();

    for _ in 0..3 {
        let current = store.get_servers();
        store.set_servers(&current).unwrap();
    }

    let loaded: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(loaded, names);

    let on_disk = read_json(&store);
    let keys: Vec<_> = on_disk["mcpServers"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, names);
}

#[test]
fn saved_config_validates_after_load() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let config = json!({
        "mcpServers": { "fs": { "command": "npx", "args": ["-y", "fs"] } },
        "theme": "dark"
    });

    store.save(&config).unwrap();

    assert!(ConfigStore::validate(&store.load().into_value()).is_ok());
    assert_eq!(read_json(&store), config);
}

#[test]
fn corrupt_file_recovers_with_error_backup() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(store.config_path(), b"{ this is not json \xff").unwrap();

    let config = store.load();

    assert_eq!(config.into_value(), json!({ "mcpServers": {} }));
    let backups = store.list_backups();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].is_error());
    assert!(backups[0].filename.ends_with("_error.json"));
    assert_eq!(
        fs::read(store.backups().path_of(&backups[0])).unwrap(),
        fs::read(store.config_path()).unwrap(),
        "corrupt file is preserved, not rewritten"
    );
}

#[test]
fn non_object_root_is_treated_as_corrupt() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(store.config_path(), "[1, 2, 3]").unwrap();

    assert!(store.get_servers().is_empty());
    assert!(store.list_backups().iter().any(|b| b.is_error()));
}

#[test]
fn fifteen_saves_keep_ten_backups() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);

    for i in 0..15 {
        store
            .save(&json!({ "mcpServers": {}, "revision": i }))
            .unwrap();
    }

    let backups = store.list_backups();
    assert_eq!(backups.len(), 10);

    // The newest backup holds the revision written just before the last save.
    let newest: Value =
        serde_json::from_slice(&fs::read(store.backups().path_of(&backups[0])).unwrap()).unwrap();
    assert_eq!(newest["revision"], json!(13));
    let oldest: Value =
        serde_json::from_slice(&fs::read(store.backups().path_of(&backups[9])).unwrap()).unwrap();
    assert_eq!(oldest["revision"], json!(4));
}

#[test]
fn duplicate_add_is_rejected() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);

    assert!(store.add_server(sample("X")).is_ok());
    let second = store.add_server(sample("X"));

    assert!(matches!(second, Err(ConfigError::Duplicate(name)) if name == "X"));
    let named_x = store
        .get_servers()
        .into_iter()
        .filter(|s| s.name == "X")
        .count();
    assert_eq!(named_x, 1);
}

#[test]
fn move_out_of_bounds_leaves_list_unchanged() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    store
        .set_servers(&[sample("a"), sample("b"), sample("c")])
        .unwrap();
    let before = fs::read(store.config_path()).unwrap();

    let result = store.move_server(0, 5);

    assert!(matches!(
        result,
        Err(ConfigError::OutOfRange {
            from: 0,
            to: 5,
            len: 3
        })
    ));
    assert_eq!(fs::read(store.config_path()).unwrap(), before);
}

#[test]
fn move_splices_element() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    store
        .set_servers(&[sample("a"), sample("b"), sample("c"), sample("d")])
        .unwrap();

    store.move_server(0, 2).unwrap();
    let names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["b", "c", "a", "d"]);

    store.move_server(3, 0).unwrap();
    let names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["d", "b", "c", "a"]);
}

#[test]
fn remove_unknown_name_fails() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    store.add_server(sample("keep")).unwrap();

    assert!(matches!(
        store.remove_server("missing"),
        Err(ConfigError::NotFound(_))
    ));
    store.remove_server("keep").unwrap();
    assert!(store.get_servers().is_empty());
}

#[test]
fn legacy_list_is_migrated_on_write() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(
        store.config_path(),
        serde_json::to_vec(&json!({
            "mcp_servers": [
                { "name": "old-one", "command": "uvx", "args": ["old"] },
                { "name": "old-two" }
            ]
        }))
        .unwrap(),
    )
    .unwrap();

    store.add_server(sample("new")).unwrap();

    let on_disk = read_json(&store);
    assert!(on_disk.get("mcp_servers").is_none());
    let keys: Vec<_> = on_disk["mcpServers"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, ["old-one", "old-two", "new"]);
    assert_eq!(on_disk["mcpServers"]["old-one"]["command"], json!("uvx"));
}

#[test]
fn unmodelled_entry_fields_survive_rewrite() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(
        store.config_path(),
        serde_json::to_vec(&json!({
            "mcpServers": {
                "remote": { "type": "http", "url": "https://example.com/mcp", "headers": { "X-Key": "1" } }
            },
            "globalShortcut": "Alt+Space"
        }))
        .unwrap(),
    )
    .unwrap();

    store.add_server(sample("local")).unwrap();

    let on_disk = read_json(&store);
    assert_eq!(on_disk["globalShortcut"], json!("Alt+Space"));
    assert_eq!(on_disk["mcpServers"]["remote"]["type"], json!("http"));
    assert_eq!(
        on_disk["mcpServers"]["remote"]["headers"],
        json!({ "X-Key": "1" })
    );
}

#[test]
fn restore_brings_back_previous_content() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    store.add_server(sample("first")).unwrap();
    store.add_server(sample("second")).unwrap();

    let restored = store.restore(None).unwrap();

    assert!(!restored.is_before_restore());
    let names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["first"]);
    assert!(store.list_backups().iter().any(|b| b.is_before_restore()));
}

#[test]
fn restore_missing_backup_fails_without_change() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    store.add_server(sample("only")).unwrap();
    store.add_server(sample("other")).unwrap();
    let entry = store.list_backups().remove(0);
    fs::remove_file(store.backups().path_of(&entry)).unwrap();

    let result = store.restore(Some(&entry));

    assert!(matches!(result, Err(ConfigError::MissingBackup(_))));
    assert_eq!(store.get_servers().len(), 2);
}

#[test]
fn catalog_record_can_be_installed() {
    use mcpdesk_core::catalog::default_catalog;

    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    let github = default_catalog()
        .into_iter()
        .find(|r| r.name == "GitHub")
        .unwrap();
    let mut env = BTreeMap::new();
    env.insert("GITHUB_TOKEN".to_string(), "ghp_test".to_string());

    store.add_server(github.to_server_record(&env)).unwrap();

    let servers = store.get_servers();
    assert_eq!(servers[0].name, "GitHub");
    assert_eq!(servers[0].category, "git");
    assert_eq!(
        servers[0].env.get("GITHUB_TOKEN").map(String::as_str),
        Some("ghp_test")
    );
}

#[test]
fn mutations_keep_entries_with_mistyped_fields() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(
        store.config_path(),
        serde_json::to_vec(&json!({
            "mcpServers": {
                "api": { "command": "node", "env": { "PORT": 8080, "DEBUG": true } },
                "nulldesc": { "command": "uvx", "description": null },
                "plain": { "command": "npx" }
            }
        }))
        .unwrap(),
    )
    .unwrap();

    let names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["api", "nulldesc", "plain"]);

    store.add_server(sample("new")).unwrap();
    store.move_server(3, 0).unwrap();
    store.set_enabled("plain", false).unwrap();
    store.remove_server("new").unwrap();

    let on_disk = read_json(&store);
    let keys: Vec<_> = on_disk["mcpServers"]
        .as_object()
        .unwrap()
        .keys()
        .cloned()
        .collect();
    assert_eq!(keys, ["api", "nulldesc", "plain"]);
    assert_eq!(
        on_disk["mcpServers"]["api"]["env"],
        json!({ "PORT": 8080, "DEBUG": true })
    );
    assert_eq!(on_disk["mcpServers"]["nulldesc"]["description"], Value::Null);
    assert_eq!(on_disk["mcpServers"]["plain"]["enabled"], json!(false));
}

#[test]
fn mutation_on_corrupt_file_takes_one_backup() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);
    fs::write(store.config_path(), "{ not json").unwrap();

    store.add_server(sample("fresh")).unwrap();

    let backups = store.list_backups();
    assert_eq!(backups.len(), 1);
    assert!(backups[0].is_error());
    assert_eq!(
        fs::read_to_string(store.backups().path_of(&backups[0])).unwrap(),
        "{ not json"
    );
    let names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    assert_eq!(names, ["fresh"]);
}

#[test]
fn concurrent_adds_from_clones_all_survive() {
    let temp = TempDir::new().unwrap();
    let store = store(&temp);

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let store = store.clone();
            scope.spawn(move || store.add_server(sample(&format!("worker-{worker}"))).unwrap());
        }
    });

    let mut names: Vec<_> = store.get_servers().into_iter().map(|s| s.name).collect();
    names.sort();
    let expected: Vec<_> = (0..8).map(|w| format!("worker-{w}")).collect();
    assert_eq!(names, expected);
}

#[test]
fn concurrent_adds_from_separate_stores_all_survive() {
    let temp = TempDir::new().unwrap();
    let path = temp.path().join("claude_desktop_config.json");

    std::thread::scope(|scope| {
        for worker in 0..8 {
            let path = path.clone();
            scope.spawn(move || {
                ConfigStore::new(path)
                    .add_server(sample(&format!("solo-{worker}")))
                    .unwrap()
            });
        }
    });

    assert_eq!(ConfigStore::new(path).get_servers().len(), 8);
}
