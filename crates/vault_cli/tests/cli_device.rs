use std::fs;
use std::path::{Path, PathBuf};
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};

use pretty_assertions::assert_eq;
use vault_cli::cli::{parse, Command};
use vault_cli::{CliErrorCategory, CommandContext};
use vault_host::{StorageBackend, VaultConfig};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}_{}_{}", process::id(), nanos));
    fs::create_dir_all(&path).expect("create temp dir");
    path
}

fn device_context(root: &Path) -> CommandContext {
    let mut config = VaultConfig::default();
    config.storage.data_dir = root.join("data");
    config.storage.upload_dir = root.join("uploads");
    CommandContext::from_config(config, root.join("grvault.toml")).expect("context")
}

fn run(ctx: &CommandContext, raw: &[&str]) -> String {
    let invocation = parse(raw.iter().map(|arg| arg.to_string()).collect()).expect("parse");
    let mut out = Vec::new();
    ctx.run(invocation.command, &mut out).expect("run");
    String::from_utf8(out).expect("utf8")
}

fn record_id(listing: &str, name: &str) -> String {
    listing
        .lines()
        .find(|line| line.split('\t').nth(1) == Some(name))
        .and_then(|line| line.split('\t').last())
        .map(str::to_string)
        .expect("listed record")
}

#[test]
fn add_list_export_and_delete_through_commands() {
    let root = temp_dir("grvault_cli_flow");
    let inbox = root.join("inbox");
    fs::create_dir_all(&inbox).expect("inbox");
    fs::write(inbox.join("notes.txt"), b"hello vault").expect("write");
    fs::write(inbox.join("photo.png"), vec![9; 4096]).expect("write");
    let ctx = device_context(&root);

    let notes = inbox.join("notes.txt").display().to_string();
    let photo = inbox.join("photo.png").display().to_string();
    let added = run(&ctx, &["add", &notes, &photo]);
    assert_eq!(added.lines().count(), 2);
    assert!(added.starts_with("added GR-0001-"), "{added}");

    let listing = run(&ctx, &["list", "--sort", "name"]);
    let names: Vec<_> = listing
        .lines()
        .filter_map(|line| line.split('\t').nth(1))
        .collect();
    assert_eq!(names, vec!["notes.txt", "photo.png"]);
    assert!(listing.ends_with("Showing 2 of 2 files (sorted by Name)\n"), "{listing}");

    let filtered = run(&ctx, &["list", "--filter", "size=1"]);
    assert!(filtered.contains("Showing 1 of 2 files"), "{filtered}");

    let notes_id = record_id(&listing, "notes.txt");
    let shown = run(&ctx, &["show", &notes_id]);
    assert!(shown.contains("name:      notes.txt"), "{shown}");
    assert!(shown.contains("location:  /uploads/"), "{shown}");

    let out_dir = root.join("out");
    fs::create_dir_all(&out_dir).expect("out dir");
    run(&ctx, &["export", &notes_id, &out_dir.display().to_string()]);
    assert_eq!(
        fs::read(out_dir.join("notes.txt")).expect("exported"),
        b"hello vault".to_vec()
    );

    let deleted = run(&ctx, &["delete", &notes_id]);
    assert!(deleted.starts_with("deleted GR-0001-"), "{deleted}");
    let listing = run(&ctx, &["list"]);
    assert!(listing.contains("Showing 1 of 1 files"), "{listing}");

    let _ = fs::remove_dir_all(root);
}

#[test]
fn unknown_ids_and_missing_uploads_are_reported() {
    let root = temp_dir("grvault_cli_errors");
    let ctx = device_context(&root);

    let mut out = Vec::new();
    let err = ctx
        .run(Command::Delete("missing".to_string()), &mut out)
        .expect_err("unknown id");
    assert_eq!(err.category, CliErrorCategory::Validation);
    assert!(err.to_string().contains("record not found: missing"), "{err}");

    let err = ctx
        .run(Command::Add(vec![root.join("absent.txt")]), &mut out)
        .expect_err("missing file");
    assert_eq!(err.category, CliErrorCategory::Io);
    assert!(err.target.is_some());
    assert!(out.is_empty());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn health_reports_backend_and_upload_dir() {
    let root = temp_dir("grvault_cli_health");
    let ctx = device_context(&root);
    let report: serde_json::Value =
        serde_json::from_str(&run(&ctx, &["health"])).expect("json");
    assert_eq!(report["ok"], true);
    assert_eq!(report["backend"], "device");
    assert_eq!(report["records"], 0);
    assert_eq!(report["uploads"]["uploads"], 0);

    let mut config = VaultConfig::default();
    config.storage.backend = StorageBackend::Memory;
    let memory = CommandContext::from_config(config, root.join("none.toml")).expect("memory");
    let report: serde_json::Value =
        serde_json::from_str(&run(&memory, &["health"])).expect("json");
    assert_eq!(report["backend"], "memory");
    assert!(report.get("uploads").is_none());

    let mut config = VaultConfig::default();
    config.storage.backend = StorageBackend::Browser;
    let err = CommandContext::from_config(config, root.join("none.toml"))
        .err()
        .expect("browser backend is web-only");
    assert_eq!(err.category, CliErrorCategory::Storage);

    let _ = fs::remove_dir_all(root);
}
