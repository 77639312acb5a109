use futures::executor::block_on;
use std::fs;
use std::path::PathBuf;
use std::process;
use std::time::{SystemTime, UNIX_EPOCH};
use vault_host::BlobStore;
use vault_host_native::{UploadDirBlobStore, UPLOAD_REF_PREFIX};

fn temp_dir(prefix: &str) -> PathBuf {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_nanos();
    let path = std::env::temp_dir().join(format!("{prefix}_{}_{}", process::id(), nanos));
    fs::create_dir_all(&path).expect("create temp dir");
    path
}

#[test]
fn upload_refs_cannot_name_paths_outside_the_directory() {
    let root = temp_dir("upload_scoped_refs");
    let uploads = UploadDirBlobStore::from_root(root.join("uploads")).expect("uploads");
    fs::write(root.join("secret.txt"), "secret").expect("write outside file");

    let cases = [
        ("/uploads/../secret.txt", "`/uploads/../secret.txt` is not a valid upload file name"),
        ("/uploads/..", "`/uploads/..` is not a valid upload file name"),
        ("/uploads/", "`/uploads/` is not a valid upload file name"),
        ("/uploads/a\\b", "`/uploads/a\\b` is not a valid upload file name"),
        ("secret.txt", "`secret.txt` is not an upload reference"),
        ("mem:r1", "`mem:r1` is not an upload reference"),
    ];
    for (location_ref, expected) in cases {
        let read_err = block_on(uploads.get(location_ref)).expect_err("read must fail");
        assert_eq!(read_err, expected);
        let delete_err = block_on(uploads.delete(location_ref)).expect_err("delete must fail");
        assert_eq!(delete_err, expected);
    }
    assert!(root.join("secret.txt").exists());

    let _ = fs::remove_dir_all(root);
}

#[test]
fn stored_names_never_leave_the_directory() {
    let root = temp_dir("upload_scoped_names");
    let uploads = UploadDirBlobStore::from_root(root.join("uploads")).expect("uploads");

    let location = block_on(uploads.put("r1", "../../evil.sh", b"x")).expect("put");
    let file_name = location
        .strip_prefix(UPLOAD_REF_PREFIX)
        .expect("upload reference");
    assert!(!file_name.contains('/'), "{file_name}");
    assert!(uploads.root().join(file_name).exists());
    assert_eq!(
        block_on(uploads.get(&location)).expect("read back"),
        Some(b"x".to_vec())
    );

    let _ = fs::remove_dir_all(root);
}

#[cfg(unix)]
#[test]
fn symlinks_escaping_the_directory_are_rejected() {
    use std::os::unix::fs::symlink;

    let root = temp_dir("upload_scoped_symlink");
    let uploads = UploadDirBlobStore::from_root(root.join("uploads")).expect("uploads");
    fs::write(root.join("secret.txt"), "secret").expect("write outside file");
    symlink(root.join("secret.txt"), uploads.root().join("1-link.txt")).expect("symlink");

    let err = block_on(uploads.get("/uploads/1-link.txt")).expect_err("escape must fail");
    assert!(
        err.contains("resolves outside the upload directory"),
        "unexpected error: {err}"
    );

    let _ = fs::remove_dir_all(root);
}
