use repo_store::{EntryType, FileStore, MemoryFileStore, StoreError};
use std::fs;
use tempfile::tempdir;

#[tokio::test]
async fn test_memory_store_crud() {
    let store = MemoryFileStore::new();

    // Create
    let created = store
        .create("src/main.py", "print('hi')", "add main")
        .await
        .unwrap();
    let first_rev = created.revision_id.clone().unwrap();
    assert!(created.commit_id.is_some());

    // Read
    let blob = store.get("src/main.py").await.unwrap();
    assert_eq!(blob.content, "print('hi')");
    assert_eq!(blob.revision_id, first_rev);
    assert_eq!(blob.name, "main.py");
    assert!(blob.encoding.is_none());

    // Update with the current revision
    let updated = store
        .update("src/main.py", "print('bye')", "edit main", &first_rev)
        .await
        .unwrap();
    let second_rev = updated.revision_id.unwrap();
    assert_ne!(first_rev, second_rev);
    assert_eq!(store.content_of("src/main.py").unwrap(), "print('bye')");

    // Delete
    let deleted = store
        .delete("src/main.py", "drop main", &second_rev)
        .await
        .unwrap();
    assert!(deleted.revision_id.is_none());
    assert!(!store.contains("src/main.py"));
}

#[tokio::test]
async fn test_memory_store_rejects_stale_revision() {
    let store = MemoryFileStore::new();
    let rev = store.seed("a.txt", "one");
    store.update("a.txt", "two", "edit", &rev).await.unwrap();

    let err = store.update("a.txt", "three", "edit", &rev).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));

    let err = store.delete("a.txt", "drop", &rev).await.unwrap_err();
    assert!(matches!(err, StoreError::Conflict(_)));
    assert_eq!(store.content_of("a.txt").unwrap(), "two");
}

#[tokio::test]
async fn test_memory_store_create_conflict_and_missing_paths() {
    let store = MemoryFileStore::new();
    store.seed("README.md", "# hi");

    let err = store.create("README.md", "again", "dup").await.unwrap_err();
    assert!(err.is_conflict());

    assert!(store.get("nope.md").await.unwrap_err().is_not_found());
    assert!(store
        .update("nope.md", "x", "edit", "abc")
        .await
        .unwrap_err()
        .is_not_found());
    assert!(store.list("missing", None).await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_memory_store_listing() {
    let store = MemoryFileStore::new();
    assert!(store.list("", None).await.unwrap().is_empty());

    store.seed("README.md", "# readme");
    store.seed("utils/git_repo.py", "x");
    store.seed("utils/github_agent.py", "y");
    store.seed("utils/nested/deep.py", "z");

    let root = store.list("", None).await.unwrap();
    let names: Vec<_> = root.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(names, vec!["README.md", "utils"]);
    assert_eq!(root[1].entry_type, EntryType::Dir);

    let utils = store.list("utils", None).await.unwrap();
    let names: Vec<_> = utils.iter().map(|e| e.path.as_str()).collect();
    assert_eq!(
        names,
        vec!["utils/git_repo.py", "utils/github_agent.py", "utils/nested"]
    );

    // "/" is the same root
    assert_eq!(store.list("/", None).await.unwrap().len(), 2);
    assert_eq!(store.list("", Some("main")).await.unwrap().len(), 2);
    assert!(store
        .list("", Some("no-such-branch"))
        .await
        .unwrap_err()
        .is_not_found());
}

#[tokio::test]
async fn test_memory_store_history_and_refs() {
    let store = MemoryFileStore::new();
    let rev = store.seed("a.txt", "one");
    store.update("a.txt", "two", "second edit", &rev).await.unwrap();
    store.seed("b.txt", "other");

    let history = store.commit_history("a.txt").await.unwrap();
    assert_eq!(history.len(), 2);
    assert_eq!(history[0].message, "second edit");

    let main = store.get_ref("main").await.unwrap();
    let feature = store.create_ref("feature", &main.revision_id).await.unwrap();
    assert_eq!(feature.revision_id, main.revision_id);

    let err = store.create_ref("refs/heads/feature", &main.revision_id).await.unwrap_err();
    assert!(err.is_conflict());
    assert!(store.get_ref("ghost").await.unwrap_err().is_not_found());
}

#[tokio::test]
async fn test_memory_store_base64_blobs() {
    let store = MemoryFileStore::new().with_base64_blobs();
    store.seed("hello.txt", "hello world");
    let blob = store.get("hello.txt").await.unwrap();
    assert_eq!(blob.encoding.as_deref(), Some("base64"));
    assert_eq!(blob.content, "aGVsbG8gd29ybGQ=");
}

#[tokio::test]
async fn test_memory_store_from_dir() {
    let temp_dir = tempdir().unwrap();
    let root = temp_dir.path();
    fs::create_dir_all(root.join("src")).unwrap();
    fs::create_dir_all(root.join(".git")).unwrap();
    fs::write(root.join("src/lib.rs"), "pub fn x() {}").unwrap();
    fs::write(root.join("README.md"), "# readme").unwrap();
    fs::write(root.join(".git/HEAD"), "ref: refs/heads/main").unwrap();

    let store = MemoryFileStore::from_dir(root).unwrap();
    assert_eq!(store.file_count(), 2);
    assert_eq!(store.content_of("src/lib.rs").unwrap(), "pub fn x() {}");
    assert!(!store.contains(".git/HEAD"));
}
