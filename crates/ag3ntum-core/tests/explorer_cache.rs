//! Explorer and TTL cache driven against an in-memory workspace.

mod common;

use ag3ntum_core::cache::{CacheConfig, EntryState, TtlCache};
use ag3ntum_core::explorer::render_tree;
use ag3ntum_core::types::{SortField, UploadFile, UploadOutcome};
use ag3ntum_core::{ConsoleError, FileExplorer, FileService, FolderState};
use common::{MemoryWorkspace, SESSION};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

fn workspace() -> Arc<MemoryWorkspace> {
    Arc::new(MemoryWorkspace::with_files(&[
        ("README.md", "# readme"),
        ("src/main.rs", "fn main() {}"),
        ("src/util/fmt.rs", "pub fn fmt() {}"),
        ("docs/guide.md", "guide"),
    ]))
}

#[tokio::test]
async fn browse_delete_and_upload() {
    let files = workspace();
    let explorer = FileExplorer::new(SESSION, files.clone());

    explorer.load_root().await.unwrap();
    explorer.expand("src").await.unwrap();
    assert_eq!(
        render_tree(&explorer.snapshot().await),
        [
            "  · README.md  8 B",
            "  ▸ docs/",
            "  ▾ src/",
            "    · main.rs  12 B",
            "    ▸ util/",
        ]
        .join("\n")
    );

    explorer.delete("src/main.rs").await.unwrap();
    assert!(!files.contains("src/main.rs"));
    let FolderState::Loaded(src) = explorer.folder_state("src").await else {
        panic!("src should stay loaded");
    };
    assert_eq!(src.len(), 1);

    // Deleting something that is already gone leaves the tree alone
    assert!(explorer.delete("src/main.rs").await.is_err());

    let response = explorer
        .upload(
            "src",
            vec![
                UploadFile {
                    name: "lib.rs".into(),
                    bytes: b"pub mod util;".to_vec(),
                    mime_type: None,
                },
                UploadFile {
                    name: "a-name-that-is-far-too-long-for-the-server.rs".into(),
                    bytes: Vec::new(),
                    mime_type: None,
                },
            ],
        )
        .await
        .unwrap();
    assert_eq!(response.outcome(), UploadOutcome::Partial);
    assert_eq!(response.errors[0].error, "Filename too long");

    let FolderState::Loaded(src) = explorer.folder_state("src").await else {
        panic!("src should stay loaded");
    };
    let names: Vec<&str> = src.iter().map(|f| f.name.as_str()).collect();
    assert_eq!(names, vec!["lib.rs", "util"]);
}

#[tokio::test]
async fn sort_change_reorders_root_only() {
    let files = workspace();
    let explorer = FileExplorer::new(SESSION, files.clone());
    explorer.load_root().await.unwrap();
    explorer.expand("src").await.unwrap();
    let src_before = explorer.folder_state("src").await;

    explorer.change_sort(SortField::Name).await.unwrap();
    let names: Vec<String> = explorer
        .snapshot()
        .await
        .files
        .iter()
        .map(|f| f.name.clone())
        .collect();
    assert_eq!(names, vec!["src", "docs", "README.md"]);
    assert_eq!(explorer.folder_state("src").await, src_before);
}

#[tokio::test(start_paused = true)]
async fn navigation_from_a_tool_path() {
    let files = workspace();
    let explorer = FileExplorer::new(SESSION, files.clone());
    explorer.load_root().await.unwrap();

    let target = explorer.navigate_to("workspace/src/util/fmt.rs").await.unwrap();
    assert_eq!(target, "src/util/fmt.rs");

    let rows = explorer.visible_rows().await;
    let highlighted: Vec<&str> = rows
        .iter()
        .filter(|r| r.highlighted)
        .map(|r| r.path.as_str())
        .collect();
    assert_eq!(highlighted, vec!["src/util/fmt.rs"]);
    assert_eq!(rows.iter().find(|r| r.path == "src/util/fmt.rs").map(|r| r.depth), Some(2));

    tokio::time::sleep(Duration::from_secs(4)).await;
    assert!(explorer.visible_rows().await.iter().all(|r| !r.highlighted));
}

#[tokio::test]
async fn cache_shares_one_listing_fetch() {
    let files = workspace();
    let cache: TtlCache<usize> = TtlCache::new(CacheConfig::new(Duration::from_secs(60)));
    let fetches = Arc::new(AtomicUsize::new(0));

    let fetcher = || {
        let files = files.clone();
        let fetches = fetches.clone();
        async move {
            fetches.fetch_add(1, Ordering::SeqCst);
            tokio::task::yield_now().await;
            let listing = files
                .list_files(SESSION, ".", &Default::default())
                .await?;
            Ok::<_, ConsoleError>(listing.total_count)
        }
    };

    let (a, b) = tokio::join!(cache.get("root", fetcher, None), cache.get("root", fetcher, None));
    assert_eq!(a.unwrap(), 3);
    assert_eq!(b.unwrap(), 3);
    assert_eq!(fetches.load(Ordering::SeqCst), 1);
    assert_eq!(files.list_count(), 1);
    assert_eq!(cache.state("root"), EntryState::Fresh);

    cache.invalidate("root");
    assert_eq!(cache.state("root"), EntryState::Absent);
    assert_eq!(cache.get("root", fetcher, None).await.unwrap(), 3);
    assert_eq!(fetches.load(Ordering::SeqCst), 2);
}
