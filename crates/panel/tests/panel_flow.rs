use chatforest_core::testing::{at, child_of, record, with_messages};
use chatforest_core::{ChatRecord, RecordFilter, Scope};
use chatforest_panel::{
    BatchOutcome, CacheManager, CacheState, LoadSource, PanelError, RecordSource, Result,
    SessionMutations,
};
use chatforest_runtime_config::PanelConfig;
use std::collections::HashSet;
use std::sync::{Arc, Mutex};

type Store = Arc<Mutex<Vec<ChatRecord>>>;

struct StoreSource {
    store: Store,
}

impl RecordSource for StoreSource {
    fn owner(&self) -> String {
        "workspace-1".to_string()
    }

    async fn fetch(&self, preview_length: usize) -> Result<Vec<ChatRecord>> {
        let mut records = self.store.lock().expect("store lock").clone();
        for rec in &mut records {
            rec.truncate_previews(preview_length);
        }
        Ok(records)
    }
}

/// Deletes by name from the shared store; names in `refuse` are rejected
/// and names in `broken` error out.
struct StoreMutations {
    store: Store,
    refuse: HashSet<String>,
    broken: HashSet<String>,
    calls: Mutex<Vec<String>>,
}

impl StoreMutations {
    fn new(store: Store) -> Self {
        Self {
            store,
            refuse: HashSet::new(),
            broken: HashSet::new(),
            calls: Mutex::new(Vec::new()),
        }
    }
}

impl SessionMutations for StoreMutations {
    async fn open_record(&self, _id: &str) -> Result<bool> {
        Ok(true)
    }

    async fn rename_record(&self, id: &str, new_name: &str) -> Result<bool> {
        let mut store = self.store.lock().expect("store lock");
        match store.iter_mut().find(|r| r.id == id) {
            Some(rec) => {
                rec.name = new_name.to_string();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn delete_record(&self, owner_key: &str, record_name: &str) -> Result<bool> {
        assert_eq!(owner_key, "workspace-1");
        self.calls
            .lock()
            .expect("calls lock")
            .push(record_name.to_string());
        if self.broken.contains(record_name) {
            return Err(PanelError::Mutation("storage offline".to_string()));
        }
        if self.refuse.contains(record_name) {
            return Ok(false);
        }
        let mut store = self.store.lock().expect("store lock");
        store.retain(|r| r.name != record_name);
        Ok(true)
    }
}

fn setup(records: Vec<ChatRecord>) -> (CacheManager<StoreSource>, Store) {
    let store: Store = Arc::new(Mutex::new(records));
    let manager = CacheManager::new(
        StoreSource {
            store: store.clone(),
        },
        PanelConfig::default(),
    );
    (manager, store)
}

fn displayed(manager: &CacheManager<StoreSource>) -> Vec<String> {
    manager.with_view(|v| v.record_ids().into_iter().map(str::to_string).collect())
}

#[tokio::test]
async fn metadata_hints_build_expected_forest() {
    let mut a = record("a", 300);
    a.message_count = 10;
    let mut b = child_of("b", 200, "a");
    b.message_count = 5;
    let mut c = child_of("c", 100, "a");
    c.message_count = 3;
    let (manager, _store) = setup(vec![a, b, c]);

    manager.load_chats(false).await.expect("load");
    manager.with_view(|v| {
        let forest = v.forest();
        assert_eq!(forest.trees().len(), 1);
        let tree = &forest.trees()[0];
        assert_eq!(tree.node_count, 3);
        assert_eq!(tree.latest_update, at(300));
        let children: Vec<&str> = forest.arena()[tree.root]
            .children
            .iter()
            .map(|c| forest.arena()[*c].id())
            .collect();
        assert_eq!(children, vec!["b", "c"]);
    });
}

#[tokio::test]
async fn similarity_fallback_links_shorter_branch() {
    let x = with_messages("x", 10, &["hello", "plan", "build", "left"], 8);
    let y = with_messages("y", 20, &["hello", "plan", "build", "right"], 4);
    let (manager, _store) = setup(vec![x, y]);

    manager.load_chats(true).await.expect("load");
    manager.with_view(|v| {
        assert_eq!(v.parents().get("y").map(String::as_str), Some("x"));
        assert_eq!(v.forest().trees().len(), 1);
        assert_eq!(v.forest().record_ids(), vec!["x", "y"]);
    });
}

#[tokio::test(start_paused = true)]
async fn batch_delete_continues_past_failures_and_reloads() {
    let (manager, store) = setup(vec![
        record("a", 40),
        record("b", 30),
        record("c", 20),
        record("d", 10),
    ]);
    manager.load_chats(false).await.expect("load");

    let mut mutations = StoreMutations::new(store.clone());
    mutations.refuse.insert("b.jsonl".to_string());
    mutations.broken.insert("c.jsonl".to_string());

    let ids: Vec<String> = ["a", "b", "c", "d", "ghost"]
        .iter()
        .map(|s| s.to_string())
        .collect();
    let result = manager.delete_records(&mutations, &ids).await;

    assert_eq!(result.success_count, 2);
    assert_eq!(result.fail_count, 3);
    assert_eq!(result.failed_ids, vec!["b", "c", "ghost"]);
    assert_eq!(result.outcome(), BatchOutcome::Partial);
    assert_eq!(
        *mutations.calls.lock().expect("calls lock"),
        vec!["a.jsonl", "b.jsonl", "c.jsonl", "d.jsonl"]
    );

    // Reloaded in the foreground from the mutated store.
    assert_eq!(displayed(&manager), vec!["b", "c"]);
    assert_eq!(manager.cache_state(), CacheState::Fresh);
}

#[tokio::test(start_paused = true)]
async fn delete_selected_removes_only_selected_sessions() {
    let (manager, store) = setup(vec![
        record("root", 50),
        child_of("child", 40, "root"),
        record("keep", 30),
    ]);
    manager.load_chats(false).await.expect("load");

    manager.with_view_mut(|v| {
        let root = v.forest().arena().find("root").expect("root");
        v.forest_mut().set_all_selected(Scope::Subtree(root), true);
    });

    let mutations = StoreMutations::new(store);
    let mut asked = Vec::new();
    let result = manager
        .delete_selected(&mutations, |ids| {
            asked = ids.to_vec();
            true
        })
        .await
        .expect("confirmed");
    assert_eq!(asked, vec!["root", "child"]);
    assert_eq!(result.outcome(), BatchOutcome::AllSucceeded);
    assert_eq!(result.success_count, 2);
    assert_eq!(displayed(&manager), vec!["keep"]);
}

#[tokio::test(start_paused = true)]
async fn declined_confirmation_deletes_nothing() {
    let (manager, store) = setup(vec![record("a", 20), record("b", 10)]);
    manager.load_chats(false).await.expect("load");
    manager.with_view_mut(|v| v.forest_mut().set_all_selected(Scope::Forest, true));

    let mutations = StoreMutations::new(store.clone());
    let result = manager.delete_selected(&mutations, |_| false).await;
    assert!(result.is_none());
    assert!(mutations.calls.lock().expect("calls lock").is_empty());
    assert_eq!(store.lock().expect("store lock").len(), 2);
    assert_eq!(manager.cache_state(), CacheState::Fresh);
    manager.with_view(|v| assert_eq!(v.forest().selected_nodes().len(), 2));
}

#[tokio::test(start_paused = true)]
async fn confirmation_skipped_when_disabled() {
    let store: Store = Arc::new(Mutex::new(vec![record("a", 20), record("b", 10)]));
    let mut config = PanelConfig::default();
    config.display.confirm_delete = false;
    let manager = CacheManager::new(
        StoreSource {
            store: store.clone(),
        },
        config,
    );
    manager.load_chats(false).await.expect("load");
    manager.with_view_mut(|v| {
        let a = v.forest().arena().find("a").expect("a");
        v.forest_mut().arena_mut().set_selected(a, true);
    });

    let mutations = StoreMutations::new(store);
    let result = manager
        .delete_selected(&mutations, |_| panic!("confirmation disabled"))
        .await
        .expect("not asked");
    assert_eq!(result.success_count, 1);
    assert_eq!(displayed(&manager), vec!["b"]);
}

#[tokio::test(start_paused = true)]
async fn refused_batch_reports_total_failure() {
    let (manager, store) = setup(vec![record("a", 1)]);
    manager.load_chats(false).await.expect("load");

    let mut mutations = StoreMutations::new(store);
    mutations.refuse.insert("a.jsonl".to_string());
    let result = manager.delete_records(&mutations, &["a".to_string()]).await;
    assert_eq!(result.outcome(), BatchOutcome::AllFailed);
    assert_eq!(displayed(&manager), vec!["a"]);
}

#[tokio::test]
async fn rename_invalidates_and_reloads() {
    let (manager, store) = setup(vec![record("a", 1)]);
    manager.load_chats(false).await.expect("load");
    let mutations = StoreMutations::new(store);

    let renamed = manager
        .rename_record(&mutations, "a", "  renamed.jsonl ")
        .await
        .expect("rename");
    assert!(renamed);
    manager.with_view(|v| {
        assert_eq!(v.record("a").map(|r| r.title()), Some("renamed"));
    });

    let err = manager
        .rename_record(&mutations, "a", "   ")
        .await
        .expect_err("blank name");
    assert!(matches!(err, PanelError::Mutation(_)));

    let err = manager
        .open_record(&mutations, "missing")
        .await
        .expect_err("unknown id");
    assert!(matches!(err, PanelError::UnknownRecord(_)));
    assert!(manager.open_record(&mutations, "a").await.expect("open"));
}

#[tokio::test]
async fn filter_changes_rebuild_from_displayed_records() {
    let mut cp = record("cp", 20);
    cp.is_checkpoint = true;
    let (manager, _store) = setup(vec![cp, record("a", 10)]);

    assert_eq!(manager.load_chats(false).await.expect("load"), LoadSource::Network);
    assert_eq!(manager.with_view(|v| v.forest().total_count()), 1);

    manager.with_view_mut(|v| v.set_filter(RecordFilter::new(None, true)));
    assert_eq!(manager.with_view(|v| v.forest().total_count()), 2);

    manager.with_view_mut(|v| v.set_filter(RecordFilter::new(Some("cp".to_string()), true)));
    assert_eq!(manager.with_view(|v| v.forest().record_ids().len()), 1);
}
