mod common;

use std::sync::Arc;
use std::time::Duration;

use bindsync_keybinds::{RawRecord, RowBuilder};
use bindsync_sync::properties::read_text;
use bindsync_sync::{
    compute_plan, Executor, IdentityIndex, Operation, Outcome, PlanItem, PlanOptions, RemoteStore,
    SyncContext,
};
use common::{config, MemoryStore};

fn create_plan(names: &[&str]) -> Vec<PlanItem> {
    let records: Vec<RawRecord> = names
        .iter()
        .enumerate()
        .map(|(i, name)| RawRecord::new("n", format!("<leader>{}", i)).with_description(*name))
        .collect();
    let rows = RowBuilder::with_defaults().build(&records);
    let (plan, stats) = compute_plan(&rows, &IdentityIndex::default(), &PlanOptions::default());
    assert_eq!(stats.create, names.len());
    plan
}

#[tokio::test]
async fn test_abort_after_second_item() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SyncContext::new(config()).unwrap();
    store.cancel_after(2, ctx.cancel_token());

    let plan = create_plan(&["One", "Two", "Three", "Four", "Five"]);
    let executor = Executor::new(ctx, store.clone() as Arc<dyn RemoteStore>);

    let mut seen = Vec::new();
    let report = executor
        .apply(&plan, |item| seen.push(item.outcome.clone()))
        .await;

    assert!(report.aborted);
    assert_eq!(report.created, 2);
    assert_eq!(report.not_run, 3);
    assert_eq!(store.calls(), vec!["create One", "create Two"]);
    assert_eq!(seen.len(), 5);
    assert!(seen[2..].iter().all(|o| *o == Outcome::NotRun));
}

#[tokio::test]
async fn test_duplicate_create_guard() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SyncContext::new(config()).unwrap();

    let mut plan = create_plan(&["Save"]);
    plan.push(plan[0].clone());

    let report = Executor::new(ctx, store.clone())
        .apply(&plan, |_| {})
        .await;

    assert_eq!(report.created, 1);
    assert_eq!(report.duplicates, 1);
    assert_eq!(store.calls().len(), 1);
}

#[tokio::test]
async fn test_failure_does_not_stop_run() {
    let store = Arc::new(MemoryStore::new());
    store.fail_on("Two");
    let ctx = SyncContext::new(config()).unwrap();

    let plan = create_plan(&["One", "Two", "Three"]);
    let report = Executor::new(ctx, store.clone()).apply(&plan, |_| {}).await;

    assert_eq!(report.created, 2);
    assert_eq!(report.failed, 1);
    assert!(!report.aborted);
    assert!(matches!(report.items[1].outcome, Outcome::Failed { .. }));
    assert_eq!(store.calls().len(), 3);
}

#[tokio::test]
async fn test_skips_make_no_calls() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SyncContext::new(config()).unwrap();

    let rows = RowBuilder::with_defaults().build(&[RawRecord::new("n", "gx")]);
    let (plan, _) = compute_plan(&rows, &IdentityIndex::default(), &PlanOptions::default());
    assert_eq!(plan[0].operation, Operation::SkipBuiltin);

    let report = Executor::new(ctx, store.clone()).apply(&plan, |_| {}).await;
    assert_eq!(report.skipped, 1);
    assert!(store.calls().is_empty());
}

#[tokio::test]
async fn test_rebind_marks_status_changed() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SyncContext::new(config()).unwrap();
    let executor = Executor::new(ctx, store.clone());

    let report = executor.apply(&create_plan(&["Save"]), |_| {}).await;
    assert_eq!(report.created, 1);

    let mut rebind = create_plan(&["Save"]).remove(0);
    rebind.operation = Operation::Rebind;
    rebind.matched_remote_id = Some("page-1".to_string());

    let report = executor.apply(&[rebind], |_| {}).await;
    assert_eq!(report.rebound, 1);

    let page = store.page("page-1").unwrap();
    assert_eq!(read_text(&page.properties, "Status").as_deref(), Some("Changed"));
}

#[tokio::test]
async fn test_update_without_target_fails() {
    let store = Arc::new(MemoryStore::new());
    let ctx = SyncContext::new(config()).unwrap();

    let mut item = create_plan(&["Save"]).remove(0);
    item.operation = Operation::Update;

    let report = Executor::new(ctx, store.clone()).apply(&[item], |_| {}).await;
    assert_eq!(report.failed, 1);
    assert!(store.calls().is_empty());
}

#[tokio::test(start_paused = true)]
async fn test_op_delay_after_each_call() {
    let store = Arc::new(MemoryStore::new());
    let mut cfg = config();
    cfg.sync.op_delay_ms = 1_000;
    let ctx = SyncContext::new(cfg).unwrap();

    let start = tokio::time::Instant::now();
    let report = Executor::new(ctx, store.clone())
        .apply(&create_plan(&["One", "Two"]), |_| {})
        .await;

    assert_eq!(report.created, 2);
    assert!(start.elapsed() >= Duration::from_secs(2));
}
