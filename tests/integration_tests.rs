//! Integration tests for rule evaluation and batch validation
//!
//! These tests exercise the public API end to end using mock snapshot stores.

use async_trait::async_trait;
use serde_json::{json, Value};
use snapcheck_rs::engine::{
    EvaluationError, ResolutionContext, RuleEngine, RuleError, SnapshotDocument, SnapshotStore,
    StoreError,
};
use snapcheck_rs::validator::snapshot::{
    collection_map, populate_store, InMemorySnapshotStore, SnapshotLoader,
};
use snapcheck_rs::validator::testset::{RuleCase, TestFileLoader};
use snapcheck_rs::validator::{BatchRunner, RuleStatus};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

// ============================================================================
// Mock Components
// ============================================================================

/// Store that counts fetches per snapshot id and answers after a delay
struct CountingStore {
    documents: HashMap<String, Value>,
    delay: Duration,
    calls: std::sync::Mutex<HashMap<String, usize>>,
    total: AtomicUsize,
}

impl CountingStore {
    fn new(documents: HashMap<String, Value>, delay: Duration) -> Self {
        Self {
            documents,
            delay,
            calls: std::sync::Mutex::new(HashMap::new()),
            total: AtomicUsize::new(0),
        }
    }

    fn calls_for(&self, snapshot_id: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .get(snapshot_id)
            .copied()
            .unwrap_or(0)
    }
}

#[async_trait]
impl SnapshotStore for CountingStore {
    async fn fetch_latest(
        &self,
        snapshot_id: &str,
        collection: &str,
    ) -> Result<Option<SnapshotDocument>, StoreError> {
        self.total.fetch_add(1, Ordering::SeqCst);
        *self
            .calls
            .lock()
            .unwrap()
            .entry(snapshot_id.to_string())
            .or_insert(0) += 1;
        tokio::time::sleep(self.delay).await;

        Ok(self.documents.get(snapshot_id).map(|json| SnapshotDocument {
            snapshot_id: snapshot_id.to_string(),
            collection: collection.to_string(),
            checksum: String::new(),
            timestamp: 0,
            json: json.clone(),
        }))
    }
}

/// Store that is never reachable
struct DownStore {
    calls: AtomicUsize,
}

#[async_trait]
impl SnapshotStore for DownStore {
    async fn fetch_latest(
        &self,
        _snapshot_id: &str,
        _collection: &str,
    ) -> Result<Option<SnapshotDocument>, StoreError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Err(StoreError::unavailable("connection refused"))
    }
}

/// Store that never answers in time
struct HangingStore;

#[async_trait]
impl SnapshotStore for HangingStore {
    async fn fetch_latest(
        &self,
        _snapshot_id: &str,
        _collection: &str,
    ) -> Result<Option<SnapshotDocument>, StoreError> {
        tokio::time::sleep(Duration::from_secs(60)).await;
        Ok(None)
    }
}

fn snapshot_map(ids: &[&str]) -> HashMap<String, String> {
    ids.iter()
        .map(|id| (id.to_string(), "resources".to_string()))
        .collect()
}

fn documents() -> HashMap<String, Value> {
    HashMap::from([
        (
            "S1".to_string(),
            json!({"resource": {"sku": "Standard"}, "tags": {"env": "prod"}}),
        ),
        ("S2".to_string(), json!({"location": "westeurope", "zones": [1, 2, 3]})),
        ("S3".to_string(), json!({"enabled": true})),
    ])
}

// ============================================================================
// Rule Evaluation Tests
// ============================================================================

#[tokio::test]
async fn test_snapshot_rule_evaluation() {
    let store = Arc::new(CountingStore::new(documents(), Duration::ZERO));
    let ctx = ResolutionContext::new(snapshot_map(&["S1", "S2", "S3"]), store.clone());
    let engine = RuleEngine::new();

    let passed = engine
        .evaluate("S1.resource.sku == 'Standard'", &ctx)
        .await
        .unwrap();
    assert!(passed.verdict);
    assert_eq!(passed.resolved_left, json!("Standard"));

    let missing = engine
        .evaluate("S1.resource.missing == 'x'", &ctx)
        .await
        .unwrap();
    assert!(!missing.verdict);
    assert_eq!(missing.resolved_left, Value::Null);

    assert!(engine.evaluate("S2.zones.1 == 2", &ctx).await.unwrap().verdict);
    assert!(engine.evaluate("3 in S2.zones", &ctx).await.unwrap().verdict);
    assert!(engine.evaluate("S3.enabled", &ctx).await.unwrap().verdict);

    // Every snapshot fetched once across all rules
    assert_eq!(store.calls_for("S1"), 1);
    assert_eq!(store.calls_for("S2"), 1);
}

#[tokio::test]
async fn test_bare_snapshot_id_resolves_to_whole_document() {
    let store = Arc::new(CountingStore::new(documents(), Duration::ZERO));
    let ctx = ResolutionContext::new(snapshot_map(&["S1", "S2"]), store.clone())
        .with_default_document(json!({"S1": "not used", "owner": "ops"}));
    let engine = RuleEngine::new();

    let result = engine.evaluate("S1 != null", &ctx).await.unwrap();
    assert!(result.verdict);
    assert_eq!(result.resolved_left, documents()["S1"]);

    let result = engine.evaluate("keys(S1) == ['resource', 'tags']", &ctx).await.unwrap();
    assert!(result.verdict);
    assert!(engine.evaluate("length(keys(S2)) == 2", &ctx).await.unwrap().verdict);

    // Unknown ids still read the default document
    assert!(engine.evaluate("owner == 'ops'", &ctx).await.unwrap().verdict);
    assert_eq!(store.calls_for("S1"), 1);
    assert_eq!(store.calls_for("owner"), 0);
}

#[tokio::test]
async fn test_missing_document_resolves_to_null() {
    let store = Arc::new(CountingStore::new(HashMap::new(), Duration::ZERO));
    let ctx = ResolutionContext::new(snapshot_map(&["S9"]), store);

    let result = RuleEngine::new()
        .evaluate("S9.anything == null", &ctx)
        .await
        .unwrap();
    assert!(result.verdict);
}

#[tokio::test]
async fn test_literal_rule_examples() {
    let ctx = ResolutionContext::new(
        HashMap::new(),
        Arc::new(CountingStore::new(HashMap::new(), Duration::ZERO)),
    );
    let engine = RuleEngine::new();

    for (rule, expected) in [
        ("'x' == 'x'", true),
        ("3 > 5", false),
        ("contains(keys({'a':1}), 'a')", true),
        ("merge({'a':1},{'a':2,'b':3}) == {'a':2,'b':3}", true),
        ("chunklist([1,2,3,4,5], 2) == [[1,2],[3,4],[5]]", true),
        ("length(distinct([1,2,2,3,1])) == 3", true),
        ("setintersection(distinct([1,2,2,3,1]), [1,2,3]) == [1,2,3]", true),
    ] {
        let result = engine.evaluate(rule, &ctx).await.unwrap();
        assert_eq!(result.verdict, expected, "rule: {}", rule);
    }
}

#[tokio::test]
async fn test_invalid_rules_are_distinct_from_false() {
    let ctx = ResolutionContext::new(
        HashMap::new(),
        Arc::new(CountingStore::new(HashMap::new(), Duration::ZERO)),
    );
    let engine = RuleEngine::new();

    let err = engine.evaluate("a == 1 and b == 2", &ctx).await.unwrap_err();
    assert!(err.is_invalid_rule());

    let err = engine.evaluate("element([], 5) == 1", &ctx).await.unwrap_err();
    assert!(matches!(
        err,
        RuleError::Evaluation(EvaluationError::InvalidArguments { .. })
    ));
}

// ============================================================================
// Concurrency Tests
// ============================================================================

#[tokio::test]
async fn test_concurrent_rules_fetch_each_snapshot_once() {
    let store = Arc::new(CountingStore::new(documents(), Duration::from_millis(20)));
    let ctx = Arc::new(ResolutionContext::new(
        snapshot_map(&["S1", "S2", "S3"]),
        store.clone(),
    ));
    let engine = RuleEngine::new();

    let rules = [
        "S1.resource.sku == 'Standard'",
        "S2.location == 'westeurope'",
        "S3.enabled == true",
        "length(S2.zones) == 3",
    ];

    let mut handles = Vec::new();
    for i in 0..100 {
        let engine = engine.clone();
        let ctx = ctx.clone();
        let rule = rules[i % rules.len()].to_string();
        handles.push(tokio::spawn(async move { engine.evaluate(&rule, &ctx).await }));
    }
    for handle in handles {
        assert!(handle.await.unwrap().unwrap().verdict);
    }

    assert_eq!(store.calls_for("S1"), 1);
    assert_eq!(store.calls_for("S2"), 1);
    assert_eq!(store.calls_for("S3"), 1);
    assert_eq!(store.total.load(Ordering::SeqCst), 3);
}

#[tokio::test]
async fn test_concurrent_batch_runner() {
    let store = Arc::new(CountingStore::new(documents(), Duration::from_millis(10)));
    let ctx = ResolutionContext::new(snapshot_map(&["S1", "S2", "S3"]), store.clone());
    let runner = BatchRunner::new(RuleEngine::new(), Arc::new(ctx)).with_concurrency(8);

    let cases: Vec<RuleCase> = (0..100)
        .map(|i| {
            let rule = if i % 10 == 0 {
                "S2.location == 'northeurope'"
            } else {
                "S1.tags.env == 'prod'"
            };
            RuleCase::new(i.to_string(), rule)
        })
        .collect();
    let report = runner.run_concurrent(&cases).await;

    assert_eq!(report.results.len(), 100);
    assert_eq!(report.passed(), 90);
    assert_eq!(report.failed(), 10);
    assert_eq!(store.calls_for("S1"), 1);
    assert_eq!(store.calls_for("S2"), 1);
}

// ============================================================================
// Store Failure Tests
// ============================================================================

#[tokio::test]
async fn test_store_failure_aborts_batch() {
    let store = Arc::new(DownStore {
        calls: AtomicUsize::new(0),
    });
    let ctx = ResolutionContext::new(snapshot_map(&["S1"]), store.clone());
    let runner = BatchRunner::new(RuleEngine::new(), Arc::new(ctx));

    let cases = vec![
        RuleCase::new("literal", "1 < 2"),
        RuleCase::new("broken", "S1.sku = 'x'"),
        RuleCase::new("store", "S1.sku == 'x'"),
        RuleCase::new("after", "S1.sku == 'y'"),
        RuleCase::new("malformed-after", "S1.sku = 'y'"),
    ];
    let report = runner.run(&cases).await;

    assert!(report.is_aborted());
    assert_eq!(report.results[0].status, RuleStatus::Passed);
    assert!(matches!(report.results[1].status, RuleStatus::Invalid { .. }));
    assert_eq!(report.results[2].status, RuleStatus::Cancelled);
    assert_eq!(report.results[3].status, RuleStatus::Cancelled);
    assert_eq!(report.results[4].status, RuleStatus::Cancelled);
    assert_eq!(report.invalid(), 1);
    assert_eq!(store.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn test_fetch_timeout_is_store_error() {
    let ctx = ResolutionContext::new(snapshot_map(&["S1"]), Arc::new(HangingStore))
        .with_fetch_timeout(Duration::from_millis(20));

    let err = RuleEngine::new()
        .evaluate("S1.sku == 'x'", &ctx)
        .await
        .unwrap_err();
    assert!(matches!(err, RuleError::Store(StoreError::Timeout { .. })));
}

// ============================================================================
// File Loading Tests
// ============================================================================

#[tokio::test]
async fn test_check_from_files() {
    let dir = tempfile::tempdir().unwrap();
    std::fs::write(
        dir.path().join("vm.json"),
        r#"{"properties": {"hardwareProfile": {"vmSize": "Standard_B2s"}}, "tags": {"owner": "ops"}}"#,
    )
    .unwrap();

    let snapshot_file = SnapshotLoader::parse(
        r#"{"snapshots": [{"source": "azure", "nodes": [
            {"snapshotId": "VM1", "collection": "Microsoft.Compute", "path": "vm.json"}
        ]}]}"#,
    )
    .unwrap();
    let test_file = TestFileLoader::parse(
        r#"
testSet:
  - testName: vm
    cases:
      - testId: size
        rule: "VM1.properties.hardwareProfile.vmSize == 'Standard_B2s'"
      - testId: owner
        rule: "lookup(VM1.tags, 'owner') == 'ops'"
      - testId: cost
        rule: "'costcenter' in VM1.tags"
"#,
    )
    .unwrap();

    let store = InMemorySnapshotStore::new();
    populate_store(&snapshot_file, dir.path(), &store, "resources")
        .await
        .unwrap();
    let ctx = ResolutionContext::new(collection_map(&snapshot_file, "resources"), Arc::new(store));
    let report = BatchRunner::new(RuleEngine::new(), Arc::new(ctx))
        .run(&test_file.rule_cases())
        .await;

    assert_eq!(report.passed(), 2);
    assert_eq!(report.failed(), 1);
    assert_eq!(report.results[2].id, "cost");
    assert!(!report.is_success());
}
