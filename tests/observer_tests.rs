use async_trait::async_trait;
use serde_json::json;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use softstore::{
    FIELD_DELETED, FieldDef, FieldDefault, FieldType, MemoryStore, RecordTypeDef, Result,
    SoftDeleteConfig, SoftDeleteLifecycle, SoftRecord, SoftStoreError, TransitionObserver,
    TransitionObserverRegistry, extend,
};

fn article_def() -> Arc<RecordTypeDef> {
    let base = RecordTypeDef::new("Article").with_field(
        FieldDef::new("title", FieldType::Text).with_default(FieldDefault::Literal(json!("Untitled"))),
    );
    Arc::new(extend(&base, &SoftDeleteConfig::new()))
}

struct CountingObserver {
    fired: AtomicUsize,
}

impl CountingObserver {
    fn new() -> Arc<Self> {
        Arc::new(Self {
            fired: AtomicUsize::new(0),
        })
    }

    fn count(&self) -> usize {
        self.fired.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl TransitionObserver for CountingObserver {
    async fn on_transition(&self, _record: &SoftRecord) -> Result<()> {
        self.fired.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

struct LabelObserver {
    label: &'static str,
    seen: Arc<Mutex<Vec<&'static str>>>,
}

#[async_trait]
impl TransitionObserver for LabelObserver {
    async fn on_transition(&self, _record: &SoftRecord) -> Result<()> {
        self.seen.lock().unwrap().push(self.label);
        Ok(())
    }
}

fn lifecycle_with(
    store: Arc<MemoryStore>,
    type_name: &str,
    observer: Arc<dyn TransitionObserver>,
) -> SoftDeleteLifecycle {
    let mut registry = TransitionObserverRegistry::new();
    registry.on_soft_delete_transition(type_name, observer);
    SoftDeleteLifecycle::new(store).with_observers(registry)
}

#[tokio::test]
async fn observer_fires_once_per_flag_change() {
    let observer = CountingObserver::new();
    let lifecycle = lifecycle_with(Arc::new(MemoryStore::new()), "Article", observer.clone());
    let mut record = SoftRecord::new(article_def());

    lifecycle.soft_delete(&mut record, true, None).await.unwrap();
    assert_eq!(observer.count(), 1);

    lifecycle.soft_delete(&mut record, false, None).await.unwrap();
    assert_eq!(observer.count(), 2);
}

#[tokio::test]
async fn observer_silent_on_no_op_save() {
    let observer = CountingObserver::new();
    let lifecycle = lifecycle_with(Arc::new(MemoryStore::new()), "Article", observer.clone());
    let mut record = SoftRecord::new(article_def());

    lifecycle.soft_delete(&mut record, false, None).await.unwrap();
    lifecycle.soft_delete(&mut record, false, None).await.unwrap();

    assert_eq!(observer.count(), 0);
}

#[tokio::test]
async fn observer_silent_on_escalation() {
    let observer = CountingObserver::new();
    let store = Arc::new(MemoryStore::new());
    let lifecycle = lifecycle_with(store.clone(), "Article", observer.clone());
    let mut record = SoftRecord::new(article_def());

    lifecycle.soft_delete(&mut record, true, None).await.unwrap();
    lifecycle.soft_delete(&mut record, true, None).await.unwrap();

    assert_eq!(observer.count(), 1);
    assert!(store.find_by_id("Article", record.record_id()).await.is_none());
}

#[tokio::test]
async fn observers_fire_in_registration_order() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TransitionObserverRegistry::new();
    for label in ["first", "second", "third"] {
        registry.on_soft_delete_transition(
            "Article",
            Arc::new(LabelObserver {
                label,
                seen: seen.clone(),
            }),
        );
    }
    let lifecycle =
        SoftDeleteLifecycle::new(Arc::new(MemoryStore::new())).with_observers(registry);
    let mut record = SoftRecord::new(article_def());

    lifecycle.soft_delete(&mut record, true, None).await.unwrap();

    assert_eq!(*seen.lock().unwrap(), vec!["first", "second", "third"]);
}

#[tokio::test]
async fn observers_are_scoped_per_type() {
    let observer = CountingObserver::new();
    let lifecycle = lifecycle_with(Arc::new(MemoryStore::new()), "Comment", observer.clone());
    let mut record = SoftRecord::new(article_def());

    lifecycle.soft_delete(&mut record, true, None).await.unwrap();

    assert_eq!(observer.count(), 0);
}

#[tokio::test]
async fn observer_error_aborts_the_commit() {
    let store = Arc::new(MemoryStore::new());
    let failing = Arc::new(|_record: &SoftRecord| -> Result<()> {
        Err(SoftStoreError::ObserverFailed("audit sink offline".to_string()))
    });
    let lifecycle = lifecycle_with(store.clone(), "Article", failing);
    let mut record = SoftRecord::new(article_def());

    let err = lifecycle
        .soft_delete(&mut record, true, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SoftStoreError::ObserverFailed(_)));
    // Nothing was persisted for this attempt, but the in-memory flag was
    // already flipped and stays modified.
    assert!(store.find_by_id("Article", record.record_id()).await.is_none());
    assert!(record.is_soft_deleted());
    assert!(record.is_modified(FIELD_DELETED));
}

#[tokio::test]
async fn failing_observer_blocks_later_observers() {
    let seen = Arc::new(Mutex::new(Vec::new()));
    let mut registry = TransitionObserverRegistry::new();
    registry.on_soft_delete_transition(
        "Article",
        Arc::new(|_record: &SoftRecord| -> Result<()> {
            Err(SoftStoreError::ObserverFailed("first refuses".to_string()))
        }),
    );
    registry.on_soft_delete_transition(
        "Article",
        Arc::new(LabelObserver {
            label: "second",
            seen: seen.clone(),
        }),
    );
    let lifecycle =
        SoftDeleteLifecycle::new(Arc::new(MemoryStore::new())).with_observers(registry);
    let mut record = SoftRecord::new(article_def());

    let err = lifecycle
        .soft_delete(&mut record, true, None)
        .await
        .unwrap_err();

    assert!(matches!(err, SoftStoreError::ObserverFailed(_)));
    assert!(seen.lock().unwrap().is_empty());
}

#[test]
fn closure_observers_register_through_the_blanket_impl() {
    tokio_test::block_on(async {
        let fired = Arc::new(AtomicUsize::new(0));
        let fired_in_observer = fired.clone();
        let mut registry = TransitionObserverRegistry::new();
        registry.on_soft_delete_transition(
            "Article",
            Arc::new(move |_record: &SoftRecord| -> Result<()> {
                fired_in_observer.fetch_add(1, Ordering::SeqCst);
                Ok(())
            }),
        );
        assert_eq!(registry.observer_count("Article"), 1);

        let lifecycle = SoftDeleteLifecycle::new(Arc::new(MemoryStore::new())).with_observers(registry);
        let mut record = SoftRecord::new(article_def());
        lifecycle.soft_delete(&mut record, true, None).await.unwrap();

        assert_eq!(fired.load(Ordering::SeqCst), 1);
    });
}
