use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::Arc;

use crate::core::Result;
use crate::record::SoftRecord;

/// Handler invoked when a record's deletion flag is about to change, before
/// the record is committed to the store.
///
/// An error aborts the commit and becomes the operation's error.
#[async_trait]
pub trait TransitionObserver: Send + Sync {
    async fn on_transition(&self, record: &SoftRecord) -> Result<()>;
}

#[async_trait]
impl<F> TransitionObserver for F
where
    F: Fn(&SoftRecord) -> Result<()> + Send + Sync,
{
    async fn on_transition(&self, record: &SoftRecord) -> Result<()> {
        self(record)
    }
}

/// Ordered transition observers, scoped per record type.
///
/// Registrations accumulate; all observers for a type fire in registration
/// order on every commit where the deletion flag changed value.
#[derive(Default)]
pub struct TransitionObserverRegistry {
    observers: HashMap<String, Vec<Arc<dyn TransitionObserver>>>,
}

impl TransitionObserverRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn on_soft_delete_transition(
        &mut self,
        type_name: impl Into<String>,
        observer: Arc<dyn TransitionObserver>,
    ) {
        self.observers
            .entry(type_name.into())
            .or_default()
            .push(observer);
    }

    pub fn observers_for(&self, type_name: &str) -> &[Arc<dyn TransitionObserver>] {
        self.observers
            .get(type_name)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    pub fn observer_count(&self, type_name: &str) -> usize {
        self.observers_for(type_name).len()
    }
}
