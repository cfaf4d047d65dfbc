//! MMS persistence strategies.

use async_trait::async_trait;

use super::Store;
use super::model::{LogicalMessage, StoreLocation};
use crate::{Error, Result};

/// One way of writing an MMS to the store.
#[async_trait]
pub trait PersistenceStrategy: Send + Sync {
    /// Name used in logs and fallback reports.
    fn name(&self) -> &'static str;

    /// Persists `message`.
    ///
    /// # Errors
    ///
    /// Returns an error if the store rejects the message.
    async fn persist(&self, store: &dyn Store, message: &LogicalMessage) -> Result<StoreLocation>;
}

/// Stores the full message in one transaction.
#[derive(Debug, Clone, Copy, Default)]
pub struct PrimaryPersister;

#[async_trait]
impl PersistenceStrategy for PrimaryPersister {
    fn name(&self) -> &'static str {
        "primary"
    }

    async fn persist(&self, store: &dyn Store, message: &LogicalMessage) -> Result<StoreLocation> {
        store.persist_logical_message(message).await
    }
}

/// Inserts header, part and address rows one at a time.
#[derive(Debug, Clone, Copy, Default)]
pub struct ManualInsertion;

#[async_trait]
impl PersistenceStrategy for ManualInsertion {
    fn name(&self) -> &'static str {
        "manual"
    }

    async fn persist(&self, store: &dyn Store, message: &LogicalMessage) -> Result<StoreLocation> {
        store.insert_manual_fallback(message).await
    }
}

/// Strategy that failed before a later one succeeded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Fallback {
    /// Failed strategy.
    pub strategy: &'static str,
    /// Its error.
    pub reason: String,
}

/// Outcome of a successful persist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Persisted {
    /// Where the message was stored.
    pub location: StoreLocation,
    /// Strategies that failed first, in order.
    pub fallbacks: Vec<Fallback>,
}

/// Strategies tried in order until one succeeds.
pub struct PersistenceChain {
    strategies: Vec<Box<dyn PersistenceStrategy>>,
}

impl Default for PersistenceChain {
    fn default() -> Self {
        Self::new(vec![Box::new(PrimaryPersister), Box::new(ManualInsertion)])
    }
}

impl PersistenceChain {
    /// Creates a chain from strategies in priority order.
    #[must_use]
    pub fn new(strategies: Vec<Box<dyn PersistenceStrategy>>) -> Self {
        Self { strategies }
    }

    /// Persists `message` with the first strategy that succeeds.
    ///
    /// # Errors
    ///
    /// Returns the last strategy's error if every strategy fails.
    pub async fn persist(&self, store: &dyn Store, message: &LogicalMessage) -> Result<Persisted> {
        let mut fallbacks: Vec<Fallback> = Vec::new();
        let mut last_error = None;

        for strategy in &self.strategies {
            match strategy.persist(store, message).await {
                Ok(location) => {
                    for fallback in &fallbacks {
                        tracing::warn!(
                            failed = fallback.strategy,
                            used = strategy.name(),
                            reason = %fallback.reason,
                            "Persisted MMS with fallback strategy"
                        );
                    }
                    return Ok(Persisted {
                        location,
                        fallbacks,
                    });
                }
                Err(e) => {
                    tracing::debug!(
                        strategy = strategy.name(),
                        error = %e,
                        "Persistence strategy failed"
                    );
                    fallbacks.push(Fallback {
                        strategy: strategy.name(),
                        reason: e.to_string(),
                    });
                    last_error = Some(e);
                }
            }
        }

        Err(last_error.unwrap_or_else(|| Error::Store("No persistence strategy configured".into())))
    }
}

impl std::fmt::Debug for PersistenceChain {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let names: Vec<&str> = self.strategies.iter().map(|s| s.name()).collect();
        f.debug_struct("PersistenceChain")
            .field("strategies", &names)
            .finish()
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::store::SqliteStore;
    use chrono::Utc;
    use courier_pdu::Part;

    struct Broken;

    #[async_trait]
    impl PersistenceStrategy for Broken {
        fn name(&self) -> &'static str {
            "broken"
        }

        async fn persist(&self, _: &dyn Store, _: &LogicalMessage) -> Result<StoreLocation> {
            Err(Error::Store("disk full".into()))
        }
    }

    fn message() -> LogicalMessage {
        LogicalMessage {
            recipients: vec!["5551234".into()],
            subject: None,
            parts: vec![Part::text("text", "Hi")],
            manifest: None,
            transaction_id: "T1".into(),
            timestamp: Utc::now(),
            group: false,
        }
    }

    #[tokio::test]
    async fn test_primary_succeeds_without_fallback() {
        let store = SqliteStore::in_memory().await.unwrap();
        let persisted = PersistenceChain::default()
            .persist(&store, &message())
            .await
            .unwrap();
        assert!(persisted.fallbacks.is_empty());
        assert!(!store.is_manual(persisted.location.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_falls_back_in_order() {
        let store = SqliteStore::in_memory().await.unwrap();
        let chain = PersistenceChain::new(vec![Box::new(Broken), Box::new(ManualInsertion)]);
        let persisted = chain.persist(&store, &message()).await.unwrap();

        assert_eq!(persisted.fallbacks.len(), 1);
        assert_eq!(persisted.fallbacks[0].strategy, "broken");
        assert!(persisted.fallbacks[0].reason.contains("disk full"));
        assert!(store.is_manual(persisted.location.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_all_fail() {
        let store = SqliteStore::in_memory().await.unwrap();
        let chain = PersistenceChain::new(vec![Box::new(Broken)]);
        let err = chain.persist(&store, &message()).await.unwrap_err();
        assert!(matches!(err, Error::Store(_)));

        let empty = PersistenceChain::new(Vec::new());
        assert!(empty.persist(&store, &message()).await.is_err());
    }
}
