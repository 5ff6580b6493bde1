//! One lazily created pool per physical database.
//!
//! Creation is single-flight: concurrent first callers for the same database
//! wait on one `connect`. A failed creation leaves the slot empty so the next
//! call retries. Pools live until [`ConnectionPoolManager::shutdown`].

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::OnceCell;
use tracing::{info, warn};

use super::names::DatabaseName;
use super::ports::{RelationalEngine, RelationalEngineError};

/// Pool creation failed for `database`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("pool for database '{database}' is unavailable: {source}")]
pub struct PoolUnavailable {
    pub database: DatabaseName,
    #[source]
    pub source: RelationalEngineError,
}

pub struct ConnectionPoolManager<R: RelationalEngine> {
    engine: Arc<R>,
    pools: DashMap<DatabaseName, Arc<OnceCell<R::Pool>>>,
}

impl<R: RelationalEngine> ConnectionPoolManager<R> {
    pub fn new(engine: Arc<R>) -> Self {
        Self {
            engine,
            pools: DashMap::new(),
        }
    }

    /// The engine pools are created with.
    pub fn engine(&self) -> &R {
        &self.engine
    }

    /// Return the pool for `database`, creating it on first use.
    pub async fn acquire_pool(&self, database: &DatabaseName) -> Result<R::Pool, PoolUnavailable> {
        let slot = Arc::clone(
            self.pools
                .entry(database.clone())
                .or_insert_with(|| Arc::new(OnceCell::new()))
                .value(),
        );

        let pool = slot
            .get_or_try_init(|| async {
                let pool = self.engine.connect(database).await?;
                info!(database = %database, "connection pool created");
                Ok::<_, RelationalEngineError>(pool)
            })
            .await
            .map_err(|source| {
                warn!(database = %database, error = %source, "connection pool creation failed");
                PoolUnavailable {
                    database: database.clone(),
                    source,
                }
            })?;
        Ok(pool.clone())
    }

    /// Number of databases with a live pool.
    pub fn pool_count(&self) -> usize {
        self.pools
            .iter()
            .filter(|slot| slot.value().initialized())
            .count()
    }

    /// Close every pool. Later calls create fresh pools.
    pub async fn shutdown(&self) {
        let slots: Vec<_> = self
            .pools
            .iter()
            .map(|slot| (slot.key().clone(), Arc::clone(slot.value())))
            .collect();
        self.pools.clear();

        for (database, slot) in slots {
            if let Some(pool) = slot.get() {
                self.engine.close(pool.clone()).await;
                info!(database = %database, "connection pool closed");
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    use async_trait::async_trait;
    use rstest::rstest;

    use super::*;
    use crate::domain::ProcedureCall;
    use crate::domain::ports::RecordSets;

    /// Engine whose pools are plain ids; `connect` fails while `failures`
    /// remains above zero.
    #[derive(Default)]
    struct CountingEngine {
        connects: AtomicUsize,
        closes: AtomicUsize,
        failures: AtomicUsize,
    }

    #[async_trait]
    impl RelationalEngine for CountingEngine {
        type Pool = usize;

        async fn connect(&self, _database: &DatabaseName) -> Result<usize, RelationalEngineError> {
            tokio::time::sleep(Duration::from_millis(5)).await;
            let attempt = self.connects.fetch_add(1, Ordering::SeqCst);
            let remaining = self.failures.load(Ordering::SeqCst);
            if remaining > 0 {
                self.failures.store(remaining - 1, Ordering::SeqCst);
                return Err(RelationalEngineError::connect("connection refused"));
            }
            Ok(attempt)
        }

        async fn execute(
            &self,
            _pool: &usize,
            _call: &ProcedureCall<'_>,
        ) -> Result<RecordSets, RelationalEngineError> {
            Ok(RecordSets::default())
        }

        async fn close(&self, _pool: usize) {
            self.closes.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn database(name: &str) -> DatabaseName {
        DatabaseName::new(name).expect("valid database")
    }

    #[rstest]
    #[tokio::test]
    async fn concurrent_first_callers_share_one_pool() {
        let manager = Arc::new(ConnectionPoolManager::new(Arc::new(CountingEngine::default())));
        let db = database("ClientA_DB");

        let handles: Vec<_> = (0..16)
            .map(|_| {
                let manager = Arc::clone(&manager);
                let db = db.clone();
                tokio::spawn(async move { manager.acquire_pool(&db).await })
            })
            .collect();

        for handle in handles {
            let pool = handle.await.expect("join").expect("pool");
            assert_eq!(pool, 0);
        }
        assert_eq!(manager.engine().connects.load(Ordering::SeqCst), 1);
        assert_eq!(manager.pool_count(), 1);
    }

    #[rstest]
    #[tokio::test]
    async fn each_database_gets_its_own_pool() {
        let manager = ConnectionPoolManager::new(Arc::new(CountingEngine::default()));
        manager.acquire_pool(&database("A")).await.expect("pool a");
        manager.acquire_pool(&database("B")).await.expect("pool b");
        manager.acquire_pool(&database("A")).await.expect("pool a again");
        assert_eq!(manager.pool_count(), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn creation_failures_are_retried() {
        let engine = CountingEngine::default();
        engine.failures.store(1, Ordering::SeqCst);
        let manager = ConnectionPoolManager::new(Arc::new(engine));
        let db = database("ClientA_DB");

        let error = manager.acquire_pool(&db).await.expect_err("first attempt fails");
        assert!(error.source.is_unavailable());
        assert_eq!(manager.pool_count(), 0);

        manager.acquire_pool(&db).await.expect("second attempt connects");
        assert_eq!(manager.engine().connects.load(Ordering::SeqCst), 2);
    }

    #[rstest]
    #[tokio::test]
    async fn shutdown_closes_every_pool() {
        let manager = ConnectionPoolManager::new(Arc::new(CountingEngine::default()));
        manager.acquire_pool(&database("A")).await.expect("pool a");
        manager.acquire_pool(&database("B")).await.expect("pool b");

        manager.shutdown().await;

        assert_eq!(manager.engine().closes.load(Ordering::SeqCst), 2);
        assert_eq!(manager.pool_count(), 0);
    }
}
