use std::sync::Arc;
use std::time::{Duration, Instant};

use regulacao_core::dashboard::{self, FilaComUnidade};
use regulacao_core::db::DbPool;
use regulacao_core::error::Result;
use tokio::sync::Mutex;

/// How long a fetched join result stays valid before the next request
/// re-queries the store.
pub const CACHE_TTL: Duration = Duration::from_secs(60);

struct Snapshot {
    rows: Arc<Vec<FilaComUnidade>>,
    fetched_at: Instant,
}

/// Shared application state: the pool plus a single memoized snapshot of
/// the dashboard join, refreshed on expiry or manual invalidation.
pub struct AppState {
    pool: DbPool,
    snapshot: Mutex<Option<Snapshot>>,
}

impl AppState {
    pub fn new(pool: DbPool) -> Self {
        Self {
            pool,
            snapshot: Mutex::new(None),
        }
    }

    /// Current dashboard rows, served from the snapshot while it is fresh.
    pub async fn fila(&self) -> Result<Arc<Vec<FilaComUnidade>>> {
        let mut guard = self.snapshot.lock().await;
        if let Some(snapshot) = guard.as_ref() {
            if is_fresh(snapshot.fetched_at, Instant::now(), CACHE_TTL) {
                return Ok(snapshot.rows.clone());
            }
        }

        let rows = Arc::new(dashboard::fetch_fila_com_unidades(&self.pool).await?);
        *guard = Some(Snapshot {
            rows: rows.clone(),
            fetched_at: Instant::now(),
        });
        Ok(rows)
    }

    /// Drop the snapshot; the next request hits the store again.
    pub async fn invalidate(&self) {
        *self.snapshot.lock().await = None;
    }
}

fn is_fresh(fetched_at: Instant, now: Instant, ttl: Duration) -> bool {
    now.duration_since(fetched_at) < ttl
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snapshot_expires_exactly_at_ttl() {
        let fetched_at = Instant::now();
        assert!(is_fresh(fetched_at, fetched_at, CACHE_TTL));
        assert!(is_fresh(
            fetched_at,
            fetched_at + CACHE_TTL - Duration::from_millis(1),
            CACHE_TTL
        ));
        assert!(!is_fresh(fetched_at, fetched_at + CACHE_TTL, CACHE_TTL));
    }
}
