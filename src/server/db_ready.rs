//! Database readiness probe.
//!
//! The server refuses to start serving until the database accepts a
//! connection. This is a liveness wait, not a circuit breaker: there is
//! no retry cap, it loops until the connect attempt succeeds.

use std::future::Future;

use sea_orm::{DatabaseConnection, DbErr};
use tokio::time::{Duration, sleep};
use tracing::{info, warn};

/// Polls `connect` until it yields a connection, sleeping `retry_delay`
/// between attempts. Generic over the connect closure so the loop can be
/// exercised without a real database.
pub async fn wait_for_db<C, F>(mut connect: C, retry_delay: Duration) -> DatabaseConnection
where
    C: FnMut() -> F,
    F: Future<Output = Result<DatabaseConnection, DbErr>>,
{
    let mut attempt: u32 = 1;
    loop {
        match connect().await {
            Ok(db) => {
                info!(attempt, "Database connection established.");
                return db;
            }
            Err(e) => {
                warn!(attempt, error = %e, "Database unavailable, retrying.");
                sleep(retry_delay).await;
                attempt += 1;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use sea_orm::Database;
    use std::sync::atomic::{AtomicU32, Ordering};

    #[tokio::test]
    async fn returns_immediately_when_db_is_up() {
        let attempts = AtomicU32::new(0);
        let _db = wait_for_db(
            || {
                attempts.fetch_add(1, Ordering::SeqCst);
                Database::connect("sqlite::memory:")
            },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn retries_until_connection_succeeds() {
        let attempts = AtomicU32::new(0);
        let _db = wait_for_db(
            || {
                let n = attempts.fetch_add(1, Ordering::SeqCst);
                async move {
                    if n < 5 {
                        Err(DbErr::Conn(sea_orm::RuntimeErr::Internal(
                            "connection refused".to_string(),
                        )))
                    } else {
                        Database::connect("sqlite::memory:").await
                    }
                }
            },
            Duration::from_secs(1),
        )
        .await;
        assert_eq!(attempts.load(Ordering::SeqCst), 6);
    }
}
