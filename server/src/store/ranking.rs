// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use async_trait::async_trait;
use deadpool_redis::redis::AsyncCommands as _;
use deadpool_redis::{redis, Config, Connection, CreatePoolError, Pool, Runtime};
use log::warn;
use podium_common::PeriodId;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::time::Duration;

/// Failure of the external ranking store.
///
/// Deliberately coarse: every connection, timeout, or protocol failure maps
/// to `Unavailable`, and callers recover by degrading instead of erroring.
/// A player with no entry is `Ok(None)`, never an error.
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum StoreError {
    Unavailable,
}

impl Error for StoreError {}

impl Display for StoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("ranking store unavailable"),
        }
    }
}

/// The only component that talks to the external sorted-set store.
///
/// One entry per `(period, player)`; scores are non-negative. Equal scores
/// order lexicographically by player id, so reverse views list the
/// lexicographically greater id first. This mirrors redis sorted-set
/// semantics and is documented rather than fair.
#[async_trait]
pub trait RankingStore: Send + Sync {
    /// Conditional-max upsert: the stored score only ever increases. Atomic
    /// on the store side, so concurrent submissions from the same player
    /// cannot regress a better score.
    async fn upsert_max(
        &self,
        period: PeriodId,
        player_id: &str,
        score: f64,
    ) -> Result<(), StoreError>;

    /// Anchors the retention window at the period's first write: the ttl is
    /// only applied if the key has none yet. Idempotent, safe on every
    /// submission.
    async fn set_expiry(&self, period: PeriodId, ttl: Duration) -> Result<(), StoreError>;

    /// 0-based reverse rank (0 = best), `None` if the player has no entry.
    async fn rank(&self, period: PeriodId, player_id: &str) -> Result<Option<u64>, StoreError>;

    async fn score(&self, period: PeriodId, player_id: &str) -> Result<Option<f64>, StoreError>;

    /// Up to `n` entries, highest score first.
    async fn top_n(&self, period: PeriodId, n: usize) -> Result<Vec<(String, f64)>, StoreError>;

    /// Distinct players with an entry in the period.
    async fn cardinality(&self, period: PeriodId) -> Result<u64, StoreError>;
}

/// [`RankingStore`] over a long-lived redis connection pool. The pool is
/// constructed once by the hosting process and shared across requests;
/// reconnect behavior belongs to the pool, not to callers.
pub struct RedisRankingStore {
    pool: Pool,
}

impl RedisRankingStore {
    pub fn new(pool: Pool) -> Self {
        Self { pool }
    }

    pub fn from_url(url: &str) -> Result<Self, CreatePoolError> {
        Ok(Self::new(Config::from_url(url).create_pool(Some(Runtime::Tokio1))?))
    }

    async fn connection(&self) -> Result<Connection, StoreError> {
        self.pool.get().await.map_err(unavailable)
    }
}

fn unavailable(e: impl Display) -> StoreError {
    warn!("ranking store error: {e}");
    StoreError::Unavailable
}

#[async_trait]
impl RankingStore for RedisRankingStore {
    async fn upsert_max(
        &self,
        period: PeriodId,
        player_id: &str,
        score: f64,
    ) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        // ZADD GT is the atomic set-if-greater primitive.
        redis::cmd("ZADD")
            .arg(period.to_string())
            .arg("GT")
            .arg(score)
            .arg(player_id)
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn set_expiry(&self, period: PeriodId, ttl: Duration) -> Result<(), StoreError> {
        let mut conn = self.connection().await?;
        // NX: keep the ttl from the period's first write.
        redis::cmd("EXPIRE")
            .arg(period.to_string())
            .arg(ttl.as_secs())
            .arg("NX")
            .query_async::<_, ()>(&mut conn)
            .await
            .map_err(unavailable)
    }

    async fn rank(&self, period: PeriodId, player_id: &str) -> Result<Option<u64>, StoreError> {
        let mut conn = self.connection().await?;
        conn.zrevrank(period.to_string(), player_id)
            .await
            .map_err(unavailable)
    }

    async fn score(&self, period: PeriodId, player_id: &str) -> Result<Option<f64>, StoreError> {
        let mut conn = self.connection().await?;
        conn.zscore(period.to_string(), player_id)
            .await
            .map_err(unavailable)
    }

    async fn top_n(&self, period: PeriodId, n: usize) -> Result<Vec<(String, f64)>, StoreError> {
        if n == 0 {
            // ZREVRANGE 0 -1 would mean "everything".
            return Ok(Vec::new());
        }
        let mut conn = self.connection().await?;
        conn.zrevrange_withscores(period.to_string(), 0, n as isize - 1)
            .await
            .map_err(unavailable)
    }

    async fn cardinality(&self, period: PeriodId) -> Result<u64, StoreError> {
        let mut conn = self.connection().await?;
        conn.zcard(period.to_string()).await.map_err(unavailable)
    }
}
