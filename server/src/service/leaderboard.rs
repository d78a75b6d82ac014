// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use crate::store::{ProfileRecord, ProfileStore, RankingStore, StoreError};
use chrono::{DateTime, Utc};
use log::{info, warn};
use podium_common::{PeriodId, PlayerSnapshotDto, RankStatusDto, RankedScoreDto, SubmitOutcomeDto};
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::sync::Arc;
use std::time::Duration;

/// Leaderboard entries expire this long after their period's first write.
pub const DEFAULT_RETENTION: Duration = Duration::from_secs(60 * 24 * 60 * 60);

/// Top-N view length when the caller doesn't ask for one.
pub const TOP_N_DEFAULT: usize = 10;

/// Score rejected before it reaches any store.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum SubmitError {
    /// Scores must be finite and non-negative.
    InvalidScore(f64),
}

impl Error for SubmitError {}

impl Display for SubmitError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidScore(score) => write!(f, "invalid score: {score}"),
        }
    }
}

/// Orchestrates the monthly leaderboard: submissions, rank/percentile
/// queries, the top-N view, and the dashboard snapshot.
///
/// Stateless between calls; each operation independently derives the active
/// period from the caller-supplied clock and probes the stores. A ranking
/// store outage degrades responses (zeroed ranking fields, `degraded` flag)
/// instead of failing them, falling back to the profile store for the
/// player's best-known score where one is needed.
pub struct LeaderboardService<R, P> {
    ranking: Arc<R>,
    profiles: Arc<P>,
    retention: Duration,
}

/// Raw per-player reads from the ranking store, in the order the store was
/// probed.
struct StoreStats {
    score: Option<f64>,
    rank: Option<u64>,
    total: u64,
}

impl<R: RankingStore, P: ProfileStore> LeaderboardService<R, P> {
    pub fn new(ranking: Arc<R>, profiles: Arc<P>) -> Self {
        Self::with_retention(ranking, profiles, DEFAULT_RETENTION)
    }

    pub fn with_retention(ranking: Arc<R>, profiles: Arc<P>, retention: Duration) -> Self {
        Self {
            ranking,
            profiles,
            retention,
        }
    }

    /// Records `score` for the active period and reads back the player's
    /// 1-based rank.
    ///
    /// Max-retention: a submission below the player's existing score for the
    /// period leaves the stored score alone and only refreshes the rank. The
    /// upsert itself is conditional-max on the store side, so a concurrent
    /// better score cannot be regressed by a stale comparison here.
    ///
    /// A store outage returns a degraded success (`current_rank: 0`, score
    /// echoed) rather than an error.
    pub async fn submit_score(
        &self,
        player_id: &str,
        score: f64,
        now: DateTime<Utc>,
    ) -> Result<SubmitOutcomeDto, SubmitError> {
        if !score.is_finite() || score < 0.0 {
            return Err(SubmitError::InvalidScore(score));
        }
        let period = PeriodId::derive(now);
        let outcome = match self.submit_to_store(period, player_id, score).await {
            Ok(rank) => SubmitOutcomeDto {
                player: player_id.to_owned(),
                current_rank: rank,
                score,
                degraded: false,
            },
            Err(StoreError::Unavailable) => {
                warn!("degraded submit for {player_id}: ranking store unavailable");
                SubmitOutcomeDto {
                    player: player_id.to_owned(),
                    current_rank: 0,
                    score,
                    degraded: true,
                }
            }
        };
        Ok(outcome)
    }

    async fn submit_to_store(
        &self,
        period: PeriodId,
        player_id: &str,
        score: f64,
    ) -> Result<u64, StoreError> {
        let existing = self.ranking.score(period, player_id).await?;
        if existing.map_or(true, |existing| existing < score) {
            self.ranking.upsert_max(period, player_id, score).await?;
            self.ranking.set_expiry(period, self.retention).await?;
        }
        let rank = self.ranking.rank(period, player_id).await?;
        Ok(rank.map_or(0, |r| r + 1))
    }

    /// The player's standing within the active period.
    ///
    /// Outage: all-zero ranking fields, `degraded`, score from the profile
    /// store's best-known value. No entry (new player this period): rank and
    /// percentile 0, score likewise from the profile fallback.
    pub async fn rank_and_stats(&self, player_id: &str, now: DateTime<Utc>) -> RankStatusDto {
        let period = PeriodId::derive(now);
        let stats = self.store_stats(period, player_id).await;
        let needs_fallback = match &stats {
            Ok(stats) => stats.rank.is_none(),
            Err(StoreError::Unavailable) => true,
        };
        let fallback_score = if needs_fallback {
            self.fallback_score(player_id, now).await
        } else {
            0.0
        };
        assemble_rank_status(stats, fallback_score)
    }

    /// Reads score, rank, and cardinality, in that order.
    async fn store_stats(
        &self,
        period: PeriodId,
        player_id: &str,
    ) -> Result<StoreStats, StoreError> {
        let score = self.ranking.score(period, player_id).await?;
        let rank = self.ranking.rank(period, player_id).await?;
        let total = self.ranking.cardinality(period).await?;
        Ok(StoreStats { score, rank, total })
    }

    /// Top `n` players of the active period, highest score first. An outage
    /// yields an empty view ("no ranking available"), never an error.
    pub async fn top_n(&self, now: DateTime<Utc>, n: usize) -> Vec<RankedScoreDto> {
        let period = PeriodId::derive(now);
        match self.ranking.top_n(period, n).await {
            Ok(entries) => entries
                .into_iter()
                .enumerate()
                .map(|(i, (user_id, score))| RankedScoreDto {
                    rank: i as u64 + 1,
                    user_id,
                    score,
                })
                .collect(),
            Err(StoreError::Unavailable) => {
                warn!("degraded top-{n} view: ranking store unavailable");
                Vec::new()
            }
        }
    }

    /// Dashboard read model: ranking fields joined with profile metadata.
    /// The two stores degrade independently; a profile outage zeroes the
    /// profile fields without touching the ranking ones, and vice versa.
    pub async fn player_snapshot(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> PlayerSnapshotDto {
        let profile = match self.profile_or_initial(player_id, now).await {
            Ok(profile) => Some(profile),
            Err(e) => {
                warn!("degraded snapshot for {player_id}: {e}");
                None
            }
        };
        let profile_degraded = profile.is_none();
        let fallback_score = profile.as_ref().map_or(0.0, |p| p.high_score);
        let period = PeriodId::derive(now);
        let status = assemble_rank_status(
            self.store_stats(period, player_id).await,
            fallback_score,
        );
        PlayerSnapshotDto {
            high_score: status.score,
            rank: status.rank,
            total_players: status.total_players,
            top_percent: status.top_percent,
            gold: profile.as_ref().map_or(0, |p| p.gold),
            account_created_at: profile
                .and_then(|p| p.account_created_at)
                .unwrap_or_else(|| now.to_rfc3339()),
            degraded: status.degraded || profile_degraded,
        }
    }

    /// Best-known score when the ranking store can't answer: the profile
    /// store's persisted value, or 0 if that store is down too.
    async fn fallback_score(&self, player_id: &str, now: DateTime<Utc>) -> f64 {
        match self.profile_or_initial(player_id, now).await {
            Ok(profile) => profile.high_score,
            Err(e) => {
                warn!("no fallback score for {player_id}: {e}");
                0.0
            }
        }
    }

    /// Reads the player's profile, lazily creating the initial record for a
    /// never-seen player.
    async fn profile_or_initial(
        &self,
        player_id: &str,
        now: DateTime<Utc>,
    ) -> Result<ProfileRecord, crate::store::ProfileStoreError> {
        if let Some(profile) = self.profiles.get(player_id).await? {
            return Ok(profile);
        }
        info!("creating profile for {player_id}");
        let profile = ProfileRecord::initial(player_id, now);
        self.profiles.put(&profile).await?;
        Ok(profile)
    }
}

fn assemble_rank_status(stats: Result<StoreStats, StoreError>, fallback_score: f64) -> RankStatusDto {
    match stats {
        Err(StoreError::Unavailable) => RankStatusDto {
            rank: 0,
            score: fallback_score,
            total_players: 0,
            top_percent: 0.0,
            degraded: true,
        },
        Ok(StoreStats { rank: None, total, .. }) => RankStatusDto {
            rank: 0,
            score: fallback_score,
            total_players: total,
            top_percent: 0.0,
            degraded: false,
        },
        Ok(StoreStats {
            score,
            rank: Some(reverse_rank),
            total,
        }) => {
            let rank = reverse_rank + 1;
            RankStatusDto {
                rank,
                score: score.unwrap_or(0.0),
                total_players: total,
                top_percent: if total > 0 {
                    round1(rank as f64 / total as f64 * 100.0)
                } else {
                    0.0
                },
                degraded: false,
            }
        }
    }
}

fn round1(x: f64) -> f64 {
    (x * 10.0).round() / 10.0
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{MemoryProfileStore, MemoryRankingStore, ProfileStore};
    use chrono::TimeZone;

    fn now() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 6, 15, 9, 0, 0).unwrap()
    }

    fn next_month() -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2025, 7, 1, 0, 0, 0).unwrap()
    }

    fn service() -> LeaderboardService<MemoryRankingStore, MemoryProfileStore> {
        LeaderboardService::new(
            Arc::new(MemoryRankingStore::new()),
            Arc::new(MemoryProfileStore::new()),
        )
    }

    #[tokio::test]
    async fn submit_reports_rank() {
        let service = service();
        let outcome = service.submit_score("alice", 100.0, now()).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcomeDto {
                player: "alice".to_owned(),
                current_rank: 1,
                score: 100.0,
                degraded: false,
            }
        );
    }

    #[tokio::test]
    async fn lower_resubmission_keeps_best_score() {
        let service = service();
        service.submit_score("alice", 100.0, now()).await.unwrap();
        let outcome = service.submit_score("alice", 40.0, now()).await.unwrap();
        // Echoes the submitted score, but the standing is untouched.
        assert_eq!(outcome.score, 40.0);
        assert_eq!(outcome.current_rank, 1);
        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(status.score, 100.0);
    }

    #[tokio::test]
    async fn invalid_scores_rejected_before_store() {
        let service = service();
        // Even with the store down, validation answers synchronously.
        service.ranking.set_available(false);
        for score in [-1.0, f64::NAN, f64::INFINITY] {
            let result = service.submit_score("alice", score, now()).await;
            assert!(matches!(result, Err(SubmitError::InvalidScore(_))));
        }
    }

    #[tokio::test]
    async fn worked_example() {
        let service = service();
        service.submit_score("alice", 100.0, now()).await.unwrap();
        service.submit_score("bob", 150.0, now()).await.unwrap();

        let top = service.top_n(now(), 10).await;
        assert_eq!(
            top,
            vec![
                RankedScoreDto {
                    rank: 1,
                    user_id: "bob".to_owned(),
                    score: 150.0
                },
                RankedScoreDto {
                    rank: 2,
                    user_id: "alice".to_owned(),
                    score: 100.0
                },
            ]
        );

        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(
            status,
            RankStatusDto {
                rank: 2,
                score: 100.0,
                total_players: 2,
                top_percent: 100.0,
                degraded: false,
            }
        );
    }

    #[tokio::test]
    async fn top_player_percentile() {
        let service = service();
        for (i, player) in ["carol", "dave", "erin"].into_iter().enumerate() {
            service
                .submit_score(player, 10.0 * (i + 1) as f64, now())
                .await
                .unwrap();
        }
        let status = service.rank_and_stats("erin", now()).await;
        assert_eq!(status.rank, 1);
        assert_eq!(status.total_players, 3);
        // Literal rank/total formula: 1 of 3 is 33.3, not 66.7.
        assert_eq!(status.top_percent, 33.3);
    }

    #[tokio::test]
    async fn top_n_length_capped() {
        let service = service();
        for player in ["a", "b", "c"] {
            service.submit_score(player, 1.0, now()).await.unwrap();
        }
        assert_eq!(service.top_n(now(), 2).await.len(), 2);
        assert_eq!(service.top_n(now(), 10).await.len(), 3);
        assert!(service.top_n(now(), 0).await.is_empty());
    }

    #[tokio::test]
    async fn absent_player_falls_back_to_profile() {
        let service = service();
        service.submit_score("bob", 50.0, now()).await.unwrap();
        service
            .profiles
            .put(&ProfileRecord {
                user_id: "alice".to_owned(),
                gold: 5,
                level: 3,
                high_score: 77.0,
                account_created_at: Some("2024-01-01T00:00:00+00:00".to_owned()),
            })
            .await
            .unwrap();

        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(status.rank, 0);
        assert_eq!(status.top_percent, 0.0);
        assert_eq!(status.score, 77.0);
        assert_eq!(status.total_players, 1);
        assert!(!status.degraded);
    }

    #[tokio::test]
    async fn never_seen_player_gets_initial_profile() {
        let service = service();
        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(status.rank, 0);
        assert_eq!(status.score, 0.0);

        let created = service.profiles.get("alice").await.unwrap().unwrap();
        assert_eq!(created.gold, 0);
        assert_eq!(created.level, 1);
        assert_eq!(created.account_created_at, Some(now().to_rfc3339()));
    }

    #[tokio::test]
    async fn outage_degrades_submit() {
        let service = service();
        service.ranking.set_available(false);
        let outcome = service.submit_score("alice", 100.0, now()).await.unwrap();
        assert_eq!(
            outcome,
            SubmitOutcomeDto {
                player: "alice".to_owned(),
                current_rank: 0,
                score: 100.0,
                degraded: true,
            }
        );
    }

    #[tokio::test]
    async fn outage_degrades_queries() {
        let service = service();
        service.submit_score("alice", 100.0, now()).await.unwrap();
        service
            .profiles
            .put(&ProfileRecord {
                user_id: "alice".to_owned(),
                gold: 0,
                level: 1,
                high_score: 88.0,
                account_created_at: None,
            })
            .await
            .unwrap();
        service.ranking.set_available(false);

        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(
            status,
            RankStatusDto {
                rank: 0,
                score: 88.0,
                total_players: 0,
                top_percent: 0.0,
                degraded: true,
            }
        );
        assert!(service.top_n(now(), 10).await.is_empty());
    }

    #[tokio::test]
    async fn both_stores_down_still_success_shaped() {
        let service = service();
        service.ranking.set_available(false);
        service.profiles.set_available(false);
        let status = service.rank_and_stats("alice", now()).await;
        assert_eq!(status.rank, 0);
        assert_eq!(status.score, 0.0);
        assert!(status.degraded);
    }

    #[tokio::test]
    async fn profile_outage_never_blocks_submission() {
        let service = service();
        service.profiles.set_available(false);
        let outcome = service.submit_score("alice", 100.0, now()).await.unwrap();
        assert_eq!(outcome.current_rank, 1);
        assert!(!outcome.degraded);
    }

    #[tokio::test]
    async fn periods_are_isolated() {
        let service = service();
        service.submit_score("alice", 100.0, now()).await.unwrap();

        let status = service.rank_and_stats("alice", next_month()).await;
        assert_eq!(status.rank, 0);
        assert_eq!(status.total_players, 0);
        assert!(service.top_n(next_month(), 10).await.is_empty());

        // The prior period is untouched.
        assert_eq!(service.rank_and_stats("alice", now()).await.rank, 1);
    }

    #[tokio::test]
    async fn retention_recorded_once_per_period() {
        let retention = Duration::from_secs(60 * 60);
        let ranking = Arc::new(MemoryRankingStore::new());
        let service = LeaderboardService::with_retention(
            Arc::clone(&ranking),
            Arc::new(MemoryProfileStore::new()),
            retention,
        );
        service.submit_score("alice", 1.0, now()).await.unwrap();
        service.submit_score("alice", 2.0, now()).await.unwrap();
        assert_eq!(ranking.ttl(PeriodId::derive(now())), Some(retention));
    }

    #[tokio::test]
    async fn snapshot_combines_profile_and_ranking() {
        let service = service();
        service
            .profiles
            .put(&ProfileRecord {
                user_id: "alice".to_owned(),
                gold: 12,
                level: 4,
                high_score: 10.0,
                account_created_at: Some("2024-05-01T00:00:00+00:00".to_owned()),
            })
            .await
            .unwrap();
        service.submit_score("alice", 100.0, now()).await.unwrap();
        service.submit_score("bob", 150.0, now()).await.unwrap();

        let snapshot = service.player_snapshot("alice", now()).await;
        assert_eq!(
            snapshot,
            PlayerSnapshotDto {
                high_score: 100.0,
                rank: 2,
                total_players: 2,
                top_percent: 100.0,
                gold: 12,
                account_created_at: "2024-05-01T00:00:00+00:00".to_owned(),
                degraded: false,
            }
        );
    }

    #[tokio::test]
    async fn snapshot_profile_outage_leaves_ranking_intact() {
        let service = service();
        service.submit_score("alice", 100.0, now()).await.unwrap();
        service.profiles.set_available(false);

        let snapshot = service.player_snapshot("alice", now()).await;
        assert_eq!(snapshot.rank, 1);
        assert_eq!(snapshot.high_score, 100.0);
        assert_eq!(snapshot.gold, 0);
        assert_eq!(snapshot.account_created_at, now().to_rfc3339());
        assert!(snapshot.degraded);
    }

    #[tokio::test]
    async fn snapshot_ranking_outage_leaves_profile_intact() {
        let service = service();
        service
            .profiles
            .put(&ProfileRecord {
                user_id: "alice".to_owned(),
                gold: 3,
                level: 2,
                high_score: 55.0,
                account_created_at: Some("2024-05-01T00:00:00+00:00".to_owned()),
            })
            .await
            .unwrap();
        service.ranking.set_available(false);

        let snapshot = service.player_snapshot("alice", now()).await;
        assert_eq!(snapshot.rank, 0);
        assert_eq!(snapshot.high_score, 55.0);
        assert_eq!(snapshot.gold, 3);
        assert!(snapshot.degraded);
    }
}
