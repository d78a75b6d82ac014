// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::{ProfileRecord, ProfileStore, ProfileStoreError, RankingStore, StoreError};
use async_trait::async_trait;
use podium_common::PeriodId;
use std::collections::{BTreeMap, HashMap};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Mutex;
use std::time::Duration;

/// In-memory [`RankingStore`] for tests and local development. Replicates
/// the redis semantics the engine relies on: conditional-max upserts,
/// first-write expiry anchoring, and lexicographic-by-id tie-break.
///
/// `set_available(false)` simulates a store outage: every operation fails
/// with [`StoreError::Unavailable`] until switched back.
#[derive(Default)]
pub struct MemoryRankingStore {
    periods: Mutex<BTreeMap<String, PeriodEntries>>,
    unavailable: AtomicBool,
}

#[derive(Default)]
struct PeriodEntries {
    scores: HashMap<String, f64>,
    ttl: Option<Duration>,
}

impl PeriodEntries {
    /// Descending score, then descending id among ties, matching ZREVRANGE.
    fn reverse_ordered(&self) -> Vec<(String, f64)> {
        let mut entries: Vec<(String, f64)> = self
            .scores
            .iter()
            .map(|(id, score)| (id.clone(), *score))
            .collect();
        entries.sort_by(|a, b| a.1.total_cmp(&b.1).then_with(|| a.0.cmp(&b.0)));
        entries.reverse();
        entries
    }
}

impl MemoryRankingStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }

    /// The retention window recorded for the period, if any.
    pub fn ttl(&self, period: PeriodId) -> Option<Duration> {
        let periods = self.periods.lock().unwrap();
        periods.get(&period.to_string()).and_then(|p| p.ttl)
    }

    fn check_available(&self) -> Result<(), StoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(StoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl RankingStore for MemoryRankingStore {
    async fn upsert_max(
        &self,
        period: PeriodId,
        player_id: &str,
        score: f64,
    ) -> Result<(), StoreError> {
        self.check_available()?;
        let mut periods = self.periods.lock().unwrap();
        let entry = periods
            .entry(period.to_string())
            .or_default()
            .scores
            .entry(player_id.to_owned())
            .or_insert(f64::NEG_INFINITY);
        *entry = entry.max(score);
        Ok(())
    }

    async fn set_expiry(&self, period: PeriodId, ttl: Duration) -> Result<(), StoreError> {
        self.check_available()?;
        let mut periods = self.periods.lock().unwrap();
        let entry = periods.entry(period.to_string()).or_default();
        entry.ttl.get_or_insert(ttl);
        Ok(())
    }

    async fn rank(&self, period: PeriodId, player_id: &str) -> Result<Option<u64>, StoreError> {
        self.check_available()?;
        let periods = self.periods.lock().unwrap();
        Ok(periods.get(&period.to_string()).and_then(|p| {
            p.reverse_ordered()
                .iter()
                .position(|(id, _)| id == player_id)
                .map(|i| i as u64)
        }))
    }

    async fn score(&self, period: PeriodId, player_id: &str) -> Result<Option<f64>, StoreError> {
        self.check_available()?;
        let periods = self.periods.lock().unwrap();
        Ok(periods
            .get(&period.to_string())
            .and_then(|p| p.scores.get(player_id).copied()))
    }

    async fn top_n(&self, period: PeriodId, n: usize) -> Result<Vec<(String, f64)>, StoreError> {
        self.check_available()?;
        let periods = self.periods.lock().unwrap();
        Ok(periods
            .get(&period.to_string())
            .map(|p| {
                let mut entries = p.reverse_ordered();
                entries.truncate(n);
                entries
            })
            .unwrap_or_default())
    }

    async fn cardinality(&self, period: PeriodId) -> Result<u64, StoreError> {
        self.check_available()?;
        let periods = self.periods.lock().unwrap();
        Ok(periods
            .get(&period.to_string())
            .map_or(0, |p| p.scores.len() as u64))
    }
}

/// In-memory [`ProfileStore`] with the same outage switch as
/// [`MemoryRankingStore`].
#[derive(Default)]
pub struct MemoryProfileStore {
    profiles: Mutex<HashMap<String, ProfileRecord>>,
    unavailable: AtomicBool,
}

impl MemoryProfileStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_available(&self, available: bool) {
        self.unavailable.store(!available, Ordering::Relaxed);
    }

    fn check_available(&self) -> Result<(), ProfileStoreError> {
        if self.unavailable.load(Ordering::Relaxed) {
            Err(ProfileStoreError::Unavailable)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl ProfileStore for MemoryProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>, ProfileStoreError> {
        self.check_available()?;
        let profiles = self.profiles.lock().unwrap();
        Ok(profiles.get(user_id).cloned())
    }

    async fn put(&self, profile: &ProfileRecord) -> Result<(), ProfileStoreError> {
        self.check_available()?;
        let mut profiles = self.profiles.lock().unwrap();
        profiles.insert(profile.user_id.clone(), profile.clone());
        Ok(())
    }
}
