// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

mod cli;
mod service;
mod store;

pub use self::cli::Options;
pub use self::service::{LeaderboardService, SubmitError, DEFAULT_RETENTION, TOP_N_DEFAULT};
pub use self::store::{
    DynamoProfileStore, MemoryProfileStore, MemoryRankingStore, ProfileRecord, ProfileStore,
    ProfileStoreError, RankingStore, RedisRankingStore, StoreError,
};

// Re-export podium_common.
pub use podium_common::*;
