// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

mod memory;
mod profile;
mod ranking;

pub use self::memory::{MemoryProfileStore, MemoryRankingStore};
pub use self::profile::{DynamoProfileStore, ProfileRecord, ProfileStore, ProfileStoreError};
pub use self::ranking::{RankingStore, RedisRankingStore, StoreError};
