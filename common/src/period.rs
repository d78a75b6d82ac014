// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use chrono::{DateTime, Datelike, Utc};
use std::fmt::{self, Display, Formatter};

/// Identifies one calendar month (UTC) of competitive ranking.
///
/// Keys render as `rank:{year}:{month}` with a zero-padded month, so their
/// lexicographic order matches chronological order. Entries never leak across
/// periods; a new month starts an empty ranking.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Ord, PartialOrd, Hash)]
pub struct PeriodId {
    year: i32,
    month: u32,
}

impl PeriodId {
    /// Maps a timestamp to the period it falls in. Pure; callers inject the
    /// clock, which keeps everything downstream deterministic in tests.
    pub fn derive(now: DateTime<Utc>) -> Self {
        Self {
            year: now.year(),
            month: now.month(),
        }
    }
}

impl Display for PeriodId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "rank:{:04}:{:02}", self.year, self.month)
    }
}
