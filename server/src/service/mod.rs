// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

mod api;
mod leaderboard;

pub use self::leaderboard::{LeaderboardService, SubmitError, DEFAULT_RETENTION, TOP_N_DEFAULT};
