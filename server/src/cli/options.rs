// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use clap::Parser;
use log::LevelFilter;
use std::time::Duration;

/// Server options, to be specified as arguments.
#[derive(Debug, Parser)]
#[clap(ignore_errors = true)]
pub struct Options {
    /// Ranking store connection URL.
    #[clap(long, default_value = "redis://localhost:6379")]
    pub redis_url: String,
    /// Profile store table name.
    #[clap(long, default_value = "userdata")]
    pub profile_table: String,
    /// Leaderboard retention, in days from a period's first write.
    #[clap(long, default_value = "60")]
    pub retention_days: u32,
    /// Log engine diagnostics
    #[cfg_attr(debug_assertions, clap(long, default_value = "info"))]
    #[cfg_attr(not(debug_assertions), clap(long, default_value = "warn"))]
    pub debug_engine: LevelFilter,
    /// Log store diagnostics
    #[cfg_attr(debug_assertions, clap(long, default_value = "info"))]
    #[cfg_attr(not(debug_assertions), clap(long, default_value = "warn"))]
    pub debug_store: LevelFilter,
}

impl Options {
    pub fn init_logger(&self) {
        env_logger::Builder::new()
            .filter_level(LevelFilter::Warn)
            .filter_module("podium_server::service", self.debug_engine)
            .filter_module("podium_server::store", self.debug_store)
            .init();
    }

    pub fn retention(&self) -> Duration {
        Duration::from_secs(self.retention_days as u64 * 24 * 60 * 60)
    }
}
