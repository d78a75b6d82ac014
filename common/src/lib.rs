// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

mod period;
mod protocol;

pub use period::*;
pub use protocol::*;

// Re-export commonly-used third party crates.
pub use {chrono, serde};
