// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use serde::{Deserialize, Serialize};

/// Sentinel player id substituted when the caller omits one. Kept for wire
/// compatibility; see [`RankingRequest`].
pub const UNKNOWN_PLAYER: &str = "unknown_player";

/// Caller-facing request, one of two observed modes selected by `action`.
///
/// Missing fields take the historical defaults: no `action` means save, no
/// `user_id` means [`UNKNOWN_PLAYER`], no `score` means `0`. These defaults
/// are preserved for compatibility with existing clients, not endorsed.
#[derive(Clone, Debug, Deserialize)]
pub struct RankingRequest {
    #[serde(default)]
    pub action: RankingAction,
    #[serde(default = "unknown_player")]
    pub user_id: String,
    #[serde(default)]
    pub score: f64,
}

fn unknown_player() -> String {
    UNKNOWN_PLAYER.to_owned()
}

/// `get_ranking` and `settlement` both select the top-N view; anything else,
/// including an unrecognized action, is treated as a save.
#[derive(Copy, Clone, Debug, Default, Eq, PartialEq)]
pub enum RankingAction {
    #[default]
    Save,
    GetRanking,
    Settlement,
    Unknown,
}

impl<'de> Deserialize<'de> for RankingAction {
    fn deserialize<D: serde::Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        // Tolerant on purpose: an unrecognized action has always meant save.
        Ok(match String::deserialize(deserializer)?.as_str() {
            "save" => Self::Save,
            "get_ranking" => Self::GetRanking,
            "settlement" => Self::Settlement,
            _ => Self::Unknown,
        })
    }
}

/// Caller-facing response envelope, tagged by the mode that produced it.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(tag = "mode")]
pub enum RankingResponse {
    #[serde(rename = "Score_Save")]
    Save {
        status: ResponseStatus,
        #[serde(flatten)]
        outcome: SubmitOutcomeDto,
    },
    #[serde(rename = "Ranking_View")]
    Ranking {
        status: ResponseStatus,
        rankings: Vec<RankedScoreDto>,
    },
}

/// Every response is success-shaped, even under backend outage; degradation
/// is signalled by zeroed ranking fields and the `degraded` flag instead of
/// an error status, so client UIs stay usable.
#[derive(Copy, Clone, Debug, Eq, PartialEq, Serialize, Deserialize)]
pub enum ResponseStatus {
    Success,
}

/// Result of a score submission.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct SubmitOutcomeDto {
    pub player: String,
    /// 1-based; 0 means unranked (store outage).
    pub current_rank: u64,
    /// The submitted score, echoed back. The stored score may be higher if
    /// the player already did better this period.
    pub score: f64,
    pub degraded: bool,
}

/// One line of the top-N view, highest score first.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankedScoreDto {
    /// 1-based position within the period.
    pub rank: u64,
    pub user_id: String,
    pub score: f64,
}

/// A player's standing within the active period.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct RankStatusDto {
    /// 1-based; 0 means unranked.
    pub rank: u64,
    pub score: f64,
    pub total_players: u64,
    /// Literally `rank / total_players * 100` rounded to one decimal, so the
    /// top player of a field of 10 reads `10.0`, not `90.0`. Preserved from
    /// the historical wire format; do not "fix" without migrating consumers.
    pub top_percent: f64,
    pub degraded: bool,
}

/// Dashboard read model: ranking fields plus pass-through profile metadata.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PlayerSnapshotDto {
    pub high_score: f64,
    /// 1-based; 0 means unranked.
    pub rank: u64,
    pub total_players: u64,
    pub top_percent: f64,
    pub gold: i64,
    pub account_created_at: String,
    pub degraded: bool,
}
