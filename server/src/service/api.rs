// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use super::{LeaderboardService, SubmitError, TOP_N_DEFAULT};
use crate::store::{ProfileStore, RankingStore};
use chrono::{DateTime, Utc};
use podium_common::{RankingAction, RankingRequest, RankingResponse, ResponseStatus};

impl<R: RankingStore, P: ProfileStore> LeaderboardService<R, P> {
    /// Dispatches a caller request to the mode it selects: `get_ranking` and
    /// `settlement` read the top-N view, everything else saves. Input
    /// defaults ([`podium_common::UNKNOWN_PLAYER`], score 0) were already
    /// applied during deserialization.
    ///
    /// Only an invalid score is an error; backend outages surface as
    /// degraded success responses.
    pub async fn handle(
        &self,
        request: RankingRequest,
        now: DateTime<Utc>,
    ) -> Result<RankingResponse, SubmitError> {
        Ok(match request.action {
            RankingAction::GetRanking | RankingAction::Settlement => RankingResponse::Ranking {
                status: ResponseStatus::Success,
                rankings: self.top_n(now, TOP_N_DEFAULT).await,
            },
            RankingAction::Save | RankingAction::Unknown => RankingResponse::Save {
                status: ResponseStatus::Success,
                outcome: self
                    .submit_score(&request.user_id, request.score, now)
                    .await?,
            },
        })
    }
}
