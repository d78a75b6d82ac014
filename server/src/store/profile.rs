// SPDX-FileCopyrightText: 2024 Softbear, Inc.
// SPDX-License-Identifier: LGPL-3.0-or-later

use async_trait::async_trait;
use aws_sdk_dynamodb::types::AttributeValue;
use aws_sdk_dynamodb::Client;
use chrono::{DateTime, Utc};
use log::warn;
use std::collections::HashMap;
use std::error::Error;
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

/// Failure of the external profile store. Isolated from [`StoreError`] so a
/// profile outage never blocks score submission, and vice versa.
///
/// [`StoreError`]: super::StoreError
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
pub enum ProfileStoreError {
    Unavailable,
}

impl Error for ProfileStoreError {}

impl Display for ProfileStoreError {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unavailable => f.write_str("profile store unavailable"),
        }
    }
}

/// Durable per-player record. Owned by the profile store; the engine only
/// reads it as a fallback value source and lazily creates the initial record
/// for a never-seen player.
#[derive(Clone, Debug, PartialEq)]
pub struct ProfileRecord {
    pub user_id: String,
    pub gold: i64,
    pub level: u32,
    /// Best-known score, used only when the ranking store has no entry or is
    /// unreachable.
    pub high_score: f64,
    pub account_created_at: Option<String>,
}

impl ProfileRecord {
    /// The record lazily written for a first-seen player.
    pub fn initial(user_id: &str, now: DateTime<Utc>) -> Self {
        Self {
            user_id: user_id.to_owned(),
            gold: 0,
            level: 1,
            high_score: 0.0,
            account_created_at: Some(now.to_rfc3339()),
        }
    }
}

#[async_trait]
pub trait ProfileStore: Send + Sync {
    async fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>, ProfileStoreError>;

    async fn put(&self, profile: &ProfileRecord) -> Result<(), ProfileStoreError>;
}

/// [`ProfileStore`] over a DynamoDB table keyed by `user_id`. The client is
/// constructed once by the hosting process and reused across requests.
pub struct DynamoProfileStore {
    client: Client,
    table: String,
}

impl DynamoProfileStore {
    pub fn new(client: Client, table: String) -> Self {
        Self { client, table }
    }

    pub async fn from_env(table: String) -> Self {
        let config = aws_config::load_from_env().await;
        Self::new(Client::new(&config), table)
    }

    /// Missing or malformed attributes fall back to the initial-record
    /// defaults rather than failing the read; the table schema predates this
    /// service and not every row carries every field.
    fn from_item(item: &HashMap<String, AttributeValue>) -> ProfileRecord {
        ProfileRecord {
            user_id: string_attr(item, "user_id").unwrap_or_default(),
            gold: number_attr(item, "gold").unwrap_or(0),
            level: number_attr(item, "level").unwrap_or(1),
            high_score: number_attr(item, "high_score").unwrap_or(0.0),
            account_created_at: string_attr(item, "account_created_at"),
        }
    }
}

fn string_attr(item: &HashMap<String, AttributeValue>, name: &str) -> Option<String> {
    item.get(name).and_then(|v| v.as_s().ok()).cloned()
}

fn number_attr<T: FromStr>(item: &HashMap<String, AttributeValue>, name: &str) -> Option<T> {
    item.get(name)
        .and_then(|v| v.as_n().ok())
        .and_then(|n| n.parse().ok())
}

fn unavailable(e: impl Display) -> ProfileStoreError {
    warn!("profile store error: {e}");
    ProfileStoreError::Unavailable
}

#[async_trait]
impl ProfileStore for DynamoProfileStore {
    async fn get(&self, user_id: &str) -> Result<Option<ProfileRecord>, ProfileStoreError> {
        let output = self
            .client
            .get_item()
            .table_name(&self.table)
            .key("user_id", AttributeValue::S(user_id.to_owned()))
            .send()
            .await
            .map_err(unavailable)?;
        Ok(output.item().map(Self::from_item))
    }

    async fn put(&self, profile: &ProfileRecord) -> Result<(), ProfileStoreError> {
        let mut request = self
            .client
            .put_item()
            .table_name(&self.table)
            .item("user_id", AttributeValue::S(profile.user_id.clone()))
            .item("gold", AttributeValue::N(profile.gold.to_string()))
            .item("level", AttributeValue::N(profile.level.to_string()))
            .item("high_score", AttributeValue::N(profile.high_score.to_string()));
        if let Some(created_at) = &profile.account_created_at {
            request = request.item("account_created_at", AttributeValue::S(created_at.clone()));
        }
        request.send().await.map_err(unavailable)?;
        Ok(())
    }
}
