//! Record type and the sort criteria accepted by [`super::RecordStore::fetch`].

use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// A tracked URL with its submission metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Record {
    pub key: String,
    #[serde(rename = "count")]
    pub submit_count: u64,
    pub last_upserted: DateTime<Utc>,
}

impl Record {
    pub(crate) fn new(key: String) -> Self {
        Self {
            key,
            submit_count: 0,
            last_upserted: Utc::now(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SortError {
    #[error("invalid sortBy value '{0}', expected 'age' or 'count'")]
    InvalidSortBy(String),

    #[error("invalid sortOrder value '{0}', expected 'asc' or 'desc'")]
    InvalidSortOrder(String),
}

/// Field used to rank fetched records.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortBy {
    /// Most recently upserted first.
    #[default]
    Age,
    /// Most submitted first.
    Count,
}

impl FromStr for SortBy {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "age" => Ok(SortBy::Age),
            "count" => Ok(SortBy::Count),
            other => Err(SortError::InvalidSortBy(other.to_string())),
        }
    }
}

impl std::fmt::Display for SortBy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortBy::Age => write!(f, "age"),
            SortBy::Count => write!(f, "count"),
        }
    }
}

/// Direction applied on top of [`SortBy`].
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum SortOrder {
    #[serde(rename = "asc")]
    Ascending,
    #[default]
    #[serde(rename = "desc")]
    Descending,
}

impl FromStr for SortOrder {
    type Err = SortError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "asc" => Ok(SortOrder::Ascending),
            "desc" => Ok(SortOrder::Descending),
            other => Err(SortError::InvalidSortOrder(other.to_string())),
        }
    }
}

impl std::fmt::Display for SortOrder {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SortOrder::Ascending => write!(f, "asc"),
            SortOrder::Descending => write!(f, "desc"),
        }
    }
}
