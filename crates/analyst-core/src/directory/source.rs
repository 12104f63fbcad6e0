//! Authoritative company list sources

use crate::error::Result;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A company as reported by an exchange
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ListedCompany {
    /// Ticker including market suffix
    pub ticker: String,
    /// Short name as published by the exchange
    pub name: String,
}

impl ListedCompany {
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
        }
    }
}

/// Fetches the full list of listed companies
#[async_trait]
pub trait CompanySource: Send + Sync {
    /// Fetch every currently listed company
    async fn fetch_companies(&self) -> Result<Vec<ListedCompany>>;

    /// Short name used in logs and refresh output
    fn name(&self) -> &str;
}
