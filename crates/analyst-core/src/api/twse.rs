//! Taiwan exchange open data: listed (TWSE) and OTC (TPEx) company lists
//!
//! Both endpoints return a JSON array with one object per company. Only
//! ordinary shares with a four-digit code are kept.

use crate::directory::{CompanySource, ListedCompany};
use crate::error::{AnalystError, Result};
use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, info, instrument};

/// Ticker suffix for the listed market
pub const LISTED_SUFFIX: &str = ".TW";
/// Ticker suffix for the OTC market
pub const OTC_SUFFIX: &str = ".TWO";

#[derive(Debug, Deserialize)]
struct ListedEntry {
    #[serde(rename = "公司代號")]
    code: String,
    #[serde(rename = "公司簡稱")]
    name: String,
}

#[derive(Debug, Deserialize)]
struct OtcEntry {
    #[serde(rename = "SecuritiesCompanyCode", alias = "公司代號")]
    code: String,
    #[serde(rename = "CompanyAbbreviation", alias = "公司簡稱")]
    name: String,
}

/// Company list fetched from the TWSE and TPEx open data APIs
pub struct TwseCompanySource {
    client: Client,
    listed_url: String,
    otc_url: String,
}

impl TwseCompanySource {
    /// Create a source for the given endpoints
    pub fn new(
        listed_url: impl Into<String>,
        otc_url: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("analyst-core/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            listed_url: listed_url.into(),
            otc_url: otc_url.into(),
        })
    }

    #[instrument(skip(self))]
    async fn fetch_json<T: serde::de::DeserializeOwned>(&self, url: &str) -> Result<Vec<T>> {
        let response = self.client.get(url).send().await?;
        let status = response.status();
        if !status.is_success() {
            return Err(AnalystError::SourceError(format!("{url} returned HTTP {status}")));
        }

        let entries: Vec<T> = response.json().await?;
        debug!(url, count = entries.len(), "Fetched exchange list");
        Ok(entries)
    }
}

#[async_trait]
impl CompanySource for TwseCompanySource {
    async fn fetch_companies(&self) -> Result<Vec<ListedCompany>> {
        let listed: Vec<ListedEntry> = self.fetch_json(&self.listed_url).await?;
        let otc: Vec<OtcEntry> = self.fetch_json(&self.otc_url).await?;

        let mut companies =
            to_companies(listed.into_iter().map(|e| (e.code, e.name)), LISTED_SUFFIX);
        let listed_count = companies.len();
        companies.extend(to_companies(otc.into_iter().map(|e| (e.code, e.name)), OTC_SUFFIX));

        info!(
            listed = listed_count,
            otc = companies.len() - listed_count,
            "Fetched Taiwan company lists"
        );
        Ok(companies)
    }

    fn name(&self) -> &str {
        "twse+tpex"
    }
}

fn to_companies(
    entries: impl Iterator<Item = (String, String)>,
    suffix: &str,
) -> Vec<ListedCompany> {
    entries
        .filter_map(|(code, name)| {
            let code = code.trim();
            let name = name.trim();
            (is_share_code(code) && !name.is_empty())
                .then(|| ListedCompany::new(format!("{code}{suffix}"), name))
        })
        .collect()
}

fn is_share_code(code: &str) -> bool {
    code.len() == 4 && code.bytes().all(|b| b.is_ascii_digit())
}
