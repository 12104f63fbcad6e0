//! Canonical company records

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// A listed company as stored in the directory
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CompanyRecord {
    /// Exchange ticker including market suffix, e.g. `2330.TW`
    #[serde(alias = "symbol")]
    pub ticker: String,

    /// Canonical short name, e.g. `台積電`
    pub name: String,

    /// Alternative names; kept sorted and de-duplicated
    #[serde(default)]
    pub aliases: BTreeSet<String>,
}

impl CompanyRecord {
    /// Create a record without aliases
    pub fn new(ticker: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            ticker: ticker.into(),
            name: name.into(),
            aliases: BTreeSet::new(),
        }
    }

    /// Add aliases, skipping blank entries
    pub fn with_aliases<I, S>(mut self, aliases: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        for alias in aliases {
            let alias = alias.into().trim().to_string();
            if !alias.is_empty() {
                self.aliases.insert(alias);
            }
        }
        self
    }

    /// Ticker without the market suffix (`2330` for `2330.TW`)
    pub fn bare_code(&self) -> &str {
        self.ticker
            .split_once('.')
            .map_or(self.ticker.as_str(), |(code, _)| code)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_code() {
        assert_eq!(CompanyRecord::new("2330.TW", "台積電").bare_code(), "2330");
        assert_eq!(CompanyRecord::new("6488.TWO", "環球晶").bare_code(), "6488");
        assert_eq!(CompanyRecord::new("AAPL", "Apple").bare_code(), "AAPL");
    }

    #[test]
    fn test_with_aliases_dedups_and_sorts() {
        let record = CompanyRecord::new("2330.TW", "台積電")
            .with_aliases(["tsmc", "台積電", " ", "tsmc", "2330"]);
        let aliases: Vec<&str> = record.aliases.iter().map(String::as_str).collect();
        assert_eq!(aliases, vec!["2330", "tsmc", "台積電"]);
    }

    #[test]
    fn test_legacy_symbol_field() {
        let json = r#"{"symbol": "2317.TW", "name": "鴻海", "aliases": ["foxconn"]}"#;
        let record: CompanyRecord = serde_json::from_str(json).unwrap();
        assert_eq!(record.ticker, "2317.TW");
        assert!(record.aliases.contains("foxconn"));

        let out = serde_json::to_value(&record).unwrap();
        assert_eq!(out["ticker"], "2317.TW");
        assert!(out.get("symbol").is_none());
    }
}
