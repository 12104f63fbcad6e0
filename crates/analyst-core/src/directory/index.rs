//! In-memory company index with exact and fuzzy lookup

use super::record::CompanyRecord;
use crate::error::{AnalystError, Result};
use std::collections::HashMap;

/// Shortest query accepted by the substring fallback
const MIN_FUZZY_CHARS: usize = 2;

/// Normalize a lookup key: trim surrounding whitespace and lowercase
pub fn normalize(query: &str) -> String {
    query.trim().to_lowercase()
}

/// How a query was matched
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MatchKind {
    /// Full ticker including suffix
    Ticker,
    /// Ticker without the market suffix
    BareCode,
    /// Canonical name or an alias
    Name,
    /// Query is a substring of a name or alias
    Fuzzy,
}

/// A lookup hit
#[derive(Debug, Clone, Copy)]
pub struct DirectoryMatch<'a> {
    pub record: &'a CompanyRecord,
    pub kind: MatchKind,
}

/// Immutable lookup table over a set of company records
///
/// Tickers are unique. Name, alias and bare-code keys may be shared between
/// records; such ties resolve to the record with the shortest canonical name,
/// then the smallest ticker.
#[derive(Debug, Default)]
pub struct CompanyDirectory {
    records: Vec<CompanyRecord>,
    by_ticker: HashMap<String, usize>,
    by_code: HashMap<String, Vec<usize>>,
    by_name: HashMap<String, Vec<usize>>,
}

impl CompanyDirectory {
    /// An empty directory
    pub fn empty() -> Self {
        Self::default()
    }

    /// Build the index; fails on a duplicate ticker
    pub fn from_records(records: Vec<CompanyRecord>) -> Result<Self> {
        let mut dir = Self {
            records,
            ..Self::default()
        };

        for (idx, record) in dir.records.iter().enumerate() {
            let ticker = normalize(&record.ticker);
            if dir.by_ticker.insert(ticker, idx).is_some() {
                return Err(AnalystError::DuplicateTicker(record.ticker.clone()));
            }

            dir.by_code
                .entry(normalize(record.bare_code()))
                .or_default()
                .push(idx);

            let mut keys: Vec<String> = Vec::with_capacity(record.aliases.len() + 1);
            keys.push(normalize(&record.name));
            keys.extend(record.aliases.iter().map(|a| normalize(a)));
            keys.sort();
            keys.dedup();

            for key in keys.into_iter().filter(|k| !k.is_empty()) {
                dir.by_name.entry(key).or_default().push(idx);
            }
        }

        Ok(dir)
    }

    /// Number of companies
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// Whether the directory holds no companies
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in load order
    pub fn records(&self) -> &[CompanyRecord] {
        &self.records
    }

    /// Exact ticker lookup (case-insensitive)
    pub fn get(&self, ticker: &str) -> Option<&CompanyRecord> {
        self.by_ticker
            .get(&normalize(ticker))
            .map(|&idx| &self.records[idx])
    }

    /// Resolve a query to a company record
    pub fn lookup(&self, query: &str) -> Option<&CompanyRecord> {
        self.find(query).map(|m| m.record)
    }

    /// Resolve a query, reporting which stage matched
    pub fn find(&self, query: &str) -> Option<DirectoryMatch<'_>> {
        let key = normalize(query);
        if key.is_empty() {
            return None;
        }

        if let Some(&idx) = self.by_ticker.get(&key) {
            return Some(self.hit(idx, MatchKind::Ticker));
        }

        if let Some(idx) = self.by_code.get(&key).and_then(|c| self.best(c.iter().copied())) {
            return Some(self.hit(idx, MatchKind::BareCode));
        }

        if let Some(idx) = self.by_name.get(&key).and_then(|c| self.best(c.iter().copied())) {
            return Some(self.hit(idx, MatchKind::Name));
        }

        if key.chars().count() < MIN_FUZZY_CHARS {
            return None;
        }

        let candidates = self.records.iter().enumerate().filter_map(|(idx, record)| {
            let hit = normalize(&record.name).contains(&key)
                || record.aliases.iter().any(|a| normalize(a).contains(&key));
            hit.then_some(idx)
        });

        self.best(candidates).map(|idx| self.hit(idx, MatchKind::Fuzzy))
    }

    fn hit(&self, idx: usize, kind: MatchKind) -> DirectoryMatch<'_> {
        DirectoryMatch {
            record: &self.records[idx],
            kind,
        }
    }

    fn best(&self, candidates: impl Iterator<Item = usize>) -> Option<usize> {
        candidates.min_by(|&a, &b| {
            let (ra, rb) = (&self.records[a], &self.records[b]);
            ra.name
                .chars()
                .count()
                .cmp(&rb.name.chars().count())
                .then_with(|| ra.ticker.cmp(&rb.ticker))
        })
    }
}
