//! Shared, refreshable company directory

use super::index::CompanyDirectory;
use super::record::CompanyRecord;
use super::source::{CompanySource, ListedCompany};
use super::store::DirectoryStore;
use crate::error::{AnalystError, Result};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{info, instrument, warn};

/// Outcome of a successful refresh
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RefreshReport {
    /// Companies in the new directory
    pub total: usize,
    /// Tickers not present before
    pub added: usize,
    /// Tickers dropped from the source
    pub removed: usize,
    /// Human-readable progress lines
    pub log: Vec<String>,
}

/// A failed refresh, with the progress lines collected before the failure
#[derive(Debug, thiserror::Error)]
#[error("{source}")]
pub struct RefreshError {
    #[source]
    pub source: AnalystError,
    pub log: Vec<String>,
}

/// Directory snapshot shared between requests
///
/// Readers clone the current `Arc` and keep a consistent view for as long as
/// they hold it. A refresh builds a complete new directory, persists it, and
/// only then swaps the pointer.
pub struct DirectoryHandle {
    current: RwLock<Arc<CompanyDirectory>>,
    store: DirectoryStore,
    source: Arc<dyn CompanySource>,
    refresh_lock: Mutex<()>,
}

impl DirectoryHandle {
    /// Wrap an already built directory
    pub fn new(
        directory: CompanyDirectory,
        store: DirectoryStore,
        source: Arc<dyn CompanySource>,
    ) -> Self {
        Self {
            current: RwLock::new(Arc::new(directory)),
            store,
            source,
            refresh_lock: Mutex::new(()),
        }
    }

    /// Load the persisted directory; a missing file yields an empty one
    pub async fn load(store: DirectoryStore, source: Arc<dyn CompanySource>) -> Result<Self> {
        let records = store.load().await?.unwrap_or_default();
        let directory = CompanyDirectory::from_records(records)?;
        info!(
            path = %store.path().display(),
            companies = directory.len(),
            "Company directory loaded"
        );
        Ok(Self::new(directory, store, source))
    }

    /// Current snapshot
    pub async fn snapshot(&self) -> Arc<CompanyDirectory> {
        Arc::clone(&*self.current.read().await)
    }

    /// Resolve a query against the current snapshot
    pub async fn lookup(&self, query: &str) -> Option<CompanyRecord> {
        self.snapshot().await.lookup(query).cloned()
    }

    /// Re-fetch the company list, persist it and swap it in
    ///
    /// On any failure the persisted file and the in-memory directory are left
    /// untouched. Concurrent calls run one at a time.
    #[instrument(skip(self), fields(source = self.source.name()))]
    pub async fn refresh(&self) -> std::result::Result<RefreshReport, RefreshError> {
        let _guard = self.refresh_lock.lock().await;
        let mut log = Vec::new();

        log.push(format!("Fetching company list from {}", self.source.name()));
        let fetched = match self.source.fetch_companies().await {
            Ok(list) if list.is_empty() => {
                log.push("Source returned no companies".to_string());
                return Err(RefreshError {
                    source: AnalystError::SourceError("no companies fetched".to_string()),
                    log,
                });
            }
            Ok(list) => list,
            Err(source) => {
                warn!(error = %source, "Company list fetch failed");
                log.push(format!("Fetch failed: {source}"));
                return Err(RefreshError { source, log });
            }
        };
        log.push(format!("Fetched {} companies", fetched.len()));

        let previous = self.snapshot().await;
        let records = merge(previous.records(), fetched);

        let directory = match CompanyDirectory::from_records(records) {
            Ok(dir) => dir,
            Err(source) => {
                log.push(format!("Rejected company list: {source}"));
                return Err(RefreshError { source, log });
            }
        };

        if let Err(source) = self.store.save(directory.records()).await {
            warn!(error = %source, "Failed to persist company list");
            log.push(format!("Failed to write {}: {source}", self.store.path().display()));
            return Err(RefreshError { source, log });
        }
        log.push(format!(
            "Wrote {} companies to {}",
            directory.len(),
            self.store.path().display()
        ));

        let old: HashSet<&str> = previous.records().iter().map(|r| r.ticker.as_str()).collect();
        let new: HashSet<&str> = directory.records().iter().map(|r| r.ticker.as_str()).collect();
        let report = RefreshReport {
            total: directory.len(),
            added: new.difference(&old).count(),
            removed: old.difference(&new).count(),
            log: Vec::new(),
        };
        log.push(format!(
            "Added {}, removed {}, total {}",
            report.added, report.removed, report.total
        ));

        *self.current.write().await = Arc::new(directory);
        info!(
            total = report.total,
            added = report.added,
            removed = report.removed,
            "Company directory refreshed"
        );

        Ok(RefreshReport { log, ..report })
    }
}

/// Combine freshly fetched companies with aliases already on record
///
/// Every fetched ticker keeps its previous aliases and gains its lowercased
/// name. Tickers missing from the fetch are dropped; the last entry wins when
/// the source repeats a ticker.
fn merge(previous: &[CompanyRecord], fetched: Vec<ListedCompany>) -> Vec<CompanyRecord> {
    let known: HashMap<&str, &CompanyRecord> =
        previous.iter().map(|r| (r.ticker.as_str(), r)).collect();

    let mut merged: BTreeMap<String, CompanyRecord> = BTreeMap::new();
    for company in fetched {
        let ticker = company.ticker.trim().to_string();
        let name = company.name.trim().to_string();
        if ticker.is_empty() || name.is_empty() {
            continue;
        }

        let mut record = CompanyRecord::new(ticker.clone(), name.clone())
            .with_aliases([name.to_lowercase()]);
        if let Some(old) = known.get(ticker.as_str()) {
            record = record.with_aliases(old.aliases.iter().cloned());
        }
        merged.insert(ticker, record);
    }

    merged.into_values().collect()
}
