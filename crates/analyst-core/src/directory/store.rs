//! JSON persistence for the company directory

use super::record::CompanyRecord;
use crate::error::Result;
use serde::{Deserialize, Serialize};
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

#[derive(Debug, Default, Serialize, Deserialize)]
struct CompanyFile {
    #[serde(default)]
    companies: Vec<CompanyRecord>,
}

/// Reads and writes `{"companies": [...]}` files
#[derive(Debug, Clone)]
pub struct DirectoryStore {
    path: PathBuf,
}

impl DirectoryStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Load the persisted records
    ///
    /// Returns `Ok(None)` when the file does not exist; a malformed file is an
    /// error.
    pub async fn load(&self) -> Result<Option<Vec<CompanyRecord>>> {
        let bytes = match tokio::fs::read(&self.path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == ErrorKind::NotFound => {
                warn!(path = %self.path.display(), "Company list not found, starting empty");
                return Ok(None);
            }
            Err(e) => return Err(e.into()),
        };

        let file: CompanyFile = serde_json::from_slice(&bytes)?;
        debug!(path = %self.path.display(), count = file.companies.len(), "Loaded company list");
        Ok(Some(file.companies))
    }

    /// Replace the persisted file wholesale
    ///
    /// Records are written sorted by ticker to a sibling temp file which is
    /// then renamed over the target, so readers never see a partial file.
    pub async fn save(&self, records: &[CompanyRecord]) -> Result<()> {
        let mut companies = records.to_vec();
        companies.sort_by(|a, b| a.ticker.cmp(&b.ticker));

        let mut body = serde_json::to_vec_pretty(&CompanyFile { companies })?;
        body.push(b'\n');

        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            tokio::fs::create_dir_all(parent).await?;
        }

        let tmp = self.temp_path();
        if let Err(e) = tokio::fs::write(&tmp, &body).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }
        if let Err(e) = tokio::fs::rename(&tmp, &self.path).await {
            let _ = tokio::fs::remove_file(&tmp).await;
            return Err(e.into());
        }

        debug!(path = %self.path.display(), count = records.len(), "Saved company list");
        Ok(())
    }

    fn temp_path(&self) -> PathBuf {
        let mut name = self
            .path
            .file_name()
            .map(std::ffi::OsStr::to_os_string)
            .unwrap_or_else(|| "companies.json".into());
        name.push(".tmp");
        self.path.with_file_name(name)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AnalystError;

    #[tokio::test]
    async fn test_missing_file_is_none() {
        let dir = tempfile::tempdir().unwrap();
        let store = DirectoryStore::new(dir.path().join("companies.json"));
        assert!(store.load().await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_malformed_file_is_error() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.json");
        std::fs::write(&path, "{not json").unwrap();
        let result = DirectoryStore::new(&path).load().await;
        assert!(matches!(result, Err(AnalystError::JsonError(_))));
    }

    #[tokio::test]
    async fn test_save_sorts_and_keeps_unicode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("data").join("companies.json");
        let store = DirectoryStore::new(&path);

        store
            .save(&[
                CompanyRecord::new("2330.TW", "台積電").with_aliases(["tsmc"]),
                CompanyRecord::new("1101.TW", "台泥"),
            ])
            .await
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("台積電"));
        assert!(text.find("1101.TW").unwrap() < text.find("2330.TW").unwrap());
        assert!(!dir.path().join("data").join("companies.json.tmp").exists());

        let loaded = store.load().await.unwrap().unwrap();
        assert_eq!(loaded.len(), 2);
        assert_eq!(loaded[0].ticker, "1101.TW");
        assert!(loaded[1].aliases.contains("tsmc"));
    }

    #[tokio::test]
    async fn test_loads_legacy_symbol_files() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("companies.json");
        std::fs::write(
            &path,
            r#"{"companies":[{"symbol":"2330.TW","name":"台積電","aliases":["tsmc","台積電"]}]}"#,
        )
        .unwrap();

        let loaded = DirectoryStore::new(&path).load().await.unwrap().unwrap();
        assert_eq!(loaded[0].ticker, "2330.TW");
        assert_eq!(loaded[0].aliases.len(), 2);
    }
}
