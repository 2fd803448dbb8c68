//! Persistent campaign history, keyed by brand.
//!
//! Each brand gets one JSON file holding its most recent runs, capped at
//! [`MAX_HISTORY`] entries with the oldest dropped first. Reads tolerate a
//! missing or corrupt file by starting fresh. Writes are read-modify-write
//! with no locking; callers running concurrent pipelines for the same brand
//! must serialize their writes.

use crate::error::Result;
use crate::types::RunResult;
use std::fs;
use std::path::PathBuf;

/// Maximum retained runs per brand.
pub const MAX_HISTORY: usize = 10;

/// File-backed store of past campaign runs.
#[derive(Debug, Clone)]
pub struct CampaignMemory {
    dir: PathBuf,
}

impl CampaignMemory {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self { dir: dir.into() }
    }

    /// Append a run to the brand's history, enforcing the cap.
    pub fn record(&self, brand_key: &str, result: &RunResult) -> Result<()> {
        fs::create_dir_all(&self.dir).map_err(io_error)?;
        let mut history = self.history(brand_key)?;
        history.push(result.clone());
        if history.len() > MAX_HISTORY {
            let excess = history.len() - MAX_HISTORY;
            history.drain(..excess);
        }
        let path = self.brand_path(brand_key);
        let json = serde_json::to_string_pretty(&history)?;
        fs::write(&path, json).map_err(io_error)?;
        tracing::debug!(brand = brand_key, runs = history.len(), "campaign history updated");
        Ok(())
    }

    /// Load the brand's history, oldest first. Missing or unreadable files
    /// yield an empty history.
    pub fn history(&self, brand_key: &str) -> Result<Vec<RunResult>> {
        let path = self.brand_path(brand_key);
        if !path.exists() {
            return Ok(Vec::new());
        }
        let raw = fs::read_to_string(&path).map_err(io_error)?;
        match serde_json::from_str(&raw) {
            Ok(history) => Ok(history),
            Err(e) => {
                tracing::warn!(brand = brand_key, error = %e, "corrupt history file, starting fresh");
                Ok(Vec::new())
            }
        }
    }

    /// The most recent run for a brand, if any.
    pub fn latest(&self, brand_key: &str) -> Result<Option<RunResult>> {
        Ok(self.history(brand_key)?.into_iter().last())
    }

    /// Brand keys with stored history.
    pub fn brands(&self) -> Result<Vec<String>> {
        if !self.dir.exists() {
            return Ok(Vec::new());
        }
        let mut brands = Vec::new();
        for entry in fs::read_dir(&self.dir).map_err(io_error)? {
            let entry = entry.map_err(io_error)?;
            let name = entry.file_name();
            let name = name.to_string_lossy();
            if let Some(stem) = name.strip_suffix(".json") {
                brands.push(stem.to_string());
            }
        }
        brands.sort();
        Ok(brands)
    }

    fn brand_path(&self, brand_key: &str) -> PathBuf {
        self.dir.join(format!("{}.json", sanitize_key(brand_key)))
    }
}

fn io_error(e: std::io::Error) -> crate::EngineError {
    crate::EngineError::Other(format!("memory store: {}", e))
}

/// Reduce a brand key to a safe file stem: lowercase alphanumerics with
/// underscores.
pub fn sanitize_key(key: &str) -> String {
    let sanitized: String = key
        .trim()
        .to_lowercase()
        .chars()
        .map(|c| if c.is_alphanumeric() { c } else { '_' })
        .collect();
    let trimmed = sanitized.trim_matches('_');
    if trimmed.is_empty() {
        "unknown_brand".to_string()
    } else {
        trimmed.to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::WorkflowState;
    use crate::types::{CampaignParameters, CampaignType};

    fn result() -> RunResult {
        WorkflowState::new(CampaignParameters::new(
            "https://acme.com",
            CampaignType::WelcomeSeries,
        ))
        .into_result()
    }

    #[test]
    fn test_record_and_history_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let memory = CampaignMemory::new(dir.path());

        memory.record("Acme", &result()).unwrap();
        memory.record("Acme", &result()).unwrap();

        let history = memory.history("Acme").unwrap();
        assert_eq!(history.len(), 2);
        assert!(memory.latest("Acme").unwrap().is_some());
    }

    #[test]
    fn test_cap_drops_oldest_first() {
        let dir = tempfile::tempdir().unwrap();
        let memory = CampaignMemory::new(dir.path());

        for i in 0..(MAX_HISTORY + 3) {
            let mut r = result();
            r.errors.push(format!("marker {}", i));
            memory.record("Acme", &r).unwrap();
        }

        let history = memory.history("Acme").unwrap();
        assert_eq!(history.len(), MAX_HISTORY);
        assert_eq!(history[0].errors[0], "marker 3");
        assert_eq!(history.last().unwrap().errors[0], format!("marker {}", MAX_HISTORY + 2));
    }

    #[test]
    fn test_missing_brand_is_empty() {
        let dir = tempfile::tempdir().unwrap();
        let memory = CampaignMemory::new(dir.path());
        assert!(memory.history("Nobody").unwrap().is_empty());
        assert!(memory.latest("Nobody").unwrap().is_none());
    }

    #[test]
    fn test_corrupt_file_starts_fresh() {
        let dir = tempfile::tempdir().unwrap();
        let memory = CampaignMemory::new(dir.path());
        std::fs::write(dir.path().join("acme.json"), "{not json").unwrap();
        assert!(memory.history("Acme").unwrap().is_empty());
    }

    #[test]
    fn test_sanitize_key() {
        assert_eq!(sanitize_key("Acme Widgets, Inc."), "acme_widgets__inc");
        assert_eq!(sanitize_key("  "), "unknown_brand");
        assert_eq!(sanitize_key("---"), "unknown_brand");
    }

    #[test]
    fn test_brands_listing() {
        let dir = tempfile::tempdir().unwrap();
        let memory = CampaignMemory::new(dir.path());
        memory.record("Beta", &result()).unwrap();
        memory.record("Acme", &result()).unwrap();
        assert_eq!(memory.brands().unwrap(), vec!["acme", "beta"]);
    }
}
