//! Bundled and file-backed lead collections for fixture mode.

use std::path::Path;

use anyhow::{Context, Result};

use crate::model::Lead;

const BUNDLED_LEADS: &str = include_str!("../fixtures/leads.json");

/// The eight demo leads shipped with the service.
pub fn bundled_leads() -> Result<Vec<Lead>> {
    serde_json::from_str(BUNDLED_LEADS).context("bundled fixture is not a valid lead array")
}

/// Load a JSON array of leads from disk.
pub fn load_leads(path: &Path) -> Result<Vec<Lead>> {
    let raw = std::fs::read_to_string(path)
        .with_context(|| format!("failed to read fixture {}", path.display()))?;
    let leads: Vec<Lead> = serde_json::from_str(&raw)
        .with_context(|| format!("fixture {} is not a valid lead array", path.display()))?;

    tracing::info!(path = %path.display(), count = leads.len(), "loaded lead fixture");
    Ok(leads)
}

#[cfg(test)]
pub(crate) fn sample_leads() -> Vec<Lead> {
    bundled_leads().expect("bundled fixture parses")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::CallOutcome;

    #[test]
    fn test_bundled_fixture_shape() {
        let leads = bundled_leads().unwrap();
        assert_eq!(leads.len(), 8);

        let qualified = leads
            .iter()
            .filter(|lead| lead.outcome() == CallOutcome::Qualified)
            .count();
        assert_eq!(qualified, 5);

        let mut ids: Vec<_> = leads.iter().map(|lead| lead.id.as_str()).collect();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), 8);
        assert!(leads.iter().all(|lead| lead.called_at().is_some()));
    }

    #[test]
    fn test_load_missing_file_reports_path() {
        let err = load_leads(Path::new("/nonexistent/leads.json")).unwrap_err();
        assert!(err.to_string().contains("/nonexistent/leads.json"));
    }
}
