use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

const BUILTIN_COMPANIES: &str = include_str!("../../../data/ats_companies.json");

/// A company whose public ATS board is searched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BoardCompany {
    /// Board identifier in the provider's URLs (Workday: the tenant).
    pub slug: String,
    pub name: String,
    /// Workday data-centre host, e.g. `wd5`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub host: Option<String>,
    /// Workday career-site name.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub site: Option<String>,
}

/// Company lists per ATS provider. Loaded from data so the lists can change
/// without a rebuild.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CompanyBoards {
    #[serde(default)]
    pub greenhouse: Vec<BoardCompany>,
    #[serde(default)]
    pub lever: Vec<BoardCompany>,
    #[serde(default)]
    pub workday: Vec<BoardCompany>,
    #[serde(default)]
    pub recruitee: Vec<BoardCompany>,
    #[serde(default)]
    pub workable: Vec<BoardCompany>,
    #[serde(default)]
    pub ashby: Vec<BoardCompany>,
}

impl CompanyBoards {
    /// Reads the list at `path`, or the bundled list when no path is configured.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) => {
                let raw = std::fs::read_to_string(path)
                    .with_context(|| format!("Failed to read company list {}", path.display()))?;
                serde_json::from_str(&raw)
                    .with_context(|| format!("Invalid company list {}", path.display()))
            }
            None => Self::builtin(),
        }
    }

    pub fn builtin() -> Result<Self> {
        serde_json::from_str(BUILTIN_COMPANIES).context("Bundled company list is invalid")
    }

    pub fn total(&self) -> usize {
        self.greenhouse.len()
            + self.lever.len()
            + self.workday.len()
            + self.recruitee.len()
            + self.workable.len()
            + self.ashby.len()
    }
}
