// src/projects.rs
//! Tracked projects and where they come from.

use std::collections::BTreeSet;
use std::fs;
use std::path::Path;

use anyhow::{anyhow, Context, Result};
use async_trait::async_trait;
use serde::Deserialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Project {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub twitter_feed_url: Option<String>,
    #[serde(default)]
    pub blog_feed_url: Option<String>,
    #[serde(default)]
    pub use_spam_filter: bool,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProjectLookupError {
    #[error("unknown project(s): {}", .0.join(", "))]
    Unknown(Vec<String>),
}

/// Read-only view of the tracked projects.
#[async_trait]
pub trait ProjectSource: Send + Sync {
    async fn list_all_projects(&self) -> Result<Vec<Project>, ProjectLookupError>;

    /// Projects in the order the names were given. Fails on any unmatched name.
    async fn find_projects_by_name(
        &self,
        names: &[String],
    ) -> Result<Vec<Project>, ProjectLookupError>;
}

/// Pick the run list: every project when no names are given, otherwise the named ones.
/// With `skip_unknown`, unmatched names are dropped instead of failing the run.
pub async fn select_projects(
    source: &dyn ProjectSource,
    names: &[String],
    skip_unknown: bool,
) -> Result<Vec<Project>, ProjectLookupError> {
    if names.is_empty() {
        return source.list_all_projects().await;
    }
    match source.find_projects_by_name(names).await {
        Err(ProjectLookupError::Unknown(missing)) if skip_unknown => {
            tracing::warn!(target: "crawler", missing = ?missing, "skipping unknown projects");
            let known: Vec<String> = names
                .iter()
                .filter(|n| !missing.contains(*n))
                .cloned()
                .collect();
            if known.is_empty() {
                return Ok(Vec::new());
            }
            source.find_projects_by_name(&known).await
        }
        other => other,
    }
}

/// In-memory project list, usually loaded from `config/projects.toml`.
#[derive(Debug, Clone, Default)]
pub struct ProjectCatalog {
    projects: Vec<Project>,
}

impl ProjectCatalog {
    pub fn new(projects: Vec<Project>) -> Self {
        Self { projects }
    }

    /// Load from TOML (`[[projects]]` tables) or a JSON array, by extension.
    pub fn load_from(path: &Path) -> Result<Self> {
        let content = fs::read_to_string(path)
            .with_context(|| format!("reading projects from {}", path.display()))?;
        let ext = path
            .extension()
            .and_then(|s| s.to_str())
            .unwrap_or_default()
            .to_ascii_lowercase();
        let projects = parse_projects(&content, &ext)
            .with_context(|| format!("parsing projects from {}", path.display()))?;
        Self::validate(&projects)?;
        Ok(Self { projects })
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    fn validate(projects: &[Project]) -> Result<()> {
        let mut ids = BTreeSet::new();
        let mut names = BTreeSet::new();
        for p in projects {
            if !ids.insert(p.id) {
                return Err(anyhow!("duplicate project id {}", p.id));
            }
            if !names.insert(p.name.as_str()) {
                return Err(anyhow!("duplicate project name {:?}", p.name));
            }
        }
        Ok(())
    }
}

fn parse_projects(s: &str, hint_ext: &str) -> Result<Vec<Project>> {
    #[derive(Deserialize)]
    struct TomlProjects {
        #[serde(default)]
        projects: Vec<Project>,
    }

    if hint_ext == "json" {
        return Ok(serde_json::from_str(s)?);
    }
    match toml::from_str::<TomlProjects>(s) {
        Ok(v) => Ok(v.projects),
        Err(toml_err) => serde_json::from_str(s).map_err(|_| anyhow!(toml_err)),
    }
}

#[async_trait]
impl ProjectSource for ProjectCatalog {
    async fn list_all_projects(&self) -> Result<Vec<Project>, ProjectLookupError> {
        Ok(self.projects.clone())
    }

    async fn find_projects_by_name(
        &self,
        names: &[String],
    ) -> Result<Vec<Project>, ProjectLookupError> {
        let mut found = Vec::with_capacity(names.len());
        let mut missing = Vec::new();
        for name in names {
            match self.projects.iter().find(|p| &p.name == name) {
                Some(p) => found.push(p.clone()),
                None => missing.push(name.clone()),
            }
        }
        if missing.is_empty() {
            Ok(found)
        } else {
            Err(ProjectLookupError::Unknown(missing))
        }
    }
}
