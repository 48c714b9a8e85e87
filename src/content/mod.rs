// src/content/mod.rs
//! Read-only Epic -> UserStory -> Task tree from `epics.json`.
pub mod feature;

use serde::Deserialize;
use std::path::Path;

use crate::errors::ServerError;

pub use feature::Feature;

#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct Catalog {
    #[serde(default)]
    pub epics: Vec<Epic>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Epic {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "userStories")]
    pub user_stories: Vec<UserStory>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct UserStory {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, alias = "acceptanceCriteria")]
    pub acceptance_criteria: Vec<String>,
    #[serde(default)]
    pub tasks: Vec<Task>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub description: String,
    /// Optional hint for which feature renders this task.
    #[serde(default, rename = "type")]
    pub kind: Option<String>,
    #[serde(default, alias = "acceptanceCriteria")]
    pub acceptance_criteria: Vec<String>,
}

/// Both `{"epics": [...]}` and a bare array are in circulation.
#[derive(Deserialize)]
#[serde(untagged)]
enum CatalogFile {
    Wrapped(Catalog),
    Bare(Vec<Epic>),
}

/// Location of a task within the tree.
#[derive(Debug, Clone, Copy)]
pub struct TaskRef<'a> {
    pub epic: &'a Epic,
    pub story: &'a UserStory,
    pub task: &'a Task,
}

impl Catalog {
    pub fn from_json(raw: &str) -> Result<Self, ServerError> {
        Ok(match serde_json::from_str::<CatalogFile>(raw)? {
            CatalogFile::Wrapped(catalog) => catalog,
            CatalogFile::Bare(epics) => Catalog { epics },
        })
    }

    /// A missing file yields an empty catalog; a malformed one is an error.
    pub fn load(path: &Path) -> Result<Self, ServerError> {
        let raw = match std::fs::read_to_string(path) {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                tracing::warn!(path = %path.display(), "content file missing, navigation will be empty");
                return Ok(Self::default());
            }
            Err(e) => {
                return Err(ServerError::BadRequest(format!(
                    "cannot read {}: {e}",
                    path.display()
                )))
            }
        };
        let catalog = Self::from_json(&raw)?;
        tracing::info!(
            epics = catalog.epics.len(),
            tasks = catalog.task_count(),
            "content catalog loaded"
        );
        Ok(catalog)
    }

    pub fn epic(&self, id: &str) -> Option<&Epic> {
        self.epics.iter().find(|e| e.id == id)
    }

    pub fn task(&self, id: &str) -> Option<TaskRef<'_>> {
        self.epics.iter().find_map(|epic| {
            epic.user_stories.iter().find_map(|story| {
                story
                    .tasks
                    .iter()
                    .find(|t| t.id == id)
                    .map(|task| TaskRef { epic, story, task })
            })
        })
    }

    pub fn task_count(&self) -> usize {
        self.epics
            .iter()
            .flat_map(|e| &e.user_stories)
            .map(|s| s.tasks.len())
            .sum()
    }
}
