//! The project list and current selection
//!
//! A [`Portfolio`] is what a front end keeps in memory between store loads:
//! every project plus the one currently being worked on.

use chrono::NaiveDate;

use crate::sample::sample_projects;
use crate::{EstimateError, Project, ProjectId, ProjectStore, RecordKind, StoreError};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct Portfolio {
    projects: Vec<Project>,
    current: Option<ProjectId>,
}

impl Portfolio {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from loaded projects, dropping duplicate ids (first one wins)
    /// and selecting the first project.
    pub fn from_loaded(loaded: Vec<Project>) -> Self {
        let total = loaded.len();
        let mut projects: Vec<Project> = Vec::with_capacity(total);
        for project in loaded {
            if !projects.iter().any(|p| p.id() == project.id()) {
                projects.push(project);
            }
        }
        if projects.len() < total {
            tracing::warn!(
                dropped = total - projects.len(),
                "duplicate project ids in store; keeping first occurrence"
            );
        }

        let current = projects.first().map(|p| p.id().to_string());
        Self { projects, current }
    }

    /// Load from a store; an empty store is optionally seeded with the
    /// sample projects, which are saved back immediately.
    pub fn open(
        store: &dyn ProjectStore,
        seed_sample: bool,
        today: NaiveDate,
    ) -> Result<Self, StoreError> {
        let loaded = store.load()?;
        if loaded.is_empty() && seed_sample {
            let seeded = sample_projects(today);
            store.save(&seeded)?;
            tracing::info!(projects = seeded.len(), "seeded empty store with sample projects");
            return Ok(Self::from_loaded(seeded));
        }
        Ok(Self::from_loaded(loaded))
    }

    /// Save the full list
    pub fn persist(&self, store: &dyn ProjectStore) -> Result<(), StoreError> {
        store.save(&self.projects)
    }

    pub fn projects(&self) -> &[Project] {
        &self.projects
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn get(&self, id: &str) -> Option<&Project> {
        self.projects.iter().find(|p| p.id() == id)
    }

    pub fn get_mut(&mut self, id: &str) -> Option<&mut Project> {
        self.projects.iter_mut().find(|p| p.id() == id)
    }

    pub fn current_id(&self) -> Option<&str> {
        self.current.as_deref()
    }

    pub fn current(&self) -> Option<&Project> {
        self.current.as_deref().and_then(|id| self.get(id))
    }

    pub fn current_mut(&mut self) -> Option<&mut Project> {
        let id = self.current.clone()?;
        self.get_mut(&id)
    }

    /// Switch the current project; unknown ids leave the selection as is
    pub fn select(&mut self, id: &str) -> Result<&Project, EstimateError> {
        let index = self
            .projects
            .iter()
            .position(|p| p.id() == id)
            .ok_or_else(|| EstimateError::not_found(RecordKind::Project, id))?;
        self.current = Some(id.to_string());
        Ok(&self.projects[index])
    }

    /// Add a new project and make it current
    pub fn create(&mut self, project: Project) -> &Project {
        tracing::info!(project = %project.id(), name = %project.name(), "project created");
        self.current = Some(project.id().to_string());
        self.projects.push(project);
        let last = self.projects.len() - 1;
        &self.projects[last]
    }

    /// Replace the stored copy of a project with an updated snapshot
    pub fn replace(&mut self, project: Project) -> Result<(), EstimateError> {
        let slot = self
            .get_mut(project.id())
            .ok_or_else(|| EstimateError::not_found(RecordKind::Project, project.id()))?;
        *slot = project;
        Ok(())
    }

    pub fn into_projects(self) -> Vec<Project> {
        self.projects
    }
}
