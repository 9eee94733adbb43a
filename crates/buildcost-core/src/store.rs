//! Persistence boundary
//!
//! The core never performs I/O itself. Callers load a project list from a
//! [`ProjectStore`], apply mutations, and hand the list back to be saved.

use std::cell::RefCell;

use crate::{Project, StoreError};

/// Storage for the full project list
pub trait ProjectStore {
    /// Load all projects; an empty store yields an empty list
    fn load(&self) -> Result<Vec<Project>, StoreError>;

    /// Replace the stored list with `projects`
    fn save(&self, projects: &[Project]) -> Result<(), StoreError>;
}

/// In-process store, useful for embedding and tests
#[derive(Debug, Default)]
pub struct MemoryStore {
    projects: RefCell<Vec<Project>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_projects(projects: Vec<Project>) -> Self {
        Self {
            projects: RefCell::new(projects),
        }
    }

    /// Number of saved projects
    pub fn len(&self) -> usize {
        self.projects.borrow().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl ProjectStore for MemoryStore {
    fn load(&self) -> Result<Vec<Project>, StoreError> {
        Ok(self.projects.borrow().clone())
    }

    fn save(&self, projects: &[Project]) -> Result<(), StoreError> {
        *self.projects.borrow_mut() = projects.to_vec();
        Ok(())
    }
}
