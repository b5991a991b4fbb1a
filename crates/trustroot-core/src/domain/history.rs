//! The project history record.

use serde::Deserialize;

use super::settings::Project;

/// Previously opened projects, in the order they were persisted.
///
/// Appending is the caller's job; the stores only read this record.
#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct History {
    #[serde(rename = "ProjectsHistory", default)]
    projects: Vec<Project>,
}

impl History {
    pub fn iter(&self) -> std::slice::Iter<'_, Project> {
        self.projects.iter()
    }

    pub fn len(&self) -> usize {
        self.projects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.projects.is_empty()
    }

    pub fn into_projects(self) -> Vec<Project> {
        self.projects
    }
}

impl From<Vec<Project>> for History {
    fn from(projects: Vec<Project>) -> Self {
        Self { projects }
    }
}

impl<'a> IntoIterator for &'a History {
    type Item = &'a Project;
    type IntoIter = std::slice::Iter<'a, Project>;

    fn into_iter(self) -> Self::IntoIter {
        self.projects.iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_history_is_empty() {
        let history = History::default();
        assert!(history.is_empty());
        assert_eq!(history.len(), 0);
    }

    #[test]
    fn test_from_vec_preserves_insertion_order() {
        // Arrange
        let projects = vec![
            Project::new("first", "/p/first"),
            Project::new("second", "/p/second"),
            Project::new("first", "/p/first-again"),
        ];

        // Act
        let history = History::from(projects.clone());

        // Assert: duplicates are allowed and order is untouched
        let titles: Vec<&str> = history.iter().map(|p| p.title.as_str()).collect();
        assert_eq!(titles, ["first", "second", "first"]);
        assert_eq!(history.into_projects(), projects);
    }
}
