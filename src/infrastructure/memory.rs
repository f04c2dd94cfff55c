use super::database::{RepositoryError, ResourceRepository};
use crate::domain::{Resource, ResourceFilter};

/// A plain vector searched linearly. Nothing survives a restart.
#[derive(Debug, Default)]
pub struct InMemoryRepository {
    resources: Vec<Resource>,
}

impl InMemoryRepository {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_resources(resources: Vec<Resource>) -> Self {
        Self { resources }
    }

    fn position(&self, id: &str) -> Result<usize, RepositoryError> {
        self.resources
            .iter()
            .position(|r| r.id == id)
            .ok_or(RepositoryError::NotFound)
    }
}

impl ResourceRepository for InMemoryRepository {
    fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, RepositoryError> {
        Ok(self
            .resources
            .iter()
            .filter(|r| filter.matches(r))
            .cloned()
            .collect())
    }

    fn find_by_id(&self, id: &str) -> Result<Resource, RepositoryError> {
        let index = self.position(id)?;
        Ok(self.resources[index].clone())
    }

    fn save(&mut self, resource: &Resource) -> Result<(), RepositoryError> {
        if self.resources.iter().any(|r| r.id == resource.id) {
            return Err(RepositoryError::DuplicateId);
        }
        self.resources.push(resource.clone());
        Ok(())
    }

    fn update(&mut self, resource: &Resource) -> Result<(), RepositoryError> {
        let index = self.position(&resource.id)?;
        self.resources[index] = resource.clone();
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), RepositoryError> {
        let index = self.position(id)?;
        self.resources.remove(index);
        Ok(())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        Ok(self.resources.len())
    }
}
