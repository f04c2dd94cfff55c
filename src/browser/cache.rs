use super::query::{filter_and_sort, BrowseQuery, SortSpec};
use crate::domain::Resource;
use serde::Serialize;
use std::collections::BTreeSet;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoadState {
    Idle,
    Loading,
    Loaded,
    Error(String),
}

/// A server-confirmed change to patch into the cached list.
#[derive(Debug, Clone)]
pub enum Mutation {
    Created(Resource),
    Deleted(String),
    Downloaded(String),
}

/// Dashboard counters over the cached list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceSummary {
    pub total_resources: usize,
    pub total_downloads: u64,
    pub subjects: usize,
}

/// Client copy of the server list.
///
/// Merge rules: a created record is appended (or replaces one with the same
/// id), a deleted id is removed, a downloaded id gains exactly one download.
/// Patches for ids the cache does not hold are ignored. A failed load keeps
/// the previous list.
#[derive(Debug, Clone)]
pub struct ResourceCache {
    state: LoadState,
    resources: Vec<Resource>,
}

impl Default for ResourceCache {
    fn default() -> Self {
        Self::new()
    }
}

impl ResourceCache {
    pub fn new() -> Self {
        Self {
            state: LoadState::Idle,
            resources: Vec::new(),
        }
    }

    pub fn state(&self) -> &LoadState {
        &self.state
    }

    pub fn resources(&self) -> &[Resource] {
        &self.resources
    }

    /// True when the next view should trigger a fetch.
    pub fn needs_fetch(&self) -> bool {
        matches!(self.state, LoadState::Idle | LoadState::Error(_))
    }

    pub fn begin_load(&mut self) {
        self.state = LoadState::Loading;
    }

    pub fn finish_load(&mut self, result: Result<Vec<Resource>, String>) {
        match result {
            Ok(resources) => {
                self.resources = resources;
                self.state = LoadState::Loaded;
            }
            Err(message) => self.state = LoadState::Error(message),
        }
    }

    /// Applies a mutation; returns whether the list changed.
    pub fn apply(&mut self, mutation: Mutation) -> bool {
        match mutation {
            Mutation::Created(resource) => {
                match self.resources.iter_mut().find(|r| r.id == resource.id) {
                    Some(existing) => *existing = resource,
                    None => self.resources.push(resource),
                }
                true
            }
            Mutation::Deleted(id) => {
                let before = self.resources.len();
                self.resources.retain(|r| r.id != id);
                self.resources.len() != before
            }
            Mutation::Downloaded(id) => match self.resources.iter_mut().find(|r| r.id == id) {
                Some(resource) => {
                    resource.download_count = resource.download_count.saturating_add(1);
                    true
                }
                None => false,
            },
        }
    }

    /// Marks the copy stale; the list stays visible until the refetch lands.
    pub fn invalidate(&mut self) {
        self.state = LoadState::Idle;
    }

    pub fn view(&self, query: &BrowseQuery, sort: SortSpec) -> Vec<Resource> {
        filter_and_sort(&self.resources, query, sort)
    }

    /// Distinct subjects, sorted, for the subject picker.
    pub fn subjects(&self) -> Vec<String> {
        self.resources
            .iter()
            .map(|r| r.subject.clone())
            .collect::<BTreeSet<_>>()
            .into_iter()
            .collect()
    }

    pub fn summary(&self) -> ResourceSummary {
        ResourceSummary {
            total_resources: self.resources.len(),
            total_downloads: self.resources.iter().map(|r| r.download_count).sum(),
            subjects: self.subjects().len(),
        }
    }
}
