use super::ResourceCategory;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicU64, Ordering};

static LAST_ID: AtomicU64 = AtomicU64::new(0);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Resource {
    pub id: String,
    pub title: String,
    pub description: String,
    pub file_name: String,
    pub file_size: u64,
    pub category: ResourceCategory,
    pub subject: String,
    pub uploaded_by: String,
    pub uploaded_at: DateTime<Utc>,
    pub download_count: u64,
    pub tags: Vec<String>,
}

/// Validated fields of a resource that has not been assigned an id yet.
#[derive(Debug, Clone, PartialEq)]
pub struct ResourceDraft {
    pub title: String,
    pub description: String,
    pub category: ResourceCategory,
    pub subject: String,
    pub tags: Vec<String>,
    pub file_name: String,
    pub file_size: u64,
    pub uploaded_by: String,
}

impl Resource {
    pub fn new(draft: ResourceDraft) -> Self {
        Self {
            id: next_id(),
            title: draft.title,
            description: draft.description,
            file_name: draft.file_name,
            file_size: draft.file_size,
            category: draft.category,
            subject: draft.subject,
            uploaded_by: draft.uploaded_by,
            uploaded_at: Utc::now(),
            download_count: 0,
            tags: draft.tags,
        }
    }
}

/// Time-based id: milliseconds since the epoch, bumped past the last issued
/// value so two creations in the same millisecond never collide.
fn next_id() -> String {
    let now = Utc::now().timestamp_millis().max(0) as u64;
    let mut last = LAST_ID.load(Ordering::SeqCst);
    loop {
        let candidate = now.max(last + 1);
        match LAST_ID.compare_exchange_weak(last, candidate, Ordering::SeqCst, Ordering::SeqCst) {
            Ok(_) => return candidate.to_string(),
            Err(actual) => last = actual,
        }
    }
}

/// Server-side list filter. Absent criteria always match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResourceFilter {
    pub category: Option<ResourceCategory>,
    /// Case-insensitive substring of the subject.
    pub subject: Option<String>,
    /// Case-insensitive substring of title, description or any tag.
    pub search: Option<String>,
}

impl ResourceFilter {
    pub fn is_empty(&self) -> bool {
        self.category.is_none() && self.subject.is_none() && self.search.is_none()
    }

    pub fn matches(&self, resource: &Resource) -> bool {
        if let Some(category) = self.category {
            if resource.category != category {
                return false;
            }
        }

        if let Some(subject) = &self.subject {
            if !resource
                .subject
                .to_lowercase()
                .contains(&subject.to_lowercase())
            {
                return false;
            }
        }

        match &self.search {
            Some(search) => matches_search(resource, &search.to_lowercase()),
            None => true,
        }
    }
}

/// `needle` must already be lowercase.
pub(crate) fn matches_search(resource: &Resource, needle: &str) -> bool {
    resource.title.to_lowercase().contains(needle)
        || resource.description.to_lowercase().contains(needle)
        || resource
            .tags
            .iter()
            .any(|tag| tag.to_lowercase().contains(needle))
}
