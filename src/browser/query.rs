use crate::domain::{Resource, ResourceCategory};
use std::cmp::Ordering;
use unicode_normalization::char::is_combining_mark;
use unicode_normalization::UnicodeNormalization;

/// Local search and filter criteria. All active criteria must match.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BrowseQuery {
    /// Substring of title, description or any tag, ignoring case. Blank
    /// matches everything.
    pub search: String,
    pub category: Option<ResourceCategory>,
    /// Exact subject, as offered by the subject picker.
    pub subject: Option<String>,
}

impl BrowseQuery {
    pub fn matches(&self, resource: &Resource) -> bool {
        let search = self.search.trim().to_lowercase();
        if !search.is_empty() && !crate::domain::matches_search(resource, &search) {
            return false;
        }

        if let Some(category) = self.category {
            if resource.category != category {
                return false;
            }
        }

        match &self.subject {
            Some(subject) => resource.subject == *subject,
            None => true,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortKey {
    #[default]
    UploadDate,
    Downloads,
    Title,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum SortOrder {
    Ascending,
    #[default]
    Descending,
}

/// Newest first unless told otherwise.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SortSpec {
    pub key: SortKey,
    pub order: SortOrder,
}

impl SortSpec {
    pub fn new(key: SortKey, order: SortOrder) -> Self {
        Self { key, order }
    }

    pub fn compare(&self, a: &Resource, b: &Resource) -> Ordering {
        let ordering = match self.key {
            SortKey::UploadDate => a.uploaded_at.cmp(&b.uploaded_at),
            SortKey::Downloads => a.download_count.cmp(&b.download_count),
            SortKey::Title => compare_titles(&a.title, &b.title),
        };

        match self.order {
            SortOrder::Ascending => ordering,
            SortOrder::Descending => ordering.reverse(),
        }
    }
}

/// Dictionary order. Accents and case are ignored first, then unaccented
/// letters precede accented ones, then lowercase precedes uppercase, so
/// `apple < Banana < Cherry`, `Álgebra < Zoology` and `apple < Apple`.
pub fn compare_titles(a: &str, b: &str) -> Ordering {
    base_letters(a)
        .cmp(base_letters(b))
        .then_with(|| lowercase(a).cmp(lowercase(b)))
        .then_with(|| {
            a.chars()
                .zip(b.chars())
                .map(|(x, y)| x.is_uppercase().cmp(&y.is_uppercase()))
                .find(|ordering| ordering.is_ne())
                .unwrap_or(Ordering::Equal)
        })
        .then_with(|| a.cmp(b))
}

/// Lowercase letters with diacritics stripped (`É` becomes `e`).
fn base_letters(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd()
        .filter(|c| !is_combining_mark(*c))
        .flat_map(char::to_lowercase)
}

fn lowercase(s: &str) -> impl Iterator<Item = char> + '_ {
    s.nfd().flat_map(char::to_lowercase)
}

/// Filters then stable-sorts a snapshot of the list.
pub fn filter_and_sort(resources: &[Resource], query: &BrowseQuery, sort: SortSpec) -> Vec<Resource> {
    let mut matched: Vec<Resource> = resources
        .iter()
        .filter(|r| query.matches(r))
        .cloned()
        .collect();
    matched.sort_by(|a, b| sort.compare(a, b));
    matched
}
