use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pedagogical type of a resource. Serialized as the snake_case wire value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ResourceCategory {
    LectureNotes,
    Assignment,
    PastQuestions,
    ReferenceMaterial,
    Syllabus,
}

#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("Unknown resource category: {0}")]
pub struct UnknownCategory(pub String);

impl ResourceCategory {
    pub const ALL: [ResourceCategory; 5] = [
        ResourceCategory::LectureNotes,
        ResourceCategory::Assignment,
        ResourceCategory::PastQuestions,
        ResourceCategory::ReferenceMaterial,
        ResourceCategory::Syllabus,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            ResourceCategory::LectureNotes => "lecture_notes",
            ResourceCategory::Assignment => "assignment",
            ResourceCategory::PastQuestions => "past_questions",
            ResourceCategory::ReferenceMaterial => "reference_material",
            ResourceCategory::Syllabus => "syllabus",
        }
    }
}

impl fmt::Display for ResourceCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ResourceCategory {
    type Err = UnknownCategory;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|category| category.as_str() == s)
            .ok_or_else(|| UnknownCategory(s.to_string()))
    }
}
