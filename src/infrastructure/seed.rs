use super::database::{RepositoryError, ResourceRepository};
use crate::domain::{Resource, ResourceCategory};
use chrono::{DateTime, TimeZone, Utc};
use tracing::info;

fn at(
    year: i32,
    month: u32,
    day: u32,
    hour: u32,
    minute: u32,
) -> Result<DateTime<Utc>, RepositoryError> {
    Utc.with_ymd_and_hms(year, month, day, hour, minute, 0)
        .single()
        .ok_or_else(|| {
            RepositoryError::Corrupt(format!(
                "invalid seed timestamp {year}-{month:02}-{day:02} {hour:02}:{minute:02}"
            ))
        })
}

#[allow(clippy::too_many_arguments)]
fn demo(
    id: &str,
    title: &str,
    description: &str,
    file_name: &str,
    file_size: u64,
    category: ResourceCategory,
    subject: &str,
    uploaded_by: &str,
    uploaded_at: DateTime<Utc>,
    download_count: u64,
    tags: &[&str],
) -> Resource {
    Resource {
        id: id.to_string(),
        title: title.to_string(),
        description: description.to_string(),
        file_name: file_name.to_string(),
        file_size,
        category,
        subject: subject.to_string(),
        uploaded_by: uploaded_by.to_string(),
        uploaded_at,
        download_count,
        tags: tags.iter().map(|t| t.to_string()).collect(),
    }
}

/// The demonstration catalog served when the store starts empty.
pub fn demo_resources() -> Result<Vec<Resource>, RepositoryError> {
    Ok(vec![
        demo(
            "1",
            "Introduction to Data Structures and Algorithms",
            "Comprehensive lecture notes covering arrays, linked lists, stacks, queues, and basic algorithms with examples and exercises.",
            "dsa-intro.pdf",
            2_048_576,
            ResourceCategory::LectureNotes,
            "Computer Science",
            "Dr. Sarah Johnson",
            at(2024, 1, 15, 10, 0)?,
            145,
            &["algorithms", "data-structures", "programming"],
        ),
        demo(
            "2",
            "Midterm Examination - Database Systems",
            "Previous year midterm questions covering normalization, SQL queries, transaction management, and database design.",
            "db-midterm-2023.pdf",
            1_048_576,
            ResourceCategory::PastQuestions,
            "Database Systems",
            "Prof. Michael Chen",
            at(2024, 1, 10, 14, 30)?,
            89,
            &["midterm", "sql", "normalization", "database-design"],
        ),
        demo(
            "3",
            "Software Engineering Assignment 2",
            "Design patterns assignment focusing on Factory, Observer, and Strategy patterns with implementation requirements.",
            "se-assignment-2.pdf",
            512_000,
            ResourceCategory::Assignment,
            "Software Engineering",
            "Dr. Emily Rodriguez",
            at(2024, 1, 12, 9, 15)?,
            67,
            &["design-patterns", "assignment", "java", "uml"],
        ),
        demo(
            "4",
            "Machine Learning Fundamentals",
            "Introduction to machine learning concepts, supervised and unsupervised learning, with practical examples in Python.",
            "ml-fundamentals.pdf",
            3_145_728,
            ResourceCategory::LectureNotes,
            "Artificial Intelligence",
            "Dr. Alex Kumar",
            at(2024, 1, 8, 16, 20)?,
            203,
            &["machine-learning", "python", "ai", "supervised-learning"],
        ),
        demo(
            "5",
            "Final Exam 2023 - Operating Systems",
            "Complete final examination with solutions covering process management, memory management, file systems, and security.",
            "os-final-2023.pdf",
            1_572_864,
            ResourceCategory::PastQuestions,
            "Operating Systems",
            "Prof. Lisa Wang",
            at(2024, 1, 5, 11, 45)?,
            178,
            &["final-exam", "processes", "memory", "file-systems"],
        ),
        demo(
            "6",
            "Network Security Course Syllabus",
            "Complete syllabus for Network Security course including topics, assessment criteria, and recommended readings.",
            "netsec-syllabus.pdf",
            256_000,
            ResourceCategory::Syllabus,
            "Network Security",
            "Dr. Robert Black",
            at(2024, 1, 3, 8, 30)?,
            45,
            &["syllabus", "security", "networks", "cryptography"],
        ),
    ])
}

/// Seeds an empty repository; a populated one is left alone.
pub fn seed_if_empty(repository: &mut dyn ResourceRepository) -> Result<usize, RepositoryError> {
    if repository.count()? > 0 {
        return Ok(0);
    }

    let resources = demo_resources()?;
    for resource in &resources {
        repository.save(resource)?;
    }

    info!(count = resources.len(), "Seeded demo resources");
    Ok(resources.len())
}
