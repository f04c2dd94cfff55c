use crate::domain::{Resource, ResourceCategory, ResourceFilter};
use chrono::{DateTime, Utc};
use rusqlite::{params, Connection, OptionalExtension};
use thiserror::Error;

#[derive(Error, Debug)]
pub enum RepositoryError {
    #[error("Database error: {0}")]
    SqliteError(#[from] rusqlite::Error),

    #[error("Stored value could not be decoded: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Resource not found")]
    NotFound,

    #[error("Duplicate resource id")]
    DuplicateId,

    #[error("Corrupt row: {0}")]
    Corrupt(String),
}

/// Storage engine behind the resource catalog.
pub trait ResourceRepository: Send {
    /// Matching resources in insertion order.
    fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, RepositoryError>;
    fn find_by_id(&self, id: &str) -> Result<Resource, RepositoryError>;
    fn save(&mut self, resource: &Resource) -> Result<(), RepositoryError>;
    fn update(&mut self, resource: &Resource) -> Result<(), RepositoryError>;
    fn delete(&mut self, id: &str) -> Result<(), RepositoryError>;
    fn count(&self) -> Result<usize, RepositoryError>;
}

pub struct SqliteRepository {
    conn: Connection,
}

const SELECT_COLUMNS: &str = "SELECT id, title, description, file_name, file_size, category, subject,
        uploaded_by, uploaded_at, download_count, tags
 FROM resources";

impl SqliteRepository {
    pub fn new(path: &str) -> Result<Self, RepositoryError> {
        let conn = Connection::open(path)?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    pub fn new_in_memory() -> Result<Self, RepositoryError> {
        let conn = Connection::open_in_memory()?;
        Self::init_schema(&conn)?;
        Ok(Self { conn })
    }

    fn init_schema(conn: &Connection) -> Result<(), RepositoryError> {
        // `seq` keeps insertion order independent of the id format
        conn.execute(
            "CREATE TABLE IF NOT EXISTS resources (
                seq INTEGER PRIMARY KEY AUTOINCREMENT,
                id TEXT UNIQUE NOT NULL,
                title TEXT NOT NULL,
                description TEXT NOT NULL,
                file_name TEXT NOT NULL,
                file_size INTEGER NOT NULL,
                category TEXT NOT NULL,
                subject TEXT NOT NULL,
                uploaded_by TEXT NOT NULL,
                uploaded_at TEXT NOT NULL,
                download_count INTEGER NOT NULL DEFAULT 0,
                tags TEXT NOT NULL
            )",
            [],
        )?;

        conn.execute(
            "CREATE INDEX IF NOT EXISTS idx_category ON resources(category)",
            [],
        )?;

        Ok(())
    }

    fn row_to_resource(row: &rusqlite::Row) -> Result<StoredRow, rusqlite::Error> {
        Ok(StoredRow {
            id: row.get(0)?,
            title: row.get(1)?,
            description: row.get(2)?,
            file_name: row.get(3)?,
            file_size: row.get(4)?,
            category: row.get(5)?,
            subject: row.get(6)?,
            uploaded_by: row.get(7)?,
            uploaded_at: row.get(8)?,
            download_count: row.get(9)?,
            tags: row.get(10)?,
        })
    }
}

/// Raw column values; decoded outside rusqlite so bad data surfaces as
/// `RepositoryError` instead of a conversion failure.
struct StoredRow {
    id: String,
    title: String,
    description: String,
    file_name: String,
    file_size: i64,
    category: String,
    subject: String,
    uploaded_by: String,
    uploaded_at: String,
    download_count: i64,
    tags: String,
}

impl TryFrom<StoredRow> for Resource {
    type Error = RepositoryError;

    fn try_from(row: StoredRow) -> Result<Self, Self::Error> {
        let category: ResourceCategory = row
            .category
            .parse()
            .map_err(|e: crate::domain::UnknownCategory| RepositoryError::Corrupt(e.to_string()))?;
        let uploaded_at = DateTime::parse_from_rfc3339(&row.uploaded_at)
            .map_err(|e| RepositoryError::Corrupt(e.to_string()))?
            .with_timezone(&Utc);

        Ok(Resource {
            id: row.id,
            title: row.title,
            description: row.description,
            file_name: row.file_name,
            file_size: row.file_size.max(0) as u64,
            category,
            subject: row.subject,
            uploaded_by: row.uploaded_by,
            uploaded_at,
            download_count: row.download_count.max(0) as u64,
            tags: serde_json::from_str(&row.tags)?,
        })
    }
}

impl ResourceRepository for SqliteRepository {
    fn list(&self, filter: &ResourceFilter) -> Result<Vec<Resource>, RepositoryError> {
        let mut stmt = self
            .conn
            .prepare(&format!("{SELECT_COLUMNS} ORDER BY seq"))?;
        let rows = stmt.query_map([], Self::row_to_resource)?;

        let mut resources = Vec::new();
        for row in rows {
            let resource = Resource::try_from(row?)?;
            if filter.matches(&resource) {
                resources.push(resource);
            }
        }

        Ok(resources)
    }

    fn find_by_id(&self, id: &str) -> Result<Resource, RepositoryError> {
        let row = self
            .conn
            .query_row(
                &format!("{SELECT_COLUMNS} WHERE id = ?1"),
                params![id],
                Self::row_to_resource,
            )
            .optional()?;

        row.ok_or(RepositoryError::NotFound)?.try_into()
    }

    fn save(&mut self, resource: &Resource) -> Result<(), RepositoryError> {
        let tags = serde_json::to_string(&resource.tags)?;
        match self.conn.execute(
            "INSERT INTO resources (id, title, description, file_name, file_size, category,
                subject, uploaded_by, uploaded_at, download_count, tags)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9, ?10, ?11)",
            params![
                &resource.id,
                &resource.title,
                &resource.description,
                &resource.file_name,
                resource.file_size as i64,
                resource.category.as_str(),
                &resource.subject,
                &resource.uploaded_by,
                resource.uploaded_at.to_rfc3339(),
                resource.download_count as i64,
                &tags
            ],
        ) {
            Ok(_) => Ok(()),
            Err(rusqlite::Error::SqliteFailure(err, _))
                if err.code == rusqlite::ErrorCode::ConstraintViolation =>
            {
                Err(RepositoryError::DuplicateId)
            }
            Err(e) => Err(e.into()),
        }
    }

    fn update(&mut self, resource: &Resource) -> Result<(), RepositoryError> {
        let tags = serde_json::to_string(&resource.tags)?;
        let changed = self.conn.execute(
            "UPDATE resources SET title = ?2, description = ?3, file_name = ?4, file_size = ?5,
                category = ?6, subject = ?7, uploaded_by = ?8, uploaded_at = ?9,
                download_count = ?10, tags = ?11
             WHERE id = ?1",
            params![
                &resource.id,
                &resource.title,
                &resource.description,
                &resource.file_name,
                resource.file_size as i64,
                resource.category.as_str(),
                &resource.subject,
                &resource.uploaded_by,
                resource.uploaded_at.to_rfc3339(),
                resource.download_count as i64,
                &tags
            ],
        )?;

        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn delete(&mut self, id: &str) -> Result<(), RepositoryError> {
        let changed = self
            .conn
            .execute("DELETE FROM resources WHERE id = ?1", params![id])?;

        if changed == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }

    fn count(&self) -> Result<usize, RepositoryError> {
        let count: i64 = self
            .conn
            .query_row("SELECT COUNT(*) FROM resources", [], |row| row.get(0))?;

        Ok(count as usize)
    }
}
