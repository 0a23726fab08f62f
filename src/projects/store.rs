//! Project Storage
//!
//! SQLite-backed project records with a UNIQUE constraint on the name.
//! Like the user store, each call opens its own connection so sessions
//! are request-scoped and released on every exit path.

use crate::projects::models::Project;
use crate::store::StoreError;
use anyhow::Result;
use rusqlite::{params, Connection};
use tracing::info;

/// Project storage with SQLite backend
pub struct ProjectStore {
    db_path: String,
}

impl ProjectStore {
    /// Create a new project store and initialize the schema
    pub fn new(db_path: &str) -> Result<Self> {
        let store = Self {
            db_path: db_path.to_string(),
        };
        store.init_db()?;
        Ok(store)
    }

    fn init_db(&self) -> Result<()> {
        let conn = Connection::open(&self.db_path)?;

        conn.execute(
            "CREATE TABLE IF NOT EXISTS projects (
                id INTEGER PRIMARY KEY AUTOINCREMENT,
                name TEXT UNIQUE NOT NULL,
                description TEXT NOT NULL
            )",
            [],
        )?;

        Ok(())
    }

    /// Insert a new project; duplicate names surface as `StoreError::Conflict`.
    pub fn create(&self, name: &str, description: &str) -> Result<Project, StoreError> {
        let conn = Connection::open(&self.db_path)?;
        conn.execute(
            "INSERT INTO projects (name, description) VALUES (?1, ?2)",
            params![name, description],
        )?;

        let project = Project {
            id: conn.last_insert_rowid(),
            name: name.to_string(),
            description: description.to_string(),
        };

        info!("Created project: {} (id {})", project.name, project.id);

        Ok(project)
    }

    /// Fetch a project by id.
    pub fn get(&self, id: i64) -> Result<Option<Project>, StoreError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt =
            conn.prepare("SELECT id, name, description FROM projects WHERE id = ?1")?;

        let result = stmt.query_row(params![id], |row| {
            Ok(Project {
                id: row.get(0)?,
                name: row.get(1)?,
                description: row.get(2)?,
            })
        });

        match result {
            Ok(project) => Ok(Some(project)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(e.into()),
        }
    }

    /// List all projects in storage order.
    pub fn list(&self) -> Result<Vec<Project>, StoreError> {
        let conn = Connection::open(&self.db_path)?;

        let mut stmt = conn.prepare("SELECT id, name, description FROM projects")?;

        let projects = stmt
            .query_map([], |row| {
                Ok(Project {
                    id: row.get(0)?,
                    name: row.get(1)?,
                    description: row.get(2)?,
                })
            })?
            .collect::<Result<Vec<_>, _>>()?;

        Ok(projects)
    }

    /// Full replace of name and description.
    ///
    /// Returns `None` if the id is unknown; renaming onto an existing name
    /// surfaces as `StoreError::Conflict`.
    pub fn update(
        &self,
        id: i64,
        name: &str,
        description: &str,
    ) -> Result<Option<Project>, StoreError> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute(
            "UPDATE projects SET name = ?1, description = ?2 WHERE id = ?3",
            params![name, description, id],
        )?;

        if rows_affected == 0 {
            return Ok(None);
        }

        info!("Updated project {} with new details", id);

        Ok(Some(Project {
            id,
            name: name.to_string(),
            description: description.to_string(),
        }))
    }

    /// Delete a project by id. Returns false if the id is unknown.
    pub fn delete(&self, id: i64) -> Result<bool, StoreError> {
        let conn = Connection::open(&self.db_path)?;

        let rows_affected = conn.execute("DELETE FROM projects WHERE id = ?1", params![id])?;

        if rows_affected > 0 {
            info!("Deleted project with id {}", id);
        }

        Ok(rows_affected > 0)
    }
}
