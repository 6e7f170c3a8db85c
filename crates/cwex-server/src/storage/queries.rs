//! Database queries for the cwex server.

use cwex_core::MachineTriple;
use cwex_core::db::unix_timestamp;
use sqlx::{QueryBuilder, Sqlite};

use super::db::{DatabaseError, RegistryDatabase};
use super::models::{Machine, User};

/// Exact-match filter over machine columns. Unset fields match everything.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MachineFilter {
    pub id: Option<String>,
    pub location: Option<String>,
    pub branch: Option<String>,
    pub machine_number: Option<String>,
}

impl MachineFilter {
    fn conditions(&self) -> impl Iterator<Item = (&'static str, &String)> {
        [
            ("id", self.id.as_ref()),
            ("location", self.location.as_ref()),
            ("branch", self.branch.as_ref()),
            ("machine_number", self.machine_number.as_ref()),
        ]
        .into_iter()
        .filter_map(|(column, value)| value.map(|v| (column, v)))
    }
}

impl RegistryDatabase {
    // =========================================================================
    // User queries
    // =========================================================================

    /// Create a new user.
    pub async fn create_user(
        &self,
        id: &str,
        email: &str,
        password_hash: &str,
        authorized: bool,
    ) -> Result<User, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO users (id, email, password_hash, authorized, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(email)
        .bind(password_hash)
        .bind(authorized)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_user(id).await
    }

    /// Get a user by ID.
    pub async fn get_user(&self, id: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User {id}")))
    }

    /// Get a user by email.
    pub async fn get_user_by_email(&self, email: &str) -> Result<User, DatabaseError> {
        sqlx::query_as::<_, User>("SELECT * FROM users WHERE email = ?")
            .bind(email)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("User with email {email}")))
    }

    // =========================================================================
    // Machine queries
    // =========================================================================

    /// Insert a machine record.
    pub async fn create_machine(
        &self,
        id: &str,
        triple: &MachineTriple,
    ) -> Result<Machine, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query(
            "INSERT INTO machines (id, location, branch, machine_number, created_at, updated_at) VALUES (?, ?, ?, ?, ?, ?)",
        )
        .bind(id)
        .bind(&triple.location)
        .bind(&triple.branch)
        .bind(&triple.machine_number)
        .bind(now)
        .bind(now)
        .execute(self.pool())
        .await?;

        self.get_machine(id).await
    }

    /// Get a machine by ID.
    pub async fn get_machine(&self, id: &str) -> Result<Machine, DatabaseError> {
        sqlx::query_as::<_, Machine>("SELECT * FROM machines WHERE id = ?")
            .bind(id)
            .fetch_optional(self.pool())
            .await?
            .ok_or_else(|| DatabaseError::NotFound(format!("Machine {id}")))
    }

    /// Find the machine holding exactly this triple, if any.
    pub async fn find_machine_by_triple(
        &self,
        triple: &MachineTriple,
    ) -> Result<Option<Machine>, DatabaseError> {
        let machine = sqlx::query_as::<_, Machine>(
            "SELECT * FROM machines WHERE location = ? AND branch = ? AND machine_number = ?",
        )
        .bind(&triple.location)
        .bind(&triple.branch)
        .bind(&triple.machine_number)
        .fetch_optional(self.pool())
        .await?;

        Ok(machine)
    }

    /// List machines matching `filter`, ordered by location descending.
    pub async fn list_machines(&self, filter: &MachineFilter) -> Result<Vec<Machine>, DatabaseError> {
        let mut query: QueryBuilder<'_, Sqlite> = QueryBuilder::new("SELECT * FROM machines");

        let mut separator = " WHERE ";
        for (column, value) in filter.conditions() {
            query
                .push(separator)
                .push(column)
                .push(" = ")
                .push_bind(value.clone());
            separator = " AND ";
        }
        query.push(" ORDER BY location DESC, id ASC");

        let machines = query
            .build_query_as::<Machine>()
            .fetch_all(self.pool())
            .await?;

        Ok(machines)
    }

    /// Overwrite a machine's triple.
    pub async fn update_machine(
        &self,
        id: &str,
        triple: &MachineTriple,
    ) -> Result<Machine, DatabaseError> {
        let now = unix_timestamp();

        sqlx::query_as::<_, Machine>(
            "UPDATE machines SET location = ?, branch = ?, machine_number = ?, updated_at = ? WHERE id = ? RETURNING *",
        )
        .bind(&triple.location)
        .bind(&triple.branch)
        .bind(&triple.machine_number)
        .bind(now)
        .bind(id)
        .fetch_optional(self.pool())
        .await?
        .ok_or_else(|| DatabaseError::NotFound(format!("Machine {id}")))
    }

    /// Remove a machine, returning the removed row if there was one.
    pub async fn remove_machine(&self, id: &str) -> Result<Option<Machine>, DatabaseError> {
        let machine = sqlx::query_as::<_, Machine>("DELETE FROM machines WHERE id = ? RETURNING *")
            .bind(id)
            .fetch_optional(self.pool())
            .await?;

        Ok(machine)
    }

    /// Count all machines.
    pub async fn count_machines(&self) -> Result<i64, DatabaseError> {
        let row: (i64,) = sqlx::query_as("SELECT COUNT(*) FROM machines")
            .fetch_one(self.pool())
            .await?;

        Ok(row.0)
    }
}
