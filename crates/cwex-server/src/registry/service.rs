//! Registry operations over machine records.
//!
//! Uniqueness is checked with a lookup strictly before every write, which
//! yields a conflict message naming the colliding record. The lookup and the
//! write are not one transaction; the `UNIQUE` constraint on the table
//! catches a writer that loses that race, and the collision is then
//! reported the same way.

use std::collections::HashMap;

use cwex_core::{MachineTriple, TriplePatch};
use tracing::{info, instrument, warn};

use super::error::RegistryError;
use crate::storage::{DatabaseError, Machine, MachineFilter, RegistryDatabase};

/// Build a [`MachineFilter`] from `?field=value` pairs.
///
/// Accepted keys are `_id`, `location`, `branch` and `machineNumber`.
pub fn filter_from_query(query: &HashMap<String, String>) -> Result<MachineFilter, RegistryError> {
    let mut filter = MachineFilter::default();
    for (key, value) in query {
        let slot = match key.as_str() {
            "_id" => &mut filter.id,
            "location" => &mut filter.location,
            "branch" => &mut filter.branch,
            "machineNumber" => &mut filter.machine_number,
            _ => return Err(RegistryError::UnknownFilter(key.clone())),
        };
        *slot = Some(value.clone());
    }
    Ok(filter)
}

#[derive(Clone)]
pub struct MachineRegistry {
    db: RegistryDatabase,
}

impl MachineRegistry {
    pub const fn new(db: RegistryDatabase) -> Self {
        Self { db }
    }

    /// All machines matching `filter`, ordered by location descending.
    pub async fn list(&self, filter: &MachineFilter) -> Result<Vec<Machine>, RegistryError> {
        Ok(self.db.list_machines(filter).await?)
    }

    /// Register a new machine. Fails with `Conflict` if the triple is taken.
    #[instrument(skip(self), fields(location = %triple.location, branch = %triple.branch, number = %triple.machine_number))]
    pub async fn create(&self, triple: MachineTriple) -> Result<Machine, RegistryError> {
        triple.validate()?;

        if let Some(existing) = self.db.find_machine_by_triple(&triple).await? {
            return Err(RegistryError::Conflict {
                existing_id: existing.id,
            });
        }

        let id = uuid::Uuid::new_v4().to_string();
        let machine = match self.db.create_machine(&id, &triple).await {
            Ok(machine) => machine,
            Err(DatabaseError::UniqueViolation(_)) => return Err(self.lost_race(&triple).await),
            Err(e) => return Err(e.into()),
        };

        info!(machine_id = %machine.id, "Machine registered");
        Ok(machine)
    }

    /// Get a machine by ID.
    pub async fn get(&self, id: &str) -> Result<Machine, RegistryError> {
        self.db.get_machine(id).await.map_err(|e| match e {
            DatabaseError::NotFound(_) => RegistryError::NotFound(id.to_string()),
            other => other.into(),
        })
    }

    /// Apply a partial update.
    ///
    /// The merged triple is looked up before writing: a hit on this same
    /// record is a no-op edit, a hit on any other record is a conflict.
    #[instrument(skip(self, patch))]
    pub async fn update(&self, id: &str, patch: &TriplePatch) -> Result<Machine, RegistryError> {
        let existing = self.get(id).await?;
        let merged = existing.triple().merged(patch);
        merged.validate()?;

        if let Some(holder) = self.db.find_machine_by_triple(&merged).await? {
            if holder.id == existing.id {
                return Err(RegistryError::NoOpEdit { id: existing.id });
            }
            return Err(RegistryError::Conflict {
                existing_id: holder.id,
            });
        }

        let machine = match self.db.update_machine(id, &merged).await {
            Ok(machine) => machine,
            Err(DatabaseError::UniqueViolation(_)) => return Err(self.lost_race(&merged).await),
            Err(DatabaseError::NotFound(_)) => return Err(RegistryError::NotFound(id.to_string())),
            Err(e) => return Err(e.into()),
        };

        info!(machine_id = %machine.id, "Machine updated");
        Ok(machine)
    }

    /// Remove a machine. Returns `None` if it was already absent.
    #[instrument(skip(self))]
    pub async fn delete(&self, id: &str) -> Result<Option<Machine>, RegistryError> {
        let removed = self.db.remove_machine(id).await?;
        if removed.is_some() {
            info!(machine_id = %id, "Machine removed");
        }
        Ok(removed)
    }

    /// Total number of registered machines.
    pub async fn count(&self) -> Result<i64, RegistryError> {
        Ok(self.db.count_machines().await?)
    }

    /// A concurrent writer claimed `triple` between our lookup and write.
    async fn lost_race(&self, triple: &MachineTriple) -> RegistryError {
        warn!("Triple claimed concurrently, reporting conflict");
        match self.db.find_machine_by_triple(triple).await {
            Ok(Some(holder)) => RegistryError::Conflict {
                existing_id: holder.id,
            },
            Ok(None) => RegistryError::Storage(DatabaseError::UniqueViolation(
                "machines triple".to_string(),
            )),
            Err(e) => e.into(),
        }
    }
}
