//! Data models for cwex storage.

use cwex_core::MachineTriple;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    #[serde(rename = "_id")]
    pub id: String,
    pub email: String,
    #[serde(skip_serializing, default)]
    pub password_hash: String,
    pub authorized: bool,
    pub created_at: i64,
    pub updated_at: i64,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct Machine {
    #[serde(rename = "_id")]
    pub id: String,
    pub location: String,
    pub branch: String,
    pub machine_number: String,
    pub created_at: i64,
    pub updated_at: i64,
}

impl Machine {
    pub fn triple(&self) -> MachineTriple {
        MachineTriple {
            location: self.location.clone(),
            branch: self.branch.clone(),
            machine_number: self.machine_number.clone(),
        }
    }
}
