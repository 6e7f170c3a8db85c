//! `SQLite` database for the cwex server.

pub use cwex_core::db::DatabaseError;

cwex_core::define_database!(RegistryDatabase, "Registry database migrations complete");
