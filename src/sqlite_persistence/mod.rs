mod versioned_schema;

pub use versioned_schema::{Column, ForeignKey, SqlType, Table, VersionedSchema};

/// Offset added to `PRAGMA user_version` so a plain SQLite file (version 0)
/// is never mistaken for one of ours.
pub const BASE_DB_VERSION: usize = 4000;
