/// Lookup-table identifiers are PostgreSQL SMALLINT.
pub type StatusId = i16;

/// All timestamps are UTC.
pub type Timestamp = chrono::DateTime<chrono::Utc>;
