mod repository;

pub use repository::*;

/// SQL migration for the current-bill schema
pub const MIGRATION_001_INITIAL: &str = include_str!("migrations/001_initial.sql");

/// SQL migration for saved-bill history
pub const MIGRATION_002_HISTORY: &str = include_str!("migrations/002_history.sql");
