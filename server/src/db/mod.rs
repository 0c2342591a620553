pub mod assignments;
pub mod config;
pub mod duplicates;
pub mod helper_directory;
pub mod history;
pub mod intake;
pub mod migrations;
pub mod repository;
pub mod transaction;

pub use assignments::AssignmentRegistry;
pub use config::DbConfig;
pub use helper_directory::HelperDirectory;
pub use intake::PatientInNeedRepository;
pub use migrations::run_migrations;
pub use repository::PatientRepository;
pub use transaction::UnitOfWork;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("{entity} with id {id} not found")]
    NotFound { entity: &'static str, id: String },

    #[error("{0}")]
    Conflict(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Migration failed at version {version}: {reason}")]
    Migration { version: i64, reason: String },
}

impl StoreError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }
}
