use mrisk_types::CategoryId;

#[derive(Debug, thiserror::Error)]
pub enum RiskError {
    #[error("invalid input: {0}")]
    InvalidInput(String),

    /// A category id outside the seeded registry was requested or produced.
    ///
    /// This is always a seeding or registry bug and is surfaced as an internal error.
    #[error("unknown risk category id: {0}")]
    UnknownCategory(CategoryId),

    #[error("invalid reference data: {0}")]
    InvalidReference(String),
    #[error("failed to read reference file {path}: {source}", path = path.display())]
    ReferenceRead {
        path: std::path::PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("reference data schema mismatch at {path}: {source}")]
    ReferenceParse {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },

    #[error("admission not found: {0}")]
    AdmissionNotFound(uuid::Uuid),
    #[error("admission is closed: {0}")]
    AdmissionClosed(uuid::Uuid),
    #[error("encounter store lock poisoned")]
    StorePoisoned,
}

pub type RiskResult<T> = std::result::Result<T, RiskError>;
