use thiserror::Error;

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("a track from {source_type}:{source_id} already exists")]
    DuplicateSource {
        source_type: String,
        source_id: String,
    },

    #[error("invalid catalog data: {0}")]
    InvalidData(String),
}

pub type Result<T> = std::result::Result<T, CatalogError>;
