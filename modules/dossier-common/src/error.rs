use thiserror::Error;

#[derive(Error, Debug)]
pub enum DossierError {
    #[error("Cache error: {0}")]
    Cache(String),

    #[error("Fetch error: {0}")]
    Fetch(String),

    #[error("Search error: {0}")]
    Search(String),

    #[error("Synthesis error: {0}")]
    Synthesis(String),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("Job not found: {0}")]
    JobNotFound(String),

    #[error(transparent)]
    Anyhow(#[from] anyhow::Error),
}
