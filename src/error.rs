use std::path::PathBuf;

use miette::Diagnostic;
use thiserror::Error;

#[derive(Debug, Error, Diagnostic)]
pub enum AnnofetchError {
    #[error("invalid species name: {0:?}")]
    #[diagnostic(help("use the Ensembl species name, e.g. homo_sapiens"))]
    InvalidSpecies(String),

    #[error("invalid release: {0} (must be a positive integer)")]
    InvalidRelease(i64),

    #[error("invalid genome build: {0:?}")]
    #[diagnostic(help("use the assembly name, e.g. GRCh38"))]
    InvalidBuild(String),

    #[error("failed to read config file at {0}")]
    ConfigRead(PathBuf),

    #[error("failed to parse JSON config: {0}")]
    ConfigParse(String),

    #[error("archive returned status {status} for {url}")]
    #[diagnostic(help("check the species, release and build parameters"))]
    RemoteStatus { status: u16, url: String },

    #[error("archive request failed: {0}")]
    Http(String),

    #[error("failed to decompress stream: {0}")]
    Decompress(String),

    #[error("stream is not valid UTF-8 text: {0}")]
    Encoding(String),

    #[error("filesystem error: {0}")]
    Filesystem(String),
}

impl AnnofetchError {
    /// Status code carried by a remote failure, if any.
    pub fn status(&self) -> Option<u16> {
        match self {
            AnnofetchError::RemoteStatus { status, .. } => Some(*status),
            _ => None,
        }
    }

    pub fn is_configuration(&self) -> bool {
        matches!(
            self,
            AnnofetchError::InvalidSpecies(_)
                | AnnofetchError::InvalidRelease(_)
                | AnnofetchError::InvalidBuild(_)
                | AnnofetchError::ConfigRead(_)
                | AnnofetchError::ConfigParse(_)
        )
    }
}
