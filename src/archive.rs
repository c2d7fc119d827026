use std::io::Read;
use std::time::Duration;

use reqwest::blocking::Client;
use reqwest::header::{CONTENT_LENGTH, HeaderMap, HeaderValue, USER_AGENT};
use tracing::debug;

use crate::domain::Assembly;
use crate::error::AnnofetchError;

pub const DEFAULT_ARCHIVE_URL: &str = "https://ftp.ensembl.org/pub";
pub const DEFAULT_GENOME_SUFFIX: &str = "primary_assembly";

/// URL layout of the Ensembl FTP tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArchiveLayout {
    root: String,
}

impl ArchiveLayout {
    pub fn new(root: &str) -> Self {
        Self {
            root: root.trim_end_matches('/').to_string(),
        }
    }

    pub fn root(&self) -> &str {
        &self.root
    }

    /// `<root>/release-<r>/fasta/<species>/dna/<Species>.<build>.dna.<suffix>.fa.gz`
    pub fn genome_url(&self, assembly: &Assembly, suffix: &str) -> String {
        format!(
            "{root}/release-{release}/fasta/{species}/dna/{capitalized}.{build}.dna.{suffix}.fa.gz",
            root = self.root,
            release = assembly.release,
            species = assembly.species,
            capitalized = assembly.species.capitalized(),
            build = assembly.build,
        )
    }

    /// `<root>/release-<r>/gtf/<species>/<Species>.<build>.<r>.gtf.gz`
    pub fn annotation_url(&self, assembly: &Assembly) -> String {
        format!(
            "{root}/release-{release}/gtf/{species}/{capitalized}.{build}.{release}.gtf.gz",
            root = self.root,
            release = assembly.release,
            species = assembly.species,
            capitalized = assembly.species.capitalized(),
            build = assembly.build,
        )
    }
}

impl Default for ArchiveLayout {
    fn default() -> Self {
        Self::new(DEFAULT_ARCHIVE_URL)
    }
}

/// An opened, status-checked response body.
pub struct RemoteBody {
    /// Advisory size from `Content-Length`; never used for correctness.
    pub content_length: Option<u64>,
    pub reader: Box<dyn Read + Send>,
}

pub trait ArchiveClient: Send + Sync {
    /// Issues a streaming GET. A non-success status is returned as
    /// [`AnnofetchError::RemoteStatus`].
    fn open(&self, url: &str) -> Result<RemoteBody, AnnofetchError>;
}

#[derive(Clone)]
pub struct HttpArchiveClient {
    client: Client,
}

impl HttpArchiveClient {
    pub fn new(user_agent: Option<&str>, connect_timeout: Duration) -> Result<Self, AnnofetchError> {
        let agent = user_agent
            .map(str::to_string)
            .unwrap_or_else(|| format!("annofetch/{}", env!("CARGO_PKG_VERSION")));
        let mut headers = HeaderMap::new();
        headers.insert(
            USER_AGENT,
            HeaderValue::from_str(&agent).map_err(|err| AnnofetchError::Http(err.to_string()))?,
        );

        // Multi-gigabyte bodies: only the connect phase is bounded.
        let client = Client::builder()
            .default_headers(headers)
            .connect_timeout(connect_timeout)
            .timeout(None::<Duration>)
            .build()
            .map_err(|err| AnnofetchError::Http(err.to_string()))?;
        Ok(Self { client })
    }
}

impl ArchiveClient for HttpArchiveClient {
    fn open(&self, url: &str) -> Result<RemoteBody, AnnofetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .map_err(|err| AnnofetchError::Http(err.to_string()))?;
        if !response.status().is_success() {
            return Err(AnnofetchError::RemoteStatus {
                status: response.status().as_u16(),
                url: url.to_string(),
            });
        }
        let content_length = response
            .headers()
            .get(CONTENT_LENGTH)
            .and_then(|value| value.to_str().ok())
            .and_then(|value| value.parse().ok());
        debug!(url, content_length = ?content_length, "archive response");
        Ok(RemoteBody {
            content_length,
            reader: Box::new(response),
        })
    }
}
