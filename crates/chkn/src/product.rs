//! Remote product retrieval.
//!
//! Product files are published under `<base>/<product id>/<revision>/`. The
//! newest revision is found by probing downward from
//! [`ProductFetcher::MAX_REVISION`]; its `_contents.json` manifest lists the
//! files, which are downloaded and packed into a CHKN archive.

use std::io::Cursor;
use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use tracing::{debug, info, warn};

use crate::writer::{write_chkn, ChknOptions};
use crate::{Error, Result};

/// Default product data endpoint.
pub const DEFAULT_BASE_URL: &str = "https://userimages-akm.imvu.com/productdata";

/// One file listed in a product manifest.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct ManifestFile {
    /// Name of the file inside the archive.
    pub name: String,
    /// Path relative to the revision URL, when it differs from `name`.
    #[serde(default)]
    pub url: Option<String>,
}

impl ManifestFile {
    /// Path to download the file from.
    pub fn remote_path(&self) -> &str {
        self.url.as_deref().unwrap_or(&self.name)
    }
}

/// Parse a `_contents.json` manifest.
pub fn parse_manifest(data: &[u8]) -> Result<Vec<ManifestFile>> {
    Ok(serde_json::from_slice(data)?)
}

/// Downloads products and packs them as CHKN archives.
pub struct ProductFetcher {
    client: Client,
    base_url: String,
    max_retry: u32,
}

impl ProductFetcher {
    /// Highest revision probed.
    pub const MAX_REVISION: u32 = 100;

    /// Create a fetcher for the given endpoint.
    pub fn new(base_url: impl Into<String>) -> Result<Self> {
        let client = Client::builder().timeout(Duration::from_secs(30)).build()?;
        let base_url = base_url.into().trim_end_matches('/').to_string();

        Ok(Self {
            client,
            base_url,
            max_retry: 10,
        })
    }

    /// Set how many times transient failures are retried.
    pub fn with_max_retry(mut self, max_retry: u32) -> Self {
        self.max_retry = max_retry;
        self
    }

    /// URL of a product revision directory (or a file within it).
    pub fn revision_url(&self, product: &str, revision: u32, path: Option<&str>) -> String {
        match path {
            Some(path) => format!("{}/{}/{}/{}", self.base_url, product, revision, path),
            None => format!("{}/{}/{}", self.base_url, product, revision),
        }
    }

    /// Find the newest published revision of a product.
    pub async fn latest_revision(&self, product: &str) -> Result<Option<u32>> {
        for revision in (1..=Self::MAX_REVISION).rev() {
            let url = self.revision_url(product, revision, None);
            match self.get(&url).await {
                Ok(body) if !body.is_empty() => return Ok(Some(revision)),
                Ok(_) => {}
                Err(Error::Status { status, .. }) => {
                    debug!(product, revision, status, "revision not available");
                }
                Err(e) => return Err(e),
            }
        }
        Ok(None)
    }

    /// Download every file of the newest revision of a product.
    ///
    /// Returns `None` when no revision exists.
    pub async fn fetch_files(&self, product: &str) -> Result<Option<Vec<(String, Vec<u8>)>>> {
        let product = product.trim();
        let Some(revision) = self.latest_revision(product).await? else {
            return Ok(None);
        };
        debug!(product, revision, "found product revision");

        let manifest_url = self.revision_url(product, revision, Some("_contents.json"));
        let manifest = parse_manifest(&self.get(&manifest_url).await?)?;

        let mut files = Vec::with_capacity(manifest.len());
        for file in manifest {
            let url = self.revision_url(product, revision, Some(file.remote_path()));
            info!("Downloading {url}");
            let data = self.get(&url).await?;
            files.push((file.name, data));
        }

        Ok(Some(files))
    }

    /// Download a product and pack it as a CHKN archive.
    pub async fn fetch_chkn(&self, product: &str, options: ChknOptions) -> Result<Option<Vec<u8>>> {
        let Some(files) = self.fetch_files(product).await? else {
            return Ok(None);
        };

        let pairs = files
            .iter()
            .map(|(name, data)| (name.as_str(), data.as_slice()));
        let cursor = write_chkn(pairs, Cursor::new(Vec::new()), options)?;
        Ok(Some(cursor.into_inner()))
    }

    /// GET a URL, retrying timeouts and connection failures.
    async fn get(&self, url: &str) -> Result<Vec<u8>> {
        let mut retry_count = 0;

        loop {
            match self.client.get(url).send().await {
                Ok(resp) => {
                    let status = resp.status();
                    if !status.is_success() {
                        return Err(Error::Status {
                            url: url.to_string(),
                            status: status.as_u16(),
                        });
                    }
                    return Ok(resp.bytes().await?.to_vec());
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    retry_count += 1;
                    if retry_count >= self.max_retry {
                        return Err(Error::RetriesExhausted {
                            url: url.to_string(),
                            attempts: retry_count,
                        });
                    }
                    warn!(
                        "Connection error, retry {}/{}: {}",
                        retry_count, self.max_retry, e
                    );
                    tokio::time::sleep(Duration::from_millis(500 * retry_count as u64)).await;
                }
                Err(e) => return Err(e.into()),
            }
        }
    }
}
