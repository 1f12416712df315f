//! Artifact downloading from Maven repositories.

use std::time::Duration;

use reqwest::blocking::Client;

use jargo_util::errors::JargoError;

use crate::checksum;
use crate::repository::{self, LocalRepository};

const MAX_RETRIES: u32 = 3;
const RETRY_DELAY: Duration = Duration::from_secs(2);
const REQUEST_TIMEOUT: Duration = Duration::from_secs(120);

/// Transport used to fetch files from a remote repository.
///
/// `fetch` returns `Ok(None)` when the repository does not have the file.
pub trait RepositoryFetcher: Send + Sync {
    fn fetch(&self, base_url: &str, relative: &str) -> miette::Result<Option<Vec<u8>>>;
}

/// HTTP transport with retries on timeouts and server errors.
pub struct HttpFetcher {
    client: Client,
}

impl HttpFetcher {
    pub fn new() -> miette::Result<Self> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .user_agent(concat!("jargo/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| JargoError::Network {
                message: format!("Failed to create HTTP client: {e}"),
            })?;
        Ok(Self { client })
    }
}

impl RepositoryFetcher for HttpFetcher {
    fn fetch(&self, base_url: &str, relative: &str) -> miette::Result<Option<Vec<u8>>> {
        let url = repository::remote_url(base_url, relative);
        let mut last_err = String::new();

        for attempt in 0..MAX_RETRIES {
            if attempt > 0 {
                std::thread::sleep(RETRY_DELAY * attempt);
            }
            tracing::debug!("GET {url}");

            match self.client.get(&url).send() {
                Ok(resp) => {
                    let status = resp.status();
                    if status == reqwest::StatusCode::NOT_FOUND {
                        return Ok(None);
                    }
                    if status.is_server_error() {
                        last_err = format!("HTTP {status} from {url}");
                        continue;
                    }
                    if !status.is_success() {
                        return Err(JargoError::Network {
                            message: format!("HTTP {status} fetching {url}"),
                        }
                        .into());
                    }
                    let bytes = resp.bytes().map_err(|e| JargoError::Network {
                        message: format!("Failed to read response from {url}: {e}"),
                    })?;
                    return Ok(Some(bytes.to_vec()));
                }
                Err(e) if e.is_timeout() || e.is_connect() => {
                    last_err = format!("{e}");
                    continue;
                }
                Err(e) => {
                    return Err(JargoError::Network {
                        message: format!("Request to {url} failed: {e}"),
                    }
                    .into());
                }
            }
        }

        Err(JargoError::Network {
            message: format!("Failed after {MAX_RETRIES} retries for {url}: {last_err}"),
        }
        .into())
    }
}

/// Fetch a layout-relative file into the local repository, trying each
/// repository in order.
///
/// A repository that errors or serves a file failing checksum verification is
/// skipped. Returns `Ok(false)` when every repository reported the file as
/// absent, and a `DownloadFailure` when at least one of them failed.
pub fn download_file(
    fetcher: &dyn RepositoryFetcher,
    repositories: &[String],
    local: &LocalRepository,
    relative: &str,
) -> miette::Result<bool> {
    let mut failures = Vec::new();
    for base in repositories {
        let data = match fetcher.fetch(base, relative) {
            Ok(Some(data)) => data,
            Ok(None) => continue,
            Err(e) => {
                tracing::warn!("{base}: {e}");
                failures.push(format!("{base}: {e}"));
                continue;
            }
        };
        if let Err(e) = checksum::verify(fetcher, base, relative, &data) {
            tracing::warn!("{e}");
            failures.push(e.to_string());
            continue;
        }
        local.store(relative, &data)?;
        tracing::debug!("downloaded {relative} from {base}");
        return Ok(true);
    }
    if failures.is_empty() {
        Ok(false)
    } else {
        Err(JargoError::DownloadFailure {
            coordinate: relative.to_string(),
            message: failures.join("; "),
        }
        .into())
    }
}
