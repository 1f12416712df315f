//! Artifact checksum verification (SHA-1, MD5).

use jargo_util::errors::JargoError;
use jargo_util::hash::{md5_hex, sha1_hex};

use crate::download::RepositoryFetcher;

/// Verify downloaded data against the checksum sidecars of the repository.
///
/// Tries `.sha1` first, then `.md5`. Logs a warning if no sidecar is
/// available; a sidecar that cannot be fetched counts as missing.
pub fn verify(
    fetcher: &dyn RepositoryFetcher,
    base_url: &str,
    relative: &str,
    data: &[u8],
) -> miette::Result<()> {
    let algorithms: [(&str, &str, fn(&[u8]) -> String); 2] =
        [("sha1", "SHA-1", sha1_hex), ("md5", "MD5", md5_hex)];

    for (extension, algo, digest) in algorithms {
        let sidecar = format!("{relative}.{extension}");
        match fetcher.fetch(base_url, &sidecar) {
            Ok(Some(expected)) => {
                let expected = extract_hash(&String::from_utf8_lossy(&expected));
                return check(&digest(data), &expected, algo, relative);
            }
            Ok(None) => {}
            Err(e) => tracing::debug!("{algo} sidecar for {relative} unavailable: {e}"),
        }
    }

    tracing::warn!("No checksum sidecar found for {relative}");
    Ok(())
}

fn check(actual: &str, expected: &str, algo: &str, relative: &str) -> miette::Result<()> {
    if actual.eq_ignore_ascii_case(expected) {
        tracing::debug!("{algo} ok for {relative}");
        Ok(())
    } else {
        Err(JargoError::DownloadFailure {
            coordinate: relative.to_string(),
            message: format!("{algo} mismatch: expected {expected}, got {actual}"),
        }
        .into())
    }
}

/// Extract the hex hash from a checksum file.
///
/// Maven checksum files may contain just the hash, or `hash  filename`.
fn extract_hash(content: &str) -> String {
    content.split_whitespace().next().unwrap_or("").to_string()
}
