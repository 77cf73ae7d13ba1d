// 📥 Source Fetching
// Raw JSON bytes from a local file, an upload, or an HTTP endpoint.
// Remote mode uses the shared reqwest client as-is: no retries, no custom
// timeout, default redirect policy. Anything other than a 200 is a fetch error.

use crate::error::{MigrationError, Result};
use reqwest::{Client, StatusCode};
use std::path::PathBuf;
use tracing::{info, warn};
use url::Url;

/// Extension accepted for uploaded files
pub const UPLOAD_EXTENSION: &str = "json";

/// Where a migration reads its payload from. Exactly one per run.
#[derive(Debug, Clone)]
pub enum Source {
    /// Local file path
    File(PathBuf),
    /// File received through the upload form
    Upload { file_name: String, bytes: Vec<u8> },
    /// HTTP GET endpoint
    Remote(Url),
}

impl Source {
    /// Parse an endpoint string into a remote source; a relative or
    /// malformed URL is a fetch error
    pub fn remote(endpoint: &str) -> Result<Self> {
        Url::parse(endpoint)
            .map(Source::Remote)
            .map_err(|e| MigrationError::Fetch(format!("Invalid endpoint {endpoint}: {e}")))
    }

    /// Pick the source for one run
    ///
    /// A file (local path or upload) wins over the endpoint. A blank endpoint
    /// counts as absent; Ok(None) means nothing was given.
    pub fn choose(file: Option<Source>, endpoint: Option<&str>) -> Result<Option<Source>> {
        if let Some(file) = file {
            return Ok(Some(file));
        }

        match endpoint.map(str::trim).filter(|e| !e.is_empty()) {
            Some(endpoint) => Source::remote(endpoint).map(Some),
            None => Ok(None),
        }
    }

    /// Short description for progress output
    pub fn describe(&self) -> String {
        match self {
            Source::File(path) => path.display().to_string(),
            Source::Upload { file_name, .. } => file_name.clone(),
            Source::Remote(url) => url.to_string(),
        }
    }
}

/// Retrieves raw payload bytes for a `Source`
#[derive(Debug, Clone, Default)]
pub struct SourceFetcher {
    client: Client,
}

impl SourceFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a fetcher around an existing client (shared connection pool)
    pub fn with_client(client: Client) -> Self {
        Self { client }
    }

    /// Unreadable files, uploads without a `.json` extension, non-200
    /// responses and transport failures are all `MigrationError::Fetch`
    pub async fn fetch(&self, source: &Source) -> Result<Vec<u8>> {
        match source {
            Source::File(path) => {
                let bytes = tokio::fs::read(path).await.map_err(|e| {
                    MigrationError::Fetch(format!("Failed to read {}: {e}", path.display()))
                })?;
                info!(path = %path.display(), bytes = bytes.len(), "file read");
                Ok(bytes)
            }
            Source::Upload { file_name, bytes } => {
                check_upload_name(file_name)?;
                Ok(bytes.clone())
            }
            Source::Remote(url) => self.get(url).await,
        }
    }

    async fn get(&self, url: &Url) -> Result<Vec<u8>> {
        let response = self.client.get(url.clone()).send().await?;

        let status = response.status();
        if status != StatusCode::OK {
            warn!(url = %url, status = status.as_u16(), "endpoint returned non-200");
            return Err(MigrationError::Fetch(format!(
                "Endpoint {url} responded with {status}"
            )));
        }

        let body = response.bytes().await?;
        info!(url = %url, bytes = body.len(), "received 200 response");
        Ok(body.to_vec())
    }
}

fn check_upload_name(file_name: &str) -> Result<()> {
    let has_extension = file_name
        .rsplit_once('.')
        .is_some_and(|(_, ext)| ext.eq_ignore_ascii_case(UPLOAD_EXTENSION));

    if has_extension {
        Ok(())
    } else {
        Err(MigrationError::Fetch(format!(
            "Only .{UPLOAD_EXTENSION} files are allowed, got {file_name}"
        )))
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::parser::tests::USERS_FIXTURE;
    use axum::{http::StatusCode as AxumStatus, routing::get, Router};
    use std::net::SocketAddr;

    pub(crate) fn local_fetcher() -> SourceFetcher {
        SourceFetcher::with_client(Client::builder().no_proxy().build().unwrap())
    }

    pub(crate) async fn serve_fixture() -> SocketAddr {
        let app = Router::new()
            .route("/users", get(|| async { USERS_FIXTURE }))
            .route("/missing", get(|| async { (AxumStatus::NOT_FOUND, "nope") }))
            .route("/created", get(|| async { (AxumStatus::CREATED, "[]") }));

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });
        addr
    }

    #[tokio::test]
    async fn test_remote_200_returns_body() {
        let addr = serve_fixture().await;
        let source = Source::remote(&format!("http://{addr}/users")).unwrap();

        let bytes = local_fetcher().fetch(&source).await.unwrap();
        assert_eq!(bytes, USERS_FIXTURE.as_bytes());
    }

    #[tokio::test]
    async fn test_remote_non_200_is_fetch_error() {
        let addr = serve_fixture().await;
        let fetcher = local_fetcher();

        for path in ["missing", "created"] {
            let source = Source::remote(&format!("http://{addr}/{path}")).unwrap();
            let err = fetcher.fetch(&source).await.unwrap_err();
            assert!(matches!(err, MigrationError::Fetch(_)), "{path}");
        }
    }

    #[tokio::test]
    async fn test_remote_transport_failure_is_fetch_error() {
        // Bind then drop to get a port nothing listens on
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let source = Source::remote(&format!("http://{addr}/users")).unwrap();
        let err = local_fetcher().fetch(&source).await.unwrap_err();
        assert!(matches!(err, MigrationError::Fetch(_)));
    }

    #[test]
    fn test_invalid_endpoint() {
        assert!(matches!(
            Source::remote("not a url"),
            Err(MigrationError::Fetch(_))
        ));
    }

    #[test]
    fn test_choose_prefers_file() {
        let file = Source::File(PathBuf::from("users.json"));

        let chosen = Source::choose(Some(file), Some("http://example.com/users")).unwrap();
        assert!(matches!(chosen, Some(Source::File(_))));

        let chosen = Source::choose(None, Some(" http://example.com/users ")).unwrap();
        assert!(matches!(chosen, Some(Source::Remote(_))));

        assert!(Source::choose(None, Some("   ")).unwrap().is_none());
        assert!(Source::choose(None, None).unwrap().is_none());
        assert!(matches!(
            Source::choose(None, Some("not a url")),
            Err(MigrationError::Fetch(_))
        ));
    }

    #[tokio::test]
    async fn test_file_mode() {
        let path = std::env::temp_dir().join(format!("users-{}.json", uuid::Uuid::new_v4()));
        tokio::fs::write(&path, USERS_FIXTURE).await.unwrap();

        let bytes = SourceFetcher::new()
            .fetch(&Source::File(path.clone()))
            .await
            .unwrap();
        assert_eq!(bytes.len(), USERS_FIXTURE.len());

        tokio::fs::remove_file(&path).await.unwrap();
        let err = SourceFetcher::new()
            .fetch(&Source::File(path))
            .await
            .unwrap_err();
        assert!(matches!(err, MigrationError::Fetch(_)));
    }

    #[tokio::test]
    async fn test_upload_extension_check() {
        let fetcher = SourceFetcher::new();

        let ok = Source::Upload {
            file_name: "users.JSON".to_string(),
            bytes: b"[]".to_vec(),
        };
        assert_eq!(fetcher.fetch(&ok).await.unwrap(), b"[]");

        let rejected = Source::Upload {
            file_name: "users.csv".to_string(),
            bytes: b"[]".to_vec(),
        };
        assert!(fetcher.fetch(&rejected).await.is_err());
    }
}
