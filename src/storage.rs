use async_trait::async_trait;
use aws_sdk_s3 as s3;
use s3::presigning::PresigningConfig;
use std::sync::Arc;
use std::time::Duration;

/// How long a presigned resume-upload URL stays valid.
const UPLOAD_URL_TTL: Duration = Duration::from_secs(600);

/// StorageService
///
/// Contract for the object-storage layer behind the resume pipeline. Handlers talk
/// to this trait only, so the concrete backend (a real S3-compatible store, or the
/// in-memory mock under test) is swappable without touching the HTTP surface.
#[async_trait]
pub trait StorageService: Send + Sync {
    /// Provisions the resume bucket if it does not exist yet. Called once at
    /// startup under `Env::Local` so a fresh MinIO container is usable
    /// immediately; production buckets are provisioned out of band.
    async fn ensure_bucket(&self);

    /// Signs a short-lived PUT URL for `key`, letting the browser ship the resume
    /// PDF straight to storage without routing the bytes through this server. The
    /// signature pins the upload to `content_type`.
    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String>;
}

/// StorageState
///
/// Shared handle to the storage layer, held in `AppState`.
pub type StorageState = Arc<dyn StorageService>;

/// sanitize_key
///
/// Strips empty, `.`, and `..` path segments from an object key. The handlers build
/// keys from UUIDs, but the extension segment originates from a client-supplied
/// filename, so traversal components are removed before the key reaches storage.
fn sanitize_key(key: &str) -> String {
    key.split('/')
        .filter(|segment| !segment.is_empty() && *segment != ".." && *segment != ".")
        .collect::<Vec<_>>()
        .join("/")
}

/// S3StorageClient
///
/// Storage backend over the AWS S3 SDK. The same client serves the Dockerized
/// MinIO instance in local development and whatever S3-compatible store production
/// points at; only the endpoint and credentials differ.
#[derive(Clone)]
pub struct S3StorageClient {
    client: s3::Client,
    bucket_name: String,
}

impl S3StorageClient {
    /// Builds the client from the credentials resolved by `AppConfig`. Path-style
    /// addressing (`http://endpoint/bucket/key`) is forced because MinIO and most
    /// S3 gateways do not resolve virtual-host bucket names.
    pub async fn new(
        endpoint: &str,
        region: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
    ) -> Self {
        let credentials =
            s3::config::Credentials::new(access_key, secret_key, None, None, "static");

        let config = s3::Config::builder()
            .credentials_provider(credentials)
            .endpoint_url(endpoint)
            .region(s3::config::Region::new(region.to_string()))
            .behavior_version_latest()
            .force_path_style(true)
            .build();

        Self {
            client: s3::Client::from_conf(config),
            bucket_name: bucket.to_string(),
        }
    }
}

#[async_trait]
impl StorageService for S3StorageClient {
    async fn ensure_bucket(&self) {
        // CreateBucket is idempotent; an already-exists error is the normal case
        // on every startup after the first.
        let _ = self
            .client
            .create_bucket()
            .bucket(&self.bucket_name)
            .send()
            .await;
    }

    async fn presign_upload(&self, key: &str, content_type: &str) -> Result<String, String> {
        let key = sanitize_key(key);

        let presigned = self
            .client
            .put_object()
            .bucket(&self.bucket_name)
            .key(&key)
            // The signature covers the Content-Type header, so the client must
            // upload with exactly the declared MIME type.
            .content_type(content_type)
            .presigned(
                PresigningConfig::expires_in(UPLOAD_URL_TTL).map_err(|e| e.to_string())?,
            )
            .await
            .map_err(|e| e.to_string())?;

        Ok(presigned.uri().to_string())
    }
}

/// MockStorageService
///
/// Test double for the storage layer. Returns deterministic URLs so handler tests
/// can assert on the key without a running MinIO, and can be flipped into a
/// failing mode to exercise the error path.
#[derive(Clone, Default)]
pub struct MockStorageService {
    /// When true, every presign request reports a simulated backend failure.
    pub should_fail: bool,
}

impl MockStorageService {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn new_failing() -> Self {
        Self { should_fail: true }
    }
}

#[async_trait]
impl StorageService for MockStorageService {
    async fn ensure_bucket(&self) {}

    async fn presign_upload(&self, key: &str, _content_type: &str) -> Result<String, String> {
        if self.should_fail {
            return Err("mock storage failure".to_string());
        }

        Ok(format!(
            "http://localhost:9000/mock-bucket/{}?signature=fake",
            sanitize_key(key)
        ))
    }
}
