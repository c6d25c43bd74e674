use placeme_portal::storage::{MockStorageService, S3StorageClient, StorageService};
use uuid::Uuid;

#[cfg(test)]
mod mock_tests {
    use super::*;

    #[tokio::test]
    async fn test_mock_presign_embeds_resume_key() {
        let mock = MockStorageService::new();
        let key = "resumes/3f2a/7b1c.pdf";

        let url = mock
            .presign_upload(key, "application/pdf")
            .await
            .expect("mock presign should succeed");

        assert!(url.contains("signature=fake"));
        assert!(url.contains(key));
    }

    #[tokio::test]
    async fn test_mock_failure_mode_surfaces_error() {
        let mock = MockStorageService::new_failing();
        let result = mock.presign_upload("resumes/x.pdf", "application/pdf").await;
        assert!(result.is_err());
    }

    #[tokio::test]
    async fn test_traversal_segments_are_stripped_from_keys() {
        let mock = MockStorageService::new();
        let url = mock
            .presign_upload("resumes/../../etc/passwd", "text/plain")
            .await
            .unwrap();

        assert!(!url.contains(".."));
        assert!(url.contains("resumes/etc/passwd"));
    }
}

#[cfg(test)]
mod s3_tests {
    use super::*;

    // Presigning is a local signing operation, so these run without MinIO.

    #[tokio::test]
    async fn test_s3_client_construction() {
        let _client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;
    }

    #[tokio::test]
    async fn test_s3_presigned_url_targets_endpoint_and_key() {
        let client = S3StorageClient::new(
            "http://localhost:9000",
            "us-east-1",
            "testkey",
            "testsecret",
            "testbucket",
        )
        .await;

        let key = format!("resumes/{}/resume.pdf", Uuid::new_v4());
        let url = client
            .presign_upload(&key, "application/pdf")
            .await
            .expect("offline presign should succeed");

        assert!(url.contains("localhost:9000"));
        assert!(url.contains(&key));
    }
}
