use aws_sdk_s3::config::{BehaviorVersion, Credentials, Region};
use aws_sdk_s3::Client as S3Client;

/// S3-compatible object store holding profile photos.
///
/// A photo reference stored on a profile is either an absolute URL
/// (used as-is) or a storage key of the form `{user_id}/{millis}.{ext}`
/// resolved to a public URL at read time.
#[derive(Clone)]
pub struct StorageClient {
    client: S3Client,
    bucket: String,
    public_url: String,
}

impl StorageClient {
    pub async fn new(
        endpoint: &str,
        access_key: &str,
        secret_key: &str,
        bucket: &str,
        public_url: &str,
    ) -> Self {
        let credentials = Credentials::new(access_key, secret_key, None, None, "minio");

        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .endpoint_url(endpoint)
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .force_path_style(true)
            .build();

        let client = S3Client::from_conf(config);

        // Ensure bucket exists
        let _ = client.create_bucket().bucket(bucket).send().await;

        tracing::info!(endpoint = %endpoint, bucket = %bucket, "storage client initialized");

        Self {
            client,
            bucket: bucket.to_string(),
            public_url: public_url.trim_end_matches('/').to_string(),
        }
    }

    /// Key for a freshly uploaded photo, namespaced by owner.
    pub fn photo_key(user_id: uuid::Uuid, timestamp_millis: i64, ext: &str) -> String {
        format!("{user_id}/{timestamp_millis}.{ext}")
    }

    /// Resolve a stored photo reference to a browser-reachable URL.
    pub fn resolve_url(&self, reference: &str) -> String {
        if reference.starts_with("http://") || reference.starts_with("https://") {
            reference.to_string()
        } else {
            format!("{}/{}/{}", self.public_url, self.bucket, reference)
        }
    }

    /// Upload a photo and return its storage key.
    pub async fn upload(
        &self,
        key: &str,
        body: Vec<u8>,
        content_type: &str,
    ) -> Result<(), String> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(body.into())
            .content_type(content_type)
            .send()
            .await
            .map_err(|e| format!("upload failed: {e}"))?;

        Ok(())
    }

    /// Delete an object. Missing keys are not an error.
    pub async fn delete(&self, key: &str) -> Result<(), String> {
        self.client
            .delete_object()
            .bucket(&self.bucket)
            .key(key)
            .send()
            .await
            .map_err(|e| format!("delete failed: {e}"))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use uuid::Uuid;

    fn client_for_urls() -> StorageClient {
        let credentials = Credentials::new("k", "s", None, None, "test");
        let config = aws_sdk_s3::Config::builder()
            .behavior_version(BehaviorVersion::latest())
            .region(Region::new("us-east-1"))
            .credentials_provider(credentials)
            .build();
        StorageClient {
            client: S3Client::from_conf(config),
            bucket: "profile-photos".to_string(),
            public_url: "http://localhost:9000".to_string(),
        }
    }

    #[test]
    fn absolute_references_pass_through() {
        let c = client_for_urls();
        assert_eq!(
            c.resolve_url("https://cdn.example.com/a.jpg"),
            "https://cdn.example.com/a.jpg"
        );
    }

    #[test]
    fn storage_keys_resolve_to_public_url() {
        let c = client_for_urls();
        let id = Uuid::nil();
        let key = StorageClient::photo_key(id, 1700000000000, "jpg");
        assert_eq!(
            key,
            "00000000-0000-0000-0000-000000000000/1700000000000.jpg"
        );
        assert_eq!(
            c.resolve_url(&key),
            format!("http://localhost:9000/profile-photos/{key}")
        );
    }
}
