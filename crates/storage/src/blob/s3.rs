use crate::blob::{BlobStore, UploadOutcome};
use crate::TransportConfig;
use async_trait::async_trait;
use aws_sdk_s3::error::SdkError;
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;


const PRECONDITION_FAILED: u16 = 412;


/// S3 backed blob store.
///
/// Containers are key prefixes under an optional root inside a single bucket.
pub struct S3BlobStore {
    client: aws_sdk_s3::Client,
    bucket: String,
    root: String
}


impl S3BlobStore {
    pub fn new(client: aws_sdk_s3::Client, bucket: String, root: String) -> Self {
        Self {
            client,
            bucket,
            root
        }
    }

    /// Builds a client from the environment, `AWS_S3_ENDPOINT` overrides the endpoint.
    pub async fn connect(bucket: String, root: String, transport: &TransportConfig) -> Self {
        let timeouts = aws_config::timeout::TimeoutConfig::builder()
            .operation_timeout(transport.operation_timeout)
            .operation_attempt_timeout(transport.attempt_timeout)
            .build();

        let retries = aws_config::retry::RetryConfig::standard()
            .with_max_attempts(transport.max_attempts.max(1));

        let mut config_loader = aws_config::from_env()
            .timeout_config(timeouts)
            .retry_config(retries);

        if let Ok(s3_endpoint) = std::env::var("AWS_S3_ENDPOINT") {
            config_loader = config_loader.endpoint_url(s3_endpoint);
        }

        let config = config_loader.load().await;
        let client = aws_sdk_s3::Client::new(&config);
        Self::new(client, bucket, root)
    }

    fn object_key(&self, container: &str, key: &str) -> String {
        let mut segments: Vec<&str> = Vec::with_capacity(3);
        if !self.root.is_empty() {
            segments.push(&self.root);
        }
        segments.push(container);
        segments.push(key);
        segments.join("/")
    }
}


#[async_trait]
impl BlobStore for S3BlobStore {
    async fn create_container_if_missing(&self, _container: &str) -> anyhow::Result<()> {
        match self.client.head_bucket().bucket(&self.bucket).send().await {
            Ok(_) => Ok(()),
            Err(err) if err.as_service_error().map_or(false, |e| e.is_not_found()) => {
                info!("bucket {} does not exist, creating it", self.bucket);
                self.client.create_bucket().bucket(&self.bucket).send().await?;
                Ok(())
            },
            Err(err) => Err(err.into())
        }
    }

    async fn upload_if_absent(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<UploadOutcome> {
        let result = self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(container, key))
            .if_none_match("*")
            .body(ByteStream::from(data))
            .send()
            .await;

        match result {
            Ok(_) => Ok(UploadOutcome::Uploaded),
            Err(SdkError::ServiceError(err)) if err.raw().status().as_u16() == PRECONDITION_FAILED => {
                Ok(UploadOutcome::AlreadyExists)
            },
            Err(err) => Err(err.into())
        }
    }

    async fn upload(&self, container: &str, key: &str, data: Bytes) -> anyhow::Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(self.object_key(container, key))
            .body(ByteStream::from(data))
            .send()
            .await?;
        Ok(())
    }
}
