//! Blob service over REST.

use abc_retailers_core::Visibility;
use async_trait::async_trait;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};

use super::{AzureStorage, Service, encode_path, expect_created, expect_status, service_error};
use crate::storage::Result;
use crate::storage::blob::BlobService;

#[async_trait]
impl BlobService for AzureStorage {
    async fn create_container(&self, container: &str, visibility: Visibility) -> Result<()> {
        let url = self.url(
            Service::Blob,
            &encode_path(&[container]),
            &[("restype", "container")],
        )?;
        let mut builder = self.request(Method::PUT, url);
        if visibility == Visibility::PublicRead {
            builder = builder.header("x-ms-blob-public-access", "blob");
        }

        let response = self.send(Service::Blob, builder).await?;
        expect_created(response).await?;
        tracing::debug!(container, ?visibility, "Container ready");
        Ok(())
    }

    async fn put_blob(
        &self,
        container: &str,
        name: &str,
        content: Vec<u8>,
        content_type: &str,
    ) -> Result<()> {
        let url = self.url(Service::Blob, &encode_path(&[container, name]), &[])?;
        let builder = self
            .request(Method::PUT, url)
            .header("x-ms-blob-type", "BlockBlob")
            .header(CONTENT_TYPE, content_type)
            .body(content);

        let response = self.send(Service::Blob, builder).await?;
        expect_status(response, &[StatusCode::CREATED]).await?;
        Ok(())
    }

    async fn delete_blob(&self, container: &str, name: &str) -> Result<()> {
        let url = self.url(Service::Blob, &encode_path(&[container, name]), &[])?;
        let response = self
            .send(Service::Blob, self.request(Method::DELETE, url))
            .await?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            _ => Err(service_error(response).await),
        }
    }

    fn blob_url(&self, container: &str, name: &str) -> String {
        format!(
            "{}/{}",
            self.account().blob_endpoint,
            encode_path(&[container, name])
        )
    }
}
