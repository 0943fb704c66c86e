//! File service over REST.

use async_trait::async_trait;
use reqwest::{Method, StatusCode};

use super::{AzureStorage, Service, encode_path, expect_created, expect_status, service_error};
use crate::storage::file_share::FileShareService;
use crate::storage::{Result, StorageError};

#[async_trait]
impl FileShareService for AzureStorage {
    async fn create_share(&self, share: &str) -> Result<()> {
        let url = self.url(Service::File, &encode_path(&[share]), &[("restype", "share")])?;
        let response = self
            .send(Service::File, self.request(Method::PUT, url))
            .await?;
        expect_created(response).await?;
        tracing::debug!(share, "Share ready");
        Ok(())
    }

    async fn create_directory(&self, share: &str, directory: &str) -> Result<()> {
        let url = self.url(
            Service::File,
            &encode_path(&[share, directory]),
            &[("restype", "directory")],
        )?;
        let response = self
            .send(Service::File, self.request(Method::PUT, url))
            .await?;
        expect_created(response).await
    }

    async fn create_file(&self, share: &str, directory: &str, name: &str, length: u64) -> Result<()> {
        let url = self.url(Service::File, &encode_path(&[share, directory, name]), &[])?;
        let builder = self
            .request(Method::PUT, url)
            .header("x-ms-type", "file")
            .header("x-ms-content-length", length.to_string());

        let response = self.send(Service::File, builder).await?;
        expect_status(response, &[StatusCode::CREATED]).await?;
        Ok(())
    }

    async fn put_range(
        &self,
        share: &str,
        directory: &str,
        name: &str,
        offset: u64,
        content: &[u8],
    ) -> Result<()> {
        if content.is_empty() {
            return Ok(());
        }
        let end = offset + content.len() as u64 - 1;
        let url = self.url(
            Service::File,
            &encode_path(&[share, directory, name]),
            &[("comp", "range")],
        )?;
        let builder = self
            .request(Method::PUT, url)
            .header("x-ms-write", "update")
            .header("x-ms-range", format!("bytes={offset}-{end}"))
            .body(content.to_vec());

        let response = self.send(Service::File, builder).await?;
        expect_status(response, &[StatusCode::CREATED]).await?;
        Ok(())
    }

    async fn get_file(&self, share: &str, directory: &str, name: &str) -> Result<Vec<u8>> {
        let url = self.url(Service::File, &encode_path(&[share, directory, name]), &[])?;
        let response = self
            .send(Service::File, self.request(Method::GET, url))
            .await?;

        match response.status() {
            StatusCode::OK => Ok(response.bytes().await?.to_vec()),
            StatusCode::NOT_FOUND => Err(StorageError::NotFound),
            _ => Err(service_error(response).await),
        }
    }
}
