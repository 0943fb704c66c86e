//! Table service over REST (JSON, minimal metadata).

use abc_retailers_core::{RecordKey, VersionTag};
use async_trait::async_trait;
use reqwest::header::{ACCEPT, CONTENT_TYPE, ETAG, IF_MATCH};
use reqwest::{Method, Response, StatusCode};
use serde_json::{Value, json};

use super::{AzureStorage, Service, expect_created, expect_status, service_error};
use crate::storage::table::{Continuation, Properties, TablePage, TableRow, TableService};
use crate::storage::{Result, StorageError};

const JSON_MINIMAL_METADATA: &str = "application/json;odata=minimalmetadata";
const JSON_NO_METADATA: &str = "application/json;odata=nometadata";
const DATA_SERVICE_VERSION: &str = "3.0;NetFx";
const ODATA_ETAG: &str = "odata.etag";
const NEXT_PARTITION_KEY: &str = "x-ms-continuation-NextPartitionKey";
const NEXT_ROW_KEY: &str = "x-ms-continuation-NextRowKey";

/// `Table(PartitionKey='..',RowKey='..')` with quotes doubled and the keys
/// percent-encoded.
fn entity_path(table: &str, key: &RecordKey) -> String {
    let quote = |value: &str| urlencoding::encode(&value.replace('\'', "''")).into_owned();
    format!(
        "{table}(PartitionKey='{}',RowKey='{}')",
        quote(&key.partition_key),
        quote(&key.row_key)
    )
}

/// Split an entity from a response body into its properties and tag.
fn into_row(entity: Value) -> Result<TableRow> {
    let Value::Object(mut properties) = entity else {
        return Err(StorageError::InvalidRecord(
            "table entity is not a JSON object".to_string(),
        ));
    };
    let etag = properties
        .remove(ODATA_ETAG)
        .and_then(|v| v.as_str().map(VersionTag::new))
        .ok_or_else(|| StorageError::InvalidRecord("table entity has no etag".to_string()))?;
    properties.retain(|name, _| !name.starts_with("odata.") && !name.ends_with("@odata.type"));
    Ok(TableRow { properties, etag })
}

fn etag_header(response: &Response) -> Result<VersionTag> {
    response
        .headers()
        .get(ETAG)
        .and_then(|v| v.to_str().ok())
        .map(VersionTag::new)
        .ok_or_else(|| StorageError::InvalidRecord("write response has no ETag".to_string()))
}

fn continuation_from(response: &Response) -> Option<Continuation> {
    let header = |name: &str| {
        response
            .headers()
            .get(name)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string)
    };
    header(NEXT_PARTITION_KEY).map(|next_partition_key| Continuation {
        next_partition_key,
        next_row_key: header(NEXT_ROW_KEY),
    })
}

impl AzureStorage {
    fn table_request(&self, method: Method, path: &str, query: &[(&str, &str)]) -> Result<reqwest::RequestBuilder> {
        let url = self.url(Service::Table, path, query)?;
        Ok(self
            .request(method, url)
            .header("DataServiceVersion", DATA_SERVICE_VERSION)
            .header("MaxDataServiceVersion", DATA_SERVICE_VERSION))
    }
}

#[async_trait]
impl TableService for AzureStorage {
    async fn create_table(&self, table: &str) -> Result<()> {
        let builder = self
            .table_request(Method::POST, "Tables", &[])?
            .header(ACCEPT, JSON_NO_METADATA)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return-no-content")
            .body(json!({ "TableName": table }).to_string());
        let response = self.send(Service::Table, builder).await?;
        expect_created(response).await?;
        tracing::debug!(table, "Table ready");
        Ok(())
    }

    async fn query(&self, table: &str, continuation: Option<&Continuation>) -> Result<TablePage> {
        let mut query = Vec::new();
        if let Some(next) = continuation {
            query.push(("NextPartitionKey", next.next_partition_key.as_str()));
            if let Some(row) = next.next_row_key.as_deref() {
                query.push(("NextRowKey", row));
            }
        }

        let builder = self
            .table_request(Method::GET, &format!("{table}()"), &query)?
            .header(ACCEPT, JSON_MINIMAL_METADATA);
        let response = self.send(Service::Table, builder).await?;
        let response = expect_status(response, &[StatusCode::OK]).await?;

        let continuation = continuation_from(&response);
        let body: Value = response.json().await?;
        let rows = match body.get("value") {
            Some(Value::Array(entities)) => entities
                .iter()
                .cloned()
                .map(into_row)
                .collect::<Result<Vec<_>>>()?,
            _ => Vec::new(),
        };

        Ok(TablePage { rows, continuation })
    }

    async fn get(&self, table: &str, key: &RecordKey) -> Result<Option<TableRow>> {
        let builder = self
            .table_request(Method::GET, &entity_path(table, key), &[])?
            .header(ACCEPT, JSON_MINIMAL_METADATA);
        let response = self.send(Service::Table, builder).await?;

        match response.status() {
            StatusCode::OK => {
                let entity: Value = response.json().await?;
                into_row(entity).map(Some)
            }
            StatusCode::NOT_FOUND => Ok(None),
            _ => Err(service_error(response).await),
        }
    }

    async fn insert(&self, table: &str, properties: Properties) -> Result<VersionTag> {
        let builder = self
            .table_request(Method::POST, table, &[])?
            .header(ACCEPT, JSON_NO_METADATA)
            .header(CONTENT_TYPE, "application/json")
            .header("Prefer", "return-no-content")
            .body(Value::Object(properties).to_string());
        let response = self.send(Service::Table, builder).await?;

        match response.status() {
            s if s.is_success() => etag_header(&response),
            StatusCode::CONFLICT => Err(StorageError::AlreadyExists),
            _ => Err(service_error(response).await),
        }
    }

    async fn replace(
        &self,
        table: &str,
        key: &RecordKey,
        properties: Properties,
        if_match: &VersionTag,
    ) -> Result<VersionTag> {
        let builder = self
            .table_request(Method::PUT, &entity_path(table, key), &[])?
            .header(ACCEPT, JSON_NO_METADATA)
            .header(CONTENT_TYPE, "application/json")
            .header(IF_MATCH, if_match.as_str())
            .body(Value::Object(properties).to_string());
        let response = self.send(Service::Table, builder).await?;

        match response.status() {
            s if s.is_success() => etag_header(&response),
            StatusCode::PRECONDITION_FAILED | StatusCode::NOT_FOUND => {
                Err(StorageError::ConcurrencyConflict)
            }
            _ => Err(service_error(response).await),
        }
    }

    async fn delete(&self, table: &str, key: &RecordKey) -> Result<()> {
        let builder = self
            .table_request(Method::DELETE, &entity_path(table, key), &[])?
            .header(ACCEPT, JSON_NO_METADATA)
            .header(IF_MATCH, "*");
        let response = self.send(Service::Table, builder).await?;

        match response.status() {
            s if s.is_success() || s == StatusCode::NOT_FOUND => Ok(()),
            _ => Err(service_error(response).await),
        }
    }
}
