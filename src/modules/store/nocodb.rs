use async_trait::async_trait;
use futures_util::stream::{self, StreamExt};
use reqwest::header::{HeaderMap, HeaderValue, ACCEPT, CONTENT_TYPE};
use reqwest_middleware::{ClientBuilder, ClientWithMiddleware};
use reqwest_retry::{policies::ExponentialBackoff, RetryTransientMiddleware};
use serde::Deserialize;
use serde_json::{Map, Value};
use tracing::{debug, error, warn};

use super::record_store::{MatchMode, RecordStore, RecordStream};
use crate::config::StoreConfig;
use crate::core::{AppError, Fields, Record, Result};

/// Column holding the primary key in a given database
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RecordIdField {
    /// Databases imported from Airtable keep their own key column
    NcRecordId,
    Id,
}

impl RecordIdField {
    pub fn column(&self) -> &'static str {
        match self {
            RecordIdField::NcRecordId => "ncRecordId",
            RecordIdField::Id => "Id",
        }
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ListRecords {
    list: Vec<Map<String, Value>>,
    page_info: PageInfo,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PageInfo {
    #[serde(default)]
    page_size: u32,
    #[serde(default = "default_last_page")]
    is_last_page: bool,
}

fn default_last_page() -> bool {
    true
}

#[derive(Debug, Deserialize)]
struct TableList {
    list: Vec<TableMeta>,
}

#[derive(Debug, Deserialize)]
struct TableMeta {
    id: String,
    title: String,
}

enum Page {
    At(u32),
    Finished,
}

/// Record store client for a NocoDB-style REST API
///
/// Transient HTTP failures are retried with exponential backoff by the
/// middleware stack; anything that still fails is logged and reported as
/// an empty result.
pub struct NocoDbClient {
    client: ClientWithMiddleware,
    base_url: String,
    database: String,
    id_field: RecordIdField,
    page_size: u32,
}

impl NocoDbClient {
    pub fn new(config: &StoreConfig, database: &str, id_field: RecordIdField) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static("application/json"));
        headers.insert(
            "xc-token",
            HeaderValue::from_str(&config.token)
                .map_err(|_| AppError::Configuration("Invalid STORE_TOKEN".to_string()))?,
        );

        let inner = reqwest::Client::builder().default_headers(headers).build()?;
        let retry_policy = ExponentialBackoff::builder().build_with_max_retries(config.max_retries);
        let client = ClientBuilder::new(inner)
            .with(RetryTransientMiddleware::new_with_policy(retry_policy))
            .build();

        let mut base_url = config.base_url.clone();
        if !base_url.ends_with('/') {
            base_url.push('/');
        }

        Ok(Self {
            client,
            base_url,
            database: database.to_string(),
            id_field,
            page_size: config.page_size,
        })
    }

    fn table_url(&self, table: &str) -> String {
        format!("{}data/v1/{}/{}", self.base_url, self.database, table)
    }

    fn where_clause(&self, field: &str, value: &str, operator: &str) -> String {
        let field = if field == "Id" { self.id_field.column() } else { field };
        if value.trim().is_empty() {
            format!("({},is,null)", field)
        } else {
            format!("({},{},{})", field, operator, value)
        }
    }

    /// Strip nulls and lift the key column into `Record::id`
    fn normalize(&self, raw: Map<String, Value>) -> Option<Record> {
        let mut fields = Fields::from(raw).without_nulls();
        let id = fields.get_string(self.id_field.column());
        if id.is_empty() {
            return None;
        }
        if !fields.contains("Id") {
            fields.insert("Id", id.clone());
        }
        Some(Record::new(id, fields))
    }

    async fn fetch_page(
        &self,
        table: &str,
        offset: u32,
        filter: Option<&str>,
    ) -> Result<(Vec<Record>, Page)> {
        let mut query = vec![
            ("limit", self.page_size.to_string()),
            ("offset", offset.to_string()),
        ];
        if let Some(filter) = filter {
            query.push(("where", filter.to_string()));
        }

        debug!(table = %table, offset = offset, "Fetching record page");

        let response = self
            .client
            .get(self.table_url(table))
            .query(&query)
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::store(format!(
                "listing {} failed with status {}",
                table,
                response.status()
            )));
        }

        let page: ListRecords = response.json().await?;
        let next = if page.page_info.is_last_page || page.list.is_empty() {
            Page::Finished
        } else {
            Page::At(offset + page.page_info.page_size.max(page.list.len() as u32))
        };

        let records = page
            .list
            .into_iter()
            .filter_map(|raw| self.normalize(raw))
            .collect();

        Ok((records, next))
    }

    fn paginate<'a>(&'a self, table: &'a str, filter: Option<String>) -> RecordStream<'a> {
        stream::unfold(Page::At(0), move |state| {
            let filter = filter.clone();
            async move {
                let Page::At(offset) = state else {
                    return None;
                };
                match self.fetch_page(table, offset, filter.as_deref()).await {
                    Ok((records, next)) => Some((stream::iter(records), next)),
                    Err(e) => {
                        error!(table = %table, offset = offset, error = %e, "Record listing aborted");
                        None
                    }
                }
            }
        })
        .flatten()
        .boxed()
    }

    async fn find_where(&self, table: &str, filter: String) -> Result<Option<Record>> {
        let response = self
            .client
            .get(format!("{}/find-one", self.table_url(table)))
            .query(&[("where", filter)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(AppError::store(format!(
                "find-one on {} failed with status {}",
                table,
                response.status()
            )));
        }

        let body: Value = response.json().await?;
        Ok(match body {
            Value::Object(map) => self.normalize(map),
            _ => None,
        })
    }

    async fn send_json(
        &self,
        builder: reqwest_middleware::RequestBuilder,
        body: &Map<String, Value>,
    ) -> Result<Option<Map<String, Value>>> {
        let response = builder
            .header(CONTENT_TYPE, "application/json")
            .body(serde_json::to_string(body)?)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status();
            let text = response.text().await.unwrap_or_default();
            warn!(status = %status, body = %text, "Record store rejected write");
            return Ok(None);
        }

        match response.json::<Value>().await? {
            Value::Object(map) => Ok(Some(map)),
            _ => Ok(None),
        }
    }

    fn returned_id(&self, map: &Map<String, Value>) -> Option<String> {
        Fields::from(map.clone())
            .get_non_empty(self.id_field.column())
            .or_else(|| Fields::from(map.clone()).get_non_empty("Id"))
    }
}

#[async_trait]
impl RecordStore for NocoDbClient {
    fn list_all<'a>(&'a self, table: &'a str) -> RecordStream<'a> {
        self.paginate(table, None)
    }

    fn list_where<'a>(
        &'a self,
        table: &'a str,
        field: &'a str,
        value: &'a str,
    ) -> RecordStream<'a> {
        self.paginate(table, Some(self.where_clause(field, value, "eq")))
    }

    async fn find_one(
        &self,
        table: &str,
        field: &str,
        value: &str,
        mode: MatchMode,
    ) -> Option<Record> {
        let filter = match mode {
            MatchMode::Exact => self.where_clause(field, value, "eq"),
            MatchMode::Partial => self.where_clause(field, value, "like"),
            MatchMode::ScanAll => {
                return self
                    .list_all(table)
                    .filter(|record| {
                        let hit = record.fields.get_string(field) == value;
                        async move { hit }
                    })
                    .boxed()
                    .next()
                    .await;
            }
        };

        match self.find_where(table, filter).await {
            Ok(record) => record,
            Err(e) => {
                error!(table = %table, field = %field, error = %e, "Record lookup failed");
                None
            }
        }
    }

    async fn find_by_id(&self, table: &str, id: &str) -> Option<Record> {
        if id.trim().is_empty() {
            return None;
        }
        let filter = format!("({},eq,{})", self.id_field.column(), id);
        match self.find_where(table, filter).await {
            Ok(record) => record,
            Err(e) => {
                error!(table = %table, id = %id, error = %e, "Record lookup by id failed");
                None
            }
        }
    }

    async fn update(&self, table: &str, id: &str, fields: Fields) -> bool {
        let mut body = fields.into_inner();
        body.remove("Id");
        body.insert(self.id_field.column().to_string(), Value::String(id.to_string()));

        let builder = self.client.patch(format!("{}/{}", self.table_url(table), id));
        match self.send_json(builder, &body).await {
            Ok(Some(map)) => self.returned_id(&map).as_deref() == Some(id),
            Ok(None) => false,
            Err(e) => {
                error!(table = %table, id = %id, error = %e, "Record update failed");
                false
            }
        }
    }

    async fn create(&self, table: &str, fields: Fields) -> Option<String> {
        let body = fields.into_inner();
        let builder = self.client.post(self.table_url(table));
        match self.send_json(builder, &body).await {
            Ok(Some(map)) => self.returned_id(&map),
            Ok(None) => None,
            Err(e) => {
                error!(table = %table, error = %e, "Record create failed");
                None
            }
        }
    }

    async fn table_id(&self, table: &str) -> Option<String> {
        let url = format!("{}meta/projects/{}/tables", self.base_url, self.database);
        let response = match self.client.get(url).send().await {
            Ok(response) if response.status().is_success() => response,
            Ok(response) => {
                warn!(status = %response.status(), "Table metadata request rejected");
                return None;
            }
            Err(e) => {
                error!(error = %e, "Table metadata request failed");
                return None;
            }
        };

        let tables: TableList = response.json().await.ok()?;
        tables
            .list
            .into_iter()
            .find(|meta| meta.title == table)
            .map(|meta| meta.id)
    }
}
