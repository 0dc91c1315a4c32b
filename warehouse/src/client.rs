use std::time::Duration;

use chrono::NaiveDate;
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use serde_json::json;
use tracing::info;
use tracing::warn;

use transfer_entities::ManagingSystem;
use transfer_entities::Scope;
use transfer_entities::ScopeKind;
use transfer_gcp_auth::SharedTokenProvider;

use crate::decode::QueryResponse;
use crate::decode::decode_response;
use crate::error::WarehouseError;
use crate::rows::EntryGroupRow;
use crate::rows::TagTemplateRow;
use crate::schema::PARTITION_COLUMN;
use crate::schema::TableName;
use crate::schema::table_metadata;
use crate::views::ViewName;
use crate::views::view_sql;

const BIGQUERY_BASE_URL: &str = "https://bigquery.googleapis.com/bigquery/v2";

/// Insert retry budget for "table not found" races right after creation.
pub const RETRY_COUNT: u32 = 5;
pub const RETRY_BASE_DELAY: Duration = Duration::from_secs(2);

/// BigQuery dataset handle. One instance per job or handler, addressing one
/// `project.dataset` pair.
pub struct Warehouse {
    http: reqwest::Client,
    base_url: String,
    project: String,
    dataset: String,
    dataset_location: String,
    tokens: SharedTokenProvider,
    retry_count: u32,
    retry_base_delay: Duration,
}

impl Warehouse {
    pub fn new(
        project: impl Into<String>,
        dataset: impl Into<String>,
        dataset_location: impl Into<String>,
        tokens: SharedTokenProvider,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: BIGQUERY_BASE_URL.to_string(),
            project: project.into(),
            dataset: dataset.into(),
            dataset_location: dataset_location.into(),
            tokens,
            retry_count: RETRY_COUNT,
            retry_base_delay: RETRY_BASE_DELAY,
        }
    }

    /// Test seam: point the adapter at a fake BigQuery endpoint.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    pub fn with_retry(mut self, count: u32, base_delay: Duration) -> Self {
        self.retry_count = count;
        self.retry_base_delay = base_delay;
        self
    }

    pub fn table_ref(&self, table: &str) -> String {
        format!("{}.{}.{}", self.project, self.dataset, table)
    }

    fn dataset_url(&self) -> String {
        format!("{}/projects/{}/datasets/{}", self.base_url, self.project, self.dataset)
    }

    fn tables_url(&self) -> String {
        format!("{}/tables", self.dataset_url())
    }

    async fn bearer(&self) -> Result<String, WarehouseError> {
        Ok(self.tokens.access_token().await?)
    }

    /// GET that maps 404 to `None` so ensure-ops can branch on absence.
    async fn get_optional(&self, url: &str, context: &str) -> Result<Option<Value>, WarehouseError> {
        let res = self
            .http
            .get(url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let status = res.status();
        if status == reqwest::StatusCode::NOT_FOUND {
            return Ok(None);
        }
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WarehouseError::Status {
                context: context.to_string(),
                status,
                body,
            });
        }
        Ok(Some(res.json().await?))
    }

    async fn post(&self, url: &str, body: &Value, context: &str) -> Result<Value, WarehouseError> {
        let res = self
            .http
            .post(url)
            .bearer_auth(self.bearer().await?)
            .json(body)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() {
            let body = res.text().await.unwrap_or_default();
            return Err(WarehouseError::Status {
                context: context.to_string(),
                status,
                body,
            });
        }
        Ok(res.json().await?)
    }

    /// Creates the dataset if it does not exist yet.
    pub async fn ensure_dataset(&self) -> Result<(), WarehouseError> {
        if self
            .get_optional(&self.dataset_url(), "get dataset")
            .await?
            .is_some()
        {
            return Ok(());
        }
        let url = format!("{}/projects/{}/datasets", self.base_url, self.project);
        let body = json!({
            "datasetReference": { "projectId": self.project, "datasetId": self.dataset },
            "location": self.dataset_location,
        });
        self.post(&url, &body, "create dataset").await?;
        info!(dataset = %self.dataset, "created dataset");
        Ok(())
    }

    /// Deletes the dataset and everything in it. Dry-run cleanup only.
    pub async fn drop_dataset(&self) -> Result<(), WarehouseError> {
        let url = format!("{}?deleteContents=true", self.dataset_url());
        let res = self
            .http
            .delete(&url)
            .bearer_auth(self.bearer().await?)
            .send()
            .await?;
        let status = res.status();
        if !status.is_success() && status != reqwest::StatusCode::NOT_FOUND {
            let body = res.text().await.unwrap_or_default();
            return Err(WarehouseError::Status {
                context: "delete dataset".to_string(),
                status,
                body,
            });
        }
        Ok(())
    }

    pub async fn table_or_view_exists(&self, name: &str) -> Result<bool, WarehouseError> {
        let url = format!("{}/{}", self.tables_url(), name);
        Ok(self.get_optional(&url, "get table").await?.is_some())
    }

    /// Creates `table` from its declared schema if absent.
    pub async fn ensure_table(&self, table: TableName) -> Result<(), WarehouseError> {
        self.ensure_dataset().await?;
        if self.table_or_view_exists(table.as_str()).await? {
            return Ok(());
        }

        let metadata = table_metadata(table);
        let mut body = json!({
            "tableReference": {
                "projectId": self.project,
                "datasetId": self.dataset,
                "tableId": table.as_str(),
            },
            "schema": { "fields": metadata.fields },
        });
        if metadata.partitioned {
            body["timePartitioning"] = json!({ "type": "DAY", "field": metadata.partition_column });
            body["requirePartitionFilter"] = json!(metadata.require_partition_filter);
        }
        self.post(&self.tables_url(), &body, "create table").await?;
        info!(table = %table, "created table");
        Ok(())
    }

    /// Creates `view` from its SQL body if absent.
    pub async fn ensure_view(&self, view: ViewName) -> Result<(), WarehouseError> {
        self.ensure_dataset().await?;
        if self.table_or_view_exists(view.as_str()).await? {
            return Ok(());
        }

        let body = json!({
            "tableReference": {
                "projectId": self.project,
                "datasetId": self.dataset,
                "tableId": view.as_str(),
            },
            "view": {
                "query": view_sql(view, &self.project, &self.dataset),
                "useLegacySql": false,
            },
        });
        self.post(&self.tables_url(), &body, "create view").await?;
        info!(view = %view, "created view");
        Ok(())
    }

    /// Streams `rows` into `table`. Not idempotent: callers pick the
    /// `createdAt` carried inside the rows when they want a fresh snapshot.
    /// "Table not found" right after creation is retried with exponential
    /// backoff; anything else fails immediately.
    pub async fn insert_rows<T: Serialize>(
        &self,
        table: TableName,
        rows: &[T],
    ) -> Result<(), WarehouseError> {
        if rows.is_empty() {
            return Ok(());
        }
        self.ensure_table(table).await?;

        let url = format!("{}/{}/insertAll", self.tables_url(), table.as_str());
        let body = json!({
            "rows": rows
                .iter()
                .map(|row| json!({ "json": row }))
                .collect::<Vec<Value>>(),
        });

        let mut delay = self.retry_base_delay;
        for attempt in 0..self.retry_count {
            let res = self
                .http
                .post(&url)
                .bearer_auth(self.bearer().await?)
                .json(&body)
                .send()
                .await?;
            let status = res.status();

            if status == reqwest::StatusCode::NOT_FOUND {
                warn!(
                    table = %table,
                    attempt = attempt + 1,
                    "table not found, retrying insert"
                );
                tokio::time::sleep(delay).await;
                delay *= 2;
                continue;
            }
            if !status.is_success() {
                let body = res.text().await.unwrap_or_default();
                return Err(WarehouseError::Status {
                    context: "insert rows".to_string(),
                    status,
                    body,
                });
            }

            let parsed: Value = res.json().await?;
            if let Some(errors) = parsed.get("insertErrors").filter(|e| !e.is_null()) {
                warn!(table = %table, %errors, "errors occurred while inserting data");
            } else {
                info!(table = %table, rows = rows.len(), "rows inserted");
            }
            return Ok(());
        }

        Err(WarehouseError::Unavailable(format!(
            "insert into {} failed: table not found after {} attempts",
            self.table_ref(table.as_str()),
            self.retry_count,
        )))
    }

    async fn query(&self, sql: String, table: &str) -> Result<Vec<Value>, WarehouseError> {
        let url = format!("{}/projects/{}/queries", self.base_url, self.project);
        let body = json!({ "query": sql, "useLegacySql": false });
        let raw = self.post(&url, &body, "query").await?;
        let response: QueryResponse =
            serde_json::from_value(raw).map_err(|e| WarehouseError::Decode {
                table: table.to_string(),
                message: e.to_string(),
            })?;
        if response.job_complete == Some(false) {
            return Err(WarehouseError::Unavailable(format!(
                "query against {table} did not complete synchronously"
            )));
        }
        decode_response(&response).map_err(|message| WarehouseError::Decode {
            table: table.to_string(),
            message,
        })
    }

    async fn query_rows<T: DeserializeOwned>(
        &self,
        sql: String,
        table: &str,
    ) -> Result<Vec<T>, WarehouseError> {
        self.query(sql, table)
            .await?
            .into_iter()
            .map(|row| {
                serde_json::from_value(row).map_err(|e| WarehouseError::Decode {
                    table: table.to_string(),
                    message: e.to_string(),
                })
            })
            .collect()
    }

    /// The most recent snapshot date of `table` that is not in the future.
    /// An empty table means the upstream stage has not run yet.
    pub async fn latest_partition_date(&self, table: &str) -> Result<NaiveDate, WarehouseError> {
        let sql = format!(
            "SELECT max({PARTITION_COLUMN}) AS maxDate \
             FROM `{}` WHERE {PARTITION_COLUMN} <= CURRENT_DATE()",
            self.table_ref(table),
        );
        let rows = self.query(sql, table).await?;
        let value = rows.first().and_then(|row| row.get("maxDate")).cloned();
        match value {
            Some(Value::String(date)) => {
                date.parse::<NaiveDate>().map_err(|e| WarehouseError::Decode {
                    table: table.to_string(),
                    message: format!("bad partition date {date}: {e}"),
                })
            }
            _ => Err(WarehouseError::NoDataYet(self.table_ref(table))),
        }
    }

    /// Distinct project ids from the latest `projects` snapshot.
    pub async fn project_ids_to_fetch(&self) -> Result<Vec<String>, WarehouseError> {
        let table = TableName::Projects.as_str();
        let date = self.latest_partition_date(table).await?;
        let sql = format!(
            "SELECT DISTINCT projectId FROM `{}` WHERE {PARTITION_COLUMN} = \"{date}\"",
            self.table_ref(table),
        );
        let rows = self.query(sql, table).await?;
        Ok(rows
            .into_iter()
            .filter_map(|row| row.get("projectId").and_then(Value::as_str).map(String::from))
            .collect())
    }

    /// Full latest snapshot of the entry groups table.
    pub async fn latest_entry_groups(
        &self,
    ) -> Result<(Vec<EntryGroupRow>, NaiveDate), WarehouseError> {
        let table = TableName::EntryGroups.as_str();
        let date = self.latest_partition_date(table).await?;
        let sql = format!(
            "SELECT * FROM `{}` WHERE {PARTITION_COLUMN} = \"{date}\"",
            self.table_ref(table),
        );
        Ok((self.query_rows(sql, table).await?, date))
    }

    /// Full latest snapshot of the tag templates table.
    pub async fn latest_tag_templates(
        &self,
    ) -> Result<(Vec<TagTemplateRow>, NaiveDate), WarehouseError> {
        let table = TableName::TagTemplates.as_str();
        let date = self.latest_partition_date(table).await?;
        let sql = format!(
            "SELECT * FROM `{}` WHERE {PARTITION_COLUMN} = \"{date}\"",
            self.table_ref(table),
        );
        Ok((self.query_rows(sql, table).await?, date))
    }

    /// Ancestry predicate for a scope, applied to the aliased `projects`
    /// snapshot. Project scopes match on the project number; organization and
    /// folder scopes search the ancestry chain.
    fn scope_predicate(scope: &Scope) -> String {
        match scope.kind {
            ScopeKind::Project => format!("pr.projectNumber = {}", scope.id),
            ScopeKind::Organization => format!(
                "EXISTS (SELECT 1 FROM UNNEST(pr.ancestry) AS ancestor \
                 WHERE ancestor.type = \"ORGANIZATION\" AND ancestor.id = \"{}\")",
                scope.id
            ),
            ScopeKind::Folder => format!(
                "EXISTS (SELECT 1 FROM UNNEST(pr.ancestry) AS ancestor \
                 WHERE ancestor.type = \"FOLDER\" AND ancestor.id = \"{}\")",
                scope.id
            ),
        }
    }

    fn systems_predicate(systems: &[ManagingSystem]) -> String {
        let quoted: Vec<String> = systems.iter().map(|s| format!("\"{s}\"")).collect();
        format!("v.managingSystem IN ({})", quoted.join(", "))
    }

    async fn scoped_view_query<T: DeserializeOwned>(
        &self,
        view: ViewName,
        columns: &str,
        extra_predicate: Option<&str>,
        scope: &Scope,
    ) -> Result<(Vec<T>, NaiveDate), WarehouseError> {
        let view_date = self.latest_partition_date(view.as_str()).await?;
        let projects_date = self
            .latest_partition_date(TableName::Projects.as_str())
            .await?;

        let mut sql = format!(
            "SELECT {columns} \
             FROM `{view_ref}` AS v \
             JOIN `{projects_ref}` AS pr ON v.projectId = pr.projectId \
             WHERE v.{PARTITION_COLUMN} = \"{view_date}\" \
             AND pr.{PARTITION_COLUMN} = \"{projects_date}\" \
             AND {scope_predicate}",
            view_ref = self.table_ref(view.as_str()),
            projects_ref = self.table_ref(TableName::Projects.as_str()),
            scope_predicate = Self::scope_predicate(scope),
        );
        if let Some(predicate) = extra_predicate {
            sql.push_str(" AND ");
            sql.push_str(predicate);
        }

        Ok((self.query_rows(sql, view.as_str()).await?, view_date))
    }

    /// Entry groups from the join view, limited to `scope` and the given
    /// managing systems.
    pub async fn entry_groups_within_scope(
        &self,
        scope: &Scope,
        systems: &[ManagingSystem],
    ) -> Result<(Vec<EntryGroupRow>, NaiveDate), WarehouseError> {
        let systems = Self::systems_predicate(systems);
        self.scoped_view_query(
            ViewName::EntryGroups,
            "v.resourceName, v.dataplexResourceName, v.projectId, v.location, \
             v.entryGroupId, v.managingSystem, v.createdAt",
            Some(&systems),
            scope,
        )
        .await
    }

    /// Tag templates from the join view, limited to `scope` and the given
    /// managing systems.
    pub async fn tag_templates_within_scope(
        &self,
        scope: &Scope,
        systems: &[ManagingSystem],
    ) -> Result<(Vec<TagTemplateRow>, NaiveDate), WarehouseError> {
        let systems = Self::systems_predicate(systems);
        self.scoped_view_query(
            ViewName::TagTemplates,
            "v.resourceName, v.dataplexResourceName, v.projectId, v.location, \
             v.tagTemplateId, v.managingSystem, v.isPubliclyReadable, v.createdAt",
            Some(&systems),
            scope,
        )
        .await
    }

    /// Private tag templates within `scope`, from the latest snapshot.
    pub async fn private_tag_templates(
        &self,
        scope: &Scope,
    ) -> Result<(Vec<TagTemplateRow>, NaiveDate), WarehouseError> {
        self.scoped_view_query(
            ViewName::TagTemplates,
            "v.resourceName, v.dataplexResourceName, v.projectId, v.location, \
             v.tagTemplateId, v.managingSystem, v.isPubliclyReadable, v.createdAt",
            Some("IFNULL(v.isPubliclyReadable, FALSE) = FALSE"),
            scope,
        )
        .await
    }
}
