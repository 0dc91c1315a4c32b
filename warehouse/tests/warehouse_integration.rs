use std::sync::Arc;
use std::time::Duration;

use chrono::NaiveDate;
use pretty_assertions::assert_eq;
use serde_json::json;
use transfer_entities::EntryGroup;
use transfer_entities::ManagingSystem;
use transfer_entities::Scope;
use transfer_entities::ScopeKind;
use transfer_gcp_auth::StaticTokenProvider;
use transfer_warehouse::EntryGroupRow;
use transfer_warehouse::TableName;
use transfer_warehouse::Warehouse;
use transfer_warehouse::WarehouseError;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::Request;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::header;
use wiremock::matchers::method;
use wiremock::matchers::path;

fn warehouse(server: &MockServer) -> Warehouse {
    Warehouse::new(
        "prj1",
        "transfer_tooling",
        "US",
        Arc::new(StaticTokenProvider::new("test-token")),
    )
    .with_base_url(server.uri())
    .with_retry(3, Duration::from_millis(1))
}

fn date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2025, 3, 1).unwrap()
}

#[tokio::test]
async fn ensure_table_creates_partitioned_table_when_absent() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/prj1/datasets/transfer_tooling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/projects/prj1/datasets/transfer_tooling/tables/projects"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path("/projects/prj1/datasets/transfer_tooling/tables"))
        .and(header("authorization", "Bearer test-token"))
        .and(body_partial_json(json!({
            "tableReference": { "tableId": "projects" },
            "timePartitioning": { "type": "DAY", "field": "createdAt" },
            "requirePartitionFilter": true,
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    warehouse(&server).ensure_table(TableName::Projects).await.unwrap();
}

#[tokio::test]
async fn insert_rows_retries_table_not_found_then_gives_up() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .and(path("/projects/prj1/datasets/transfer_tooling"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/projects/prj1/datasets/transfer_tooling/tables/entry_groups_table",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/projects/prj1/datasets/transfer_tooling/tables/entry_groups_table/insertAll",
        ))
        .respond_with(ResponseTemplate::new(404))
        .expect(3)
        .mount(&server)
        .await;

    let row = EntryGroupRow::from_entry_group(&EntryGroup::new("prj1", "us-west1", "eg1", false), date());
    let err = warehouse(&server)
        .insert_rows(TableName::EntryGroups, &[row])
        .await
        .unwrap_err();
    assert!(matches!(err, WarehouseError::Unavailable(_)), "got {err}");
}

#[tokio::test]
async fn insert_rows_sends_row_payloads() {
    let server = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&server)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/projects/prj1/datasets/transfer_tooling/tables/entry_groups_table/insertAll",
        ))
        .and(body_partial_json(json!({
            "rows": [{ "json": {
                "resourceName": "projects/prj1/locations/us-west1/entryGroups/eg1",
                "entryGroupId": "eg1",
                "managingSystem": "DATA_CATALOG",
                "createdAt": "2025-03-01",
            }}],
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let row = EntryGroupRow::from_entry_group(&EntryGroup::new("prj1", "us-west1", "eg1", false), date());
    warehouse(&server)
        .insert_rows(TableName::EntryGroups, &[row])
        .await
        .unwrap();
}

#[tokio::test]
async fn latest_partition_date_maps_empty_table_to_no_data_yet() {
    let server = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path("/projects/prj1/queries"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": true,
            "schema": { "fields": [ { "name": "maxDate", "type": "DATE" } ] },
            "rows": [ { "f": [ { "v": null } ] } ],
        })))
        .mount(&server)
        .await;

    let err = warehouse(&server)
        .latest_partition_date("projects")
        .await
        .unwrap_err();
    assert!(matches!(err, WarehouseError::NoDataYet(_)), "got {err}");
}

#[tokio::test]
async fn scoped_select_joins_projects_and_decodes_rows() {
    let server = MockServer::start().await;

    let respond = move |req: &Request| {
        let body: serde_json::Value = serde_json::from_slice(&req.body).unwrap();
        let sql = body["query"].as_str().unwrap_or_default();
        if sql.contains("SELECT max(createdAt)") {
            return ResponseTemplate::new(200).set_body_json(json!({
                "jobComplete": true,
                "schema": { "fields": [ { "name": "maxDate", "type": "DATE" } ] },
                "rows": [ { "f": [ { "v": "2025-03-01" } ] } ],
            }));
        }
        assert!(sql.contains("JOIN `prj1.transfer_tooling.projects` AS pr"), "sql: {sql}");
        assert!(
            sql.contains("ancestor.type = \"ORGANIZATION\" AND ancestor.id = \"1\""),
            "sql: {sql}"
        );
        assert!(sql.contains("v.managingSystem IN (\"DATAPLEX\")"), "sql: {sql}");
        assert!(sql.contains("v.createdAt = \"2025-03-01\""), "sql: {sql}");
        ResponseTemplate::new(200).set_body_json(json!({
            "jobComplete": true,
            "schema": { "fields": [
                { "name": "resourceName", "type": "STRING" },
                { "name": "dataplexResourceName", "type": "STRING" },
                { "name": "projectId", "type": "STRING" },
                { "name": "location", "type": "STRING" },
                { "name": "entryGroupId", "type": "STRING" },
                { "name": "managingSystem", "type": "STRING" },
                { "name": "createdAt", "type": "DATE" },
            ]},
            "rows": [ { "f": [
                { "v": "projects/prj2/locations/us-west1/entryGroups/eg1" },
                { "v": null },
                { "v": "prj2" },
                { "v": "us-west1" },
                { "v": "eg1" },
                { "v": "DATAPLEX" },
                { "v": "2025-03-01" },
            ]}],
        }))
    };

    Mock::given(method("POST"))
        .and(path("/projects/prj1/queries"))
        .respond_with(respond)
        .mount(&server)
        .await;

    let scope = Scope {
        kind: ScopeKind::Organization,
        id: "1".to_string(),
    };
    let (rows, snapshot_date) = warehouse(&server)
        .entry_groups_within_scope(&scope, &[ManagingSystem::Dataplex])
        .await
        .unwrap();
    assert_eq!(snapshot_date, date());
    assert_eq!(rows.len(), 1);
    assert_eq!(rows[0].entry_group_id, "eg1");
    assert_eq!(rows[0].dataplex_resource_name, None);
    assert_eq!(rows[0].managing_system, ManagingSystem::Dataplex);
}

#[tokio::test]
async fn drop_dataset_deletes_contents_and_tolerates_absence() {
    let server = MockServer::start().await;
    Mock::given(method("DELETE"))
        .and(path("/projects/prj1/datasets/transfer_tooling"))
        .respond_with(ResponseTemplate::new(404))
        .expect(1)
        .mount(&server)
        .await;

    warehouse(&server).drop_dataset().await.unwrap();
}
