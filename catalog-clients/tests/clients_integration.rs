use std::sync::Arc;

use pretty_assertions::assert_eq;
use serde_json::json;
use transfer_catalog_clients::ApiError;
use transfer_catalog_clients::DataCatalogClient;
use transfer_catalog_clients::DataplexClient;
use transfer_catalog_clients::LoggingClient;
use transfer_catalog_clients::QuotasClient;
use transfer_catalog_clients::ResourceManagerClient;
use transfer_entities::AncestryKind;
use transfer_entities::ManagingSystem;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_gcp_auth::StaticTokenProvider;
use wiremock::Mock;
use wiremock::MockServer;
use wiremock::ResponseTemplate;
use wiremock::matchers::body_partial_json;
use wiremock::matchers::method;
use wiremock::matchers::path;
use wiremock::matchers::query_param;

fn tokens() -> SharedTokenProvider {
    Arc::new(StaticTokenProvider::new("test-token"))
}

#[tokio::test]
async fn search_entry_groups_builds_filters_and_projects_results() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/catalog:search"))
        .and(body_partial_json(json!({
            "scope": { "includeProjectIds": ["prj1"] },
            "query": "type=entry_group AND -transferred=transferred",
            "adminSearch": true,
            "orderBy": "default",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [
                {
                    "searchResultType": "ENTRY_GROUP",
                    "relativeResourceName": "projects/prj1/locations/us-west1/entryGroups/eg1",
                },
                {
                    "searchResultType": "ENTRY_GROUP",
                    "relativeResourceName": "projects/prj1/locations/eu/entryGroups/eg2",
                },
            ],
            "nextPageToken": "T",
        })))
        .mount(&server)
        .await;

    let client = DataCatalogClient::new(tokens()).with_base_url(server.uri());
    let page = client
        .search_entry_groups(&["prj1".to_string()], false, None)
        .await
        .unwrap();
    assert_eq!(page.items.len(), 2);
    assert_eq!(page.items[0].id, "eg1");
    assert_eq!(page.items[0].managing_system, ManagingSystem::DataCatalog);
    assert_eq!(page.next_page_token.as_deref(), Some("T"));
}

#[tokio::test]
async fn search_tag_templates_requests_visibility_filter() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/catalog:search"))
        .and(body_partial_json(json!({
            "query": "type=tag_template AND transferred=transferred AND is_public_tag_template=false",
            "pageToken": "T",
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "results": [{
                "searchResultType": "TAG_TEMPLATE",
                "relativeResourceName": "projects/prj1/locations/eu/tagTemplates/tt1",
            }],
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = DataCatalogClient::new(tokens()).with_base_url(server.uri());
    let page = client
        .search_tag_templates(&["prj1".to_string()], false, true, Some("T"))
        .await
        .unwrap();
    assert_eq!(page.items[0].managing_system, ManagingSystem::Dataplex);
    assert!(!page.items[0].public);
    assert_eq!(page.next_page_token, None);
}

#[tokio::test]
async fn transfer_uses_field_mask_patch() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .and(path("/v1/projects/prj1/locations/eu/tagTemplates/tt1"))
        .and(query_param("updateMask", "dataplexTransferStatus"))
        .and(body_partial_json(json!({ "dataplexTransferStatus": "TRANSFERRED" })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&server)
        .await;

    let client = DataCatalogClient::new(tokens()).with_base_url(server.uri());
    client
        .transfer_tag_template("projects/prj1/locations/eu/tagTemplates/tt1")
        .await
        .unwrap();
}

#[tokio::test]
async fn transfer_maps_client_errors() {
    let server = MockServer::start().await;
    Mock::given(method("PATCH"))
        .respond_with(ResponseTemplate::new(400).set_body_string("already transferred"))
        .mount(&server)
        .await;

    let client = DataCatalogClient::new(tokens()).with_base_url(server.uri());
    let err = client
        .transfer_entry_group("projects/prj1/locations/eu/entryGroups/eg1")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::InvalidArgument(_)), "got {err}");
}

#[tokio::test]
async fn dataplex_probe_distinguishes_absent_from_unconfirmed() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/prj1/locations/us-west1/entryGroups/eg1"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/prj1/locations/us-west1/entryGroups/eg1_us-west1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "projects/prj1/locations/us-west1/entryGroups/eg1_us-west1",
            "transferStatus": "TRANSFERRED",
        })))
        .mount(&server)
        .await;

    let client = DataplexClient::new(tokens()).with_base_url(server.uri());
    let absent = client
        .get_entry_group("projects/prj1/locations/us-west1/entryGroups/eg1")
        .await
        .unwrap();
    assert_eq!(absent, None);

    let present = client
        .get_entry_group("projects/prj1/locations/us-west1/entryGroups/eg1_us-west1")
        .await
        .unwrap()
        .unwrap();
    assert!(present.is_confirmed());
}

#[tokio::test]
async fn ancestry_is_ordered_and_typed() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v1/projects/prj1:getAncestry"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ancestor": [
                { "resourceId": { "type": "project", "id": "prj1" } },
                { "resourceId": { "type": "folder", "id": "77" } },
                { "resourceId": { "type": "organization", "id": "123" } },
            ],
        })))
        .mount(&server)
        .await;

    let client = ResourceManagerClient::new(tokens()).with_base_url(server.uri());
    let ancestry = client.project_ancestry("prj1").await.unwrap();
    assert_eq!(ancestry.len(), 2);
    assert_eq!(ancestry[0].kind, AncestryKind::Folder);
    assert_eq!(ancestry[1].kind, AncestryKind::Organization);
    assert_eq!(client.organization_number("prj1").await.unwrap().as_deref(), Some("123"));
}

#[tokio::test]
async fn unknown_ancestor_kind_is_a_format_fault() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "ancestor": [ { "resourceId": { "type": "galaxy", "id": "9" } } ],
        })))
        .mount(&server)
        .await;

    let client = ResourceManagerClient::new(tokens()).with_base_url(server.uri());
    let err = client.project_ancestry("prj1").await.unwrap_err();
    assert!(matches!(err, ApiError::Format(_)), "got {err}");
}

#[tokio::test]
async fn project_number_is_cached() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path("/v1/projects/prj1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectId": "prj1",
            "projectNumber": "123",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let client = ResourceManagerClient::new(tokens()).with_base_url(server.uri());
    assert_eq!(client.project_number("prj1").await.unwrap(), 123);
    assert_eq!(client.project_number("prj1").await.unwrap(), 123);
}

#[tokio::test]
async fn quota_value_is_min_over_dimensions_per_second() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .and(path(
            "/v1/projects/prj1/locations/global/services/dataplex.googleapis.com/quotaInfos/DefaultIamPolicyRequestsPerMinutePerProjectPerRegion",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "dimensionsInfos": [
                { "details": { "value": 600 } },
                { "details": { "value": "300" } },
            ],
        })))
        .mount(&server)
        .await;

    let client = QuotasClient::new(tokens()).with_base_url(server.uri());
    let value = client
        .default_quota_value(
            "prj1",
            "dataplex.googleapis.com",
            "DefaultIamPolicyRequestsPerMinutePerProjectPerRegion",
        )
        .await
        .unwrap();
    assert_eq!(value, Some(5));
}

#[tokio::test]
async fn missing_quota_degrades_to_none() {
    let server = MockServer::start().await;
    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&server)
        .await;

    let client = QuotasClient::new(tokens()).with_base_url(server.uri());
    let value = client
        .default_quota_value("prj1", "dataplex.googleapis.com", "Nope")
        .await
        .unwrap();
    assert_eq!(value, None);
}

#[tokio::test]
async fn sink_creation_handles_already_exists() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/v2/projects/prj1/sinks"))
        .and(query_param("uniqueWriterIdentity", "true"))
        .respond_with(ResponseTemplate::new(409).set_body_string("already exists"))
        .mount(&server)
        .await;
    Mock::given(method("GET"))
        .and(path("/v2/projects/prj1/sinks/audit-sink"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "name": "audit-sink",
            "destination": "bigquery.googleapis.com/projects/prj1/datasets/transfer_tooling",
            "writerIdentity": "serviceAccount:sink@logging.iam.gserviceaccount.com",
        })))
        .mount(&server)
        .await;

    let client = LoggingClient::new(tokens()).with_base_url(server.uri());
    let sink = client
        .create_sink("prj1", "audit-sink", "transfer_tooling", "logName:data_access")
        .await
        .unwrap();
    assert_eq!(sink.name, "audit-sink");
    assert!(sink.writer_identity.is_some());
}
