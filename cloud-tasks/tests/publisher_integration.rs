use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use transfer_catalog_clients::ResourceManagerClient;
use transfer_cloud_tasks::QueueError;
use transfer_cloud_tasks::TaskPublisher;
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

async fn publisher(tasks: &MockServer, resource_manager: &MockServer) -> TaskPublisher {
    Mock::given(method("GET"))
        .and(path("/v1/projects/prj1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "projectId": "prj1",
            "projectNumber": "123",
        })))
        .mount(resource_manager)
        .await;

    TaskPublisher::new("prj1", "us-central1", "iam-discovery", 60, tokens())
        .with_base_url(tasks.uri())
        .with_resource_manager(
            ResourceManagerClient::new(tokens()).with_base_url(resource_manager.uri()),
        )
        .with_warmup(Duration::ZERO)
}

#[tokio::test]
async fn create_task_posts_authenticated_http_target() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery/tasks",
        ))
        .and(body_partial_json(json!({
            "task": { "httpRequest": {
                "httpMethod": "POST",
                "url": "https://fetch-policies-handler-123.us-central1.run.app",
                "headers": {
                    "Content-Type": "application/json",
                    "Authorization": "Bearer test-token",
                },
            }},
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    publisher
        .create_task(
            &json!({ "resource_type": "EntryGroup" }),
            "fetch-policies-handler",
            "prj1",
            "us-central1",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn region_tasks_land_on_the_region_subqueue() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("POST"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery-us-west1/tasks",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    publisher
        .create_task_in_region(
            "us-west1",
            &json!({ "resource_type": "EntryGroup" }),
            "fetch-policies-handler",
            "prj1",
            "us-central1",
        )
        .await
        .unwrap();
}

#[tokio::test]
async fn duplicate_task_ids_are_idempotent_success() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(409).set_body_string("task already exists"))
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    publisher
        .create_task(&json!({}), "handler", "prj1", "us-central1")
        .await
        .unwrap();
}

#[tokio::test]
async fn missing_queue_surfaces_not_found() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(404).set_body_string("queue not found"))
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    let err = publisher
        .create_task(&json!({}), "handler", "prj1", "us-central1")
        .await
        .unwrap_err();
    assert!(matches!(err, QueueError::NotFound(_)), "got {err}");
}

#[tokio::test]
async fn prepare_region_queues_purges_existing_and_creates_missing() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    // us-west1 exists and gets purged; eu is created with the quota share.
    Mock::given(method("GET"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery-us-west1",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .mount(&tasks)
        .await;
    Mock::given(method("POST"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery-us-west1:purge",
        ))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&tasks)
        .await;
    Mock::given(method("GET"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery-eu",
        ))
        .respond_with(ResponseTemplate::new(404))
        .mount(&tasks)
        .await;
    Mock::given(method("POST"))
        .and(path("/v2/projects/prj1/locations/us-central1/queues"))
        .and(body_partial_json(json!({
            "name": "projects/prj1/locations/us-central1/queues/iam-discovery-eu",
            "rateLimits": { "maxDispatchesPerSecond": 2 },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    publisher
        .prepare_region_queues(&["us-west1".to_string(), "eu".to_string()], 10, 20)
        .await
        .unwrap();
}

#[tokio::test]
async fn quota_exhaustion_maps_to_quota_exceeded() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("GET"))
        .respond_with(ResponseTemplate::new(404))
        .mount(&tasks)
        .await;
    Mock::given(method("POST"))
        .respond_with(ResponseTemplate::new(429).set_body_string("too many queues"))
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    let err = publisher.ensure_base_queue().await.unwrap_err();
    assert!(matches!(err, QueueError::QuotaExceeded(_)), "got {err}");
}

#[tokio::test]
async fn update_queue_patches_the_dispatch_rate_in_place() {
    let tasks = MockServer::start().await;
    let resource_manager = MockServer::start().await;

    Mock::given(method("PATCH"))
        .and(path(
            "/v2/projects/prj1/locations/us-central1/queues/iam-discovery-eu",
        ))
        .and(query_param("updateMask", "rateLimits.maxDispatchesPerSecond"))
        .and(body_partial_json(json!({
            "rateLimits": { "maxDispatchesPerSecond": 7 },
        })))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({})))
        .expect(1)
        .mount(&tasks)
        .await;

    let publisher = publisher(&tasks, &resource_manager).await;
    publisher.update_queue(Some("eu"), 7).await.unwrap();
}
