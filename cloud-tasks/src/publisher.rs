use std::time::Duration;

use base64::Engine;
use base64::engine::general_purpose::STANDARD as BASE64;
use serde::Serialize;
use serde_json::Value;
use serde_json::json;
use tracing::info;

use transfer_catalog_clients::ResourceManagerClient;
use transfer_gcp_auth::SharedTokenProvider;

use crate::error::QueueError;

const CLOUD_TASKS_BASE_URL: &str = "https://cloudtasks.googleapis.com";

/// Freshly created queues reject dispatches for a while; give them time
/// before the first enqueue lands.
pub const QUEUE_WARMUP: Duration = Duration::from_secs(60);

/// Region subqueues hang the region off the base name, so one queue maps to
/// one per-region quota bucket.
pub fn subqueue_name(base: &str, region: &str) -> String {
    format!("{base}-{region}")
}

/// Publisher for one base queue (plus its region subqueues) in one project
/// and location.
pub struct TaskPublisher {
    http: reqwest::Client,
    base_url: String,
    tokens: SharedTokenProvider,
    resource_manager: ResourceManagerClient,
    project: String,
    location: String,
    queue_name: String,
    max_rps: u32,
    warmup: Duration,
}

impl TaskPublisher {
    pub fn new(
        project: impl Into<String>,
        location: impl Into<String>,
        queue_name: impl Into<String>,
        max_rps: u32,
        tokens: SharedTokenProvider,
    ) -> Self {
        Self {
            http: reqwest::Client::new(),
            base_url: CLOUD_TASKS_BASE_URL.to_string(),
            resource_manager: ResourceManagerClient::new(tokens.clone()),
            tokens,
            project: project.into(),
            location: location.into(),
            queue_name: queue_name.into(),
            max_rps,
            warmup: QUEUE_WARMUP,
        }
    }

    /// Test seams: fake Cloud Tasks endpoint, fake Resource Manager, no
    /// warm-up delay.
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        let mut base_url = base_url.into();
        while base_url.ends_with('/') {
            base_url.pop();
        }
        self.base_url = base_url;
        self
    }

    pub fn with_resource_manager(mut self, resource_manager: ResourceManagerClient) -> Self {
        self.resource_manager = resource_manager;
        self
    }

    pub fn with_warmup(mut self, warmup: Duration) -> Self {
        self.warmup = warmup;
        self
    }

    fn queue_id(&self, region: Option<&str>) -> String {
        match region {
            Some(region) => subqueue_name(&self.queue_name, region),
            None => self.queue_name.clone(),
        }
    }

    fn queue_fqn(&self, region: Option<&str>) -> String {
        format!(
            "projects/{}/locations/{}/queues/{}",
            self.project,
            self.location,
            self.queue_id(region),
        )
    }

    async fn send(
        &self,
        req: reqwest::RequestBuilder,
        context: &str,
    ) -> Result<reqwest::Response, QueueError> {
        let token = self.tokens.access_token().await?;
        let res = req.bearer_auth(token).send().await?;
        let status = res.status();
        if status.is_success() {
            return Ok(res);
        }
        let body = res.text().await.unwrap_or_default();
        Err(match status {
            reqwest::StatusCode::NOT_FOUND => QueueError::NotFound(format!("{context}: {body}")),
            reqwest::StatusCode::FORBIDDEN => {
                QueueError::PermissionDenied(format!("{context}: {body}"))
            }
            reqwest::StatusCode::TOO_MANY_REQUESTS => {
                QueueError::QuotaExceeded(format!("{context}: {body}"))
            }
            _ => QueueError::Status {
                context: context.to_string(),
                status,
                body,
            },
        })
    }

    pub async fn queue_exists(&self, region: Option<&str>) -> Result<bool, QueueError> {
        let url = format!("{}/v2/{}", self.base_url, self.queue_fqn(region));
        match self.send(self.http.get(&url), "get queue").await {
            Ok(_) => Ok(true),
            Err(QueueError::NotFound(_)) => Ok(false),
            Err(err) => Err(err),
        }
    }

    /// Creates a queue with the given dispatch rate, then waits out the
    /// warm-up window before anyone may enqueue to it.
    pub async fn create_queue(&self, region: Option<&str>, rps: u32) -> Result<(), QueueError> {
        let parent = format!("projects/{}/locations/{}", self.project, self.location);
        let url = format!("{}/v2/{parent}/queues", self.base_url);
        let fqn = self.queue_fqn(region);
        let body = json!({
            "name": fqn,
            "rateLimits": { "maxDispatchesPerSecond": rps },
        });
        self.send(self.http.post(&url).json(&body), "create queue").await?;
        info!(queue = %fqn, rps, "created queue");
        tokio::time::sleep(self.warmup).await;
        Ok(())
    }

    /// Changes the dispatch rate of an existing queue in place.
    pub async fn update_queue(&self, region: Option<&str>, rps: u32) -> Result<(), QueueError> {
        let fqn = self.queue_fqn(region);
        let url = format!("{}/v2/{fqn}", self.base_url);
        let body = json!({
            "name": fqn,
            "rateLimits": { "maxDispatchesPerSecond": rps },
        });
        self.send(
            self.http
                .patch(&url)
                .query(&[("updateMask", "rateLimits.maxDispatchesPerSecond")])
                .json(&body),
            "update queue",
        )
        .await?;
        Ok(())
    }

    /// Drops every pending task; the queue itself stays.
    pub async fn purge_queue(&self, region: Option<&str>) -> Result<(), QueueError> {
        let fqn = self.queue_fqn(region);
        let url = format!("{}/v2/{fqn}:purge", self.base_url);
        self.send(self.http.post(&url).json(&json!({})), "purge queue").await?;
        info!(queue = %fqn, "purged queue");
        Ok(())
    }

    /// Creates the base queue with the publisher's own rate if absent.
    pub async fn ensure_base_queue(&self) -> Result<(), QueueError> {
        if !self.queue_exists(None).await? {
            self.create_queue(None, self.max_rps).await?;
        }
        Ok(())
    }

    /// One subqueue per region: purge survivors from earlier runs, create
    /// missing ones with `ceil(quota · percent / 100)` dispatches per second.
    pub async fn prepare_region_queues(
        &self,
        regions: &[String],
        quota_rps: u32,
        quota_percent: u8,
    ) -> Result<(), QueueError> {
        let rps = quota_share(quota_rps, quota_percent);
        for region in regions {
            if self.queue_exists(Some(region)).await? {
                self.purge_queue(Some(region)).await?;
            } else {
                self.create_queue(Some(region), rps).await?;
            }
        }
        Ok(())
    }

    fn service_url(&self, service_name: &str, project_number: i64, location: &str) -> String {
        format!("https://{service_name}-{project_number}.{location}.run.app")
    }

    async fn create_task_in_queue(
        &self,
        region: Option<&str>,
        payload: &impl Serialize,
        service_name: &str,
        target_project: &str,
        target_location: &str,
    ) -> Result<(), QueueError> {
        let project_number = self.resource_manager.project_number(target_project).await?;
        let target_url = self.service_url(service_name, project_number, target_location);
        let id_token = self.tokens.identity_token(&target_url).await?;

        let body = serde_json::to_vec(payload).map_err(|e| QueueError::Status {
            context: "encode task payload".to_string(),
            status: reqwest::StatusCode::INTERNAL_SERVER_ERROR,
            body: e.to_string(),
        })?;

        let fqn = self.queue_fqn(region);
        let url = format!("{}/v2/{fqn}/tasks", self.base_url);
        let request: Value = json!({
            "task": {
                "httpRequest": {
                    "httpMethod": "POST",
                    "url": target_url,
                    "headers": {
                        "Content-Type": "application/json",
                        "Authorization": format!("Bearer {id_token}"),
                    },
                    "body": BASE64.encode(&body),
                },
            },
        });

        match self.send(self.http.post(&url).json(&request), "create task").await {
            Ok(_) => Ok(()),
            // Duplicate task id: the work is already queued.
            Err(QueueError::Status { status, .. }) if status == reqwest::StatusCode::CONFLICT => {
                info!(queue = %fqn, "task already exists, skipping");
                Ok(())
            }
            Err(err) => Err(err),
        }
    }

    /// Enqueues onto the base queue.
    pub async fn create_task(
        &self,
        payload: &impl Serialize,
        service_name: &str,
        target_project: &str,
        target_location: &str,
    ) -> Result<(), QueueError> {
        self.create_task_in_queue(None, payload, service_name, target_project, target_location)
            .await
    }

    /// Enqueues onto the `<base>-<region>` subqueue. The delivery target is
    /// unchanged; only the rate bucket differs.
    pub async fn create_task_in_region(
        &self,
        message_region: &str,
        payload: &impl Serialize,
        service_name: &str,
        target_project: &str,
        target_location: &str,
    ) -> Result<(), QueueError> {
        self.create_task_in_queue(
            Some(message_region),
            payload,
            service_name,
            target_project,
            target_location,
        )
        .await
    }
}

fn quota_share(quota_rps: u32, percent: u8) -> u32 {
    let scaled = u64::from(quota_rps) * u64::from(percent);
    (scaled.div_ceil(100)).max(1) as u32
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn subqueue_names_are_deterministic() {
        assert_eq!(subqueue_name("iam-discovery", "us-west1"), "iam-discovery-us-west1");
    }

    #[test]
    fn quota_share_rounds_up_and_never_hits_zero() {
        assert_eq!(quota_share(10, 20), 2);
        assert_eq!(quota_share(10, 25), 3);
        assert_eq!(quota_share(1, 1), 1);
        assert_eq!(quota_share(0, 50), 1);
        assert_eq!(quota_share(100, 100), 100);
    }
}
