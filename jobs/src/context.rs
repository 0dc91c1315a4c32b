use std::sync::Arc;
use std::time::Duration;

use transfer_catalog_clients::CloudAssetClient;
use transfer_catalog_clients::QuotasClient;
use transfer_catalog_clients::ResourceManagerClient;
use transfer_cloud_tasks::QUEUE_WARMUP;
use transfer_cloud_tasks::TaskPublisher;
use transfer_common::CommonArgs;
use transfer_common::ServiceArgs;
use transfer_gcp_auth::MetadataTokenProvider;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_warehouse::Warehouse;

/// Base dispatch rate of queues whose stage has no quota-derived rate.
const DEFAULT_QUEUE_RPS: u32 = 2;

/// Upstream base-URL overrides. Empty in production; tests point individual
/// services at fakes.
#[derive(Clone, Debug, Default)]
pub struct Endpoints {
    pub bigquery: Option<String>,
    pub cloud_tasks: Option<String>,
    pub resource_manager: Option<String>,
    pub cloud_asset: Option<String>,
    pub cloud_quotas: Option<String>,
}

/// Clients a controller run needs, wired from the CLI arguments.
pub struct JobContext {
    pub tokens: SharedTokenProvider,
    pub project: String,
    pub service_location: String,
    pub handler_name: String,
    pub quota_consumption: u8,
    endpoints: Endpoints,
    queue_warmup: Duration,
}

impl JobContext {
    pub fn new(common: &CommonArgs, service: &ServiceArgs, handler_default: &str) -> Self {
        let tokens: SharedTokenProvider = Arc::new(MetadataTokenProvider::new());
        Self {
            tokens,
            project: common.project.clone(),
            service_location: service.service_location.clone(),
            handler_name: service.handler_name(handler_default),
            quota_consumption: service.quota_consumption,
            endpoints: Endpoints::default(),
            queue_warmup: QUEUE_WARMUP,
        }
    }

    pub fn with_tokens(mut self, tokens: SharedTokenProvider) -> Self {
        self.tokens = tokens;
        self
    }

    pub fn with_endpoints(mut self, endpoints: Endpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    pub fn with_queue_warmup(mut self, warmup: Duration) -> Self {
        self.queue_warmup = warmup;
        self
    }

    pub fn warehouse(&self, common: &CommonArgs) -> Warehouse {
        let warehouse = Warehouse::new(
            &common.project,
            common.dataset_name(),
            &common.dataset_location,
            self.tokens.clone(),
        );
        match &self.endpoints.bigquery {
            Some(base_url) => warehouse.with_base_url(base_url),
            None => warehouse,
        }
    }

    pub fn publisher(&self, service: &ServiceArgs, queue_default: &str) -> TaskPublisher {
        let mut publisher = TaskPublisher::new(
            &self.project,
            &self.service_location,
            service.queue(queue_default),
            DEFAULT_QUEUE_RPS,
            self.tokens.clone(),
        )
        .with_resource_manager(self.resource_manager())
        .with_warmup(self.queue_warmup);
        if let Some(base_url) = &self.endpoints.cloud_tasks {
            publisher = publisher.with_base_url(base_url);
        }
        publisher
    }

    pub fn resource_manager(&self) -> ResourceManagerClient {
        let client = ResourceManagerClient::new(self.tokens.clone());
        match &self.endpoints.resource_manager {
            Some(base_url) => client.with_base_url(base_url),
            None => client,
        }
    }

    pub fn asset(&self, organization_number: &str) -> CloudAssetClient {
        let client = CloudAssetClient::new(organization_number, self.tokens.clone());
        match &self.endpoints.cloud_asset {
            Some(base_url) => client.with_base_url(base_url),
            None => client,
        }
    }

    pub fn quotas(&self) -> QuotasClient {
        let client = QuotasClient::new(self.tokens.clone());
        match &self.endpoints.cloud_quotas {
            Some(base_url) => client.with_base_url(base_url),
            None => client,
        }
    }
}
