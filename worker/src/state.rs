use std::str::FromStr;
use std::sync::Arc;

use transfer_catalog_clients::DataCatalogClient;
use transfer_catalog_clients::DataplexClient;
use transfer_catalog_clients::ResourceManagerClient;
use transfer_cloud_tasks::TaskPublisher;
use transfer_gcp_auth::SharedTokenProvider;
use transfer_warehouse::Warehouse;

/// Which stage this worker process serves.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkerKind {
    FetchProjects,
    FetchResources,
    FindResourceNames,
    FetchPolicies,
    ConvertPrivateTagTemplates,
    TransferResources,
    CleanUp,
}

impl WorkerKind {
    /// The handler-service name jobs address tasks to.
    pub fn handler_name(self) -> &'static str {
        match self {
            WorkerKind::FetchProjects => "fetch-projects-handler",
            WorkerKind::FetchResources => "fetch-resources-handler",
            WorkerKind::FindResourceNames => "find-resource-names-handler",
            WorkerKind::FetchPolicies => "fetch-policies-handler",
            WorkerKind::ConvertPrivateTagTemplates => "convert-private-tag-templates-handler",
            WorkerKind::TransferResources => "transfer-resources-handler",
            WorkerKind::CleanUp => "clean-up-handler",
        }
    }

    /// The base queue of the stage, used when a handler re-enqueues.
    pub fn queue(self) -> &'static str {
        match self {
            WorkerKind::FetchProjects => "fetch-projects",
            WorkerKind::FetchResources => "fetch-resources",
            WorkerKind::FindResourceNames => "find-resource-names",
            WorkerKind::FetchPolicies => "iam-discovery",
            WorkerKind::ConvertPrivateTagTemplates => "convert-private-tag-templates",
            WorkerKind::TransferResources => "transfer-resources",
            WorkerKind::CleanUp => "clean-up",
        }
    }
}

impl FromStr for WorkerKind {
    type Err = String;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let kind = match value {
            "fetch-projects" | "fetch-projects-handler" => WorkerKind::FetchProjects,
            "fetch-resources" | "fetch-resources-handler" => WorkerKind::FetchResources,
            "find-resource-names" | "find-resource-names-handler" => WorkerKind::FindResourceNames,
            "fetch-policies" | "fetch-policies-handler" => WorkerKind::FetchPolicies,
            "convert-private-tag-templates" | "convert-private-tag-templates-handler" => {
                WorkerKind::ConvertPrivateTagTemplates
            }
            "transfer-resources" | "transfer-resources-handler" => WorkerKind::TransferResources,
            "clean-up" | "clean-up-handler" => WorkerKind::CleanUp,
            other => return Err(format!("unknown handler name: {other}")),
        };
        Ok(kind)
    }
}

/// Everything a handler invocation may need. Built once at startup and
/// shared; handlers are stateless beyond this.
pub struct WorkerState {
    pub project: String,
    pub service_location: String,
    /// Handler name used for self-chained successor tasks.
    pub handler_name: String,
    pub warehouse: Warehouse,
    pub datacatalog: DataCatalogClient,
    pub dataplex: DataplexClient,
    pub resource_manager: ResourceManagerClient,
    pub publisher: TaskPublisher,
}

impl WorkerState {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        kind: WorkerKind,
        project: impl Into<String>,
        dataset: impl Into<String>,
        dataset_location: impl Into<String>,
        service_location: impl Into<String>,
        queue: Option<String>,
        handler_name: Option<String>,
        tokens: SharedTokenProvider,
    ) -> Arc<Self> {
        let project = project.into();
        let service_location = service_location.into();
        let queue = queue.unwrap_or_else(|| kind.queue().to_string());
        let handler_name = handler_name.unwrap_or_else(|| kind.handler_name().to_string());

        Arc::new(Self {
            warehouse: Warehouse::new(
                &project,
                dataset.into(),
                dataset_location.into(),
                tokens.clone(),
            ),
            datacatalog: DataCatalogClient::new(tokens.clone()),
            dataplex: DataplexClient::new(tokens.clone()),
            resource_manager: ResourceManagerClient::new(tokens.clone()),
            publisher: TaskPublisher::new(&project, &service_location, queue, 60, tokens),
            project,
            service_location,
            handler_name,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn handler_names_round_trip() {
        for kind in [
            WorkerKind::FetchProjects,
            WorkerKind::FetchResources,
            WorkerKind::FindResourceNames,
            WorkerKind::FetchPolicies,
            WorkerKind::ConvertPrivateTagTemplates,
            WorkerKind::TransferResources,
            WorkerKind::CleanUp,
        ] {
            assert_eq!(kind.handler_name().parse::<WorkerKind>().ok(), Some(kind));
            assert_eq!(kind.queue().parse::<WorkerKind>().ok(), Some(kind));
        }
        assert!("mystery-handler".parse::<WorkerKind>().is_err());
    }
}
