use clap::Args;
use clap::ValueEnum;

use transfer_entities::ManagingSystem;
use transfer_entities::SearchResourceType;

const DATASET_NAME: &str = "transfer_tooling";
const DATASET_NAME_DRY_RUN: &str = "transfer_tooling_dry_run";

/// Arguments every job and worker shares.
#[derive(Args, Clone, Debug)]
pub struct CommonArgs {
    /// The project in which the tooling itself operates.
    #[arg(long, short = 'p')]
    pub project: String,

    /// Dataset for storing and reading pipeline state. Defaults to
    /// `transfer_tooling`, or `transfer_tooling_dry_run` under --dry-run.
    #[arg(long)]
    pub dataset_name: Option<String>,

    /// Location used when the dataset has to be created.
    #[arg(long, default_value = "US")]
    pub dataset_location: String,

    /// Write into the dry-run dataset instead of the live one.
    #[arg(long, short = 'd')]
    pub dry_run: bool,
}

impl CommonArgs {
    pub fn dataset_name(&self) -> String {
        match &self.dataset_name {
            Some(name) => name.clone(),
            None if self.dry_run => DATASET_NAME_DRY_RUN.to_string(),
            None => DATASET_NAME.to_string(),
        }
    }
}

/// Arguments of jobs that talk to a queue and a handler service. Queue and
/// handler names default per stage, so they stay optional here.
#[derive(Args, Clone, Debug)]
pub struct ServiceArgs {
    /// Region the handler service and the base queue live in.
    #[arg(long, short = 'l', default_value = "us-central1")]
    pub service_location: String,

    /// Base queue name.
    #[arg(long, short = 'q')]
    pub queue: Option<String>,

    /// Name of the handler service tasks are delivered to.
    #[arg(long)]
    pub handler_name: Option<String>,

    /// Percentage of the upstream quota the stage may consume.
    #[arg(long, default_value_t = 20, value_parser = clap::value_parser!(u8).range(1..=100))]
    pub quota_consumption: u8,
}

impl ServiceArgs {
    pub fn queue(&self, default: &str) -> String {
        self.queue.clone().unwrap_or_else(|| default.to_string())
    }

    pub fn handler_name(&self, default: &str) -> String {
        self.handler_name.clone().unwrap_or_else(|| default.to_string())
    }
}

/// `--resource-types` choice; `both` expands to the full pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ResourceTypeChoice {
    #[value(name = "entry_group")]
    EntryGroup,
    #[value(name = "tag_template")]
    TagTemplate,
    Both,
}

impl ResourceTypeChoice {
    pub fn resolve(self) -> Vec<SearchResourceType> {
        match self {
            ResourceTypeChoice::EntryGroup => vec![SearchResourceType::EntryGroup],
            ResourceTypeChoice::TagTemplate => vec![SearchResourceType::TagTemplate],
            ResourceTypeChoice::Both => vec![
                SearchResourceType::EntryGroup,
                SearchResourceType::TagTemplate,
            ],
        }
    }
}

/// `--managing-systems` choice; `both` expands to the full pair.
#[derive(Clone, Copy, Debug, PartialEq, Eq, ValueEnum)]
pub enum ManagingSystemChoice {
    #[value(name = "data_catalog")]
    DataCatalog,
    Dataplex,
    Both,
}

impl ManagingSystemChoice {
    pub fn resolve(self) -> Vec<ManagingSystem> {
        match self {
            ManagingSystemChoice::DataCatalog => vec![ManagingSystem::DataCatalog],
            ManagingSystemChoice::Dataplex => vec![ManagingSystem::Dataplex],
            ManagingSystemChoice::Both => {
                vec![ManagingSystem::DataCatalog, ManagingSystem::Dataplex]
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::Parser;
    use pretty_assertions::assert_eq;

    #[derive(Parser, Debug)]
    struct TestCli {
        #[command(flatten)]
        common: CommonArgs,
        #[command(flatten)]
        service: ServiceArgs,
    }

    #[test]
    fn dataset_name_tracks_dry_run() {
        let cli = TestCli::parse_from(["job", "-p", "prj1"]);
        assert_eq!(cli.common.dataset_name(), "transfer_tooling");

        let cli = TestCli::parse_from(["job", "-p", "prj1", "--dry-run"]);
        assert_eq!(cli.common.dataset_name(), "transfer_tooling_dry_run");

        let cli = TestCli::parse_from(["job", "-p", "prj1", "-d", "--dataset-name", "custom"]);
        assert_eq!(cli.common.dataset_name(), "custom");
    }

    #[test]
    fn service_args_fall_back_to_stage_defaults() {
        let cli = TestCli::parse_from(["job", "-p", "prj1"]);
        assert_eq!(cli.service.queue("iam-discovery"), "iam-discovery");
        assert_eq!(cli.service.handler_name("fetch-policies-handler"), "fetch-policies-handler");
        assert_eq!(cli.service.service_location, "us-central1");
        assert_eq!(cli.service.quota_consumption, 20);
    }

    #[test]
    fn quota_consumption_is_a_percent() {
        assert!(TestCli::try_parse_from(["job", "-p", "prj1", "--quota-consumption", "0"]).is_err());
        assert!(TestCli::try_parse_from(["job", "-p", "prj1", "--quota-consumption", "101"]).is_err());
        let cli = TestCli::parse_from(["job", "-p", "prj1", "--quota-consumption", "100"]);
        assert_eq!(cli.service.quota_consumption, 100);
    }

    #[test]
    fn both_choices_expand() {
        assert_eq!(
            ResourceTypeChoice::Both.resolve(),
            vec![SearchResourceType::EntryGroup, SearchResourceType::TagTemplate]
        );
        assert_eq!(
            ManagingSystemChoice::Both.resolve(),
            vec![ManagingSystem::DataCatalog, ManagingSystem::Dataplex]
        );
    }
}
