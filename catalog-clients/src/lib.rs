//! REST adapters for the upstream services the pipeline talks to: the two
//! catalogs (Data Catalog and Dataplex), Resource Manager for ancestry and
//! project numbers, Cloud Asset inventory for project discovery, Cloud Quotas
//! for rate budgets, and Cloud Logging for the audit-log export sink.

mod asset;
mod datacatalog;
mod dataplex;
mod error;
mod http;
mod logging;
mod quotas;
mod resource_manager;

pub use asset::CloudAssetClient;
pub use datacatalog::DataCatalogClient;
pub use datacatalog::EntryGroupResponse;
pub use datacatalog::PolicyBinding;
pub use datacatalog::SearchPage;
pub use datacatalog::TagTemplateResponse;
pub use dataplex::DataplexClient;
pub use dataplex::DataplexResource;
pub use error::ApiError;
pub use logging::LogSink;
pub use logging::LoggingClient;
pub use quotas::DATAPLEX_CONTENT_READS_QUOTA;
pub use quotas::DATAPLEX_CONTENT_READS_PER_USER_QUOTA;
pub use quotas::DATAPLEX_IAM_POLICY_QUOTA;
pub use quotas::DATAPLEX_SERVICE;
pub use quotas::DATA_CATALOG_SERVICE;
pub use quotas::QuotasClient;
pub use resource_manager::ResourceManagerClient;

pub const USER_AGENT: &str = "TransferTooling/1.0.0";
