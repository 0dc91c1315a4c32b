//! BigQuery adapter. Every stage writes its output here as a date-partitioned
//! snapshot and composes against the latest partition of the stage before it;
//! the dataset is the only durable state the pipeline owns.

mod client;
mod decode;
mod error;
mod rows;
mod schema;
mod views;

pub use client::RETRY_BASE_DELAY;
pub use client::RETRY_COUNT;
pub use client::Warehouse;
pub use error::WarehouseError;
pub use rows::EntryGroupRow;
pub use rows::IamBinding;
pub use rows::IamPolicyRow;
pub use rows::MappingRow;
pub use rows::ProjectRow;
pub use rows::TagTemplateRow;
pub use schema::TableName;
pub use schema::table_metadata;
pub use views::AUDIT_LOG_TABLE;
pub use views::ViewName;
pub use views::view_sql;
