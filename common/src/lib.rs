//! Pieces shared by every job and worker binary: the common CLI argument
//! blocks and the tracing setup.

mod cli;
mod logging;

pub use cli::CommonArgs;
pub use cli::ManagingSystemChoice;
pub use cli::ResourceTypeChoice;
pub use cli::ServiceArgs;
pub use logging::init_logging;
