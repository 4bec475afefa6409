mod cloudsearch_client;
mod dry_run_transport;

pub use cloudsearch_client::{CloudSearchClient, CloudSearchConfig, DEFAULT_API_VERSION};
pub use dry_run_transport::DryRunTransport;
