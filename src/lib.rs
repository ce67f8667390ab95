//! CloudFront distributions in front of Lambda function URLs, declared as
//! CloudFormation resources by the `mono-api` and `mono-api2` constructs.

pub mod configuration;
pub mod constructs;
pub mod edge_functions;
pub mod errors;
pub mod headers;
pub mod provider;
pub mod resources;
pub mod service;

pub use configuration::{MonoApiConfiguration, Variant};
pub use constructs::{ExposedOutput, MonoApi};
pub use errors::{ConfigurationError, LiftError};
pub use provider::AwsProvider;
pub use service::Service;
