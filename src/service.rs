//! A `serverless.yml`-shaped service file: the provider and the constructs
//! declared in it.

use std::collections::BTreeMap;
use std::path::Path;

use aws_cfn_stack::SavedTemplate;
use serde::Deserialize;
use serde_json::Value;

use crate::configuration::Variant;
use crate::constructs::MonoApi;
use crate::errors::{ConfigurationError, LiftError};
use crate::provider::{AwsProvider, DEFAULT_REGION, DEFAULT_STAGE};

#[derive(Debug, Clone, Deserialize)]
pub struct ServiceFile {
    pub service: String,
    #[serde(default)]
    pub provider: ProviderSection,
    #[serde(default)]
    pub constructs: BTreeMap<String, Value>,
}

/// only the keys we use, the rest of the provider block belongs to the framework.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ProviderSection {
    pub stage: Option<String>,
    pub region: Option<String>,
}

#[derive(Debug)]
pub struct Service {
    name: String,
    provider: AwsProvider,
    constructs: Vec<MonoApi>,
}

impl Service {
    /// parses YAML, which includes JSON.
    pub fn parse(contents: &str) -> Result<Self, LiftError> {
        let file: ServiceFile = serde_yaml::from_str(contents)?;
        Self::new(file)
    }

    pub fn from_path(path: &Path) -> Result<Self, LiftError> {
        let contents = std::fs::read_to_string(path)
            .map_err(|e| LiftError::Parse(format!("Failed to read {:?}\n{e}", path)))?;
        log::debug!("Loaded service file {:?}", path);
        Self::parse(&contents)
    }

    pub fn new(file: ServiceFile) -> Result<Self, LiftError> {
        let stage = file.provider.stage.as_deref().unwrap_or(DEFAULT_STAGE);
        let region = file.provider.region.as_deref().unwrap_or(DEFAULT_REGION);
        let provider = AwsProvider::for_service(&file.service, stage, region)?;
        let mut constructs = vec![];
        for (id, raw) in file.constructs.iter() {
            let type_name = raw.get("type").and_then(Value::as_str).unwrap_or_default();
            let variant = Variant::from_type_name(type_name).ok_or_else(|| {
                let supported: Vec<&str> = Variant::ALL.iter().map(|v| v.type_name()).collect();
                ConfigurationError::unknown_type(format!(
                    "The construct '{id}' has an unknown type '{type_name}'. Supported types are: {}.",
                    supported.join(", ")
                ))
            })?;
            constructs.push(MonoApi::new(id, variant, raw, &provider)?);
        }
        Ok(Self { name: file.service, provider, constructs })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn provider(&self) -> &AwsProvider {
        &self.provider
    }

    pub fn constructs(&self) -> &[MonoApi] {
        &self.constructs
    }

    pub fn construct(&self, id: &str) -> Option<&MonoApi> {
        self.constructs.iter().find(|c| c.id() == id)
    }

    pub fn stack_input(&self) -> aws_cfn_stack::Input {
        let mut stack = aws_cfn_stack::Input::new(self.provider.stack_name());
        for construct in self.constructs.iter() {
            construct.declare(&mut stack);
        }
        stack
    }

    pub fn synthesize(&self) -> Result<SavedTemplate, LiftError> {
        aws_cfn_stack::synthesize(&self.stack_input()).map_err(|reason| LiftError::Synthesis {
            stack_name: self.provider.stack_name().to_string(),
            reason,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::UNKNOWN_CONSTRUCT_TYPE;

    #[test]
    fn provider_defaults() {
        let service = Service::parse("service: my-app\nconstructs: {}\n").unwrap();
        assert_eq!(service.provider().stack_name(), "my-app-dev");
        assert_eq!(service.provider().region(), "us-east-1");
        assert!(service.constructs().is_empty());
    }

    #[test]
    fn json_is_accepted() {
        let service = Service::parse(r#"{
            "service": "my-app",
            "provider": { "name": "aws", "stage": "prod", "region": "eu-west-1" },
            "constructs": { "api": { "type": "mono-api2", "functionName": "backend" } }
        }"#).unwrap();
        assert_eq!(service.provider().stack_name(), "my-app-prod");
        assert_eq!(service.construct("api").map(|c| c.variant()), Some(Variant::Plain));
        assert!(service.construct("nope").is_none());
    }

    #[test]
    fn unknown_types_are_rejected() {
        let err = Service::parse("service: my-app\nconstructs:\n  site:\n    type: static-website\n").unwrap_err();
        match err {
            LiftError::Configuration(e) => {
                assert_eq!(e.code, UNKNOWN_CONSTRUCT_TYPE);
                assert_eq!(e.message, "The construct 'site' has an unknown type 'static-website'. Supported types are: mono-api2, mono-api.");
            }
            other => panic!("unexpected error {other}"),
        }
    }

    #[test]
    fn invalid_region_fails() {
        let err = Service::parse("service: my-app\nprovider:\n  region: mars-north-1\n").unwrap_err();
        assert!(matches!(err, LiftError::Provider(_)));
    }

    #[test]
    fn constructs_with_colliding_logical_ids_fail_synthesis() {
        let service = Service::parse(r#"
service: my-app
constructs:
  my-api: { type: mono-api2, functionName: a }
  my_api: { type: mono-api2, functionName: b }
"#).unwrap();
        match service.synthesize().unwrap_err() {
            LiftError::Synthesis { stack_name, .. } => assert_eq!(stack_name, "my-app-dev"),
            other => panic!("unexpected error {other}"),
        }
    }
}
