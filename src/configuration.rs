//! Configuration blocks of the mono-api constructs and their validation.
//!
//! A block is first checked against the JSON schema of its variant, then
//! deserialized, then checked for the invariants a schema can't express.

use jsonschema::{Draft, Validator};
use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::ConfigurationError;

/// letters, digits, dots, dashes and a `*` for wildcard certificates.
const HOSTNAME_PATTERN: &str = "^[A-Za-z0-9.*-]+$";

/// Which flavour of the mono-api construct to declare.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Variant {
    /// `mono-api2`: forwards everything to the function.
    Plain,
    /// `mono-api`: serves `/index.html` for routes without a file extension.
    SinglePageApp,
}

impl Variant {
    pub const ALL: [Variant; 2] = [Variant::Plain, Variant::SinglePageApp];

    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Plain => "mono-api2",
            Variant::SinglePageApp => "mono-api",
        }
    }

    pub fn from_type_name(type_name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|v| v.type_name() == type_name)
    }

    pub fn schema(&self) -> Value {
        let hostname = json!({ "type": "string", "minLength": 1, "pattern": HOSTNAME_PATTERN });
        let mut properties = json!({
            "type": { "const": self.type_name() },
            "functionName": { "type": "string", "minLength": 1 },
            "domain": {
                "anyOf": [
                    hostname.clone(),
                    { "type": "array", "items": hostname, "minItems": 1 }
                ]
            },
            "certificate": { "type": "string" },
            "forwardedHeaders": {
                "type": "array",
                "items": { "type": "string", "minLength": 1 },
                "uniqueItems": true
            },
        });
        if *self == Variant::SinglePageApp {
            if let Some(map) = properties.as_object_mut() {
                map.insert("path".into(), json!({ "type": "string" }));
                map.insert("errorPage".into(), json!({ "type": "string" }));
                map.insert("security".into(), json!({
                    "type": "object",
                    "properties": {
                        "allowIframe": { "type": "boolean" }
                    },
                    "additionalProperties": false
                }));
                map.insert("redirectToMainDomain".into(), json!({ "type": "boolean" }));
            }
        }
        json!({
            "type": "object",
            "properties": properties,
            "additionalProperties": false
        })
    }

    fn validator(&self) -> Result<&'static Validator, ConfigurationError> {
        let compiled = match self {
            Variant::Plain => &*PLAIN_VALIDATOR,
            Variant::SinglePageApp => &*SINGLE_PAGE_APP_VALIDATOR,
        };
        compiled.as_ref().map_err(|e| ConfigurationError::invalid(e.clone()))
    }
}

fn compile(variant: Variant) -> Result<Validator, String> {
    Validator::options()
        .with_draft(Draft::Draft7)
        .build(&variant.schema())
        .map_err(|e| format!("Failed to compile the {} configuration schema: {e}", variant.type_name()))
}

static PLAIN_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| compile(Variant::Plain));
static SINGLE_PAGE_APP_VALIDATOR: Lazy<Result<Validator, String>> = Lazy::new(|| compile(Variant::SinglePageApp));

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Domain {
    Single(String),
    Multiple(Vec<String>),
}

impl Domain {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Domain::Single(d) => vec![d.clone()],
            Domain::Multiple(domains) => domains.clone(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct Security {
    #[serde(default)]
    pub allow_iframe: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", deny_unknown_fields)]
pub struct MonoApiConfiguration {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub construct_type: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub function_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub domain: Option<Domain>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub certificate: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub forwarded_headers: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub path: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_page: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub security: Option<Security>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub redirect_to_main_domain: Option<bool>,
}

impl MonoApiConfiguration {
    /// validates `raw` for the construct `id` and returns the typed configuration.
    pub fn parse(id: &str, variant: Variant, raw: &Value) -> Result<Self, ConfigurationError> {
        let validator = variant.validator()?;
        if let Some(error) = validator.iter_errors(raw).next() {
            let path = error.instance_path.to_string().replace('/', ".");
            return Err(ConfigurationError::invalid(format!(
                "Invalid configuration in 'constructs.{id}{path}': {error}"
            )));
        }
        let configuration: Self = serde_json::from_value(raw.clone())
            .map_err(|e| ConfigurationError::invalid(format!("Invalid configuration in 'constructs.{id}': {e}")))?;
        configuration.validate(id)?;
        Ok(configuration)
    }

    fn validate(&self, id: &str) -> Result<(), ConfigurationError> {
        if self.function_name.is_none() {
            return Err(ConfigurationError::invalid(format!(
                "Invalid configuration in 'constructs.{id}.functionName': the name of the function serving the API must be provided."
            )));
        }
        if self.domain.is_some() && self.certificate.is_none() {
            return Err(ConfigurationError::invalid(format!(
                "Invalid configuration in 'constructs.{id}.certificate': if a domain is specified, then a certificate must be provided."
            )));
        }
        if let Some(path) = &self.path {
            if !path.starts_with('/') || path.ends_with('/') {
                return Err(ConfigurationError::invalid(format!(
                    "Invalid configuration in 'constructs.{id}.path': the path must start with a '/' and must not end with a '/' (for example '/api')."
                )));
            }
        }
        self.error_path(id)?;
        Ok(())
    }

    pub fn function_name(&self) -> &str {
        self.function_name.as_deref().unwrap_or_default()
    }

    pub fn domains(&self) -> Vec<String> {
        self.domain.as_ref().map(Domain::to_vec).unwrap_or_default()
    }

    pub fn allow_iframe(&self) -> bool {
        self.security.as_ref().map(|s| s.allow_iframe).unwrap_or(false)
    }

    pub fn redirect_to_main_domain(&self) -> bool {
        self.redirect_to_main_domain.unwrap_or(false)
    }

    /// the error page as an absolute path, eg: `/error.html`.
    pub fn error_path(&self, id: &str) -> Result<Option<String>, ConfigurationError> {
        let error_page = match &self.error_page {
            Some(page) => page,
            None => return Ok(None),
        };
        if error_page.starts_with("./") || error_page.starts_with("../") {
            return Err(ConfigurationError::invalid(format!(
                "The 'errorPage' option of the '{id}' construct cannot start with './' or '../'. (it cannot be a relative path)."
            )));
        }
        if !error_page.ends_with(".html") {
            return Err(ConfigurationError::invalid(format!(
                "The 'errorPage' option of the '{id}' construct should be the path to a HTML file."
            )));
        }
        if error_page.starts_with('/') {
            Ok(Some(error_page.clone()))
        } else {
            Ok(Some(format!("/{error_page}")))
        }
    }
}
