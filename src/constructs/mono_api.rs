//! The `mono-api` / `mono-api2` construct: a CloudFront distribution in front
//! of the function URL of a single lambda.
//!
//! Everything is validated and assembled in [`MonoApi::new`]. A construct that
//! exists can always be declared, and a configuration error means nothing
//! was declared.

use std::collections::BTreeMap;

use aws_cfn_stack::{Output, Resource, StackOutputReader, StrVal};
use serde_json::Value;

use crate::configuration::{MonoApiConfiguration, Variant};
use crate::edge_functions::viewer_request_code;
use crate::errors::{ConfigurationError, LiftError};
use crate::headers::compose_forwarded_headers;
use crate::provider::{function_url_logical_id, to_logical_id, AwsProvider};
use crate::resources::*;

pub const BACKEND_ORIGIN_ID: &str = "backend";
/// origin errors replaced by the configured error page.
pub const ERROR_PAGE_STATUS_CODES: [u16; 4] = [500, 502, 503, 504];
const MAX_POLICY_NAME_LEN: usize = 128;
const MAX_FUNCTION_NAME_LEN: usize = 64;

/// Outputs the hosting framework can ask a construct for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ExposedOutput {
    Url,
    CName,
}

impl ExposedOutput {
    pub fn name(&self) -> &'static str {
        match self {
            ExposedOutput::Url => "url",
            ExposedOutput::CName => "cname",
        }
    }
}

/// logical ids of everything a construct declares, derived from its id.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LogicalIds {
    pub origin_request_policy: String,
    pub cache_policy: String,
    pub response_headers_policy: String,
    pub request_function: String,
    pub distribution: String,
    pub domain_output: String,
    pub cname_output: String,
    pub distribution_id_output: String,
}

impl LogicalIds {
    fn new(prefix: &str) -> Self {
        Self {
            origin_request_policy: format!("{prefix}OriginRequestPolicy"),
            cache_policy: format!("{prefix}CachePolicy"),
            response_headers_policy: format!("{prefix}ResponseHeadersPolicy"),
            request_function: format!("{prefix}RequestFunction"),
            distribution: format!("{prefix}CDN"),
            domain_output: format!("{prefix}Domain"),
            cname_output: format!("{prefix}CName"),
            distribution_id_output: format!("{prefix}DistributionId"),
        }
    }
}

#[derive(Debug, Clone)]
pub struct MonoApi {
    id: String,
    variant: Variant,
    stack_name: String,
    configuration: MonoApiConfiguration,
    logical_ids: LogicalIds,
    origin_request_policy: CfnOriginRequestPolicy,
    cache_policy: CfnCachePolicy,
    response_headers_policy: Option<CfnResponseHeadersPolicy>,
    request_function: CfnFunction,
    distribution: CfnDistribution,
}

impl MonoApi {
    pub fn new(id: &str, variant: Variant, raw: &Value, provider: &AwsProvider) -> Result<Self, ConfigurationError> {
        let logical_prefix = to_logical_id(id);
        if logical_prefix.is_empty() {
            return Err(ConfigurationError::invalid(format!(
                "Invalid construct id '{id}': it must contain at least one alphanumeric character."
            )));
        }
        let configuration = MonoApiConfiguration::parse(id, variant, raw)?;
        let forwarded_headers = compose_forwarded_headers(id, configuration.forwarded_headers.as_deref())?;
        let error_path = configuration.error_path(id)?;
        let domains = configuration.domains();
        let logical_ids = LogicalIds::new(&logical_prefix);

        let policy_name = provider.physical_name(id, MAX_POLICY_NAME_LEN);
        let origin_request_policy = CfnOriginRequestPolicy::forward_all_except_headers(&policy_name, forwarded_headers);
        let cache_policy = CfnCachePolicy::for_dynamic_content(&policy_name);
        let response_headers_policy = match variant {
            Variant::Plain => None,
            Variant::SinglePageApp => Some(CfnResponseHeadersPolicy::security_headers(
                &provider.physical_name(&format!("{id}-security"), MAX_POLICY_NAME_LEN),
                configuration.allow_iframe(),
            )),
        };

        let code = viewer_request_code(variant, &domains, configuration.redirect_to_main_domain());
        let function_name = provider.physical_name(&format!("{}-{id}-request", provider.region()), MAX_FUNCTION_NAME_LEN);
        let request_function = CfnFunction::new(&function_name, &format!("{} viewer request handler", id), code);

        let origin = Origin {
            id: BACKEND_ORIGIN_ID.to_string(),
            domain_name: select_function_url(&function_url_logical_id(configuration.function_name())),
            origin_path: configuration.path.clone(),
            custom_origin_config: CustomOriginConfig::https_only(),
        };
        let default_cache_behavior = DefaultCacheBehavior {
            target_origin_id: BACKEND_ORIGIN_ID.to_string(),
            viewer_protocol_policy: "redirect-to-https".to_string(),
            allowed_methods: ALL_METHODS.iter().map(|m| m.to_string()).collect(),
            cached_methods: CACHED_METHODS.iter().map(|m| m.to_string()).collect(),
            compress: true,
            cache_policy_id: StrVal::Ref(logical_ids.cache_policy.clone()),
            origin_request_policy_id: StrVal::Ref(logical_ids.origin_request_policy.clone()),
            response_headers_policy_id: response_headers_policy.as_ref()
                .map(|_| StrVal::Ref(logical_ids.response_headers_policy.clone())),
            function_associations: vec![FunctionAssociation {
                event_type: VIEWER_REQUEST.to_string(),
                function_arn: CfnFunction::arn(&logical_ids.request_function),
            }],
        };
        let comment = format!("{} {id} API CDN", provider.stack_name());
        let mut distribution_config = DistributionConfig::single_origin(&comment, origin, default_cache_behavior);
        match (&configuration.certificate, domains.is_empty()) {
            (Some(certificate), false) => distribution_config.set_custom_domain(&CustomDomainSettings {
                aliases: domains,
                acm_certificate_arn: certificate.clone(),
            }),
            (Some(_), true) => log::warn!("Construct {id} has a certificate but no domain, the certificate is ignored"),
            (None, _) => {}
        }
        if let Some(error_path) = error_path {
            distribution_config.custom_error_responses = ERROR_PAGE_STATUS_CODES.iter()
                .map(|&code| CustomErrorResponse {
                    error_code: code,
                    error_caching_min_ttl: 0,
                    response_code: code,
                    response_page_path: error_path.clone(),
                })
                .collect();
        }

        log::debug!("Assembled {} construct {id}", variant.type_name());
        Ok(Self {
            id: id.to_string(),
            variant,
            stack_name: provider.stack_name().to_string(),
            configuration,
            logical_ids,
            origin_request_policy,
            cache_policy,
            response_headers_policy,
            request_function,
            distribution: CfnDistribution { distribution_config },
        })
    }

    pub fn id(&self) -> &str {
        &self.id
    }

    pub fn variant(&self) -> Variant {
        self.variant
    }

    pub fn configuration(&self) -> &MonoApiConfiguration {
        &self.configuration
    }

    pub fn logical_ids(&self) -> &LogicalIds {
        &self.logical_ids
    }

    pub fn forwarded_headers(&self) -> &[String] {
        self.origin_request_policy.headers()
    }

    pub fn cache_key_headers(&self) -> &[String] {
        self.cache_policy.headers()
    }

    pub fn request_code(&self) -> &str {
        &self.request_function.function_code
    }

    pub fn distribution(&self) -> &CfnDistribution {
        &self.distribution
    }

    /// adds the construct's resources and outputs to the stack.
    pub fn declare(&self, stack: &mut aws_cfn_stack::Input) {
        let ids = &self.logical_ids;
        stack.resources.push(Resource {
            name: ids.origin_request_policy.clone(),
            properties: Box::new(self.origin_request_policy.clone()),
        });
        stack.resources.push(Resource {
            name: ids.cache_policy.clone(),
            properties: Box::new(self.cache_policy.clone()),
        });
        if let Some(policy) = &self.response_headers_policy {
            stack.resources.push(Resource {
                name: ids.response_headers_policy.clone(),
                properties: Box::new(policy.clone()),
            });
        }
        stack.resources.push(Resource {
            name: ids.request_function.clone(),
            properties: Box::new(self.request_function.clone()),
        });
        stack.resources.push(Resource {
            name: ids.distribution.clone(),
            properties: Box::new(self.distribution.clone()),
        });

        let cloudfront_domain = StrVal::GetAtt(ids.distribution.clone(), "DomainName".to_string());
        let domain = match self.configuration.domains().first() {
            Some(first) => StrVal::String(first.clone()),
            None => cloudfront_domain.clone(),
        };
        stack.outputs.push(Output {
            name: ids.domain_output.clone(),
            description: "Website domain name.".to_string(),
            value: domain,
        });
        stack.outputs.push(Output {
            name: ids.cname_output.clone(),
            description: "CloudFront CNAME.".to_string(),
            value: cloudfront_domain,
        });
        stack.outputs.push(Output {
            name: ids.distribution_id_output.clone(),
            description: "ID of the CloudFront distribution.".to_string(),
            value: StrVal::Ref(ids.distribution.clone()),
        });
    }

    pub fn exposed_outputs(&self) -> &'static [ExposedOutput] {
        match self.variant {
            Variant::Plain => &[ExposedOutput::Url, ExposedOutput::CName],
            Variant::SinglePageApp => &[],
        }
    }

    async fn read_output(&self, reader: &dyn StackOutputReader, output_key: &str) -> Result<Option<String>, LiftError> {
        log::info!("Reading output {output_key} of stack {}", self.stack_name);
        reader.get_stack_output(&self.stack_name, output_key).await
            .map_err(|reason| LiftError::Output {
                stack_name: self.stack_name.clone(),
                output_key: output_key.to_string(),
                reason,
            })
    }

    pub async fn domain(&self, reader: &dyn StackOutputReader) -> Result<Option<String>, LiftError> {
        self.read_output(reader, &self.logical_ids.domain_output).await
    }

    pub async fn url(&self, reader: &dyn StackOutputReader) -> Result<Option<String>, LiftError> {
        Ok(self.domain(reader).await?.map(|domain| format!("https://{domain}")))
    }

    pub async fn cname(&self, reader: &dyn StackOutputReader) -> Result<Option<String>, LiftError> {
        self.read_output(reader, &self.logical_ids.cname_output).await
    }

    pub async fn distribution_id(&self, reader: &dyn StackOutputReader) -> Result<Option<String>, LiftError> {
        self.read_output(reader, &self.logical_ids.distribution_id_output).await
    }

    /// the exposed outputs that resolve in the deployed stack.
    pub async fn outputs(&self, reader: &dyn StackOutputReader) -> Result<BTreeMap<&'static str, String>, LiftError> {
        let mut out = BTreeMap::new();
        for output in self.exposed_outputs() {
            let value = match output {
                ExposedOutput::Url => self.url(reader).await?,
                ExposedOutput::CName => self.cname(reader).await?,
            };
            if let Some(value) = value {
                out.insert(output.name(), value);
            }
        }
        Ok(out)
    }
}
