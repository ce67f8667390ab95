use serde::Serialize;
use serde_json::Value;

use super::{CfnResource, StrVal};

pub const ALL_METHODS: [&str; 7] = ["GET", "HEAD", "OPTIONS", "PUT", "PATCH", "POST", "DELETE"];
pub const CACHED_METHODS: [&str; 2] = ["GET", "HEAD"];
pub const MINIMUM_PROTOCOL_VERSION: &str = "TLSv1.2_2021";
pub const VIEWER_REQUEST: &str = "viewer-request";
const MAX_COMMENT_LEN: usize = 128;
/// status codes cloudfront accepts in `CustomErrorResponses`.
const CUSTOMIZABLE_ERROR_CODES: [u16; 11] = [400, 403, 404, 405, 414, 416, 500, 501, 502, 503, 504];

/// domain name of a lambda function URL. The `FunctionUrl` attribute looks like
/// `https://<id>.lambda-url.<region>.on.aws/`, so we take the 3rd element when splitting on `/`:
/// { "Fn::Select" : [ "2", { "Fn::Split": ["/", { "Fn::GetAtt": [function_url_id, "FunctionUrl"] }] } ] }
pub fn select_function_url(function_url_id: &str) -> StrVal {
    StrVal::Select(2, Box::new(StrVal::Split(
        "/".to_string(),
        Box::new(StrVal::GetAtt(function_url_id.to_string(), "FunctionUrl".to_string())),
    )))
}

/// aliases + https cert of a distribution served on a custom domain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CustomDomainSettings {
    pub aliases: Vec<String>,
    pub acm_certificate_arn: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnDistribution {
    pub distribution_config: DistributionConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DistributionConfig {
    pub enabled: bool,
    pub comment: String,
    pub http_version: String,
    pub origins: Vec<Origin>,
    pub default_cache_behavior: DefaultCacheBehavior,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub aliases: Vec<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub viewer_certificate: Option<ViewerCertificate>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub custom_error_responses: Vec<CustomErrorResponse>,
}

impl DistributionConfig {
    /// one origin, one default behavior. Aliases, certificate and error
    /// responses are left empty.
    pub fn single_origin(comment: &str, origin: Origin, default_cache_behavior: DefaultCacheBehavior) -> Self {
        Self {
            enabled: true,
            comment: comment.chars().take(MAX_COMMENT_LEN).collect(),
            http_version: "http2".to_string(),
            origins: vec![origin],
            default_cache_behavior,
            aliases: vec![],
            viewer_certificate: None,
            custom_error_responses: vec![],
        }
    }

    pub fn set_custom_domain(&mut self, settings: &CustomDomainSettings) {
        self.aliases = settings.aliases.clone();
        self.viewer_certificate = Some(ViewerCertificate {
            acm_certificate_arn: settings.acm_certificate_arn.clone(),
            ssl_support_method: "sni-only".to_string(),
            minimum_protocol_version: MINIMUM_PROTOCOL_VERSION.to_string(),
        });
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct Origin {
    pub id: String,
    pub domain_name: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub origin_path: Option<String>,
    pub custom_origin_config: CustomOriginConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomOriginConfig {
    #[serde(rename = "HTTPPort")]
    pub http_port: u16,
    #[serde(rename = "HTTPSPort")]
    pub https_port: u16,
    pub origin_protocol_policy: String,
    #[serde(rename = "OriginSSLProtocols")]
    pub origin_ssl_protocols: Vec<String>,
}

impl CustomOriginConfig {
    pub fn https_only() -> Self {
        Self {
            http_port: 80,
            https_port: 443,
            origin_protocol_policy: "https-only".to_string(),
            origin_ssl_protocols: vec!["TLSv1.2".to_string()],
        }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct DefaultCacheBehavior {
    pub target_origin_id: String,
    pub viewer_protocol_policy: String,
    pub allowed_methods: Vec<String>,
    pub cached_methods: Vec<String>,
    pub compress: bool,
    pub cache_policy_id: StrVal,
    pub origin_request_policy_id: StrVal,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub response_headers_policy_id: Option<StrVal>,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub function_associations: Vec<FunctionAssociation>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionAssociation {
    pub event_type: String,
    #[serde(rename = "FunctionARN")]
    pub function_arn: StrVal,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ViewerCertificate {
    pub acm_certificate_arn: String,
    pub ssl_support_method: String,
    pub minimum_protocol_version: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CustomErrorResponse {
    pub error_code: u16,
    #[serde(rename = "ErrorCachingMinTTL")]
    pub error_caching_min_ttl: u64,
    pub response_code: u16,
    pub response_page_path: String,
}

impl CfnResource for CfnDistribution {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Distribution"
    }

    fn properties(&self) -> Result<Value, String> {
        aws_cfn_stack::to_properties(self)
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.distribution_config;
        let target = &config.default_cache_behavior.target_origin_id;
        if !config.origins.iter().any(|o| &o.id == target) {
            return Err(format!("Default cache behavior targets origin '{target}' which is not part of the distribution"));
        }
        if !config.aliases.is_empty() && config.viewer_certificate.is_none() {
            return Err("A distribution with aliases must have a viewer certificate".to_string());
        }
        if config.viewer_certificate.as_ref().map(|c| c.acm_certificate_arn.is_empty()).unwrap_or(false) {
            return Err("Viewer certificate ARN cannot be empty".to_string());
        }
        for response in config.custom_error_responses.iter() {
            if !CUSTOMIZABLE_ERROR_CODES.contains(&response.error_code) {
                return Err(format!("Cannot customize the response of HTTP status {}", response.error_code));
            }
            if !response.response_page_path.starts_with('/') {
                return Err(format!("Error response page {:?} must start with '/'", response.response_page_path));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn distribution() -> CfnDistribution {
        let origin = Origin {
            id: "backend".to_string(),
            domain_name: select_function_url("BackendLambdaFunctionUrl"),
            origin_path: None,
            custom_origin_config: CustomOriginConfig::https_only(),
        };
        let behavior = DefaultCacheBehavior {
            target_origin_id: "backend".to_string(),
            viewer_protocol_policy: "redirect-to-https".to_string(),
            allowed_methods: ALL_METHODS.iter().map(|m| m.to_string()).collect(),
            cached_methods: CACHED_METHODS.iter().map(|m| m.to_string()).collect(),
            compress: true,
            cache_policy_id: StrVal::Ref("ApiCachePolicy".into()),
            origin_request_policy_id: StrVal::Ref("ApiOriginRequestPolicy".into()),
            response_headers_policy_id: None,
            function_associations: vec![],
        };
        CfnDistribution { distribution_config: DistributionConfig::single_origin("my-app-dev api", origin, behavior) }
    }

    #[test]
    fn origin_points_at_the_function_url_host() {
        let props = distribution().properties().unwrap();
        let origin = &props["DistributionConfig"]["Origins"][0];
        assert_eq!(origin["DomainName"], json!({
            "Fn::Select": ["2", { "Fn::Split": ["/", { "Fn::GetAtt": ["BackendLambdaFunctionUrl", "FunctionUrl"] }] }]
        }));
        assert_eq!(origin["CustomOriginConfig"]["OriginProtocolPolicy"], "https-only");
        assert_eq!(origin["CustomOriginConfig"]["HTTPSPort"], 443);
        assert!(origin.get("OriginPath").is_none());
        assert_eq!(props["DistributionConfig"]["HttpVersion"], "http2");
        assert!(props["DistributionConfig"].get("Aliases").is_none());
        assert!(props["DistributionConfig"].get("ViewerCertificate").is_none());
    }

    #[test]
    fn custom_domain_sets_aliases_and_certificate() {
        let mut distr = distribution();
        distr.distribution_config.set_custom_domain(&CustomDomainSettings {
            aliases: vec!["example.com".into(), "www.example.com".into()],
            acm_certificate_arn: "arn:aws:acm:us-east-1:123456789012:certificate/abc".into(),
        });
        assert!(distr.validate().is_ok());
        let props = distr.properties().unwrap();
        assert_eq!(props["DistributionConfig"]["Aliases"], json!(["example.com", "www.example.com"]));
        assert_eq!(props["DistributionConfig"]["ViewerCertificate"], json!({
            "AcmCertificateArn": "arn:aws:acm:us-east-1:123456789012:certificate/abc",
            "SslSupportMethod": "sni-only",
            "MinimumProtocolVersion": "TLSv1.2_2021"
        }));
    }

    #[test]
    fn validate_catches_dangling_origin_and_missing_certificate() {
        let mut distr = distribution();
        distr.distribution_config.default_cache_behavior.target_origin_id = "nope".into();
        assert_eq!(distr.validate().unwrap_err(), "Default cache behavior targets origin 'nope' which is not part of the distribution");

        let mut distr = distribution();
        distr.distribution_config.aliases = vec!["example.com".into()];
        assert_eq!(distr.validate().unwrap_err(), "A distribution with aliases must have a viewer certificate");
    }

    #[test]
    fn long_comments_are_truncated() {
        let origin = distribution().distribution_config.origins[0].clone();
        let behavior = distribution().distribution_config.default_cache_behavior;
        let config = DistributionConfig::single_origin(&"x".repeat(300), origin, behavior);
        assert_eq!(config.comment.len(), 128);
    }
}
