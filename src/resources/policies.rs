use serde::Serialize;
use serde_json::Value;

use super::{verify_name, CfnResource};
use crate::headers::{AUTHORIZATION_HEADER, MAX_FORWARDED_HEADERS};

const MAX_POLICY_NAME_LEN: usize = 128;
const ONE_YEAR_SECONDS: u64 = 365 * 24 * 60 * 60;
const TWO_YEARS_SECONDS: u64 = 2 * ONE_YEAR_SECONDS;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CookiesConfig {
    pub cookie_behavior: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct QueryStringsConfig {
    pub query_string_behavior: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct HeadersConfig {
    pub header_behavior: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    pub headers: Vec<String>,
}

impl CookiesConfig {
    pub fn all() -> Self {
        Self { cookie_behavior: "all".to_string() }
    }
}

impl QueryStringsConfig {
    pub fn all() -> Self {
        Self { query_string_behavior: "all".to_string() }
    }
}

impl HeadersConfig {
    pub fn allow_list(headers: Vec<String>) -> Self {
        Self { header_behavior: "whitelist".to_string(), headers }
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnOriginRequestPolicy {
    pub origin_request_policy_config: OriginRequestPolicyConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct OriginRequestPolicyConfig {
    pub name: String,
    pub comment: String,
    pub cookies_config: CookiesConfig,
    pub headers_config: HeadersConfig,
    pub query_strings_config: QueryStringsConfig,
}

impl CfnOriginRequestPolicy {
    /// forwards every cookie and query string, and only the given headers.
    pub fn forward_all_except_headers(name: &str, headers: Vec<String>) -> Self {
        Self {
            origin_request_policy_config: OriginRequestPolicyConfig {
                name: name.to_string(),
                comment: "Origin request policy for the dynamic content".to_string(),
                cookies_config: CookiesConfig::all(),
                headers_config: HeadersConfig::allow_list(headers),
                query_strings_config: QueryStringsConfig::all(),
            },
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.origin_request_policy_config.headers_config.headers
    }
}

impl CfnResource for CfnOriginRequestPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::OriginRequestPolicy"
    }

    fn properties(&self) -> Result<Value, String> {
        aws_cfn_stack::to_properties(self)
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.origin_request_policy_config;
        verify_name("origin request policy", &config.name, MAX_POLICY_NAME_LEN)?;
        let headers = self.headers();
        if headers.len() > MAX_FORWARDED_HEADERS {
            return Err(format!("Origin request policy forwards {} headers, at most {MAX_FORWARDED_HEADERS} are allowed", headers.len()));
        }
        if headers.iter().any(|h| h.eq_ignore_ascii_case(AUTHORIZATION_HEADER)) {
            return Err(format!("Origin request policy cannot forward the {AUTHORIZATION_HEADER} header"));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnCachePolicy {
    pub cache_policy_config: CachePolicyConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CachePolicyConfig {
    pub name: String,
    pub comment: String,
    #[serde(rename = "MinTTL")]
    pub min_ttl: u64,
    #[serde(rename = "DefaultTTL")]
    pub default_ttl: u64,
    #[serde(rename = "MaxTTL")]
    pub max_ttl: u64,
    pub parameters_in_cache_key_and_forwarded_to_origin: ParametersInCacheKeyAndForwardedToOrigin,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ParametersInCacheKeyAndForwardedToOrigin {
    pub cookies_config: CookiesConfig,
    pub headers_config: HeadersConfig,
    pub query_strings_config: QueryStringsConfig,
    pub enable_accept_encoding_gzip: bool,
    pub enable_accept_encoding_brotli: bool,
}

impl CfnCachePolicy {
    /// nothing is cached unless the origin says so. `Authorization` is part of the
    /// cache key, which is also how it gets forwarded to the origin.
    pub fn for_dynamic_content(name: &str) -> Self {
        Self {
            cache_policy_config: CachePolicyConfig {
                name: name.to_string(),
                comment: "Cache policy for serving dynamic content".to_string(),
                min_ttl: 0,
                default_ttl: 0,
                max_ttl: ONE_YEAR_SECONDS,
                parameters_in_cache_key_and_forwarded_to_origin: ParametersInCacheKeyAndForwardedToOrigin {
                    cookies_config: CookiesConfig::all(),
                    headers_config: HeadersConfig::allow_list(vec![AUTHORIZATION_HEADER.to_string()]),
                    query_strings_config: QueryStringsConfig::all(),
                    enable_accept_encoding_gzip: true,
                    enable_accept_encoding_brotli: true,
                },
            },
        }
    }

    pub fn headers(&self) -> &[String] {
        &self.cache_policy_config.parameters_in_cache_key_and_forwarded_to_origin.headers_config.headers
    }
}

impl CfnResource for CfnCachePolicy {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::CachePolicy"
    }

    fn properties(&self) -> Result<Value, String> {
        aws_cfn_stack::to_properties(self)
    }

    fn validate(&self) -> Result<(), String> {
        let config = &self.cache_policy_config;
        verify_name("cache policy", &config.name, MAX_POLICY_NAME_LEN)?;
        if config.min_ttl > config.default_ttl || config.default_ttl > config.max_ttl {
            return Err(format!(
                "Cache policy TTLs must satisfy MinTTL <= DefaultTTL <= MaxTTL, got {} / {} / {}",
                config.min_ttl, config.default_ttl, config.max_ttl
            ));
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnResponseHeadersPolicy {
    pub response_headers_policy_config: ResponseHeadersPolicyConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ResponseHeadersPolicyConfig {
    pub name: String,
    pub comment: String,
    pub security_headers_config: SecurityHeadersConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct SecurityHeadersConfig {
    pub content_type_options: ContentTypeOptions,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub frame_options: Option<FrameOptions>,
    pub strict_transport_security: StrictTransportSecurity,
    #[serde(rename = "XSSProtection")]
    pub xss_protection: XssProtection,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct ContentTypeOptions {
    pub r#override: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FrameOptions {
    pub frame_option: String,
    pub r#override: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct StrictTransportSecurity {
    pub access_control_max_age_sec: u64,
    pub r#override: bool,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct XssProtection {
    pub protection: bool,
    pub mode_block: bool,
    pub r#override: bool,
}

impl CfnResponseHeadersPolicy {
    /// Headers set by the origin take precedence over these.
    /// `X-Frame-Options: SAMEORIGIN` is left out when iframes are allowed.
    pub fn security_headers(name: &str, allow_iframe: bool) -> Self {
        let frame_options = if allow_iframe {
            None
        } else {
            Some(FrameOptions { frame_option: "SAMEORIGIN".to_string(), r#override: false })
        };
        Self {
            response_headers_policy_config: ResponseHeadersPolicyConfig {
                name: name.to_string(),
                comment: "Security headers added to every response".to_string(),
                security_headers_config: SecurityHeadersConfig {
                    content_type_options: ContentTypeOptions { r#override: false },
                    frame_options,
                    strict_transport_security: StrictTransportSecurity {
                        access_control_max_age_sec: TWO_YEARS_SECONDS,
                        r#override: false,
                    },
                    xss_protection: XssProtection { protection: true, mode_block: true, r#override: false },
                },
            },
        }
    }
}

impl CfnResource for CfnResponseHeadersPolicy {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::ResponseHeadersPolicy"
    }

    fn properties(&self) -> Result<Value, String> {
        aws_cfn_stack::to_properties(self)
    }

    fn validate(&self) -> Result<(), String> {
        verify_name("response headers policy", &self.response_headers_policy_config.name, MAX_POLICY_NAME_LEN)
    }
}
