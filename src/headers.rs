use crate::errors::ConfigurationError;

/// forwarded when the user doesn't configure `forwardedHeaders`.
pub const DEFAULT_FORWARDED_HEADERS: [&str; 8] = [
    "Accept",
    "Accept-Language",
    "Content-Type",
    "Origin",
    "Referer",
    "User-Agent",
    "X-Requested-With",
    "X-Forwarded-Host",
];

/// cloudfront quota on headers in an origin request policy.
pub const MAX_FORWARDED_HEADERS: usize = 10;

/// always part of the cache key, see `CachePolicy::for_dynamic_content`.
pub const AUTHORIZATION_HEADER: &str = "Authorization";

/// Computes the header allow-list of the origin request policy.
///
/// `Host` can't be forwarded to a function URL, and cloudfront refuses
/// `Authorization` in origin request policies. `Authorization` reaches
/// the origin through the cache policy instead, so it's dropped here.
pub fn compose_forwarded_headers(id: &str, requested: Option<&[String]>) -> Result<Vec<String>, ConfigurationError> {
    let requested = requested.unwrap_or_default();
    if requested.iter().any(|h| h.eq_ignore_ascii_case("Host")) {
        return Err(ConfigurationError::invalid(format!(
            "Invalid value in 'constructs.{id}.forwardedHeaders': the 'Host' header cannot be forwarded (this is an API Gateway limitation). Use the 'X-Forwarded-Host' header in your code instead (it contains the value of the 'Host' header)."
        )));
    }
    let headers: Vec<String> = requested.iter()
        .filter(|h| !h.eq_ignore_ascii_case(AUTHORIZATION_HEADER))
        .cloned()
        .collect();
    if headers.is_empty() {
        log::debug!("Forwarding the default headers for construct {id}");
        return Ok(DEFAULT_FORWARDED_HEADERS.iter().map(|h| h.to_string()).collect());
    }
    if headers.len() > MAX_FORWARDED_HEADERS {
        return Err(ConfigurationError::invalid(format!(
            "Invalid value in 'constructs.{id}.forwardedHeaders': {} headers are configured but only {MAX_FORWARDED_HEADERS} headers can be forwarded (CloudFront limitation).",
            headers.len()
        )));
    }
    log::debug!("Forwarding headers {:?} for construct {id}", headers);
    Ok(headers)
}
