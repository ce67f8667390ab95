//! Code of the viewer-request CloudFront Functions.
//!
//! These are javascript sources executed by cloudfront's own runtime.
//! We only template them.

use serde_json::Value;

use crate::configuration::Variant;

pub const RUNTIME: &str = "cloudfront-js-1.0";

/// extensions served as-is by the single page app function.
/// any other path is rewritten to `/index.html`.
pub const ASSET_EXTENSIONS: [&str; 14] = [
    "css", "gif", "ico", "jpg", "jpeg", "js", "png", "txt", "svg", "woff", "woff2", "ttf", "map", "json",
];

const FORWARD_HOST: &str = r#"    request.headers["x-forwarded-host"] = request.headers["host"];"#;

/// the function url origin overwrites `host`, keep the original one around.
pub fn plain_request_code() -> String {
    format!(
r#"function handler(event) {{
    var request = event.request;
{FORWARD_HOST}
    return request;
}}"#)
}

pub fn single_page_app_request_code(redirect_code: &str) -> String {
    let extensions = ASSET_EXTENSIONS.join("|");
    format!(
r#"var REDIRECT_REGEX = /^[^.]+$|\.(?!({extensions})$)([^.]+$)/;

function handler(event) {{
    var request = event.request;
{FORWARD_HOST}
    if (REDIRECT_REGEX.test(request.uri)) {{
        request.uri = "/index.html";
    }}{redirect_code}
    return request;
}}"#)
}

/// permanently redirects every domain except the first one to the first one.
/// Empty when there's nothing to redirect.
pub fn redirect_to_main_domain(domains: &[String]) -> String {
    if domains.len() < 2 {
        return String::new();
    }
    let main_domain = Value::String(domains[0].clone());
    format!(
r#"
    var mainDomain = {main_domain};
    if (request.headers["host"].value !== mainDomain) {{
        return {{
            statusCode: 301,
            statusDescription: "Moved Permanently",
            headers: {{
                location: {{
                    value: "https://" + mainDomain + request.uri
                }}
            }}
        }};
    }}"#)
}

pub fn viewer_request_code(variant: Variant, domains: &[String], redirect_to_main: bool) -> String {
    match variant {
        Variant::Plain => plain_request_code(),
        Variant::SinglePageApp => {
            let redirect_code = if redirect_to_main {
                if domains.len() < 2 {
                    log::warn!("redirectToMainDomain is enabled but less than 2 domains are configured, ignoring it");
                }
                redirect_to_main_domain(domains)
            } else {
                String::new()
            };
            single_page_app_request_code(&redirect_code)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn domains(list: &[&str]) -> Vec<String> {
        list.iter().map(|d| d.to_string()).collect()
    }

    #[test]
    fn plain_copies_the_host_header() {
        let code = viewer_request_code(Variant::Plain, &[], false);
        assert_eq!(code, "function handler(event) {\n    var request = event.request;\n    request.headers[\"x-forwarded-host\"] = request.headers[\"host\"];\n    return request;\n}");
    }

    #[test]
    fn single_page_app_rewrites_to_index() {
        let code = viewer_request_code(Variant::SinglePageApp, &[], false);
        assert!(code.starts_with(r#"var REDIRECT_REGEX = /^[^.]+$|\.(?!(css|gif|ico|jpg|jpeg|js|png|txt|svg|woff|woff2|ttf|map|json)$)([^.]+$)/;"#));
        assert!(code.contains(r#"request.uri = "/index.html";"#));
        assert!(code.contains(r#"request.headers["x-forwarded-host"] = request.headers["host"];"#));
        assert!(!code.contains("Moved Permanently"));
    }

    #[test]
    fn redirect_needs_at_least_two_domains() {
        assert_eq!(redirect_to_main_domain(&domains(&["example.com"])), "");
        let code = viewer_request_code(Variant::SinglePageApp, &domains(&["example.com"]), true);
        assert!(!code.contains("Moved Permanently"));

        let code = viewer_request_code(Variant::SinglePageApp, &domains(&["example.com", "www.example.com"]), true);
        assert!(code.contains(r#"var mainDomain = "example.com";"#));
        assert!(code.contains(r#"if (request.headers["host"].value !== mainDomain) {"#));
        assert!(code.contains(r#"value: "https://" + mainDomain + request.uri"#));
    }

    #[test]
    fn main_domain_is_emitted_as_a_string_literal() {
        let code = redirect_to_main_domain(&domains(&["ex\"ample\\.com", "www.example.com"]));
        assert!(code.contains(r#"var mainDomain = "ex\"ample\\.com";"#), "{code}");
    }

    #[test]
    fn redirect_is_opt_in() {
        let code = viewer_request_code(Variant::SinglePageApp, &domains(&["example.com", "www.example.com"]), false);
        assert!(!code.contains("Moved Permanently"));
    }
}
