use std::collections::HashMap;

use lift::{ExposedOutput, Service, Variant};
use serde_json::json;

const SERVICE: &str = r#"
service: shop
provider:
  name: aws
  stage: prod
  region: eu-west-1
constructs:
  api:
    type: mono-api2
    functionName: backend
    forwardedHeaders:
      - X-My-Custom-Header
      - X-My-Other-Custom-Header
  landing-page:
    type: mono-api
    functionName: web_app
    domain:
      - example.com
      - www.example.com
    certificate: arn:aws:acm:us-east-1:123456789012:certificate/abc
    redirectToMainDomain: true
    errorPage: /error.html
"#;

#[test]
fn service_file_synthesizes_both_constructs() {
    let service = Service::parse(SERVICE).unwrap();
    let template = service.synthesize().unwrap();

    assert_eq!(template.resources_of_type("AWS::CloudFront::Distribution").count(), 2);
    assert_eq!(template.resources_of_type("AWS::CloudFront::Function").count(), 2);
    assert_eq!(template.resources_of_type("AWS::CloudFront::ResponseHeadersPolicy").count(), 1);

    let api_headers = &template.resources["ApiOriginRequestPolicy"].properties["OriginRequestPolicyConfig"]["HeadersConfig"];
    assert_eq!(api_headers["HeaderBehavior"], "whitelist");
    assert_eq!(api_headers["Headers"], json!(["X-My-Custom-Header", "X-My-Other-Custom-Header"]));

    let landing = &template.resources["LandingPageCDN"].properties["DistributionConfig"];
    assert_eq!(landing["Comment"], "shop-prod landing-page API CDN");
    assert_eq!(landing["Aliases"], json!(["example.com", "www.example.com"]));
    assert_eq!(landing["Origins"][0]["DomainName"]["Fn::Select"][1]["Fn::Split"][1], json!({
        "Fn::GetAtt": ["WebUnderscoreappLambdaFunctionUrl", "FunctionUrl"]
    }));
    let code = template.resources["LandingPageRequestFunction"].properties["FunctionCode"].as_str().unwrap();
    assert!(code.contains("Moved Permanently"));
    assert!(code.contains("example.com"));

    assert_eq!(template.outputs["LandingPageDomain"].value, json!("example.com"));
    assert_eq!(template.outputs["ApiDomain"].value, json!({ "Fn::GetAtt": ["ApiCDN", "DomainName"] }));
    assert_eq!(template.outputs.len(), 6);
}

#[test]
fn template_output_is_deterministic() {
    let first = Service::parse(SERVICE).unwrap().synthesize().unwrap().to_json_pretty().unwrap();
    let second = Service::parse(SERVICE).unwrap().synthesize().unwrap().to_json_pretty().unwrap();
    assert_eq!(first, second);
    assert!(first.starts_with("{\n  \"AWSTemplateFormatVersion\": \"2010-09-09\""));
}

#[test]
fn one_invalid_construct_fails_the_whole_service() {
    let err = Service::parse(r#"
service: shop
constructs:
  api:
    type: mono-api2
    functionName: backend
    errorPage: error.html
"#).unwrap_err();
    assert!(err.to_string().starts_with("Invalid configuration in 'constructs.api"), "{err}");
}

#[tokio::test]
async fn exposed_outputs_come_from_the_deployed_stack() {
    let service = Service::parse(SERVICE).unwrap();
    let outputs = HashMap::from([(
        "shop-prod".to_string(),
        HashMap::from([
            ("ApiDomain".to_string(), "d111111abcdef8.cloudfront.net".to_string()),
            ("ApiCName".to_string(), "d111111abcdef8.cloudfront.net".to_string()),
        ]),
    )]);

    let api = service.construct("api").unwrap();
    assert_eq!(api.exposed_outputs(), &[ExposedOutput::Url, ExposedOutput::CName]);
    let values = api.outputs(&outputs).await.unwrap();
    assert_eq!(values["url"], "https://d111111abcdef8.cloudfront.net");

    let landing = service.construct("landing-page").unwrap();
    assert_eq!(landing.variant(), Variant::SinglePageApp);
    assert!(landing.outputs(&outputs).await.unwrap().is_empty());
}
