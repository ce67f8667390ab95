use std::collections::{BTreeMap, HashMap, HashSet};

use async_trait::async_trait;
use aws_sdk_cloudformation::types::{Stack, StackStatus};
use aws_types::region::Region;
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{json, Value};

pub const TEMPLATE_VERSION: &str = "2010-09-09";
/// cloudformation rejects templates with more outputs than this.
pub const MAX_OUTPUTS: usize = 200;

/// a string value inside a cloudformation template. either a literal,
/// or one of the intrinsic functions used to reference other resources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StrVal {
    String(String),
    Ref(String),
    GetAtt(String, String),
    /// `{ "Fn::Select": [index, list] }`. the list is usually a `Split`.
    Select(usize, Box<StrVal>),
    /// `{ "Fn::Split": [delimiter, source] }`
    Split(String, Box<StrVal>),
}

impl StrVal {
    pub fn to_value(&self) -> Value {
        match self {
            StrVal::String(s) => Value::String(s.clone()),
            StrVal::Ref(logical_id) => json!({ "Ref": logical_id }),
            StrVal::GetAtt(logical_id, attribute) => json!({ "Fn::GetAtt": [logical_id, attribute] }),
            StrVal::Select(index, list) => json!({ "Fn::Select": [index.to_string(), list.to_value()] }),
            StrVal::Split(delimiter, source) => json!({ "Fn::Split": [delimiter, source.to_value()] }),
        }
    }

    /// returns the literal string, or None if this value
    /// only resolves at deploy time.
    pub fn as_literal(&self) -> Option<&str> {
        match self {
            StrVal::String(s) => Some(s),
            _ => None,
        }
    }
}

impl Serialize for StrVal {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        self.to_value().serialize(serializer)
    }
}

impl From<&str> for StrVal {
    fn from(value: &str) -> Self {
        StrVal::String(value.to_string())
    }
}

impl From<String> for StrVal {
    fn from(value: String) -> Self {
        StrVal::String(value)
    }
}

/// Implemented by every resource type that can be placed in a stack.
pub trait CfnResource: std::fmt::Debug {
    /// the cloudformation type, eg: `AWS::CloudFront::Distribution`
    fn type_string(&self) -> &'static str;

    /// the `Properties` section of the resource.
    fn properties(&self) -> Result<Value, String>;

    /// resource specific checks that cloudformation would otherwise
    /// only report at deploy time.
    fn validate(&self) -> Result<(), String> {
        Ok(())
    }
}

/// serializes a resource struct into its `Properties` value.
pub fn to_properties<T: Serialize>(resource: &T) -> Result<Value, String> {
    serde_json::to_value(resource).map_err(|e| format!("Failed to serialize resource properties\n{e}"))
}

#[derive(Debug)]
pub struct Resource {
    pub name: String,
    pub properties: Box<dyn CfnResource>,
}

#[derive(Debug, Clone)]
pub struct Output {
    pub name: String,
    pub description: String,
    pub value: StrVal,
}

#[derive(Debug, Default, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedResource {
    #[serde(rename = "Type")]
    pub ty: String,
    #[serde(rename = "Properties")]
    pub properties: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceOutput {
    #[serde(rename = "Description")]
    pub description: String,
    #[serde(rename = "Value")]
    pub value: Value,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SavedTemplate {
    #[serde(rename = "AWSTemplateFormatVersion")]
    pub version: String,
    #[serde(rename = "Resources")]
    pub resources: BTreeMap<String, SavedResource>,
    #[serde(rename = "Outputs", default, skip_serializing_if = "BTreeMap::is_empty")]
    pub outputs: BTreeMap<String, ResourceOutput>,
}

impl Default for SavedTemplate {
    fn default() -> Self {
        Self {
            version: TEMPLATE_VERSION.to_string(),
            resources: Default::default(),
            outputs: Default::default(),
        }
    }
}

impl SavedTemplate {
    /// all resources of the given cloudformation type, keyed by logical id.
    pub fn resources_of_type<'a>(&'a self, ty: &'a str) -> impl Iterator<Item = (&'a String, &'a SavedResource)> + 'a {
        self.resources.iter().filter(move |(_, r)| r.ty == ty)
    }

    // we make it pretty so if a user needs to look at the stack in Cfn console, it looks nice
    pub fn to_json_pretty(&self) -> Result<String, String> {
        serde_json::to_string_pretty(self).map_err(|e| format!("Failed to serialize template\n{:#?}", e))
    }
}

#[derive(Debug, Default)]
pub struct Input {
    pub stack_name: String,
    pub resources: Vec<Resource>,
    pub outputs: Vec<Output>,
}

impl Input {
    pub fn new(stack_name: &str) -> Self {
        Self {
            stack_name: stack_name.to_string(),
            ..Default::default()
        }
    }
}

pub fn verify_logical_id(logical_id: &str) -> Option<String> {
    if logical_id.len() > 255 {
        return Some(format!("Invalid logical id {:?}\nmust be less than 255 characters", logical_id));
    }
    if logical_id.is_empty() {
        return Some(format!("Invalid logical id {:?}\nMust contain at least 1 character", logical_id));
    }
    if !logical_id.chars().all(|c| c.is_ascii_alphanumeric()) {
        return Some(format!("Invalid logical id {:?}\nMust contain only alphanumeric characters [A-Za-z0-9]", logical_id));
    }
    None
}

pub fn validate_stack_name(stack_name: &str) -> Result<(), String> {
    // A stack name can contain only alphanumeric characters (case sensitive) and hyphens.
    // It must start with an alphabetical character and can't be longer than 128 characters.
    let restricion = "Must only consist of alphanumeric characters and hyphens, Must start with an alphabetical character, and cannot be longer than 128 characters.";
    if stack_name.is_empty() || stack_name.len() > 128 {
        return Err(format!("Invalid stack name {}\n{}", stack_name, restricion));
    }
    for (i, c) in stack_name.chars().enumerate() {
        if i == 0 && !c.is_ascii_alphabetic() {
            return Err(format!("Invalid stack name {}\n{}", stack_name, restricion));
        }
        if !c.is_ascii_alphanumeric() && c != '-' {
            return Err(format!("Invalid stack name {}\n{}", stack_name, restricion));
        }
    }
    Ok(())
}

/// validates every resource and output of the stack input
/// and turns them into a template.
pub fn synthesize(input: &Input) -> Result<SavedTemplate, String> {
    validate_stack_name(&input.stack_name)?;
    let mut out_template = SavedTemplate::default();
    for resource in input.resources.iter() {
        if let Some(err) = verify_logical_id(&resource.name) {
            return Err(err);
        }
        if out_template.resources.contains_key(&resource.name) {
            return Err(format!("Duplicate resource '{}' in stack {}", resource.name, input.stack_name));
        }
        if let Err(e) = resource.properties.validate() {
            return Err(format!("Validation failed on resource '{}'\n{e}", resource.name));
        }
        let saved_resource = SavedResource {
            ty: resource.properties.type_string().to_string(),
            properties: resource.properties.properties()?,
        };
        log::debug!("Declared {} {}", saved_resource.ty, resource.name);
        out_template.resources.insert(resource.name.clone(), saved_resource);
    }

    let mut seen_outputs = HashSet::new();
    for output in input.outputs.iter() {
        if let Some(err) = verify_logical_id(&output.name) {
            return Err(err);
        }
        if !seen_outputs.insert(output.name.as_str()) || out_template.resources.contains_key(&output.name) {
            return Err(format!("Duplicate output '{}' in stack {}", output.name, input.stack_name));
        }
        out_template.outputs.insert(output.name.clone(), ResourceOutput {
            description: output.description.clone(),
            value: output.value.to_value(),
        });
    }
    if out_template.outputs.len() > MAX_OUTPUTS {
        return Err(format!("Stack {} declares {} outputs but at most {MAX_OUTPUTS} are allowed", input.stack_name, out_template.outputs.len()));
    }
    log::info!(
        "Synthesized stack {} with {} resources and {} outputs",
        input.stack_name, out_template.resources.len(), out_template.outputs.len()
    );
    Ok(out_template)
}

/// Reads outputs of an already deployed stack.
/// Each call is a single read, there is no retry.
#[async_trait]
pub trait StackOutputReader: Send + Sync {
    /// Ok(None) if either the stack or the output does not exist.
    async fn get_stack_output(&self, stack_name: &str, output_key: &str) -> Result<Option<String>, String>;
}

#[async_trait]
impl StackOutputReader for aws_sdk_cloudformation::Client {
    async fn get_stack_output(&self, stack_name: &str, output_key: &str) -> Result<Option<String>, String> {
        let stack = match describe_stack(self, stack_name).await? {
            Some(stack) => stack,
            None => return Ok(None),
        };
        Ok(find_output(&stack, output_key))
    }
}

/// stack name -> output key -> output value
#[async_trait]
impl StackOutputReader for HashMap<String, HashMap<String, String>> {
    async fn get_stack_output(&self, stack_name: &str, output_key: &str) -> Result<Option<String>, String> {
        Ok(self.get(stack_name).and_then(|outputs| outputs.get(output_key)).cloned())
    }
}

pub async fn client_for_region(region: &str) -> aws_sdk_cloudformation::Client {
    let shared_config = aws_config::from_env()
        .region(Region::new(region.to_string()))
        .load()
        .await;
    aws_sdk_cloudformation::Client::new(&shared_config)
}

fn is_failed_status(status: &StackStatus) -> bool {
    matches!(
        status,
        StackStatus::RollbackComplete |
        StackStatus::CreateFailed |
        StackStatus::DeleteFailed |
        StackStatus::ImportRollbackFailed |
        StackStatus::RollbackFailed |
        StackStatus::UpdateFailed |
        StackStatus::UpdateRollbackFailed
    )
}

/// Ok(None) if the stack does not exist.
pub async fn describe_stack(client: &aws_sdk_cloudformation::Client, name: &str) -> Result<Option<Stack>, String> {
    let resp = match client.describe_stacks().stack_name(name).send().await {
        Ok(d) => d,
        Err(e) => {
            let e_str = format!("{:#?}", e);
            if e_str.contains("does not exist") {
                log::info!("Stack {name} does not exist");
                return Ok(None);
            }
            return Err(e_str);
        }
    };
    let first = match resp.stacks().and_then(|stacks| stacks.first()) {
        Some(first) => first,
        None => return Ok(None),
    };
    match first.stack_status() {
        Some(status) if is_failed_status(status) => {
            let reason = first.stack_status_reason().unwrap_or("Failed to get stack failure reason");
            log::warn!("Stack {name} is in state {:?}: {reason}", status);
        }
        Some(status) => log::debug!("Stack {name} is in state {:?}", status),
        None => {}
    }
    Ok(Some(first.clone()))
}

pub fn find_output(stack: &Stack, output_key: &str) -> Option<String> {
    stack.outputs().unwrap_or_default().iter()
        .find(|output| output.output_key() == Some(output_key))
        .and_then(|output| output.output_value())
        .map(|value| value.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Serialize)]
    #[serde(rename_all = "PascalCase")]
    struct Topic {
        topic_name: StrVal,
    }

    impl CfnResource for Topic {
        fn type_string(&self) -> &'static str {
            "AWS::SNS::Topic"
        }
        fn properties(&self) -> Result<Value, String> {
            to_properties(self)
        }
        fn validate(&self) -> Result<(), String> {
            match self.topic_name.as_literal() {
                Some("") => Err("TopicName cannot be empty".to_string()),
                _ => Ok(()),
            }
        }
    }

    fn topic(name: &str, topic_name: &str) -> Resource {
        Resource { name: name.to_string(), properties: Box::new(Topic { topic_name: topic_name.into() }) }
    }

    #[test]
    fn select_split_serializes_as_intrinsics() {
        let val = StrVal::Select(2, Box::new(StrVal::Split(
            "/".into(),
            Box::new(StrVal::GetAtt("BackendLambdaFunctionUrl".into(), "FunctionUrl".into())),
        )));
        assert_eq!(serde_json::to_value(&val).unwrap(), json!({
            "Fn::Select": ["2", { "Fn::Split": ["/", { "Fn::GetAtt": ["BackendLambdaFunctionUrl", "FunctionUrl"] }] }]
        }));
        assert_eq!(StrVal::Ref("A".into()).to_value(), json!({ "Ref": "A" }));
        assert_eq!(StrVal::from("x").as_literal(), Some("x"));
    }

    #[test]
    fn stack_names_follow_cfn_rules() {
        assert!(validate_stack_name("my-app-dev").is_ok());
        assert!(validate_stack_name("1app").is_err());
        assert!(validate_stack_name("my_app").is_err());
        assert!(validate_stack_name("").is_err());
        assert!(validate_stack_name(&"a".repeat(129)).is_err());
    }

    #[test]
    fn logical_ids_must_be_alphanumeric() {
        assert_eq!(verify_logical_id("ApiCDN"), None);
        assert_eq!(
            verify_logical_id("api-cdn"),
            Some("Invalid logical id \"api-cdn\"\nMust contain only alphanumeric characters [A-Za-z0-9]".to_string())
        );
    }

    #[test]
    fn synthesize_collects_resources_and_outputs() {
        let mut input = Input::new("my-app-dev");
        input.resources.push(topic("Alerts", "alerts"));
        input.outputs.push(Output {
            name: "AlertsArn".into(),
            description: "arn of the alerts topic".into(),
            value: StrVal::Ref("Alerts".into()),
        });
        let template = synthesize(&input).unwrap();
        assert_eq!(template.version, TEMPLATE_VERSION);
        assert_eq!(template.resources["Alerts"].ty, "AWS::SNS::Topic");
        assert_eq!(template.resources["Alerts"].properties, json!({ "TopicName": "alerts" }));
        assert_eq!(template.outputs["AlertsArn"].value, json!({ "Ref": "Alerts" }));
        assert_eq!(template.resources_of_type("AWS::SNS::Topic").count(), 1);
    }

    #[test]
    fn synthesize_rejects_duplicates_and_invalid_resources() {
        let mut input = Input::new("my-app-dev");
        input.resources.push(topic("Alerts", "a"));
        input.resources.push(topic("Alerts", "b"));
        assert_eq!(synthesize(&input).unwrap_err(), "Duplicate resource 'Alerts' in stack my-app-dev");

        let mut input = Input::new("my-app-dev");
        input.resources.push(topic("Alerts", ""));
        assert_eq!(synthesize(&input).unwrap_err(), "Validation failed on resource 'Alerts'\nTopicName cannot be empty");
    }

    #[test]
    fn template_without_outputs_omits_the_section() {
        let mut input = Input::new("my-app-dev");
        input.resources.push(topic("Alerts", "a"));
        let json = serde_json::to_value(synthesize(&input).unwrap()).unwrap();
        assert!(json.get("Outputs").is_none());
    }

    #[tokio::test]
    async fn in_memory_reader_returns_known_outputs() {
        let mut outputs = HashMap::new();
        outputs.insert("my-app-dev".to_string(), HashMap::from([("ApiDomain".to_string(), "api.example.com".to_string())]));
        assert_eq!(outputs.get_stack_output("my-app-dev", "ApiDomain").await.unwrap(), Some("api.example.com".to_string()));
        assert_eq!(outputs.get_stack_output("my-app-dev", "Missing").await.unwrap(), None);
        assert_eq!(outputs.get_stack_output("other", "ApiDomain").await.unwrap(), None);
    }
}
