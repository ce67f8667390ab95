use crate::errors::LiftError;

pub const DEFAULT_REGION: &str = "us-east-1";
pub const DEFAULT_STAGE: &str = "dev";

pub const VALID_AWS_REGIONS: &[&str] = &[
    "us-east-1",
    "us-east-2",
    "us-west-1",
    "us-west-2",
    "ca-central-1",
    "ca-west-1",
    "eu-north-1",
    "eu-west-3",
    "eu-west-2",
    "eu-west-1",
    "eu-central-1",
    "eu-central-2",
    "eu-south-1",
    "eu-south-2",
    "ap-south-1",
    "ap-south-2",
    "ap-northeast-1",
    "ap-northeast-2",
    "ap-northeast-3",
    "ap-southeast-1",
    "ap-southeast-2",
    "ap-southeast-3",
    "ap-southeast-4",
    "ap-east-1",
    "sa-east-1",
    "cn-north-1",
    "cn-northwest-1",
    "us-gov-east-1",
    "us-gov-west-1",
    "me-south-1",
    "me-central-1",
    "il-central-1",
    "af-south-1",
];

pub fn verify_region(r: &str) -> Option<String> {
    if !VALID_AWS_REGIONS.contains(&r) {
        Some(format!("Invalid region code {:?}\nMust be one of {:?}", r, VALID_AWS_REGIONS))
    } else {
        None
    }
}

/// Naming state shared by every construct of a service.
/// Constructs receive it explicitly instead of reading globals.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AwsProvider {
    stack_name: String,
    region: String,
}

impl AwsProvider {
    pub fn new(stack_name: &str, region: &str) -> Result<Self, LiftError> {
        if let Some(err) = verify_region(region) {
            return Err(LiftError::Provider(err));
        }
        aws_cfn_stack::validate_stack_name(stack_name).map_err(LiftError::Provider)?;
        Ok(Self { stack_name: stack_name.to_string(), region: region.to_string() })
    }

    /// the serverless framework names stacks `<service>-<stage>`.
    pub fn for_service(service: &str, stage: &str, region: &str) -> Result<Self, LiftError> {
        Self::new(&format!("{service}-{stage}"), region)
    }

    pub fn stack_name(&self) -> &str {
        &self.stack_name
    }

    pub fn region(&self) -> &str {
        &self.region
    }

    /// `<stack>-<suffix>` restricted to `[A-Za-z0-9-_]`.
    /// Names longer than `max_len` keep their end, which is the
    /// part that differs between resources of the same stack.
    pub fn physical_name(&self, suffix: &str, max_len: usize) -> String {
        let name: String = format!("{}-{}", self.stack_name, suffix)
            .chars()
            .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c } else { '-' })
            .collect();
        if name.len() > max_len {
            name[name.len() - max_len..].to_string()
        } else {
            name
        }
    }
}

/// `landing-page` -> `LandingPage`. Empty if the id has no alphanumeric characters.
pub fn to_logical_id(id: &str) -> String {
    id.split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|part| !part.is_empty())
        .map(upper_first)
        .collect()
}

fn upper_first(s: &str) -> String {
    let mut chars = s.chars();
    match chars.next() {
        Some(first) => first.to_ascii_uppercase().to_string() + chars.as_str(),
        None => String::new(),
    }
}

/// logical id serverless gives to the function URL of `function_name`.
pub fn function_url_logical_id(function_name: &str) -> String {
    let normalized = function_name.replace('-', "Dash").replace('_', "Underscore");
    format!("{}LambdaFunctionUrl", upper_first(&normalized))
}
