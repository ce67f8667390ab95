use serde::Serialize;
use serde_json::Value;

use super::{verify_name, CfnResource, StrVal};
use crate::edge_functions::RUNTIME;

const MAX_FUNCTION_NAME_LEN: usize = 64;
/// cloudfront functions are limited to 10KB of code.
const MAX_FUNCTION_CODE_LEN: usize = 10 * 1024;

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct CfnFunction {
    pub name: String,
    pub auto_publish: bool,
    pub function_code: String,
    pub function_config: FunctionConfig,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "PascalCase")]
pub struct FunctionConfig {
    pub comment: String,
    pub runtime: String,
}

impl CfnFunction {
    pub fn new(name: &str, comment: &str, code: String) -> Self {
        Self {
            name: name.to_string(),
            auto_publish: true,
            function_code: code,
            function_config: FunctionConfig {
                comment: comment.to_string(),
                runtime: RUNTIME.to_string(),
            },
        }
    }

    pub fn arn(logical_id: &str) -> StrVal {
        StrVal::GetAtt(logical_id.to_string(), "FunctionARN".to_string())
    }
}

impl CfnResource for CfnFunction {
    fn type_string(&self) -> &'static str {
        "AWS::CloudFront::Function"
    }

    fn properties(&self) -> Result<Value, String> {
        aws_cfn_stack::to_properties(self)
    }

    fn validate(&self) -> Result<(), String> {
        verify_name("function", &self.name, MAX_FUNCTION_NAME_LEN)?;
        if self.function_code.len() > MAX_FUNCTION_CODE_LEN {
            return Err(format!(
                "Function {} has {} bytes of code but at most {MAX_FUNCTION_CODE_LEN} are allowed",
                self.name, self.function_code.len()
            ));
        }
        Ok(())
    }
}
