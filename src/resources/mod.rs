//! CloudFront resource types, serialized as cloudformation `Properties`.

pub use aws_cfn_stack::{CfnResource, StrVal};

mod cloudfront;
pub use cloudfront::*;
mod policies;
pub use policies::*;
mod function;
pub use function::*;

/// cloudfront names: `[A-Za-z0-9-_]`, bounded length.
pub(crate) fn verify_name(kind: &str, name: &str, max_len: usize) -> Result<(), String> {
    if name.is_empty() || name.len() > max_len {
        return Err(format!("Invalid {kind} name {:?}\nMust be between 1 and {max_len} characters", name));
    }
    if !name.chars().all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_') {
        return Err(format!("Invalid {kind} name {:?}\nMust only contain [A-Za-z0-9-_]", name));
    }
    Ok(())
}
