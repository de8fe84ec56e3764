//! Command handlers that delegate to `RegistryService`.
//!
//! Handlers follow the canonical pattern:
//! - Signature: `pub async fn execute(ctx: &CliContext, ...) -> Result<()>`
//! - Thin wrappers that call the service and format the result
//! - A failed outcome is printed first, then returned as `CliError::Failed`

pub mod add;
pub mod get;
pub mod list;
pub mod paths;
pub mod probe;
pub mod remove;
pub mod test_all;
pub mod validate;
