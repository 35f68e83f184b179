use std::path::PathBuf;

use anyhow::Result;
use tdport::ExportRequest;
use tdport::config::DiscoveryConfig;
use tdport::discovery::{LocalStoreDiscovery, account_name};
use tracing::info;

use super::CommandContext;
use crate::output;

pub const DEFAULT_OUT_DIR: &str = "bundles";
pub const DEFAULT_BASENAME: &str = "account";

pub async fn execute(ctx: &CommandContext, out: PathBuf) -> Result<()> {
	let discovery = LocalStoreDiscovery::new(DiscoveryConfig::from_env());
	let candidate = match discovery.resolve(&ctx.backend).await {
		Ok(candidate) => candidate,
		Err(err) => {
			output::failure("auto", &err);
			return Err(err.into());
		}
	};

	let basename = account_name(&candidate).unwrap_or_else(|| DEFAULT_BASENAME.to_string());
	info!(target = "tdport", source = %candidate.path.display(), basename, "exporting discovered store");
	super::export::run(ctx, &ExportRequest::new(candidate.path, out, basename)).await
}
