use std::path::Path;

use anyhow::Result;
use tdport::ImportPipeline;

use super::CommandContext;
use crate::output;

pub async fn execute(ctx: &CommandContext, bundle: &Path) -> Result<()> {
	match ImportPipeline::new(&ctx.backend).execute(bundle).await {
		Ok(report) => {
			let who = report.user.as_ref().map(|u| u.display_name()).unwrap_or_else(|| "unknown user".into());
			let route = if report.proxied { "via proxy" } else { "direct" };
			output::success("import", format!("session authorized as {who} ({route})"));
			Ok(())
		}
		Err(err) => {
			output::failure("import", &err);
			Err(err.into())
		}
	}
}
