use std::path::PathBuf;

use anyhow::Result;
use tdport::{ExportPipeline, ExportRequest};

use super::CommandContext;
use crate::output;

pub async fn execute(ctx: &CommandContext, source: PathBuf, out_dir: PathBuf, basename: String, api_id: Option<i64>, api_hash: Option<String>) -> Result<()> {
	let request = ExportRequest::new(source, out_dir, basename).with_api(api_id, api_hash);
	run(ctx, &request).await
}

pub(super) async fn run(ctx: &CommandContext, request: &ExportRequest) -> Result<()> {
	let pipeline = ExportPipeline::new(&ctx.backend, ctx.host.clone(), ctx.overrides.clone());
	match pipeline.execute(request).await {
		Ok(report) => {
			output::success("export", format!("{} + {}", report.document.display(), report.artifact.display()));
			Ok(())
		}
		Err(err) => {
			output::failure("export", &err);
			Err(err.into())
		}
	}
}
