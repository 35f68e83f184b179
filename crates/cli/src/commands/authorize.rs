use std::path::PathBuf;

use anyhow::Result;
use tdport::{ApiSpec, AuthorizeRequest, DirectAuthorizer};

use super::CommandContext;
use crate::output;

pub async fn execute(ctx: &CommandContext, source: PathBuf, name: String) -> Result<()> {
	let request = AuthorizeRequest::new(source, name);
	match DirectAuthorizer::new(&ctx.backend, ApiSpec::desktop()).execute(&request).await {
		Ok(report) => {
			println!("{}", report.session_string);
			Ok(())
		}
		Err(err) => {
			output::failure("authorize", &err);
			Err(err.into())
		}
	}
}
