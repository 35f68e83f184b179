mod authorize;
mod auto;
mod export;
mod import;
mod inspect;

use anyhow::Result;
use tdport::config::DeviceOverrides;
use tdport::driver::{DriverBackend, DriverConfig};
use tdport::fingerprint::HostPlatform;

use crate::cli::{Cli, Commands};

/// Process-wide inputs shared by the modes.
pub struct CommandContext {
	pub backend: DriverBackend,
	pub host: HostPlatform,
	pub overrides: DeviceOverrides,
}

impl CommandContext {
	pub fn new(driver: Option<String>, driver_args: Vec<String>) -> Self {
		let config = DriverConfig::from_env().with_program(driver).with_args(driver_args);
		Self {
			backend: DriverBackend::new(config),
			host: HostPlatform::detect(),
			overrides: DeviceOverrides::from_env(),
		}
	}
}

pub async fn dispatch(cli: Cli) -> Result<()> {
	let ctx = CommandContext::new(cli.driver, cli.driver_args);
	match cli.command {
		Some(Commands::Export {
			source,
			out_dir,
			basename,
			api_id,
			api_hash,
		}) => export::execute(&ctx, source, out_dir, basename, api_id, api_hash).await,
		Some(Commands::Import { bundle }) => import::execute(&ctx, &bundle).await,
		Some(Commands::Auto { out }) => auto::execute(&ctx, out).await,
		None => auto::execute(&ctx, auto::DEFAULT_OUT_DIR.into()).await,
		Some(Commands::Authorize { source, name }) => authorize::execute(&ctx, source, name).await,
		Some(Commands::Inspect { bundle }) => inspect::execute(&bundle),
	}
}
