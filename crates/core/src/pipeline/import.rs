use std::ffi::OsString;
use std::path::{Path, PathBuf};

use tracing::{error, info, warn};

use super::{disconnect_quietly, fetch_current_user};
use crate::bundle::{self, ARTIFACT_EXTENSION};
use crate::client::{ClientFactory, ClientParams};
use crate::error::{PortError, Result};
use crate::proxy;
use tdport_protocol::{Bundle, UserProfile};

/// Outcome of a successful import.
#[derive(Debug, Clone)]
pub struct ImportReport {
	pub bundle: Bundle,
	/// Artifact path without extension.
	pub artifact: PathBuf,
	pub user: Option<UserProfile>,
	pub proxied: bool,
}

/// Bundle -> live, authorized client.
pub struct ImportPipeline<'a> {
	factory: &'a dyn ClientFactory,
}

impl<'a> ImportPipeline<'a> {
	pub fn new(factory: &'a dyn ClientFactory) -> Self {
		Self { factory }
	}

	/// Imports the bundle and reports whether the session is still usable.
	///
	/// Never modifies the document or the artifact.
	pub async fn run(&self, document: &Path) -> bool {
		match self.execute(document).await {
			Ok(report) => {
				match &report.user {
					Some(user) => info!(
						target = "tdport.import",
						user_id = user.id,
						name = %user.display_name(),
						username = user.username.as_deref().unwrap_or(""),
						"session is authorized"
					),
					None => info!(target = "tdport.import", "session is authorized"),
				}
				true
			}
			Err(err) => {
				error!(target = "tdport.import", stage = err.stage(), bundle = %document.display(), error = %err, "import failed");
				false
			}
		}
	}

	pub async fn execute(&self, document: &Path) -> Result<ImportReport> {
		if !document.is_file() {
			return Err(PortError::Config(format!("bundle {} does not exist", document.display())));
		}
		let (bundle, artifact) = bundle::decode(document)?;

		let artifact_file = with_artifact_extension(&artifact);
		if !artifact_file.is_file() {
			return Err(PortError::Config(format!("session artifact {} is missing", artifact_file.display())));
		}

		let proxy = proxy::build_proxy(bundle.proxy.as_ref());
		if bundle.proxy.is_some() && proxy.is_none() {
			warn!(target = "tdport.import", "proxy block unusable; connecting directly");
		}
		let proxied = proxy.is_some();

		let params = ClientParams {
			session: artifact.clone(),
			app_id: bundle.app_id,
			app_hash: bundle.app_hash.clone(),
			proxy,
		};
		info!(target = "tdport.import", artifact = %artifact_file.display(), app_id = bundle.app_id, proxied, "opening session");

		let mut client = self
			.factory
			.from_artifact(params)
			.await
			.map_err(|e| PortError::Conversion(format!("building client: {e}")))?;
		if let Err(err) = client.connect().await {
			disconnect_quietly(client.as_mut()).await;
			return Err(PortError::Conversion(format!("connecting: {err}")));
		}

		let authorized = match client.is_authorized().await {
			Ok(authorized) => authorized,
			Err(err) => {
				disconnect_quietly(client.as_mut()).await;
				return Err(PortError::Validation(format!("authorization check failed: {err}")));
			}
		};
		if !authorized {
			disconnect_quietly(client.as_mut()).await;
			return Err(PortError::Validation("session is no longer authorized".into()));
		}

		let user = fetch_current_user(client.as_mut(), "import").await;
		disconnect_quietly(client.as_mut()).await;

		Ok(ImportReport {
			bundle,
			artifact,
			user,
			proxied,
		})
	}
}

/// Appends `.session` without touching any dot already in the stem.
fn with_artifact_extension(artifact: &Path) -> PathBuf {
	let mut name = OsString::from(artifact.as_os_str());
	name.push(".");
	name.push(ARTIFACT_EXTENSION);
	PathBuf::from(name)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn extension_is_appended_not_replaced() {
		assert_eq!(with_artifact_extension(Path::new("/b/acct1")), PathBuf::from("/b/acct1.session"));
		assert_eq!(with_artifact_extension(Path::new("/b/my.account")), PathBuf::from("/b/my.account.session"));
	}
}
