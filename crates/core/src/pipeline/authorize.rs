use std::path::{Path, PathBuf};

use sha2::{Digest, Sha256};
use tracing::{debug, error, info, warn};

use super::{disconnect_quietly, fetch_current_user};
use crate::bundle;
use crate::client::{ApiSpec, IdentitySet, LocalStoreDecoder, SessionFlag};
use crate::compat;
use crate::error::{PortError, Result};
use tdport_protocol::UserProfile;

/// Label hashed into the temporary artifact name for direct connections.
pub const DIRECT_LABEL: &str = "no_proxy";

/// Default directory for temporary session artifacts.
pub const SESSIONS_DIR: &str = "sessions";

/// First 16 hex chars of the SHA-256 of `label`.
pub fn session_tag(label: &str) -> String {
	let digest = Sha256::digest(label.as_bytes());
	let mut tag = hex::encode(digest);
	tag.truncate(16);
	tag
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizeRequest {
	pub local_store: PathBuf,
	pub name: String,
	pub sessions_dir: PathBuf,
}

impl AuthorizeRequest {
	pub fn new(local_store: impl Into<PathBuf>, name: impl Into<String>) -> Self {
		Self {
			local_store: local_store.into(),
			name: name.into(),
			sessions_dir: PathBuf::from(SESSIONS_DIR),
		}
	}

	pub fn with_sessions_dir(mut self, dir: impl Into<PathBuf>) -> Self {
		self.sessions_dir = dir.into();
		self
	}

	/// Temporary artifact path for this request.
	pub fn artifact(&self) -> PathBuf {
		bundle::artifact_path(&self.sessions_dir, &format!("{}_{}", self.name, session_tag(DIRECT_LABEL)))
	}
}

#[derive(Debug, Clone)]
pub struct AuthorizeReport {
	/// Portable session string; a secret.
	pub session_string: String,
	pub user: Option<UserProfile>,
}

/// Local store -> portable session string, without a bundle.
pub struct DirectAuthorizer<'a> {
	decoder: &'a dyn LocalStoreDecoder,
	api: ApiSpec,
	flag: SessionFlag,
}

impl<'a> DirectAuthorizer<'a> {
	pub fn new(decoder: &'a dyn LocalStoreDecoder, api: ApiSpec) -> Self {
		Self {
			decoder,
			api,
			flag: SessionFlag::default(),
		}
	}

	pub fn with_session_flag(mut self, flag: SessionFlag) -> Self {
		self.flag = flag;
		self
	}

	/// Returns the session string, or `None` after logging the failure.
	pub async fn run(&self, request: &AuthorizeRequest) -> Option<AuthorizeReport> {
		match self.execute(request).await {
			Ok(report) => Some(report),
			Err(err) => {
				error!(target = "tdport", stage = err.stage(), source = %request.local_store.display(), error = %err, "direct authorization failed");
				None
			}
		}
	}

	pub async fn execute(&self, request: &AuthorizeRequest) -> Result<AuthorizeReport> {
		if !request.local_store.is_dir() {
			return Err(PortError::Decode(format!("{} is not a directory", request.local_store.display())));
		}
		compat::normalize(&request.local_store);

		let identities = self
			.decoder
			.open(&request.local_store)
			.await
			.map_err(|e| PortError::Decode(format!("{}: {e}", request.local_store.display())))?;
		if identities.account_count() == 0 {
			return Err(PortError::Decode(format!("no accounts in {}", request.local_store.display())));
		}

		std::fs::create_dir_all(&request.sessions_dir)?;
		let artifact = request.artifact();
		debug!(target = "tdport", artifact = %artifact.display(), "writing temporary session");

		let outcome = self.authorize(identities.as_ref(), &artifact).await;
		remove_artifact(&artifact);
		outcome
	}

	async fn authorize(&self, identities: &dyn IdentitySet, artifact: &Path) -> Result<AuthorizeReport> {
		let mut client = identities
			.to_client_session(artifact, self.flag, self.api.clone())
			.await
			.map_err(|e| PortError::Conversion(format!("building client session: {e}")))?;
		if let Err(err) = client.connect().await {
			disconnect_quietly(client.as_mut()).await;
			return Err(PortError::Conversion(format!("connecting converted session: {err}")));
		}

		let user = fetch_current_user(client.as_mut(), "authorize").await;
		if let Some(user) = &user {
			info!(target = "tdport", user_id = user.id, name = %user.display_name(), "authorized");
		}

		let exported = client.export_session_string().await;
		disconnect_quietly(client.as_mut()).await;
		let session_string = exported.map_err(|e| PortError::Conversion(format!("exporting session string: {e}")))?;
		if session_string.trim().is_empty() {
			return Err(PortError::Conversion("client returned an empty session string".into()));
		}

		Ok(AuthorizeReport { session_string, user })
	}
}

fn remove_artifact(artifact: &Path) {
	match std::fs::remove_file(artifact) {
		Ok(()) => {}
		Err(err) if err.kind() == std::io::ErrorKind::NotFound => {}
		Err(err) => warn!(target = "tdport", artifact = %artifact.display(), error = %err, "could not remove temporary session"),
	}
}
