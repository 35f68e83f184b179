//! Seams to the external local-store decoder and protocol client.
//!
//! Neither the encrypted `tdata` key material nor the remote protocol is
//! handled in this crate. Pipelines only see the traits below; the binary
//! plugs in [`crate::driver::DriverBackend`] and tests plug in in-memory fakes.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use serde::Serialize;
use tracing::warn;

use crate::error::ClientError;
use crate::proxy::ConnectionProxySpec;
use tdport_protocol::{DeviceRecord, UserProfile};

/// Result alias for calls into external collaborators.
pub type ClientResult<T> = std::result::Result<T, ClientError>;

/// Application identity used when building a client.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ApiSpec {
	pub app_id: i64,
	pub app_hash: String,
}

impl ApiSpec {
	/// Telegram Desktop's published application id.
	pub const DESKTOP_APP_ID: i64 = 2040;
	/// Telegram Desktop's published application hash.
	pub const DESKTOP_APP_HASH: &'static str = "b18441a1ff607e10a989891a5462e627";

	/// The well-known desktop identity.
	pub fn desktop() -> Self {
		Self {
			app_id: Self::DESKTOP_APP_ID,
			app_hash: Self::DESKTOP_APP_HASH.to_string(),
		}
	}

	/// Uses the caller's pair when both halves are usable, else the desktop pair.
	pub fn resolve(app_id: Option<i64>, app_hash: Option<&str>) -> Self {
		let app_id = app_id.filter(|id| *id > 0);
		let app_hash = app_hash.map(str::trim).filter(|hash| !hash.is_empty());
		match (app_id, app_hash) {
			(Some(app_id), Some(app_hash)) => Self {
				app_id,
				app_hash: app_hash.to_string(),
			},
			(None, None) => Self::desktop(),
			_ => {
				warn!(target = "tdport", "only one of app id / app hash supplied; using the desktop defaults");
				Self::desktop()
			}
		}
	}
}

/// Whether conversion reuses the desktop session's auth key or logs in anew.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SessionFlag {
	#[default]
	UseCurrent,
	CreateNew,
}

/// Everything needed to rebuild a client from a stored session artifact.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ClientParams {
	/// Artifact path without extension; the client appends its own.
	pub session: PathBuf,
	pub app_id: i64,
	pub app_hash: String,
	pub proxy: Option<ConnectionProxySpec>,
}

/// Opens a local store directory.
#[async_trait]
pub trait LocalStoreDecoder: Send + Sync {
	/// Decodes the store at `dir`; fails with [`ClientError::NotFound`] when
	/// the path is missing or not a valid store.
	async fn open(&self, dir: &Path) -> ClientResult<Box<dyn IdentitySet>>;
}

/// Accounts decoded from one local store.
#[async_trait]
pub trait IdentitySet: Send + Sync {
	fn account_count(&self) -> usize;

	/// Writes a session artifact at `artifact` and returns a client bound to it.
	async fn to_client_session(&self, artifact: &Path, flag: SessionFlag, api: ApiSpec) -> ClientResult<Box<dyn ProtocolClient>>;
}

/// Builds clients from existing session artifacts.
#[async_trait]
pub trait ClientFactory: Send + Sync {
	async fn from_artifact(&self, params: ClientParams) -> ClientResult<Box<dyn ProtocolClient>>;
}

/// A protocol client handle.
#[async_trait]
pub trait ProtocolClient: Send {
	async fn connect(&mut self) -> ClientResult<()>;

	async fn is_authorized(&mut self) -> ClientResult<bool>;

	async fn current_user(&mut self) -> ClientResult<Option<UserProfile>>;

	/// Serializes the live session into the portable string form.
	async fn export_session_string(&mut self) -> ClientResult<String>;

	async fn authorizations(&mut self) -> ClientResult<Vec<DeviceRecord>>;

	async fn disconnect(&mut self) -> ClientResult<()>;
}
