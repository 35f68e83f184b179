use std::path::PathBuf;

use tracing::{debug, error, info, warn};

use super::{disconnect_quietly, fetch_current_user, now_ts};
use crate::bundle;
use crate::client::{ApiSpec, LocalStoreDecoder, ProtocolClient, SessionFlag};
use crate::compat;
use crate::config::DeviceOverrides;
use crate::error::{PortError, Result};
use crate::fingerprint::{self, HostPlatform};
use tdport_protocol::{AccountInfo, Bundle, DeviceRecord, UserProfile};

/// Inputs of one export.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExportRequest {
	pub local_store: PathBuf,
	pub out_dir: PathBuf,
	/// Shared basename of the document and artifact; also the fingerprint seed.
	pub basename: String,
	pub app_id: Option<i64>,
	pub app_hash: Option<String>,
}

impl ExportRequest {
	pub fn new(local_store: impl Into<PathBuf>, out_dir: impl Into<PathBuf>, basename: impl Into<String>) -> Self {
		Self {
			local_store: local_store.into(),
			out_dir: out_dir.into(),
			basename: basename.into(),
			app_id: None,
			app_hash: None,
		}
	}

	pub fn with_api(mut self, app_id: Option<i64>, app_hash: Option<String>) -> Self {
		self.app_id = app_id;
		self.app_hash = app_hash;
		self
	}
}

/// Files produced by a successful export.
#[derive(Debug, Clone)]
pub struct ExportReport {
	pub document: PathBuf,
	pub artifact: PathBuf,
	pub bundle: Bundle,
}

/// Local store -> bundle.
pub struct ExportPipeline<'a> {
	decoder: &'a dyn LocalStoreDecoder,
	host: HostPlatform,
	overrides: DeviceOverrides,
	flag: SessionFlag,
}

impl<'a> ExportPipeline<'a> {
	pub fn new(decoder: &'a dyn LocalStoreDecoder, host: HostPlatform, overrides: DeviceOverrides) -> Self {
		Self {
			decoder,
			host,
			overrides,
			flag: SessionFlag::default(),
		}
	}

	pub fn with_session_flag(mut self, flag: SessionFlag) -> Self {
		self.flag = flag;
		self
	}

	/// Runs the export and reports success. Failures are logged, never returned.
	pub async fn run(&self, request: &ExportRequest) -> bool {
		match self.execute(request).await {
			Ok(report) => {
				info!(
					target = "tdport.export",
					document = %report.document.display(),
					artifact = %report.artifact.display(),
					"bundle exported"
				);
				true
			}
			Err(err) => {
				error!(target = "tdport.export", stage = err.stage(), source = %request.local_store.display(), error = %err, "export failed");
				false
			}
		}
	}

	/// Runs the export, returning the failing stage as a typed error.
	///
	/// A session artifact that was already written when conversion failed is
	/// left in place.
	pub async fn execute(&self, request: &ExportRequest) -> Result<ExportReport> {
		validate_basename(&request.basename)?;
		if !request.local_store.is_dir() {
			return Err(PortError::Decode(format!("{} is not a directory", request.local_store.display())));
		}
		std::fs::create_dir_all(&request.out_dir)?;

		compat::normalize(&request.local_store);

		info!(target = "tdport.export", source = %request.local_store.display(), "decoding local store");
		let identities = self
			.decoder
			.open(&request.local_store)
			.await
			.map_err(|e| PortError::Decode(format!("{}: {e}", request.local_store.display())))?;
		if identities.account_count() == 0 {
			return Err(PortError::Decode(format!("no accounts in {}", request.local_store.display())));
		}

		let api = ApiSpec::resolve(request.app_id, request.app_hash.as_deref());
		let artifact = bundle::artifact_path(&request.out_dir, &request.basename);
		debug!(target = "tdport.export", artifact = %artifact.display(), app_id = api.app_id, "converting identity");

		let mut client = identities
			.to_client_session(&artifact, self.flag, api.clone())
			.await
			.map_err(|e| PortError::Conversion(format!("building client session: {e}")))?;
		if let Err(err) = client.connect().await {
			disconnect_quietly(client.as_mut()).await;
			return Err(PortError::Conversion(format!("connecting converted session: {err}")));
		}

		let user = fetch_current_user(client.as_mut(), "export").await;
		let live = fetch_live_device(client.as_mut()).await;
		disconnect_quietly(client.as_mut()).await;

		let synthesized = fingerprint::synthesize(&request.basename, &self.host);
		let device = fingerprint::resolve_device_metadata(&self.overrides, live.as_ref(), synthesized);

		let bundle = Bundle {
			app_id: api.app_id,
			app_hash: api.app_hash,
			session_file: request.basename.clone(),
			device,
			proxy: None,
			account: account_info(user.as_ref()),
		};

		ensure_artifact(&artifact)?;
		let document = bundle::encode(&bundle, &request.out_dir, &request.basename)?;

		Ok(ExportReport { document, artifact, bundle })
	}
}

fn validate_basename(basename: &str) -> Result<()> {
	let invalid = basename.trim().is_empty() || basename.contains(['/', '\\']) || basename == "." || basename == "..";
	if invalid {
		return Err(PortError::Config(format!("invalid bundle basename {basename:?}")));
	}
	Ok(())
}

/// The current-device record, if the client can supply one.
async fn fetch_live_device(client: &mut dyn ProtocolClient) -> Option<DeviceRecord> {
	match client.authorizations().await {
		Ok(records) => {
			let current = fingerprint::current_device(&records).cloned();
			if current.is_none() {
				debug!(target = "tdport.export", count = records.len(), "no current device among authorizations");
			}
			current
		}
		Err(err) => {
			warn!(target = "tdport.export", error = %err, "could not read authorizations; using synthesized device metadata");
			None
		}
	}
}

fn account_info(user: Option<&UserProfile>) -> AccountInfo {
	let mut info = AccountInfo {
		last_check_time: Some(now_ts()),
		..Default::default()
	};
	if let Some(user) = user {
		info.id = Some(user.id);
		info.phone = user.phone.clone();
		info.username = user.username.clone();
		info.first_name = user.first_name.clone();
		info.last_name = user.last_name.clone();
		info.is_premium = Some(user.premium);
		info.has_profile_pic = Some(user.has_profile_pic);
	}
	info
}

fn ensure_artifact(artifact: &std::path::Path) -> Result<()> {
	match std::fs::metadata(artifact) {
		Ok(meta) if meta.is_file() && meta.len() > 0 => Ok(()),
		Ok(_) => Err(PortError::Conversion(format!("session artifact {} is empty", artifact.display()))),
		Err(_) => Err(PortError::Conversion(format!("session artifact {} was not written", artifact.display()))),
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn basename_must_be_a_plain_name() {
		assert!(validate_basename("acct1").is_ok());
		assert!(validate_basename("my.account").is_ok());
		for bad in ["", "  ", "a/b", "a\\b", "..", "."] {
			assert!(matches!(validate_basename(bad), Err(PortError::Config(_))), "{bad:?}");
		}
	}

	#[test]
	fn account_info_copies_profile() {
		let user = UserProfile {
			id: 9,
			username: Some("neo".into()),
			premium: true,
			..Default::default()
		};
		let info = account_info(Some(&user));
		assert_eq!(info.id, Some(9));
		assert_eq!(info.username.as_deref(), Some("neo"));
		assert_eq!(info.is_premium, Some(true));
		assert_eq!(info.has_profile_pic, Some(false));
		assert!(info.last_check_time.is_some());

		let empty = account_info(None);
		assert_eq!(empty.id, None);
		assert_eq!(empty.is_premium, None);
	}
}
