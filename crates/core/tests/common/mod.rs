//! In-memory stand-ins for the decoder and protocol client.
//!
//! The fake decoder treats a directory as a valid local store when it holds a
//! `key_data` file; the file's content is the account count (empty means one).
//! This makes the compat normalizer part of every flow: stores written with
//! the drifted `key_datas` name only decode after normalization.

#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use tdport::client::ClientResult;
use tdport::fingerprint::{HostPlatform, OsFamily};
use tdport::{ApiSpec, ClientError, ClientFactory, ClientParams, DeviceRecord, IdentitySet, LocalStoreDecoder, ProtocolClient, SessionFlag, UserProfile};

pub const SESSION_BYTES: &[u8] = b"fake-session-artifact";

/// Builds a store directory with the given marker file name and account count.
pub fn make_store(dir: &Path, marker: &str, accounts: usize) -> PathBuf {
	std::fs::create_dir_all(dir).expect("store dir");
	std::fs::write(dir.join(marker), accounts.to_string()).expect("marker file");
	dir.to_path_buf()
}

pub fn linux_host() -> HostPlatform {
	HostPlatform {
		family: OsFamily::Linux,
		release: "6.8.0-45-generic".into(),
		pointer_width: 64,
		language: Some("en".into()),
	}
}

pub fn sample_user() -> UserProfile {
	UserProfile {
		id: 4242,
		phone: Some("15550001111".into()),
		username: Some("ada".into()),
		first_name: Some("Ada".into()),
		last_name: None,
		premium: true,
		has_profile_pic: false,
	}
}

/// Scripted client behaviour shared by the decoder and the factory.
#[derive(Clone)]
pub struct Behaviour {
	pub authorized: bool,
	pub authorized_error: bool,
	pub connect_error: bool,
	pub user: Option<UserProfile>,
	pub devices: Option<Vec<DeviceRecord>>,
	pub session_string: String,
	pub write_artifact: bool,
	/// Fail client construction after the artifact was written.
	pub session_error: bool,
}

impl Default for Behaviour {
	fn default() -> Self {
		Self {
			authorized: true,
			authorized_error: false,
			connect_error: false,
			user: Some(sample_user()),
			devices: Some(Vec::new()),
			session_string: "1BQANOTEuMTA4LjU2LjE1MwG7".into(),
			write_artifact: true,
			session_error: false,
		}
	}
}

/// Every client call, in order.
pub type CallLog = Arc<Mutex<Vec<String>>>;

pub struct FakeClient {
	behaviour: Behaviour,
	log: CallLog,
}

impl FakeClient {
	fn record(&self, call: &str) {
		self.log.lock().expect("log").push(call.to_string());
	}
}

#[async_trait]
impl ProtocolClient for FakeClient {
	async fn connect(&mut self) -> ClientResult<()> {
		self.record("connect");
		if self.behaviour.connect_error {
			return Err(ClientError::Remote {
				name: "ConnectionError".into(),
				message: "network unreachable".into(),
			});
		}
		Ok(())
	}

	async fn is_authorized(&mut self) -> ClientResult<bool> {
		self.record("is_authorized");
		if self.behaviour.authorized_error {
			return Err(ClientError::Remote {
				name: "AuthKeyUnregistered".into(),
				message: "auth key revoked".into(),
			});
		}
		Ok(self.behaviour.authorized)
	}

	async fn current_user(&mut self) -> ClientResult<Option<UserProfile>> {
		self.record("current_user");
		Ok(self.behaviour.user.clone())
	}

	async fn export_session_string(&mut self) -> ClientResult<String> {
		self.record("export_session_string");
		Ok(self.behaviour.session_string.clone())
	}

	async fn authorizations(&mut self) -> ClientResult<Vec<DeviceRecord>> {
		self.record("authorizations");
		self.behaviour.devices.clone().ok_or_else(|| ClientError::Remote {
			name: "FloodWait".into(),
			message: "try later".into(),
		})
	}

	async fn disconnect(&mut self) -> ClientResult<()> {
		self.record("disconnect");
		Ok(())
	}
}

/// Local store decoder that also plays the identity set.
#[derive(Clone, Default)]
pub struct FakeDecoder {
	pub behaviour: Behaviour,
	pub log: CallLog,
	pub artifacts: Arc<Mutex<Vec<(PathBuf, SessionFlag, ApiSpec)>>>,
}

impl FakeDecoder {
	pub fn new(behaviour: Behaviour) -> Self {
		Self {
			behaviour,
			..Default::default()
		}
	}

	pub fn calls(&self) -> Vec<String> {
		self.log.lock().expect("log").clone()
	}
}

#[async_trait]
impl LocalStoreDecoder for FakeDecoder {
	async fn open(&self, dir: &Path) -> ClientResult<Box<dyn IdentitySet>> {
		let marker = dir.join("key_data");
		let content = std::fs::read_to_string(&marker).map_err(|_| ClientError::NotFound(dir.display().to_string()))?;
		let accounts = content.trim().parse().unwrap_or(1);
		Ok(Box::new(FakeIdentities {
			accounts,
			decoder: self.clone(),
		}))
	}
}

struct FakeIdentities {
	accounts: usize,
	decoder: FakeDecoder,
}

#[async_trait]
impl IdentitySet for FakeIdentities {
	fn account_count(&self) -> usize {
		self.accounts
	}

	async fn to_client_session(&self, artifact: &Path, flag: SessionFlag, api: ApiSpec) -> ClientResult<Box<dyn ProtocolClient>> {
		self.decoder.artifacts.lock().expect("artifacts").push((artifact.to_path_buf(), flag, api));
		if self.decoder.behaviour.write_artifact {
			std::fs::write(artifact, SESSION_BYTES)?;
		}
		if self.decoder.behaviour.session_error {
			return Err(ClientError::Remote {
				name: "AuthKeyInvalid".into(),
				message: "could not bind converted session".into(),
			});
		}
		Ok(Box::new(FakeClient {
			behaviour: self.decoder.behaviour.clone(),
			log: Arc::clone(&self.decoder.log),
		}))
	}
}

/// Client factory recording the parameters it was asked for.
#[derive(Default)]
pub struct FakeFactory {
	pub behaviour: Behaviour,
	pub log: CallLog,
	pub params: Mutex<Vec<ClientParams>>,
}

impl FakeFactory {
	pub fn new(behaviour: Behaviour) -> Self {
		Self {
			behaviour,
			..Default::default()
		}
	}

	pub fn calls(&self) -> Vec<String> {
		self.log.lock().expect("log").clone()
	}

	pub fn last_params(&self) -> Option<ClientParams> {
		self.params.lock().expect("params").last().cloned()
	}
}

#[async_trait]
impl ClientFactory for FakeFactory {
	async fn from_artifact(&self, params: ClientParams) -> ClientResult<Box<dyn ProtocolClient>> {
		self.params.lock().expect("params").push(params);
		Ok(Box::new(FakeClient {
			behaviour: self.behaviour.clone(),
			log: Arc::clone(&self.log),
		}))
	}
}
