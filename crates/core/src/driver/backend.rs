use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use serde::de::DeserializeOwned;
use serde_json::{Value, json};
use tokio::sync::OnceCell;
use tracing::debug;

use super::connection::ConnectionLike;
use super::process::DriverProcess;
use crate::client::{ApiSpec, ClientFactory, ClientParams, ClientResult, IdentitySet, LocalStoreDecoder, ProtocolClient, SessionFlag};
use crate::config::{ENV_DRIVER, lookup_non_empty};
use crate::error::ClientError;
use tdport_protocol::{DeviceRecord, HandleResult, ROOT_GUID, UserProfile};

/// How to start the driver program.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DriverConfig {
	pub program: Option<String>,
	pub args: Vec<String>,
}

impl DriverConfig {
	/// Program from `TDPORT_DRIVER`, no arguments.
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		Self {
			program: lookup_non_empty(&lookup, ENV_DRIVER),
			args: Vec::new(),
		}
	}

	/// An explicit program replaces the environment's.
	pub fn with_program(mut self, program: Option<String>) -> Self {
		if program.is_some() {
			self.program = program;
		}
		self
	}

	pub fn with_args(mut self, args: Vec<String>) -> Self {
		self.args = args;
		self
	}
}

/// Decoder and client factory backed by the driver process.
///
/// The process is started on first use, so commands that fail validation
/// never need one.
pub struct DriverBackend {
	config: DriverConfig,
	connection: OnceCell<Arc<dyn ConnectionLike>>,
}

impl DriverBackend {
	pub fn new(config: DriverConfig) -> Self {
		Self {
			config,
			connection: OnceCell::new(),
		}
	}

	/// Uses an already established connection instead of spawning.
	pub fn with_connection(connection: Arc<dyn ConnectionLike>) -> Self {
		Self {
			config: DriverConfig::default(),
			connection: OnceCell::new_with(Some(connection)),
		}
	}

	pub fn config(&self) -> &DriverConfig {
		&self.config
	}

	async fn connection(&self) -> ClientResult<Arc<dyn ConnectionLike>> {
		let connection = self
			.connection
			.get_or_try_init(|| async {
				let program = self.config.program.as_deref().ok_or(ClientError::NotConfigured)?;
				let process = DriverProcess::spawn(program, &self.config.args)?;
				Ok::<Arc<dyn ConnectionLike>, ClientError>(Arc::new(process))
			})
			.await?;
		Ok(Arc::clone(connection))
	}
}

#[async_trait]
impl LocalStoreDecoder for DriverBackend {
	async fn open(&self, dir: &Path) -> ClientResult<Box<dyn IdentitySet>> {
		let connection = self.connection().await?;
		let result = connection.send_message(ROOT_GUID, "store.open", json!({ "path": dir })).await?;
		let handle: HandleResult = parse(result, None)?;
		debug!(target = "tdport.driver", guid = %handle.guid, accounts = handle.accounts, "local store opened");
		Ok(Box::new(RemoteIdentitySet {
			connection,
			guid: handle.guid,
			accounts: handle.accounts,
		}))
	}
}

#[async_trait]
impl ClientFactory for DriverBackend {
	async fn from_artifact(&self, params: ClientParams) -> ClientResult<Box<dyn ProtocolClient>> {
		let connection = self.connection().await?;
		let result = connection.send_message(ROOT_GUID, "client.create", serde_json::to_value(&params)?).await?;
		let handle: HandleResult = parse(result, None)?;
		Ok(Box::new(RemoteClient { connection, guid: handle.guid }))
	}
}

struct RemoteIdentitySet {
	connection: Arc<dyn ConnectionLike>,
	guid: String,
	accounts: usize,
}

#[async_trait]
impl IdentitySet for RemoteIdentitySet {
	fn account_count(&self) -> usize {
		self.accounts
	}

	async fn to_client_session(&self, artifact: &Path, flag: SessionFlag, api: ApiSpec) -> ClientResult<Box<dyn ProtocolClient>> {
		let params = json!({
			"session": artifact,
			"flag": flag,
			"app_id": api.app_id,
			"app_hash": api.app_hash,
		});
		let result = self.connection.send_message(&self.guid, "identities.toClientSession", params).await?;
		let handle: HandleResult = parse(result, None)?;
		Ok(Box::new(RemoteClient {
			connection: Arc::clone(&self.connection),
			guid: handle.guid,
		}))
	}
}

struct RemoteClient {
	connection: Arc<dyn ConnectionLike>,
	guid: String,
}

impl RemoteClient {
	async fn call(&self, method: &str) -> ClientResult<Value> {
		self.connection.send_message(&self.guid, method, json!({})).await
	}
}

#[async_trait]
impl ProtocolClient for RemoteClient {
	async fn connect(&mut self) -> ClientResult<()> {
		self.call("client.connect").await.map(drop)
	}

	async fn is_authorized(&mut self) -> ClientResult<bool> {
		parse(self.call("client.isAuthorized").await?, Some("authorized"))
	}

	async fn current_user(&mut self) -> ClientResult<Option<UserProfile>> {
		parse(self.call("client.getMe").await?, Some("user"))
	}

	async fn export_session_string(&mut self) -> ClientResult<String> {
		parse(self.call("client.exportSessionString").await?, Some("session"))
	}

	async fn authorizations(&mut self) -> ClientResult<Vec<DeviceRecord>> {
		parse(self.call("client.getAuthorizations").await?, Some("authorizations"))
	}

	async fn disconnect(&mut self) -> ClientResult<()> {
		self.call("client.disconnect").await.map(drop)
	}
}

/// Decodes a result, unwrapping `{ key: ... }` when the driver wraps it.
fn parse<T: DeserializeOwned>(value: Value, key: Option<&str>) -> ClientResult<T> {
	let inner = match key {
		Some(key) => match value {
			Value::Object(mut fields) if fields.contains_key(key) => fields.remove(key).unwrap_or(Value::Null),
			other => other,
		},
		None => value,
	};
	serde_json::from_value(inner).map_err(|e| ClientError::Protocol(e.to_string()))
}
