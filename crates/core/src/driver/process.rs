use std::process::Stdio;
use std::sync::Mutex;

use async_trait::async_trait;
use serde_json::Value;
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tracing::{debug, info};

use super::connection::{Connection, ConnectionLike};
use crate::client::ClientResult;
use crate::error::ClientError;

/// A spawned driver program and the connection over its stdio.
///
/// The child is killed when this value is dropped. Its stderr is inherited so
/// driver diagnostics land next to ours.
pub struct DriverProcess {
	child: Mutex<Child>,
	connection: Connection<ChildStdin, ChildStdout>,
}

impl DriverProcess {
	pub fn spawn(program: &str, args: &[String]) -> ClientResult<Self> {
		info!(target = "tdport.driver", program, ?args, "starting driver");
		let mut cmd = Command::new(program);
		cmd.args(args).stdin(Stdio::piped()).stdout(Stdio::piped()).stderr(Stdio::inherit()).kill_on_drop(true);

		let mut child = cmd.spawn().map_err(|source| ClientError::Spawn {
			program: program.to_string(),
			source,
		})?;
		let stdin = child.stdin.take().ok_or_else(|| ClientError::Protocol("driver stdin unavailable".into()))?;
		let stdout = child.stdout.take().ok_or_else(|| ClientError::Protocol("driver stdout unavailable".into()))?;
		debug!(target = "tdport.driver", pid = child.id(), "driver running");

		Ok(Self {
			child: Mutex::new(child),
			connection: Connection::new(stdin, stdout),
		})
	}

	/// OS pid, while the child has not been reaped.
	pub fn id(&self) -> Option<u32> {
		self.child.lock().ok().and_then(|child| child.id())
	}
}

#[async_trait]
impl ConnectionLike for DriverProcess {
	async fn send_message(&self, guid: &str, method: &str, params: Value) -> ClientResult<Value> {
		self.connection.send_message(guid, method, params).await
	}
}
