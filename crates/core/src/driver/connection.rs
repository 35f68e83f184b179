use std::sync::atomic::{AtomicU32, Ordering};

use async_trait::async_trait;
use serde_json::Value;
use tokio::io::{AsyncBufReadExt, AsyncRead, AsyncWrite, AsyncWriteExt, BufReader, Lines};
use tokio::sync::Mutex;
use tracing::{debug, trace};

use crate::client::ClientResult;
use crate::error::ClientError;
use tdport_protocol::{Request, Response};

/// Error name the driver uses for missing or invalid local stores.
pub const NOT_FOUND_ERROR: &str = "NotFound";

/// Request/response channel to the driver.
#[async_trait]
pub trait ConnectionLike: Send + Sync {
	/// Sends `method` to the object `guid` and waits for its result.
	async fn send_message(&self, guid: &str, method: &str, params: Value) -> ClientResult<Value>;
}

struct Pipe<W, R> {
	writer: W,
	lines: Lines<BufReader<R>>,
}

/// JSON-RPC connection over any async byte pipe.
///
/// Calls are serialized: a request is written, then lines are read until the
/// response carrying the same id arrives. Anything else on the pipe is
/// skipped.
pub struct Connection<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	last_id: AtomicU32,
	pipe: Mutex<Pipe<W, R>>,
}

impl<W, R> Connection<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	pub fn new(writer: W, reader: R) -> Self {
		Self {
			last_id: AtomicU32::new(0),
			pipe: Mutex::new(Pipe {
				writer,
				lines: BufReader::new(reader).lines(),
			}),
		}
	}
}

#[async_trait]
impl<W, R> ConnectionLike for Connection<W, R>
where
	W: AsyncWrite + Unpin + Send + 'static,
	R: AsyncRead + Unpin + Send + 'static,
{
	async fn send_message(&self, guid: &str, method: &str, params: Value) -> ClientResult<Value> {
		let id = self.last_id.fetch_add(1, Ordering::SeqCst);
		let request = Request {
			id,
			guid: guid.to_string(),
			method: method.to_string(),
			params,
		};
		let mut line = serde_json::to_string(&request)?;
		line.push('\n');

		let mut pipe = self.pipe.lock().await;
		trace!(target = "tdport.driver", id, method, guid, "send");
		pipe.writer.write_all(line.as_bytes()).await?;
		pipe.writer.flush().await?;

		loop {
			let Some(raw) = pipe.lines.next_line().await? else {
				return Err(ClientError::ChannelClosed);
			};
			if raw.trim().is_empty() {
				continue;
			}
			let response: Response = match serde_json::from_str(&raw) {
				Ok(response) => response,
				Err(err) => {
					debug!(target = "tdport.driver", error = %err, "ignoring unparseable driver line");
					continue;
				}
			};
			if response.id != id {
				debug!(target = "tdport.driver", expected = id, got = response.id, "ignoring unmatched response");
				continue;
			}
			trace!(target = "tdport.driver", id, ok = response.error.is_none(), "recv");
			return into_result(response);
		}
	}
}

fn into_result(response: Response) -> ClientResult<Value> {
	if let Some(wrapper) = response.error {
		let payload = wrapper.error;
		return Err(match payload.name.as_deref() {
			Some(NOT_FOUND_ERROR) => ClientError::NotFound(payload.message),
			name => ClientError::Remote {
				name: name.unwrap_or("Error").to_string(),
				message: payload.message,
			},
		});
	}
	Ok(response.result.unwrap_or(Value::Null))
}
