//! Newline-delimited JSON envelope spoken with the driver process.
//!
//! Request:
//! ```json
//! { "id": 3, "guid": "identities@1", "method": "identities.toClientSession", "params": { } }
//! ```
//!
//! Response, success or failure:
//! ```json
//! { "id": 3, "result": { "guid": "client@2" } }
//! { "id": 3, "error": { "error": { "message": "no such directory", "name": "NotFound" } } }
//! ```

use serde::{Deserialize, Serialize};
use serde_json::Value;

/// GUID addressing the driver itself rather than a remote object.
pub const ROOT_GUID: &str = "";

/// Request written to the driver's stdin.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Request {
	/// Unique request ID for correlating responses
	pub id: u32,
	/// Handle of the target object, or [`ROOT_GUID`]
	pub guid: String,
	/// Method name to invoke
	pub method: String,
	/// Method parameters as JSON object
	pub params: Value,
}

/// Response read from the driver's stdout.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Response {
	/// Request ID this response correlates to
	pub id: u32,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub result: Option<Value>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub error: Option<ErrorWrapper>,
}

/// Wrapper for protocol error payload
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorWrapper {
	pub error: ErrorPayload,
}

/// Protocol error details
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorPayload {
	pub message: String,
	/// Error kind, e.g. `NotFound`
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub stack: Option<String>,
}

/// Result payload of calls that create a remote object.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandleResult {
	pub guid: String,
	/// Number of decoded accounts, present for `store.open`.
	#[serde(default)]
	pub accounts: usize,
}
