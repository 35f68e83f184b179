//! Error taxonomy for pipelines and external collaborators.

use thiserror::Error;

/// Failure of a pipeline step.
///
/// Pipelines log these and report a boolean outcome; the variant records
/// which stage of the chain gave up.
#[derive(Debug, Error)]
pub enum PortError {
	/// Missing or invalid bundle input.
	#[error("config error: {0}")]
	Config(String),

	/// No local store, or more than one, could be selected.
	#[error("discovery error: {0}")]
	Discovery(String),

	/// The local store is unreadable or holds no account.
	#[error("decode error: {0}")]
	Decode(String),

	/// The protocol client could not be built or connected.
	#[error("conversion error: {0}")]
	Conversion(String),

	/// The session decodes but is no longer authorized.
	#[error("validation error: {0}")]
	Validation(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}

impl PortError {
	/// Short stage label used as a structured log field.
	pub fn stage(&self) -> &'static str {
		match self {
			PortError::Config(_) => "config",
			PortError::Discovery(_) => "discovery",
			PortError::Decode(_) => "decode",
			PortError::Conversion(_) => "conversion",
			PortError::Validation(_) => "validation",
			PortError::Io(_) => "io",
			PortError::Json(_) => "json",
		}
	}
}

/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, PortError>;

/// Failure reported by an external collaborator (decoder, protocol client, driver).
#[derive(Debug, Error)]
pub enum ClientError {
	#[error("not found: {0}")]
	NotFound(String),

	#[error("{name}: {message}")]
	Remote { name: String, message: String },

	#[error("driver channel closed")]
	ChannelClosed,

	#[error("no driver configured (pass --driver or set TDPORT_DRIVER)")]
	NotConfigured,

	#[error("failed to start driver `{program}`: {source}")]
	Spawn {
		program: String,
		#[source]
		source: std::io::Error,
	},

	#[error("unexpected driver payload: {0}")]
	Protocol(String),

	#[error(transparent)]
	Io(#[from] std::io::Error),

	#[error(transparent)]
	Json(#[from] serde_json::Error),
}
