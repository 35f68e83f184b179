//! Export, import and direct authorization flows.
//!
//! These are the only parts of the crate that touch the filesystem and the
//! external collaborators. Each exposes `execute`, which returns a typed
//! [`crate::PortError`], and `run`, which logs the failure with the stage
//! that produced it and reports a plain boolean.

mod authorize;
mod export;
mod import;

pub use authorize::{AuthorizeReport, AuthorizeRequest, DirectAuthorizer, session_tag};
pub use export::{ExportPipeline, ExportReport, ExportRequest};
pub use import::{ImportPipeline, ImportReport};

use std::time::{SystemTime, UNIX_EPOCH};

use tracing::{debug, warn};

use crate::client::ProtocolClient;
use tdport_protocol::UserProfile;

pub(crate) fn now_ts() -> i64 {
	SystemTime::now()
		.duration_since(UNIX_EPOCH)
		.map(|d| d.as_secs() as i64)
		.unwrap_or(0)
}

/// Reads the logged-in user; failures only cost the informational fields.
pub(crate) async fn fetch_current_user(client: &mut dyn ProtocolClient, flow: &'static str) -> Option<UserProfile> {
	match client.current_user().await {
		Ok(Some(user)) => Some(user),
		Ok(None) => {
			warn!(target = "tdport", flow, "client reported no current user");
			None
		}
		Err(err) => {
			warn!(target = "tdport", flow, error = %err, "could not fetch current user");
			None
		}
	}
}

pub(crate) async fn disconnect_quietly(client: &mut dyn ProtocolClient) {
	if let Err(err) = client.disconnect().await {
		debug!(target = "tdport", error = %err, "disconnect failed");
	}
}
