//! Result summaries printed to stdout. Diagnostics go through `tracing`.

use std::path::Path;

use colored::Colorize;
use tdport::{Bundle, PortError};

pub fn success(mode: &str, detail: impl std::fmt::Display) {
	println!("{} {mode}: {detail}", "ok".green().bold());
}

pub fn failure(mode: &str, err: &PortError) {
	println!("{} {mode} [{}]: {err}", "failed".red().bold(), err.stage());
}

/// Keeps the first four characters of a secret.
pub fn mask_secret(secret: &str) -> String {
	let visible: String = secret.chars().take(4).collect();
	let hidden = secret.chars().count().saturating_sub(4);
	format!("{visible}{}", "*".repeat(hidden))
}

/// `key: value` rows describing a decoded bundle, secrets masked.
pub fn bundle_rows(bundle: &Bundle, artifact: &Path) -> Vec<(&'static str, String)> {
	let opt = |value: &Option<String>| value.clone().unwrap_or_else(|| "-".into());
	let mut rows = vec![
		("app_id", bundle.app_id.to_string()),
		("app_hash", mask_secret(&bundle.app_hash)),
		("session_file", bundle.session_file.clone()),
		("artifact", format!("{}.{}", artifact.display(), tdport::bundle::ARTIFACT_EXTENSION)),
		("device", bundle.device.device.clone()),
		("sdk", bundle.device.sdk.clone()),
		("app_version", bundle.device.app_version.clone()),
		("lang", format!("{} / {}", bundle.device.lang_pack, bundle.device.lang_code)),
		("system_lang", format!("{} / {}", bundle.device.system_lang_pack, bundle.device.system_lang_code)),
	];
	match &bundle.proxy {
		Some(proxy) => {
			let port = proxy.port.as_ref().and_then(|p| p.value()).map(|p| p.to_string()).unwrap_or_else(|| "?".into());
			rows.push(("proxy", format!("{} {}:{port}", proxy.kind.as_deref().unwrap_or("?"), proxy.host.as_deref().unwrap_or("?"))));
		}
		None => rows.push(("proxy", "-".into())),
	}
	rows.push(("user_id", bundle.account.id.map(|id| id.to_string()).unwrap_or_else(|| "-".into())));
	rows.push(("username", opt(&bundle.account.username)));
	rows.push(("phone", opt(&bundle.account.phone)));
	rows
}

pub fn print_rows(rows: &[(&'static str, String)]) {
	let width = rows.iter().map(|(key, _)| key.len()).max().unwrap_or(0);
	for (key, value) in rows {
		println!("{:width$}  {value}", key.bold());
	}
}
