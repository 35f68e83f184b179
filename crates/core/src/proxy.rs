//! Proxy description to connection spec mapping.

use serde::Serialize;

use tdport_protocol::ProxyConfig;

/// Proxy protocol understood by the connection layer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum ProxyKind {
	Socks5,
	Socks4,
	Http,
}

impl ProxyKind {
	/// Matches `socks5`, `socks4` or `http`, ignoring case and surrounding space.
	pub fn parse(name: &str) -> Option<Self> {
		match name.trim().to_ascii_lowercase().as_str() {
			"socks5" => Some(Self::Socks5),
			"socks4" => Some(Self::Socks4),
			"http" => Some(Self::Http),
			_ => None,
		}
	}
}

impl std::fmt::Display for ProxyKind {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.write_str(match self {
			ProxyKind::Socks5 => "socks5",
			ProxyKind::Socks4 => "socks4",
			ProxyKind::Http => "http",
		})
	}
}

/// Proxy tuple handed to the client: `(kind, host, port, rdns, username, password)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ConnectionProxySpec {
	pub kind: ProxyKind,
	pub host: String,
	pub port: u16,
	/// Always `true`: names are resolved on the proxy side.
	pub rdns: bool,
	pub username: Option<String>,
	pub password: Option<String>,
}

/// Returns `true` when this build can route connections through a proxy.
pub const fn proxy_supported() -> bool {
	cfg!(feature = "proxy")
}

/// Maps a stored proxy description to a connection spec.
///
/// Never fails. Absent input, an unknown `type`, a missing host or port, or a
/// build without proxy support all yield `None`, and the caller connects
/// directly.
pub fn build_proxy(config: Option<&ProxyConfig>) -> Option<ConnectionProxySpec> {
	let config = config?;
	if !proxy_supported() {
		return None;
	}

	let kind = ProxyKind::parse(config.kind.as_deref()?)?;
	let host = config.host.as_deref().map(str::trim).filter(|host| !host.is_empty())?;
	let port = config.port.as_ref()?.value()?;

	Some(ConnectionProxySpec {
		kind,
		host: host.to_string(),
		port,
		rdns: true,
		username: non_empty(config.username.as_deref()),
		password: non_empty(config.password.as_deref()),
	})
}

fn non_empty(value: Option<&str>) -> Option<String> {
	value.filter(|v| !v.is_empty()).map(str::to_string)
}
