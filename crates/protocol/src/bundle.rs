//! Bundle document schema.

use serde::{Deserialize, Deserializer, Serialize};

/// Canonical key for the application identifier.
pub const APP_ID_KEY: &str = "app_id";
/// Legacy key accepted in place of [`APP_ID_KEY`].
pub const APP_ID_ALIAS: &str = "api_id";
/// Canonical key for the application secret.
pub const APP_HASH_KEY: &str = "app_hash";
/// Legacy key accepted in place of [`APP_HASH_KEY`].
pub const APP_HASH_ALIAS: &str = "api_hash";
/// Key naming the sibling session artifact.
pub const SESSION_FILE_KEY: &str = "session_file";

/// Portable session metadata stored next to a `.session` artifact.
///
/// Serializes as a single flat JSON object. Every optional field is written
/// as `null` when unknown so consecutive exports share one schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Bundle {
	pub app_id: i64,
	pub app_hash: String,
	/// Basename (without extension) of the session artifact.
	pub session_file: String,
	#[serde(flatten)]
	pub device: DeviceMetadata,
	#[serde(default, deserialize_with = "lenient_proxy")]
	pub proxy: Option<ProxyConfig>,
	#[serde(flatten)]
	pub account: AccountInfo,
}

/// Client environment presented to the remote service.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceMetadata {
	pub device: String,
	pub sdk: String,
	pub app_version: String,
	pub system_lang_pack: String,
	pub system_lang_code: String,
	pub lang_pack: String,
	pub lang_code: String,
}

/// Account facts captured at export time. Informational only.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AccountInfo {
	pub id: Option<i64>,
	pub phone: Option<String>,
	pub username: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub is_premium: Option<bool>,
	pub has_profile_pic: Option<bool>,
	/// Unix timestamp (seconds) of the export.
	pub last_check_time: Option<i64>,
}

/// Declarative proxy description as stored in a bundle.
///
/// Every field is optional; whether the description is usable is decided by
/// the proxy builder in `tdport`, not here.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProxyConfig {
	/// `socks5`, `socks4` or `http`, matched case-insensitively.
	#[serde(rename = "type")]
	pub kind: Option<String>,
	pub host: Option<String>,
	pub port: Option<ProxyPort>,
	pub username: Option<String>,
	pub password: Option<String>,
}

/// Proxy port as found in hand-edited bundles: a number or a numeric string.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ProxyPort {
	Number(u64),
	Text(String),
}

impl ProxyPort {
	/// Returns the port when it is a valid non-zero TCP port.
	pub fn value(&self) -> Option<u16> {
		let raw = match self {
			ProxyPort::Number(n) => *n,
			ProxyPort::Text(s) => s.trim().parse().ok()?,
		};
		u16::try_from(raw).ok().filter(|port| *port != 0)
	}
}

impl From<u16> for ProxyPort {
	fn from(port: u16) -> Self {
		ProxyPort::Number(port.into())
	}
}

fn lenient_proxy<'de, D>(deserializer: D) -> Result<Option<ProxyConfig>, D::Error>
where
	D: Deserializer<'de>,
{
	let value = Option::<serde_json::Value>::deserialize(deserializer)?;
	Ok(value.and_then(|value| serde_json::from_value(value).ok()))
}

#[cfg(test)]
mod tests {
	use serde_json::json;

	use super::*;

	#[test]
	fn unknown_optional_fields_serialize_as_null() {
		let bundle = Bundle {
			app_id: 2040,
			app_hash: "hash".into(),
			session_file: "acct".into(),
			..Default::default()
		};

		let value = serde_json::to_value(&bundle).unwrap();
		let object = value.as_object().unwrap();
		assert!(object["proxy"].is_null());
		assert!(object["username"].is_null());
		assert!(object["last_check_time"].is_null());
		assert_eq!(object["device"], "");
		assert!(!object.contains_key("account"), "account fields must stay flat");
	}

	#[test]
	fn malformed_proxy_degrades_to_none() {
		let bundle: Bundle = serde_json::from_value(json!({
			"app_id": 1,
			"app_hash": "h",
			"session_file": "s",
			"proxy": "socks5://nope"
		}))
		.unwrap();
		assert_eq!(bundle.proxy, None);
	}

	#[test]
	fn proxy_port_accepts_numeric_strings() {
		assert_eq!(ProxyPort::Text(" 1080 ".into()).value(), Some(1080));
		assert_eq!(ProxyPort::Number(8080).value(), Some(8080));
		assert_eq!(ProxyPort::Number(70000).value(), None);
		assert_eq!(ProxyPort::Text("abc".into()).value(), None);
		assert_eq!(ProxyPort::Number(0).value(), None);
	}
}
