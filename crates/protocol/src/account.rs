//! Records reported by the protocol client.

use serde::{Deserialize, Serialize};

/// The logged-in user as returned by `getMe`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserProfile {
	pub id: i64,
	pub phone: Option<String>,
	pub username: Option<String>,
	pub first_name: Option<String>,
	pub last_name: Option<String>,
	pub premium: bool,
	pub has_profile_pic: bool,
}

impl UserProfile {
	/// Human label used in log lines: `@username`, else the first name, else the id.
	pub fn display_name(&self) -> String {
		if let Some(username) = self.username.as_deref().filter(|u| !u.is_empty()) {
			return format!("@{username}");
		}
		if let Some(first) = self.first_name.as_deref().filter(|f| !f.is_empty()) {
			return first.to_string();
		}
		self.id.to_string()
	}
}

/// One authorized device from the account's authorization list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DeviceRecord {
	/// Set on the authorization that belongs to this session.
	pub current: bool,
	pub device_model: Option<String>,
	pub platform: Option<String>,
	pub system_version: Option<String>,
	pub app_name: Option<String>,
	pub app_version: Option<String>,
	pub api_id: Option<i64>,
}
