//! Environment-driven settings.
//!
//! Values are read through a lookup function so tests never mutate the
//! process environment. Empty values count as unset.

use std::path::PathBuf;

pub const ENV_DEVICE: &str = "TDPORT_DEVICE";
pub const ENV_SDK: &str = "TDPORT_SDK";
pub const ENV_APP_VERSION: &str = "TDPORT_APP_VERSION";
pub const ENV_SYSTEM_LANG_PACK: &str = "TDPORT_SYSTEM_LANG_PACK";
pub const ENV_SYSTEM_LANG_CODE: &str = "TDPORT_SYSTEM_LANG_CODE";
pub const ENV_LANG_PACK: &str = "TDPORT_LANG_PACK";
pub const ENV_LANG_CODE: &str = "TDPORT_LANG_CODE";
/// Explicit local store location checked first during discovery.
pub const ENV_LOCAL_STORE: &str = "TDPORT_TDATA";
/// Driver program used by the binary.
pub const ENV_DRIVER: &str = "TDPORT_DRIVER";

pub(crate) fn lookup_non_empty(lookup: &impl Fn(&str) -> Option<String>, key: &str) -> Option<String> {
	lookup(key).map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Explicit device metadata overrides. Highest precedence when building a bundle.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DeviceOverrides {
	pub device: Option<String>,
	pub sdk: Option<String>,
	pub app_version: Option<String>,
	pub system_lang_pack: Option<String>,
	pub system_lang_code: Option<String>,
	pub lang_pack: Option<String>,
	pub lang_code: Option<String>,
}

impl DeviceOverrides {
	pub fn from_env() -> Self {
		Self::from_lookup(|key| std::env::var(key).ok())
	}

	pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
		Self {
			device: lookup_non_empty(&lookup, ENV_DEVICE),
			sdk: lookup_non_empty(&lookup, ENV_SDK),
			app_version: lookup_non_empty(&lookup, ENV_APP_VERSION),
			system_lang_pack: lookup_non_empty(&lookup, ENV_SYSTEM_LANG_PACK),
			system_lang_code: lookup_non_empty(&lookup, ENV_SYSTEM_LANG_CODE),
			lang_pack: lookup_non_empty(&lookup, ENV_LANG_PACK),
			lang_code: lookup_non_empty(&lookup, ENV_LANG_CODE),
		}
	}
}

/// Inputs for local store discovery.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveryConfig {
	/// Directory the conventional relative candidates are resolved against.
	pub root: PathBuf,
	pub override_path: Option<PathBuf>,
	/// Also consider the desktop client's per-user default location.
	pub include_platform_default: bool,
}

impl DiscoveryConfig {
	pub fn new(root: impl Into<PathBuf>) -> Self {
		Self {
			root: root.into(),
			override_path: None,
			include_platform_default: false,
		}
	}

	/// Discovery rooted at the working directory, honouring `TDPORT_TDATA`.
	pub fn from_env() -> Self {
		let root = std::env::current_dir().unwrap_or_else(|_| PathBuf::from("."));
		Self::from_lookup(root, |key| std::env::var(key).ok())
	}

	pub fn from_lookup(root: impl Into<PathBuf>, lookup: impl Fn(&str) -> Option<String>) -> Self {
		Self {
			root: root.into(),
			override_path: lookup_non_empty(&lookup, ENV_LOCAL_STORE).map(PathBuf::from),
			include_platform_default: true,
		}
	}

	pub fn with_override(mut self, path: Option<PathBuf>) -> Self {
		self.override_path = path;
		self
	}

	pub fn with_platform_default(mut self, include: bool) -> Self {
		self.include_platform_default = include;
		self
	}
}

#[cfg(test)]
mod tests {
	use std::collections::HashMap;

	use super::*;

	fn lookup_from(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
		let map: HashMap<String, String> = pairs.iter().map(|(k, v)| (k.to_string(), v.to_string())).collect();
		move |key| map.get(key).cloned()
	}

	#[test]
	fn overrides_skip_blank_values() {
		let overrides = DeviceOverrides::from_lookup(lookup_from(&[(ENV_DEVICE, "  PIXEL-9 "), (ENV_SDK, ""), (ENV_LANG_CODE, "de")]));
		assert_eq!(overrides.device.as_deref(), Some("PIXEL-9"));
		assert_eq!(overrides.sdk, None);
		assert_eq!(overrides.lang_code.as_deref(), Some("de"));
		assert_eq!(overrides.app_version, None);
	}

	#[test]
	fn discovery_override_comes_from_lookup() {
		let config = DiscoveryConfig::from_lookup("/work", lookup_from(&[(ENV_LOCAL_STORE, "/mnt/backup/tdata")]));
		assert_eq!(config.root, PathBuf::from("/work"));
		assert_eq!(config.override_path, Some(PathBuf::from("/mnt/backup/tdata")));
		assert!(config.include_platform_default);
	}
}
