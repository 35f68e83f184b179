//! Seed-reproducible device metadata.
//!
//! When the real client environment of an account is unknown, a plausible
//! one is derived from a seed (normally the bundle basename). The device label
//! depends only on the seed; the SDK, app version and languages describe the
//! executing host and are taken from [`HostPlatform`].

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use sha2::{Digest, Sha256};
use tracing::debug;

use crate::config::DeviceOverrides;
use tdport_protocol::{DeviceMetadata, DeviceRecord};

const DEVICE_ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
/// Appended to the random device core.
pub const DEVICE_MARKER: &str = "-PC";
const APP_VERSION: &str = "4.16.8";
const LANG_PACK: &str = "tdesktop";
const FALLBACK_LANGUAGE: &str = "en";

/// Operating system family used for the SDK label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OsFamily {
	Windows,
	MacOs,
	Linux,
}

/// Facts about the executing host that feed the non-seeded fields.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPlatform {
	pub family: OsFamily,
	/// Kernel or OS release, e.g. `6.8.0-45-generic` or `11`.
	pub release: String,
	pub pointer_width: u32,
	/// Two or three letter language from the host locale.
	pub language: Option<String>,
}

impl HostPlatform {
	/// Gathers platform facts for the current process.
	pub fn detect() -> Self {
		let family = if cfg!(target_os = "windows") {
			OsFamily::Windows
		} else if cfg!(target_os = "macos") {
			OsFamily::MacOs
		} else {
			OsFamily::Linux
		};

		let host = Self {
			family,
			release: detect_release(family),
			pointer_width: usize::BITS,
			language: detect_language(),
		};
		debug!(target = "tdport", ?host, "detected host platform");
		host
	}

	fn sdk(&self) -> String {
		let release = self.release.trim();
		match self.family {
			OsFamily::MacOs => "macOS".to_string(),
			OsFamily::Windows if release.is_empty() => "Windows".to_string(),
			OsFamily::Windows => format!("Windows {release}"),
			OsFamily::Linux if release.is_empty() => "Linux".to_string(),
			OsFamily::Linux => format!("Linux {release}"),
		}
	}

	fn app_version(&self) -> String {
		if self.pointer_width >= 64 {
			format!("{APP_VERSION} x64")
		} else {
			APP_VERSION.to_string()
		}
	}

	fn language_or_default(&self) -> &str {
		self.language.as_deref().unwrap_or(FALLBACK_LANGUAGE)
	}
}

/// Derives device metadata from `seed`.
///
/// The generator is keyed by the SHA-256 digest of the seed, so the same
/// seed gives the same device label on every run and every machine.
pub fn synthesize(seed: &str, host: &HostPlatform) -> DeviceMetadata {
	let digest = Sha256::digest(seed.as_bytes());
	let mut key = [0u8; 32];
	key.copy_from_slice(&digest);
	let mut rng = StdRng::from_seed(key);

	let len = rng.gen_range(7..=10);
	let core: String = (0..len)
		.map(|_| DEVICE_ALPHABET[rng.gen_range(0..DEVICE_ALPHABET.len())] as char)
		.collect();

	let language = host.language_or_default().to_string();
	DeviceMetadata {
		device: format!("{core}{DEVICE_MARKER}"),
		sdk: host.sdk(),
		app_version: host.app_version(),
		system_lang_pack: LANG_PACK.to_string(),
		system_lang_code: language.clone(),
		lang_pack: LANG_PACK.to_string(),
		lang_code: language,
	}
}

/// Picks the authorization entry belonging to the current session.
pub fn current_device(records: &[DeviceRecord]) -> Option<&DeviceRecord> {
	records.iter().find(|record| record.current)
}

/// Applies the field precedence: override, then live record, then synthesized.
///
/// The live record only knows the device model, system version and app
/// version; language fields fall through to the synthesized values.
pub fn resolve_device_metadata(overrides: &DeviceOverrides, live: Option<&DeviceRecord>, synthesized: DeviceMetadata) -> DeviceMetadata {
	let observed = |value: Option<&String>| value.map(|v| v.trim()).filter(|v| !v.is_empty()).map(str::to_string);
	let choose = |explicit: &Option<String>, seen: Option<String>, fallback: String| explicit.clone().or(seen).unwrap_or(fallback);

	DeviceMetadata {
		device: choose(&overrides.device, observed(live.and_then(|r| r.device_model.as_ref())), synthesized.device),
		sdk: choose(&overrides.sdk, observed(live.and_then(|r| r.system_version.as_ref())), synthesized.sdk),
		app_version: choose(&overrides.app_version, observed(live.and_then(|r| r.app_version.as_ref())), synthesized.app_version),
		system_lang_pack: choose(&overrides.system_lang_pack, None, synthesized.system_lang_pack),
		system_lang_code: choose(&overrides.system_lang_code, None, synthesized.system_lang_code),
		lang_pack: choose(&overrides.lang_pack, None, synthesized.lang_pack),
		lang_code: choose(&overrides.lang_code, None, synthesized.lang_code),
	}
}

fn detect_release(family: OsFamily) -> String {
	match family {
		OsFamily::MacOs => String::new(),
		OsFamily::Linux => std::fs::read_to_string("/proc/sys/kernel/osrelease")
			.map(|s| s.trim().to_string())
			.ok()
			.filter(|s| !s.is_empty())
			.or_else(|| command_output("uname", &["-r"]))
			.unwrap_or_default(),
		OsFamily::Windows => command_output("cmd", &["/C", "ver"]).and_then(|out| windows_release(&out)).unwrap_or_default(),
	}
}

fn command_output(program: &str, args: &[&str]) -> Option<String> {
	let output = std::process::Command::new(program).args(args).output().ok()?;
	if !output.status.success() {
		return None;
	}
	let text = String::from_utf8_lossy(&output.stdout).trim().to_string();
	(!text.is_empty()).then_some(text)
}

/// Parses `Microsoft Windows [Version 10.0.22631.2861]` into a marketing release.
fn windows_release(ver_output: &str) -> Option<String> {
	let start = ver_output.find("Version ")? + "Version ".len();
	let version = ver_output[start..].trim_end_matches([']', '\r', '\n']).trim();
	let mut parts = version.split('.');
	let major: u32 = parts.next()?.parse().ok()?;
	let _minor = parts.next();
	let build: u32 = parts.next().and_then(|b| b.parse().ok()).unwrap_or(0);
	if major == 10 && build >= 22000 {
		Some("11".to_string())
	} else {
		Some(major.to_string())
	}
}

fn detect_language() -> Option<String> {
	["LC_ALL", "LC_MESSAGES", "LANG", "LANGUAGE"]
		.iter()
		.filter_map(|key| std::env::var(key).ok())
		.find_map(|value| language_from_locale(&value))
}

/// Extracts the language part of a POSIX or BCP 47 locale (`ru_RU.UTF-8` -> `ru`).
pub fn language_from_locale(locale: &str) -> Option<String> {
	let base = locale.split(['.', '@', ':']).next()?.trim();
	let lang = base.split(['_', '-']).next()?.to_ascii_lowercase();
	let valid = (2..=3).contains(&lang.len()) && lang.chars().all(|c| c.is_ascii_alphabetic());
	valid.then_some(lang)
}

#[cfg(test)]
mod tests {
	use super::*;

	fn linux_host() -> HostPlatform {
		HostPlatform {
			family: OsFamily::Linux,
			release: "6.8.0-45-generic".into(),
			pointer_width: 64,
			language: Some("ru".into()),
		}
	}

	#[test]
	fn same_seed_gives_identical_metadata() {
		let host = linux_host();
		assert_eq!(synthesize("acct1", &host), synthesize("acct1", &host));
	}

	#[test]
	fn different_seeds_give_different_devices() {
		let host = linux_host();
		let a = synthesize("acct1", &host);
		let b = synthesize("acct2", &host);
		assert_ne!(a.device, b.device);
	}

	#[test]
	fn device_label_shape() {
		let host = linux_host();
		for seed in ["a", "acct1", "some much longer seed value", ""] {
			let device = synthesize(seed, &host).device;
			let core = device.strip_suffix(DEVICE_MARKER).expect("marker suffix");
			assert!((7..=10).contains(&core.len()), "unexpected core {core}");
			assert!(core.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
		}
	}

	#[test]
	fn host_fields_follow_platform() {
		let meta = synthesize("acct1", &linux_host());
		assert_eq!(meta.sdk, "Linux 6.8.0-45-generic");
		assert_eq!(meta.app_version, "4.16.8 x64");
		assert_eq!(meta.lang_code, "ru");
		assert_eq!(meta.system_lang_code, "ru");
		assert_eq!(meta.lang_pack, "tdesktop");

		let mac = HostPlatform {
			family: OsFamily::MacOs,
			release: String::new(),
			pointer_width: 32,
			language: None,
		};
		let meta = synthesize("acct1", &mac);
		assert_eq!(meta.sdk, "macOS");
		assert_eq!(meta.app_version, "4.16.8");
		assert_eq!(meta.lang_code, "en");

		let windows = HostPlatform {
			family: OsFamily::Windows,
			release: "11".into(),
			pointer_width: 64,
			language: Some("de".into()),
		};
		assert_eq!(synthesize("acct1", &windows).sdk, "Windows 11");
	}

	#[test]
	fn device_does_not_depend_on_host() {
		let mut other = linux_host();
		other.family = OsFamily::Windows;
		other.language = None;
		assert_eq!(synthesize("acct1", &linux_host()).device, synthesize("acct1", &other).device);
	}

	#[test]
	fn precedence_is_override_then_live_then_synthesized() {
		let synthesized = synthesize("acct1", &linux_host());
		let live = DeviceRecord {
			current: true,
			device_model: Some("MS-7C02".into()),
			system_version: Some("Windows 10".into()),
			app_version: Some(" ".into()),
			..Default::default()
		};
		let overrides = DeviceOverrides {
			device: Some("OVERRIDE".into()),
			lang_code: Some("es".into()),
			..Default::default()
		};

		let resolved = resolve_device_metadata(&overrides, Some(&live), synthesized.clone());
		assert_eq!(resolved.device, "OVERRIDE");
		assert_eq!(resolved.sdk, "Windows 10");
		assert_eq!(resolved.app_version, synthesized.app_version, "blank live value falls through");
		assert_eq!(resolved.lang_code, "es");
		assert_eq!(resolved.system_lang_code, synthesized.system_lang_code);

		let without_live = resolve_device_metadata(&DeviceOverrides::default(), None, synthesized.clone());
		assert_eq!(without_live, synthesized);
	}

	#[test]
	fn current_device_picks_flagged_record() {
		let records = vec![
			DeviceRecord {
				device_model: Some("iPhone".into()),
				..Default::default()
			},
			DeviceRecord {
				current: true,
				device_model: Some("Desktop".into()),
				..Default::default()
			},
		];
		assert_eq!(current_device(&records).and_then(|r| r.device_model.as_deref()), Some("Desktop"));
		assert!(current_device(&records[..1]).is_none());
	}

	#[test]
	fn locale_parsing() {
		assert_eq!(language_from_locale("ru_RU.UTF-8").as_deref(), Some("ru"));
		assert_eq!(language_from_locale("en-US").as_deref(), Some("en"));
		assert_eq!(language_from_locale("de_DE@euro").as_deref(), Some("de"));
		assert_eq!(language_from_locale("C"), None);
		assert_eq!(language_from_locale("POSIX"), None);
		assert_eq!(language_from_locale(""), None);
	}

	#[test]
	fn windows_ver_parsing() {
		assert_eq!(windows_release("Microsoft Windows [Version 10.0.22631.2861]").as_deref(), Some("11"));
		assert_eq!(windows_release("Microsoft Windows [Version 10.0.19045.3803]\r\n").as_deref(), Some("10"));
		assert_eq!(windows_release("Microsoft Windows [Version 6.1.7601]").as_deref(), Some("6"));
		assert_eq!(windows_release("garbage"), None);
	}
}
