//! Locating a single valid local store.
//!
//! Candidates come from an explicit override, every `accounts/*/tdata`
//! under the discovery root, a few conventional relative paths and
//! optionally the desktop client's per-user default. Each one is normalized
//! and probed with the decoder; only an unambiguous winner is returned.

use std::path::{Path, PathBuf};

use tracing::{debug, info, warn};

use crate::LOCAL_STORE_DIR_NAME;
use crate::client::LocalStoreDecoder;
use crate::compat;
use crate::config::DiscoveryConfig;
use crate::error::{PortError, Result};

/// Relative locations checked under the discovery root.
pub const CONVENTIONAL_PATHS: &[&[&str]] = &[
	&[LOCAL_STORE_DIR_NAME],
	&["tdatas", LOCAL_STORE_DIR_NAME],
	&["Telegram Desktop", LOCAL_STORE_DIR_NAME],
	&["TelegramDesktop", LOCAL_STORE_DIR_NAME],
];

/// Where a candidate was found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateOrigin {
	Override,
	Accounts,
	Conventional,
	PlatformDefault,
}

/// A unique candidate directory.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Candidate {
	/// Absolute, deduplicated location.
	pub path: PathBuf,
	pub origin: CandidateOrigin,
	/// Also reachable through `accounts/*/tdata`.
	pub under_accounts: bool,
}

/// Result of applying the selection rule to validated candidates.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Selection {
	Found(Candidate),
	NoneValid,
	Ambiguous(Vec<PathBuf>),
}

/// Chooses among validated candidates.
///
/// One valid candidate wins outright. With several, only those found under
/// `accounts/*/` are considered, and exactly one must remain.
pub fn select(mut valid: Vec<Candidate>) -> Selection {
	if valid.len() <= 1 {
		return valid.pop().map_or(Selection::NoneValid, Selection::Found);
	}

	let all: Vec<PathBuf> = valid.iter().map(|c| c.path.clone()).collect();
	let mut preferred: Vec<Candidate> = valid.into_iter().filter(|c| c.under_accounts).collect();
	match preferred.pop() {
		Some(candidate) if preferred.is_empty() => Selection::Found(candidate),
		_ => Selection::Ambiguous(all),
	}
}

/// Per-user install location of Telegram Desktop's store.
pub fn platform_default_store() -> Option<PathBuf> {
	if cfg!(target_os = "windows") {
		std::env::var("APPDATA")
			.ok()
			.map(|appdata| PathBuf::from(appdata).join("Telegram Desktop").join(LOCAL_STORE_DIR_NAME))
	} else if cfg!(target_os = "macos") {
		dirs::home_dir().map(|h| h.join("Library").join("Application Support").join("Telegram Desktop").join(LOCAL_STORE_DIR_NAME))
	} else {
		dirs::data_dir().map(|d| d.join("TelegramDesktop").join(LOCAL_STORE_DIR_NAME))
	}
}

/// Scans conventional locations for a decodable local store.
pub struct LocalStoreDiscovery {
	config: DiscoveryConfig,
}

impl LocalStoreDiscovery {
	pub fn new(config: DiscoveryConfig) -> Self {
		Self { config }
	}

	pub fn config(&self) -> &DiscoveryConfig {
		&self.config
	}

	/// Existing candidate directories, deduplicated by absolute path in
	/// discovery order.
	pub fn candidates(&self) -> Vec<Candidate> {
		let mut found: Vec<Candidate> = Vec::new();
		let mut push = |path: PathBuf, origin: CandidateOrigin| {
			if !path.is_dir() {
				return;
			}
			let path = absolute_key(&path);
			let under_accounts = origin == CandidateOrigin::Accounts;
			if let Some(existing) = found.iter_mut().find(|c| c.path == path) {
				existing.under_accounts |= under_accounts;
				return;
			}
			found.push(Candidate { path, origin, under_accounts });
		};

		if let Some(path) = &self.config.override_path {
			push(path.clone(), CandidateOrigin::Override);
		}
		for path in self.accounts_candidates() {
			push(path, CandidateOrigin::Accounts);
		}
		for segments in CONVENTIONAL_PATHS {
			let path = segments.iter().fold(self.config.root.clone(), |acc, segment| acc.join(segment));
			push(path, CandidateOrigin::Conventional);
		}
		if self.config.include_platform_default {
			if let Some(path) = platform_default_store() {
				push(path, CandidateOrigin::PlatformDefault);
			}
		}

		found
	}

	fn accounts_candidates(&self) -> Vec<PathBuf> {
		let Some(root) = self.config.root.to_str() else {
			warn!(target = "tdport.discovery", root = %self.config.root.display(), "root is not valid UTF-8; skipping accounts scan");
			return Vec::new();
		};
		let pattern = Path::new(&glob::Pattern::escape(root)).join("accounts").join("*").join(LOCAL_STORE_DIR_NAME);

		match glob::glob(&pattern.to_string_lossy()) {
			Ok(paths) => {
				let mut paths: Vec<PathBuf> = paths.filter_map(|entry| entry.ok()).collect();
				paths.sort();
				paths
			}
			Err(err) => {
				warn!(target = "tdport.discovery", error = %err, "invalid accounts pattern");
				Vec::new()
			}
		}
	}

	/// Normalizes `candidate` and checks it decodes to at least one account.
	async fn probe(&self, decoder: &dyn LocalStoreDecoder, candidate: &Candidate) -> bool {
		compat::normalize(&candidate.path);
		match decoder.open(&candidate.path).await {
			Ok(identities) if identities.account_count() > 0 => {
				debug!(target = "tdport.discovery", path = %candidate.path.display(), accounts = identities.account_count(), "candidate is valid");
				true
			}
			Ok(_) => {
				debug!(target = "tdport.discovery", path = %candidate.path.display(), "candidate holds no accounts");
				false
			}
			Err(err) => {
				debug!(target = "tdport.discovery", path = %candidate.path.display(), error = %err, "candidate failed to decode");
				false
			}
		}
	}

	/// Returns the single valid candidate, or a [`PortError::Discovery`]
	/// describing why none could be chosen.
	pub async fn resolve(&self, decoder: &dyn LocalStoreDecoder) -> Result<Candidate> {
		let candidates = self.candidates();
		if candidates.is_empty() {
			return Err(PortError::Discovery(format!("no {LOCAL_STORE_DIR_NAME} directory found under {}", self.config.root.display())));
		}

		let mut valid = Vec::new();
		for candidate in candidates {
			if self.probe(decoder, &candidate).await {
				valid.push(candidate);
			}
		}

		match select(valid) {
			Selection::Found(candidate) => {
				info!(target = "tdport.discovery", path = %candidate.path.display(), origin = ?candidate.origin, "selected local store");
				Ok(candidate)
			}
			Selection::NoneValid => Err(PortError::Discovery("no candidate local store could be decoded".into())),
			Selection::Ambiguous(paths) => {
				let listed: Vec<String> = paths.iter().map(|p| p.display().to_string()).collect();
				Err(PortError::Discovery(format!("several valid local stores, pass one explicitly: {}", listed.join(", "))))
			}
		}
	}

	/// Path of the single valid candidate, `None` when zero or ambiguous.
	pub async fn find_candidate(&self, decoder: &dyn LocalStoreDecoder) -> Option<PathBuf> {
		self.resolve(decoder).await.ok().map(|candidate| candidate.path)
	}
}

fn absolute_key(path: &Path) -> PathBuf {
	std::fs::canonicalize(path)
		.or_else(|_| std::path::absolute(path))
		.unwrap_or_else(|_| path.to_path_buf())
}

/// Account folder name for a store found as `accounts/<name>/tdata`.
pub fn account_name(candidate: &Candidate) -> Option<String> {
	if !candidate.under_accounts {
		return None;
	}
	candidate.path.parent()?.file_name().map(|name| name.to_string_lossy().into_owned())
}

#[cfg(test)]
mod tests {
	use std::fs;

	use tempfile::TempDir;

	use super::*;

	fn candidate(path: &str, under_accounts: bool) -> Candidate {
		Candidate {
			path: PathBuf::from(path),
			origin: if under_accounts { CandidateOrigin::Accounts } else { CandidateOrigin::Conventional },
			under_accounts,
		}
	}

	#[test]
	fn select_single_valid() {
		let only = candidate("/a/tdata", false);
		assert_eq!(select(vec![only.clone()]), Selection::Found(only));
	}

	#[test]
	fn select_none_valid() {
		assert_eq!(select(Vec::new()), Selection::NoneValid);
	}

	#[test]
	fn select_prefers_single_accounts_candidate() {
		let acct = candidate("/r/accounts/a/tdata", true);
		assert_eq!(select(vec![candidate("/r/tdata", false), acct.clone()]), Selection::Found(acct));
	}

	#[test]
	fn select_refuses_to_guess() {
		let outside = select(vec![candidate("/r/tdata", false), candidate("/r/tdatas/tdata", false)]);
		assert!(matches!(outside, Selection::Ambiguous(paths) if paths.len() == 2));

		let tied = select(vec![candidate("/r/accounts/a/tdata", true), candidate("/r/accounts/b/tdata", true)]);
		assert!(matches!(tied, Selection::Ambiguous(_)));
	}

	#[test]
	fn candidates_are_collected_and_deduplicated() {
		let temp = TempDir::new().unwrap();
		let root = temp.path();
		fs::create_dir_all(root.join("accounts").join("alice").join("tdata")).unwrap();
		fs::create_dir_all(root.join("accounts").join("bob").join("tdata")).unwrap();
		fs::create_dir_all(root.join("tdatas").join("tdata")).unwrap();
		fs::write(root.join("tdata"), b"not a directory").unwrap();

		let config = DiscoveryConfig::new(root).with_override(Some(root.join("accounts").join("alice").join("tdata")));
		let candidates = LocalStoreDiscovery::new(config).candidates();

		assert_eq!(candidates.len(), 3, "{candidates:?}");
		assert_eq!(candidates[0].origin, CandidateOrigin::Override);
		assert!(candidates[0].under_accounts, "override also matched the accounts scan");
		assert!(candidates[1].under_accounts);
		assert_eq!(candidates[2].origin, CandidateOrigin::Conventional);
		assert!(candidates.iter().all(|c| c.path.is_absolute()));
	}

	#[test]
	fn account_name_comes_from_parent_folder() {
		assert_eq!(account_name(&candidate("/r/accounts/alice/tdata", true)).as_deref(), Some("alice"));
		assert_eq!(account_name(&candidate("/r/tdata", false)), None);
	}
}
