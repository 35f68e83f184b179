//! Additive repair of historical `tdata` naming drift.
//!
//! Desktop builds have written the same store under slightly different
//! names. Decoders expect one convention, so missing expected names are
//! created as links to the alternates that do exist. Existing entries,
//! alternates included, are never modified or removed; the expected names are
//! derived views of them.
//!
//! Repair is purely additive, but not confined to the store root: once the
//! data directory is linked to its alternate, the `map` row is resolved
//! through that link, so its `map` entry is added next to `maps` inside the
//! alternate directory.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

/// What an expected name must be.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
	File,
	Directory,
}

/// One `(expected, alternate)` pair, both relative to the store root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CompatEntry {
	pub expected: &'static str,
	pub alternate: &'static str,
	pub kind: EntryKind,
}

/// Known naming drift, applied in order. The data directory row runs first so
/// the map row can see through a freshly linked directory.
pub const COMPAT_TABLE: &[CompatEntry] = &[
	CompatEntry {
		expected: "D877F783D5D3EF8C",
		alternate: "D877F783D5D3EF8Cs",
		kind: EntryKind::Directory,
	},
	CompatEntry {
		expected: "key_data",
		alternate: "key_datas",
		kind: EntryKind::File,
	},
	CompatEntry {
		expected: "D877F783D5D3EF8C/map",
		alternate: "D877F783D5D3EF8C/maps",
		kind: EntryKind::File,
	},
];

/// Outcome of ensuring one expected entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Repair {
	/// Something already occupies the expected name.
	Present,
	/// Neither name exists; nothing to do.
	AlternateMissing,
	Linked,
	Copied,
}

/// Makes `root/entry.expected` resolve when only `root/entry.alternate` exists.
///
/// Tries a link first. Plain files fall back to a byte copy when linking is
/// not supported; directories are only ever linked.
pub fn ensure_present(root: &Path, entry: &CompatEntry) -> io::Result<Repair> {
	let expected = root.join(entry.expected);
	if fs::symlink_metadata(&expected).is_ok() {
		return Ok(Repair::Present);
	}

	let alternate = root.join(entry.alternate);
	let alternate_ok = match entry.kind {
		EntryKind::File => alternate.is_file(),
		EntryKind::Directory => alternate.is_dir(),
	};
	if !alternate_ok {
		return Ok(Repair::AlternateMissing);
	}

	let target = link_target(entry, &alternate);
	match create_link(&target, &expected, entry.kind) {
		Ok(()) => Ok(Repair::Linked),
		Err(err) if err.kind() == io::ErrorKind::AlreadyExists => Ok(Repair::Present),
		Err(err) if entry.kind == EntryKind::File => {
			debug!(target = "tdport.compat", expected = %expected.display(), error = %err, "link failed; copying");
			match fs::copy(&alternate, &expected) {
				Ok(_) => Ok(Repair::Copied),
				Err(copy_err) if copy_err.kind() == io::ErrorKind::AlreadyExists => Ok(Repair::Present),
				Err(copy_err) => Err(copy_err),
			}
		}
		Err(err) => Err(err),
	}
}

/// Links between siblings are relative so the store can be moved as a whole.
fn link_target(entry: &CompatEntry, alternate: &Path) -> PathBuf {
	let expected = Path::new(entry.expected);
	let alt = Path::new(entry.alternate);
	match (expected.parent() == alt.parent(), alt.file_name()) {
		(true, Some(name)) => PathBuf::from(name),
		_ => alternate.to_path_buf(),
	}
}

#[cfg(unix)]
fn create_link(target: &Path, link: &Path, _kind: EntryKind) -> io::Result<()> {
	std::os::unix::fs::symlink(target, link)
}

#[cfg(windows)]
fn create_link(target: &Path, link: &Path, kind: EntryKind) -> io::Result<()> {
	match kind {
		EntryKind::File => std::os::windows::fs::symlink_file(target, link),
		EntryKind::Directory => std::os::windows::fs::symlink_dir(target, link),
	}
}

#[cfg(not(any(unix, windows)))]
fn create_link(_target: &Path, _link: &Path, _kind: EntryKind) -> io::Result<()> {
	Err(io::Error::new(io::ErrorKind::Unsupported, "symbolic links are not supported on this platform"))
}

/// Applies [`COMPAT_TABLE`] to the store at `root`.
///
/// Best effort and idempotent: failures are logged and skipped, and a second
/// run over the same directory changes nothing. Returns the per-entry outcome
/// for entries that did not fail.
pub fn normalize(root: &Path) -> Vec<(&'static str, Repair)> {
	let mut outcomes = Vec::with_capacity(COMPAT_TABLE.len());
	for entry in COMPAT_TABLE {
		match ensure_present(root, entry) {
			Ok(repair) => {
				if matches!(repair, Repair::Linked | Repair::Copied) {
					debug!(target = "tdport.compat", root = %root.display(), expected = entry.expected, alternate = entry.alternate, ?repair, "repaired entry");
				}
				outcomes.push((entry.expected, repair));
			}
			Err(err) => {
				warn!(target = "tdport.compat", root = %root.display(), expected = entry.expected, error = %err, "could not repair entry");
			}
		}
	}
	outcomes
}

#[cfg(test)]
mod tests {
	use std::collections::BTreeMap;

	use tempfile::TempDir;

	use super::*;

	fn snapshot(root: &Path) -> BTreeMap<PathBuf, Vec<u8>> {
		let mut entries = BTreeMap::new();
		let mut stack = vec![root.to_path_buf()];
		while let Some(dir) = stack.pop() {
			for entry in fs::read_dir(&dir).unwrap() {
				let path = entry.unwrap().path();
				let meta = fs::symlink_metadata(&path).unwrap();
				let rel = path.strip_prefix(root).unwrap().to_path_buf();
				if meta.file_type().is_symlink() {
					entries.insert(rel, fs::read_link(&path).unwrap().to_string_lossy().into_owned().into_bytes());
				} else if meta.is_dir() {
					entries.insert(rel, Vec::new());
					stack.push(path);
				} else {
					entries.insert(rel, fs::read(&path).unwrap());
				}
			}
		}
		entries
	}

	fn drifted_store() -> TempDir {
		let temp = TempDir::new().unwrap();
		fs::write(temp.path().join("key_datas"), b"key material").unwrap();
		fs::create_dir(temp.path().join("D877F783D5D3EF8Cs")).unwrap();
		fs::write(temp.path().join("D877F783D5D3EF8Cs").join("maps"), b"map bytes").unwrap();
		temp
	}

	#[cfg(unix)]
	#[test]
	fn expected_names_resolve_after_normalize() {
		let temp = drifted_store();
		let outcomes = normalize(temp.path());

		assert_eq!(outcomes.len(), COMPAT_TABLE.len());
		assert_eq!(fs::read(temp.path().join("key_data")).unwrap(), b"key material");
		assert!(temp.path().join("D877F783D5D3EF8C").is_dir());
		assert_eq!(fs::read(temp.path().join("D877F783D5D3EF8C").join("map")).unwrap(), b"map bytes");
		assert_eq!(fs::read(temp.path().join("key_datas")).unwrap(), b"key material", "alternate untouched");
	}

	#[cfg(unix)]
	#[test]
	fn repair_inside_alternate_directory_only_adds() {
		let temp = drifted_store();
		normalize(temp.path());

		let alternate = temp.path().join("D877F783D5D3EF8Cs");
		let mut names: Vec<String> = fs::read_dir(&alternate).unwrap().map(|e| e.unwrap().file_name().to_string_lossy().into_owned()).collect();
		names.sort();
		assert_eq!(names, vec!["map", "maps"]);
		assert_eq!(fs::read(alternate.join("maps")).unwrap(), b"map bytes");
		assert!(fs::symlink_metadata(&alternate).unwrap().is_dir(), "alternate stays a real directory");
		assert_eq!(fs::read_link(alternate.join("map")).unwrap(), PathBuf::from("maps"));
	}

	#[cfg(unix)]
	#[test]
	fn sibling_links_are_relative() {
		let temp = drifted_store();
		normalize(temp.path());
		assert_eq!(fs::read_link(temp.path().join("key_data")).unwrap(), PathBuf::from("key_datas"));
		assert_eq!(fs::read_link(temp.path().join("D877F783D5D3EF8C")).unwrap(), PathBuf::from("D877F783D5D3EF8Cs"));
	}

	#[test]
	fn normalize_is_idempotent() {
		let temp = drifted_store();
		normalize(temp.path());
		let first = snapshot(temp.path());

		let outcomes = normalize(temp.path());
		assert_eq!(snapshot(temp.path()), first);
		assert!(outcomes.iter().all(|(_, repair)| *repair == Repair::Present));
	}

	#[test]
	fn existing_expected_entries_are_left_alone() {
		let temp = TempDir::new().unwrap();
		fs::write(temp.path().join("key_data"), b"real").unwrap();
		fs::write(temp.path().join("key_datas"), b"other").unwrap();

		assert_eq!(ensure_present(temp.path(), &COMPAT_TABLE[1]).unwrap(), Repair::Present);
		assert_eq!(fs::read(temp.path().join("key_data")).unwrap(), b"real");
	}

	#[test]
	fn directory_row_ignores_file_alternate() {
		let temp = TempDir::new().unwrap();
		fs::write(temp.path().join("D877F783D5D3EF8Cs"), b"settings file").unwrap();

		assert_eq!(ensure_present(temp.path(), &COMPAT_TABLE[0]).unwrap(), Repair::AlternateMissing);
		assert!(!temp.path().join("D877F783D5D3EF8C").exists());
	}

	#[test]
	fn missing_store_is_not_an_error() {
		let temp = TempDir::new().unwrap();
		let outcomes = normalize(&temp.path().join("nope"));
		assert!(outcomes.iter().all(|(_, repair)| *repair == Repair::AlternateMissing));
	}
}
