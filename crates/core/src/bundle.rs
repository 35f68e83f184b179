//! Bundle document codec.
//!
//! A bundle is `<dir>/<name>.json` plus `<dir>/<name>.session`. The document
//! is flat, UTF-8, single-line JSON; the artifact is opaque and written by the
//! protocol client.

use std::fs;
use std::path::{Path, PathBuf};

use serde_json::{Map, Value};
use tracing::debug;

use crate::error::{PortError, Result};
use tdport_protocol::{APP_HASH_ALIAS, APP_HASH_KEY, APP_ID_ALIAS, APP_ID_KEY, Bundle, SESSION_FILE_KEY};

pub const DOCUMENT_EXTENSION: &str = "json";
pub const ARTIFACT_EXTENSION: &str = "session";

/// `<dir>/<basename>.json`
pub fn document_path(dir: &Path, basename: &str) -> PathBuf {
	dir.join(format!("{basename}.{DOCUMENT_EXTENSION}"))
}

/// `<dir>/<basename>.session`
pub fn artifact_path(dir: &Path, basename: &str) -> PathBuf {
	dir.join(format!("{basename}.{ARTIFACT_EXTENSION}"))
}

/// Loads the document at `path`.
///
/// Returns the bundle with `app_id`, `app_hash` and `session_file`
/// normalized, and the artifact path *without* extension, resolved next to
/// the document.
pub fn decode(path: &Path) -> Result<(Bundle, PathBuf)> {
	let content = fs::read_to_string(path).map_err(|e| PortError::Config(format!("cannot read bundle {}: {e}", path.display())))?;
	let value: Value = serde_json::from_str(&content).map_err(|e| PortError::Config(format!("bundle {} is not valid JSON: {e}", path.display())))?;
	let Value::Object(mut fields) = value else {
		return Err(PortError::Config(format!("bundle {} is not a JSON object", path.display())));
	};

	let app_id = take_field(&mut fields, APP_ID_KEY, APP_ID_ALIAS)
		.as_ref()
		.and_then(parse_app_id)
		.ok_or_else(|| PortError::Config(format!("bundle {} has no usable {APP_ID_KEY}/{APP_ID_ALIAS}", path.display())))?;
	let app_hash = take_field(&mut fields, APP_HASH_KEY, APP_HASH_ALIAS)
		.as_ref()
		.and_then(parse_app_hash)
		.ok_or_else(|| PortError::Config(format!("bundle {} has no usable {APP_HASH_KEY}", path.display())))?;

	let declared = take_field(&mut fields, SESSION_FILE_KEY, SESSION_FILE_KEY);
	let session_file = declared
		.as_ref()
		.and_then(Value::as_str)
		.and_then(session_basename)
		.or_else(|| path.file_stem().map(|stem| stem.to_string_lossy().into_owned()))
		.filter(|name| !name.is_empty())
		.ok_or_else(|| PortError::Config(format!("cannot derive a session name for {}", path.display())))?;

	fields.insert(APP_ID_KEY.into(), Value::from(app_id));
	fields.insert(APP_HASH_KEY.into(), Value::from(app_hash));
	fields.insert(SESSION_FILE_KEY.into(), Value::from(session_file.clone()));

	let bundle: Bundle = serde_json::from_value(Value::Object(fields)).map_err(|e| PortError::Config(format!("bundle {} has malformed fields: {e}", path.display())))?;

	let absolute = std::path::absolute(path)?;
	let base_dir = absolute.parent().map(Path::to_path_buf).unwrap_or_default();
	let artifact = base_dir.join(&session_file);

	debug!(target = "tdport", bundle = %path.display(), artifact = %artifact.display(), "decoded bundle");
	Ok((bundle, artifact))
}

/// Writes `bundle` to `<out_dir>/<basename>.json` and returns that path.
///
/// The session artifact is not touched.
pub fn encode(bundle: &Bundle, out_dir: &Path, basename: &str) -> Result<PathBuf> {
	fs::create_dir_all(out_dir)?;
	let path = document_path(out_dir, basename);
	let json = serde_json::to_string(bundle)?;
	fs::write(&path, json)?;
	debug!(target = "tdport", bundle = %path.display(), "wrote bundle document");
	Ok(path)
}

/// Removes every spelling of `canonical`/`alias` from `fields`, returning the
/// value to use. Keys match case-insensitively and the canonical name wins
/// over the alias.
fn take_field(fields: &mut Map<String, Value>, canonical: &str, alias: &str) -> Option<Value> {
	let keys: Vec<String> = fields
		.keys()
		.filter(|key| key.eq_ignore_ascii_case(canonical) || key.eq_ignore_ascii_case(alias))
		.cloned()
		.collect();

	let mut primary = None;
	let mut secondary = None;
	for key in keys {
		let value = fields.remove(&key);
		let slot = if key.eq_ignore_ascii_case(canonical) { &mut primary } else { &mut secondary };
		if slot.is_none() || key == canonical || key == alias {
			*slot = value;
		}
	}

	primary.filter(is_present).or(secondary.filter(is_present))
}

fn is_present(value: &Value) -> bool {
	match value {
		Value::Null => false,
		Value::String(s) => !s.trim().is_empty(),
		_ => true,
	}
}

fn parse_app_id(value: &Value) -> Option<i64> {
	let id = match value {
		Value::Number(n) => n.as_i64()?,
		Value::String(s) => s.trim().parse().ok()?,
		_ => return None,
	};
	(id > 0).then_some(id)
}

fn parse_app_hash(value: &Value) -> Option<String> {
	let hash = match value {
		Value::String(s) => s.clone(),
		Value::Number(n) => n.to_string(),
		_ => return None,
	};
	(!hash.trim().is_empty()).then_some(hash)
}

/// Final path component of `session_file`, minus a trailing `.session`.
///
/// Other dots belong to the name: `my.account` stays `my.account`.
fn session_basename(session_file: &str) -> Option<String> {
	let path = Path::new(session_file.trim());
	let name = if path.extension().is_some_and(|ext| ext == ARTIFACT_EXTENSION) {
		path.file_stem()?
	} else {
		path.file_name()?
	};
	let name = name.to_string_lossy().into_owned();
	(!name.is_empty()).then_some(name)
}
