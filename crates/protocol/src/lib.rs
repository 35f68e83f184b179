//! Wire types for tdport.
//!
//! This crate contains the serde-serializable types that cross a process or
//! file boundary: the bundle document written next to a session artifact, the
//! account and device records reported by the protocol client, and the JSON
//! envelope exchanged with the external driver process.
//!
//! # Design Philosophy
//!
//! Types in this crate are:
//! * Pure data: No behavior beyond serialization/deserialization
//! * Flat on disk: The bundle document keeps one level of keys
//! * Lenient on input: Optional sections that fail to parse degrade to `None`
//!
//! Validation and path resolution are built on top of these types in `tdport`.

pub mod account;
pub mod bundle;
pub mod envelope;

pub use account::*;
pub use bundle::*;
pub use envelope::*;
