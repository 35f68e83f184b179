//! Bridge to an external driver process.
//!
//! The desktop store decoder and the protocol client are provided by a
//! separate program speaking newline-delimited JSON on stdin/stdout (see
//! [`tdport_protocol::envelope`]). [`DriverBackend`] implements the
//! [`crate::client`] traits on top of it; remote objects are addressed by
//! the GUID strings the driver hands out.

mod backend;
mod connection;
mod process;

pub use backend::{DriverBackend, DriverConfig};
pub use connection::{Connection, ConnectionLike};
pub use process::DriverProcess;
