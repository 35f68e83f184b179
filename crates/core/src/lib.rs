//! Portable session bundles for Telegram Desktop local stores.
//!
//! A desktop `tdata` directory is turned into a *bundle*: a flat JSON document
//! plus an opaque `.session` artifact sharing its basename. The bundle can later
//! be opened on another host to rebuild a working client.
//!
//! The designed pieces are pure or nearly so:
//!
//! - [`bundle`] - bundle document codec and artifact path resolution
//! - [`proxy`] - proxy description to connection spec mapping
//! - [`fingerprint`] - seed-reproducible device metadata
//! - [`compat`] - additive repair of historical `tdata` naming drift
//! - [`discovery`] - locating a single valid local store
//!
//! [`pipeline`] composes them with the external collaborators declared in
//! [`client`]. The [`driver`] module implements those collaborators by talking
//! to an external driver process.

pub mod bundle;
pub mod client;
pub mod compat;
pub mod config;
pub mod discovery;
pub mod driver;
pub mod error;
pub mod fingerprint;
pub mod pipeline;
pub mod proxy;

pub use client::{ApiSpec, ClientFactory, ClientParams, IdentitySet, LocalStoreDecoder, ProtocolClient, SessionFlag};
pub use error::{ClientError, PortError, Result};
pub use pipeline::{AuthorizeReport, AuthorizeRequest, DirectAuthorizer, ExportPipeline, ExportReport, ExportRequest, ImportPipeline, ImportReport};
pub use tdport_protocol::{AccountInfo, Bundle, DeviceMetadata, DeviceRecord, ProxyConfig, ProxyPort, UserProfile};

/// Directory name of a Telegram Desktop local store.
pub const LOCAL_STORE_DIR_NAME: &str = "tdata";
