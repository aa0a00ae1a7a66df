//! cloudseed - layered cloud-init NoCloud seed assembly
//!
//! This crate assembles machine-provisioning configuration from layered
//! sources and packages it for a guest VM's first-boot agent: parsed
//! documents keep schema-unknown fields side by side with typed ones,
//! layers combine through an explicit deep merge with override semantics,
//! and the final config renders to a directory of well-known files or to
//! an in-memory ISO9660 image labeled `cidata`.

pub mod config;
pub mod document;
pub mod iso;
pub mod merge;

pub use config::{config_from_dirs, default_config, Config, ConfigError, LocalDefaults, Loader};
pub use document::{Document, MetaData, NetworkConfig, NetworkParams, ParseError, UserData};
pub use iso::{IsoError, IsoWriter};
pub use merge::{deep_merge, merge_layers};
