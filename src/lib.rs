#![allow(clippy::collapsible_if)]
#![allow(clippy::large_enum_variant)]

pub mod config;
pub mod content;
pub mod defaults;
pub mod embedded_server;
pub mod error;
pub mod logging;
pub mod net;
pub mod session;
pub mod talent;
