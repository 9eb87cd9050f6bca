//! Infrastructure adapters: HTTP surface, external store client, telemetry.

pub mod assets;
pub mod error;
pub mod http;
pub mod kv;
pub mod telemetry;
