//! Zefiro: a small, self-hosted personal site server.
//!
//! Content is compiled into the binary by the authoring pipeline; the only
//! external dependency at request time is the key-value store backing the
//! per-post view counters, and that dependency is best-effort by design.

pub mod application;
pub mod config;
pub mod domain;
pub mod infra;
pub mod presentation;
