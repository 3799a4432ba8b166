//! Inbound adapters that translate external requests into domain service calls
//! while keeping framework details at the edge.
//!
//! The browser-facing pages live under [`http`].

pub mod http;
