//! SCADA REST dispatch layer + declarative MCP tool catalog.
//!
//! This crate contains everything the gateway binary needs short of the HTTP
//! server itself:
//! - `session`: the single mutable credential record (Basic vs. Bearer)
//! - `client`: one authenticated outbound REST call per dispatch
//! - `catalog`: the static routing table mapping MCP tools to REST endpoints
//! - `runtime`: turns catalog entries into MCP `Tool`s and executes calls
//!
//! It intentionally contains **no** MCP transport logic and **no** server
//! plumbing; those are owned by the gateway binary and the rmcp SDK.

pub mod catalog;
pub mod client;
pub mod error;
pub mod runtime;
pub mod semantics;
pub mod session;

pub use error::{RequestError, Result};
