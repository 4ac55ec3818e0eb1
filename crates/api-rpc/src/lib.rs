//! JSON-RPC API Layer
//!
//! Implements the JSON-RPC 2.0 server for Chamber Monitor: machine commands,
//! report search and report export.

pub mod error;
pub mod handler;
pub mod server;
pub mod types;

pub use error::RpcServerError;
pub use server::{RpcServer, RpcServerConfig};
