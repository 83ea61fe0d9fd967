#![doc = "The `taskgate` library crate."]
#![doc = ""]
#![doc = "Session-token authentication (register, login, refresh with rotation, logout), the"]
#![doc = "authorization gate, owner-scoped task storage, routing and error handling."]
#![doc = "The binary (`main.rs`) wires these together into an HTTP server."]

pub mod auth;
pub mod config;
pub mod error;
pub mod models;
pub mod routes;
pub mod store;

pub use crate::error::AppError;
