pub mod assembler;
pub mod catalog;
pub mod constants;
pub mod dispatch;
pub mod health;
pub mod logging;
pub mod mcp;
pub mod proxy;
pub mod relay;
pub mod routing;
pub mod server;
pub mod types;
pub mod upstream;

pub use types::*;

pub use server::{AppState, Args};
