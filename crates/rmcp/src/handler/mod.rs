//! Request-handler traits (what user code implements) and, for the server
//! side, the dispatch routers built on top of them.

#[macro_use]
mod macros;

#[cfg(feature = "client")]
pub mod client;
#[cfg(feature = "server")]
pub mod server;
