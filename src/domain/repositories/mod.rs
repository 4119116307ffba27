// Ports the engine depends on
// Implemented by the HTTP client and the SQLite cache in infrastructure

pub mod local_cache;
pub mod remote_authority;

pub use local_cache::LocalCache;
pub use remote_authority::{RemoteAuthority, RemoteError};
