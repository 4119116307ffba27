// Infrastructure layer module
// Adapters for the remote authority and the on-device cache
// Follows Hexagonal Architecture

pub mod cache;
pub mod remote;
pub mod repositories;
