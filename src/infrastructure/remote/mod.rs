// Remote authority adapter
// JSON over HTTP with snake_case keys

pub mod dto;
pub mod http_remote;

pub use http_remote::HttpRemoteAuthority;
