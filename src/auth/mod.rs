// Authentication module
// The engine only forwards credentials issued elsewhere

pub mod credential;

pub use credential::Credential;
