// Bearer credential forwarded to the remote authority
// Supplied by the authentication collaborator; never inspected here

/// Opaque bearer token passed explicitly into every engine operation
///
/// `Debug` never prints the token.
///
/// # Example
/// ```
/// use raid_enrollment::auth::Credential;
///
/// let credential = Credential::bearer("secret-token");
/// assert_eq!(credential.token(), "secret-token");
/// assert!(!format!("{:?}", credential).contains("secret-token"));
/// ```
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn bearer(token: impl Into<String>) -> Self {
        Self(token.into())
    }

    /// Raw token for the `Authorization` header
    pub fn token(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str("Credential(<redacted>)")
    }
}
