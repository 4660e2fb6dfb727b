/// The kind of error that occurred.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    /// The credential was rejected by the model provider.
    Unauthenticated,
    /// The prompt or the response was blocked by the provider.
    Blocked,
    /// The model provider is rate limited.
    RateLimitExceeded,
    /// Any other errors.
    Other,
}
