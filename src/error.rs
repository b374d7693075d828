//! Unified error type.

/// The error type returned by wayfarer's fallible operations.
///
/// Application-level outcomes (404, 401, a missing user id) are expressed as
/// HTTP [`Response`](crate::Response) values or as `Option`s, not as `Error`s.
/// This type surfaces infrastructure failures: binding to a port, accepting a
/// connection, or reading a request body off the wire.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("request body: {0}")]
    Body(#[from] hyper::Error),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn io_errors_keep_their_source() {
        let err = Error::from(std::io::Error::new(std::io::ErrorKind::AddrInUse, "taken"));
        assert_eq!(err.to_string(), "io: taken");
        assert!(std::error::Error::source(&err).is_some());
    }
}
