//! Unified error type.

use crate::validation::Location;

/// The error type returned by tsu-typed's fallible operations.
///
/// Application-level errors (400, 404, etc.) are expressed as HTTP
/// [`Response`](crate::Response) values, not as `Error`s. A request that
/// fails its schemas is a `400` response, never an `Error`. This type
/// surfaces infrastructure failures: binding, accepting, framing, and
/// decoding values the caller asked for by type.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("io: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid socket address `{0}`")]
    InvalidAddress(String),

    /// A path segment held a bad percent escape or decoded to invalid UTF-8.
    #[error("invalid path parameter `{name}`: `{value}`")]
    InvalidParam { name: String, value: String },

    #[error("invalid query string: {0}")]
    InvalidQuery(#[from] serde_urlencoded::de::Error),

    #[error("invalid schema: {0}")]
    InvalidSchema(String),

    /// A typed accessor such as [`Request::body_as`](crate::Request::body_as)
    /// could not decode the field into the requested type.
    #[error("cannot decode {location}: {source}")]
    Decode {
        location: Location,
        #[source]
        source: serde_json::Error,
    },

    #[error("http: {0}")]
    Http(#[from] http::Error),

    #[error("body: {0}")]
    Body(#[from] hyper::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
