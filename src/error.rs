use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    Io,
    Parse,
    NotFound,
    InvalidArgument,
    Internal,
    InvalidInput,
    InvalidState,
    /// Operation attempted after `Drop`.
    IndexDropped,
    /// Mutation attempted while the index is read-only.
    ReadOnly,
    /// Query string violates the grammar at a non-tolerated site.
    UnexpectedToken,
    /// Construction-time configuration is invalid (e.g. negative min token length).
    InvalidConfiguration,
}

#[derive(Debug, Clone)]
pub struct Error {
    pub kind: ErrorKind,
    pub context: String,
}

impl Error {
    pub fn new(kind: ErrorKind, context: impl Into<String>) -> Self {
        Error { kind, context: context.into() }
    }

    pub fn dropped() -> Self {
        Error::new(ErrorKind::IndexDropped, "index has been dropped")
    }

    pub fn read_only() -> Self {
        Error::new(ErrorKind::ReadOnly, "index is read-only")
    }

    pub fn unexpected_token(context: impl Into<String>) -> Self {
        Error::new(ErrorKind::UnexpectedToken, context)
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{:?}: {}", self.kind, self.context)
    }
}

impl std::error::Error for Error {}

impl From<std::io::Error> for Error {
    fn from(err: std::io::Error) -> Self {
        Error { kind: ErrorKind::Io, context: err.to_string() }
    }
}

impl From<bincode::Error> for Error {
    fn from(err: bincode::Error) -> Self {
        Error { kind: ErrorKind::Parse, context: err.to_string() }
    }
}

pub type Result<T> = std::result::Result<T, Error>;
