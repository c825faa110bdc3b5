use std::fmt;

/// A basic error type from this library.
#[derive(Clone, Debug, PartialEq, Eq)]
#[non_exhaustive]
pub enum Error {
    /// A generic error message.
    Msg(String),

    /// The (interface index, IP version) pair is not a known interface.
    InvalidInterface,

    /// No live cache entry matches the record.
    InvalidRecord,

    /// A service instance name could not be split into instance, type and domain.
    BadServiceName(String),

    /// A name is not a valid domain name.
    InvalidDomainName(String),

    /// Too many objects, e.g. the limit of record browsers is reached.
    TooManyObjects,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Msg(s) => write!(f, "{}", s),
            Error::InvalidInterface => write!(f, "invalid interface index or protocol"),
            Error::InvalidRecord => write!(f, "invalid record"),
            Error::BadServiceName(name) => write!(f, "invalid service name: {}", name),
            Error::InvalidDomainName(name) => write!(f, "invalid domain name: {}", name),
            Error::TooManyObjects => write!(f, "too many objects"),
        }
    }
}

impl std::error::Error for Error {}

/// A simple macro to report all kinds of errors.
macro_rules! e_fmt {
  ($($arg:tt)+) => {
      Error::Msg(format!($($arg)+))
  };
}

pub(crate) use e_fmt;

/// One and only `Result` type from this library crate.
pub type Result<T> = core::result::Result<T, Error>;
