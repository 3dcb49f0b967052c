use std::{error, fmt, io};

pub type KappaResult<T> = Result<T, KappaError>;

#[derive(Debug)]
pub enum KappaError {
    /// A channel needed by the requested computation is absent.
    MissingData { key: String, context: String },
    InvalidInput(String),
    InvalidConfig(String),
    Io(io::Error),
    Serialization(String),
}

impl KappaError {
    pub fn missing(key: &str, context: impl Into<String>) -> Self {
        Self::MissingData {
            key: key.to_string(),
            context: context.into(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }
}

impl fmt::Display for KappaError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingData { key, context } => write!(f, "{context}: missing '{key}'"),
            Self::InvalidInput(msg) => write!(f, "invalid input: {msg}"),
            Self::InvalidConfig(msg) => write!(f, "invalid configuration: {msg}"),
            Self::Io(err) => write!(f, "io: {err}"),
            Self::Serialization(msg) => write!(f, "serialization: {msg}"),
        }
    }
}

impl error::Error for KappaError {
    fn source(&self) -> Option<&(dyn error::Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            _ => None,
        }
    }
}

impl From<io::Error> for KappaError {
    fn from(err: io::Error) -> Self {
        Self::Io(err)
    }
}

impl From<bincode::Error> for KappaError {
    fn from(err: bincode::Error) -> Self {
        Self::Serialization(err.to_string())
    }
}
