use std::fmt;

#[derive(Debug)]
pub enum Error {
    Io(std::io::Error),
    /// A configured font file could not be parsed or embedded.
    Font(String),
    /// The report aggregate handed to the CLI could not be read.
    Report(String),
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::Io(e) => write!(f, "I/O error: {e}"),
            Error::Font(msg) => write!(f, "font error: {msg}"),
            Error::Report(msg) => write!(f, "invalid report: {msg}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Error::Io(e) => Some(e),
            _ => None,
        }
    }
}

impl From<std::io::Error> for Error {
    fn from(e: std::io::Error) -> Self {
        Error::Io(e)
    }
}

impl From<serde_json::Error> for Error {
    fn from(e: serde_json::Error) -> Self {
        Error::Report(e.to_string())
    }
}
