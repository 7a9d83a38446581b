use std::fmt;

#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
/// Coalescion service error.
pub enum Error {
    /// The shared task went away without publishing a value (it panicked or was aborted)
    RecvError,
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::RecvError => write!(f, "Shared task ended without publishing a result"),
        }
    }
}

impl std::error::Error for Error {}
