use std::error::Error;
use std::fmt;

/// An error type indicating that a generational step was
/// requested with arguments it cannot honor.
#[derive(Clone, Debug, PartialEq)]
pub enum EvolutionError {
    /// The offending argument, described.
    InvalidArgument(String),
}

impl fmt::Display for EvolutionError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InvalidArgument(description) => {
                write!(f, "invalid evolution argument: {}", description)
            }
        }
    }
}

impl Error for EvolutionError {}
