use crate::{Innovation, NodeId};

use std::error::Error;
use std::fmt;

/// An error type indicating that a genome could not
/// be evaluated.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ComputeError {
    /// The input vector's length did not match the
    /// genome's input node count.
    ArityMismatch { expected: usize, found: usize },
}

/// An error type indicating that a structural mutation
/// referred to an entity absent from the genome.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MutationError {
    /// No node with the given id exists in the genome.
    NodeNotFound(NodeId),
    /// No connection with the given innovation number
    /// exists in the genome.
    ConnectionNotFound(Innovation),
}

/// An error type indicating that a textual connection
/// encoding could not be parsed.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum EncodingError {
    /// The encoding does not split into an innovation header,
    /// a weight, and two node labels.
    MissingSegments(String),
    /// A node label does not split into a type token and an id.
    MalformedNode(String),
    /// A node label's type token is not one of the known roles.
    UnknownNodeType(String),
    /// A node label's id is not a hexadecimal integer.
    InvalidId(String),
    /// The innovation number is not a decimal integer.
    InvalidInnovation(String),
    /// The weight is not a decimal float.
    InvalidWeight(String),
}

impl fmt::Display for ComputeError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::ArityMismatch { expected, found } => write!(
                f,
                "computation with {} input values on a genome with {} input nodes",
                found, expected
            ),
        }
    }
}

impl fmt::Display for MutationError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::NodeNotFound(id) => write!(f, "mutation on nonexistant node with id {:x}", id),
            Self::ConnectionNotFound(innovation) => write!(
                f,
                "mutation on nonexistant connection with innovation number {}",
                innovation
            ),
        }
    }
}

impl fmt::Display for EncodingError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::MissingSegments(encoding) => {
                write!(f, "connection encoding with missing segments: {:?}", encoding)
            }
            Self::MalformedNode(label) => write!(f, "malformed node label: {:?}", label),
            Self::UnknownNodeType(token) => write!(f, "unknown node type token: {:?}", token),
            Self::InvalidId(id) => write!(f, "node id is not a hexadecimal integer: {:?}", id),
            Self::InvalidInnovation(innovation) => write!(
                f,
                "innovation number is not a decimal integer: {:?}",
                innovation
            ),
            Self::InvalidWeight(weight) => {
                write!(f, "weight is not a decimal float: {:?}", weight)
            }
        }
    }
}

impl Error for ComputeError {}
impl Error for MutationError {}
impl Error for EncodingError {}
