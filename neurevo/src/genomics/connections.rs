use super::errors::EncodingError;
use super::nodes::{NodeRef, NodeType};
use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

use std::fmt;
use std::str::FromStr;

/// Connections are the principal components of genomes.
/// They are created between two nodes, and carry a value
/// from the source to the target scaled by their weight.
///
/// A connection is identified by its innovation number,
/// which is unique within its population lineage.
#[derive(Clone, PartialEq, Debug, Serialize, Deserialize)]
pub struct Connection {
    innovation: Innovation,
    weight: f64,
    source: NodeRef,
    target: NodeRef,
}

impl Connection {
    /// Returns a new connection with the specified parameters.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Connection, NodeRef, NodeType};
    ///
    /// let connection = Connection::new(
    ///     42,
    ///     0.5,
    ///     NodeRef::new(3, NodeType::Input),
    ///     NodeRef::new(9, NodeType::Output),
    /// );
    /// ```
    pub fn new(innovation: Innovation, weight: f64, source: NodeRef, target: NodeRef) -> Connection {
        Connection {
            innovation,
            weight,
            source,
            target,
        }
    }

    /// Returns the connection's innovation number.
    pub fn innovation(&self) -> Innovation {
        self.innovation
    }

    /// Returns the connection's weight.
    pub fn weight(&self) -> f64 {
        self.weight
    }

    /// Sets the connection's weight.
    pub fn set_weight(&mut self, weight: f64) {
        self.weight = weight;
    }

    /// Returns a reference to the connection's source node.
    pub fn source(&self) -> NodeRef {
        self.source
    }

    /// Returns a reference to the connection's target node.
    pub fn target(&self) -> NodeRef {
        self.target
    }

    /// Whether `other` joins the same two nodes in the same
    /// direction, regardless of innovation number and weight.
    pub fn same_endpoints(&self, other: &Connection) -> bool {
        self.source.id() == other.source.id() && self.target.id() == other.target.id()
    }
}

/// Encodes the connection as
/// `"<innovation>:\t<Type>-<hex id>-><weight>-><Type>-<hex id>"`.
impl fmt::Display for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{}:\t{}->{}->{}",
            self.innovation, self.source, self.weight, self.target
        )
    }
}

impl FromStr for Connection {
    type Err = EncodingError;

    /// Parses a connection from its `Display` encoding.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::Connection;
    ///
    /// let connection: Connection = "42:\tInput-3->0.5->Output-9".parse().unwrap();
    /// assert_eq!(connection.innovation(), 42);
    /// assert_eq!(connection.weight(), 0.5);
    /// ```
    fn from_str(s: &str) -> Result<Connection, EncodingError> {
        let mut segments = s.split("->");
        let (header, weight, target) = match (segments.next(), segments.next(), segments.next()) {
            (Some(header), Some(weight), Some(target)) if segments.next().is_none() => {
                (header, weight, target)
            }
            _ => return Err(EncodingError::MissingSegments(s.to_string())),
        };
        let (innovation, source) = header
            .split_once(":\t")
            .ok_or_else(|| EncodingError::MissingSegments(s.to_string()))?;
        let innovation = innovation
            .parse::<Innovation>()
            .map_err(|_| EncodingError::InvalidInnovation(innovation.to_string()))?;
        let weight = weight
            .parse::<f64>()
            .map_err(|_| EncodingError::InvalidWeight(weight.to_string()))?;
        Ok(Connection {
            innovation,
            weight,
            source: parse_node_ref(source)?,
            target: parse_node_ref(target)?,
        })
    }
}

/// Parses a `"<Type>-<hex id>"` node label.
fn parse_node_ref(label: &str) -> Result<NodeRef, EncodingError> {
    let (token, id) = label
        .split_once('-')
        .ok_or_else(|| EncodingError::MalformedNode(label.to_string()))?;
    let node_type = NodeType::from_token(token)
        .ok_or_else(|| EncodingError::UnknownNodeType(token.to_string()))?;
    let id =
        NodeId::from_str_radix(id, 16).map_err(|_| EncodingError::InvalidId(id.to_string()))?;
    Ok(NodeRef::new(id, node_type))
}
