use crate::{Innovation, NodeId};

use ahash::RandomState;
use serde::{Deserialize, Serialize};

use std::collections::HashSet;
use std::fmt;

/// An Activation is the scalar squashing function
/// applied to a node's weighted input sum.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[non_exhaustive]
pub enum Activation {
    // tanh(x)
    Tanh,
    // 1 / (1 + exp(-x))
    Sigmoid,
    // x
    Identity,
    // max(0, x)
    ReLU,
}

impl Activation {
    /// Applies the activation function to `x`.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::Activation;
    ///
    /// assert_eq!(Activation::Tanh.apply(0.0), 0.0);
    /// assert_eq!(Activation::ReLU.apply(-3.0), 0.0);
    /// ```
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Activation::Tanh => x.tanh(),
            Activation::Sigmoid => 1.0 / (1.0 + (-x).exp()),
            Activation::Identity => x,
            Activation::ReLU => x.max(0.0),
        }
    }
}

impl Default for Activation {
    fn default() -> Activation {
        Activation::Tanh
    }
}

/// A NodeType indicates the role of a node
/// within its genome, without its payload.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub enum NodeType {
    /// Externally-written value sources.
    Input,
    /// Externally-read result nodes.
    Output,
    /// Interior computation nodes.
    Hidden,
    /// Constant value sources.
    Bias,
}

impl NodeType {
    pub(crate) fn token(self) -> &'static str {
        match self {
            NodeType::Input => "Input",
            NodeType::Output => "Output",
            NodeType::Hidden => "Hidden",
            NodeType::Bias => "Bias",
        }
    }

    pub(crate) fn from_token(token: &str) -> Option<NodeType> {
        match token {
            "Input" => Some(NodeType::Input),
            "Output" => Some(NodeType::Output),
            "Hidden" => Some(NodeType::Hidden),
            "Bias" => Some(NodeType::Bias),
            _ => None,
        }
    }
}

impl fmt::Display for NodeType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// A NodeKind is a node's role together with
/// its role-specific payload.
#[derive(Clone, Copy, Debug, PartialEq, Serialize, Deserialize)]
pub enum NodeKind {
    /// Reports the value most recently written to it.
    Input,
    /// Activates the weighted sum of its incoming connections.
    Output { activation: Activation },
    /// Activates the weighted sum of its incoming connections.
    Hidden { activation: Activation },
    /// Reports a fixed constant.
    Bias { value: f64 },
}

impl NodeKind {
    /// Returns the kind's payload-free role tag.
    pub fn node_type(&self) -> NodeType {
        match self {
            NodeKind::Input => NodeType::Input,
            NodeKind::Output { .. } => NodeType::Output,
            NodeKind::Hidden { .. } => NodeType::Hidden,
            NodeKind::Bias { .. } => NodeType::Bias,
        }
    }
}

/// A NodeRef names a node by id and role, without
/// granting access to the node itself. Connections
/// store their endpoints as NodeRefs.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct NodeRef {
    id: NodeId,
    node_type: NodeType,
}

impl NodeRef {
    /// Returns a reference to the node with the given id and role.
    pub fn new(id: NodeId, node_type: NodeType) -> NodeRef {
        NodeRef { id, node_type }
    }

    /// Returns the referenced node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the referenced node's role.
    pub fn node_type(&self) -> NodeType {
        self.node_type
    }
}

impl fmt::Display for NodeRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{:x}", self.node_type, self.id)
    }
}

/// The memoization slot of a node: whether a value
/// is currently cached, and the value itself.
#[derive(Clone, Copy, Debug, Default, PartialEq, Serialize, Deserialize)]
struct MemoSlot {
    cached: bool,
    value: f64,
}

/// Nodes are the structural elements of genomes
/// between which connections are created.
///
/// A node records its incident connections by
/// innovation number, in insertion order.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Node {
    id: NodeId,
    kind: NodeKind,
    incoming: Vec<Innovation>,
    outgoing: Vec<Innovation>,
    memo: MemoSlot,
}

impl Node {
    /// Generate a new unconnected node with the passed parameters.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Node, NodeKind};
    ///
    /// let node = Node::new(5, NodeKind::Hidden { activation: Activation::Tanh });
    /// ```
    pub fn new(id: NodeId, kind: NodeKind) -> Node {
        Node {
            id,
            kind,
            incoming: Vec::new(),
            outgoing: Vec::new(),
            memo: MemoSlot::default(),
        }
    }

    /// Returns the node's id.
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Returns the node's kind, payload included.
    pub fn kind(&self) -> NodeKind {
        self.kind
    }

    /// Returns the node's payload-free role tag.
    pub fn node_type(&self) -> NodeType {
        self.kind.node_type()
    }

    /// Returns a by-id reference to this node.
    pub fn as_ref(&self) -> NodeRef {
        NodeRef::new(self.id, self.node_type())
    }

    /// Returns an iterator over the node's incoming
    /// connections, in insertion order.
    pub fn incoming(&self) -> impl Iterator<Item = &Innovation> {
        self.incoming.iter()
    }

    /// Returns an iterator over the node's outgoing
    /// connections, in insertion order.
    pub fn outgoing(&self) -> impl Iterator<Item = &Innovation> {
        self.outgoing.iter()
    }

    /// Returns an unconnected copy of this node: same id
    /// and kind, empty adjacency, empty memo slot.
    pub(super) fn detached(&self) -> Node {
        Node::new(self.id, self.kind)
    }

    /// Records an incoming connection. Returns `false` without
    /// modification if the node cannot accept incoming connections
    /// (Input and Bias nodes) or already records this one.
    pub(super) fn attach_incoming(&mut self, gene: Innovation) -> bool {
        if matches!(self.kind, NodeKind::Input | NodeKind::Bias { .. })
            || self.incoming.contains(&gene)
        {
            return false;
        }
        self.incoming.push(gene);
        true
    }

    /// Records an outgoing connection. Returns `false` without
    /// modification if the node cannot accept outgoing connections
    /// (Output nodes) or already records this one.
    pub(super) fn attach_outgoing(&mut self, gene: Innovation) -> bool {
        if matches!(self.kind, NodeKind::Output { .. }) || self.outgoing.contains(&gene) {
            return false;
        }
        self.outgoing.push(gene);
        true
    }

    /// Whether the memo slot currently holds a value.
    pub(super) fn is_cached(&self) -> bool {
        self.memo.cached
    }

    /// The value in the memo slot. Meaningless unless cached,
    /// except for Input nodes, where it is the last written value.
    pub(super) fn value(&self) -> f64 {
        self.memo.value
    }

    /// Stores a value in the memo slot and marks it cached.
    pub(super) fn store(&mut self, value: f64) {
        self.memo = MemoSlot {
            cached: true,
            value,
        };
    }

    /// Empties the memo slot. The stale value is retained, which
    /// is what lets Input nodes keep reporting their last write.
    pub(super) fn discard_cache(&mut self) {
        self.memo.cached = false;
    }

    /// Drops adjacency entries that do not appear in `registered`,
    /// then restores any entry of `original`'s adjacency that does.
    /// Used to re-establish node/connection consistency after a
    /// structural copy.
    pub(super) fn repair_adjacency(
        &mut self,
        original: &Node,
        registered: &HashSet<Innovation, RandomState>,
    ) {
        repair_list(&mut self.incoming, &original.incoming, registered);
        repair_list(&mut self.outgoing, &original.outgoing, registered);
    }
}

fn repair_list(
    list: &mut Vec<Innovation>,
    original: &[Innovation],
    registered: &HashSet<Innovation, RandomState>,
) {
    list.retain(|gene| registered.contains(gene));
    for gene in original {
        if registered.contains(gene) && !list.contains(gene) {
            list.push(*gene);
        }
    }
}

impl fmt::Display for Node {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.as_ref())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn input_nodes_reject_incoming_connections() {
        let mut node = Node::new(0, NodeKind::Input);
        assert!(!node.attach_incoming(7));
        assert_eq!(node.incoming().count(), 0);
        assert!(node.attach_outgoing(7));
    }

    #[test]
    fn bias_nodes_reject_incoming_connections() {
        let mut node = Node::new(0, NodeKind::Bias { value: 1.0 });
        assert!(!node.attach_incoming(7));
        assert!(node.attach_outgoing(7));
    }

    #[test]
    fn output_nodes_reject_outgoing_connections() {
        let mut node = Node::new(
            0,
            NodeKind::Output {
                activation: Activation::Tanh,
            },
        );
        assert!(!node.attach_outgoing(7));
        assert!(node.attach_incoming(7));
    }

    #[test]
    fn duplicate_attachments_are_rejected() {
        let mut node = Node::new(
            3,
            NodeKind::Hidden {
                activation: Activation::Tanh,
            },
        );
        assert!(node.attach_incoming(7));
        assert!(!node.attach_incoming(7));
        assert_eq!(node.incoming().count(), 1);
    }

    #[test]
    fn adjacency_preserves_insertion_order() {
        let mut node = Node::new(
            3,
            NodeKind::Hidden {
                activation: Activation::Tanh,
            },
        );
        node.attach_incoming(9);
        node.attach_incoming(2);
        node.attach_incoming(5);
        assert_eq!(node.incoming().copied().collect::<Vec<_>>(), vec![9, 2, 5]);
    }

    #[test]
    fn discarded_memo_retains_value() {
        let mut node = Node::new(0, NodeKind::Input);
        node.store(0.25);
        node.discard_cache();
        assert!(!node.is_cached());
        assert_eq!(node.value(), 0.25);
    }

    #[test]
    fn node_display_uses_role_and_hex_id() {
        let node = Node::new(
            31,
            NodeKind::Hidden {
                activation: Activation::Tanh,
            },
        );
        assert_eq!(node.to_string(), "Hidden-1f");
    }
}
