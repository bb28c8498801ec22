//! Genomes are the focus of evolution in NEAT.
//! They are a collection of nodes and weighted connections that
//! double as an executable feed-forward network. Genomes can be
//! progressively mutated, thus adding complexity and functionality.

mod connections;
mod errors;
mod history;
mod nodes;

pub use connections::Connection;
pub use errors::{ComputeError, EncodingError, MutationError};
pub use history::History;
pub use nodes::{Activation, Node, NodeKind, NodeRef, NodeType};

use crate::{Innovation, NodeId};

use ahash::RandomState;
use rand::prelude::{Rng, SliceRandom};
use serde::{Deserialize, Serialize};

use std::cmp::Ordering;
use std::collections::{BTreeMap, HashSet};
use std::fmt;

/// A mutable collection of nodes and connections that can be
/// evaluated as a feed-forward network.
///
/// Nodes are owned by the genome and referred to by id; the
/// connection table is keyed by innovation number. Evaluation
/// is lazy and memoized per node, so sub-networks shared by
/// several outputs are computed once per set of inputs.
///
/// Supports Serde for convenient genome saving and loading.
#[derive(PartialEq, Debug, Serialize, Deserialize)]
pub struct Genome {
    inputs: Vec<Node>,
    outputs: Vec<Node>,
    biases: Vec<Node>,
    hidden: BTreeMap<NodeId, Node>,
    connections: BTreeMap<Innovation, Connection>,
}

impl Genome {
    /// Create a new unconnected genome with the given number of
    /// input and output nodes, drawing node ids from `history`.
    /// Output nodes use `output_activation`.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Genome, History, NodeType};
    ///
    /// let mut history = History::new();
    /// let genome = Genome::new(3, 2, Activation::Tanh, &mut history);
    ///
    /// assert_eq!(genome.inputs().count(), 3);
    /// assert_eq!(genome.outputs().count(), 2);
    /// assert_eq!(genome.connections().count(), 0);
    /// ```
    pub fn new(
        num_inputs: usize,
        num_outputs: usize,
        output_activation: Activation,
        history: &mut History,
    ) -> Genome {
        let mut genome = Genome::empty();
        for _ in 0..num_inputs {
            genome.insert_node(Node::new(history.next_node_id(), NodeKind::Input));
        }
        for _ in 0..num_outputs {
            genome.insert_node(Node::new(
                history.next_node_id(),
                NodeKind::Output {
                    activation: output_activation,
                },
            ));
        }
        genome
    }

    fn empty() -> Genome {
        Genome {
            inputs: Vec::new(),
            outputs: Vec::new(),
            biases: Vec::new(),
            hidden: BTreeMap::new(),
            connections: BTreeMap::new(),
        }
    }

    /// Returns the node with the given id, if present.
    pub fn find_node(&self, id: NodeId) -> Option<&Node> {
        self.inputs
            .iter()
            .find(|n| n.id() == id)
            .or_else(|| self.outputs.iter().find(|n| n.id() == id))
            .or_else(|| self.biases.iter().find(|n| n.id() == id))
            .or_else(|| self.hidden.get(&id))
    }

    fn find_node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        if let Some(i) = self.inputs.iter().position(|n| n.id() == id) {
            return self.inputs.get_mut(i);
        }
        if let Some(i) = self.outputs.iter().position(|n| n.id() == id) {
            return self.outputs.get_mut(i);
        }
        if let Some(i) = self.biases.iter().position(|n| n.id() == id) {
            return self.biases.get_mut(i);
        }
        self.hidden.get_mut(&id)
    }

    /// Add a new node to the genome, routed to the collection
    /// matching its role. Returns `false` without modification
    /// if a node with the same id already exists.
    pub fn insert_node(&mut self, node: Node) -> bool {
        if self.find_node(node.id()).is_some() {
            return false;
        }
        match node.node_type() {
            NodeType::Input => self.inputs.push(node),
            NodeType::Output => self.outputs.push(node),
            NodeType::Bias => self.biases.push(node),
            NodeType::Hidden => {
                self.hidden.insert(node.id(), node);
            }
        }
        true
    }

    /// Registers a connection and attaches it to both endpoints'
    /// adjacency lists. If a registered connection with the same
    /// endpoints already exists, the new one is registered but
    /// not attached, so the adjacency lists never list the same
    /// edge twice.
    fn attach(&mut self, connection: Connection) {
        let innovation = connection.innovation();
        let duplicate = self
            .connections
            .values()
            .any(|existing| existing.same_endpoints(&connection));
        if !duplicate {
            if let Some(node) = self.find_node_mut(connection.source().id()) {
                node.attach_outgoing(innovation);
            }
            if let Some(node) = self.find_node_mut(connection.target().id()) {
                node.attach_incoming(innovation);
            }
        }
        self.connections.insert(innovation, connection);
    }

    /// Create a connection from node `from` to node `to` with the
    /// given weight, assigning it a fresh innovation number.
    /// Returns the new connection's innovation number.
    ///
    /// No cycle detection is performed; see [`Genome::try_connect`]
    /// for the checked variant.
    ///
    /// # Errors
    /// Fails if either endpoint does not exist in the genome.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Genome, History};
    ///
    /// let mut history = History::new();
    /// let mut genome = Genome::new(1, 1, Activation::Tanh, &mut history);
    ///
    /// genome.connect(0, 1, 0.5, &mut history).unwrap();
    /// assert_eq!(genome.connections().count(), 1);
    ///
    /// assert!(genome.connect(99, 1, 0.5, &mut history).is_err());
    /// ```
    pub fn connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        history: &mut History,
    ) -> Result<Innovation, MutationError> {
        let source = self
            .find_node(from)
            .ok_or(MutationError::NodeNotFound(from))?
            .as_ref();
        let target = self
            .find_node(to)
            .ok_or(MutationError::NodeNotFound(to))?
            .as_ref();
        let innovation = history.next_innovation();
        self.attach(Connection::new(innovation, weight, source, target));
        Ok(innovation)
    }

    /// Create a connection from node `from` to node `to` unless
    /// doing so would close a directed cycle. Returns whether the
    /// connection was created. On rejection the genome is left
    /// unmodified and no innovation number is consumed.
    ///
    /// # Errors
    /// Fails if either endpoint does not exist in the genome.
    pub fn try_connect(
        &mut self,
        from: NodeId,
        to: NodeId,
        weight: f64,
        history: &mut History,
    ) -> Result<bool, MutationError> {
        if self.find_node(from).is_none() {
            return Err(MutationError::NodeNotFound(from));
        }
        if self.find_node(to).is_none() {
            return Err(MutationError::NodeNotFound(to));
        }
        let mut visited: HashSet<NodeId, RandomState> = HashSet::default();
        if self.path_exists(to, from, &mut visited) {
            return Ok(false);
        }
        self.connect(from, to, weight, history).map(|_| true)
    }

    /// Whether a directed path `start -> ... -> goal` exists,
    /// counting the empty path (`start == goal`).
    fn path_exists(
        &self,
        start: NodeId,
        goal: NodeId,
        visited: &mut HashSet<NodeId, RandomState>,
    ) -> bool {
        if start == goal {
            return true;
        }
        if !visited.insert(start) {
            return false;
        }
        match self.find_node(start) {
            Some(node) => node.outgoing().any(|gene| {
                let next = self.connections[gene].target().id();
                self.path_exists(next, goal, visited)
            }),
            None => false,
        }
    }

    /// Split the connection with the given innovation number by
    /// routing a new Hidden node alongside it: the original
    /// connection is kept, a connection from its source to the new
    /// node inherits the original weight, and a connection from the
    /// new node to its target gets weight `1.0`. Returns the new
    /// node's id.
    ///
    /// # Errors
    /// Fails if no connection with the given innovation number
    /// exists in the genome.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Genome, History};
    ///
    /// let mut history = History::new();
    /// let mut genome = Genome::new(1, 1, Activation::Tanh, &mut history);
    /// let innovation = genome.connect(0, 1, 0.5, &mut history).unwrap();
    ///
    /// genome.split(innovation, &mut history).unwrap();
    ///
    /// // The original connection remains alongside the new path.
    /// assert_eq!(genome.connections().count(), 3);
    /// assert_eq!(genome.connection(innovation).unwrap().weight(), 0.5);
    /// ```
    pub fn split(
        &mut self,
        innovation: Innovation,
        history: &mut History,
    ) -> Result<NodeId, MutationError> {
        let (source, target, weight) = {
            let connection = self
                .connections
                .get(&innovation)
                .ok_or(MutationError::ConnectionNotFound(innovation))?;
            (connection.source(), connection.target(), connection.weight())
        };
        let id = history.next_node_id();
        self.insert_node(Node::new(
            id,
            NodeKind::Hidden {
                activation: Activation::default(),
            },
        ));
        let via = NodeRef::new(id, NodeType::Hidden);
        self.attach(Connection::new(history.next_innovation(), weight, source, via));
        self.attach(Connection::new(history.next_innovation(), 1.0, via, target));
        Ok(id)
    }

    /// Assigns a uniformly random weight in `[0, 1)` to a random
    /// connection. Does nothing on a connectionless genome.
    pub fn mutate_weight(&mut self, rng: &mut impl Rng) {
        if self.connections.is_empty() {
            return;
        }
        let index = rng.gen_range(0..self.connections.len());
        if let Some(connection) = self.connections.values_mut().nth(index) {
            connection.set_weight(rng.gen());
        }
    }

    /// Adds a Bias node reporting a uniformly random constant in
    /// `[0, 1)` and connects it with a uniformly random weight to
    /// a random Hidden or Output node. Returns the new node's id,
    /// or `None` if the genome has no eligible target.
    pub fn add_bias(&mut self, rng: &mut impl Rng, history: &mut History) -> Option<NodeId> {
        let targets: Vec<NodeId> = self
            .hidden
            .values()
            .chain(self.outputs.iter())
            .map(Node::id)
            .collect();
        let target = *targets.choose(rng)?;
        let id = history.next_node_id();
        self.insert_node(Node::new(id, NodeKind::Bias { value: rng.gen() }));
        match self.try_connect(id, target, rng.gen(), history) {
            // A fresh Bias node is unreachable from the rest of the
            // genome, so the connection can never close a cycle.
            Ok(_) => Some(id),
            Err(_) => None,
        }
    }

    /// Evaluates the genome on the given input values, returning
    /// one value per Output node, in node order.
    ///
    /// Cached values from the previous evaluation are discarded
    /// along every path that reaches an output before the new
    /// inputs are written, so repeated calls see fresh results
    /// while sub-networks shared by several outputs are still
    /// computed only once per call.
    ///
    /// The genome must be acyclic; evaluating a genome with a
    /// directed cycle will overflow the stack. Genomes built
    /// through [`Genome::try_connect`], [`Genome::split`] and
    /// [`Genome::add_bias`] are always acyclic.
    ///
    /// # Errors
    /// Fails if `input_values` does not have exactly one value
    /// per Input node.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::{Activation, Genome, History};
    ///
    /// let mut history = History::new();
    /// let mut genome = Genome::new(2, 1, Activation::Tanh, &mut history);
    /// genome.connect(0, 2, 0.5, &mut history).unwrap();
    /// genome.connect(1, 2, -0.5, &mut history).unwrap();
    ///
    /// // tanh(1.0 * 0.5 + 1.0 * -0.5) == 0.0
    /// assert_eq!(genome.compute(&[1.0, 1.0]).unwrap(), vec![0.0]);
    /// ```
    pub fn compute(&mut self, input_values: &[f64]) -> Result<Vec<f64>, ComputeError> {
        if input_values.len() != self.inputs.len() {
            return Err(ComputeError::ArityMismatch {
                expected: self.inputs.len(),
                found: input_values.len(),
            });
        }
        let output_ids: Vec<NodeId> = self.outputs.iter().map(Node::id).collect();
        for id in &output_ids {
            self.discard_cache_upstream(*id);
        }
        for (node, value) in self.inputs.iter_mut().zip(input_values) {
            node.store(*value);
        }
        Ok(output_ids.iter().map(|id| self.read_node(*id)).collect())
    }

    /// Discards this node's cached value and walks backward into
    /// every predecessor that still holds one. Predecessors without
    /// a cached value have already been invalidated, so the walk
    /// stops there.
    fn discard_cache_upstream(&mut self, id: NodeId) {
        let incoming: Vec<Innovation> = match self.find_node_mut(id) {
            Some(node) => {
                node.discard_cache();
                node.incoming().copied().collect()
            }
            None => return,
        };
        for gene in incoming {
            let source = self.connections[&gene].source().id();
            if self.find_node(source).map_or(false, Node::is_cached) {
                self.discard_cache_upstream(source);
            }
        }
    }

    /// Reads a node's value, computing and caching it on demand.
    fn read_node(&mut self, id: NodeId) -> f64 {
        let node = self
            .find_node(id)
            .unwrap_or_else(|| panic!("adjacency refers to nonexistant node with id {:x}", id));
        let activation = match node.kind() {
            NodeKind::Bias { value } => return value,
            NodeKind::Input => return node.value(),
            NodeKind::Hidden { activation } | NodeKind::Output { activation } => activation,
        };
        if node.is_cached() {
            return node.value();
        }
        let terms: Vec<(NodeId, f64)> = node
            .incoming()
            .map(|gene| {
                let connection = &self.connections[gene];
                (connection.source().id(), connection.weight())
            })
            .collect();
        let mut sum = 0.0;
        for (source, weight) in terms {
            sum += self.read_node(source) * weight;
        }
        let value = activation.apply(sum);
        if let Some(node) = self.find_node_mut(id) {
            node.store(value);
        }
        value
    }

    /// Returns a deep copy of the genome, built in two phases:
    /// a structural copy of every node and connection, followed
    /// by an adjacency repair pass that re-establishes the
    /// correspondence between adjacency entries and the copied
    /// connection table. `Clone` delegates to this.
    pub fn duplicate(&self) -> Genome {
        let mut copy = Genome {
            inputs: self.inputs.clone(),
            outputs: self.outputs.clone(),
            biases: self.biases.clone(),
            hidden: self.hidden.clone(),
            connections: self.connections.clone(),
        };
        copy.repair_references(self);
        copy
    }

    /// Drops adjacency entries with no registered connection and
    /// restores registered entries from `original`'s adjacency.
    fn repair_references(&mut self, original: &Genome) {
        let registered: HashSet<Innovation, RandomState> =
            self.connections.keys().copied().collect();
        for (node, original_node) in self
            .inputs
            .iter_mut()
            .zip(&original.inputs)
            .chain(self.outputs.iter_mut().zip(&original.outputs))
            .chain(self.biases.iter_mut().zip(&original.biases))
        {
            node.repair_adjacency(original_node, &registered);
        }
        for (id, node) in &mut self.hidden {
            node.repair_adjacency(&original.hidden[id], &registered);
        }
    }

    /// Combines this genome with `other` by walking both connection
    /// tables in ascending innovation order. Connections present in
    /// both parents are inherited from a uniformly random one;
    /// disjoint and excess connections are always inherited.
    /// Endpoint nodes are created in the child the first time a
    /// connection refers to them, copying id and kind from the
    /// parent the connection came from, and reused afterwards.
    ///
    /// Both parents must draw from the same [`History`], or
    /// innovation numbers will not identify common structure.
    ///
    /// Crossover does not check the combined structure for cycles;
    /// see [`Genome::compute`] for the implications.
    pub fn crossover(&self, other: &Genome, rng: &mut impl Rng) -> Genome {
        let mut child = Genome::empty();
        let mut own = self.connections.values().peekable();
        let mut others = other.connections.values().peekable();
        loop {
            match (own.peek(), others.peek()) {
                (Some(first), Some(second)) => {
                    match first.innovation().cmp(&second.innovation()) {
                        Ordering::Equal => {
                            if rng.gen::<bool>() {
                                child.adopt_connection(first, self);
                            } else {
                                child.adopt_connection(second, other);
                            }
                            own.next();
                            others.next();
                        }
                        Ordering::Less => {
                            child.adopt_connection(first, self);
                            own.next();
                        }
                        Ordering::Greater => {
                            child.adopt_connection(second, other);
                            others.next();
                        }
                    }
                }
                (Some(first), None) => {
                    child.adopt_connection(first, self);
                    own.next();
                }
                (None, Some(second)) => {
                    child.adopt_connection(second, other);
                    others.next();
                }
                (None, None) => break,
            }
        }
        child
    }

    /// Copies a connection from `donor` into this genome, creating
    /// any endpoint node not yet present as an unconnected copy of
    /// the donor's node.
    fn adopt_connection(&mut self, connection: &Connection, donor: &Genome) {
        for endpoint in [connection.source(), connection.target()] {
            if self.find_node(endpoint.id()).is_none() {
                let template = donor
                    .find_node(endpoint.id())
                    .unwrap_or_else(|| {
                        panic!(
                            "donor connection {} refers to nonexistant node with id {:x}",
                            connection.innovation(),
                            endpoint.id()
                        )
                    });
                self.insert_node(template.detached());
            }
        }
        self.attach(connection.clone());
    }

    /// Returns an iterator over the genome's Input nodes, in order.
    pub fn inputs(&self) -> impl Iterator<Item = &Node> {
        self.inputs.iter()
    }

    /// Returns an iterator over the genome's Output nodes, in order.
    pub fn outputs(&self) -> impl Iterator<Item = &Node> {
        self.outputs.iter()
    }

    /// Returns an iterator over the genome's Bias nodes,
    /// in insertion order.
    pub fn biases(&self) -> impl Iterator<Item = &Node> {
        self.biases.iter()
    }

    /// Returns an iterator over the genome's Hidden nodes,
    /// in ascending id order.
    pub fn hidden_nodes(&self) -> impl Iterator<Item = &Node> {
        self.hidden.values()
    }

    /// Returns an iterator over all the genome's nodes.
    pub fn nodes(&self) -> impl Iterator<Item = &Node> {
        self.inputs
            .iter()
            .chain(self.outputs.iter())
            .chain(self.biases.iter())
            .chain(self.hidden.values())
    }

    /// Returns an iterator over the genome's connections,
    /// in ascending innovation order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values()
    }

    /// Returns the connection with the given innovation number,
    /// if present.
    pub fn connection(&self, innovation: Innovation) -> Option<&Connection> {
        self.connections.get(&innovation)
    }
}

impl Clone for Genome {
    fn clone(&self) -> Genome {
        self.duplicate()
    }
}

impl fmt::Display for Genome {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "Genome {{")?;
        for connection in self.connections.values() {
            writeln!(f, "\t{}", connection)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    /// 2 inputs (ids 0, 1), 1 output (id 2), no connections.
    fn two_in_one_out() -> (Genome, History) {
        let mut history = History::new();
        let genome = Genome::new(2, 1, Activation::Tanh, &mut history);
        (genome, history)
    }

    #[test]
    fn new_genome_has_requested_shape() {
        let (genome, _) = two_in_one_out();
        assert_eq!(genome.inputs().map(Node::id).collect::<Vec<_>>(), vec![0, 1]);
        assert_eq!(genome.outputs().map(Node::id).collect::<Vec<_>>(), vec![2]);
        assert_eq!(genome.hidden_nodes().count(), 0);
        assert_eq!(genome.connections().count(), 0);
    }

    #[test]
    fn compute_rejects_arity_mismatch() {
        let (mut genome, _) = two_in_one_out();
        assert_eq!(
            genome.compute(&[1.0, 2.0, 3.0]),
            Err(ComputeError::ArityMismatch {
                expected: 2,
                found: 3
            })
        );
        assert_eq!(
            genome.compute(&[]),
            Err(ComputeError::ArityMismatch {
                expected: 2,
                found: 0
            })
        );
    }

    #[test]
    fn compute_activates_weighted_input_sum() {
        let (mut genome, mut history) = two_in_one_out();
        genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.connect(1, 2, -0.5, &mut history).unwrap();
        assert_eq!(genome.compute(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn compute_reflects_new_inputs_after_caching() {
        let (mut genome, mut history) = two_in_one_out();
        genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.connect(1, 2, -0.5, &mut history).unwrap();
        assert_eq!(genome.compute(&[1.0, 0.0]).unwrap(), vec![0.5f64.tanh()]);
        assert_eq!(genome.compute(&[0.0, 1.0]).unwrap(), vec![(-0.5f64).tanh()]);
    }

    #[test]
    fn compute_traverses_hidden_nodes() {
        let mut history = History::new();
        let mut genome = Genome::new(1, 1, Activation::Tanh, &mut history);
        let direct = genome.connect(0, 1, 1.0, &mut history).unwrap();
        genome.split(direct, &mut history).unwrap();

        // Output sees the direct connection plus the split path
        // through the hidden node.
        let expected = |x: f64| (x + x.tanh()).tanh();
        assert_eq!(genome.compute(&[0.5]).unwrap(), vec![expected(0.5)]);
        assert_eq!(genome.compute(&[0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn compute_works_on_unconnected_outputs() {
        let (mut genome, _) = two_in_one_out();
        assert_eq!(genome.compute(&[1.0, 1.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn split_keeps_the_original_connection() {
        let (mut genome, mut history) = two_in_one_out();
        let split_target = genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.connect(1, 2, 0.25, &mut history).unwrap();

        let hidden = genome.split(split_target, &mut history).unwrap();

        assert_eq!(genome.connections().count(), 4);
        assert_eq!(
            genome
                .connections()
                .filter(|c| c.target().id() == 2)
                .count(),
            3
        );
        // The original connection is untouched.
        assert_eq!(genome.connection(split_target).unwrap().weight(), 0.5);
        // The new path inherits the original weight, then 1.0.
        let incoming: Vec<&Connection> = genome
            .connections()
            .filter(|c| c.target().id() == hidden)
            .collect();
        let outgoing: Vec<&Connection> = genome
            .connections()
            .filter(|c| c.source().id() == hidden)
            .collect();
        assert_eq!(incoming.len(), 1);
        assert_eq!(incoming[0].weight(), 0.5);
        assert_eq!(incoming[0].source().id(), 0);
        assert_eq!(outgoing.len(), 1);
        assert_eq!(outgoing[0].weight(), 1.0);
        assert_eq!(outgoing[0].target().id(), 2);
        assert_eq!(genome.find_node(hidden).unwrap().node_type(), NodeType::Hidden);
    }

    #[test]
    fn split_of_nonexistant_connection_fails() {
        let (mut genome, mut history) = two_in_one_out();
        assert_eq!(
            genome.split(99, &mut history),
            Err(MutationError::ConnectionNotFound(99))
        );
    }

    #[test]
    fn connect_to_nonexistant_endpoint_fails() {
        let (mut genome, mut history) = two_in_one_out();
        assert_eq!(
            genome.connect(0, 99, 0.5, &mut history),
            Err(MutationError::NodeNotFound(99))
        );
        assert_eq!(
            genome.connect(99, 2, 0.5, &mut history),
            Err(MutationError::NodeNotFound(99))
        );
        assert_eq!(genome.connections().count(), 0);
    }

    #[test]
    fn try_connect_rejects_cycles() {
        let mut history = History::new();
        let mut genome = Genome::new(1, 1, Activation::Tanh, &mut history);
        let direct = genome.connect(0, 1, 1.0, &mut history).unwrap();
        let h1 = genome.split(direct, &mut history).unwrap();
        let into_h1 = genome
            .connections()
            .find(|c| c.target().id() == h1)
            .unwrap()
            .innovation();
        let h2 = genome.split(into_h1, &mut history).unwrap();

        let before = genome.duplicate();
        let history_before = history.clone();

        // h2 -> h1 exists, so h1 -> h2 would close a cycle.
        assert_eq!(genome.try_connect(h1, h2, 0.5, &mut history), Ok(false));
        assert_eq!(genome, before);
        assert_eq!(history, history_before);
    }

    #[test]
    fn try_connect_rejects_self_loops() {
        let (mut genome, mut history) = two_in_one_out();
        let before = genome.duplicate();
        assert_eq!(genome.try_connect(2, 2, 0.5, &mut history), Ok(false));
        assert_eq!(genome, before);
    }

    #[test]
    fn try_connect_creates_acyclic_connections() {
        let (mut genome, mut history) = two_in_one_out();
        assert_eq!(genome.try_connect(0, 2, 0.5, &mut history), Ok(true));
        assert_eq!(genome.connections().count(), 1);
        assert_eq!(
            genome.find_node(2).unwrap().incoming().count(),
            1
        );
    }

    #[test]
    fn try_connect_checks_endpoints_before_cycles() {
        let (mut genome, mut history) = two_in_one_out();
        assert_eq!(
            genome.try_connect(99, 2, 0.5, &mut history),
            Err(MutationError::NodeNotFound(99))
        );
    }

    #[test]
    fn structural_duplicates_are_not_attached_twice() {
        let (mut genome, mut history) = two_in_one_out();
        genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.connect(0, 2, 0.75, &mut history).unwrap();
        assert_eq!(genome.connections().count(), 2);
        assert_eq!(genome.find_node(2).unwrap().incoming().count(), 1);
        assert_eq!(genome.find_node(0).unwrap().outgoing().count(), 1);
    }

    #[test]
    fn duplicates_are_structurally_identical() {
        let (mut genome, mut history) = two_in_one_out();
        let innovation = genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.split(innovation, &mut history).unwrap();

        let mut copy = genome.duplicate();
        assert_eq!(copy, genome);
        assert_eq!(copy.compute(&[1.0, 0.0]), genome.compute(&[1.0, 0.0]));
    }

    #[test]
    fn duplicates_evolve_independently() {
        let (mut genome, mut history) = two_in_one_out();
        let innovation = genome.connect(0, 2, 0.5, &mut history).unwrap();

        let mut copy = genome.clone();
        copy.split(innovation, &mut history).unwrap();
        copy.mutate_weight(&mut StdRng::seed_from_u64(42));

        assert_eq!(genome.connections().count(), 1);
        assert_eq!(genome.hidden_nodes().count(), 0);
        assert_eq!(genome.connection(innovation).unwrap().weight(), 0.5);
    }

    #[test]
    fn duplicates_keep_node_ids_unique() {
        let (mut genome, mut history) = two_in_one_out();
        let innovation = genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.split(innovation, &mut history).unwrap();

        let copy = genome.duplicate();
        let mut ids: Vec<NodeId> = copy.nodes().map(Node::id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn crossover_takes_the_union_of_innovations() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut base, mut history) = two_in_one_out();
        let left = base.connect(0, 2, 0.5, &mut history).unwrap();
        let right = base.connect(1, 2, -0.5, &mut history).unwrap();

        let mut parent1 = base.clone();
        let mut parent2 = base.clone();
        parent1.split(left, &mut history).unwrap();
        parent2.split(right, &mut history).unwrap();

        let child = parent1.crossover(&parent2, &mut rng);

        let mut expected: Vec<Innovation> = parent1
            .connections()
            .chain(parent2.connections())
            .map(Connection::innovation)
            .collect();
        expected.sort_unstable();
        expected.dedup();
        let inherited: Vec<Innovation> =
            child.connections().map(Connection::innovation).collect();
        assert_eq!(inherited, expected);
    }

    #[test]
    fn crossover_inherits_matching_connections_from_either_parent() {
        let mut rng = StdRng::seed_from_u64(42);
        let (base, mut history) = two_in_one_out();

        let mut parent1 = base.clone();
        let mut parent2 = base.clone();
        let innovation = parent1.connect(0, 2, 0.25, &mut history).unwrap();
        // Same structure under the same innovation number,
        // with a recognizably different weight.
        parent2
            .adopt_connection(parent1.connection(innovation).unwrap(), &parent1);
        parent2
            .connections
            .get_mut(&innovation)
            .unwrap()
            .set_weight(0.75);

        for _ in 0..20 {
            let child = parent1.crossover(&parent2, &mut rng);
            let weight = child.connection(innovation).unwrap().weight();
            assert!(weight == 0.25 || weight == 0.75);
        }
    }

    #[test]
    fn crossover_reuses_endpoint_nodes() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut base, mut history) = two_in_one_out();
        base.connect(0, 2, 0.5, &mut history).unwrap();
        base.connect(1, 2, -0.5, &mut history).unwrap();

        let child = base.crossover(&base.clone(), &mut rng);

        let mut ids: Vec<NodeId> = child.nodes().map(Node::id).collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
        // Output node 2 is shared by both connections.
        assert_eq!(child.find_node(2).unwrap().incoming().count(), 2);
    }

    #[test]
    fn add_bias_connects_to_an_eligible_target() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut genome, mut history) = two_in_one_out();
        let bias = genome.add_bias(&mut rng, &mut history).unwrap();

        assert_eq!(genome.biases().count(), 1);
        assert_eq!(genome.connections().count(), 1);
        let connection = genome.connections().next().unwrap();
        assert_eq!(connection.source().id(), bias);
        assert_eq!(connection.target().id(), 2);
    }

    #[test]
    fn add_bias_without_targets_is_a_noop() {
        let mut rng = StdRng::seed_from_u64(42);
        let mut history = History::new();
        let mut genome = Genome::new(2, 0, Activation::Tanh, &mut history);
        assert_eq!(genome.add_bias(&mut rng, &mut history), None);
        assert_eq!(genome.biases().count(), 0);
    }

    #[test]
    fn bias_feeds_its_constant_into_computation() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut genome, mut history) = two_in_one_out();
        genome.add_bias(&mut rng, &mut history).unwrap();

        let bias = genome.biases().next().unwrap();
        let constant = match bias.kind() {
            NodeKind::Bias { value } => value,
            kind => panic!("unexpected node kind {:?}", kind),
        };
        let weight = genome.connections().next().unwrap().weight();
        assert_eq!(
            genome.compute(&[0.0, 0.0]).unwrap(),
            vec![(constant * weight).tanh()]
        );
    }

    #[test]
    fn mutate_weight_changes_exactly_one_connection() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut genome, mut history) = two_in_one_out();
        genome.connect(0, 2, 5.0, &mut history).unwrap();
        genome.connect(1, 2, 5.0, &mut history).unwrap();

        genome.mutate_weight(&mut rng);

        let mutated: Vec<&Connection> = genome
            .connections()
            .filter(|c| c.weight() != 5.0)
            .collect();
        assert_eq!(mutated.len(), 1);
        assert!((0.0..1.0).contains(&mutated[0].weight()));
    }

    #[test]
    fn serde_round_trip_preserves_the_genome() {
        let mut rng = StdRng::seed_from_u64(42);
        let (mut genome, mut history) = two_in_one_out();
        let innovation = genome.connect(0, 2, 0.5, &mut history).unwrap();
        genome.split(innovation, &mut history).unwrap();
        genome.add_bias(&mut rng, &mut history).unwrap();

        let serialized = serde_json::to_string(&genome).unwrap();
        let deserialized: Genome = serde_json::from_str(&serialized).unwrap();
        assert_eq!(deserialized, genome);
    }
}
