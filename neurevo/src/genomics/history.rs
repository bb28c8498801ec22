use crate::{Innovation, NodeId};

use serde::{Deserialize, Serialize};

/// A `History` is the allocator of node ids and connection
/// innovation numbers for a population lineage.
///
/// All genomes that may ever be crossed over must draw their
/// ids and innovation numbers from the same `History`, since
/// crossover aligns connections by innovation number. Each
/// counter is monotonically increasing and never reuses a
/// value.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct History {
    next_node_id: NodeId,
    next_innovation: Innovation,
}

impl History {
    /// Creates a new `History` with both counters at zero.
    ///
    /// # Examples
    /// ```
    /// use neurevo::genomics::History;
    ///
    /// let mut history = History::new();
    /// assert_eq!(history.next_node_id(), 0);
    /// assert_eq!(history.next_node_id(), 1);
    /// ```
    pub fn new() -> History {
        History::default()
    }

    /// Allocates a fresh node id.
    pub fn next_node_id(&mut self) -> NodeId {
        let id = self.next_node_id;
        self.next_node_id += 1;
        id
    }

    /// Allocates a fresh connection innovation number.
    pub fn next_innovation(&mut self) -> Innovation {
        let innovation = self.next_innovation;
        self.next_innovation += 1;
        innovation
    }

    /// Returns an independent copy of the allocator's current
    /// state. Useful for checkpointing an experiment alongside
    /// its genomes.
    pub fn fork(&self) -> History {
        self.clone()
    }
}
