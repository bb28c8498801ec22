//! A NEAT-style neuroevolution engine, loosely following the
//! NeuroEvolution of Augmenting Topologies algorithm:
//! <http://nn.cs.utexas.edu/keyword?stanley:ec02>
//!
//! Genomes double as their own phenotype: a genome is a graph of
//! typed nodes and weighted connections that can be evaluated
//! directly as a feed-forward network, mutated structurally, and
//! crossed over by innovation number. Generational reproduction is
//! provided by [`evolution::SimpleEvolver`], and custom fitness
//! functions and reproduction strategies plug in through the
//! [`evolution::Evaluator`] and [`evolution::Evolver`] traits.
//!
//! # Example usage: evolving an approximator for the mean of two inputs
//! ```
//! use neurevo::evolution::{Evaluator, Evolver, SimpleEvolver};
//! use neurevo::genomics::Genome;
//! use rand::rngs::StdRng;
//! use rand::SeedableRng;
//!
//! // Fitness: how close the single output is to the mean
//! // of the two inputs, across a few sample cases.
//! struct MeanApproximator;
//!
//! impl Evaluator for MeanApproximator {
//!     fn evaluate(&mut self, genome: &mut Genome) -> f64 {
//!         let cases = [[0.0, 0.0], [0.25, 0.75], [1.0, 0.5]];
//!         cases
//!             .iter()
//!             .map(|inputs| {
//!                 let expected = (inputs[0] + inputs[1]) / 2.0;
//!                 let output = genome.compute(inputs).unwrap()[0];
//!                 (-(expected - output).abs()).exp()
//!             })
//!             .sum()
//!     }
//! }
//!
//! fn main() {
//!     let mut evolver = SimpleEvolver::new(StdRng::seed_from_u64(42));
//!     let mut population = evolver.init_population(50, 2, 1);
//!     for generation in 0..10 {
//!         let evaluated = MeanApproximator.evaluate_all(population);
//!         println!(
//!             "generation {}: best fitness {}",
//!             generation,
//!             evaluated[0].fitness()
//!         );
//!         population = evolver.next_generation(evaluated, 50, 0.7).unwrap();
//!     }
//! }
//! ```

pub mod evolution;
pub mod genomics;

/// The id of a node within a population lineage.
pub type NodeId = u64;

/// The historical id of a connection within a population lineage.
/// Every new connection gets a fresh innovation number, and
/// crossover aligns parent genomes by it.
pub type Innovation = u64;
