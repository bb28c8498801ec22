//! Generational evolution of genome populations.
//!
//! An [`Evaluator`] scores genomes, an [`Evolver`] turns a scored
//! generation into the next one. [`SimpleEvolver`] is a ready-made
//! evolver that reproduces survivors asexually with randomized
//! structural and weight mutations.

mod errors;
mod logging;

pub use errors::EvolutionError;
pub use logging::{EvolutionLogger, Log, ReportingLevel, Stats};

use crate::genomics::{Activation, Connection, Genome, History, Node};
use crate::{Innovation, NodeId};

use rand::prelude::{Rng, SliceRandom};
use serde::{Deserialize, Serialize};

/// A genome paired with the fitness it scored.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct EvaluatedGenome {
    genome: Genome,
    fitness: f64,
}

impl EvaluatedGenome {
    /// Pairs a genome with its fitness.
    pub fn new(genome: Genome, fitness: f64) -> EvaluatedGenome {
        EvaluatedGenome { genome, fitness }
    }

    /// Returns the evaluated genome.
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Returns the fitness the genome scored.
    pub fn fitness(&self) -> f64 {
        self.fitness
    }

    /// Unwraps the genome, dropping the score.
    pub fn into_genome(self) -> Genome {
        self.genome
    }
}

/// A fitness function over genomes.
pub trait Evaluator {
    /// Scores a single genome. Higher is fitter.
    ///
    /// The genome is mutable because evaluation typically calls
    /// [`Genome::compute`], which updates the genome's caches.
    fn evaluate(&mut self, genome: &mut Genome) -> f64;

    /// Scores a whole population and returns it ordered by
    /// descending fitness, so the fittest genome comes first.
    ///
    /// # Panics
    /// Panics if any genome scores a NaN fitness.
    fn evaluate_all(&mut self, genomes: Vec<Genome>) -> Vec<EvaluatedGenome> {
        let mut evaluated: Vec<EvaluatedGenome> = genomes
            .into_iter()
            .map(|mut genome| {
                let fitness = self.evaluate(&mut genome);
                EvaluatedGenome::new(genome, fitness)
            })
            .collect();
        evaluated.sort_unstable_by(|e1, e2| {
            e2.fitness()
                .partial_cmp(&e1.fitness())
                .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
        });
        evaluated
    }
}

/// A reproduction strategy over evaluated populations.
pub trait Evolver {
    /// Creates a single genome suitable as generation zero.
    fn init_single(&mut self, num_inputs: usize, num_outputs: usize) -> Genome;

    /// Creates a generation-zero population of the given size.
    fn init_population(
        &mut self,
        size: usize,
        num_inputs: usize,
        num_outputs: usize,
    ) -> Vec<Genome> {
        (0..size)
            .map(|_| self.init_single(num_inputs, num_outputs))
            .collect()
    }

    /// Produces the next generation from an evaluated one.
    ///
    /// `harshness` is the fraction of the population to eliminate,
    /// in `[0, 1]`; the fittest genomes survive. Survivors are
    /// carried over unchanged and the population is refilled up to
    /// `target_size` by reproduction.
    ///
    /// # Errors
    /// Fails if `harshness` is outside `[0, 1]`, or if it leaves
    /// no survivor to reproduce from while `target_size > 0`.
    fn next_generation(
        &mut self,
        evaluated: Vec<EvaluatedGenome>,
        target_size: usize,
        harshness: f64,
    ) -> Result<Vec<Genome>, EvolutionError>;
}

/// The per-offspring chances of each mutation kind, each rolled
/// independently. All chances must be within `[0, 1]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MutationConfig {
    /// Chance of re-randomizing one connection weight.
    pub weight_mutation_chance: f64,
    /// Chance of attempting to add a connection between a random
    /// viable pair of nodes.
    pub connection_addition_chance: f64,
    /// Chance of splitting a random connection with a new
    /// Hidden node.
    pub node_addition_chance: f64,
    /// Chance of adding a Bias node feeding a random node.
    pub bias_addition_chance: f64,
}

impl Default for MutationConfig {
    fn default() -> MutationConfig {
        MutationConfig {
            weight_mutation_chance: 0.5,
            connection_addition_chance: 0.25,
            node_addition_chance: 0.125,
            bias_addition_chance: 0.125,
        }
    }
}

/// A speciation-free [`Evolver`]: each generation, the fittest
/// fraction of the population survives unchanged and the rest of
/// the next generation is made of mutated clones of random
/// survivors. Equally-fit genomes survive in random order.
///
/// All ids and innovation numbers are drawn from a single
/// [`History`] owned by the evolver, so any two genomes of the
/// same lineage can be compared by innovation number.
#[derive(Clone, Debug)]
pub struct SimpleEvolver<R: Rng> {
    rng: R,
    history: History,
    config: MutationConfig,
}

impl<R: Rng> SimpleEvolver<R> {
    /// Creates an evolver with the default [`MutationConfig`].
    ///
    /// # Examples
    /// ```
    /// use neurevo::evolution::{Evolver, SimpleEvolver};
    /// use rand::rngs::StdRng;
    /// use rand::SeedableRng;
    ///
    /// let mut evolver = SimpleEvolver::new(StdRng::seed_from_u64(42));
    /// let population = evolver.init_population(10, 2, 1);
    /// assert_eq!(population.len(), 10);
    /// ```
    pub fn new(rng: R) -> SimpleEvolver<R> {
        Self::with_config(rng, MutationConfig::default())
    }

    /// Creates an evolver with the given mutation chances.
    pub fn with_config(rng: R, config: MutationConfig) -> SimpleEvolver<R> {
        SimpleEvolver {
            rng,
            history: History::new(),
            config,
        }
    }

    /// Returns the evolver's id and innovation allocator.
    pub fn history(&self) -> &History {
        &self.history
    }

    /// Rolls each configured mutation independently.
    fn mutate(&mut self, genome: &mut Genome) {
        if self.rng.gen_bool(self.config.weight_mutation_chance) {
            genome.mutate_weight(&mut self.rng);
        }
        if self.rng.gen_bool(self.config.connection_addition_chance) {
            self.mutate_add_connection(genome);
        }
        if self.rng.gen_bool(self.config.node_addition_chance) {
            self.mutate_split_connection(genome);
        }
        if self.rng.gen_bool(self.config.bias_addition_chance) {
            let _ = genome.add_bias(&mut self.rng, &mut self.history);
        }
    }

    /// Tries random source/target pairs until one can be connected
    /// without closing a cycle, or the candidates run out.
    fn mutate_add_connection(&mut self, genome: &mut Genome) {
        let mut sources: Vec<NodeId> = genome
            .inputs()
            .chain(genome.hidden_nodes())
            .map(Node::id)
            .collect();
        let mut targets: Vec<NodeId> = genome
            .hidden_nodes()
            .chain(genome.outputs())
            .map(Node::id)
            .collect();
        while !sources.is_empty() && !targets.is_empty() {
            let from = sources.swap_remove(self.rng.gen_range(0..sources.len()));
            let to = targets.swap_remove(self.rng.gen_range(0..targets.len()));
            let weight = self.rng.gen();
            if let Ok(true) = genome.try_connect(from, to, weight, &mut self.history) {
                return;
            }
        }
    }

    fn mutate_split_connection(&mut self, genome: &mut Genome) {
        let innovations: Vec<Innovation> =
            genome.connections().map(Connection::innovation).collect();
        if let Some(&innovation) = innovations.choose(&mut self.rng) {
            genome
                .split(innovation, &mut self.history)
                .expect("chosen connection exists in the genome");
        }
    }
}

impl<R: Rng> Evolver for SimpleEvolver<R> {
    /// Creates a genome with every input connected to every output
    /// by a uniformly random weight in `[0, 1)`.
    fn init_single(&mut self, num_inputs: usize, num_outputs: usize) -> Genome {
        let mut genome = Genome::new(num_inputs, num_outputs, Activation::Tanh, &mut self.history);
        let inputs: Vec<NodeId> = genome.inputs().map(Node::id).collect();
        let outputs: Vec<NodeId> = genome.outputs().map(Node::id).collect();
        for from in inputs {
            for to in &outputs {
                let weight = self.rng.gen();
                genome
                    .try_connect(from, *to, weight, &mut self.history)
                    .expect("endpoint nodes were just created");
            }
        }
        genome
    }

    fn next_generation(
        &mut self,
        evaluated: Vec<EvaluatedGenome>,
        target_size: usize,
        harshness: f64,
    ) -> Result<Vec<Genome>, EvolutionError> {
        if !(0.0..=1.0).contains(&harshness) {
            return Err(EvolutionError::InvalidArgument(format!(
                "harshness {} is outside [0, 1]",
                harshness
            )));
        }
        let population_size = evaluated.len();
        let num_survivors = (population_size as f64 * (1.0 - harshness)).round() as usize;
        if num_survivors == 0 && target_size > 0 {
            return Err(EvolutionError::InvalidArgument(format!(
                "harshness {} eliminates the entire population of {}",
                harshness, population_size
            )));
        }
        let mut next: Vec<Genome> = scramble_sort(evaluated, &mut self.rng)
            .into_iter()
            .take(num_survivors)
            .map(EvaluatedGenome::into_genome)
            .collect();
        while next.len() < target_size {
            let index = self.rng.gen_range(0..num_survivors);
            let mut offspring = next[index].duplicate();
            self.mutate(&mut offspring);
            next.push(offspring);
        }
        Ok(next)
    }
}

/// Sorts by descending fitness, shuffling each run of equal
/// fitnesses so that ties are broken randomly.
///
/// # Panics
/// Panics if any genome scores a NaN fitness.
fn scramble_sort(
    mut evaluated: Vec<EvaluatedGenome>,
    rng: &mut impl Rng,
) -> Vec<EvaluatedGenome> {
    evaluated.sort_unstable_by(|e1, e2| {
        e2.fitness()
            .partial_cmp(&e1.fitness())
            .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
    });
    let mut start = 0;
    while start < evaluated.len() {
        let mut end = start + 1;
        while end < evaluated.len() && evaluated[end].fitness() == evaluated[start].fitness() {
            end += 1;
        }
        evaluated[start..end].shuffle(rng);
        start = end;
    }
    evaluated
}

#[cfg(test)]
mod tests {
    use super::*;

    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn evolver() -> SimpleEvolver<StdRng> {
        SimpleEvolver::new(StdRng::seed_from_u64(42))
    }

    /// Scores a genome by its input node count.
    struct InputCounter;

    impl Evaluator for InputCounter {
        fn evaluate(&mut self, genome: &mut Genome) -> f64 {
            genome.inputs().count() as f64
        }
    }

    #[test]
    fn init_single_fully_connects_inputs_to_outputs() {
        let mut evolver = evolver();
        let genome = evolver.init_single(3, 2);
        assert_eq!(genome.inputs().count(), 3);
        assert_eq!(genome.outputs().count(), 2);
        assert_eq!(genome.connections().count(), 6);
        assert!(genome
            .connections()
            .all(|c| (0.0..1.0).contains(&c.weight())));
    }

    #[test]
    fn init_population_draws_ids_from_one_lineage() {
        let mut evolver = evolver();
        let population = evolver.init_population(5, 2, 1);
        assert_eq!(population.len(), 5);

        let mut ids: Vec<NodeId> = population
            .iter()
            .flat_map(|g| g.nodes().map(Node::id))
            .collect();
        let total = ids.len();
        ids.sort_unstable();
        ids.dedup();
        assert_eq!(ids.len(), total);
    }

    #[test]
    fn evaluate_all_sorts_by_descending_fitness() {
        let mut evolver = evolver();
        let genomes = vec![
            evolver.init_single(2, 1),
            evolver.init_single(4, 1),
            evolver.init_single(1, 1),
            evolver.init_single(3, 1),
        ];
        let evaluated = InputCounter.evaluate_all(genomes);
        let fitnesses: Vec<f64> = evaluated.iter().map(EvaluatedGenome::fitness).collect();
        assert_eq!(fitnesses, vec![4.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn scramble_sort_orders_fitness_buckets() {
        let mut evolver = evolver();
        let evaluated: Vec<EvaluatedGenome> = [1.0, 3.0, 3.0, 2.0]
            .iter()
            .map(|&fitness| EvaluatedGenome::new(evolver.init_single(1, 1), fitness))
            .collect();
        let ranked = scramble_sort(evaluated, &mut StdRng::seed_from_u64(42));
        let fitnesses: Vec<f64> = ranked.iter().map(EvaluatedGenome::fitness).collect();
        assert_eq!(fitnesses, vec![3.0, 3.0, 2.0, 1.0]);
    }

    #[test]
    fn next_generation_keeps_the_fittest_and_refills() {
        let mut evolver = evolver();
        // Input counts distinguish the genomes; mutations never
        // change them.
        let evaluated: Vec<EvaluatedGenome> = (0..10)
            .map(|i| {
                let genome = evolver.init_single(i + 1, 1);
                EvaluatedGenome::new(genome, i as f64)
            })
            .collect();

        let next = evolver.next_generation(evaluated, 10, 0.7).unwrap();

        assert_eq!(next.len(), 10);
        let input_counts: Vec<usize> = next.iter().map(|g| g.inputs().count()).collect();
        // round(10 * 0.3) = 3 survivors: the genomes with 8, 9
        // and 10 inputs. Offspring are clones of those.
        for count in &input_counts {
            assert!((8..=10).contains(count));
        }
        for expected in 8..=10 {
            assert!(input_counts.contains(&expected));
        }
    }

    #[test]
    fn next_generation_rejects_out_of_range_harshness() {
        let mut evolver = evolver();
        for harshness in [-0.1, 1.5, f64::NAN] {
            let evaluated = vec![EvaluatedGenome::new(evolver.init_single(1, 1), 0.0)];
            assert!(matches!(
                evolver.next_generation(evaluated, 1, harshness),
                Err(EvolutionError::InvalidArgument(_))
            ));
        }
    }

    #[test]
    fn next_generation_rejects_total_elimination() {
        let mut evolver = evolver();
        let evaluated: Vec<EvaluatedGenome> = (0..3)
            .map(|i| EvaluatedGenome::new(evolver.init_single(1, 1), i as f64))
            .collect();
        assert!(matches!(
            evolver.next_generation(evaluated, 3, 1.0),
            Err(EvolutionError::InvalidArgument(_))
        ));
    }

    #[test]
    fn next_generation_allows_total_elimination_of_unwanted_population() {
        let mut evolver = evolver();
        let evaluated: Vec<EvaluatedGenome> = (0..3)
            .map(|i| EvaluatedGenome::new(evolver.init_single(1, 1), i as f64))
            .collect();
        assert_eq!(evolver.next_generation(evaluated, 0, 1.0), Ok(vec![]));
    }

    #[test]
    fn next_generation_returns_all_survivors_when_target_is_smaller() {
        let mut evolver = evolver();
        let evaluated: Vec<EvaluatedGenome> = (0..10)
            .map(|i| EvaluatedGenome::new(evolver.init_single(1, 1), i as f64))
            .collect();
        let next = evolver.next_generation(evaluated, 0, 0.0).unwrap();
        assert_eq!(next.len(), 10);
    }

    #[test]
    fn offspring_carry_the_configured_mutations() {
        let always = MutationConfig {
            weight_mutation_chance: 1.0,
            connection_addition_chance: 1.0,
            node_addition_chance: 1.0,
            bias_addition_chance: 1.0,
        };
        let mut evolver = SimpleEvolver::with_config(StdRng::seed_from_u64(42), always);
        let evaluated: Vec<EvaluatedGenome> = (0..10)
            .map(|i| EvaluatedGenome::new(evolver.init_single(2, 1), i as f64))
            .collect();

        let next = evolver.next_generation(evaluated, 10, 0.7).unwrap();

        // Survivors come first and are untouched; every offspring
        // was split and given a bias.
        for genome in &next[..3] {
            assert_eq!(genome.hidden_nodes().count(), 0);
            assert_eq!(genome.biases().count(), 0);
        }
        for genome in &next[3..] {
            assert!(genome.hidden_nodes().count() >= 1);
            assert!(genome.biases().count() >= 1);
        }
    }
}
