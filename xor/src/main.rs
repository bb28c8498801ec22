use neurevo::evolution::{Evaluator, EvolutionLogger, Evolver, ReportingLevel, SimpleEvolver};
use neurevo::genomics::Genome;

use rand::rngs::StdRng;
use rand::SeedableRng;

const POPULATION_SIZE: usize = 100;
const HARSHNESS: f64 = 0.7;
const MIN_FITNESS: f64 = 3.6;
const MAX_GENERATIONS: usize = 5000;

/// Scores a genome by how closely its single output matches XOR
/// over all four input cases. Each case contributes `exp(-error)`,
/// so a perfect genome scores 4.0.
struct XorEvaluator;

impl Evaluator for XorEvaluator {
    fn evaluate(&mut self, genome: &mut Genome) -> f64 {
        let cases = [
            ([0.0, 0.0], 0.0),
            ([0.0, 1.0], 1.0),
            ([1.0, 0.0], 1.0),
            ([1.0, 1.0], 0.0),
        ];
        let mut fitness = 0.0;
        for (inputs, expected) in &cases {
            let output = genome.compute(inputs).expect("genome has two inputs")[0];
            fitness += (-(expected - output).abs()).exp();
        }
        // Penalize oversized solutions.
        let hidden = genome.hidden_nodes().count();
        if hidden > 3 {
            fitness *= (50 - hidden.min(50)) as f64 / 50.0;
        }
        fitness
    }
}

fn main() {
    let mut evolver = SimpleEvolver::new(StdRng::from_entropy());
    let mut logger = EvolutionLogger::new(ReportingLevel::Champion);
    let mut evaluator = XorEvaluator;
    let mut population = evolver.init_population(POPULATION_SIZE, 2, 1);

    for generation in 0..MAX_GENERATIONS {
        let evaluated = evaluator.evaluate_all(population);
        logger.log(generation, &evaluated);
        if generation % 50 == 0 {
            println!("{}", logger.last().expect("generation was just logged"));
        }
        if evaluated[0].fitness() >= MIN_FITNESS {
            println!(
                "solution found in generation {} with fitness {:.4}:\n{}",
                generation,
                evaluated[0].fitness(),
                evaluated[0].genome()
            );
            return;
        }
        population = match evolver.next_generation(evaluated, POPULATION_SIZE, HARSHNESS) {
            Ok(next) => next,
            Err(e) => {
                eprintln!("{}", e);
                return;
            }
        };
    }
    eprintln!(
        "no genome reached fitness {} within {} generations",
        MIN_FITNESS, MAX_GENERATIONS
    );
}
