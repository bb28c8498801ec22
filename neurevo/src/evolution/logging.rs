use super::EvaluatedGenome;
use crate::genomics::Genome;

use std::fmt;

/// Defines different possible reporting levels for logging.
#[derive(Clone, Copy, Debug)]
pub enum ReportingLevel {
    /// Clones the generation's fittest genome into each log entry.
    Champion,
    /// Clones no genomes.
    NoGenomes,
}

/// A snapshot of an evaluated generation.
#[derive(Clone, Debug)]
pub struct Log {
    pub generation: usize,
    pub population_size: usize,
    pub fitness: Stats,
    pub hidden_node_counts: Stats,
    pub champion: Option<Genome>,
}

impl fmt::Display for Log {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "Log {{\n\
            \tgeneration: {:?}\n\
            \tpopulation_size: {:?}\n\
            \tfitness: {:?}\n\
            \thidden_node_counts: {:?}\n\
            }}",
            &self.generation, &self.population_size, &self.fitness, &self.hidden_node_counts,
        )
    }
}

/// A struct for reporting basic statistical data.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct Stats {
    pub maximum: f64,
    pub minimum: f64,
    pub mean: f64,
    pub median: f64,
}

impl Stats {
    /// Returns statistics about numbers in a sequence.
    /// All fields are zero for an empty sequence.
    ///
    /// # Examples
    /// ```
    /// use neurevo::evolution::Stats;
    ///
    /// let stats = Stats::from([-2.0, -1.0, 0.5, 1.0, 1.5].iter().copied());
    /// assert_eq!(stats.maximum, 1.5);
    /// assert_eq!(stats.minimum, -2.0);
    /// assert_eq!(stats.mean, 0.0);
    /// assert_eq!(stats.median, 0.5);
    /// ```
    pub fn from(data: impl Iterator<Item = f64>) -> Stats {
        let mut data: Vec<f64> = data.collect();
        if data.is_empty() {
            return Stats::default();
        }
        data.sort_unstable_by(|a, b| {
            a.partial_cmp(b)
                .unwrap_or_else(|| panic!("invalid statistics data detected (NaN)"))
        });
        let mid = data.len() / 2;
        let median = if data.len() % 2 == 0 {
            (data[mid - 1] + data[mid]) / 2.0
        } else {
            data[mid]
        };
        Stats {
            maximum: data[data.len() - 1],
            minimum: data[0],
            mean: data.iter().sum::<f64>() / data.len() as f64,
            median,
        }
    }
}

/// A log of the evolution of a population over time.
#[derive(Clone, Debug, Default)]
pub struct EvolutionLogger {
    reporting_level: ReportingLevel,
    logs: Vec<Log>,
}

impl Default for ReportingLevel {
    fn default() -> ReportingLevel {
        ReportingLevel::NoGenomes
    }
}

impl EvolutionLogger {
    /// Returns a logger with the appropiate reporting level.
    pub fn new(reporting_level: ReportingLevel) -> EvolutionLogger {
        EvolutionLogger {
            reporting_level,
            logs: vec![],
        }
    }

    /// Store a snapshot of an evaluated generation.
    pub fn log(&mut self, generation: usize, evaluated: &[EvaluatedGenome]) {
        self.logs.push(Log {
            generation,
            population_size: evaluated.len(),
            fitness: Stats::from(evaluated.iter().map(EvaluatedGenome::fitness)),
            hidden_node_counts: Stats::from(
                evaluated
                    .iter()
                    .map(|e| e.genome().hidden_nodes().count() as f64),
            ),
            champion: match self.reporting_level {
                ReportingLevel::Champion => evaluated
                    .iter()
                    .max_by(|e1, e2| {
                        e1.fitness()
                            .partial_cmp(&e2.fitness())
                            .unwrap_or_else(|| panic!("invalid genome fitnesses detected (NaN)"))
                    })
                    .map(|e| e.genome().clone()),
                ReportingLevel::NoGenomes => None,
            },
        })
    }

    /// Iterate over all logged snapshots.
    pub fn iter(&self) -> impl Iterator<Item = &Log> {
        self.logs.iter()
    }

    /// The most recent snapshot, if any.
    pub fn last(&self) -> Option<&Log> {
        self.logs.last()
    }
}
