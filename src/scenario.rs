use crate::{network::Network, organism::Organism, population::Population};

/// A fitness function. Evaluation is handed the organism's compiled network, fresh from a flush,
/// along with the organism itself and the population it lives in.
pub trait Scenario {
    fn eval(&mut self, network: &mut Network, organism: &Organism, population: &Population) -> f64;
}

impl<F> Scenario for F
where
    F: FnMut(&mut Network, &Organism, &Population) -> f64,
{
    fn eval(&mut self, network: &mut Network, organism: &Organism, population: &Population) -> f64 {
        self(network, organism, population)
    }
}

/// A snapshot of a fully evaluated generation, handed to the hook of
/// [Population::run_with](crate::Population::run_with)
#[derive(Debug, Clone, PartialEq)]
pub struct Stats {
    pub generation: usize,
    pub species: usize,
    pub organisms: usize,
    /// Highest raw fitness of the generation
    pub best_fitness: f64,
    pub compatibility_threshold: f64,
}

impl Stats {
    pub fn any_fitter_than(&self, target: f64) -> bool {
        self.best_fitness > target
    }
}
