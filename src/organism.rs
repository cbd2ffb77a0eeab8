use crate::{
    config::Config,
    crossover::crossover,
    genome::{Genome, InnoGen},
    network::{Mode, Network},
    random::Happens,
    specie::SpecieId,
};
use core::cmp::Ordering;
use rand::RngCore;

/// A genome under selection, along with its fitness bookkeeping and its compiled phenotype
#[derive(Debug)]
pub struct Organism {
    genome: Genome,
    /// Raw fitness as last evaluated, later shared within its specie
    pub fitness: f64,
    /// Fitness before it was shared
    pub original_fitness: f64,
    pub species: Option<SpecieId>,
    /// Marked for removal at the end of an epoch
    pub kill: bool,
    pub generation: usize,
    pub expected_offspring: usize,
    network: Option<Network>,
}

impl Clone for Organism {
    /// Clones never share a phenotype, it is rebuilt when next needed
    fn clone(&self) -> Self {
        Self {
            genome: self.genome.clone(),
            fitness: self.fitness,
            original_fitness: self.original_fitness,
            species: self.species,
            kill: self.kill,
            generation: self.generation,
            expected_offspring: self.expected_offspring,
            network: None,
        }
    }
}

impl Organism {
    pub fn new(genome: Genome, generation: usize) -> Self {
        Self {
            genome,
            fitness: 0.,
            original_fitness: 0.,
            species: None,
            kill: false,
            generation,
            expected_offspring: 0,
            network: None,
        }
    }

    #[inline]
    pub fn genome(&self) -> &Genome {
        &self.genome
    }

    /// Mutable access to the genome drops the compiled network
    pub fn genome_mut(&mut self) -> &mut Genome {
        self.network = None;
        &mut self.genome
    }

    /// A fresh organism of `generation` with a deep copy of this genome. Only the original fitness
    /// carries over.
    pub fn copy(&self, generation: usize) -> Self {
        Self {
            original_fitness: self.original_fitness,
            ..Self::new(self.genome.clone(), generation)
        }
    }

    /// The compiled network, built on first use or when `mode` changed since it was built
    pub fn network(&mut self, mode: Mode) -> &mut Network {
        if self.network.as_ref().is_some_and(|n| n.mode() != mode) {
            self.network = None;
        }
        self.network
            .get_or_insert_with(|| Network::new(&self.genome, mode))
    }

    /// Move the compiled network out, building it if needed. Hand it back with
    /// [Organism::restore_network] to keep it cached.
    pub fn take_network(&mut self, mode: Mode) -> Network {
        match self.network.take() {
            Some(network) if network.mode() == mode => network,
            _ => Network::new(&self.genome, mode),
        }
    }

    pub fn restore_network(&mut self, network: Network) {
        self.network = Some(network);
    }

    #[inline]
    pub fn has_network(&self) -> bool {
        self.network.is_some()
    }

    /// One round of mutation. A new node is rolled first, then a new connection. Only when
    /// neither happens are weights perturbed and connections toggled or re-enabled, each on their
    /// own roll.
    pub fn mutate(&mut self, config: &Config, innogen: &mut InnoGen, rng: &mut impl RngCore) {
        let genome = self.genome_mut();
        if rng.happens(config.mutate_add_node_probability) {
            genome.mutate_add_node(innogen, rng);
        } else if rng.happens(config.mutate_add_connection_probability) {
            genome.mutate_add_connection(config, innogen, rng);
        } else {
            if rng.happens(config.mutate_connection_weights_probability) {
                genome.perturb_weights(
                    config.mutation_power,
                    config.genome_weight_perturbated,
                    rng,
                );
            }
            if rng.happens(config.mutate_toggle_enable_probability) {
                genome.mutate_toggle_enable(1, rng);
            }
            if rng.happens(config.re_enable_gene_probability) {
                genome.re_enable_first_disabled();
            }
        }
    }

    /// Recombine with `other`, the fitter of the two passing on its sensors and outputs
    pub fn crossover(
        &self,
        other: &Self,
        config: &Config,
        generation: usize,
        rng: &mut impl RngCore,
    ) -> Self {
        let fit = self
            .fitness
            .partial_cmp(&other.fitness)
            .unwrap_or(Ordering::Equal);
        Self::new(
            crossover(
                &self.genome,
                &other.genome,
                fit,
                config.feed_forward_only,
                rng,
            ),
            generation,
        )
    }
}
