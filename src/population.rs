//! The whole of an evolutionary run: every specie and its organisms, the shared innovation
//! counter, and the generational loop that drives them.

use crate::{
    config::Config,
    error::{NeatError, Result},
    genome::InnoGen,
    organism::Organism,
    random::{default_rng, WyRng},
    scenario::{Scenario, Stats},
    seed::Seed,
    specie::{speciate, Specie, SpecieId},
};
use core::ops::ControlFlow;
use log::{debug, info, warn};

#[derive(Debug, Clone)]
pub struct Population {
    config: Config,
    species: Vec<Specie>,
    generation: usize,
    innogen: InnoGen,
    compatibility_threshold: f64,
    next_specie: usize,
    rng: WyRng,
}

impl Population {
    /// Found a population from copies of `seed`, each with its weights perturbed
    pub fn from_seed(config: Config, seed: &Seed) -> Result<Self> {
        Self::from_seed_with_rng(config, seed, default_rng())
    }

    /// [Population::from_seed] with a given rng, so that runs may be reproduced
    pub fn from_seed_with_rng(config: Config, seed: &Seed, rng: WyRng) -> Result<Self> {
        config.validate()?;
        let mut innogen = InnoGen::default();
        let genome = seed.genome(&mut innogen)?;

        let mut population = Self {
            compatibility_threshold: config.compatibility_threshold,
            species: Vec::new(),
            generation: 1,
            innogen,
            next_specie: 0,
            rng,
            config,
        };

        for _ in 0..population.config.population_size {
            let mut organism = Organism::new(genome.clone(), population.generation);
            organism.genome_mut().perturb_weights(
                population.config.mutation_power,
                population.config.genome_weight_perturbated,
                &mut population.rng,
            );
            population.speciate(organism);
        }

        for specie in population.species.iter_mut() {
            specie.promote();
        }

        Ok(population)
    }

    /// Place an organism among the next generation of a compatible specie
    pub fn speciate(&mut self, organism: Organism) -> SpecieId {
        speciate(
            organism,
            &mut self.species,
            self.compatibility_threshold,
            &self.config,
            &mut self.next_specie,
        )
    }

    #[inline]
    pub fn config(&self) -> &Config {
        &self.config
    }

    #[inline]
    pub fn generation(&self) -> usize {
        self.generation
    }

    pub fn species(&self) -> &[Specie] {
        &self.species
    }

    pub fn innogen(&self) -> &InnoGen {
        &self.innogen
    }

    /// The threshold in use, after any adjustment
    pub fn compatibility_threshold(&self) -> f64 {
        self.compatibility_threshold
    }

    /// Every organism of the current generation, specie by specie
    pub fn organisms(&self) -> impl Iterator<Item = &Organism> {
        self.species.iter().flat_map(|s| s.organisms.iter())
    }

    pub fn len(&self) -> usize {
        self.species.iter().map(|s| s.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.species.iter().all(|s| s.is_empty())
    }

    /// The organism with the best fitness before sharing
    pub fn super_champ(&self) -> Option<&Organism> {
        self.organisms().reduce(|champ, o| {
            if o.original_fitness > champ.original_fitness {
                o
            } else {
                champ
            }
        })
    }

    /// The organism with the best raw fitness of the latest evaluation
    pub fn fittest(&self) -> Option<&Organism> {
        self.organisms()
            .reduce(|best, o| if o.fitness > best.fitness { o } else { best })
    }

    fn stats(&self) -> Stats {
        Stats {
            generation: self.generation,
            species: self.species.len(),
            organisms: self.len(),
            best_fitness: self.fittest().map_or(f64::NAN, |o| o.fitness),
            compatibility_threshold: self.compatibility_threshold,
        }
    }

    /// Nudge the compatibility threshold towards producing the target number of species
    fn adjust_compatibility_threshold(&mut self) {
        let target = self.config.compatibility_modifier_target;
        if !self.config.adjust_compatibility_threshold || self.species.len() == target {
            return;
        }

        let modifier = self.config.compatibility_modifier;
        if self.species.len() > target {
            self.compatibility_threshold += modifier;
        } else {
            self.compatibility_threshold -= modifier;
        }
        self.compatibility_threshold = self.compatibility_threshold.max(modifier);
    }

    /// Turn over one generation. Fitness is shared within each specie and the least fit are
    /// culled, then every specie breeds its share of the population, fittest specie first. The
    /// offspring are speciated as they come, and replace the old generation entirely.
    pub fn epoch(&mut self) -> Result<()> {
        self.generation += 1;
        self.adjust_compatibility_threshold();

        let mut overall = 0.;
        for specie in self.species.iter_mut() {
            specie.adjust_fitness(&self.config, &mut self.rng);
            overall += specie.average_fitness;
        }

        for specie in self.species.iter_mut() {
            specie.organisms.retain(|o| !o.kill);
        }

        // offspring are shared evenly when fitness gives no proportion to share by
        let proportional = overall > 0. && overall.is_finite();
        let mut ranked = (0..self.species.len()).collect::<Vec<_>>();
        ranked.sort_by(|l, r| {
            self.species[*r]
                .max_fitness
                .total_cmp(&self.species[*l].max_fitness)
        });

        let size = self.config.population_size;
        let count = self.species.len().max(1);
        for (rank, i) in ranked.iter().enumerate() {
            let specie = &mut self.species[*i];
            for organism in specie.organisms.iter_mut() {
                organism.expected_offspring = if proportional {
                    (organism.original_fitness.max(0.) / overall).round() as usize
                } else {
                    0
                };
            }
            specie.expected_offspring = if proportional {
                (specie.average_fitness / overall * size as f64).round() as usize
            } else {
                size / count + usize::from(rank < size % count)
            };
        }

        debug!(
            "generation {}: {} species, {} organisms, threshold {:.3}, overall average {:.4}",
            self.generation,
            self.species.len(),
            self.len(),
            self.compatibility_threshold,
            overall
        );

        // the super champ only breeds by cloning while it leads its own specie
        let mut super_champ = None;
        let mut best = f64::NEG_INFINITY;
        for specie in self.species.iter() {
            for (i, organism) in specie.organisms.iter().enumerate() {
                if organism.original_fitness > best {
                    best = organism.original_fitness;
                    super_champ = (i == 0).then_some((specie.id, organism.expected_offspring));
                }
            }
        }
        let (champ_specie, mut champ_clones) = super_champ.unzip();

        let babies = {
            let ranked = ranked
                .iter()
                .map(|i| &self.species[*i])
                .collect::<Vec<_>>();
            let mut babies = Vec::with_capacity(size);
            for specie in ranked.iter() {
                let clones = champ_clones
                    .as_mut()
                    .filter(|_| champ_specie == Some(specie.id));
                babies.extend(specie.reproduce(
                    &self.config,
                    self.generation,
                    clones,
                    &ranked,
                    &mut self.innogen,
                    &mut self.rng,
                ));
            }
            babies
        };

        for baby in babies {
            self.speciate(baby);
        }

        for specie in self.species.iter_mut() {
            specie.promote();
        }
        self.species.retain(|s| !s.is_empty());
        for specie in self.species.iter_mut() {
            specie.age += 1;
        }

        if self.species.is_empty() {
            warn!("population went extinct in generation {}", self.generation);
            return Err(NeatError::Extinct {
                generation: self.generation,
            });
        }

        Ok(())
    }

    /// Evaluate every organism in turn, stopping at the first to reach the fitness threshold
    fn evaluate(&mut self, scenario: &mut impl Scenario) -> Option<Organism> {
        let mode = self.config.mode;
        for s in 0..self.species.len() {
            for o in 0..self.species[s].organisms.len() {
                let mut network = self.species[s].organisms[o].take_network(mode);
                network.flush();
                let fitness = scenario.eval(&mut network, &self.species[s].organisms[o], self);

                let organism = &mut self.species[s].organisms[o];
                organism.fitness = fitness;
                organism.restore_network(network);
                if fitness >= self.config.fitness_threshold {
                    return Some(organism.clone());
                }
            }
        }

        None
    }

    /// Evaluate and evolve until some organism reaches the fitness threshold, for at most
    /// `max_generations` generations
    pub fn run(&mut self, scenario: &mut impl Scenario, max_generations: usize) -> Result<Organism> {
        self.run_with(scenario, max_generations, |_| ControlFlow::Continue(()))
    }

    /// [Population::run], calling `hook` after each generation is evaluated. Breaking from the
    /// hook cancels the run before the next epoch.
    pub fn run_with<H>(
        &mut self,
        scenario: &mut impl Scenario,
        max_generations: usize,
        mut hook: H,
    ) -> Result<Organism>
    where
        H: FnMut(&Stats) -> ControlFlow<()>,
    {
        for _ in 0..max_generations {
            if let Some(winner) = self.evaluate(scenario) {
                info!(
                    "fitness {:.4} reached in generation {} by {} nodes and {} connections",
                    winner.fitness,
                    self.generation,
                    winner.genome().nodes().count(),
                    winner.genome().len()
                );
                return Ok(winner);
            }

            if hook(&self.stats()).is_break() {
                return Err(NeatError::Cancelled {
                    generation: self.generation,
                });
            }

            self.epoch()?;
        }

        warn!(
            "no organism reached fitness {} within {max_generations} generations",
            self.config.fitness_threshold
        );
        Err(NeatError::SearchExhausted {
            generations: max_generations,
        })
    }
}
