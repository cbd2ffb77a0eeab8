//! Species cluster organisms by compatibility distance. Each specie shares fitness among its
//! members, and breeds its share of the next generation.

use crate::{
    config::Config,
    crossover::compatibility,
    genome::{Genome, InnoGen},
    organism::Organism,
    random::{ranked_index, Happens},
};
use log::trace;
use rand::{Rng, RngCore};
use serde::{Deserialize, Serialize};

/// Attempts at finding a foreign specie to mate with before settling for a home champion
const INTERSPECIES_TRIES: usize = 5;
/// Floor of shared fitness, so that every organism has some weight in offspring math
const MIN_FITNESS: f64 = 0.0001;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SpecieId(pub usize);

/// A collection of organisms closely related to the same specimen
#[derive(Debug, Clone)]
pub struct Specie {
    pub id: SpecieId,
    /// The current generation, fittest first once fitness has been adjusted
    pub organisms: Vec<Organism>,
    /// Members of the next generation, placed here while the current one is still breeding
    pub offspring: Vec<Organism>,
    specimen: Genome,
    pub age: usize,
    pub age_of_last_improvement: usize,
    pub max_fitness: f64,
    /// Mean raw fitness, each member floored at a small positive minimum
    pub average_fitness: f64,
    pub expected_offspring: usize,
    /// Whether the specie has stagnated past its dropoff age
    pub extinct: bool,
}

impl Specie {
    pub fn new(id: SpecieId, specimen: Genome) -> Self {
        Self {
            id,
            organisms: Vec::new(),
            offspring: Vec::new(),
            specimen,
            age: 0,
            age_of_last_improvement: 0,
            max_fitness: 0.,
            average_fitness: 0.,
            expected_offspring: 0,
            extinct: false,
        }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.organisms.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.organisms.is_empty()
    }

    /// Whether either generation has any members
    #[inline]
    pub fn is_occupied(&self) -> bool {
        !(self.organisms.is_empty() && self.offspring.is_empty())
    }

    /// The genome new organisms are compared against
    pub fn specimen(&self) -> &Genome {
        &self.specimen
    }

    /// Fittest member, as of the last fitness adjustment
    pub fn champion(&self) -> Option<&Organism> {
        self.organisms.first()
    }

    /// Place an organism among the next generation
    pub fn add(&mut self, mut organism: Organism) {
        organism.species = Some(self.id);
        self.offspring.push(organism);
    }

    /// Replace the current generation with the next one
    pub fn promote(&mut self) {
        self.organisms = core::mem::take(&mut self.offspring);
    }

    /// Share fitness among the specie's members, penalizing stagnation and boosting youth. Members
    /// end up sorted by shared fitness, and those under the survival threshold are marked to be
    /// killed.
    pub fn adjust_fitness(&mut self, config: &Config, rng: &mut impl RngCore) {
        if self.organisms.is_empty() {
            return;
        }

        self.extinct =
            (self.age + 1).saturating_sub(self.age_of_last_improvement) > config.dropoff_age;

        let len = self.organisms.len() as f64;
        let mut total = 0.;
        for organism in self.organisms.iter_mut() {
            organism.original_fitness = organism.fitness;
            if self.extinct {
                organism.fitness *= config.stagnation_penalty;
            }
            if self.age <= config.young_age {
                organism.fitness *= config.age_significance;
            }
            organism.fitness = organism.fitness.max(MIN_FITNESS) / len;
            total += organism.original_fitness.max(MIN_FITNESS);
        }

        self.organisms.sort_by(|l, r| r.fitness.total_cmp(&l.fitness));
        self.specimen = self.organisms[rng.random_range(0..self.organisms.len())]
            .genome()
            .clone();
        self.average_fitness = total / len;

        let top = self.organisms[0].original_fitness;
        if top > self.max_fitness {
            self.max_fitness = top;
            self.age_of_last_improvement = self.age;
        }

        let survivors = (len * config.survival_threshold + 1.).floor() as usize;
        for organism in self.organisms.iter_mut().skip(survivors) {
            organism.kill = true;
        }
    }

    /// A champion of some other specie, drawn with a bias towards the front of `ranked`. Falls
    /// back to this specie's own champion.
    fn foreign_champion<'a>(
        &'a self,
        ranked: &[&'a Specie],
        rng: &mut impl RngCore,
    ) -> Option<&'a Organism> {
        if !ranked.is_empty() {
            for _ in 0..INTERSPECIES_TRIES {
                let specie = ranked[ranked_index(ranked.len(), rng)];
                if specie.id != self.id {
                    if let Some(champion) = specie.champion() {
                        return Some(champion);
                    }
                }
            }
        }

        self.champion()
    }

    /// Breed `expected_offspring` children from the surviving members.
    ///
    /// While `super_champ` holds remaining clones, the champion is cloned, with the last clone
    /// mutated. A specie expecting more than 5 children keeps one unmutated copy of its champion.
    /// Every other child is either a mutated copy of a random member, or a crossover of two
    /// members that is mutated unless its parents were identical. The second parent is on
    /// occasion a champion of another specie in `ranked`.
    pub fn reproduce(
        &self,
        config: &Config,
        generation: usize,
        mut super_champ: Option<&mut usize>,
        ranked: &[&Specie],
        innogen: &mut InnoGen,
        rng: &mut impl RngCore,
    ) -> Vec<Organism> {
        let Some(champ) = self.champion() else {
            return Vec::new();
        };

        let mut babies = Vec::with_capacity(self.expected_offspring);
        let mut champ_added = false;
        for _ in 0..self.expected_offspring {
            let baby = if let Some(remaining) = super_champ.as_deref_mut().filter(|r| **r > 0) {
                let mut baby = champ.copy(generation);
                if *remaining == 1 {
                    baby.mutate(config, innogen, rng);
                }
                *remaining -= 1;
                baby
            } else if !champ_added && self.expected_offspring > 5 {
                champ_added = true;
                champ.copy(generation)
            } else if rng.happens(config.mutate_only_probability) {
                let mom = &self.organisms[rng.random_range(0..self.organisms.len())];
                let mut baby = mom.copy(generation);
                baby.mutate(config, innogen, rng);
                baby
            } else {
                let mom = &self.organisms[rng.random_range(0..self.organisms.len())];
                let dad = if rng.happens(config.interspecies_mate_rate) {
                    self.foreign_champion(ranked, rng).unwrap_or(champ)
                } else {
                    &self.organisms[rng.random_range(0..self.organisms.len())]
                };

                let mut baby = dad.crossover(mom, config, generation, rng);
                if rng.happens(config.mutate_only_probability)
                    || compatibility(mom.genome(), dad.genome(), config) == 0.
                {
                    baby.mutate(config, innogen, rng);
                }
                baby
            };

            babies.push(baby);
        }

        babies
    }
}

/// Place an organism in the first occupied specie whose specimen is within `threshold`, or
/// found a new specie with it
pub fn speciate(
    organism: Organism,
    species: &mut Vec<Specie>,
    threshold: f64,
    config: &Config,
    next_id: &mut usize,
) -> SpecieId {
    match species.iter().position(|s| {
        s.is_occupied() && compatibility(organism.genome(), s.specimen(), config) < threshold
    }) {
        Some(i) => {
            species[i].add(organism);
            species[i].id
        }
        None => {
            let id = SpecieId(*next_id);
            *next_id += 1;
            trace!("new specie {}", id.0);

            let mut specie = Specie::new(id, organism.genome().clone());
            specie.add(organism);
            species.push(specie);
            id
        }
    }
}
