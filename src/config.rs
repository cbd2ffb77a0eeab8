//! Run configuration. Every knob of the evolutionary loop lives here, and a partial JSON document
//! may be loaded on top of the defaults.

use crate::{
    error::{NeatError, Result},
    network::Mode,
};
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct Config {
    /// Generations without improvement before a specie is penalized
    pub dropoff_age: usize,
    /// Weight of excess genes in compatibility distance
    pub excess_coefficient: f64,
    /// Weight of disjoint genes in compatibility distance
    pub disjoint_coefficient: f64,
    /// Weight of the mean matching-gene weight difference in compatibility distance
    pub weight_difference_coefficient: f64,
    /// Distance under which a genome joins a specie
    pub compatibility_threshold: f64,
    /// Step applied to the threshold each epoch when adjusting
    pub compatibility_modifier: f64,
    /// Number of species the adjusted threshold steers towards
    pub compatibility_modifier_target: usize,
    pub adjust_compatibility_threshold: bool,
    /// Bound of the uniform distribution weights are drawn / perturbed from
    pub mutation_power: f64,
    pub re_enable_gene_probability: f64,
    pub mutate_connection_weights_probability: f64,
    /// Chance that a weight is perturbed rather than replaced
    pub genome_weight_perturbated: f64,
    /// Fitness multiplier for young species
    pub age_significance: f64,
    /// Fraction of every specie allowed to reproduce
    pub survival_threshold: f64,
    pub population_size: usize,
    /// Chance of asexual reproduction
    pub mutate_only_probability: f64,
    pub mutate_add_node_probability: f64,
    pub mutate_add_connection_probability: f64,
    pub mutate_toggle_enable_probability: f64,
    /// Chance that a mate is drawn from another specie
    pub interspecies_mate_rate: f64,
    /// Fitness at which a run is considered solved
    pub fitness_threshold: f64,
    /// Attempts to find an open pair of nodes in a connection mutation
    pub add_connection_tries: usize,
    pub feed_forward_only: bool,
    /// Genomes smaller than this are not size normalized in compatibility distance
    pub normalize_threshold: usize,
    /// Whether output nodes may source new connections. Only honoured in recurrent runs, and
    /// an output never connects into another output.
    pub output_sources: bool,
    /// Species at or under this age receive the age_significance boost
    pub young_age: usize,
    /// Fitness multiplier for species past their dropoff age
    pub stagnation_penalty: f64,
    /// How phenotypes are activated
    pub mode: Mode,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            dropoff_age: 15,
            excess_coefficient: 1.0,
            disjoint_coefficient: 1.0,
            weight_difference_coefficient: 1.0,
            compatibility_threshold: 3.0,
            compatibility_modifier: 0.3,
            compatibility_modifier_target: 10,
            adjust_compatibility_threshold: false,
            mutation_power: 2.5,
            re_enable_gene_probability: 0.05,
            mutate_connection_weights_probability: 0.9,
            genome_weight_perturbated: 0.9,
            age_significance: 1.0,
            survival_threshold: 0.2,
            population_size: 100,
            mutate_only_probability: 0.2,
            mutate_add_node_probability: 0.03,
            mutate_add_connection_probability: 0.05,
            mutate_toggle_enable_probability: 0.0,
            interspecies_mate_rate: 0.001,
            fitness_threshold: 0.9,
            add_connection_tries: 20,
            feed_forward_only: true,
            normalize_threshold: 0,
            output_sources: false,
            young_age: 10,
            stagnation_penalty: 0.01,
            mode: Mode::FeedForward,
        }
    }
}

impl Config {
    pub fn validate(&self) -> Result<()> {
        for (name, p) in [
            ("reEnableGeneProbability", self.re_enable_gene_probability),
            (
                "mutateConnectionWeightsProbability",
                self.mutate_connection_weights_probability,
            ),
            ("genomeWeightPerturbated", self.genome_weight_perturbated),
            ("survivalThreshold", self.survival_threshold),
            ("mutateOnlyProbability", self.mutate_only_probability),
            ("mutateAddNodeProbability", self.mutate_add_node_probability),
            (
                "mutateAddConnectionProbability",
                self.mutate_add_connection_probability,
            ),
            (
                "mutateToggleEnableProbability",
                self.mutate_toggle_enable_probability,
            ),
            ("interspeciesMateRate", self.interspecies_mate_rate),
        ] {
            if !(0. ..=1.).contains(&p) {
                return Err(NeatError::Config(format!("{name} must be within [0, 1], got {p}")));
            }
        }

        for (name, c) in [
            ("excessCoefficient", self.excess_coefficient),
            ("disjointCoefficient", self.disjoint_coefficient),
            ("weightDifferenceCoefficient", self.weight_difference_coefficient),
            ("compatibilityThreshold", self.compatibility_threshold),
            ("compatibilityModifier", self.compatibility_modifier),
            ("mutationPower", self.mutation_power),
        ] {
            if !c.is_finite() || c < 0. {
                return Err(NeatError::Config(format!(
                    "{name} must be finite and non-negative, got {c}"
                )));
            }
        }

        if self.population_size == 0 {
            return Err(NeatError::Config("populationSize must be positive".into()));
        }

        if self.add_connection_tries == 0 {
            return Err(NeatError::Config("addConnectionTries must be positive".into()));
        }

        Ok(())
    }

    pub fn to_string(&self) -> Result<String> {
        Ok(serde_json::to_string(self)?)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn from_str(s: &str) -> Result<Self> {
        Ok(serde_json::from_str(s)?)
    }

    pub fn to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        fs::write(path, self.to_string()?)?;
        Ok(())
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        Self::from_str(&fs::read_to_string(path)?)
    }
}
