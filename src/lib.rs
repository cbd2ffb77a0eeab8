#![allow(mixed_script_confusables)]
#![allow(confusable_idents)]

pub mod config;
pub mod crossover;
pub mod error;
pub mod genome;
pub mod macros;
pub mod network;
pub mod organism;
pub mod population;
pub mod random;
pub mod scenario;
pub mod seed;
pub mod specie;

pub use config::Config;
pub use error::{NeatError, Result};
pub use genome::{ConnectionGene, Genome, InnoGen, NodeGene, NodeKind};
pub use network::{activate, Mode, Network, NetworkRecord};
pub use organism::Organism;
pub use population::Population;
pub use random::Happens;
pub use scenario::{Scenario, Stats};
pub use seed::Seed;
pub use specie::{Specie, SpecieId};
