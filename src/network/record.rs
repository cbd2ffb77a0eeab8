use super::{Link, Mode, Network, Neuron};
use crate::{
    error::{NeatError, Result},
    genome::NodeKind,
};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::{fs, path::Path};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NeuronRecord {
    pub id: usize,
    pub kind: NodeKind,
    pub bias: f64,
}

/// A link between two neurons, addressed by neuron id
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LinkRecord {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    pub enabled: bool,
}

/// A trained network stripped down to its neurons and links, for use outside of evolution
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct NetworkRecord {
    pub neurons: Vec<NeuronRecord>,
    pub links: Vec<LinkRecord>,
}

impl NetworkRecord {
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

impl Network {
    pub fn record(&self) -> NetworkRecord {
        NetworkRecord {
            neurons: self
                .neurons
                .iter()
                .map(|n| NeuronRecord {
                    id: n.id,
                    kind: n.kind,
                    bias: n.bias,
                })
                .collect(),
            links: self
                .links
                .iter()
                .map(|l| LinkRecord {
                    from: self.neurons[l.from].id,
                    to: self.neurons[l.to].id,
                    weight: l.weight,
                    enabled: l.enabled,
                })
                .collect(),
        }
    }

    /// Rebuild a network from its record. Neurons are ordered by id, so sensor and output
    /// ordering matches the network that was recorded. A link naming an unknown neuron is
    /// reported with its position in the record.
    pub fn from_record(record: &NetworkRecord, mode: Mode) -> Result<Self> {
        let mut neurons = record
            .neurons
            .iter()
            .map(|n| Neuron {
                id: n.id,
                kind: n.kind,
                bias: n.bias,
                incoming: Vec::new(),
                outgoing: Vec::new(),
            })
            .collect::<Vec<_>>();
        neurons.sort_by_key(|n| n.id);
        neurons.dedup_by_key(|n| n.id);

        let index = neurons
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect::<FxHashMap<_, _>>();
        let lookup = |node: usize, inno: usize| {
            index
                .get(&node)
                .copied()
                .ok_or(NeatError::MissingNode { node, inno })
        };

        let links = record
            .links
            .iter()
            .enumerate()
            .map(|(inno, l)| -> Result<Link> {
                Ok(Link {
                    from: lookup(l.from, inno)?,
                    to: lookup(l.to, inno)?,
                    weight: l.weight,
                    enabled: l.enabled,
                })
            })
            .collect::<Result<Vec<_>>>()?;

        Ok(Self::assemble(neurons, links, mode))
    }
}
