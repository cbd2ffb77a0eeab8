pub mod connection;
pub mod node;

pub use connection::ConnectionGene;
pub use node::{NodeGene, NodeKind};

use crate::{
    config::Config,
    error::Result,
    random::Happens,
};
use fxhash::{FxHashMap, FxHashSet};
use log::trace;
use rand::{
    seq::{IndexedRandom, IteratorRandom},
    Rng, RngCore,
};
use serde::{Deserialize, Serialize};
use std::{
    collections::{BTreeMap, VecDeque},
    fs,
    path::Path,
};

/// The historical marking source of a run. Every structural mutation draws fresh innovation
/// numbers from here, and every new hidden node draws a fresh id, so one instance must be shared
/// by a whole population.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct InnoGen {
    pub head: usize,
    pub node_head: usize,
}

impl InnoGen {
    pub fn new(head: usize, node_head: usize) -> Self {
        Self { head, node_head }
    }

    /// Next innovation number
    pub fn inno(&mut self) -> usize {
        let n = self.head;
        self.head += 1;
        n
    }

    /// Next unused node id
    pub fn node(&mut self) -> usize {
        let n = self.node_head;
        self.node_head += 1;
        n
    }
}

/// Whether a connection `from -> to` would close a loop, given some existing connections. Walks
/// everything reachable from `to` looking for `from`.
pub fn is_recurrent<'a>(
    from: usize,
    to: usize,
    connections: impl IntoIterator<Item = &'a ConnectionGene>,
) -> bool {
    if from == to {
        return true;
    }

    let mut edges = FxHashMap::<usize, Vec<usize>>::default();
    for c in connections {
        edges.entry(c.from).or_default().push(c.to);
    }

    let mut seen = FxHashSet::default();
    let mut queue = VecDeque::from([to]);
    while let Some(node) = queue.pop_front() {
        if node == from {
            return true;
        }
        if !seen.insert(node) {
            continue;
        }
        if let Some(next) = edges.get(&node) {
            queue.extend(next.iter().copied());
        }
    }

    false
}

#[inline]
fn uniform(power: f64, rng: &mut impl RngCore) -> f64 {
    rng.random_range(-power..=power)
}

/// Genetic encoding of a network: node genes keyed by id, and connection genes keyed by
/// innovation number. Disabled connections are kept around for alignment with other genomes.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Genome {
    nodes: BTreeMap<usize, NodeGene>,
    connections: BTreeMap<usize, ConnectionGene>,
}

impl Genome {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build a genome from explicit genes. Panics if a connection references a node that isn't
    /// among `nodes`.
    pub fn with_genes(
        nodes: impl IntoIterator<Item = NodeGene>,
        connections: impl IntoIterator<Item = ConnectionGene>,
    ) -> Self {
        let mut genome = Self::new();
        for node in nodes {
            genome.add_node(node);
        }
        for connection in connections {
            genome.insert_connection(connection);
        }
        genome
    }

    /// Nodes in ascending id order
    pub fn nodes(&self) -> impl Iterator<Item = &NodeGene> {
        self.nodes.values()
    }

    pub fn node(&self, id: usize) -> Option<&NodeGene> {
        self.nodes.get(&id)
    }

    /// Connections in ascending innovation order
    pub fn connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values()
    }

    pub fn connection(&self, inno: usize) -> Option<&ConnectionGene> {
        self.connections.get(&inno)
    }

    pub fn enabled_connections(&self) -> impl Iterator<Item = &ConnectionGene> {
        self.connections.values().filter(|c| c.enabled)
    }

    /// Innovation numbers held by this genome, ascending
    pub fn innos(&self) -> impl Iterator<Item = usize> + '_ {
        self.connections.keys().copied()
    }

    /// Number of connection genes, enabled or not
    #[inline]
    pub fn len(&self) -> usize {
        self.connections.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    /// Add a node if no node with its id is present yet
    pub fn add_node(&mut self, node: NodeGene) -> bool {
        if self.nodes.contains_key(&node.id) {
            false
        } else {
            self.nodes.insert(node.id, node);
            true
        }
    }

    /// Insert a connection under its innovation number. Both endpoints must already be present.
    pub fn insert_connection(&mut self, connection: ConnectionGene) {
        for end in [connection.from, connection.to] {
            if !self.nodes.contains_key(&end) {
                panic!(
                    "connection {} references node {end}, which is not in its genome",
                    connection.inno
                );
            }
        }
        self.connections.insert(connection.inno, connection);
    }

    /// Whether any connection, enabled or not, already joins `from -> to`
    pub fn connection_exists(&self, from: usize, to: usize) -> bool {
        self.connections
            .values()
            .any(|c| c.from == from && c.to == to)
    }

    /// Whether adding `from -> to` would introduce a cycle
    pub fn creates_cycle(&self, from: usize, to: usize) -> bool {
        is_recurrent(from, to, self.connections.values())
    }

    /// Try up to `add_connection_tries` times to join a random source to a random eligible
    /// target. Returns whether a connection was added; exhausting the tries leaves the genome
    /// untouched.
    pub fn mutate_add_connection(
        &mut self,
        config: &Config,
        innogen: &mut InnoGen,
        rng: &mut impl RngCore,
    ) -> bool {
        let output_sources = config.output_sources && !config.feed_forward_only;
        let sources = self
            .nodes
            .values()
            .filter(|n| output_sources || !n.is_output())
            .copied()
            .collect::<Vec<_>>();

        for _ in 0..config.add_connection_tries {
            let Some(from) = sources.choose(rng) else {
                return false;
            };

            let Some(to) = self
                .nodes
                .values()
                .filter(|n| {
                    !n.is_sensor() && n.id != from.id && !(from.is_output() && n.is_output())
                })
                .copied()
                .choose(rng)
            else {
                continue;
            };

            let weight = uniform(config.mutation_power, rng);
            if self.connection_exists(from.id, to.id)
                || (config.feed_forward_only && self.creates_cycle(from.id, to.id))
            {
                continue;
            }

            let inno = innogen.inno();
            trace!("new connection {inno}: {} -> {}", from.id, to.id);
            self.connections
                .insert(inno, ConnectionGene::new(inno, from.id, to.id, weight));
            return true;
        }

        false
    }

    /// Split a random enabled connection with a new hidden node. Returns the new node's id, or
    /// nothing if there was no enabled connection to split.
    pub fn mutate_add_node(
        &mut self,
        innogen: &mut InnoGen,
        rng: &mut impl RngCore,
    ) -> Option<usize> {
        let inno = self
            .connections
            .values()
            .filter(|c| c.enabled)
            .map(|c| c.inno)
            .choose(rng)?;

        let center = innogen.node();
        let innos = (innogen.inno(), innogen.inno());
        let (head, tail) = self.connections.get_mut(&inno)?.bisect(center, innos);
        trace!("new node {center} bisecting connection {inno}");

        self.nodes
            .insert(center, NodeGene::new(center, NodeKind::Hidden));
        self.connections.insert(head.inno, head);
        self.connections.insert(tail.inno, tail);
        Some(center)
    }

    /// Toggle random connections `times` times. An enabled connection is only disabled when its
    /// source keeps another enabled outgoing connection.
    pub fn mutate_toggle_enable(&mut self, times: usize, rng: &mut impl RngCore) {
        for _ in 0..times {
            let Some(inno) = self.connections.keys().copied().choose(rng) else {
                return;
            };
            let (from, enabled) = {
                let c = &self.connections[&inno];
                (c.from, c.enabled)
            };

            if !enabled {
                if let Some(c) = self.connections.get_mut(&inno) {
                    c.enable();
                }
            } else if self
                .connections
                .values()
                .any(|c| c.enabled && c.from == from && c.inno != inno)
            {
                if let Some(c) = self.connections.get_mut(&inno) {
                    c.disable();
                }
            }
        }
    }

    /// Enable the disabled connection with the lowest innovation number, if there is one
    pub fn re_enable_first_disabled(&mut self) -> bool {
        match self.connections.values_mut().find(|c| !c.enabled) {
            Some(c) => {
                c.enable();
                true
            }
            None => false,
        }
    }

    /// Perturb every enabled weight by a uniform delta in `[-power, power]` with probability
    /// `perturb_probability`, otherwise replace it with a fresh value from the same range
    pub fn perturb_weights(
        &mut self,
        power: f64,
        perturb_probability: f64,
        rng: &mut impl RngCore,
    ) {
        for c in self.connections.values_mut().filter(|c| c.enabled) {
            let delta = uniform(power, rng);
            if rng.happens(perturb_probability) {
                c.weight += delta;
            } else {
                c.weight = delta;
            }
        }
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
