//! Seed topologies that found the first generation of a [Population](crate::Population).

use crate::{
    error::{NeatError, Result},
    genome::{ConnectionGene, Genome, InnoGen, NodeGene, NodeKind},
};
use serde::{Deserialize, Serialize};

/// Nodes and `(from, to, weight)` connections that every founding organism starts from.
/// Connections receive innovation numbers in the order they are listed.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Seed {
    pub nodes: Vec<NodeGene>,
    pub connections: Vec<(usize, usize, f64)>,
}

impl Seed {
    pub fn new(nodes: Vec<NodeGene>, connections: Vec<(usize, usize, f64)>) -> Self {
        Self { nodes, connections }
    }

    /// Inputs, then an optional bias, then outputs, with every sensor connected to every output
    pub fn fully_connected(inputs: usize, outputs: usize, bias: bool) -> Self {
        Self::layered(inputs, &[], outputs, bias)
    }

    /// Inputs and an optional bias, then each hidden layer, then outputs. Every layer is fully
    /// connected to the next one and nothing else, so the seed is feed-forward. See
    /// [Seed::with_hidden_loops] for recurrent runs.
    pub fn layered(inputs: usize, hidden: &[usize], outputs: usize, bias: bool) -> Self {
        let mut nodes = Vec::new();
        let mut layers = Vec::with_capacity(hidden.len() + 2);
        let layer = |kind: NodeKind, size: usize, nodes: &mut Vec<NodeGene>| {
            let ids = (nodes.len()..nodes.len() + size).collect::<Vec<_>>();
            nodes.extend(ids.iter().map(|id| NodeGene::new(*id, kind)));
            ids
        };

        let mut sensors = layer(NodeKind::Input, inputs, &mut nodes);
        if bias {
            sensors.extend(layer(NodeKind::Bias, 1, &mut nodes));
        }
        layers.push(sensors);
        for size in hidden {
            layers.push(layer(NodeKind::Hidden, *size, &mut nodes));
        }
        layers.push(layer(NodeKind::Output, outputs, &mut nodes));

        let connections = layers
            .windows(2)
            .flat_map(|pair| {
                pair[0]
                    .iter()
                    .flat_map(|from| pair[1].iter().map(|to| (*from, *to, 1.)))
                    .collect::<Vec<_>>()
            })
            .collect();

        Self { nodes, connections }
    }

    /// Give every hidden node a connection to itself. The loops make the seed recurrent, so
    /// they only survive in runs that are not feed-forward only.
    pub fn with_hidden_loops(mut self) -> Self {
        let hidden = self
            .nodes
            .iter()
            .filter(|n| n.kind == NodeKind::Hidden)
            .map(|n| (n.id, n.id, 1.))
            .collect::<Vec<_>>();
        self.connections.extend(hidden);
        self
    }

    /// Number of sensor values a network grown from this seed expects
    pub fn sensors(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_sensor()).count()
    }

    pub fn outputs(&self) -> usize {
        self.nodes.iter().filter(|n| n.is_output()).count()
    }

    /// Build the seed genome, drawing its innovation numbers from `innogen` and moving the node
    /// counter past every seed node id. A connection naming an unknown node is reported with its
    /// position among the seed connections. Repeated paths are dropped.
    pub fn genome(&self, innogen: &mut InnoGen) -> Result<Genome> {
        let mut genome = Genome::new();
        for node in self.nodes.iter() {
            genome.add_node(*node);
        }

        for (inno, (from, to, _)) in self.connections.iter().enumerate() {
            for node in [*from, *to] {
                if genome.node(node).is_none() {
                    return Err(NeatError::MissingNode { node, inno });
                }
            }
        }

        for (from, to, weight) in self.connections.iter() {
            if !genome.connection_exists(*from, *to) {
                genome.insert_connection(ConnectionGene::new(innogen.inno(), *from, *to, *weight));
            }
        }

        if let Some(max) = self.nodes.iter().map(|n| n.id).max() {
            innogen.node_head = innogen.node_head.max(max + 1);
        }

        Ok(genome)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn test_fully_connected() {
        let seed = Seed::fully_connected(2, 1, true);
        assert_eq!(
            seed.nodes,
            vec![
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(1, NodeKind::Input),
                NodeGene::new(2, NodeKind::Bias),
                NodeGene::new(3, NodeKind::Output),
            ]
        );
        assert_eq!(seed.connections, vec![(0, 3, 1.), (1, 3, 1.), (2, 3, 1.)]);
        assert_eq!(seed.sensors(), 3);
        assert_eq!(seed.outputs(), 1);

        let seed = Seed::fully_connected(3, 2, false);
        assert_eq!(seed.sensors(), 3);
        assert_eq!(seed.connections.len(), 6);
    }

    #[test]
    fn test_layered() {
        let seed = Seed::layered(2, &[3, 2], 1, true);
        assert_eq!(seed.nodes.len(), 2 + 1 + 3 + 2 + 1);
        assert_eq!(seed.connections.len(), 3 * 3 + 3 * 2 + 2);
        assert!(seed.connections.iter().all(|(from, to, _)| from < to));
        assert_eq!(
            seed.nodes
                .iter()
                .filter(|n| n.kind == NodeKind::Hidden)
                .count(),
            5
        );
    }

    #[test]
    fn test_with_hidden_loops() {
        let seed = Seed::layered(2, &[2], 1, false).with_hidden_loops();
        assert_eq!(seed.connections.len(), 2 * 2 + 2 + 2);
        assert_eq!(&seed.connections[6..], &[(2, 2, 1.), (3, 3, 1.)]);

        let genome = seed.genome(&mut InnoGen::default()).unwrap();
        assert!(genome.connection_exists(2, 2));
        assert!(genome.connection_exists(3, 3));
        assert!(!genome.connection_exists(0, 0));

        let seed = Seed::fully_connected(2, 1, true).with_hidden_loops();
        assert_eq!(seed, Seed::fully_connected(2, 1, true));
    }

    #[test]
    fn test_genome() {
        let mut innogen = InnoGen::new(10, 0);
        let genome = Seed::fully_connected(2, 1, true)
            .genome(&mut innogen)
            .unwrap();
        assert_eq!(genome.innos().collect::<Vec<_>>(), vec![10, 11, 12]);
        assert_eq!(genome.connection(12).unwrap().path(), (2, 3));
        assert_eq!(innogen, InnoGen::new(13, 4));
    }

    #[test]
    fn test_genome_repeated_path() {
        let seed = Seed::new(
            vec![
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(5, NodeKind::Output),
            ],
            vec![(0, 5, 1.), (0, 5, -1.)],
        );
        let mut innogen = InnoGen::default();
        let genome = seed.genome(&mut innogen).unwrap();
        assert_eq!(genome.len(), 1);
        assert_eq!(genome.connection(0).unwrap().weight, 1.);
        assert_eq!(innogen, InnoGen::new(1, 6));
    }

    #[test]
    fn test_genome_missing_node() {
        let seed = Seed::new(
            vec![
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(1, NodeKind::Output),
            ],
            vec![(0, 1, 1.), (0, 4, 1.)],
        );
        let mut innogen = InnoGen::default();
        assert!(matches!(
            seed.genome(&mut innogen),
            Err(NeatError::MissingNode { node: 4, inno: 1 })
        ));
        assert_eq!(innogen, InnoGen::default());
    }
}
