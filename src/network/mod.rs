//! Phenotypes compiled from a [Genome]. A [Network] is an arena of neurons and the links
//! between them, and knows how to propagate sensor values through itself in one of two [Mode]s.

pub mod record;

pub use record::{LinkRecord, NetworkRecord, NeuronRecord};

use crate::{
    error::{NeatError, Result},
    genome::{Genome, NodeKind},
};
use fxhash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::VecDeque;

pub mod activate {
    use core::f64::consts::E;

    /// Logistic curve with the slope used throughout NEAT
    pub fn steep_sigmoid(x: f64) -> f64 {
        1. / (1. + E.powf(-4.924273 * x))
    }

    pub fn relu(x: f64) -> f64 {
        if x < 0. {
            0.
        } else {
            x
        }
    }
}

/// How a network propagates its values
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub enum Mode {
    /// One pass in dependency order, reading values computed earlier in the same pass. Loops
    /// read whatever their source held from the previous activation.
    #[default]
    FeedForward,
    /// Every activation is one discrete time step, computed strictly from the previous step's
    /// values
    Recurrent,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Neuron {
    pub id: usize,
    pub kind: NodeKind,
    pub bias: f64,
    /// Indices into the network's links
    pub incoming: Vec<usize>,
    pub outgoing: Vec<usize>,
}

/// A weighted edge between two neurons, addressed by their index in the network
#[derive(Debug, Clone, PartialEq)]
pub struct Link {
    pub from: usize,
    pub to: usize,
    pub weight: f64,
    pub enabled: bool,
}

#[derive(Debug, Clone)]
pub struct Network {
    mode: Mode,
    neurons: Vec<Neuron>,
    links: Vec<Link>,
    sensory: Vec<usize>,
    action: Vec<usize>,
    /// Non-sensor neurons in the order a feed-forward pass visits them
    order: Vec<usize>,
    state: Vec<f64>,
    scratch: Vec<f64>,
    output: Vec<f64>,
}

impl Network {
    /// Compile a genome's enabled connections
    pub fn new(genome: &Genome, mode: Mode) -> Self {
        let neurons = genome
            .nodes()
            .map(|n| Neuron {
                id: n.id,
                kind: n.kind,
                bias: 0.,
                incoming: Vec::new(),
                outgoing: Vec::new(),
            })
            .collect::<Vec<_>>();
        let index = neurons
            .iter()
            .enumerate()
            .map(|(i, n)| (n.id, i))
            .collect::<FxHashMap<_, _>>();

        let links = genome
            .enabled_connections()
            .map(|c| Link {
                from: index[&c.from],
                to: index[&c.to],
                weight: c.weight,
                enabled: true,
            })
            .collect();

        Self::assemble(neurons, links, mode)
    }

    /// Wire up neuron adjacency from a set of links, and precompute the evaluation order
    fn assemble(mut neurons: Vec<Neuron>, links: Vec<Link>, mode: Mode) -> Self {
        for n in neurons.iter_mut() {
            n.incoming.clear();
            n.outgoing.clear();
        }
        for (i, link) in links.iter().enumerate() {
            neurons[link.from].outgoing.push(i);
            neurons[link.to].incoming.push(i);
        }

        let sensory = (0..neurons.len())
            .filter(|i| neurons[*i].kind.is_sensor())
            .collect();
        let action = (0..neurons.len())
            .filter(|i| neurons[*i].kind.is_output())
            .collect();
        let order = Self::order(&neurons, &links);
        let size = neurons.len();

        Self {
            mode,
            neurons,
            links,
            sensory,
            action,
            order,
            state: vec![0.; size],
            scratch: vec![0.; size],
            output: Vec::new(),
        }
    }

    /// Breadth first from every neuron without enabled inputs. Neurons caught in a loop are
    /// never freed, and are visited last in index order.
    fn order(neurons: &[Neuron], links: &[Link]) -> Vec<usize> {
        let mut in_degree = vec![0usize; neurons.len()];
        for link in links.iter().filter(|l| l.enabled) {
            in_degree[link.to] += 1;
        }

        let mut queue = (0..neurons.len())
            .filter(|i| in_degree[*i] == 0)
            .collect::<VecDeque<_>>();
        let mut visited = vec![false; neurons.len()];
        let mut order = Vec::with_capacity(neurons.len());
        while let Some(i) = queue.pop_front() {
            visited[i] = true;
            order.push(i);
            for link in neurons[i].outgoing.iter().map(|l| &links[*l]) {
                if link.enabled {
                    in_degree[link.to] -= 1;
                    if in_degree[link.to] == 0 {
                        queue.push_back(link.to);
                    }
                }
            }
        }
        order.extend((0..neurons.len()).filter(|i| !visited[*i]));
        order.retain(|i| !neurons[*i].kind.is_sensor());
        order
    }

    #[inline]
    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn neurons(&self) -> &[Neuron] {
        &self.neurons
    }

    pub fn links(&self) -> &[Link] {
        &self.links
    }

    /// Number of values expected by [Network::activate], one per sensor in ascending id order
    pub fn sensors(&self) -> usize {
        self.sensory.len()
    }

    /// Number of values produced by [Network::activate], one per output in ascending id order
    pub fn outputs(&self) -> usize {
        self.action.len()
    }

    /// Most recent output values
    pub fn output(&self) -> &[f64] {
        &self.output
    }

    /// Forget all state carried between activations
    pub fn flush(&mut self) {
        self.state.fill(0.);
        self.scratch.fill(0.);
        self.output.clear();
    }

    /// Propagate `input` through the network, squashing with [activate::steep_sigmoid]
    pub fn activate(&mut self, input: &[f64]) -> Result<&[f64]> {
        self.activate_with(input, activate::steep_sigmoid)
    }

    /// Propagate `input` through the network, squashing every non-sensor with σ. Bias sensors
    /// are sensors like any other, so their value is part of `input`.
    pub fn activate_with<F: Fn(f64) -> f64>(&mut self, input: &[f64], σ: F) -> Result<&[f64]> {
        if input.len() != self.sensory.len() {
            return Err(NeatError::InputSize {
                expected: self.sensory.len(),
                got: input.len(),
            });
        }

        for (i, v) in self.sensory.iter().zip(input) {
            self.state[*i] = *v;
            self.scratch[*i] = *v;
        }

        match self.mode {
            Mode::FeedForward => {
                for i in self.order.iter().copied() {
                    if let Some(sum) = Self::weighted_sum(&self.neurons[i], &self.links, &self.state)
                    {
                        self.state[i] = σ(self.neurons[i].bias + sum);
                    }
                }
            }
            Mode::Recurrent => {
                for i in self.order.iter().copied() {
                    self.scratch[i] =
                        match Self::weighted_sum(&self.neurons[i], &self.links, &self.state) {
                            Some(sum) => σ(self.neurons[i].bias + sum),
                            None => self.state[i],
                        };
                }
                core::mem::swap(&mut self.state, &mut self.scratch);
            }
        }

        self.output.clear();
        self.output.extend(self.action.iter().map(|i| self.state[*i]));
        Ok(self.output.as_slice())
    }

    /// Sum of enabled incoming links, or nothing if a neuron has no enabled input at all
    fn weighted_sum(neuron: &Neuron, links: &[Link], values: &[f64]) -> Option<f64> {
        neuron
            .incoming
            .iter()
            .map(|l| &links[*l])
            .filter(|l| l.enabled)
            .map(|l| values[l.from] * l.weight)
            .reduce(|acc, v| acc + v)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::{
        assert_f64_approx,
        genome::{ConnectionGene, NodeGene},
    };
    use activate::steep_sigmoid;

    fn chain(weights: (f64, f64)) -> Genome {
        Genome::with_genes(
            [
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(1, NodeKind::Output),
                NodeGene::new(2, NodeKind::Hidden),
            ],
            [
                ConnectionGene::new(0, 0, 2, weights.0),
                ConnectionGene::new(1, 2, 1, weights.1),
            ],
        )
    }

    #[test]
    fn test_steep_sigmoid() {
        assert_f64_approx!(steep_sigmoid(0.), 0.5);
        assert!(steep_sigmoid(5.) > 0.99);
        assert!(steep_sigmoid(-5.) < 0.01);
        assert_f64_approx!(steep_sigmoid(1.) + steep_sigmoid(-1.), 1.);
    }

    #[test]
    fn test_relu() {
        assert_f64_approx!(activate::relu(-3.), 0.);
        assert_f64_approx!(activate::relu(0.), 0.);
        assert_f64_approx!(activate::relu(2.5), 2.5);
    }

    #[test]
    fn test_single_connection() {
        let genome = Genome::with_genes(
            [
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(1, NodeKind::Bias),
                NodeGene::new(2, NodeKind::Output),
            ],
            [
                ConnectionGene::new(0, 0, 2, 0.7),
                ConnectionGene::new(1, 1, 2, -0.2),
            ],
        );
        let mut network = Network::new(&genome, Mode::FeedForward);
        assert_eq!(network.sensors(), 2);
        assert_eq!(network.outputs(), 1);
        let out = network.activate(&[0.5, 1.]).unwrap();
        assert_f64_approx!(out[0], steep_sigmoid(0.5 * 0.7 - 0.2));
    }

    #[test]
    fn test_feed_forward_chain() {
        let mut network = Network::new(&chain((1.5, -0.5)), Mode::FeedForward);
        for x in [0., 0.3, 1.] {
            let out = network.activate(&[x]).unwrap()[0];
            assert_f64_approx!(out, steep_sigmoid(steep_sigmoid(x * 1.5) * -0.5));
        }
    }

    #[test]
    fn test_feed_forward_order_ignores_ids() {
        // hidden 1 feeds hidden 0, so ids disagree with dependency order
        let genome = Genome::with_genes(
            [
                NodeGene::new(0, NodeKind::Hidden),
                NodeGene::new(1, NodeKind::Hidden),
                NodeGene::new(2, NodeKind::Input),
                NodeGene::new(3, NodeKind::Output),
            ],
            [
                ConnectionGene::new(0, 2, 1, 1.),
                ConnectionGene::new(1, 1, 0, 1.),
                ConnectionGene::new(2, 0, 3, 1.),
            ],
        );
        let mut network = Network::new(&genome, Mode::FeedForward);
        let out = network.activate(&[1.]).unwrap()[0];
        assert_f64_approx!(out, steep_sigmoid(steep_sigmoid(steep_sigmoid(1.))));
    }

    #[test]
    fn test_disabled_connections_excluded() {
        let mut genome = chain((1., 1.));
        let mut bypass = ConnectionGene::new(2, 0, 1, 10.);
        bypass.disable();
        genome.insert_connection(bypass);

        let network = Network::new(&genome, Mode::FeedForward);
        assert_eq!(network.links().len(), 2);
        assert!(network.links().iter().all(|l| l.enabled));
    }

    #[test]
    fn test_unconnected_output() {
        let genome = Genome::with_genes(
            [
                NodeGene::new(0, NodeKind::Input),
                NodeGene::new(1, NodeKind::Output),
            ],
            [],
        );
        for mode in [Mode::FeedForward, Mode::Recurrent] {
            let mut network = Network::new(&genome, mode);
            assert_eq!(network.activate(&[1.]).unwrap(), &[0.]);
        }
    }

    #[test]
    fn test_input_size() {
        let mut network = Network::new(&chain((1., 1.)), Mode::FeedForward);
        assert!(matches!(
            network.activate(&[1., 2.]),
            Err(NeatError::InputSize {
                expected: 1,
                got: 2
            })
        ));
    }

    #[test]
    fn test_recurrent_time_steps() {
        let mut network = Network::new(&chain((1., 1.)), Mode::Recurrent);
        // the output lags the input by one step per layer
        assert_f64_approx!(network.activate(&[1.]).unwrap()[0], steep_sigmoid(0.));
        assert_f64_approx!(
            network.activate(&[1.]).unwrap()[0],
            steep_sigmoid(steep_sigmoid(1.))
        );

        network.flush();
        assert!(network.output().is_empty());
        assert_f64_approx!(network.activate(&[1.]).unwrap()[0], steep_sigmoid(0.));
    }

    #[test]
    fn test_recurrent_loop() {
        let mut genome = chain((1., 1.));
        genome.insert_connection(ConnectionGene::new(2, 1, 2, -1.));
        genome.insert_connection(ConnectionGene::new(3, 1, 1, 0.5));

        let mut network = Network::new(&genome, Mode::Recurrent);
        let mut prev = (0., 0.);
        for _ in 0..20 {
            let out = network.activate(&[0.8]).unwrap()[0];
            let hidden = network.state[2];
            assert!(out.is_finite() && (0. ..=1.).contains(&out));
            // every value comes from the previous step only
            assert_f64_approx!(hidden, steep_sigmoid(0.8 - prev.1));
            assert_f64_approx!(out, steep_sigmoid(prev.0 + 0.5 * prev.1));
            prev = (hidden, out);
        }
    }

    #[test]
    fn test_feed_forward_tolerates_loops() {
        let mut genome = chain((1., 1.));
        genome.insert_connection(ConnectionGene::new(2, 1, 2, 1.));
        let mut network = Network::new(&genome, Mode::FeedForward);
        assert_eq!(network.order.len(), 2);
        for _ in 0..5 {
            assert!(network.activate(&[1.]).unwrap()[0].is_finite());
        }
    }

    #[test]
    fn test_activate_with() {
        let mut network = Network::new(&chain((2., -1.)), Mode::FeedForward);
        assert_f64_approx!(network.activate_with(&[3.], activate::relu).unwrap()[0], 0.);
        assert_f64_approx!(network.activate_with(&[3.], |x| x).unwrap()[0], -6.);
    }
}
