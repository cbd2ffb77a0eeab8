//! Gene alignment between genomes: compatibility distance and crossover. Genes are aligned by
//! innovation number alone, never by topology.

use crate::{
    config::Config,
    genome::{ConnectionGene, Genome, NodeGene},
    random::mean,
};
use core::cmp::Ordering;
use rand::{Rng, RngCore};
use std::collections::BTreeSet;

/// `(disjoint, excess)` gene counts between two genomes. Excess is the difference in genome
/// size, and disjoint counts every unshared gene beyond that.
pub fn disjoint_excess_count(l: &Genome, r: &Genome) -> (f64, f64) {
    let excess = l.len().abs_diff(r.len());
    let unshared = l.innos().filter(|i| r.connection(*i).is_none()).count()
        + r.innos().filter(|i| l.connection(*i).is_none()).count();
    (unshared.saturating_sub(excess) as f64, excess as f64)
}

/// Mean absolute weight difference of matching genes. Genomes that share no genes have an average
/// difference of 0.
pub fn avg_weight_diff(l: &Genome, r: &Genome) -> f64 {
    let diffs = l
        .connections()
        .filter_map(|lc| r.connection(lc.inno).map(|rc| (lc.weight - rc.weight).abs()))
        .collect::<Vec<_>>();
    mean(&diffs)
}

/// Compatibility distance between two genomes. Lower is more similar, and identical genomes are
/// 0 apart.
pub fn compatibility(l: &Genome, r: &Genome, config: &Config) -> f64 {
    let (disjoint, excess) = disjoint_excess_count(l, r);
    let size = l.len().max(r.len());
    let n = if size < config.normalize_threshold {
        1.
    } else {
        size.max(1) as f64
    };

    (excess * config.excess_coefficient + disjoint * config.disjoint_coefficient) / n
        + avg_weight_diff(l, r) * config.weight_difference_coefficient
}

fn endpoints(parent: &Genome, gene: &ConnectionGene) -> [NodeGene; 2] {
    [gene.from, gene.to].map(|id| {
        parent.node(id).copied().unwrap_or_else(|| {
            panic!(
                "connection {} references node {id}, which is not in its genome",
                gene.inno
            )
        })
    })
}

/// Recombine two genomes, where `l_fit` is how `l`'s fitness compares to `r`'s. Ties favour `l`.
///
/// The child takes every sensor and output node of the fitter parent. Matching genes are picked
/// from either parent at random, unmatched genes are inherited from whichever parent holds them.
/// In feed-forward runs a gene that would close a loop in the child is dropped, as is any gene
/// whose path the child already holds. No innovation numbers are created.
pub fn crossover(
    l: &Genome,
    r: &Genome,
    l_fit: Ordering,
    feed_forward_only: bool,
    rng: &mut impl RngCore,
) -> Genome {
    let (fit, unfit) = match l_fit {
        Ordering::Less => (r, l),
        _ => (l, r),
    };

    let mut child = Genome::new();
    for node in fit.nodes().filter(|n| n.is_sensor() || n.is_output()) {
        child.add_node(*node);
    }

    let innos = fit.innos().chain(unfit.innos()).collect::<BTreeSet<_>>();
    for inno in innos {
        let (gene, parent) = match (fit.connection(inno), unfit.connection(inno)) {
            (Some(f), Some(u)) => {
                if rng.random_bool(0.5) {
                    (f, fit)
                } else {
                    (u, unfit)
                }
            }
            (Some(f), None) => (f, fit),
            (None, Some(u)) => (u, unfit),
            (None, None) => continue,
        };

        // matching genes share their endpoints, so either copy agrees on recurrence
        if child.connection_exists(gene.from, gene.to)
            || (feed_forward_only && child.creates_cycle(gene.from, gene.to))
        {
            continue;
        }

        for node in endpoints(parent, gene) {
            child.add_node(node);
        }
        child.insert_connection(gene.clone());
    }

    child
}
