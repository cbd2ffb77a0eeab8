use approx::relative_eq;
use core::ops::ControlFlow;
use neatling::{Config, Network, Organism, Population, Seed, Stats};

const POPULATION: usize = 150;

const CASES: [([f64; 3], f64); 4] = [
    ([0., 0., 1.], 0.),
    ([0., 1., 1.], 1.),
    ([1., 0., 1.], 1.),
    ([1., 1., 1.], 0.),
];

fn xor(network: &mut Network, _: &Organism, _: &Population) -> f64 {
    let mut fitness = 4.;
    for (input, want) in CASES {
        match network.activate(&input) {
            Ok(out) => fitness -= (out[0] - want).abs(),
            Err(_) => return 0.,
        }
    }
    fitness * fitness
}

fn hook(stats: &Stats) -> ControlFlow<()> {
    if stats.generation % 10 == 1 {
        println!(
            "fittest of gen {}: {:.4} (of {} species, threshold {:.2})",
            stats.generation, stats.best_fitness, stats.species, stats.compatibility_threshold
        );
    }

    if stats.any_fitter_than(16. - f64::EPSILON) {
        return ControlFlow::Break(());
    }

    ControlFlow::Continue(())
}

fn main() -> neatling::Result<()> {
    env_logger::init();

    let config = Config {
        population_size: POPULATION,
        fitness_threshold: 15.9,
        adjust_compatibility_threshold: true,
        compatibility_modifier_target: 10,
        excess_coefficient: 2.,
        disjoint_coefficient: 0.5,
        ..Config::default()
    };
    let mut population = Population::from_seed(config, &Seed::fully_connected(2, 1, true))?;
    let mut scenario = xor;
    let winner = population.run_with(&mut scenario, 300, hook)?;
    println!(
        "target met in gen {}: {:.4} with {} nodes",
        winner.generation,
        winner.fitness,
        winner.genome().nodes().count()
    );

    let mut network = Network::new(winner.genome(), population.config().mode);
    for (input, want) in CASES {
        let out = network.activate(&input)?[0];
        let mark = if relative_eq!(out, want, epsilon = 0.1) { "ok" } else { "off" };
        println!("{:?} -> {out:.4} (want {want}, {mark})", &input[..2]);
    }
    println!("{}", network.record().to_string()?);

    Ok(())
}
