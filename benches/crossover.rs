use core::cmp::Ordering;
use criterion::Criterion;
use neatling::{
    crossover::{compatibility, crossover},
    random::WyRng,
    Config, Genome, InnoGen, Seed,
};
use rand::SeedableRng;

fn grown(config: &Config, innogen: &mut InnoGen, rng: &mut WyRng, rounds: usize) -> Genome {
    let mut genome = Seed::fully_connected(8, 4, true)
        .genome(&mut InnoGen::default())
        .unwrap();
    for _ in 0..rounds {
        genome.mutate_add_node(innogen, rng);
        genome.mutate_add_connection(config, innogen, rng);
        genome.perturb_weights(config.mutation_power, 0.9, rng);
    }
    genome
}

fn bench_crossover(bench: &mut Criterion) {
    let config = Config::default();
    let mut rng = WyRng::seed_from_u64(100);
    let mut innogen = InnoGen::new(36, 13);
    let l = grown(&config, &mut innogen, &mut rng, 50);
    let r = grown(&config, &mut innogen, &mut rng, 50);

    bench.bench_function("crossover-ne", |b| {
        b.iter(|| crossover(&l, &r, Ordering::Greater, true, &mut rng))
    });

    bench.bench_function("crossover-eq", |b| {
        b.iter(|| crossover(&l, &r, Ordering::Equal, true, &mut rng))
    });

    bench.bench_function("compatibility", |b| {
        b.iter(|| compatibility(&l, &r, &config))
    });
}

pub fn benches() {
    #[cfg(not(feature = "smol_bench"))]
    let mut criterion: criterion::Criterion<_> = Criterion::default()
        .sample_size(1000)
        .significance_level(0.1);
    #[cfg(feature = "smol_bench")]
    let mut criterion: criterion::Criterion<_> = {
        use core::time::Duration;
        Criterion::default()
            .measurement_time(Duration::from_millis(1))
            .sample_size(10)
            .nresamples(1)
            .without_plots()
            .configure_from_args()
    };
    bench_crossover(&mut criterion);
}

fn main() {
    benches();
    criterion::Criterion::default()
        .configure_from_args()
        .final_summary();
}
