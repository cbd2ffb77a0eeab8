use rand::{seq::IndexedRandom, Rng, RngCore, SeedableRng};
use rand_distr::{Distribution, Normal};
use std::{
    fs::File,
    io::{self, Read},
};

/// Roll against a probability in `[0, 1]`
pub trait Happens: RngCore {
    fn happens(&mut self, p: f64) -> bool;
}

impl<T: RngCore + ?Sized> Happens for T {
    #[inline]
    fn happens(&mut self, p: f64) -> bool {
        self.random::<f64>() < p
    }
}

#[derive(Debug, Clone)]
pub struct WyRng {
    state: u64,
}

impl WyRng {
    pub fn seeded(state: u64) -> Self {
        Self { state }
    }
}

impl RngCore for WyRng {
    fn next_u32(&mut self) -> u32 {
        self.next_u64() as u32
    }

    fn next_u64(&mut self) -> u64 {
        const WY_CONST_0: u64 = 0x2d35_8dcc_aa6c_78a5;
        const WY_CONST_1: u64 = 0x8bb8_4b93_962e_acc9;
        self.state = self.state.wrapping_add(WY_CONST_0);
        let t = u128::from(self.state) * u128::from(self.state ^ WY_CONST_1);
        (t as u64) ^ (t >> 64) as u64
    }

    fn fill_bytes(&mut self, dst: &mut [u8]) {
        for chunk in dst.chunks_mut(8) {
            let bytes = self.next_u64().to_le_bytes();
            chunk.copy_from_slice(&bytes[..chunk.len()]);
        }
    }
}

impl SeedableRng for WyRng {
    type Seed = [u8; 8];

    fn from_seed(seed: Self::Seed) -> Self {
        Self::seeded(u64::from_le_bytes(seed))
    }
}

pub fn seed_urandom() -> io::Result<u64> {
    let mut file = File::open("/dev/urandom")?;
    let mut buffer = [0u8; 8];
    file.read_exact(&mut buffer)?;
    Ok(u64::from_le_bytes(buffer))
}

/// A [WyRng] seeded from the OS, falling back to the thread rng where there is no urandom
pub fn default_rng() -> WyRng {
    WyRng::seeded(seed_urandom().unwrap_or_else(|_| rand::rng().next_u64()))
}

/// Pick `n` distinct items from `list`. Asking for more items than there are yields all of them,
/// in random order.
pub fn random_items<'a, T>(list: &'a [T], n: usize, rng: &mut impl RngCore) -> Vec<&'a T> {
    list.choose_multiple(rng, n.min(list.len())).collect()
}

/// Sample the normal distribution
pub fn gaussian(mean: f64, std_dev: f64, rng: &mut impl RngCore) -> f64 {
    match Normal::new(mean, std_dev) {
        Ok(normal) => normal.sample(rng),
        Err(_) => mean,
    }
}

pub fn mean(values: &[f64]) -> f64 {
    if values.is_empty() {
        0.
    } else {
        values.iter().sum::<f64>() / values.len() as f64
    }
}

/// Wrap `value` into the inclusive range `min..=max`
pub fn wrap_number(min: i64, max: i64, value: i64) -> i64 {
    let l = max - min + 1;
    (((value - min) % l) + l) % l + min
}

/// Index into a list of `len` ranked items, biased towards the front. The roll is a rounded
/// standard normal capped at 1, so negative rolls wrap around to the tail.
pub fn ranked_index(len: usize, rng: &mut impl RngCore) -> usize {
    debug_assert!(len > 0, "cannot rank an empty list");
    let roll = (gaussian(0., 1., rng).round() as i64).min(1);
    wrap_number(0, len as i64 - 1, roll) as usize
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::assert_f64_approx;
    use core::iter::once;
    use rand::rngs::ThreadRng;
    use std::collections::HashSet;

    fn assert_within_deviation(chance: f64, range: f64, rng: &mut impl RngCore) {
        let samples = 10_000.;
        let expected = chance * samples;
        let max_deviation = expected * range;
        for _ in 0..100 {
            let incidence = once(())
                .cycle()
                .take(samples as usize)
                .filter(|()| rng.happens(chance))
                .count() as f64;
            assert!(
                (expected - incidence).abs() < max_deviation,
                "{chance}: {incidence} != {expected} ± {max_deviation}"
            );
        }
    }

    // control test - we are confident that rand generates good random numbers
    #[test]
    fn test_deviation_rand() {
        let mut rng = ThreadRng::default();
        for chance in [0.03, 0.05, 0.2, 0.5, 0.9] {
            assert_within_deviation(chance, 0.33, &mut rng);
        }
    }

    #[test]
    fn test_deviation_wyrand() {
        let mut rng = default_rng();
        for chance in [0.03, 0.05, 0.2, 0.5, 0.9] {
            assert_within_deviation(chance, 0.33, &mut rng);
        }
    }

    #[test]
    fn test_happens_bounds() {
        let mut rng = default_rng();
        for _ in 0..1000 {
            assert!(!rng.happens(0.));
            assert!(rng.happens(1.));
        }
    }

    #[test]
    fn test_wyrng_seeded_is_reproducible() {
        let mut l = WyRng::seed_from_u64(7);
        let mut r = WyRng::seed_from_u64(7);
        for _ in 0..100 {
            assert_eq!(l.next_u64(), r.next_u64());
        }
    }

    #[test]
    fn test_fill_bytes_odd_length() {
        let mut rng = WyRng::seeded(1);
        let mut dst = [0u8; 13];
        rng.fill_bytes(&mut dst);
        assert!(dst.iter().any(|b| *b != 0));
    }

    #[test]
    fn test_random_items_distinct() {
        let mut rng = default_rng();
        let list = (0..10).collect::<Vec<usize>>();
        for n in 0..=10 {
            let picked = random_items(&list, n, &mut rng);
            assert_eq!(picked.len(), n);
            assert_eq!(picked.iter().collect::<HashSet<_>>().len(), n);
        }

        let picked = random_items(&list, 15, &mut rng);
        assert_eq!(picked.len(), 10);
        assert_eq!(
            picked.into_iter().copied().collect::<HashSet<_>>(),
            list.iter().copied().collect()
        );

        assert!(random_items::<usize>(&[], 1, &mut rng).is_empty());
    }

    #[test]
    fn test_mean() {
        assert_f64_approx!(mean(&[]), 0.);
        assert_f64_approx!(mean(&[1., 2., 3., 4.]), 2.5);
        let mut rng = default_rng();
        let values = (0..10).map(|_| rng.random::<f64>()).collect::<Vec<_>>();
        assert_f64_approx!(mean(&values), values.iter().sum::<f64>() / 10.);
    }

    #[test]
    fn test_wrap_number() {
        assert_eq!(wrap_number(0, 4, 2), 2);
        assert_eq!(wrap_number(0, 4, 5), 0);
        assert_eq!(wrap_number(0, 4, -1), 4);
        assert_eq!(wrap_number(0, 4, -6), 4);
        assert_eq!(wrap_number(0, 0, 1), 0);
    }

    #[test]
    fn test_ranked_index() {
        let mut rng = default_rng();
        for len in 1..10 {
            for _ in 0..1000 {
                assert!(ranked_index(len, &mut rng) < len);
            }
        }

        let mut hist = [0usize; 10];
        for _ in 0..10_000 {
            hist[ranked_index(10, &mut rng)] += 1;
        }
        // the front of the ranking is always the most popular pick
        assert!(hist[0] > hist[5]);
        assert!(hist[1] > hist[5]);
        // rolls are capped at 1, so the middle is only reached by far negative tails
        assert_eq!(hist[2..5].iter().sum::<usize>(), 0);
    }
}
