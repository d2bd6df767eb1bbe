use ordered_float::OrderedFloat;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use std::collections::BTreeMap;

pub type Histogram = BTreeMap<OrderedFloat<f64>, usize>;

pub fn histogram(xs: impl Iterator<Item = f64>) -> Histogram {
    let mut histogram = Histogram::new();
    for x in xs {
        *histogram.entry(OrderedFloat(x)).or_default() += 1;
    }
    histogram
}

/// Returns the most frequent value and its count.
///
/// Ties go to the lowest value. `None` for an empty input.
pub fn most_frequent(xs: impl Iterator<Item = f64>) -> Option<(f64, usize)> {
    max_count(&histogram(xs))
}

pub fn max_count(histogram: &Histogram) -> Option<(f64, usize)> {
    let mut best: Option<(f64, usize)> = None;
    for (x, &count) in histogram {
        if best.map_or(true, |(_, c)| c < count) {
            best = Some((x.0, count));
        }
    }
    best
}

/// Returns the key with the highest score, the lowest key on ties.
pub fn argmax(scores: &BTreeMap<OrderedFloat<f64>, f64>) -> Option<(f64, f64)> {
    let mut best: Option<(f64, f64)> = None;
    for (x, &score) in scores {
        if best.map_or(true, |(_, s)| s < score) {
            best = Some((x.0, score));
        }
    }
    best
}

pub fn mean(xs: impl Iterator<Item = f64>) -> f64 {
    let mut count = 0;
    let mut total = 0.0;
    for x in xs {
        count += 1;
        total += x;
    }
    assert_ne!(count, 0);
    total / count as f64
}

/// Makes the generator a trainer shuffles with, seeded from `thread_rng` when `seed` is `None`.
pub(crate) fn rng(seed: Option<u64>) -> StdRng {
    let seed_u64 = seed.unwrap_or_else(|| rand::thread_rng().gen());
    let mut seed = [0u8; 32];
    (&mut seed[0..8]).copy_from_slice(&seed_u64.to_be_bytes()[..]);
    StdRng::from_seed(seed)
}
