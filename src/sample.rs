//! Uniform random sampling over a stream of unknown length.

use crate::stage::{filter_fn, Arg, Filter};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

/// A fixed-size uniform sample of every item offered so far (Algorithm R).
///
/// After `L` offers with `L >= capacity`, each offered item is held with
/// probability `capacity / L`.
#[derive(Debug, Clone)]
pub struct Reservoir<T> {
    items: Vec<T>,
    capacity: usize,
    seen: usize,
}

impl<T> Reservoir<T> {
    /// Create an empty reservoir holding at most `capacity` items
    pub fn new(capacity: usize) -> Self {
        Self {
            items: Vec::with_capacity(capacity),
            capacity,
            seen: 0,
        }
    }

    /// Offer the next item of the stream
    pub fn offer<R: Rng>(&mut self, item: T, rng: &mut R) {
        if self.seen < self.capacity {
            self.items.push(item);
        } else {
            let slot = rng.random_range(0..=self.seen);
            if slot < self.capacity {
                self.items[slot] = item;
            }
        }
        self.seen += 1;
    }

    /// Number of items offered so far
    pub fn seen(&self) -> usize {
        self.seen
    }

    /// The sampled items in slot order
    pub fn into_items(self) -> Vec<T> {
        self.items
    }
}

/// Emit `n` items chosen uniformly at random. Each run draws a fresh seed
/// from the operating system, so repeated runs pick different items.
pub fn sample<T: Send>(n: usize) -> impl Filter<T> {
    sample_with_rng(n, StdRng::from_os_rng)
}

/// Emit `n` items chosen uniformly at random using a fixed seed.
///
/// The same seed and the same input always produce the same sample.
pub fn sample_with_seed<T: Send>(n: usize, seed: u64) -> impl Filter<T> {
    sample_with_rng(n, move || StdRng::seed_from_u64(seed))
}

/// Emit `n` items chosen uniformly at random, drawing from a generator
/// created by `make_rng` at the start of every run.
pub fn sample_with_rng<T, R, G>(n: usize, make_rng: G) -> impl Filter<T>
where
    T: Send,
    R: Rng,
    G: Fn() -> R + Send + Sync,
{
    filter_fn(move |arg: Arg<T>| {
        let mut rng = make_rng();
        let mut reservoir = Reservoir::new(n);
        for item in arg.iter() {
            reservoir.offer(item, &mut rng);
        }
        for item in reservoir.into_items() {
            arg.emit(item)?;
        }
        Ok(())
    })
    .named("sample")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filters::items;
    use crate::pipeline::PipelineBuilder;
    use rand::RngCore;

    struct ZeroRng;

    impl RngCore for ZeroRng {
        fn next_u32(&mut self) -> u32 {
            0
        }

        fn next_u64(&mut self) -> u64 {
            0
        }

        fn fill_bytes(&mut self, dst: &mut [u8]) {
            dst.fill(0);
        }
    }

    fn sample_of(filter: impl Filter<u32> + 'static, input: Vec<u32>) -> Vec<u32> {
        PipelineBuilder::new()
            .add_stage(items(input))
            .add_stage(filter)
            .build()
            .unwrap()
            .collect()
            .unwrap()
    }

    #[test]
    fn test_reservoir_fills_before_replacing() {
        let mut rng = StdRng::seed_from_u64(1);
        let mut reservoir = Reservoir::new(3);
        for i in 0..3 {
            reservoir.offer(i, &mut rng);
        }
        assert_eq!(reservoir.seen(), 3);
        assert_eq!(reservoir.into_items(), vec![0, 1, 2]);
    }

    #[test]
    fn test_short_input_is_returned_whole() {
        let out = sample_of(sample(10), vec![5, 6, 7]);
        assert_eq!(out, vec![5, 6, 7]);
    }

    #[test]
    fn test_sample_size() {
        let out = sample_of(sample(10), (0..1000).collect());
        assert_eq!(out.len(), 10);
        assert!(out.iter().all(|&x| x < 1000));
    }

    #[test]
    fn test_zero_sample() {
        assert!(sample_of(sample(0), (0..10).collect()).is_empty());
    }

    #[test]
    fn test_seeded_sample_is_reproducible() {
        let a = sample_of(sample_with_seed(5, 42), (0..500).collect());
        let b = sample_of(sample_with_seed(5, 42), (0..500).collect());
        assert_eq!(a, b);
    }

    #[test]
    fn test_unseeded_samples_differ() {
        // Two fresh OS seeds picking the same 10 of 10000 is vanishingly unlikely
        let a = sample_of(sample(10), (0..10_000).collect());
        let b = sample_of(sample(10), (0..10_000).collect());
        assert_eq!(a.len(), 10);
        assert_ne!(a, b);
    }

    #[test]
    fn test_injected_rng_drives_selection() {
        // Every draw lands on slot 0
        let filter = sample_with_rng(3, || ZeroRng);
        let out = sample_of(filter, (0..10).collect());
        assert_eq!(out, vec![9, 1, 2]);
    }

    #[test]
    fn test_inclusion_is_roughly_uniform() {
        const N: usize = 2;
        const L: u32 = 10;
        const RUNS: u64 = 5000;
        let mut hits = [0u32; L as usize];
        for seed in 0..RUNS {
            let mut rng = StdRng::seed_from_u64(seed);
            let mut reservoir = Reservoir::new(N);
            for i in 0..L {
                reservoir.offer(i, &mut rng);
            }
            for item in reservoir.into_items() {
                hits[item as usize] += 1;
            }
        }
        // Expected 1000 hits per item (probability N / L)
        for count in hits {
            assert!((800..1200).contains(&count), "count {} out of range", count);
        }
    }
}
