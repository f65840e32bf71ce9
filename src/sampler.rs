//! Sampler
//!
//! Per-worker randomness for forest training: bootstrap subsampling, honest
//! sample splitting, and the candidate-variable draws made at every node.
//! Each training worker owns one sampler, seeded deterministically, so runs
//! reproduce at any thread count.
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

pub struct RandomSampler {
    rng: StdRng,
}

impl RandomSampler {
    pub fn new(seed: u64) -> Self {
        RandomSampler {
            rng: StdRng::seed_from_u64(seed),
        }
    }

    /// Draw `ceil(fraction * num_samples)` of the dense ids `[0, num_samples)`
    /// without replacement. Returns the pair (chosen, excluded).
    pub fn sample(&mut self, num_samples: usize, fraction: f64) -> (Vec<usize>, Vec<usize>) {
        let all: Vec<usize> = (0..num_samples).collect();
        self.subsample(&all, fraction)
    }

    /// Randomly partition `samples` in two: the first `ceil(fraction * n)`
    /// entries of a shuffle are chosen, the remainder excluded.
    pub fn subsample(&mut self, samples: &[usize], fraction: f64) -> (Vec<usize>, Vec<usize>) {
        let mut shuffled = samples.to_vec();
        self.shuffle(&mut shuffled);
        let num_chosen = ((samples.len() as f64 * fraction).ceil() as usize).min(samples.len());
        let excluded = shuffled.split_off(num_chosen);
        (shuffled, excluded)
    }

    /// A Poisson draw by Knuth's multiplication method. Means here are
    /// mtry-sized, so the running product stays far from underflow.
    pub fn sample_poisson(&mut self, mean: usize) -> usize {
        let l = (-(mean as f64)).exp();
        let mut k: usize = 0;
        let mut p = 1.0;
        loop {
            k += 1;
            p *= self.rng.random::<f64>();
            if p <= l {
                return k - 1;
            }
        }
    }

    /// Append `num_draws` distinct ids from `[0, max)` to `result`, skipping
    /// ids in `skip` and ids already present in `result`. Draws fewer when
    /// the candidate pool runs out.
    pub fn draw_without_replacement_skip(
        &mut self,
        result: &mut Vec<usize>,
        max: usize,
        skip: &[usize],
        num_draws: usize,
    ) {
        let mut candidates: Vec<usize> = (0..max)
            .filter(|v| !skip.contains(v) && !result.contains(v))
            .collect();
        let num_draws = num_draws.min(candidates.len());
        for i in 0..num_draws {
            let j = self.rng.random_range(i..candidates.len());
            candidates.swap(i, j);
            result.push(candidates[i]);
        }
    }

    /// Append `num_draws` distinct entries of `values` to `result`, drawn
    /// proportionally to `weights` by inverse-CDF sampling with duplicate
    /// rejection. Zero-weight entries are never drawn; a non-positive total
    /// weight draws nothing.
    pub fn draw_without_replacement_weighted(
        &mut self,
        result: &mut Vec<usize>,
        values: &[usize],
        num_draws: usize,
        weights: &[f64],
    ) {
        assert_eq!(values.len(), weights.len());
        let total: f64 = weights.iter().sum();
        if !(total > 0.0) {
            return;
        }
        let mut cumulative = Vec::with_capacity(weights.len());
        let mut acc = 0.0;
        for w in weights.iter() {
            acc += w;
            cumulative.push(acc);
        }

        let drawable = values
            .iter()
            .zip(weights.iter())
            .filter(|(v, w)| **w > 0.0 && !result.contains(v))
            .count();
        let num_draws = num_draws.min(drawable);

        let mut selected = vec![false; values.len()];
        let mut drawn = 0;
        while drawn < num_draws {
            let target = self.rng.random::<f64>() * total;
            let idx = cumulative.partition_point(|c| *c <= target).min(values.len() - 1);
            if selected[idx] || result.contains(&values[idx]) {
                continue;
            }
            selected[idx] = true;
            result.push(values[idx]);
            drawn += 1;
        }
    }

    // Fisher-Yates
    fn shuffle(&mut self, values: &mut [usize]) {
        for i in (1..values.len()).rev() {
            let j = self.rng.random_range(0..=i);
            values.swap(i, j);
        }
    }
}
