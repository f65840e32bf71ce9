//! Variance debiasing
//!
//! The bootstrap-of-little-bags between-group variance is inflated by
//! within-group noise. The straightforward correction `var_between -
//! group_noise` can go negative in small samples, so the estimate is run
//! through an objective-Bayes analysis of variance instead, which shrinks
//! toward zero without crossing it.
use crate::prediction::values::PredictionValues;

const ONE_OVER_SQRT_TWO_PI: f64 = 0.398_942_280_401_432_7;
const ONE_OVER_SQRT_TWO: f64 = std::f64::consts::FRAC_1_SQRT_2;

#[derive(Debug, Default)]
pub struct BayesDebiaser;

impl BayesDebiaser {
    pub fn debias(&self, var_between: f64, group_noise: f64, num_good_groups: f64) -> f64 {
        let initial_estimate = var_between - group_noise;
        let initial_se = var_between.max(group_noise) * (2.0 / num_good_groups).sqrt();
        // Zero spread in both components: nothing to shrink.
        if !(initial_se > 0.0) {
            return initial_estimate.max(0.0);
        }
        let ratio = initial_estimate / initial_se;

        // int_{-inf}^{ratio} x phi(x) dx for the standard Gaussian density.
        let numerator = (-ratio * ratio / 2.0).exp() * ONE_OVER_SQRT_TWO_PI;
        // int_{-inf}^{ratio} phi(x) dx.
        let denominator = 0.5 * erfc(-ratio * ONE_OVER_SQRT_TWO);

        let bayes_correction = initial_se * numerator / denominator;
        initial_estimate + bayes_correction
    }
}

/// Accumulate the group moments of one scalar component of the leaf
/// summaries and return its debiased variance. Groups with any empty leaf
/// slot are skipped; when every group is skipped the result is NaN, the
/// same data-driven signal as an empty prediction.
pub(crate) fn debiased_group_variance(
    leaf_values: &PredictionValues,
    value_type: usize,
    dim: usize,
    average: f64,
    ci_group_size: usize,
    debiaser: &BayesDebiaser,
) -> f64 {
    let num_groups = leaf_values.get_num_nodes() / ci_group_size;

    let mut num_good_groups = 0.0;
    let mut psi_squared = 0.0;
    let mut psi_grouped_squared = 0.0;

    for group in 0..num_groups {
        let good_group = (0..ci_group_size).all(|j| !leaf_values.empty(group * ci_group_size + j));
        if !good_group {
            continue;
        }
        num_good_groups += 1.0;

        let mut group_psi = 0.0;
        for j in 0..ci_group_size {
            let i = group * ci_group_size + j;
            let psi = *leaf_values.get(i, value_type).get(0, dim) - average;
            psi_squared += psi * psi;
            group_psi += psi;
        }
        group_psi /= ci_group_size as f64;
        psi_grouped_squared += group_psi * group_psi;
    }

    let var_between = psi_grouped_squared / num_good_groups;
    let var_total = psi_squared / (num_good_groups * ci_group_size as f64);

    // The amount by which var_between is inflated by using small groups.
    let group_noise = (var_total - var_between) / (ci_group_size as f64 - 1.0);

    debiaser.debias(var_between, group_noise, num_good_groups)
}

/// Complementary error function from the Abramowitz & Stegun 7.1.26
/// approximation of erf, maximum absolute error 1.5e-7.
fn erfc(x: f64) -> f64 {
    1.0 - erf(x)
}

fn erf(x: f64) -> f64 {
    let sign = if x < 0.0 { -1.0 } else { 1.0 };
    let x = x.abs();
    let t = 1.0 / (1.0 + 0.327_591_1 * x);
    let poly = t
        * (0.254_829_592
            + t * (-0.284_496_736 + t * (1.421_413_741 + t * (-1.453_152_027 + t * 1.061_405_429))));
    sign * (1.0 - poly * (-x * x).exp())
}
