use ndarray::{Array1, Array2, Axis};

/// Percentile `q` (0..=100) of an ascending slice, interpolating linearly
/// between the two closest ranks. NaN for an empty slice.
pub fn percentile(sorted: &[f64], q: f64) -> f64 {
    match sorted.len() {
        0 => f64::NAN,
        1 => sorted[0],
        n => {
            let rank = (q / 100.0).clamp(0.0, 1.0) * (n - 1) as f64;
            let lo = rank.floor() as usize;
            let hi = rank.ceil() as usize;
            sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
        }
    }
}

/// Median and interquartile range of a seed batch at every logged step.
#[derive(Debug, Clone, PartialEq)]
pub struct Band {
    pub median: Array1<f64>,
    pub lower: Array1<f64>,
    pub upper: Array1<f64>,
}

impl Band {
    /// Reduces a `(seeds x samples)` table over the seed axis. NaN entries
    /// are dropped per column.
    pub fn from_table(series_by_seed: &Array2<f64>) -> Self {
        let samples = series_by_seed.ncols();
        let mut median = Array1::zeros(samples);
        let mut lower = Array1::zeros(samples);
        let mut upper = Array1::zeros(samples);

        for (i, column) in series_by_seed.axis_iter(Axis(1)).enumerate() {
            let mut values: Vec<f64> = column.iter().copied().filter(|v| !v.is_nan()).collect();
            values.sort_by(|a, b| a.total_cmp(b));
            median[i] = percentile(&values, 50.0);
            lower[i] = percentile(&values, 25.0);
            upper[i] = percentile(&values, 75.0);
        }

        Self {
            median,
            lower,
            upper,
        }
    }

    pub fn len(&self) -> usize {
        self.median.len()
    }

    pub fn is_empty(&self) -> bool {
        self.median.is_empty()
    }

    /// Smallest lower quartile and largest upper quartile, ignoring
    /// non-finite values and, when `positive_only`, anything `<= 0`.
    pub fn y_bounds(&self, positive_only: bool) -> Option<(f64, f64)> {
        let keep = |v: &f64| v.is_finite() && (!positive_only || *v > 0.0);
        let lo = self
            .lower
            .iter()
            .chain(self.median.iter())
            .copied()
            .filter(keep)
            .fold(f64::INFINITY, f64::min);
        let hi = self
            .upper
            .iter()
            .chain(self.median.iter())
            .copied()
            .filter(keep)
            .fold(f64::NEG_INFINITY, f64::max);
        (lo <= hi).then_some((lo, hi))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_abs_diff_eq;
    use ndarray::{array, Array};
    use ndarray_rand::rand_distr::Uniform;
    use ndarray_rand::RandomExt;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn constant_seeds_give_a_zero_width_band() {
        let table = Array2::from_elem((10, 6), 0.125);
        let band = Band::from_table(&table);
        assert_eq!(band.len(), 6);
        assert_eq!(band.median, band.lower);
        assert_eq!(band.median, band.upper);
        assert!(band.median.iter().all(|&v| v == 0.125));
    }

    #[test]
    fn five_seeds_quartiles() {
        let table = array![[1.0], [2.0], [3.0], [4.0], [5.0]];
        let band = Band::from_table(&table);
        assert_eq!(band.median[0], 3.0);
        assert_eq!(band.lower[0], 2.0);
        assert_eq!(band.upper[0], 4.0);
    }

    #[test]
    fn seed_order_does_not_matter() {
        let table = array![[5.0, 0.0], [1.0, 0.0], [4.0, 1.0], [2.0, 0.0], [3.0, 0.0]];
        let band = Band::from_table(&table);
        assert_eq!(band.median, array![3.0, 0.0]);
        assert_eq!(band.lower, array![2.0, 0.0]);
        assert_eq!(band.upper, array![4.0, 0.0]);
    }

    #[test]
    fn percentile_interpolates_between_ranks() {
        let sorted = [1.0, 2.0, 3.0, 4.0];
        assert_abs_diff_eq!(percentile(&sorted, 50.0), 2.5);
        assert_abs_diff_eq!(percentile(&sorted, 25.0), 1.75);
        assert_abs_diff_eq!(percentile(&sorted, 75.0), 3.25);
        assert_abs_diff_eq!(percentile(&sorted, 0.0), 1.0);
        assert_abs_diff_eq!(percentile(&sorted, 100.0), 4.0);
        assert!(percentile(&[], 50.0).is_nan());
    }

    #[test]
    fn nan_samples_are_ignored() {
        let table = array![[1.0, f64::NAN], [f64::NAN, f64::NAN], [3.0, f64::NAN]];
        let band = Band::from_table(&table);
        assert_eq!(band.median[0], 2.0);
        assert!(band.median[1].is_nan());
    }

    #[test]
    fn quartiles_bracket_the_median() {
        let mut rng = StdRng::seed_from_u64(42);
        let table = Array::random_using((10, 200), Uniform::new(1e-3, 10.0), &mut rng);
        let band = Band::from_table(&table);
        for i in 0..band.len() {
            assert!(band.lower[i] <= band.median[i]);
            assert!(band.median[i] <= band.upper[i]);
        }
        let (lo, hi) = band.y_bounds(true).unwrap();
        assert!(lo > 0.0 && lo <= hi);
    }

    #[test]
    fn y_bounds_skip_non_positive_values_on_request() {
        let band = Band::from_table(&array![[0.0, 2.0], [0.0, 4.0]]);
        assert_eq!(band.y_bounds(false), Some((0.0, 3.5)));
        assert_eq!(band.y_bounds(true), Some((2.5, 3.5)));

        let empty = Band::from_table(&Array2::zeros((3, 0)));
        assert!(empty.is_empty());
        assert_eq!(empty.y_bounds(false), None);
    }
}
