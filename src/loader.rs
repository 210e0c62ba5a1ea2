//! Reading logged `.npy` histories into seed-batch tables.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use ndarray::{Array, Array1, Array2, ArrayD, Dimension, Ix1};
use ndarray_npy::{read_npy, ReadNpyError};
use tracing::debug;

use crate::error::{PlotError, Result};

/// `{dir}/{algorithm}_{metric}_{seed}_{uid}.npy`
pub fn series_path(dir: &Path, algorithm: &str, metric: &str, seed: u32, uid: &str) -> PathBuf {
    dir.join(format!("{}_{}_{}_{}.npy", algorithm, metric, seed, uid))
}

/// `{dir}/{name}_{uid}.npy`, used for run-wide scalars.
pub fn scalar_path(dir: &Path, name: &str, uid: &str) -> PathBuf {
    dir.join(format!("{}_{}.npy", name, uid))
}

/// Reads an array stored as f64, f32 or i64 and widens it to f64.
fn read_widened<D: Dimension>(path: &Path) -> Result<Array<f64, D>> {
    if !path.is_file() {
        return Err(PlotError::MissingFile {
            path: path.to_path_buf(),
        });
    }
    let wrap = |source: ReadNpyError| PlotError::Npy {
        path: path.to_path_buf(),
        source,
    };

    match read_npy::<_, Array<f64, D>>(path) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return other.map_err(wrap),
    }
    match read_npy::<_, Array<f32, D>>(path) {
        Err(ReadNpyError::WrongDescriptor(_)) => {}
        other => return other.map(|a| a.mapv(f64::from)).map_err(wrap),
    }
    read_npy::<_, Array<i64, D>>(path)
        .map(|a| a.mapv(|v| v as f64))
        .map_err(wrap)
}

pub fn load_series(path: &Path) -> Result<Array1<f64>> {
    let series = read_widened::<Ix1>(path)?;
    debug!(path = %path.display(), len = series.len(), "loaded series");
    Ok(series)
}

/// Loads a single number saved as a 0-d (or one-element) array.
pub fn load_scalar(dir: &Path, name: &str, uid: &str) -> Result<f64> {
    let path = scalar_path(dir, name, uid);
    let value: ArrayD<f64> = read_widened(&path)?;
    match value.iter().next() {
        Some(&v) if value.len() == 1 => {
            debug!(path = %path.display(), value = v, "loaded scalar");
            Ok(v)
        }
        _ => Err(PlotError::ShapeMismatch {
            path,
            expected: 1,
            found: value.len(),
        }),
    }
}

/// Iterations at which metrics were logged: `0, interval, ...` below `num_iterations`.
pub fn logging_iterations(num_iterations: f64, logging_interval: f64) -> Result<Array1<f64>> {
    if !(logging_interval > 0.0) {
        return Err(PlotError::InvalidLoggingInterval(logging_interval));
    }
    Ok(Array1::range(0.0, num_iterations, logging_interval))
}

/// Loads every `(metric, seed)` history of one algorithm run into a
/// `metric -> (seeds x samples)` map.
///
/// The sample count comes from the first metric of the first seed; any
/// later history of a different length is rejected.
pub fn read_files<S: AsRef<str>>(
    dir: &Path,
    algorithm: &str,
    metrics: &[S],
    seeds: &[u32],
    uid: &str,
) -> Result<HashMap<String, Array2<f64>>> {
    let first_metric = metrics
        .first()
        .ok_or(PlotError::EmptySelection("metric"))?;
    let first_seed = *seeds.first().ok_or(PlotError::EmptySelection("seed"))?;

    let first = load_series(&series_path(
        dir,
        algorithm,
        first_metric.as_ref(),
        first_seed,
        uid,
    ))?;
    let num_data = first.len();

    let mut result = HashMap::with_capacity(metrics.len());
    for metric in metrics {
        let metric = metric.as_ref();
        let mut table = Array2::zeros((seeds.len(), num_data));
        for (seed_idx, &seed) in seeds.iter().enumerate() {
            let path = series_path(dir, algorithm, metric, seed, uid);
            let series = load_series(&path)?;
            if series.len() != num_data {
                return Err(PlotError::ShapeMismatch {
                    path,
                    expected: num_data,
                    found: series.len(),
                });
            }
            table.row_mut(seed_idx).assign(&series);
        }
        result.insert(metric.to_string(), table);
    }
    Ok(result)
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use ndarray::{arr0, array};
    use ndarray_npy::write_npy;

    pub(crate) fn unique_dir(name: &str) -> PathBuf {
        let mut path = std::env::temp_dir();
        path.push(format!(
            "gmm_plot_{}_{}",
            name,
            std::time::SystemTime::now()
                .duration_since(std::time::UNIX_EPOCH)
                .unwrap()
                .as_nanos()
        ));
        std::fs::create_dir_all(&path).unwrap();
        path
    }

    #[test]
    fn paths_follow_the_naming_template() {
        let dir = Path::new("/data/runs");
        assert_eq!(
            series_path(dir, "ww_0-8", "q_grad_std_history", 3, "179b8125"),
            PathBuf::from("/data/runs/ww_0-8_q_grad_std_history_3_179b8125.npy")
        );
        assert_eq!(
            scalar_path(dir, "logging_interval", "3319b6a9"),
            PathBuf::from("/data/runs/logging_interval_3319b6a9.npy")
        );
    }

    #[test]
    fn read_files_stacks_one_row_per_seed() {
        let dir = unique_dir("stack");
        let seeds = [1, 2, 3];
        for &seed in &seeds {
            let offset = seed as f64;
            write_npy(
                series_path(&dir, "ws", "loss", seed, "abc"),
                &array![offset, offset + 10.0, offset + 20.0, offset + 30.0],
            )
            .unwrap();
            write_npy(
                series_path(&dir, "ws", "grad", seed, "abc"),
                &array![-offset, -offset, -offset, -offset],
            )
            .unwrap();
        }

        let tables = read_files(&dir, "ws", &["loss", "grad"], &seeds, "abc").unwrap();
        assert_eq!(tables.len(), 2);

        let loss = &tables["loss"];
        assert_eq!(loss.dim(), (3, 4));
        assert_eq!(loss.row(1), array![2.0, 12.0, 22.0, 32.0]);
        assert_eq!(tables["grad"].column(0), array![-1.0, -2.0, -3.0]);
    }

    #[test]
    fn missing_seed_file_is_an_error() {
        let dir = unique_dir("missing");
        write_npy(series_path(&dir, "relax", "m", 1, "u"), &array![1.0, 2.0]).unwrap();

        let err = read_files(&dir, "relax", &["m"], &[1, 2], "u").unwrap_err();
        match err {
            PlotError::MissingFile { path } => {
                assert_eq!(path, series_path(&dir, "relax", "m", 2, "u"));
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn unequal_seed_lengths_are_rejected() {
        let dir = unique_dir("ragged");
        write_npy(series_path(&dir, "vimco", "m", 1, "u"), &array![1.0, 2.0, 3.0]).unwrap();
        write_npy(series_path(&dir, "vimco", "m", 2, "u"), &array![1.0, 2.0]).unwrap();

        let err = read_files(&dir, "vimco", &["m"], &[1, 2], "u").unwrap_err();
        assert!(matches!(
            err,
            PlotError::ShapeMismatch {
                expected: 3,
                found: 2,
                ..
            }
        ));
    }

    #[test]
    fn empty_selections_are_rejected() {
        let dir = unique_dir("empty");
        let no_metrics: [&str; 0] = [];
        assert!(matches!(
            read_files(&dir, "ws", &no_metrics, &[1], "u"),
            Err(PlotError::EmptySelection("metric"))
        ));
        assert!(matches!(
            read_files(&dir, "ws", &["m"], &[], "u"),
            Err(PlotError::EmptySelection("seed"))
        ));
    }

    #[test]
    fn integer_and_single_precision_files_are_widened() {
        let dir = unique_dir("widen");
        write_npy(series_path(&dir, "ws", "m", 1, "u"), &array![1.5f32, 2.5]).unwrap();
        write_npy(series_path(&dir, "ws", "m", 2, "u"), &array![3i64, 4]).unwrap();

        let tables = read_files(&dir, "ws", &["m"], &[1, 2], "u").unwrap();
        assert_eq!(tables["m"], array![[1.5, 2.5], [3.0, 4.0]]);
    }

    #[test]
    fn scalars_and_logging_axis() {
        let dir = unique_dir("scalars");
        write_npy(scalar_path(&dir, "num_iterations", "u"), &arr0(100i64)).unwrap();
        write_npy(scalar_path(&dir, "logging_interval", "u"), &arr0(25i64)).unwrap();

        let n = load_scalar(&dir, "num_iterations", "u").unwrap();
        let interval = load_scalar(&dir, "logging_interval", "u").unwrap();
        assert_eq!(n, 100.0);

        let x = logging_iterations(n, interval).unwrap();
        assert_eq!(x, array![0.0, 25.0, 50.0, 75.0]);
    }

    #[test]
    fn non_positive_interval_is_rejected() {
        assert!(matches!(
            logging_iterations(100.0, 0.0),
            Err(PlotError::InvalidLoggingInterval(_))
        ));
    }
}
