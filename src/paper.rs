//! Builds the comparison figure: one column per particle count, one row per
//! metric, one band per algorithm in every panel.

use indicatif::{ProgressBar, ProgressStyle};
use tracing::info;

use crate::config::PlotConfig;
use crate::error::{PlotError, Result};
use crate::figure::{plot_band, Figure};
use crate::loader::{load_scalar, logging_iterations, read_files};

const PROGRESS_TEMPLATE: &str = "[{elapsed_precise}] {bar:40.cyan/blue} {pos}/{len} {msg}";

fn progress_style(template: &str) -> Result<ProgressStyle> {
    Ok(ProgressStyle::default_bar()
        .template(template)?
        .progress_chars("##-"))
}

pub fn build_figure(config: &PlotConfig) -> Result<Figure> {
    let dir = config.working_dir.as_path();
    let first = config
        .groups
        .first()
        .ok_or(PlotError::EmptySelection("experiment group"))?;

    let num_iterations = load_scalar(dir, "num_iterations", &first.uid)?;
    let logging_interval = load_scalar(dir, "logging_interval", &first.uid)?;
    let x = logging_iterations(num_iterations, logging_interval)?;
    info!(
        num_iterations,
        logging_interval,
        points = x.len(),
        "built logging axis"
    );

    let rows = config.rows.len();
    let cols = config.groups.len();
    for algorithm in &config.algorithms {
        if algorithm.metrics.len() != rows {
            return Err(PlotError::MetricCountMismatch {
                algorithm: algorithm.prefix.clone(),
                metrics: algorithm.metrics.len(),
                rows,
            });
        }
    }

    let mut figure = Figure::new(rows, cols, config.size, config.legend_height);
    figure.set_x_end(num_iterations);

    for (row, metric_row) in config.rows.iter().enumerate() {
        figure.set_log_y(row, metric_row.log_y);
        figure.panel_mut(row, 0).y_label = Some(metric_row.y_label.clone());
    }
    if rows > 0 {
        for (col, group) in config.groups.iter().enumerate() {
            figure.panel_mut(0, col).title = Some(group.title());
            figure.panel_mut(rows - 1, col).x_label = Some("Iteration".to_string());
        }
    }

    let progress_bar = ProgressBar::new((cols * config.algorithms.len()) as u64);
    progress_bar.set_style(progress_style(PROGRESS_TEMPLATE)?);

    for (col, group) in config.groups.iter().enumerate() {
        info!(particles = group.num_particles, uid = %group.uid, "loading experiment group");
        for algorithm in &config.algorithms {
            let uid = group.uid_for(algorithm.uid_family);
            progress_bar.set_message(format!("{} K={}", algorithm.style.label, group.num_particles));

            let tables = read_files(dir, &algorithm.prefix, &algorithm.metrics, &config.seeds, uid)?;
            for (row, metric) in algorithm.metrics.iter().enumerate() {
                let table = tables
                    .get(metric)
                    .ok_or_else(|| PlotError::MissingMetric(metric.clone()))?;
                plot_band(&x, table, figure.panel_mut(row, col), &algorithm.style)?;
            }
            progress_bar.inc(1);
        }
    }
    progress_bar.finish_with_message("all runs loaded");

    Ok(figure)
}
