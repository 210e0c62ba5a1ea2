//! Fixed setup of the published GMM figure: runs, algorithms and layout.

use std::path::PathBuf;

use plotters::style::RGBColor;

use crate::figure::{LineStyle, SeriesStyle};

pub const DEFAULT_WORKING_DIR: &str = "working";
pub const WORKING_DIR_ENV: &str = "WORKING_DIR";
pub const OUTPUT_PATH: &str = "results/plot_paper.svg";

/// matplotlib's default "tab10" cycle, `C0` to `C9`.
pub const TAB10: [RGBColor; 10] = [
    RGBColor(31, 119, 180),
    RGBColor(255, 127, 14),
    RGBColor(44, 160, 44),
    RGBColor(214, 39, 40),
    RGBColor(148, 103, 189),
    RGBColor(140, 86, 75),
    RGBColor(227, 119, 194),
    RGBColor(127, 127, 127),
    RGBColor(188, 189, 34),
    RGBColor(23, 190, 207),
];

const RELAXED_METRICS: [&str; 3] = [
    "prior_l2_history",
    "true_posterior_l2_history",
    "inference_network_grad_phi_std_history",
];

const IWAE_METRICS: [&str; 3] = [
    "p_mixture_probs_norm_history",
    "true_posterior_norm_history",
    "q_grad_std_history",
];

/// Which UID column of an experiment group an algorithm's files are tagged with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UidFamily {
    Shared,
    Concrete,
    Reinforce,
    Relax,
}

/// All runs sharing one particle count.
#[derive(Debug, Clone)]
pub struct ExperimentGroup {
    pub num_particles: usize,
    pub uid: String,
    pub concrete_uid: String,
    pub reinforce_uid: String,
    pub relax_uid: String,
}

impl ExperimentGroup {
    pub fn uid_for(&self, family: UidFamily) -> &str {
        match family {
            UidFamily::Shared => &self.uid,
            UidFamily::Concrete => &self.concrete_uid,
            UidFamily::Reinforce => &self.reinforce_uid,
            UidFamily::Relax => &self.relax_uid,
        }
    }

    pub fn title(&self) -> String {
        format!("K = {}", self.num_particles)
    }
}

#[derive(Debug, Clone)]
pub struct MetricRow {
    pub y_label: String,
    pub log_y: bool,
}

/// One plotted gradient estimator. `metrics[i]` feeds row `i`.
#[derive(Debug, Clone)]
pub struct Algorithm {
    pub prefix: String,
    pub metrics: Vec<String>,
    pub uid_family: UidFamily,
    pub style: SeriesStyle,
}

impl Algorithm {
    pub fn new(
        prefix: &str,
        metrics: &[&str],
        uid_family: UidFamily,
        label: &str,
        color: RGBColor,
        line: LineStyle,
    ) -> Self {
        Self {
            prefix: prefix.to_string(),
            metrics: metrics.iter().map(|m| m.to_string()).collect(),
            uid_family,
            style: SeriesStyle::new(label, color, line),
        }
    }

    /// Wake-wake with the given q-mixture probability; files are tagged
    /// `ww_1-0`, `ww_0-8`, ...
    pub fn wake_wake(q_mixture_prob: f64, color: RGBColor) -> Self {
        let prefix = format!("ww_{}", format!("{:?}", q_mixture_prob).replace('.', "-"));
        let label = if q_mixture_prob == 1.0 { "WW" } else { "δ-WW" };
        Self::new(
            &prefix,
            &IWAE_METRICS,
            UidFamily::Shared,
            label,
            color,
            LineStyle::Solid,
        )
    }
}

#[derive(Debug, Clone)]
pub struct PlotConfig {
    pub working_dir: PathBuf,
    pub output_path: PathBuf,
    pub seeds: Vec<u32>,
    pub groups: Vec<ExperimentGroup>,
    pub rows: Vec<MetricRow>,
    pub algorithms: Vec<Algorithm>,
    pub size: (u32, u32),
    pub legend_height: u32,
}

impl PlotConfig {
    pub fn paper() -> Self {
        let uids = ["3319b6a9", "03ee5995", "179b8125", "871c4fce"];
        let concrete_uids = ["eaf03c8b", "7da5406d", "2c000794", "5b1962a9"];
        let reinforce_uids = ["9b28ea68", "f6ebee25", "e520c68c", "4c1be354"];
        let relax_uids = ["e24618b3", "a91304d3", "a3dfe440", "3b3475dc"];
        let num_particles = [2, 5, 10, 20];

        let groups = (0..uids.len())
            .map(|i| ExperimentGroup {
                num_particles: num_particles[i],
                uid: uids[i].to_string(),
                concrete_uid: concrete_uids[i].to_string(),
                reinforce_uid: reinforce_uids[i].to_string(),
                relax_uid: relax_uids[i].to_string(),
            })
            .collect();

        let rows = vec![
            MetricRow {
                y_label: "‖p_θ(z) − p_θtrue(z)‖".to_string(),
                log_y: true,
            },
            MetricRow {
                y_label: "Avg. test ‖q_φ(z|x) − p_θtrue(z|x)‖".to_string(),
                log_y: true,
            },
            MetricRow {
                y_label: "Std. of φ gradient est.".to_string(),
                log_y: true,
            },
        ];

        let mut algorithms = vec![
            Algorithm::new(
                "concrete",
                &RELAXED_METRICS,
                UidFamily::Concrete,
                "Concrete",
                TAB10[0],
                LineStyle::Dashed,
            ),
            Algorithm::new(
                "relax",
                &RELAXED_METRICS,
                UidFamily::Relax,
                "RELAX",
                TAB10[3],
                LineStyle::Dashed,
            ),
            Algorithm::new(
                "iwae_reinforce",
                &IWAE_METRICS,
                UidFamily::Reinforce,
                "REINFORCE",
                TAB10[4],
                LineStyle::Dashed,
            ),
            Algorithm::new(
                "iwae_vimco",
                &IWAE_METRICS,
                UidFamily::Shared,
                "VIMCO",
                TAB10[5],
                LineStyle::Dashed,
            ),
            Algorithm::new(
                "ws",
                &IWAE_METRICS,
                UidFamily::Shared,
                "WS",
                TAB10[1],
                LineStyle::Solid,
            ),
        ];
        for (idx, q_mixture_prob) in [1.0, 0.8].into_iter().enumerate() {
            algorithms.push(Algorithm::wake_wake(q_mixture_prob, TAB10[idx + 6]));
        }

        Self {
            working_dir: working_dir_from_env(),
            output_path: PathBuf::from(OUTPUT_PATH),
            seeds: (1..=10).collect(),
            groups,
            rows,
            algorithms,
            size: (1100, 640),
            legend_height: 40,
        }
    }
}

pub fn working_dir_from_env() -> PathBuf {
    std::env::var_os(WORKING_DIR_ENV)
        .map(PathBuf::from)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_WORKING_DIR))
}
