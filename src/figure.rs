//! Band plots on a grid of panels, rendered to SVG with plotters.

use std::ops::Range;
use std::path::Path;

use ndarray::{Array1, Array2};
use plotters::coord::combinators::{BindKeyPoints, IntoLogRange, LogCoord};
use plotters::coord::ranged1d::{Ranged, ValueFormatter};
use plotters::coord::types::RangedCoordf64;
use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::series::DashedLineSeries;

use crate::error::{PlotError, Result};
use crate::stats::Band;

/// Opacity of the interquartile fill.
pub const BAND_ALPHA: f64 = 0.2;

const FONT: &str = "sans-serif";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LineStyle {
    Solid,
    Dashed,
}

#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub label: String,
    pub color: RGBColor,
    pub line: LineStyle,
    pub width: u32,
}

impl SeriesStyle {
    pub fn new(label: &str, color: RGBColor, line: LineStyle) -> Self {
        Self {
            label: label.to_string(),
            color,
            line,
            width: 2,
        }
    }
}

/// One median line plus its interquartile band.
#[derive(Debug, Clone)]
pub struct BandSeries {
    pub x: Array1<f64>,
    pub band: Band,
    pub style: SeriesStyle,
}

#[derive(Debug, Clone, Default)]
pub struct Panel {
    pub title: Option<String>,
    pub x_label: Option<String>,
    pub y_label: Option<String>,
    series: Vec<BandSeries>,
}

impl Panel {
    pub fn series(&self) -> &[BandSeries] {
        &self.series
    }

    fn x_bounds(&self) -> Option<(f64, f64)> {
        let (lo, hi) = self
            .series
            .iter()
            .flat_map(|s| s.x.iter().copied())
            .filter(|v| v.is_finite())
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), v| {
                (lo.min(v), hi.max(v))
            });
        (lo <= hi).then_some((lo, hi))
    }

    fn y_bounds(&self, positive_only: bool) -> Option<(f64, f64)> {
        self.series
            .iter()
            .filter_map(|s| s.band.y_bounds(positive_only))
            .reduce(|(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)))
    }
}

/// Computes the seed median and quartiles of `series_by_seed` and adds them
/// to `panel` as one styled line with a matching translucent band.
pub fn plot_band<'a>(
    x: &Array1<f64>,
    series_by_seed: &Array2<f64>,
    panel: &'a mut Panel,
    style: &SeriesStyle,
) -> Result<&'a mut Panel> {
    if x.len() != series_by_seed.ncols() {
        return Err(PlotError::AxisMismatch {
            x_len: x.len(),
            samples: series_by_seed.ncols(),
        });
    }
    panel.series.push(BandSeries {
        x: x.clone(),
        band: Band::from_table(series_by_seed),
        style: style.clone(),
    });
    Ok(panel)
}

/// A `rows x cols` grid of panels with a shared legend strip underneath.
/// Panels on the same row share their y range; all panels share x.
pub struct Figure {
    rows: usize,
    cols: usize,
    panels: Vec<Panel>,
    log_rows: Vec<bool>,
    x_end: Option<f64>,
    size: (u32, u32),
    legend_height: u32,
}

impl Figure {
    pub fn new(rows: usize, cols: usize, size: (u32, u32), legend_height: u32) -> Self {
        Self {
            rows,
            cols,
            panels: vec![Panel::default(); rows * cols],
            log_rows: vec![false; rows],
            x_end: None,
            size,
            legend_height,
        }
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn cols(&self) -> usize {
        self.cols
    }

    pub fn panel(&self, row: usize, col: usize) -> &Panel {
        &self.panels[row * self.cols + col]
    }

    pub fn panel_mut(&mut self, row: usize, col: usize) -> &mut Panel {
        &mut self.panels[row * self.cols + col]
    }

    pub fn set_log_y(&mut self, row: usize, log_y: bool) {
        self.log_rows[row] = log_y;
    }

    /// Extends the shared x axis to `end`, e.g. the full iteration count
    /// when the last logged step falls short of it.
    pub fn set_x_end(&mut self, end: f64) {
        self.x_end = Some(end);
    }

    /// One entry per label, in first-drawn order.
    pub fn legend_entries(&self) -> Vec<&SeriesStyle> {
        let mut entries: Vec<&SeriesStyle> = Vec::new();
        for series in self.panels.iter().flat_map(|p| p.series.iter()) {
            if !entries.iter().any(|e| e.label == series.style.label) {
                entries.push(&series.style);
            }
        }
        entries
    }

    pub fn x_range(&self) -> Range<f64> {
        let (lo, hi) = self
            .panels
            .iter()
            .filter_map(Panel::x_bounds)
            .reduce(|(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)))
            .unwrap_or((0.0, 1.0));
        let hi = self.x_end.map_or(hi, |end| hi.max(end));
        if hi > lo {
            lo..hi
        } else {
            lo..lo + 1.0
        }
    }

    /// Shared y range of one row, padded a little; positive on log rows.
    pub fn row_y_range(&self, row: usize) -> Range<f64> {
        let log_y = self.log_rows[row];
        let bounds = (0..self.cols)
            .filter_map(|col| self.panel(row, col).y_bounds(log_y))
            .reduce(|(a_lo, a_hi), (b_lo, b_hi)| (a_lo.min(b_lo), a_hi.max(b_hi)));

        match (bounds, log_y) {
            (Some((lo, hi)), true) => {
                let hi = if hi > lo { hi } else { lo * 10.0 };
                lo / 1.2..hi * 1.2
            }
            (Some((lo, hi)), false) => {
                let pad = if hi > lo { 0.05 * (hi - lo) } else { 0.5 * lo.abs().max(1.0) };
                lo - pad..hi + pad
            }
            (None, true) => 0.1..1.0,
            (None, false) => 0.0..1.0,
        }
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent)?;
            }
        }

        let root = SVGBackend::new(path, self.size).into_drawing_area();
        root.fill(&WHITE)?;
        let grid_height = self.size.1.saturating_sub(self.legend_height) as i32;
        let (grid, legend) = root.split_vertically(grid_height);

        let x_range = self.x_range();
        let cells = grid.split_evenly((self.rows, self.cols));
        for (idx, area) in cells.iter().enumerate() {
            let (row, col) = (idx / self.cols, idx % self.cols);
            let panel = self.panel(row, col);
            let y_range = self.row_y_range(row);
            if self.log_rows[row] {
                let y = LogCoord::from(y_range.log_scale());
                draw_panel(area, panel, x_range.clone(), y, format_log_tick)?;
            } else {
                let y = RangedCoordf64::from(y_range);
                draw_panel(area, panel, x_range.clone(), y, format_tick)?;
            }
        }

        self.draw_legend(&legend)?;
        root.present()?;
        Ok(())
    }

    fn draw_legend(&self, area: &DrawingArea<SVGBackend<'_>, Shift>) -> Result<()> {
        let entries = self.legend_entries();
        if entries.is_empty() {
            return Ok(());
        }
        let (width, height) = area.dim_in_pixel();
        let slot = (width as i32) / entries.len() as i32;
        let y = height as i32 / 2;

        for (i, style) in entries.iter().enumerate() {
            let x = i as i32 * slot + slot / 6;
            let stroke = ShapeStyle::from(&style.color).stroke_width(style.width);
            match style.line {
                LineStyle::Solid => {
                    area.draw(&PathElement::new(vec![(x, y), (x + 24, y)], stroke))?;
                }
                LineStyle::Dashed => {
                    for start in [x, x + 10, x + 20] {
                        area.draw(&PathElement::new(vec![(start, y), (start + 5, y)], stroke))?;
                    }
                }
            }
            area.draw(&Text::new(
                style.label.clone(),
                (x + 30, y - 6),
                (FONT, 12).into_font(),
            ))?;
        }
        Ok(())
    }
}

fn draw_panel<Y>(
    area: &DrawingArea<SVGBackend<'_>, Shift>,
    panel: &Panel,
    x_range: Range<f64>,
    y_coord: Y,
    y_format: fn(&f64) -> String,
) -> Result<()>
where
    Y: Ranged<ValueType = f64> + ValueFormatter<f64>,
{
    let (y_lo, y_hi) = {
        let range = y_coord.range();
        (range.start, range.end)
    };

    let mut builder = ChartBuilder::on(area);
    builder
        .margin(6)
        .x_label_area_size(if panel.x_label.is_some() { 34 } else { 18 })
        .y_label_area_size(if panel.y_label.is_some() { 62 } else { 40 });
    if let Some(title) = &panel.title {
        builder.caption(title, (FONT, 13));
    }
    // Ticks only at the two ends of the iteration axis.
    let x_ticks = vec![x_range.start, x_range.end];
    let mut chart = builder.build_cartesian_2d(x_range.with_key_points(x_ticks), y_coord)?;

    let mut mesh = chart.configure_mesh();
    mesh.disable_mesh()
        .y_labels(4)
        .x_label_formatter(&format_iteration)
        .y_label_formatter(&y_format)
        .label_style((FONT, 10))
        .axis_desc_style((FONT, 11));
    if let Some(label) = &panel.x_label {
        mesh.x_desc(label.as_str());
    }
    if let Some(label) = &panel.y_label {
        mesh.y_desc(label.as_str());
    }
    mesh.draw()?;

    let clamp = |v: f64| v.clamp(y_lo, y_hi);
    for series in &panel.series {
        let color = series.style.color;
        let band = &series.band;

        let mut outline: Vec<(f64, f64)> = Vec::with_capacity(band.len() * 2);
        for (i, &x) in series.x.iter().enumerate() {
            if x.is_finite() && band.upper[i].is_finite() && band.lower[i].is_finite() {
                outline.push((x, clamp(band.upper[i])));
            }
        }
        for (i, &x) in series.x.iter().enumerate().rev() {
            if x.is_finite() && band.upper[i].is_finite() && band.lower[i].is_finite() {
                outline.push((x, clamp(band.lower[i])));
            }
        }
        if outline.len() > 2 {
            chart.draw_series(std::iter::once(Polygon::new(
                outline,
                color.mix(BAND_ALPHA).filled(),
            )))?;
        }

        let line: Vec<(f64, f64)> = series
            .x
            .iter()
            .zip(band.median.iter())
            .filter(|(x, y)| x.is_finite() && y.is_finite())
            .map(|(&x, &y)| (x, clamp(y)))
            .collect();
        let stroke = ShapeStyle::from(&color).stroke_width(series.style.width);
        match series.style.line {
            LineStyle::Solid => {
                chart.draw_series(LineSeries::new(line, stroke))?;
            }
            LineStyle::Dashed => {
                chart.draw_series(DashedLineSeries::new(line, 6, 4, stroke))?;
            }
        }
    }
    Ok(())
}

fn format_iteration(v: &f64) -> String {
    if v.abs() >= 1000.0 {
        format!("{}k", (v / 1000.0).round())
    } else {
        format!("{}", v.round())
    }
}

fn format_tick(v: &f64) -> String {
    format!("{:.2}", v)
}

fn format_log_tick(v: &f64) -> String {
    format!("{:.0e}", v)
}
