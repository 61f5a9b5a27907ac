use std::{io::Write, path::Path};

use anyhow::{Context, Result};

use crate::{common::SvgWriter, plot::frame::Frame};

/// Five-number summary drawn as one box.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxStats {
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    /// Most extreme values within 1.5 IQR of the box.
    pub whisker_low: f64,
    pub whisker_high: f64,
}

impl BoxStats {
    /// Quartiles use linear interpolation between order statistics. NaN values
    /// are ignored; None for an empty sample.
    pub fn from_values(values: &[f64]) -> Option<Self> {
        let mut sorted = values.iter().copied().filter(|v| !v.is_nan()).collect::<Vec<_>>();
        if sorted.is_empty() { return None }
        sorted.sort_unstable_by(f64::total_cmp);

        let (q1, median, q3) = (quantile(&sorted, 0.25), quantile(&sorted, 0.5), quantile(&sorted, 0.75));
        let reach = 1.5 * (q3 - q1);
        let whisker_low = sorted.iter().copied().find(|&v| v >= q1 - reach).unwrap_or(q1);
        let whisker_high = sorted.iter().rev().copied().find(|&v| v <= q3 + reach).unwrap_or(q3);

        Some(Self { q1, median, q3, whisker_low, whisker_high })
    }
}

/// Quantile `p` of a sorted, non-empty sample.
fn quantile(sorted: &[f64], p: f64) -> f64 {
    let position = p * (sorted.len() - 1) as f64;
    let (below, fraction) = (position.floor() as usize, position.fract());
    match sorted.get(below + 1) {
        Some(&above) => sorted[below] + (above - sorted[below]) * fraction,
        None => sorted[below],
    }
}

/// Side-by-side boxes for the same quantity at each position (e.g. sorted district),
/// with an optional guide line and a marker per position.
#[derive(Clone, Debug)]
pub struct BoxPlot {
    title: String,
    x_label: String,
    y_label: String,
    positions: Vec<Vec<f64>>,
    markers: Option<Vec<f64>>,
    guide: Option<f64>,
    y_range: (f64, f64),
}

impl BoxPlot {
    /// Build from one row per sample; every row holds a value for each position.
    pub fn from_rows(title: &str, rows: &[Vec<f64>]) -> Self {
        let width = rows.first().map_or(0, Vec::len);
        assert!(rows.iter().all(|row| row.len() == width), "every row must have the same number of positions");

        Self {
            title: title.to_string(),
            x_label: String::new(),
            y_label: String::new(),
            positions: (0..width).map(|i| rows.iter().map(|row| row[i]).collect()).collect(),
            markers: None,
            guide: None,
            y_range: (0.0, 1.0),
        }
    }

    pub fn with_labels(mut self, x_label: &str, y_label: &str) -> Self {
        self.x_label = x_label.to_string();
        self.y_label = y_label.to_string();
        self
    }

    /// Highlight one value per position (drawn as red dots).
    pub fn with_markers(mut self, markers: Vec<f64>) -> Self {
        assert!(markers.len() == self.positions.len(), "one marker per position");
        self.markers = Some(markers);
        self
    }

    /// Horizontal guide line at `y`.
    pub fn with_guide(mut self, y: f64) -> Self {
        self.guide = Some(y);
        self
    }

    pub fn with_y_range(mut self, min: f64, max: f64) -> Self {
        self.y_range = (min, max);
        self
    }

    #[inline] pub fn num_positions(&self) -> usize { self.positions.len() }

    /// Box statistics for each position.
    pub fn stats(&self) -> Vec<Option<BoxStats>> {
        self.positions.iter().map(|values| BoxStats::from_values(values)).collect()
    }

    pub fn write_svg(&self, path: &Path) -> Result<()> {
        let mut svg = SvgWriter::new(path)?;
        self.render(&mut svg)
            .with_context(|| format!("[plot::boxplot] Failed to write {}", path.display()))
    }

    fn render(&self, svg: &mut SvgWriter) -> Result<()> {
        let count = self.positions.len();
        let frame = Frame::new((0.5, count as f64 + 0.5), self.y_range);
        frame.begin(svg, &self.title)?;

        if let Some(y) = self.guide {
            writeln!(svg, r#"<line class="guide" x1="{:.2}" y1="{y:.2}" x2="{:.2}" y2="{y:.2}"/>"#,
                frame.left(), frame.right(), y = frame.y.map(y))?;
        }

        let half_width = 0.3 * (frame.x.map(1.0) - frame.x.map(0.0));
        for (i, stats) in self.stats().into_iter().enumerate() {
            let Some(stats) = stats else { continue };
            let x = frame.x.map(i as f64 + 1.0);
            let (low, q1, median, q3, high) = (
                frame.y.map(stats.whisker_low), frame.y.map(stats.q1), frame.y.map(stats.median),
                frame.y.map(stats.q3), frame.y.map(stats.whisker_high),
            );

            writeln!(svg, r#"<line class="whisker" x1="{x:.2}" y1="{low:.2}" x2="{x:.2}" y2="{q1:.2}"/>"#)?;
            writeln!(svg, r#"<line class="whisker" x1="{x:.2}" y1="{q3:.2}" x2="{x:.2}" y2="{high:.2}"/>"#)?;
            for cap in [low, high] {
                writeln!(svg, r#"<line class="whisker" x1="{:.2}" y1="{cap:.2}" x2="{:.2}" y2="{cap:.2}"/>"#,
                    x - half_width / 2.0, x + half_width / 2.0)?;
            }
            writeln!(svg, r#"<rect class="box" x="{:.2}" y="{q3:.2}" width="{:.2}" height="{:.2}"/>"#,
                x - half_width, 2.0 * half_width, q1 - q3)?;
            writeln!(svg, r#"<line class="median" x1="{:.2}" y1="{median:.2}" x2="{:.2}" y2="{median:.2}"/>"#,
                x - half_width, x + half_width)?;
        }

        if let Some(markers) = &self.markers {
            for (i, &value) in markers.iter().enumerate().filter(|(_, v)| !v.is_nan()) {
                writeln!(svg, r#"<circle class="marker" cx="{:.2}" cy="{:.2}" r="3"/>"#,
                    frame.x.map(i as f64 + 1.0), frame.y.map(value))?;
            }
        }

        frame.write_axes(svg, &self.x_label, &self.y_label, 6)?;
        let step = if count <= 20 { 1 } else { 5 };
        for position in (1..=count).filter(|p| step == 1 || p % step == 0 || *p == 1) {
            frame.write_x_tick(svg, frame.x.map(position as f64), &position.to_string())?;
        }

        svg.write_footer()?;
        svg.flush()?;
        Ok(())
    }
}
