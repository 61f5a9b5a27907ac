use std::{io::Write, path::Path};

use anyhow::{Context, Result};

use crate::{common::SvgWriter, plot::frame::{format_tick, Frame}};

const DEFAULT_BINS: usize = 10;

/// Histogram of a sample, optionally marking a reference value with a vertical line.
#[derive(Clone, Debug)]
pub struct Histogram {
    title: String,
    values: Vec<f64>,
    reference: Option<f64>,
    bins: usize,
    x_label: String,
}

impl Histogram {
    /// NaN values are dropped.
    pub fn new(title: &str, values: &[f64]) -> Self {
        Self {
            title: title.to_string(),
            values: values.iter().copied().filter(|v| !v.is_nan()).collect(),
            reference: None,
            bins: DEFAULT_BINS,
            x_label: String::new(),
        }
    }

    pub fn with_reference(mut self, reference: f64) -> Self {
        self.reference = Some(reference).filter(|r| r.is_finite());
        self
    }

    pub fn with_bins(mut self, bins: usize) -> Self {
        assert!(bins > 0, "a histogram needs at least one bin");
        self.bins = bins;
        self
    }

    pub fn with_x_label(mut self, label: &str) -> Self {
        self.x_label = label.to_string();
        self
    }

    #[inline] pub fn title(&self) -> &str { &self.title }

    /// Equal-width bin edges over `[min, max]`, widened by 0.5 when every value
    /// is the same. The last bin is closed. None for an empty sample.
    pub fn edges(&self) -> Option<Vec<f64>> {
        let (mut lo, mut hi) = self.values.iter()
            .fold(None, |acc: Option<(f64, f64)>, &v| Some(acc.map_or((v, v), |(lo, hi)| (lo.min(v), hi.max(v)))))?;
        if lo == hi { (lo, hi) = (lo - 0.5, hi + 0.5) }

        let width = (hi - lo) / self.bins as f64;
        Some((0..=self.bins).map(|i| if i == self.bins { hi } else { lo + width * i as f64 }).collect())
    }

    /// Number of values in each bin.
    pub fn counts(&self) -> Vec<usize> {
        let Some(edges) = self.edges() else { return vec![0; self.bins] };
        let (lo, width) = (edges[0], (edges[self.bins] - edges[0]) / self.bins as f64);

        let mut counts = vec![0; self.bins];
        for &v in &self.values {
            let bin = ((v - lo) / width).floor() as usize;
            counts[bin.min(self.bins - 1)] += 1;
        }
        counts
    }

    pub fn write_svg(&self, path: &Path) -> Result<()> {
        let mut svg = SvgWriter::new(path)?;
        self.render(&mut svg)
            .with_context(|| format!("[plot::histogram] Failed to write {}", path.display()))
    }

    fn render(&self, svg: &mut SvgWriter) -> Result<()> {
        let counts = self.counts();
        let edges = self.edges().unwrap_or_else(|| vec![0.0, 1.0]);
        let (mut lo, mut hi) = (edges[0], edges[edges.len() - 1]);
        if let Some(r) = self.reference { (lo, hi) = (lo.min(r), hi.max(r)) }
        let max_count = counts.iter().copied().max().unwrap_or(0).max(1);

        let frame = Frame::new((lo, hi), (0.0, max_count as f64 * 1.05));
        frame.begin(svg, &self.title)?;

        for (i, &count) in counts.iter().enumerate().filter(|&(_, &c)| c > 0) {
            let (x0, x1) = (frame.x.map(edges[i]), frame.x.map(edges[i + 1]));
            let y = frame.y.map(count as f64);
            writeln!(svg, r#"<rect class="bar" x="{x0:.2}" y="{y:.2}" width="{:.2}" height="{:.2}"/>"#,
                x1 - x0, frame.bottom() - y)?;
        }

        frame.write_axes(svg, &self.x_label, "Frequency", 6)?;
        for tick in frame.x.ticks(6) {
            frame.write_x_tick(svg, frame.x.map(tick), &format_tick(tick))?;
        }

        if let Some(reference) = self.reference {
            let x = frame.x.map(reference);
            writeln!(svg, r#"<line class="reference" x1="{x:.2}" y1="{:.2}" x2="{x:.2}" y2="{:.2}"/>"#,
                frame.top(), frame.bottom())?;
        }

        svg.write_footer()?;
        svg.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ten_equal_bins_with_closed_last_bin() {
        let values = (0..=100).map(|v| v as f64).collect::<Vec<_>>();
        let histogram = Histogram::new("Cut Edges", &values);

        let edges = histogram.edges().unwrap();
        assert_eq!(edges.len(), 11);
        assert_eq!((edges[0], edges[10]), (0.0, 100.0));
        assert_eq!(histogram.counts(), vec![10, 10, 10, 10, 10, 10, 10, 10, 10, 11]);
    }

    #[test]
    fn constant_sample_gets_a_unit_range() {
        let histogram = Histogram::new("flat", &[3.0, 3.0, 3.0]).with_bins(2);
        assert_eq!(histogram.edges().unwrap(), vec![2.5, 3.0, 3.5]);
        assert_eq!(histogram.counts(), vec![0, 3]);
    }

    #[test]
    fn nan_values_are_dropped() {
        let histogram = Histogram::new("gaps", &[f64::NAN, 1.0, 2.0]);
        assert_eq!(histogram.counts().iter().sum::<usize>(), 2);
        assert_eq!(Histogram::new("empty", &[f64::NAN]).edges(), None);
    }

    #[test]
    fn renders_bars_and_reference_line() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("hist.svg");

        Histogram::new("Efficiency Gap for Senate Election", &[0.01, 0.02, 0.02, 0.05])
            .with_reference(0.08)
            .with_x_label("efficiency_gap_sen")
            .write_svg(&path)
            .unwrap();

        let text = std::fs::read_to_string(&path).unwrap();
        assert!(text.contains("Efficiency Gap for Senate Election"));
        assert!(text.contains(r#"class="reference""#));
        assert!(text.contains(">efficiency_gap_sen</text>"));
        assert!(text.matches(r#"class="bar""#).count() >= 3);
        assert!(text.trim_end().ends_with("</svg>"));
    }

    #[test]
    fn empty_sample_still_renders() {
        let tmp = tempfile::tempdir().unwrap();
        let path = tmp.path().join("empty.svg");
        Histogram::new("nothing", &[]).write_svg(&path).unwrap();
        assert!(!std::fs::read_to_string(&path).unwrap().contains(r#"class="bar""#));
    }
}
