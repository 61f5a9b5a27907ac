use std::io::Write;

use anyhow::Result;

use crate::common::{escape_text, SvgWriter};

pub(super) const WIDTH: f64 = 720.0;
pub(super) const HEIGHT: f64 = 480.0;
const MARGIN_LEFT: f64 = 70.0;
const MARGIN_RIGHT: f64 = 24.0;
const MARGIN_TOP: f64 = 44.0;
const MARGIN_BOTTOM: f64 = 56.0;

/// Linear map from data coordinates to pixels.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(super) struct Scale {
    domain: (f64, f64),
    range: (f64, f64),
}

impl Scale {
    /// A degenerate domain is widened by 0.5 on either side.
    pub(super) fn new(mut domain: (f64, f64), range: (f64, f64)) -> Self {
        if domain.1 <= domain.0 { domain = (domain.0 - 0.5, domain.0 + 0.5) }
        Self { domain, range }
    }

    #[inline] pub(super) fn domain(&self) -> (f64, f64) { self.domain }

    #[inline]
    pub(super) fn map(&self, value: f64) -> f64 {
        let t = (value - self.domain.0) / (self.domain.1 - self.domain.0);
        self.range.0 + t * (self.range.1 - self.range.0)
    }

    /// `count` evenly spaced values spanning the domain.
    pub(super) fn ticks(&self, count: usize) -> Vec<f64> {
        let (lo, hi) = self.domain;
        match count {
            0 => vec![],
            1 => vec![lo],
            _ => (0..count).map(|i| lo + (hi - lo) * i as f64 / (count - 1) as f64).collect(),
        }
    }
}

/// Plot area of a single chart, with axes and labels.
pub(super) struct Frame {
    pub(super) x: Scale,
    pub(super) y: Scale,
}

impl Frame {
    pub(super) fn new(x_domain: (f64, f64), y_domain: (f64, f64)) -> Self {
        Self {
            x: Scale::new(x_domain, (MARGIN_LEFT, WIDTH - MARGIN_RIGHT)),
            y: Scale::new(y_domain, (HEIGHT - MARGIN_BOTTOM, MARGIN_TOP)),
        }
    }

    #[inline] pub(super) fn left(&self) -> f64 { MARGIN_LEFT }

    #[inline] pub(super) fn right(&self) -> f64 { WIDTH - MARGIN_RIGHT }

    #[inline] pub(super) fn bottom(&self) -> f64 { HEIGHT - MARGIN_BOTTOM }

    #[inline] pub(super) fn top(&self) -> f64 { MARGIN_TOP }

    /// Start a document with the chart title.
    pub(super) fn begin(&self, svg: &mut SvgWriter, title: &str) -> Result<()> {
        svg.write_header(WIDTH, HEIGHT)?;
        svg.write_styles()?;
        writeln!(svg, r#"<text class="title" x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
            WIDTH / 2.0, MARGIN_TOP / 2.0 + 6.0, escape_text(title))?;
        Ok(())
    }

    /// Axis lines, y ticks, and axis labels. X ticks are drawn by the caller.
    pub(super) fn write_axes(&self, svg: &mut SvgWriter, x_label: &str, y_label: &str, y_ticks: usize) -> Result<()> {
        writeln!(svg, r#"<line class="axis" x1="{l:.1}" y1="{b:.1}" x2="{r:.1}" y2="{b:.1}"/>"#,
            l = self.left(), r = self.right(), b = self.bottom())?;
        writeln!(svg, r#"<line class="axis" x1="{l:.1}" y1="{t:.1}" x2="{l:.1}" y2="{b:.1}"/>"#,
            l = self.left(), t = self.top(), b = self.bottom())?;

        for tick in self.y.ticks(y_ticks) {
            let y = self.y.map(tick);
            writeln!(svg, r#"<line class="axis" x1="{:.1}" y1="{y:.1}" x2="{:.1}" y2="{y:.1}"/>"#, self.left() - 4.0, self.left())?;
            writeln!(svg, r#"<text x="{:.1}" y="{:.1}" text-anchor="end">{}</text>"#, self.left() - 7.0, y + 4.0, format_tick(tick))?;
        }

        if !x_label.is_empty() {
            writeln!(svg, r#"<text x="{:.1}" y="{:.1}" text-anchor="middle">{}</text>"#,
                (self.left() + self.right()) / 2.0, HEIGHT - 12.0, escape_text(x_label))?;
        }
        if !y_label.is_empty() {
            let (x, y) = (16.0, (self.top() + self.bottom()) / 2.0);
            writeln!(svg, r#"<text x="{x:.1}" y="{y:.1}" text-anchor="middle" transform="rotate(-90 {x:.1} {y:.1})">{}</text>"#,
                escape_text(y_label))?;
        }
        Ok(())
    }

    /// One labelled tick on the x axis.
    pub(super) fn write_x_tick(&self, svg: &mut SvgWriter, x: f64, label: &str) -> Result<()> {
        writeln!(svg, r#"<line class="axis" x1="{x:.1}" y1="{b:.1}" x2="{x:.1}" y2="{:.1}"/>"#, self.bottom() + 4.0, b = self.bottom())?;
        writeln!(svg, r#"<text x="{x:.1}" y="{:.1}" text-anchor="middle">{}</text>"#, self.bottom() + 18.0, escape_text(label))?;
        Ok(())
    }
}

/// Short label for a tick value: integers without decimals, otherwise up to 3 places.
pub(super) fn format_tick(value: f64) -> String {
    if value.fract().abs() < 1e-9 { return format!("{}", value.round() as i64) }
    let text = format!("{value:.3}");
    text.trim_end_matches('0').trim_end_matches('.').to_string()
}
