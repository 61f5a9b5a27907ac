mod boxplot;
mod frame;
mod histogram;

pub use boxplot::{BoxPlot, BoxStats};
pub use histogram::Histogram;
