mod fs;
mod shp;
mod svg;

pub(crate) use fs::*;
pub(crate) use shp::*;
pub(crate) use svg::*;
