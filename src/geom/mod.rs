mod adjacency;
mod assign;
mod geometries;
mod proj;

pub use adjacency::{Adjacencies, AdjacencyMethod};
pub use geometries::Geometries;
pub use proj::UtmZone;
pub(crate) use proj::geographic_wkt;
