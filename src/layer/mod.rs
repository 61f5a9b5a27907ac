mod io;
mod layer;
mod ops;

pub use layer::Layer;
