//! Application layers and the ordered stack that drives them.

#[allow(clippy::module_inception)]
mod layer;
mod stack;

pub use layer::Layer;
pub use stack::{LayerId, LayerStack};
