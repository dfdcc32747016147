mod registry;
mod selectors;

pub use registry::{ModelRegistry, ModelSpec, ModelVariant};
pub use selectors::{ModelSelection, ModelSelector};
