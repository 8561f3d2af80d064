mod region_annotator;
mod resolution_engine;

pub use region_annotator::RegionAnnotator;
pub use resolution_engine::{ResolutionEngine, ResolverSettings};
