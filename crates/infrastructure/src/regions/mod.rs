mod file_loader;

pub use file_loader::RegionTableLoader;
