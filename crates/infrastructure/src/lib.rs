//! Regional DNS Infrastructure Layer
pub mod dns;
pub mod regions;
