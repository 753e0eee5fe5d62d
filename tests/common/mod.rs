//! Shared cucumber world for the integration tests

pub mod world;

#[allow(unused_imports)]
pub use world::PagerWorld;
