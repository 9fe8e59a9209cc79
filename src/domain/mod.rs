pub mod stats;
pub mod visit;
