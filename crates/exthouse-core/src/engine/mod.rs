pub mod comparator;
pub mod median;
pub mod runner;
pub mod scoring;

pub use comparator::{compare, CompareOptions};
pub use median::select_representative;
pub use runner::{RunPolicy, Runner};
pub use scoring::log_normal_score;
