pub mod samples_dir;
pub mod store;

pub use samples_dir::{load_batch, save_batch, BatchManifest};
pub use store::SampleStore;
