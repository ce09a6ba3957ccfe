pub mod sample_loader;
pub mod worker;

pub use sample_loader::LoadedSound;
pub use worker::{Job, JobResult, Worker};
