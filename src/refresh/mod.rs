pub mod delay;
pub mod interval;
pub mod supervisor;
pub mod worker;

pub use delay::DelayBuffer;
pub use interval::calculate_refresh_interval;
pub use supervisor::Supervisor;
pub use worker::{RefreshHandle, RefreshSettings, RefreshWorker, SharedState};
