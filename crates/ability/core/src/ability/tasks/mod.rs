//! Stock ability tasks.

mod wait_delay;
mod wait_target_data;

pub use wait_delay::WaitDelay;
pub use wait_target_data::{TargetActor, TargetingStatus, WaitTargetData};
