pub mod jobs;
pub mod scheduler;

pub use jobs::CollectionSchedule;
pub use scheduler::{delay_until, is_run_due};
