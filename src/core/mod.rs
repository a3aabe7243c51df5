//! Core module - the publish scheduler

mod scheduler;

pub use scheduler::{sleep_budget, PublishScheduler, PublishStats, RoundReport, SchedulerState};
