// florist/src/automation/mod.rs

//! Order automation: shift bucket classification and the status schedule it
//! implies. The storefront's cron runner applies the schedule; everything here
//! is pure.

pub mod schedule;
pub mod shift;

pub use schedule::{calculate_automation_schedule, due_transitions, AutomationSchedule, ScheduleInput, ScheduledTransition};
pub use shift::{classify_created_at, ShiftBucket, UnknownShiftBucket};
