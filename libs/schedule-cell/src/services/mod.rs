pub mod schedule;
pub mod availability;

pub use schedule::ScheduleService;
pub use availability::AvailabilityService;
