//! Task helpers, the timer driver and the supervisor watchdog.

pub mod task_pin;
pub mod time_driver;
pub mod watchdog;
