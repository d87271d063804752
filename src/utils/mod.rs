pub mod calendar;
pub mod constants;
