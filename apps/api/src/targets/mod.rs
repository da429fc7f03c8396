pub mod handlers;
pub mod schedule;
