// Metric group declarations and collection routines
pub mod groups;

pub mod collection;
pub mod poller;
pub mod registration;
