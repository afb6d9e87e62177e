pub mod events;
pub mod job;
pub mod records;
pub mod scope;
pub mod session;
