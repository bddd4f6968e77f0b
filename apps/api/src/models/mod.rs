pub mod account;
pub mod application;
pub mod job;
pub mod profile;
pub mod upload;
