pub mod config;
pub mod review;

pub type CommandResult = Result<(), Box<dyn std::error::Error>>;
