pub mod errors;
pub mod tables;
