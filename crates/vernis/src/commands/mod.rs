pub mod chain;
pub mod resolve;
