// Utility functions

pub mod logger;
pub mod prompt;

pub use logger::*;
pub use prompt::*;
