pub mod core;
pub mod math;
pub mod parameters;
pub mod runner;
pub mod stream;
