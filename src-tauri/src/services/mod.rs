pub mod acquisition;
pub mod classifier;
pub mod session;
