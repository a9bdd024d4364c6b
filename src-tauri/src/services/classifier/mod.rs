pub mod client;
pub mod encoding;
