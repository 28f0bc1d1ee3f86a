pub mod client;
pub mod settings;

pub use client::*;
pub use settings::*;
