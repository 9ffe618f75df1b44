pub mod data;
pub mod defaults;
pub mod io;

pub use data::Config;
pub use io::ConfigError;

#[cfg(test)]
mod tests;
