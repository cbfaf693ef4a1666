pub mod capabilities;
pub mod paths;

pub use capabilities::RuntimeCapabilities;
pub use paths::{absolute, default_java_home, java_binary_in};
