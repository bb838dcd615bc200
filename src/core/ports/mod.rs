pub mod port;
pub mod unit;

// Re-export commonly used types
pub use port::{Port, PortCallback};
pub use unit::{connect, Unit};
