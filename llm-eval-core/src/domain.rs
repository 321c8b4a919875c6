pub mod config;
pub mod dataset;
pub mod evaluation;
pub mod topology;

pub use config::*;
pub use dataset::*;
pub use evaluation::*;
pub use topology::*;
