pub mod calculators;
pub mod aggregators;
pub mod scorer;

pub use calculators::*;
pub use aggregators::*;
pub use scorer::*;
