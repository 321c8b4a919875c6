pub mod artifact;
pub mod backend;
pub mod batch;
pub mod coordinator;
pub mod datasets;
pub mod driver;
pub mod gather;
pub mod order;
pub mod shard;

pub use artifact::*;
pub use backend::*;
pub use batch::*;
pub use coordinator::*;
pub use datasets::*;
pub use driver::*;
pub use gather::*;
pub use order::*;
pub use shard::*;
