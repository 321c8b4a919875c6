pub mod run;
pub mod shard;
pub mod show;
