pub mod lead_db;
pub mod lead_store;
pub mod memory_store;

pub use lead_store::*;
pub use memory_store::*;
