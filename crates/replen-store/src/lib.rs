//! # Replenishment Store
//!
//! 協作介面的記憶體實作，用於測試與示範

pub mod memory;

// Re-export 主要類型
pub use memory::{MemoryStore, SaleLine};
