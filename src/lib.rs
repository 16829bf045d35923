pub mod batch;
pub mod config;
pub mod engine;
pub mod error;
pub mod hardware;
pub mod memory;
pub mod paging;
pub mod report;
pub mod stats;
pub mod trace;
pub mod workload;

pub use engine::{Engine, run};
pub use error::{Result, SimError};
pub use hardware::mmu::Operation;
pub use paging::{PolicyKind, Vpn};
pub use stats::RunStatistics;
pub use trace::Reference;
