pub mod ledger;
pub mod metrics;
pub mod storage;

pub use ledger::{Engagement, EngagementLedger, Validation, CONVERSION_RATE};
pub use metrics::MetricTable;
pub use storage::{LedgerStorage, MemoryLedgerStorage};
