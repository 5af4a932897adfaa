pub mod card;
pub mod correction;
pub mod pattern;
pub mod scan_stat;

pub use card::{CardCacheEntry, CardName};
pub use correction::UserCorrection;
pub use pattern::OcrPattern;
pub use scan_stat::{ScanKind, ScanStat, StatsSummary};
