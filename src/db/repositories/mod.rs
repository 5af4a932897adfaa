pub mod cards;
pub mod corrections;
pub mod patterns;
pub mod scan_stats;
