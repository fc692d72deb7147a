// src/process/mod.rs
pub mod insight;
pub mod melt;

pub use insight::{
    compare_means, mean, most_frequent, summarize, value_counts, Comparison, Insight,
    MeanComparison, Mode, ValueCount,
};
pub use melt::{melt, melt_numeric, LongRecord};
