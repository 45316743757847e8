pub mod recompute_vendor_metrics_command;

pub use recompute_vendor_metrics_command::{
    recompute_vendor_metrics, RecomputeOutcome, RecomputeVendorMetricsCommand,
};
