pub mod feature_engine;
pub mod grouped;
pub mod site_reconciler;
pub mod table_merger;
pub mod window;

pub use feature_engine::{FeatureConfig, FeatureEngine, FeatureReport};
pub use grouped::apply_per_site;
pub use site_reconciler::{LabelStrategy, Resolution, SiteReconciler};
pub use table_merger::{inner_join, MergeReport, SiteMergeStats, SkippedSite, TableMerger};
