use crate::models::SiteLabel;
use crate::utils::constants::{SITE_PREFIX_LOWER, SITE_PREFIX_UPPER};
use std::collections::BTreeSet;
use tracing::{debug, warn};

/// One way of spelling a logical site index as a reference-series label.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LabelStrategy {
    /// `3`
    BareInteger,
    /// `"3"`
    DecimalText,
    /// `"site_3"`
    LowerPrefixed,
    /// `"SITE_3"`
    UpperPrefixed,
}

impl LabelStrategy {
    pub fn candidate(&self, index: u32) -> SiteLabel {
        match self {
            LabelStrategy::BareInteger => SiteLabel::Int(i64::from(index)),
            LabelStrategy::DecimalText => SiteLabel::Text(index.to_string()),
            LabelStrategy::LowerPrefixed => SiteLabel::Text(format!("{}{}", SITE_PREFIX_LOWER, index)),
            LabelStrategy::UpperPrefixed => SiteLabel::Text(format!("{}{}", SITE_PREFIX_UPPER, index)),
        }
    }
}

/// Outcome of matching a logical index against the labels of a series.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Resolution {
    Resolved(SiteLabel),
    Unresolved { tried: Vec<SiteLabel> },
}

impl Resolution {
    pub fn label(&self) -> Option<&SiteLabel> {
        match self {
            Resolution::Resolved(label) => Some(label),
            Resolution::Unresolved { .. } => None,
        }
    }
}

/// Maps logical site indices onto the labels a reference series actually uses.
pub struct SiteReconciler {
    strategies: Vec<LabelStrategy>,
}

impl SiteReconciler {
    pub fn new() -> Self {
        Self {
            strategies: vec![
                LabelStrategy::BareInteger,
                LabelStrategy::DecimalText,
                LabelStrategy::LowerPrefixed,
                LabelStrategy::UpperPrefixed,
            ],
        }
    }

    pub fn with_strategies(strategies: Vec<LabelStrategy>) -> Self {
        Self { strategies }
    }

    pub fn candidates(&self, index: u32) -> Vec<SiteLabel> {
        self.strategies.iter().map(|s| s.candidate(index)).collect()
    }

    /// First candidate, in strategy order, present among `labels`.
    pub fn resolve(&self, index: u32, labels: &BTreeSet<SiteLabel>) -> Resolution {
        let tried = self.candidates(index);

        match tried.iter().find(|candidate| labels.contains(*candidate)) {
            Some(label) => {
                debug!(site_index = index, label = %label, "mapped logical site to reference label");
                Resolution::Resolved(label.clone())
            }
            None => {
                warn!(
                    site_index = index,
                    tried = ?tried,
                    "no reference site label matches logical site"
                );
                Resolution::Unresolved { tried }
            }
        }
    }
}

impl Default for SiteReconciler {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn labels(items: &[SiteLabel]) -> BTreeSet<SiteLabel> {
        items.iter().cloned().collect()
    }

    #[test]
    fn test_only_lower_prefixed_matches() {
        let reconciler = SiteReconciler::new();
        let resolution = reconciler.resolve(3, &labels(&[SiteLabel::text("site_3")]));
        assert_eq!(resolution, Resolution::Resolved(SiteLabel::text("site_3")));
    }

    #[test]
    fn test_priority_order() {
        let reconciler = SiteReconciler::new();
        let all = labels(&[
            SiteLabel::text("SITE_2"),
            SiteLabel::text("site_2"),
            SiteLabel::text("2"),
        ]);
        assert_eq!(reconciler.resolve(2, &all).label(), Some(&SiteLabel::text("2")));

        let with_int = labels(&[SiteLabel::Int(2), SiteLabel::text("2")]);
        assert_eq!(reconciler.resolve(2, &with_int).label(), Some(&SiteLabel::Int(2)));

        let upper = labels(&[SiteLabel::text("SITE_2")]);
        assert_eq!(reconciler.resolve(2, &upper).label(), Some(&SiteLabel::text("SITE_2")));
    }

    #[test]
    fn test_unresolved_lists_candidates() {
        let reconciler = SiteReconciler::new();
        let resolution = reconciler.resolve(4, &labels(&[SiteLabel::text("site_3"), SiteLabel::Int(5)]));

        assert_eq!(
            resolution,
            Resolution::Unresolved {
                tried: vec![
                    SiteLabel::Int(4),
                    SiteLabel::text("4"),
                    SiteLabel::text("site_4"),
                    SiteLabel::text("SITE_4"),
                ]
            }
        );
        assert!(resolution.label().is_none());
    }

    #[test]
    fn test_no_partial_or_case_insensitive_match() {
        let reconciler = SiteReconciler::new();
        let near_misses = labels(&[
            SiteLabel::text("Site_1"),
            SiteLabel::text("site_10"),
            SiteLabel::text(" 1"),
        ]);
        assert!(reconciler.resolve(1, &near_misses).label().is_none());
    }
}
