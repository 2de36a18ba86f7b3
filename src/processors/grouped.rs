use crate::error::Result;
use crate::models::Frame;
use tracing::debug;

/// Run `transform` over each site's rows in chronological order and stitch
/// the results back together sorted by (site, datetime).
///
/// The transform sees exactly one site per call, so anything it derives from
/// neighbouring rows cannot cross a site boundary. It must keep the row
/// count and the (site, datetime) key of every row it receives.
pub fn apply_per_site<F>(frame: &Frame, mut transform: F) -> Result<Frame>
where
    F: FnMut(Frame) -> Result<Frame>,
{
    let groups = frame.split_by_site();
    if groups.is_empty() {
        return transform(frame.clone());
    }

    let mut parts = Vec::with_capacity(groups.len());
    for (site, rows) in groups {
        debug!(site = %site, rows = rows.len(), "applying per-site transform");
        parts.push(transform(rows)?);
    }

    let mut out = Frame::concat(parts)?;
    out.sort_by_key();
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::timestamp::from_components;
    use crate::models::{Column, SiteLabel};
    use crate::processors::window::lag;
    use pretty_assertions::assert_eq;

    fn interleaved() -> Frame {
        let t = |h: f64| from_components(2024.0, 1.0, 1.0, h).unwrap();
        Frame::new(
            vec![
                SiteLabel::Int(2),
                SiteLabel::Int(1),
                SiteLabel::Int(2),
                SiteLabel::Int(1),
            ],
            vec![t(1.0), t(1.0), t(0.0), t(0.0)],
            vec![Column::new("x", vec![Some(21.0), Some(11.0), Some(20.0), Some(10.0)])],
        )
        .unwrap()
    }

    fn add_lag(mut rows: Frame) -> Result<Frame> {
        let lagged = lag(rows.values("x")?, 1);
        rows.insert_column("x_lag", lagged)?;
        Ok(rows)
    }

    #[test]
    fn test_lag_never_crosses_sites() {
        let out = apply_per_site(&interleaved(), add_lag).unwrap();

        assert!(out.is_sorted_by_key());
        assert_eq!(out.values("x").unwrap(), &[Some(10.0), Some(11.0), Some(20.0), Some(21.0)]);
        assert_eq!(out.values("x_lag").unwrap(), &[None, Some(10.0), None, Some(20.0)]);
    }

    #[test]
    fn test_reapplying_is_idempotent() {
        let once = apply_per_site(&interleaved(), add_lag).unwrap();
        let twice = apply_per_site(&once, add_lag).unwrap();
        assert_eq!(once, twice);
    }

    #[test]
    fn test_empty_frame_keeps_layout() {
        let out = apply_per_site(&Frame::empty(&["x"]), add_lag).unwrap();
        assert!(out.is_empty());
        assert_eq!(out.column_names(), vec!["x", "x_lag"]);
    }
}
