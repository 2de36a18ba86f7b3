use serde::{Deserialize, Serialize};
use std::fmt;

/// Identifier of a site as it appears inside a table.
///
/// Reference series may label sites with bare integers, integers stored as
/// text, or prefixed strings. The two representations never compare equal:
/// `Int(3)` and `Text("3")` are distinct labels.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SiteLabel {
    Int(i64),
    Text(String),
}

impl SiteLabel {
    pub fn text(value: impl Into<String>) -> Self {
        SiteLabel::Text(value.into())
    }

    pub fn as_int(&self) -> Option<i64> {
        match self {
            SiteLabel::Int(v) => Some(*v),
            SiteLabel::Text(_) => None,
        }
    }

    /// Infer labels for a whole column the way a CSV loader types it: when
    /// every cell is an integer the column is numeric, otherwise it is text.
    pub fn from_column<S: AsRef<str>>(cells: &[S]) -> Vec<SiteLabel> {
        let parsed: Option<Vec<i64>> = cells
            .iter()
            .map(|c| c.as_ref().trim().parse::<i64>().ok())
            .collect();

        match parsed {
            Some(ints) if !cells.is_empty() => ints.into_iter().map(SiteLabel::Int).collect(),
            _ => cells
                .iter()
                .map(|c| SiteLabel::Text(c.as_ref().trim().to_string()))
                .collect(),
        }
    }
}

impl fmt::Display for SiteLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SiteLabel::Int(v) => write!(f, "{}", v),
            SiteLabel::Text(s) => write!(f, "{}", s),
        }
    }
}

impl From<i64> for SiteLabel {
    fn from(value: i64) -> Self {
        SiteLabel::Int(value)
    }
}

impl From<&str> for SiteLabel {
    fn from(value: &str) -> Self {
        SiteLabel::Text(value.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_integer_and_text_labels_differ() {
        assert_ne!(SiteLabel::Int(3), SiteLabel::text("3"));
        assert_eq!(SiteLabel::Int(3).to_string(), SiteLabel::text("3").to_string());
    }

    #[test]
    fn test_column_inference() {
        let ints = SiteLabel::from_column(&["1", "2", " 3 "]);
        assert_eq!(ints, vec![SiteLabel::Int(1), SiteLabel::Int(2), SiteLabel::Int(3)]);

        let mixed = SiteLabel::from_column(&["1", "site_2"]);
        assert_eq!(mixed, vec![SiteLabel::text("1"), SiteLabel::text("site_2")]);
    }
}
