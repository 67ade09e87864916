//! Records and field kinds shared by the extraction engine and its collaborators.

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Semantic category of a value picked from the page.
///
/// The declaration order is the canonical field order used when a template
/// needs "the first bound field".
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Image,
    Title,
    Description,
    Price,
    Generic,
}

impl FieldKind {
    pub const ALL: [FieldKind; 5] = [
        FieldKind::Image,
        FieldKind::Title,
        FieldKind::Description,
        FieldKind::Price,
        FieldKind::Generic,
    ];

    pub fn as_str(self) -> &'static str {
        match self {
            FieldKind::Image => "image",
            FieldKind::Title => "title",
            FieldKind::Description => "description",
            FieldKind::Price => "price",
            FieldKind::Generic => "generic",
        }
    }
}

impl fmt::Display for FieldKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for FieldKind {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        FieldKind::ALL
            .into_iter()
            .find(|kind| kind.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("unknown field kind: {}", s))
    }
}

/// How a click is interpreted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExtractionMode {
    /// One click fills one field of one record.
    #[default]
    Manual,
    /// Clicks bind exemplar elements that are later replayed across the page.
    Template,
}

/// A persisted record, owned by the record store.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Record {
    pub id: u64,
    pub url: String,
    pub title: String,
    pub description: String,
    pub image: String,
    pub price: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub verified: bool,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Record {
    /// A record is empty when none of its content fields holds visible text.
    pub fn is_empty(&self) -> bool {
        [&self.title, &self.description, &self.image, &self.price]
            .iter()
            .all(|field| field.trim().is_empty())
    }
}

/// Partial record used for `create` and `update`. `None` leaves a field untouched.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct RecordPatch {
    pub url: Option<String>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
    pub category: Option<String>,
    pub verified: Option<bool>,
}

/// Record-shaped payload produced by the engine before the store assigns an id.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RecordDraft {
    pub url: String,
    pub title: Option<String>,
    pub description: Option<String>,
    pub image: Option<String>,
    pub price: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub category: Option<String>,
    pub verified: bool,
    pub timestamp: DateTime<Utc>,
}

impl RecordDraft {
    pub fn new(url: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            url: url.into(),
            title: None,
            description: None,
            image: None,
            price: None,
            category: None,
            verified: false,
            timestamp,
        }
    }

    /// Store a field value. `Generic` values go to the category slot.
    pub fn set(&mut self, kind: FieldKind, value: impl Into<String>) {
        let value = Some(value.into());
        match kind {
            FieldKind::Image => self.image = value,
            FieldKind::Title => self.title = value,
            FieldKind::Description => self.description = value,
            FieldKind::Price => self.price = value,
            FieldKind::Generic => self.category = value,
        }
    }

    pub fn get(&self, kind: FieldKind) -> Option<&str> {
        match kind {
            FieldKind::Image => self.image.as_deref(),
            FieldKind::Title => self.title.as_deref(),
            FieldKind::Description => self.description.as_deref(),
            FieldKind::Price => self.price.as_deref(),
            FieldKind::Generic => self.category.as_deref(),
        }
    }

    /// True if at least one field holds a non-blank value.
    pub fn has_content(&self) -> bool {
        FieldKind::ALL
            .into_iter()
            .any(|kind| self.get(kind).is_some_and(|v| !v.trim().is_empty()))
    }

    /// Dedup rule: same title ignoring case, or same image and same price.
    pub fn is_duplicate_of(&self, other: &RecordDraft) -> bool {
        let title_match = match (non_blank(&self.title), non_blank(&other.title)) {
            (Some(a), Some(b)) => a.to_lowercase() == b.to_lowercase(),
            _ => false,
        };
        let image_match = matches!(
            (non_blank(&self.image), non_blank(&other.image)),
            (Some(a), Some(b)) if a == b
        );
        let price_match = matches!(
            (non_blank(&self.price), non_blank(&other.price)),
            (Some(a), Some(b)) if a == b
        );

        title_match || (image_match && price_match)
    }
}

/// True if `draft` duplicates any record in `seen`.
pub fn is_duplicate(draft: &RecordDraft, seen: &[RecordDraft]) -> bool {
    seen.iter().any(|existing| draft.is_duplicate_of(existing))
}

fn non_blank(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

impl From<&RecordDraft> for RecordPatch {
    fn from(draft: &RecordDraft) -> Self {
        Self {
            url: Some(draft.url.clone()),
            title: draft.title.clone(),
            description: draft.description.clone(),
            image: draft.image.clone(),
            price: draft.price.clone(),
            category: draft.category.clone(),
            verified: Some(draft.verified),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn draft(title: Option<&str>, image: Option<&str>, price: Option<&str>) -> RecordDraft {
        let mut d = RecordDraft::new("https://shop.test/", Utc::now());
        d.title = title.map(String::from);
        d.image = image.map(String::from);
        d.price = price.map(String::from);
        d
    }

    #[test]
    fn test_title_dedup_ignores_case() {
        let a = draft(Some("Widget A"), None, None);
        let b = draft(Some("  widget a "), None, Some("$3"));
        assert!(a.is_duplicate_of(&b));
    }

    #[test]
    fn test_image_and_price_must_both_match() {
        let a = draft(None, Some("https://x/a.jpg"), Some("$10.00"));
        let same = draft(Some("Other"), Some("https://x/a.jpg"), Some("$10.00"));
        let other_price = draft(None, Some("https://x/a.jpg"), Some("$11.00"));
        assert!(a.is_duplicate_of(&same));
        assert!(!a.is_duplicate_of(&other_price));
    }

    #[test]
    fn test_missing_fields_never_match() {
        let a = draft(None, None, None);
        let b = draft(None, None, None);
        assert!(!a.is_duplicate_of(&b));
        assert!(!is_duplicate(&a, &[b]));
    }

    #[test]
    fn test_has_content() {
        assert!(!draft(None, None, None).has_content());
        assert!(!draft(Some("   "), None, None).has_content());
        assert!(draft(None, None, Some("$1")).has_content());

        let mut generic = draft(None, None, None);
        generic.set(FieldKind::Generic, "Shoes");
        assert!(generic.has_content());
        assert_eq!(generic.category.as_deref(), Some("Shoes"));
    }

    #[test]
    fn test_record_emptiness() {
        let now = Utc::now();
        let mut record = Record {
            id: 1,
            url: "https://shop.test/".to_string(),
            title: " ".to_string(),
            description: String::new(),
            image: "\t".to_string(),
            price: String::new(),
            category: None,
            verified: false,
            created_at: now,
            updated_at: now,
        };
        assert!(record.is_empty());
        record.price = "$5".to_string();
        assert!(!record.is_empty());
    }

    #[test]
    fn test_field_kind_parse() {
        assert_eq!("Price".parse::<FieldKind>().unwrap(), FieldKind::Price);
        assert!("colour".parse::<FieldKind>().is_err());
        assert_eq!(
            serde_json::to_string(&FieldKind::Description).unwrap(),
            "\"description\""
        );
    }
}
