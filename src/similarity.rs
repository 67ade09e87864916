//! Structural similarity
//!
//! Decides whether an element inside one container plays the same role as the
//! exemplar inside another: same tag, overlapping classes, similar position
//! among siblings.

use scraper::ElementRef;

use crate::config::SimilarityThresholds;
use crate::dom::{class_tokens, sibling_position, tag_name};

/// Components of a similarity judgement.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SimilarityScore {
    pub tag_match: bool,
    /// `shared / max(count1, count2)`; `None` when either side has no class.
    pub class_overlap: Option<f64>,
    /// `1 - |index1 - index2| / max(children1, children2)`; `None` without parents.
    pub position: Option<f64>,
}

impl SimilarityScore {
    pub fn passes(&self, thresholds: &SimilarityThresholds) -> bool {
        if !self.tag_match {
            return false;
        }
        if let Some(overlap) = self.class_overlap {
            if overlap < thresholds.min_class_overlap {
                return false;
            }
        }
        match self.position {
            Some(position) => position > thresholds.min_position_similarity,
            None => true,
        }
    }
}

/// Score `candidate` against `exemplar`. Stops after a tag mismatch.
pub fn similarity_score(candidate: &ElementRef<'_>, exemplar: &ElementRef<'_>) -> SimilarityScore {
    if tag_name(candidate) != tag_name(exemplar) {
        return SimilarityScore {
            tag_match: false,
            class_overlap: None,
            position: None,
        };
    }

    SimilarityScore {
        tag_match: true,
        class_overlap: class_overlap(candidate, exemplar),
        position: position_similarity(candidate, exemplar),
    }
}

/// True if `candidate` plays the same structural role as `exemplar`.
pub fn is_similar(
    candidate: &ElementRef<'_>,
    exemplar: &ElementRef<'_>,
    thresholds: &SimilarityThresholds,
) -> bool {
    similarity_score(candidate, exemplar).passes(thresholds)
}

fn class_overlap(a: &ElementRef<'_>, b: &ElementRef<'_>) -> Option<f64> {
    let classes_a = class_tokens(a);
    let classes_b = class_tokens(b);
    if classes_a.is_empty() || classes_b.is_empty() {
        return None;
    }
    let shared = classes_a.iter().filter(|c| classes_b.contains(c)).count();
    Some(shared as f64 / classes_a.len().max(classes_b.len()) as f64)
}

fn position_similarity(a: &ElementRef<'_>, b: &ElementRef<'_>) -> Option<f64> {
    let pos_a = sibling_position(a)?;
    let pos_b = sibling_position(b)?;
    let max_children = pos_a.count.max(pos_b.count) as f64;
    let distance = (pos_a.index as f64 - pos_b.index as f64).abs();
    Some(1.0 - distance / max_children)
}
