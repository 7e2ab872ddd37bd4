//! Reading order for annotations
//!
//! Zotero's `annotationSortIndex` is a composite zero-padded string
//! whose lexicographic order is the reading order. Annotations without
//! one fall back to a key derived from the page label; unparseable
//! labels sort last.

use crate::annotations::Annotation;

/// Sort key a page label could never exceed
const LAST_KEY: &str = "99999";

/// Derive the reading-order key for one annotation.
pub fn reading_order_key(annotation: &Annotation) -> String {
    if !annotation.sort_index.is_empty() {
        return annotation.sort_index.clone();
    }
    match annotation.page_label.trim().parse::<u32>() {
        Ok(page) => format!("{:05}", page),
        Err(_) => LAST_KEY.to_string(),
    }
}

/// Sort annotations into reading order.
///
/// The sort is stable: annotations with identical keys keep their
/// original relative order, so output is deterministic.
pub fn sort_annotations(annotations: &mut [Annotation]) {
    annotations.sort_by_key(reading_order_key);
}

/// Sorted copy of an annotation slice.
pub fn sorted_annotations(annotations: &[Annotation]) -> Vec<Annotation> {
    let mut sorted = annotations.to_vec();
    sort_annotations(&mut sorted);
    sorted
}
