//! Slide title resolution.

use crate::types::Slide;

/// Resolve a display title for a slide. Never fails.
///
/// Order of preference:
/// 1. the title placeholder's text, if non-empty;
/// 2. the first non-empty text shape whose top offset is at most
///    `threshold_pt` points (shapes with unknown geometry are skipped);
/// 3. `"Slide <index>"`.
pub fn resolve_title(slide: &Slide, threshold_pt: f64) -> String {
    let placeholder = slide
        .shapes
        .iter()
        .filter(|s| s.is_title)
        .filter_map(|s| s.text.as_deref())
        .map(str::trim)
        .find(|t| !t.is_empty());

    if let Some(title) = placeholder {
        return title.to_string();
    }

    let near_top = slide.shapes.iter().find_map(|shape| {
        let text = shape.text.as_deref()?.trim();
        let top = shape.top?;
        (!text.is_empty() && top <= threshold_pt).then_some(text)
    });

    match near_top {
        Some(text) => text.to_string(),
        None => fallback_title(slide.index),
    }
}

/// Placeholder title for slides without a usable title shape.
pub fn fallback_title(index: usize) -> String {
    format!("Slide {}", index)
}
