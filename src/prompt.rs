//! Narrator prompt construction

use crate::geo::Route;

/// Build the prompt asking for points of interest along `route`
///
/// The route is downsampled to at most `max_points` coordinates so long
/// drives don't blow up the prompt. The requested answer format is the one
/// [`crate::poi::extract`] understands.
#[must_use]
pub fn narrative_prompt(route: &Route, poi_count: usize, max_points: usize) -> String {
    let path = route
        .sample(max_points)
        .iter()
        .map(ToString::to_string)
        .collect::<Vec<_>>()
        .join(", ");

    let mut prompt = format!(
        "Generate {poi_count} interesting points of interest along a driving route \
         that follows these [latitude, longitude] coordinates: {path}. \
         Include landmarks, parks, and restaurants. Order them from the start of the \
         route to the end."
    );
    prompt.push_str("\n\nAnswer with a numbered list and nothing else. Each item must look like:\n");
    prompt.push_str("1. [latitude, longitude] A short spoken-style description of the place.\n");
    prompt.push_str("Use decimal degrees for the coordinates and keep each description to two or three sentences.");
    prompt
}
