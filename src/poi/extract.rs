//! Waypoint extraction from narrator text
//!
//! The narrator is asked for numbered items of the form
//! `1. [47.6, -122.3] Description...`. Completions don't always follow the
//! format, so parsing is tolerant: markdown emphasis is ignored, blocks with
//! unusable coordinates are skipped and counted, and no match at all simply
//! yields nothing.

use std::sync::LazyLock;

use regex::Regex;

use super::Waypoint;
use crate::geo::Coordinate;

/// Start of a numbered block: `N. [lat, lon]`
static BLOCK_START: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"\b\d+\.\s*\[([^\[\]\n,]*),([^\[\]\n]*)\]").expect("valid regex")
});

/// A numbered list marker at the start of a line
static LINE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?m)^[ \t]*\d+\.").expect("valid regex"));

/// Markdown emphasis (`*`, `**`, `__`)
static EMPHASIS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\*+|__").expect("valid regex"));

/// Result of parsing narrator text
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Extraction {
    /// Waypoints in the order they appear in the text
    pub waypoints: Vec<Waypoint>,
    /// Numbered blocks dropped because their coordinates were unusable
    pub skipped: usize,
}

impl Extraction {
    /// Whether nothing usable was found
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.waypoints.is_empty()
    }
}

/// Parse narrator text into waypoints, counting malformed blocks
#[must_use]
pub fn extract(narrative: &str) -> Extraction {
    let text = EMPHASIS.replace_all(narrative, "");
    let blocks: Vec<_> = BLOCK_START.captures_iter(&text).collect();

    let mut extraction = Extraction::default();

    for (i, caps) in blocks.iter().enumerate() {
        let (Some(whole), Some(lat_field), Some(lon_field)) =
            (caps.get(0), caps.get(1), caps.get(2))
        else {
            continue;
        };

        let body_end = blocks
            .get(i + 1)
            .and_then(|next| next.get(0))
            .map_or(text.len(), |m| m.start());
        let body = &text[whole.end()..body_end];

        // A stray numbered line without coordinates still ends the description
        let body = body
            .find('\n')
            .and_then(|nl| LINE_MARKER.find(&body[nl..]).map(|m| nl + m.start()))
            .map_or(body, |cut| &body[..cut]);

        match parse_coordinate(lat_field.as_str(), lon_field.as_str()) {
            Some(coordinate) => {
                extraction.waypoints.push(Waypoint::new(
                    coordinate.lat,
                    coordinate.lon,
                    body.trim(),
                ));
            }
            None => {
                tracing::debug!(
                    block = i + 1,
                    lat = lat_field.as_str(),
                    lon = lon_field.as_str(),
                    "skipping waypoint with malformed coordinates"
                );
                extraction.skipped += 1;
            }
        }
    }

    if extraction.skipped > 0 {
        tracing::warn!(
            extracted = extraction.waypoints.len(),
            skipped = extraction.skipped,
            "some narrative blocks had unusable coordinates"
        );
    }

    extraction
}

/// Parse narrator text into waypoints, discarding the skip count
#[must_use]
pub fn extract_waypoints(narrative: &str) -> Vec<Waypoint> {
    extract(narrative).waypoints
}

fn parse_coordinate(lat: &str, lon: &str) -> Option<Coordinate> {
    let coordinate = Coordinate::new(parse_degrees(lat)?, parse_degrees(lon)?);
    coordinate.is_valid().then_some(coordinate)
}

fn parse_degrees(field: &str) -> Option<f64> {
    field
        .trim()
        .trim_end_matches('°')
        .trim_end()
        .parse::<f64>()
        .ok()
        .filter(|v| v.is_finite())
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEATTLE: &str = "1. [47.6, -122.3] Pike Place Market is a historic market.\n\
                           2. [47.62, -122.35] The Fremont Troll is a sculpture.";

    fn assert_close(a: f64, b: f64) {
        assert!((a - b).abs() < 1e-9, "{a} != {b}");
    }

    #[test]
    fn test_coordinates_on_line_after_number() {
        let extraction = extract("1.\n[47.6, -122.3] Market\n2.\n   [47.62, -122.35] Troll");
        assert_eq!(extraction.skipped, 0);
        assert_eq!(extraction.waypoints.len(), 2);
        assert_eq!(extraction.waypoints[0].description(), "Market");
        assert_close(extraction.waypoints[1].lat(), 47.62);
        assert_eq!(extraction.waypoints[1].description(), "Troll");
    }

    #[test]
    fn test_extract_well_formed() {
        let extraction = extract(SEATTLE);
        assert_eq!(extraction.skipped, 0);
        assert_eq!(extraction.waypoints.len(), 2);

        let first = &extraction.waypoints[0];
        assert_close(first.lat(), 47.6);
        assert_close(first.lon(), -122.3);
        assert_eq!(first.description(), "Pike Place Market is a historic market.");

        let second = &extraction.waypoints[1];
        assert_close(second.lat(), 47.62);
        assert_close(second.lon(), -122.35);
        assert_eq!(second.description(), "The Fremont Troll is a sculpture.");
    }

    #[test]
    fn test_no_blocks_yields_empty() {
        assert!(extract("").is_empty());
        assert!(extract("I couldn't find anything interesting along this route.").is_empty());
        assert!(extract("1. Pike Place Market\n2. Space Needle").is_empty());
    }

    #[test]
    fn test_emphasis_is_ignored() {
        let text = "1. **[47.6, -122.3]** **Pike Place Market** is a market.\n\
                    2. *[47.62, -122.35]* __Fremont Troll__";
        let waypoints = extract_waypoints(text);
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].description(), "Pike Place Market is a market.");
        assert_eq!(waypoints[1].description(), "Fremont Troll");
    }

    #[test]
    fn test_bold_number_marker() {
        let waypoints = extract_waypoints("**1.** [47.6, -122.3] Market");
        assert_eq!(waypoints.len(), 1);
        assert_eq!(waypoints[0].description(), "Market");
    }

    #[test]
    fn test_non_numeric_block_skipped() {
        let text = "1. [47.6, -122.3] Market\n\
                    2. [north, -122.35] Troll\n\
                    3. [47.63, -122.32] Needle";
        let extraction = extract(text);
        assert_eq!(extraction.skipped, 1);

        let names: Vec<_> = extraction
            .waypoints
            .iter()
            .map(Waypoint::description)
            .collect();
        assert_eq!(names, vec!["Market", "Needle"]);
    }

    #[test]
    fn test_out_of_range_block_skipped() {
        let extraction = extract("1. [147.6, -122.3] Nowhere\n2. [NaN, 1.0] Nothing");
        assert!(extraction.waypoints.is_empty());
        assert_eq!(extraction.skipped, 2);
    }

    #[test]
    fn test_empty_description_preserved() {
        let waypoints = extract_waypoints("1. [47.6, -122.3]   \n2. [47.62, -122.35] Troll");
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].description(), "");
    }

    #[test]
    fn test_multiline_description_runs_to_next_block() {
        let text = "Here are some stops:\n\n\
                    1. [47.6, -122.3] Pike Place Market.\n\
                    Opened in 1907. Famous for fish throwing.\n\n\
                    2. [47.62, -122.35] Fremont Troll.";
        let waypoints = extract_waypoints(text);
        assert_eq!(waypoints.len(), 2);
        assert_eq!(
            waypoints[0].description(),
            "Pike Place Market.\nOpened in 1907. Famous for fish throwing."
        );
    }

    #[test]
    fn test_single_line_blocks() {
        let text = "1. [47.6, -122.3] Market 2. [47.62, -122.35] Troll";
        let waypoints = extract_waypoints(text);
        assert_eq!(waypoints.len(), 2);
        assert_eq!(waypoints[0].description(), "Market");
        assert_eq!(waypoints[1].description(), "Troll");
    }

    #[test]
    fn test_numbered_line_without_coordinates_ends_description() {
        let text = "1. [47.6, -122.3] Market\n2. Something without coordinates";
        let waypoints = extract_waypoints(text);
        assert_eq!(waypoints.len(), 1);
        assert_eq!(waypoints[0].description(), "Market");
    }

    #[test]
    fn test_year_at_start_of_description_kept() {
        let waypoints = extract_waypoints("1. [47.6, -122.3] 1907. The year the market opened.");
        assert_eq!(waypoints.len(), 1);
        assert_eq!(
            waypoints[0].description(),
            "1907. The year the market opened."
        );
    }

    #[test]
    fn test_degree_signs_and_spacing() {
        let waypoints = extract_waypoints("1.[ 47.6° ,  -122.3° ]Market");
        assert_eq!(waypoints.len(), 1);
        assert_close(waypoints[0].lat(), 47.6);
        assert_close(waypoints[0].lon(), -122.3);
    }

    #[test]
    fn test_source_order_preserved() {
        let text = "3. [47.63, -122.32] C\n1. [47.6, -122.3] A\n2. [47.62, -122.35] B";
        let names: Vec<_> = extract_waypoints(text)
            .iter()
            .map(|w| w.description().to_string())
            .collect();
        assert_eq!(names, vec!["C", "A", "B"]);
    }
}
