//! Parser for the edge-list mini-language → `Graph`.
//!
//! Built on `winnow` 0.7. The language is a comma-separated list of
//! arrows: `A -> B, C -> D`. Parsing never fails: segments without a
//! usable arrow are dropped, and input with no valid arrows yields an
//! empty graph, which callers treat as a no-op.

use crate::model::Graph;
use winnow::combinator::{alt, separated};
use winnow::prelude::*;
use winnow::token::{rest, take_till, take_until};

/// The arrow token separating source from target.
pub const ARROW: &str = "->";

/// Parse an edge list into a deduplicated node set and an ordered edge list.
#[must_use]
pub fn parse_edge_list(input: &str) -> Graph {
    let mut graph = Graph::new();

    let segments = match segment_list.parse(input) {
        Ok(segments) => segments,
        Err(e) => {
            log::debug!("edge list not split: {e}");
            return graph;
        }
    };

    for segment in segments.into_iter().map(str::trim) {
        if segment.is_empty() {
            continue;
        }
        match arrow.parse(segment) {
            Ok((source, target)) if !source.is_empty() && !target.is_empty() => {
                graph.add_edge(source, target);
            }
            _ => log::trace!("dropping malformed segment {segment:?}"),
        }
    }

    graph
}

// ─── Low-level parsers ──────────────────────────────────────────────────

fn segment_list<'a>(input: &mut &'a str) -> ModalResult<Vec<&'a str>> {
    separated(0.., take_till(0.., ','), ',').parse_next(input)
}

/// `source -> target`, both trimmed. Text after a second arrow is ignored.
fn arrow<'a>(input: &mut &'a str) -> ModalResult<(&'a str, &'a str)> {
    let source = take_until(0.., ARROW).parse_next(input)?;
    ARROW.parse_next(input)?;
    let target = alt((take_until(0.., ARROW), rest)).parse_next(input)?;
    // Swallow any trailing chain so `parse` sees the whole segment consumed.
    let _ = rest.parse_next(input)?;
    Ok((source.trim(), target.trim()))
}
