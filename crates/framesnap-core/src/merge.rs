//! Merging per-frame results into one combined snapshot.

use std::collections::{BTreeMap, HashMap, HashSet};

use framesnap_protocols::{
    CaptureDiagnostic, CombinedSnapshot, CompositeKey, FrameId, FrameSummary, PerFrameOutline,
};
use tracing::warn;

use crate::projector::PerFrameResults;

/// Merge projected frames into a [`CombinedSnapshot`].
pub fn merge_snapshot(
    results: PerFrameResults,
    include_per_frame: bool,
    diagnostics: Vec<CaptureDiagnostic>,
) -> CombinedSnapshot {
    let combined_tree = merge_outlines(&results.frames, &results.per_frame_outlines);

    let mut snapshot = CombinedSnapshot {
        combined_tree,
        frames: results.frames,
        diagnostics,
        ..Default::default()
    };

    for (frame_id, maps) in results.per_frame_maps {
        union_into(&mut snapshot.combined_xpath_map, maps.xpath_map, &frame_id);
        union_into(&mut snapshot.combined_tag_name_map, maps.tag_name_map, &frame_id);
        union_into(&mut snapshot.combined_scrollable_map, maps.scrollable_map, &frame_id);
        union_into(&mut snapshot.combined_url_map, maps.url_map, &frame_id);
    }

    if include_per_frame {
        snapshot.per_frame = Some(results.per_frame_outlines);
    }
    snapshot
}

fn union_into<V>(
    combined: &mut BTreeMap<CompositeKey, V>,
    part: BTreeMap<CompositeKey, V>,
    frame_id: &FrameId,
) {
    for (key, value) in part {
        if combined.contains_key(&key) {
            // only possible if the page handed out a duplicate ordinal
            warn!(frame = %frame_id, key = %key, "Composite key collision, keeping first entry");
            continue;
        }
        combined.insert(key, value);
    }
}

/// Build the combined outline text.
///
/// Each child frame's outline is spliced directly under the line of its host
/// iframe element (the line carrying `[owner_key]`), indented one level
/// deeper. Frames whose host line is not found are appended at the end in
/// traversal order, separated by a blank line.
pub fn merge_outlines(frames: &[FrameSummary], outlines: &[PerFrameOutline]) -> String {
    let outline_by_frame: HashMap<&FrameId, &str> = outlines
        .iter()
        .map(|o| (&o.frame_id, o.outline.as_str()))
        .collect();

    let mut children_by_owner: HashMap<CompositeKey, Vec<&FrameId>> = HashMap::new();
    for frame in frames {
        if let Some(owner) = frame.owner_key {
            if outline_by_frame.contains_key(&frame.frame_id) {
                children_by_owner.entry(owner).or_default().push(&frame.frame_id);
            }
        }
    }

    let merger = OutlineMerger {
        outline_by_frame,
        children_by_owner,
    };
    let mut placed = HashSet::new();
    let mut sections = Vec::new();

    for outline in outlines {
        if placed.contains(&outline.frame_id) {
            continue;
        }
        let mut out = String::new();
        merger.render(&outline.frame_id, "", &mut out, &mut placed);
        let section = out.trim_end_matches('\n');
        if !section.is_empty() {
            sections.push(section.to_string());
        }
    }

    sections.join("\n\n")
}

struct OutlineMerger<'a> {
    outline_by_frame: HashMap<&'a FrameId, &'a str>,
    children_by_owner: HashMap<CompositeKey, Vec<&'a FrameId>>,
}

impl<'a> OutlineMerger<'a> {
    fn render(
        &self,
        frame_id: &'a FrameId,
        indent: &str,
        out: &mut String,
        placed: &mut HashSet<&'a FrameId>,
    ) {
        placed.insert(frame_id);
        let Some(outline) = self.outline_by_frame.get(frame_id) else {
            return;
        };

        for line in outline.lines() {
            out.push_str(indent);
            out.push_str(line);
            out.push('\n');

            let Some(children) = marker_key(line).and_then(|k| self.children_by_owner.get(&k)) else {
                continue;
            };
            let child_indent = format!("{}{}  ", indent, leading_whitespace(line));
            for &child in children {
                if !placed.contains(child) {
                    self.render(child, &child_indent, out, placed);
                }
            }
        }
    }
}

/// Composite key of an outline line of the form `[ordinal-id] role: name`.
pub fn marker_key(line: &str) -> Option<CompositeKey> {
    let rest = line.trim_start().strip_prefix('[')?;
    let end = rest.find(']')?;
    rest[..end].parse().ok()
}

fn leading_whitespace(line: &str) -> &str {
    &line[..line.len() - line.trim_start().len()]
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
