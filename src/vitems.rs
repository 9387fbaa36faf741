use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

use crate::model::Finding;

static V_ITEM_ID_PATTERN: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^V(\d+)$").expect("V-item id pattern is valid"));

/// Numeric part of a V-item id, `"V5"` -> 5. Anything outside the
/// `V<number>` format (including the unassigned empty string) is 0.
pub fn extract_v_number(v_item_id: &str) -> u64 {
    V_ITEM_ID_PATTERN
        .captures(v_item_id)
        .and_then(|captures| captures.get(1))
        .and_then(|number| number.as_str().parse().ok())
        .unwrap_or(0)
}

/// Assign sequential V-item ids (V1, V2, ...) for an initial run.
///
/// Findings are ranked by `fragment_id` (lexicographic) so assignment is
/// deterministic regardless of discovery order. Ids are written in place.
pub fn assign_v_items(findings: &mut [Finding]) {
    let mut order: Vec<usize> = (0..findings.len()).collect();
    order.sort_by(|&a, &b| findings[a].fragment_id.cmp(&findings[b].fragment_id));

    for (rank, &index) in order.iter().enumerate() {
        findings[index].v_item_id = format!("V{}", rank + 1);
    }
}

/// Carry V-item ids forward from a previous run, matching on `section_ref`.
///
/// A matched finding keeps its previous id wherever it now sits in the
/// input. Unmatched findings get fresh ids above the highest number the
/// previous report ever issued, in `fragment_id` order, so numbering gaps
/// are preserved and no id is reused or reordered.
pub fn map_v_items_from_previous(new_findings: &mut [Finding], previous_findings: &[Finding]) {
    let mut previous_by_section: HashMap<&str, &str> = HashMap::new();
    for finding in previous_findings {
        if !finding.v_item_id.is_empty() {
            previous_by_section.insert(finding.section_ref.as_str(), finding.v_item_id.as_str());
        }
    }

    let mut max_id = previous_findings
        .iter()
        .map(|finding| extract_v_number(&finding.v_item_id))
        .max()
        .unwrap_or(0);

    let mut unmatched: Vec<usize> = Vec::new();
    for (index, finding) in new_findings.iter_mut().enumerate() {
        match previous_by_section.get(finding.section_ref.as_str()) {
            Some(&previous_id) => {
                finding.v_item_id = previous_id.to_string();
                max_id = max_id.max(extract_v_number(previous_id));
            }
            None => unmatched.push(index),
        }
    }

    unmatched.sort_by(|&a, &b| {
        new_findings[a]
            .fragment_id
            .cmp(&new_findings[b].fragment_id)
    });

    let mut next_id = max_id + 1;
    for index in unmatched {
        new_findings[index].v_item_id = format!("V{next_id}");
        next_id += 1;
    }
}
