use crate::path_tree::{NodeId, ROOT};
use crate::selection::{SelectionModel, TriState};
use std::collections::HashSet;

/// One visible line of the interactive tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TreeRow {
    pub node: NodeId,
    /// Connector-drawn label, e.g. `│  ├─ lib/`.
    pub label: String,
    pub is_dir: bool,
    pub expanded: bool,
    pub state: TriState,
}

/// Project the model into display rows in canonical depth-first order.
///
/// Children of directories in `collapsed` are skipped. When `only` is given,
/// nodes outside that set are hidden as well.
pub fn render_rows<M>(
    model: &SelectionModel<M>,
    collapsed: &HashSet<NodeId>,
    only: Option<&HashSet<NodeId>>,
) -> Vec<TreeRow> {
    let mut rows = Vec::new();
    let top_level = kept_children(model, ROOT, only);
    for id in top_level {
        push_rows(model, collapsed, only, id, None, &mut rows);
    }
    rows
}

fn kept_children<M>(
    model: &SelectionModel<M>,
    id: NodeId,
    only: Option<&HashSet<NodeId>>,
) -> Vec<NodeId> {
    model
        .tree()
        .node(id)
        .children()
        .iter()
        .copied()
        .filter(|c| only.is_none_or(|set| set.contains(c)))
        .collect()
}

// `guide` is None for top-level rows, which are drawn without connectors.
fn push_rows<M>(
    model: &SelectionModel<M>,
    collapsed: &HashSet<NodeId>,
    only: Option<&HashSet<NodeId>>,
    id: NodeId,
    guide: Option<(&str, bool)>,
    rows: &mut Vec<TreeRow>,
) {
    let node = model.tree().node(id);
    let is_dir = node.is_dir();
    let expanded = is_dir && !collapsed.contains(&id);

    let mut label = String::new();
    let child_guide = match guide {
        None => String::new(),
        Some((prefix, is_last)) => {
            label.push_str(prefix);
            label.push_str(if is_last { "└─ " } else { "├─ " });
            format!("{}{}", prefix, if is_last { "   " } else { "│  " })
        }
    };
    label.push_str(&node.name);
    if is_dir && !node.name.ends_with('/') {
        label.push('/');
    }

    rows.push(TreeRow {
        node: id,
        label,
        is_dir,
        expanded,
        state: model.state(id),
    });

    if !expanded {
        return;
    }
    let children = kept_children(model, id, only);
    let last = children.len().saturating_sub(1);
    for (i, child) in children.into_iter().enumerate() {
        push_rows(model, collapsed, only, child, Some((child_guide.as_str(), i == last)), rows);
    }
}

/// Nodes whose name contains `needle` (case-insensitive), plus all their ancestors.
pub fn matching_nodes<M>(model: &SelectionModel<M>, needle: &str) -> HashSet<NodeId> {
    let needle = needle.to_lowercase();
    let tree = model.tree();
    let mut keep = HashSet::new();
    for id in tree.preorder() {
        if !tree.node(id).name.to_lowercase().contains(&needle) {
            continue;
        }
        let mut current = Some(id);
        while let Some(idx) = current {
            if idx == ROOT || !keep.insert(idx) {
                break;
            }
            current = tree.parent(idx);
        }
    }
    keep
}
