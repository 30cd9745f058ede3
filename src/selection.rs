use crate::path_tree::{ExtensionIndex, NodeId, PathEntry, PathTree, ROOT, extension_of};
use glob::Pattern;
use std::collections::{BTreeSet, HashSet};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriState {
    Unchecked,
    Checked,
    Indeterminate,
}

impl TriState {
    pub fn from_checked(checked: bool) -> Self {
        if checked {
            TriState::Checked
        } else {
            TriState::Unchecked
        }
    }
}

/// The aggregation rule: uniform children give their state, anything else is
/// indeterminate. An empty set aggregates to `Unchecked`.
pub fn aggregate(states: impl IntoIterator<Item = TriState>) -> TriState {
    let mut any_checked = false;
    let mut any_unchecked = false;
    for state in states {
        match state {
            TriState::Indeterminate => return TriState::Indeterminate,
            TriState::Checked => any_checked = true,
            TriState::Unchecked => any_unchecked = true,
        }
        if any_checked && any_unchecked {
            return TriState::Indeterminate;
        }
    }
    if any_checked {
        TriState::Checked
    } else {
        TriState::Unchecked
    }
}

/// Owned tri-state selection over a [`PathTree`] and its [`ExtensionIndex`].
///
/// Files hold `Checked`/`Unchecked` only. Directory and group states are always
/// derived from their members.
#[derive(Debug, Clone)]
pub struct SelectionModel<M> {
    tree: PathTree<M>,
    extensions: ExtensionIndex,
    node_states: Vec<TriState>,
    group_states: Vec<TriState>,
}

impl<M> SelectionModel<M> {
    /// Files whose extension is in `default_extensions` start out checked.
    pub fn new(tree: PathTree<M>, default_extensions: &HashSet<String>) -> Self {
        let extensions = ExtensionIndex::build(&tree);
        let mut node_states = vec![TriState::Unchecked; tree.len()];
        for id in tree.files() {
            let ext = extension_of(&tree.node(id).name);
            if default_extensions.contains(&ext) {
                node_states[id] = TriState::Checked;
            }
        }
        let group_count = extensions.len();
        let mut model = SelectionModel {
            tree,
            extensions,
            node_states,
            group_states: vec![TriState::Unchecked; group_count],
        };
        model.recompute_all();
        model
    }

    pub fn tree(&self) -> &PathTree<M> {
        &self.tree
    }

    pub fn extensions(&self) -> &ExtensionIndex {
        &self.extensions
    }

    pub fn state(&self, id: NodeId) -> TriState {
        self.node_states[id]
    }

    pub fn group_state(&self, group: usize) -> TriState {
        self.group_states[group]
    }

    /// Toggle a file or directory. Directories cascade to every descendant.
    pub fn toggle_node(&mut self, id: NodeId, checked: bool) {
        let new_state = TriState::from_checked(checked);
        self.node_states[id] = new_state;
        for descendant in self.tree.descendants(id) {
            self.node_states[descendant] = new_state;
        }
        self.recompute_ancestors(id);
        self.recompute_groups();
    }

    /// Toggle every file sharing the group's extension.
    pub fn toggle_extension(&mut self, group: usize, checked: bool) {
        let members = self.extensions.groups()[group].members.clone();
        self.set_files(members, checked);
    }

    /// Set many nodes at once and repair ancestors and groups a single time.
    pub fn set_files(&mut self, ids: impl IntoIterator<Item = NodeId>, checked: bool) {
        let new_state = TriState::from_checked(checked);
        let mut dirty = BTreeSet::new();
        for id in ids {
            self.node_states[id] = new_state;
            for descendant in self.tree.descendants(id) {
                self.node_states[descendant] = new_state;
            }
            let mut parent = self.tree.parent(id);
            while let Some(p) = parent {
                if !dirty.insert(p) {
                    break;
                }
                parent = self.tree.parent(p);
            }
        }
        // Children always have larger ids than their parents.
        for &dir in dirty.iter().rev() {
            self.recompute_directory(dir);
        }
        self.recompute_groups();
    }

    /// Check every file matching one of the glob patterns. Returns how many matched.
    pub fn select_matching(&mut self, patterns: &[Pattern]) -> usize {
        if patterns.is_empty() {
            return 0;
        }
        let matched: Vec<NodeId> = self
            .tree
            .files()
            .into_iter()
            .filter(|&id| {
                self.tree.node(id).entry().is_some_and(|entry| {
                    let relative = entry.path.trim_start_matches('/');
                    patterns.iter().any(|p| p.matches(relative))
                })
            })
            .collect();
        let count = matched.len();
        self.set_files(matched, true);
        count
    }

    fn recompute_directory(&mut self, dir: NodeId) {
        let children = self.tree.node(dir).children();
        if children.is_empty() {
            return;
        }
        self.node_states[dir] = aggregate(children.iter().map(|&c| self.node_states[c]));
    }

    fn recompute_ancestors(&mut self, id: NodeId) {
        let mut parent = self.tree.parent(id);
        while let Some(p) = parent {
            self.recompute_directory(p);
            parent = self.tree.parent(p);
        }
    }

    fn recompute_groups(&mut self) {
        for (idx, group) in self.extensions.groups().iter().enumerate() {
            self.group_states[idx] = aggregate(group.members.iter().map(|&m| self.node_states[m]));
        }
    }

    /// Re-derive every directory and group state from the file states.
    pub fn recompute_all(&mut self) {
        for id in (ROOT..self.tree.len()).rev() {
            if self.tree.node(id).is_dir() {
                self.recompute_directory(id);
            }
        }
        self.recompute_groups();
    }

    /// True if every derived state matches the aggregation of its members.
    #[cfg(test)]
    pub fn is_consistent(&self) -> bool {
        let dirs_ok = (ROOT..self.tree.len()).all(|id| {
            let node = self.tree.node(id);
            !node.is_dir()
                || node.children().is_empty()
                || self.node_states[id]
                    == aggregate(node.children().iter().map(|&c| self.node_states[c]))
        });
        let groups_ok = self.extensions.groups().iter().enumerate().all(|(idx, group)| {
            self.group_states[idx] == aggregate(group.members.iter().map(|&m| self.node_states[m]))
        });
        dirs_ok && groups_ok
    }

    /// Checked files in canonical order.
    pub fn selected_files(&self) -> Vec<&PathEntry<M>> {
        self.tree
            .files()
            .into_iter()
            .filter(|&id| self.node_states[id] == TriState::Checked)
            .filter_map(|id| self.tree.node(id).entry())
            .collect()
    }

    pub fn selected_count(&self) -> usize {
        self.tree
            .files()
            .into_iter()
            .filter(|&id| self.node_states[id] == TriState::Checked)
            .count()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    fn model_of(paths: &[&str], defaults: &[&str]) -> SelectionModel<()> {
        let tree = PathTree::build(paths.iter().map(|p| PathEntry::new(*p, ()))).unwrap();
        let defaults: HashSet<String> = defaults.iter().map(|s| s.to_string()).collect();
        SelectionModel::new(tree, &defaults)
    }

    fn id(model: &SelectionModel<()>, path: &str) -> NodeId {
        model.tree().find(path).unwrap()
    }

    #[test]
    fn aggregation_rule() {
        use TriState::*;
        assert_eq!(aggregate([Checked, Checked]), Checked);
        assert_eq!(aggregate([Unchecked, Unchecked]), Unchecked);
        assert_eq!(aggregate([Checked, Unchecked]), Indeterminate);
        assert_eq!(aggregate([Checked, Indeterminate]), Indeterminate);
        assert_eq!(aggregate([Unchecked, Indeterminate]), Indeterminate);
        assert_eq!(aggregate([]), Unchecked);
    }

    #[test]
    fn checking_directory_checks_children_only() {
        let mut model = model_of(&["src/x.js", "src/y.py", "readme.md"], &[]);
        model.toggle_node(id(&model, "src"), true);
        assert_eq!(model.state(id(&model, "src/x.js")), TriState::Checked);
        assert_eq!(model.state(id(&model, "src/y.py")), TriState::Checked);
        assert_eq!(model.state(id(&model, "readme.md")), TriState::Unchecked);
        assert_eq!(model.state(ROOT), TriState::Indeterminate);
        assert!(model.is_consistent());
    }

    #[test]
    fn default_extensions_are_prechecked() {
        let model = model_of(&["src/x.js", "src/y.py", "readme.md"], &["js"]);
        assert_eq!(model.state(id(&model, "src/x.js")), TriState::Checked);
        assert_eq!(model.state(id(&model, "src")), TriState::Indeterminate);
        assert_eq!(model.selected_count(), 1);
    }

    #[test]
    fn extension_group_toggle_clears_indeterminate_up_the_chain() {
        let mut model = model_of(&["a/one.js", "b/two.js", "b/notes.md"], &[]);
        model.toggle_node(id(&model, "a/one.js"), true);
        let js = model.extensions().get("js").unwrap();
        assert_eq!(model.group_state(js), TriState::Indeterminate);

        model.toggle_extension(js, true);
        assert_eq!(model.group_state(js), TriState::Checked);
        assert_eq!(model.state(id(&model, "b/two.js")), TriState::Checked);
        assert_eq!(model.state(id(&model, "a")), TriState::Checked);
        assert_eq!(model.state(id(&model, "b")), TriState::Indeterminate);

        let md = model.extensions().get("md").unwrap();
        model.toggle_extension(md, true);
        assert_eq!(model.state(id(&model, "b")), TriState::Checked);
        assert_eq!(model.state(ROOT), TriState::Checked);
        assert!(model.is_consistent());
    }

    #[test]
    fn unchecking_directory_updates_groups() {
        let mut model = model_of(&["lib/a.rs", "lib/b.rs", "main.rs"], &["rs"]);
        let rs = model.extensions().get("rs").unwrap();
        assert_eq!(model.group_state(rs), TriState::Checked);
        model.toggle_node(id(&model, "lib"), false);
        assert_eq!(model.group_state(rs), TriState::Indeterminate);
        assert_eq!(model.state(ROOT), TriState::Indeterminate);
    }

    #[test]
    fn selected_files_come_out_in_canonical_order() {
        let mut model = model_of(&["z.txt", "a/b/c.txt", "a/d.txt"], &[]);
        model.toggle_node(ROOT, true);
        let paths: Vec<&str> = model.selected_files().iter().map(|e| e.path.as_str()).collect();
        assert_eq!(paths, vec!["a/b/c.txt", "a/d.txt", "z.txt"]);
    }

    #[test]
    fn glob_preselection_checks_matches() {
        let mut model = model_of(&["/src/main.rs", "/src/lib.rs", "/docs/guide.md"], &[]);
        let patterns = vec![Pattern::new("src/*.rs").unwrap()];
        assert_eq!(model.select_matching(&patterns), 2);
        assert_eq!(model.state(id(&model, "/src")), TriState::Checked);
        let marker = model.tree().root().children()[0];
        assert_eq!(model.tree().node(marker).name, "./");
        assert_eq!(model.state(marker), TriState::Indeterminate);
        assert!(model.is_consistent());
    }

    #[derive(Debug, Clone)]
    enum Op {
        Node(usize, bool),
        Group(usize, bool),
    }

    fn op_strategy() -> impl Strategy<Value = Op> {
        prop_oneof![
            (0usize..64, any::<bool>()).prop_map(|(i, c)| Op::Node(i, c)),
            (0usize..8, any::<bool>()).prop_map(|(i, c)| Op::Group(i, c)),
        ]
    }

    fn paths_strategy() -> impl Strategy<Value = Vec<String>> {
        let segment = proptest::string::string_regex("[a-c]").unwrap();
        let dir = proptest::collection::vec(segment, 0..=3);
        let file = proptest::string::string_regex("[a-c]\\.(rs|md|txt)").unwrap();
        proptest::collection::vec(
            (dir, file).prop_map(|(mut parts, file)| {
                parts.push(file);
                parts.join("/")
            }),
            1..24,
        )
    }

    proptest! {
        #[test]
        fn propagation_stays_consistent_and_is_idempotent(
            paths in paths_strategy(),
            ops in proptest::collection::vec(op_strategy(), 0..16),
        ) {
            let tree =
                PathTree::build(paths.iter().map(|p| PathEntry::new(p.clone(), ()))).unwrap();
            let defaults: HashSet<String> = ["rs".to_string()].into_iter().collect();
            let mut model = SelectionModel::new(tree, &defaults);
            prop_assert!(model.is_consistent());

            for op in ops {
                match op {
                    Op::Node(i, checked) => {
                        let id = i % model.tree().len();
                        model.toggle_node(id, checked);
                    }
                    Op::Group(i, checked) => {
                        let group = i % model.extensions().len();
                        model.toggle_extension(group, checked);
                    }
                }
                prop_assert!(model.is_consistent());
                for file in model.tree().files() {
                    prop_assert_ne!(model.state(file), TriState::Indeterminate);
                }
            }

            let before: Vec<TriState> = (0..model.tree().len()).map(|i| model.state(i)).collect();
            model.recompute_all();
            let after: Vec<TriState> = (0..model.tree().len()).map(|i| model.state(i)).collect();
            prop_assert_eq!(before, after);
        }
    }
}
