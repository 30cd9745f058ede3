use crate::error::TreeError;
use crate::ordering::{ROOT_MARKER, SegmentKey, split_segments};
use std::collections::HashMap;

pub type NodeId = usize;

/// The root directory always lives at index 0.
pub const ROOT: NodeId = 0;

/// One input unit: a slash-delimited path plus opaque metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathEntry<M> {
    pub path: String,
    pub meta: M,
}

impl<M> PathEntry<M> {
    pub fn new(path: impl Into<String>, meta: M) -> Self {
        PathEntry {
            path: path.into(),
            meta,
        }
    }
}

#[derive(Debug, Clone)]
pub enum NodeKind<M> {
    Directory { children: Vec<NodeId> },
    File(PathEntry<M>),
}

#[derive(Debug, Clone)]
pub struct Node<M> {
    pub name: String,
    pub parent: Option<NodeId>,
    pub depth: usize,
    pub kind: NodeKind<M>,
}

impl<M> Node<M> {
    pub fn is_dir(&self) -> bool {
        matches!(self.kind, NodeKind::Directory { .. })
    }

    pub fn children(&self) -> &[NodeId] {
        match &self.kind {
            NodeKind::Directory { children } => children,
            NodeKind::File(_) => &[],
        }
    }

    pub fn entry(&self) -> Option<&PathEntry<M>> {
        match &self.kind {
            NodeKind::File(entry) => Some(entry),
            NodeKind::Directory { .. } => None,
        }
    }
}

/// Arena-backed directory hierarchy reconstructed from flat paths.
///
/// Nodes are only ever appended, so a parent's id is always smaller than the
/// ids of its children. Children of every directory are kept in canonical order.
#[derive(Debug, Clone)]
pub struct PathTree<M> {
    nodes: Vec<Node<M>>,
    lookup: HashMap<(NodeId, String), NodeId>,
}

impl<M> PathTree<M> {
    /// Build the hierarchy. Duplicate file paths keep the last entry.
    pub fn build(entries: impl IntoIterator<Item = PathEntry<M>>) -> Result<Self, TreeError> {
        let mut tree = PathTree {
            nodes: vec![Node {
                name: String::new(),
                parent: None,
                depth: 0,
                kind: NodeKind::Directory {
                    children: Vec::new(),
                },
            }],
            lookup: HashMap::new(),
        };

        for entry in entries {
            tree.insert(entry)?;
        }
        tree.sort_children();
        Ok(tree)
    }

    fn insert(&mut self, entry: PathEntry<M>) -> Result<(), TreeError> {
        let segments: Vec<String> = split_segments(&entry.path)
            .into_iter()
            .map(str::to_string)
            .collect();
        let Some((file_name, dirs)) = segments.split_last() else {
            return Err(TreeError::EmptyPath);
        };

        let mut current = ROOT;
        for dir_name in dirs {
            let existing = self.lookup.get(&(current, dir_name.clone())).copied();
            current = match existing {
                Some(existing) if self.nodes[existing].is_dir() => existing,
                Some(_) => {
                    return Err(TreeError::ConflictingPathType {
                        path: entry.path.clone(),
                    });
                }
                None => self.push_node(current, dir_name.clone(), NodeKind::Directory {
                    children: Vec::new(),
                }),
            };
        }

        let existing = self.lookup.get(&(current, file_name.clone())).copied();
        match existing {
            Some(existing) if self.nodes[existing].is_dir() => {
                Err(TreeError::ConflictingPathType { path: entry.path })
            }
            Some(existing) => {
                tracing::debug!(
                    path = %entry.path,
                    "duplicate path in listing, keeping last entry"
                );
                self.nodes[existing].kind = NodeKind::File(entry);
                Ok(())
            }
            None => {
                self.push_node(current, file_name.clone(), NodeKind::File(entry));
                Ok(())
            }
        }
    }

    fn push_node(&mut self, parent: NodeId, name: String, kind: NodeKind<M>) -> NodeId {
        let id = self.nodes.len();
        let depth = self.nodes[parent].depth + 1;
        self.lookup.insert((parent, name.clone()), id);
        self.nodes.push(Node {
            name,
            parent: Some(parent),
            depth,
            kind,
        });
        if let NodeKind::Directory { children } = &mut self.nodes[parent].kind {
            children.push(id);
        }
        id
    }

    fn sort_children(&mut self) {
        for idx in 0..self.nodes.len() {
            let mut children = match &self.nodes[idx].kind {
                NodeKind::Directory { children } => children.clone(),
                NodeKind::File(_) => continue,
            };
            children.sort_by(|&a, &b| self.sibling_key(a).cmp(&self.sibling_key(b)));
            if let NodeKind::Directory { children: slot } = &mut self.nodes[idx].kind {
                *slot = children;
            }
        }
    }

    fn sibling_key(&self, id: NodeId) -> SegmentKey<'_> {
        let node = &self.nodes[id];
        SegmentKey {
            terminal: !node.is_dir(),
            name: &node.name,
        }
    }

    pub fn node(&self, id: NodeId) -> &Node<M> {
        &self.nodes[id]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn root(&self) -> &Node<M> {
        &self.nodes[ROOT]
    }

    pub fn parent(&self, id: NodeId) -> Option<NodeId> {
        self.nodes[id].parent
    }

    /// Full slash-joined path of a node. The root marker becomes the leading `/`.
    pub fn path_of(&self, id: NodeId) -> String {
        let mut names = Vec::new();
        let mut current = Some(id);
        while let Some(idx) = current {
            if idx != ROOT {
                let name = self.nodes[idx].name.as_str();
                names.push(if name == ROOT_MARKER { "" } else { name });
            }
            current = self.nodes[idx].parent;
        }
        names.reverse();
        match names.as_slice() {
            [""] => "/".to_string(),
            _ => names.join("/"),
        }
    }

    /// Look a path up by its segments.
    #[cfg(test)]
    pub fn find(&self, path: &str) -> Option<NodeId> {
        split_segments(path)
            .into_iter()
            .try_fold(ROOT, |current, segment| {
                self.lookup.get(&(current, segment.to_string())).copied()
            })
    }

    /// Depth-first, canonical-order walk over every node below the root.
    pub fn preorder(&self) -> Vec<NodeId> {
        let mut order = Vec::with_capacity(self.nodes.len().saturating_sub(1));
        let mut stack: Vec<NodeId> = self.root().children().iter().rev().copied().collect();
        while let Some(id) = stack.pop() {
            order.push(id);
            stack.extend(self.nodes[id].children().iter().rev());
        }
        order
    }

    /// Every descendant of `id` (excluding `id` itself).
    pub fn descendants(&self, id: NodeId) -> Vec<NodeId> {
        let mut out = Vec::new();
        let mut stack: Vec<NodeId> = self.nodes[id].children().to_vec();
        while let Some(next) = stack.pop() {
            out.push(next);
            stack.extend_from_slice(self.nodes[next].children());
        }
        out
    }

    /// File nodes in canonical order.
    pub fn files(&self) -> Vec<NodeId> {
        self.preorder()
            .into_iter()
            .filter(|&id| !self.nodes[id].is_dir())
            .collect()
    }

    /// Original paths of every file, in canonical order.
    #[cfg(test)]
    pub fn leaf_paths(&self) -> Vec<&str> {
        self.files()
            .into_iter()
            .filter_map(|id| self.nodes[id].entry().map(|e| e.path.as_str()))
            .collect()
    }
}

/// Lowercase extension of a file name, without the dot. Dotfiles and names
/// without a dot have the empty extension.
pub fn extension_of(name: &str) -> String {
    match name.rsplit_once('.') {
        Some((stem, ext)) if !stem.is_empty() => ext.to_lowercase(),
        _ => String::new(),
    }
}

#[derive(Debug, Clone)]
pub struct ExtensionGroup {
    pub extension: String,
    pub members: Vec<NodeId>,
}

/// Cross-cutting index of files by extension, derived once from a finished tree.
#[derive(Debug, Clone, Default)]
pub struct ExtensionIndex {
    groups: Vec<ExtensionGroup>,
    by_extension: HashMap<String, usize>,
}

impl ExtensionIndex {
    /// Groups appear in the order their first member is met in the tree walk.
    pub fn build<M>(tree: &PathTree<M>) -> Self {
        let mut index = ExtensionIndex::default();
        for id in tree.files() {
            let ext = extension_of(&tree.node(id).name);
            let group = match index.by_extension.get(&ext).copied() {
                Some(g) => g,
                None => {
                    index.groups.push(ExtensionGroup {
                        extension: ext.clone(),
                        members: Vec::new(),
                    });
                    index.by_extension.insert(ext, index.groups.len() - 1);
                    index.groups.len() - 1
                }
            };
            index.groups[group].members.push(id);
        }
        index
    }

    pub fn groups(&self) -> &[ExtensionGroup] {
        &self.groups
    }

    pub fn get(&self, extension: &str) -> Option<usize> {
        self.by_extension.get(&extension.to_lowercase()).copied()
    }

    pub fn len(&self) -> usize {
        self.groups.len()
    }

    /// Group indices ordered by descending member count (ties keep first-seen order).
    pub fn by_member_count(&self) -> Vec<usize> {
        let mut order: Vec<usize> = (0..self.groups.len()).collect();
        order.sort_by(|&a, &b| self.groups[b].members.len().cmp(&self.groups[a].members.len()));
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use std::collections::BTreeSet;

    fn tree_of(paths: &[&str]) -> PathTree<()> {
        PathTree::build(paths.iter().map(|p| PathEntry::new(*p, ()))).unwrap()
    }

    fn child_names(tree: &PathTree<()>, id: NodeId) -> Vec<String> {
        tree.node(id)
            .children()
            .iter()
            .map(|&c| tree.node(c).name.clone())
            .collect()
    }

    #[test]
    fn builds_nested_directories() {
        let tree = tree_of(&["src/x.js", "src/y.py", "readme.md"]);
        assert_eq!(child_names(&tree, ROOT), vec!["src", "readme.md"]);
        let src = tree.find("src").unwrap();
        assert!(tree.node(src).is_dir());
        assert_eq!(child_names(&tree, src), vec!["x.js", "y.py"]);
        assert_eq!(tree.path_of(tree.find("src/y.py").unwrap()), "src/y.py");
    }

    #[test]
    fn absolute_paths_get_visible_root_marker() {
        let tree = tree_of(&["/a.txt", "/lib/b.rs"]);
        assert_eq!(child_names(&tree, ROOT), vec!["./"]);
        let marker = tree.root().children()[0];
        assert_eq!(child_names(&tree, marker), vec!["lib", "a.txt"]);
        assert_eq!(tree.node(tree.find("/lib/b.rs").unwrap()).depth, 3);
    }

    #[test]
    fn path_of_maps_root_marker_to_leading_slash() {
        let tree = tree_of(&["/src/a.rs", "/top.txt"]);
        assert_eq!(tree.path_of(tree.find("/src/a.rs").unwrap()), "/src/a.rs");
        assert_eq!(tree.path_of(tree.find("/src").unwrap()), "/src");
        assert_eq!(tree.path_of(tree.root().children()[0]), "/");
    }

    #[test]
    fn duplicate_path_keeps_last_entry() {
        let tree = PathTree::build(vec![
            PathEntry::new("a/b.txt", 1),
            PathEntry::new("a/b.txt", 2),
        ])
        .unwrap();
        let id = tree.find("a/b.txt").unwrap();
        assert_eq!(tree.node(id).entry().unwrap().meta, 2);
        assert_eq!(tree.files().len(), 1);
    }

    #[test]
    fn file_then_directory_with_same_name_conflicts() {
        let err = PathTree::build(vec![PathEntry::new("a", ()), PathEntry::new("a/b", ())])
            .unwrap_err();
        assert_eq!(
            err,
            TreeError::ConflictingPathType {
                path: "a/b".to_string()
            }
        );
    }

    #[test]
    fn directory_then_file_with_same_name_conflicts() {
        let err = PathTree::build(vec![PathEntry::new("a/b", ()), PathEntry::new("a", ())])
            .unwrap_err();
        assert!(matches!(err, TreeError::ConflictingPathType { path } if path == "a"));
    }

    #[test]
    fn empty_path_is_rejected() {
        let err = PathTree::build(vec![PathEntry::new("/", ())]).unwrap_err();
        assert_eq!(err, TreeError::EmptyPath);
    }

    #[test]
    fn parents_precede_children_in_arena() {
        let tree = tree_of(&["z/y/x/w.txt", "a.txt", "z/b.txt"]);
        for id in 1..tree.len() {
            assert!(tree.parent(id).unwrap() < id);
        }
    }

    #[test]
    fn extension_groups_follow_first_seen_order() {
        let tree = tree_of(&["b.py", "a/Main.JS", "a/c.js", "Makefile", ".gitignore"]);
        let index = ExtensionIndex::build(&tree);
        let names: Vec<&str> = index.groups().iter().map(|g| g.extension.as_str()).collect();
        assert_eq!(names, vec!["js", "", "py"]);
        assert_eq!(index.groups()[index.get("JS").unwrap()].members.len(), 2);
        assert_eq!(index.by_member_count()[0], index.get("js").unwrap());
    }

    #[test]
    fn extension_of_handles_edge_cases() {
        assert_eq!(extension_of("main.RS"), "rs");
        assert_eq!(extension_of("archive.tar.gz"), "gz");
        assert_eq!(extension_of("Makefile"), "");
        assert_eq!(extension_of(".env"), "");
    }

    fn file_set_strategy() -> impl Strategy<Value = BTreeSet<String>> {
        let segment = proptest::string::string_regex("[a-c]{1,2}").unwrap();
        let dir = proptest::collection::vec(segment, 0..=3);
        let file = proptest::string::string_regex("[a-c]{1,2}\\.(rs|md)").unwrap();
        proptest::collection::btree_set(
            (dir, file).prop_map(|(dirs, file)| {
                let mut parts = dirs;
                parts.push(file);
                parts.join("/")
            }),
            1..20,
        )
    }

    proptest! {
        #[test]
        fn build_then_flatten_round_trips(paths in file_set_strategy()) {
            let tree = PathTree::build(paths.iter().map(|p| PathEntry::new(p.clone(), ())))
                .unwrap();
            let flattened: BTreeSet<String> =
                tree.leaf_paths().into_iter().map(str::to_string).collect();
            prop_assert_eq!(flattened, paths);
        }

        #[test]
        fn no_directory_is_empty(paths in file_set_strategy()) {
            let tree = PathTree::build(paths.iter().map(|p| PathEntry::new(p.clone(), ())))
                .unwrap();
            for id in tree.preorder() {
                let node = tree.node(id);
                if node.is_dir() {
                    prop_assert!(!node.children().is_empty());
                }
            }
        }
    }
}
