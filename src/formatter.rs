use crate::error::TreeError;
use crate::ordering::compare_paths;
use crate::path_tree::{NodeId, PathEntry, PathTree, ROOT};

/// A selected file together with its fetched body.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileContent {
    pub path: String,
    pub text: String,
}

/// Directory diagram followed by one delimited block per file, in canonical order.
pub fn format_repo_contents(files: &[FileContent]) -> Result<String, TreeError> {
    let mut sorted: Vec<&FileContent> = files.iter().collect();
    sorted.sort_by(|a, b| compare_paths(&a.path, &b.path));

    let tree = PathTree::build(sorted.iter().map(|f| PathEntry::new(f.path.clone(), ())))?;
    let mut index = String::new();
    build_index(&tree, ROOT, "", &mut index);

    let mut blocks = String::new();
    for file in sorted {
        blocks.push_str(&format!("\n\n---\nFile: {}\n---\n\n{}\n", file.path, file.text));
    }

    Ok(format!("Directory Structure:\n\n{index}\n{blocks}"))
}

fn build_index(tree: &PathTree<()>, id: NodeId, prefix: &str, out: &mut String) {
    let children = tree.node(id).children();
    for (i, &child) in children.iter().enumerate() {
        let is_last = i + 1 == children.len();
        let (line_prefix, child_prefix) = if is_last {
            ("└── ", "    ")
        } else {
            ("├── ", "│   ")
        };
        out.push_str(prefix);
        out.push_str(line_prefix);
        out.push_str(&tree.node(child).name);
        out.push('\n');
        if tree.node(child).is_dir() {
            build_index(tree, child, &format!("{prefix}{child_prefix}"), out);
        }
    }
}

/// Rough estimate: GPT-style token ≈ 4 chars (good enough for a summary line)
pub fn approx_tokens(s: &str) -> usize {
    s.chars().count() / 4
}
