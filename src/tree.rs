// File tree formatting: rebuilds a directory hierarchy from the flat
// `fileTree` list the API returns and renders it with box-drawing
// connectors.

use std::collections::BTreeMap;

/// Printed instead of a tree when there is nothing to show.
pub const NO_FILES: &str = "No files found";

/// One node of the reconstructed hierarchy. Children are kept in a
/// `BTreeMap` so iteration is already in byte-wise name order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeNode {
    File,
    Directory(BTreeMap<String, TreeNode>),
}

impl TreeNode {
    fn empty_dir() -> Self {
        TreeNode::Directory(BTreeMap::new())
    }

    /// Children of this node, turning a file slot into an empty directory
    /// first.
    fn children_mut(&mut self) -> &mut BTreeMap<String, TreeNode> {
        match *self {
            TreeNode::Directory(ref mut children) => children,
            TreeNode::File => {
                *self = TreeNode::empty_dir();
                self.children_mut()
            }
        }
    }
}

/// Directory tree built from slash-delimited relative paths.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FileTree {
    root: BTreeMap<String, TreeNode>,
}

impl FileTree {
    pub fn from_paths<S: AsRef<str>>(paths: &[S]) -> Self {
        let mut tree = FileTree::default();
        for path in paths {
            tree.insert(path.as_ref());
        }
        tree
    }

    /// Adds one path. Empty segments are skipped and a trailing `/` marks
    /// the whole path as directories.
    ///
    /// A name used both as a file and as a directory ends up as a
    /// directory, whichever order the paths arrive in.
    pub fn insert(&mut self, path: &str) {
        let is_dir = path.ends_with('/');
        let segments: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();
        let Some((last, parents)) = segments.split_last() else {
            return;
        };

        let mut level = &mut self.root;
        for segment in parents {
            level = level
                .entry((*segment).to_string())
                .or_insert_with(TreeNode::empty_dir)
                .children_mut();
        }

        if is_dir {
            level
                .entry((*last).to_string())
                .or_insert_with(TreeNode::empty_dir)
                .children_mut();
        } else {
            level.entry((*last).to_string()).or_insert(TreeNode::File);
        }
    }

    pub fn is_empty(&self) -> bool {
        self.root.is_empty()
    }

    /// Renders the tree, or [`NO_FILES`] when it is empty.
    pub fn render(&self) -> String {
        if self.is_empty() {
            return NO_FILES.to_string();
        }
        let mut out = String::new();
        render_level(&self.root, "", &mut out);
        out
    }
}

fn render_level(level: &BTreeMap<String, TreeNode>, prefix: &str, out: &mut String) {
    let count = level.len();
    for (i, (name, node)) in level.iter().enumerate() {
        let is_last = i + 1 == count;
        out.push_str(prefix);
        out.push_str(if is_last { "└── " } else { "├── " });
        out.push_str(name);
        match node {
            TreeNode::File => out.push('\n'),
            TreeNode::Directory(children) => {
                out.push_str("/\n");
                let child_prefix = format!("{}{}", prefix, if is_last { "    " } else { "│   " });
                render_level(children, &child_prefix, out);
            }
        }
    }
}

/// Shorthand for `FileTree::from_paths(paths).render()`.
pub fn format_file_tree<S: AsRef<str>>(paths: &[S]) -> String {
    FileTree::from_paths(paths).render()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_input_renders_sentinel() {
        assert_eq!(format_file_tree::<&str>(&[]), "No files found");
        assert_eq!(format_file_tree(&["", "/", "//"]), "No files found");
    }

    #[test]
    fn sorts_directories_and_files() {
        let out = format_file_tree(&["b/x", "a/y", "a/x"]);
        assert_eq!(
            out,
            "├── a/\n\
             │   ├── x\n\
             │   └── y\n\
             └── b/\n    \
             └── x\n"
        );
    }

    #[test]
    fn single_child_uses_closing_connector() {
        assert_eq!(format_file_tree(&["only.txt"]), "└── only.txt\n");
    }

    #[test]
    fn nested_prefixes_follow_open_branches() {
        let out = format_file_tree(&[
            "Browsers/Chrome/Default/Cookies.txt",
            "Browsers/Chrome/Default/Passwords.txt",
            "Browsers/Firefox/logins.json",
            "System/info.txt",
        ]);
        let expected = "\
├── Browsers/
│   ├── Chrome/
│   │   └── Default/
│   │       ├── Cookies.txt
│   │       └── Passwords.txt
│   └── Firefox/
│       └── logins.json
└── System/
    └── info.txt
";
        assert_eq!(out, expected);
    }

    #[test]
    fn ordering_is_case_sensitive_byte_order() {
        let out = format_file_tree(&["b", "B", "a", "_x"]);
        assert_eq!(out, "├── B\n├── _x\n├── a\n└── b\n");
    }

    #[test]
    fn rendering_is_deterministic() {
        let paths = ["z/1", "a/b/c", "a/b/d", "m", "a/e"];
        let mut reversed = paths;
        reversed.reverse();
        let first = format_file_tree(&paths);
        assert_eq!(first, format_file_tree(&paths));
        assert_eq!(first, format_file_tree(&reversed));
    }

    #[test]
    fn duplicates_collapse() {
        assert_eq!(format_file_tree(&["a/b", "a/b"]), format_file_tree(&["a/b"]));
    }

    #[test]
    fn file_then_directory_merges_as_directory() {
        let expected = "└── logs/\n    └── today.txt\n";
        assert_eq!(format_file_tree(&["logs", "logs/today.txt"]), expected);
        assert_eq!(format_file_tree(&["logs/today.txt", "logs"]), expected);
    }

    #[test]
    fn nested_paths_under_a_former_file() {
        let mut tree = FileTree::from_paths(&["a/b", "a/b/c/d.txt", "a/b/"]);
        tree.insert("a/b/c/e.txt");
        assert_eq!(
            tree.render(),
            "└── a/\n    \
             └── b/\n        \
             └── c/\n            \
             ├── d.txt\n            \
             └── e.txt\n"
        );
    }

    #[test]
    fn trailing_slash_marks_directory() {
        assert_eq!(format_file_tree(&["empty/"]), "└── empty/\n");
        assert_eq!(format_file_tree(&["/abs//path"]), "└── abs/\n    └── path\n");
    }
}
