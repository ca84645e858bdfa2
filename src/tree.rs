//! Directory tree view.
//!
//! Builds a node tree from root-relative record paths and renders it with
//! the glyphs of a [`RenderStyle`].

use crate::output::RenderStyle;
use crate::record::FileRecord;

/// The type of a tree node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NodeKind {
    Directory,
    File,
}

/// A node in the file tree.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileNode {
    /// Single path segment (the root is `.`).
    pub name: String,
    pub kind: NodeKind,
    /// Children in first-discovery order.
    children: Vec<FileNode>,
}

impl FileNode {
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::Directory,
            children: Vec::new(),
        }
    }

    pub fn file(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: NodeKind::File,
            children: Vec::new(),
        }
    }

    pub fn is_directory(&self) -> bool {
        self.kind == NodeKind::Directory
    }

    pub fn is_file(&self) -> bool {
        self.kind == NodeKind::File
    }

    pub fn children(&self) -> &[FileNode] {
        &self.children
    }

    /// Insert a `/`-separated path below this node.
    ///
    /// Intermediate segments become directories; the last one a file. A
    /// segment that already exists is reused.
    pub fn insert_path(&mut self, path: &str) {
        let mut segments = path.split('/').filter(|s| !s.is_empty()).peekable();
        let mut node = self;

        while let Some(segment) = segments.next() {
            let is_leaf = segments.peek().is_none();
            let index = match node.children.iter().position(|c| c.name == segment) {
                Some(index) => index,
                None => {
                    let child = if is_leaf {
                        FileNode::file(segment)
                    } else {
                        FileNode::directory(segment)
                    };
                    node.children.push(child);
                    node.children.len() - 1
                }
            };

            node = &mut node.children[index];
            if !is_leaf {
                node.kind = NodeKind::Directory;
            }
        }
    }

    /// Count files in this tree.
    pub fn file_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 1,
            NodeKind::Directory => self.children.iter().map(|c| c.file_count()).sum(),
        }
    }

    /// Count directories in this tree, this node included.
    pub fn directory_count(&self) -> usize {
        match self.kind {
            NodeKind::File => 0,
            NodeKind::Directory => {
                1 + self.children.iter().map(|c| c.directory_count()).sum::<usize>()
            }
        }
    }
}

/// Build a tree rooted at `.` from root-relative paths.
///
/// Paths are sorted first, so sibling order is lexicographic by full path.
pub fn build_tree<'a>(paths: impl IntoIterator<Item = &'a str>) -> FileNode {
    let mut sorted: Vec<&str> = paths.into_iter().collect();
    sorted.sort_unstable();
    sorted.dedup();

    let mut root = FileNode::directory(".");
    for path in sorted {
        root.insert_path(path);
    }
    root
}

/// Render the tree view of `records`, summary line included.
///
/// An empty record set renders as the empty string.
///
/// # Examples
///
/// ```
/// use promptcat::output::RenderStyle;
/// use promptcat::record::FileRecord;
/// use promptcat::tree::render_tree;
///
/// let records = vec![
///     FileRecord::unloaded("a/b.txt", 1),
///     FileRecord::unloaded("d.txt", 1),
/// ];
/// let output = render_tree(&records, &RenderStyle::default());
/// assert!(output.ends_with("2 directories, 2 files\n"));
/// ```
pub fn render_tree(records: &[FileRecord], style: &RenderStyle) -> String {
    if records.is_empty() {
        return String::new();
    }

    let root = build_tree(records.iter().map(|r| r.path.as_str()));
    render_node_tree(&root, style)
}

/// Render an already built tree.
pub fn render_node_tree(root: &FileNode, style: &RenderStyle) -> String {
    let mut output = String::with_capacity(4096);
    output.push_str(&root.name);
    output.push('\n');
    render_children(&mut output, root, "", style);

    output.push_str(&format!(
        "\n{} directories, {} files\n",
        root.directory_count(),
        root.file_count()
    ));
    output
}

fn render_children(output: &mut String, node: &FileNode, prefix: &str, style: &RenderStyle) {
    let child_count = node.children.len();
    for (i, child) in node.children.iter().enumerate() {
        let is_last = i + 1 == child_count;
        let glyph = if is_last { style.last_branch } else { style.branch };

        output.push_str(prefix);
        output.push_str(glyph);
        output.push(' ');
        output.push_str(&child.name);
        output.push('\n');

        if child.is_directory() {
            let continuation = if is_last { style.space } else { style.vertical };
            let child_prefix = format!("{prefix}{continuation}");
            render_children(output, child, &child_prefix, style);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn records(paths: &[&str]) -> Vec<FileRecord> {
        paths.iter().map(|p| FileRecord::unloaded(*p, 0)).collect()
    }

    #[test]
    fn test_insert_path() {
        let mut root = FileNode::directory(".");
        root.insert_path("src/main.rs");
        root.insert_path("src/lib.rs");

        assert_eq!(root.children().len(), 1);
        let src = &root.children()[0];
        assert!(src.is_directory());
        assert_eq!(src.children().len(), 2);
        assert!(src.children()[0].is_file());
    }

    #[test]
    fn test_counts() {
        let root = build_tree(["a/b.txt", "a/c.txt", "d.txt"]);
        assert_eq!(root.directory_count(), 2);
        assert_eq!(root.file_count(), 3);
    }

    #[test]
    fn test_build_tree_sorts_and_dedups() {
        let root = build_tree(["z.txt", "a/b.txt", "z.txt"]);
        let names: Vec<_> = root.children().iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, ["a", "z.txt"]);
        assert_eq!(root.file_count(), 2);
    }

    #[test]
    fn test_render_exact() {
        let output = render_tree(
            &records(&["d.txt", "a/c.txt", "a/b.txt"]),
            &RenderStyle::default(),
        );
        let expected = ".\n\
                        ├─ a\n\
                        │ ├─ b.txt\n\
                        │ └─ c.txt\n\
                        └─ d.txt\n\
                        \n\
                        2 directories, 3 files\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_render_last_directory_uses_spaces() {
        let output = render_tree(&records(&["a.txt", "z/y/x.txt"]), &RenderStyle::default());
        let expected = ".\n\
                        ├─ a.txt\n\
                        └─ z\n\
                        \x20 └─ y\n\
                        \x20   └─ x.txt\n\
                        \n\
                        3 directories, 2 files\n";
        assert_eq!(output, expected);
    }

    #[test]
    fn test_render_empty() {
        assert_eq!(render_tree(&[], &RenderStyle::default()), "");
    }

    #[test]
    fn test_render_custom_style() {
        let style = RenderStyle {
            branch: "|-",
            last_branch: "`-",
            vertical: "| ",
            space: "  ",
            ..RenderStyle::default()
        };
        let output = render_tree(&records(&["a/b.txt", "c.txt"]), &style);
        assert!(output.contains("|- a\n| `- b.txt\n`- c.txt\n"));
    }
}
