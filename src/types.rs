/*!
 * Core types and data structures for dirtext
 */

/// Name given to the synthetic root produced by the parser.
/// It is never materialized, only its children are.
pub const ROOT_NAME: &str = "root";

/// Whether a structure entry describes a directory or a file
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Directory that may own children
    Directory,
    /// Regular file that may carry text content
    File,
}

/// A node of the in-memory structure tree
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Node {
    /// Sanitized entry name (duplicates among siblings are allowed)
    pub name: String,
    /// Directory or file
    pub kind: EntryKind,
    /// Child nodes in declaration order (always empty for files)
    pub children: Vec<Node>,
    /// File content (always `None` for directories)
    pub content: Option<String>,
}

impl Node {
    /// Create an empty directory node
    pub fn directory(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::Directory,
            children: Vec::new(),
            content: None,
        }
    }

    /// Create a file node with optional content
    pub fn file(name: impl Into<String>, content: Option<String>) -> Self {
        Self {
            name: name.into(),
            kind: EntryKind::File,
            children: Vec::new(),
            content,
        }
    }

    /// Create the synthetic root of a parsed tree
    pub fn root() -> Self {
        Self::directory(ROOT_NAME)
    }

    pub fn is_directory(&self) -> bool {
        self.kind == EntryKind::Directory
    }

    /// Append a child. Files never own children, so this is a no-op on them.
    pub fn add_child(&mut self, child: Node) -> Option<&mut Node> {
        if !self.is_directory() {
            return None;
        }
        self.children.push(child);
        self.children.last_mut()
    }

    /// Replace the content of a file node. Directories ignore content.
    pub fn set_content(&mut self, content: String) {
        if !self.is_directory() {
            self.content = Some(content);
        }
    }

    /// Find a direct child by name (first match wins)
    pub fn child(&self, name: &str) -> Option<&Node> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Resolve a forward-slash path below this node
    pub fn find(&self, path: &str) -> Option<&Node> {
        path.split('/')
            .filter(|part| !part.is_empty())
            .try_fold(self, |node, part| node.child(part))
    }

    /// Visit every file below this node together with its forward-slash
    /// path relative to this node.
    pub fn for_each_file_mut<F>(&mut self, f: &mut F)
    where
        F: FnMut(&str, &mut Node),
    {
        fn walk<F: FnMut(&str, &mut Node)>(node: &mut Node, prefix: &str, f: &mut F) {
            for child in &mut node.children {
                let path = if prefix.is_empty() {
                    child.name.clone()
                } else {
                    format!("{}/{}", prefix, child.name)
                };
                if child.is_directory() {
                    walk(child, &path, f);
                } else {
                    f(&path, child);
                }
            }
        }

        walk(self, "", f);
    }

    /// Total number of nodes below this one
    pub fn descendant_count(&self) -> usize {
        self.children
            .iter()
            .map(|c| 1 + c.descendant_count())
            .sum()
    }
}
