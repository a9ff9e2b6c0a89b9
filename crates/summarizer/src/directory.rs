//! Deterministic directory summaries, computed bottom-up after every file in
//! the subtree has its summary bound. Never consults the external service.

use atlas_protocol::{Node, NodeKind};

/// Well-known directory names with templated summaries.
const DIR_CONVENTIONS: &[(&[&str], &str)] = &[
    (
        &["test", "tests", "__tests__", "spec", "specs", "testing"],
        "Automated tests for the surrounding code.",
    ),
    (
        &["doc", "docs", "documentation"],
        "Project documentation.",
    ),
    (
        &["config", "conf", "settings"],
        "Configuration for the project.",
    ),
    (
        &["script", "scripts", "bin", "tools"],
        "Helper scripts and tooling.",
    ),
    (
        &["example", "demos", "samples"],
        "Usage samples and demo material.",
    ),
    (
        &["asset", "assets", "static", "public"],
        "Static assets served or bundled by the project.",
    ),
];

/// Fill in a summary for every directory in the subtree, children first.
pub fn annotate_directories(node: &mut Node) {
    if node.kind != NodeKind::Directory {
        return;
    }
    for child in &mut node.children {
        annotate_directories(child);
    }
    node.summary = Some(directory_summary(node));
}

fn directory_summary(node: &Node) -> String {
    let lowered = node.name.to_lowercase();
    for (names, text) in DIR_CONVENTIONS {
        if names.contains(&lowered.as_str()) {
            return (*text).to_string();
        }
    }

    let files = node
        .children
        .iter()
        .filter(|child| child.kind == NodeKind::File)
        .count();
    let dirs = node.children.len() - files;
    if node.children.is_empty() {
        "Empty directory.".to_string()
    } else {
        format!("Directory containing {files} files and {dirs} subdirectories.")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn summarized_file(path: &str) -> Node {
        let mut node = Node::file(path, path.rsplit('/').next().unwrap(), None, 1);
        node.summary = Some("A file.".into());
        node
    }

    #[test]
    fn conventions_take_precedence() {
        let mut tests = Node::directory("tests", "tests", vec![summarized_file("tests/test_a.py")]);
        annotate_directories(&mut tests);
        assert_eq!(
            tests.summary.as_deref(),
            Some("Automated tests for the surrounding code.")
        );
    }

    #[test]
    fn plain_directories_describe_their_children() {
        let mut root = Node::directory(
            ".",
            "repo",
            vec![
                summarized_file("a.py"),
                summarized_file("b.py"),
                Node::directory("sub", "sub", vec![]),
            ],
        );
        annotate_directories(&mut root);
        assert_eq!(
            root.summary.as_deref(),
            Some("Directory containing 2 files and 1 subdirectories.")
        );
        assert_eq!(
            root.children[2].summary.as_deref(),
            Some("Empty directory.")
        );
        assert!(root.is_fully_summarized());
    }
}
