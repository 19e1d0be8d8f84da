//! Structured model of an aggregate file.
//!
//! Aggregate files collect generated code from many APIs. Every generated
//! piece sits between a pair of marker comments keyed by section and API,
//! and every section ends with an anchor that new blocks are inserted in
//! front of:
//!
//! ```text
//! abstract class AuthRemoteDataSource {
//!   // strata:begin remote_data_source login
//!   Future<LoginResponse> login(LoginBody body);
//!   // strata:end remote_data_source login
//!   // strata:anchor remote_data_source
//! }
//! ```
//!
//! Everything outside blocks is kept verbatim, so hand-written code around
//! the markers survives regeneration.

use std::collections::HashSet;
use std::fmt;
use std::sync::LazyLock;

use regex::Regex;

use crate::domain::error::DomainError;

const BEGIN: &str = "// strata:begin ";
const END: &str = "// strata:end ";
const ANCHOR: &str = "// strata:anchor ";

static DIRECTIVE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r#"^\s*(import|export|part)\s+(['"])([^'"]+)['"](?:\s+deferred)?(?:\s+as\s+(\w+))?((?:\s+(?:show|hide)\s+[\w\s,]+?)*)\s*;\s*$"#,
    )
    .expect("directive pattern is valid")
});

/// Identity of a generated block.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockKey {
    pub section: String,
    pub api: String,
}

impl BlockKey {
    pub fn new(section: impl Into<String>, api: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            api: api.into(),
        }
    }
}

impl fmt::Display for BlockKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.section, self.api)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    pub key: BlockKey,
    pub indent: String,
    /// Lines between the markers, already indented.
    pub lines: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Node {
    Line(String),
    Block(Block),
    Anchor { section: String, indent: String },
}

impl Node {
    fn is_blank(&self) -> bool {
        matches!(self, Node::Line(l) if l.trim().is_empty())
    }

    fn is_block(&self) -> bool {
        matches!(self, Node::Block(_))
    }
}

/// How an upsert landed in the document.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Placement {
    Replaced,
    Inserted,
    /// The section anchor was missing; the section was re-created at the
    /// end of the file.
    Appended,
}

/// Outline of one section, used to create a missing file or re-create a
/// section whose anchor was edited away.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SectionSkeleton {
    pub section: String,
    pub open: Vec<String>,
    pub indent: String,
    pub close: Vec<String>,
}

impl SectionSkeleton {
    pub fn new(section: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            open: Vec::new(),
            indent: String::new(),
            close: Vec::new(),
        }
    }

    /// Section wrapped in a class-like body: blocks are indented two spaces.
    pub fn braced(section: impl Into<String>, open_line: impl Into<String>) -> Self {
        Self {
            section: section.into(),
            open: vec![open_line.into()],
            indent: "  ".into(),
            close: vec!["}".into()],
        }
    }

    fn nodes(&self) -> Vec<Node> {
        let mut nodes: Vec<Node> = self.open.iter().cloned().map(Node::Line).collect();
        nodes.push(Node::Anchor {
            section: self.section.clone(),
            indent: self.indent.clone(),
        });
        nodes.extend(self.close.iter().cloned().map(Node::Line));
        nodes
    }
}

/// Outline of a whole aggregate file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Skeleton {
    pub header: Vec<String>,
    pub sections: Vec<SectionSkeleton>,
}

impl Skeleton {
    pub fn section(&self, name: &str) -> Option<&SectionSkeleton> {
        self.sections.iter().find(|s| s.section == name)
    }

    /// Empty document with header, every section and its anchor.
    pub fn document(&self) -> AggregateDocument {
        let mut nodes: Vec<Node> = self.header.iter().cloned().map(Node::Line).collect();
        for section in &self.sections {
            if !nodes.is_empty() {
                nodes.push(Node::Line(String::new()));
            }
            nodes.extend(section.nodes());
        }
        AggregateDocument { nodes }
    }
}

/// Parsed aggregate file.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct AggregateDocument {
    nodes: Vec<Node>,
}

impl AggregateDocument {
    pub fn parse(content: &str) -> Result<Self, DomainError> {
        let mut nodes = Vec::new();
        let mut seen = HashSet::new();
        let mut open: Option<(Block, usize)> = None;

        for (index, raw) in content.lines().enumerate() {
            let line_no = index + 1;
            let trimmed = raw.trim_start();
            let indent = &raw[..raw.len() - trimmed.len()];

            if let Some(rest) = trimmed.strip_prefix(BEGIN) {
                let key = parse_key(rest, line_no)?;
                if let Some((block, _)) = &open {
                    return Err(malformed(&block.key, line_no, "nested begin marker"));
                }
                if !seen.insert(key.clone()) {
                    return Err(malformed(&key, line_no, "duplicate block"));
                }
                open = Some((
                    Block {
                        key,
                        indent: indent.to_string(),
                        lines: Vec::new(),
                    },
                    line_no,
                ));
            } else if let Some(rest) = trimmed.strip_prefix(END) {
                let key = parse_key(rest, line_no)?;
                match open.take() {
                    Some((block, _)) if block.key == key => nodes.push(Node::Block(block)),
                    Some((block, _)) => {
                        return Err(malformed(
                            &block.key,
                            line_no,
                            &format!("closed by end marker for '{key}'"),
                        ));
                    }
                    None => return Err(malformed(&key, line_no, "end marker without begin")),
                }
            } else if let Some((block, _)) = open.as_mut() {
                block.lines.push(raw.to_string());
            } else if let Some(rest) = trimmed.strip_prefix(ANCHOR) {
                nodes.push(Node::Anchor {
                    section: rest.trim().to_string(),
                    indent: indent.to_string(),
                });
            } else {
                nodes.push(Node::Line(raw.to_string()));
            }
        }

        if let Some((block, line)) = open {
            return Err(malformed(&block.key, line, "begin marker is never closed"));
        }
        Ok(Self { nodes })
    }

    pub fn nodes(&self) -> &[Node] {
        &self.nodes
    }

    pub fn blocks(&self) -> impl Iterator<Item = &Block> {
        self.nodes.iter().filter_map(|n| match n {
            Node::Block(b) => Some(b),
            _ => None,
        })
    }

    pub fn block(&self, key: &BlockKey) -> Option<&Block> {
        self.blocks().find(|b| &b.key == key)
    }

    pub fn has_anchor(&self, section: &str) -> bool {
        self.anchor_index(section).is_some()
    }

    /// Insert or replace the block for `key`. `body` lines are unindented;
    /// they take the indentation of the section anchor.
    pub fn upsert(&mut self, key: &BlockKey, body: &[String], skeleton: &Skeleton) -> Placement {
        if let Some(index) = self.block_index(key) {
            if let Node::Block(block) = &mut self.nodes[index] {
                block.lines = indent_lines(&block.indent, body);
            }
            return Placement::Replaced;
        }

        match self.anchor_index(&key.section) {
            Some(index) => {
                self.insert_before(index, key, body);
                Placement::Inserted
            }
            None => {
                let section = skeleton
                    .section(&key.section)
                    .cloned()
                    .unwrap_or_else(|| SectionSkeleton::new(key.section.clone()));
                if self.nodes.last().is_some_and(|n| !n.is_blank()) {
                    self.nodes.push(Node::Line(String::new()));
                }
                self.nodes.extend(section.nodes());
                if let Some(index) = self.anchor_index(&key.section) {
                    self.insert_before(index, key, body);
                }
                Placement::Appended
            }
        }
    }

    /// Delete the block for `key`, with the blank line that separated it
    /// from a neighbouring block. Returns whether a block was removed.
    pub fn remove(&mut self, key: &BlockKey) -> bool {
        let Some(index) = self.block_index(key) else {
            return false;
        };
        self.nodes.remove(index);

        let before_is_separator = index >= 2
            && self.nodes[index - 1].is_blank()
            && self.nodes[index - 2].is_block();
        let after_is_separator = index + 1 < self.nodes.len()
            && self.nodes[index].is_blank()
            && self.nodes[index + 1].is_block();

        if before_is_separator {
            self.nodes.remove(index - 1);
        } else if after_is_separator {
            self.nodes.remove(index);
        }
        true
    }

    /// Drop `import ... as <prefix>;` lines whose prefix no remaining line
    /// uses. Unprefixed directives are kept. Returns how many were dropped.
    pub fn prune_prefixed_imports(&mut self) -> usize {
        let body: Vec<&str> = self
            .nodes
            .iter()
            .flat_map(|n| match n {
                Node::Line(l) if directive_key(l).is_none() => vec![l.as_str()],
                Node::Block(b) => b.lines.iter().map(String::as_str).collect(),
                _ => Vec::new(),
            })
            .collect();

        let unused = |line: &str| match directive_key(line) {
            Some(DirectiveKey {
                keyword,
                prefix: Some(prefix),
                ..
            }) if keyword == "import" => !body.iter().any(|l| uses_prefix(l, &prefix)),
            _ => false,
        };
        let stale: Vec<usize> = self
            .nodes
            .iter()
            .enumerate()
            .filter(|(_, n)| matches!(n, Node::Line(l) if unused(l)))
            .map(|(i, _)| i)
            .collect();

        for index in stale.iter().rev() {
            self.nodes.remove(*index);
        }
        stale.len()
    }

    /// Add import/export/part lines not already present. New lines go
    /// after the last existing directive, or after the leading comment
    /// header when the file has none. Returns how many were added.
    pub fn merge_imports(&mut self, imports: &[String]) -> usize {
        let mut known: HashSet<DirectiveKey> = self
            .nodes
            .iter()
            .filter_map(|n| match n {
                Node::Line(l) => directive_key(l),
                _ => None,
            })
            .collect();

        let fresh: Vec<String> = imports
            .iter()
            .filter(|line| match directive_key(line) {
                Some(key) => known.insert(key),
                None => false,
            })
            .cloned()
            .collect();
        if fresh.is_empty() {
            return 0;
        }

        let last_directive = self
            .nodes
            .iter()
            .rposition(|n| matches!(n, Node::Line(l) if directive_key(l).is_some()));

        let at = match last_directive {
            Some(index) => index + 1,
            None => {
                let header_end = self
                    .nodes
                    .iter()
                    .position(|n| !matches!(n, Node::Line(l) if l.trim_start().starts_with("//")))
                    .unwrap_or(self.nodes.len());
                let mut lines: Vec<Node> = Vec::new();
                if header_end > 0 {
                    lines.push(Node::Line(String::new()));
                }
                let needs_gap = self.nodes.get(header_end).is_some_and(|n| !n.is_blank());
                let count = fresh.len();
                lines.extend(fresh.into_iter().map(Node::Line));
                if needs_gap {
                    lines.push(Node::Line(String::new()));
                }
                self.nodes.splice(header_end..header_end, lines);
                return count;
            }
        };

        let count = fresh.len();
        self.nodes.splice(at..at, fresh.into_iter().map(Node::Line));
        count
    }

    pub fn render(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            match node {
                Node::Line(line) => push_line(&mut out, line),
                Node::Anchor { section, indent } => {
                    push_line(&mut out, &format!("{indent}{ANCHOR}{section}"))
                }
                Node::Block(block) => {
                    let key = format!("{} {}", block.key.section, block.key.api);
                    push_line(&mut out, &format!("{}{BEGIN}{key}", block.indent));
                    for line in &block.lines {
                        push_line(&mut out, line);
                    }
                    push_line(&mut out, &format!("{}{END}{key}", block.indent));
                }
            }
        }
        out
    }

    fn block_index(&self, key: &BlockKey) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| matches!(n, Node::Block(b) if &b.key == key))
    }

    fn anchor_index(&self, section: &str) -> Option<usize> {
        self.nodes
            .iter()
            .position(|n| matches!(n, Node::Anchor { section: s, .. } if s == section))
    }

    fn insert_before(&mut self, anchor: usize, key: &BlockKey, body: &[String]) {
        let indent = match &self.nodes[anchor] {
            Node::Anchor { indent, .. } => indent.clone(),
            _ => String::new(),
        };
        let block = Node::Block(Block {
            key: key.clone(),
            indent: indent.clone(),
            lines: indent_lines(&indent, body),
        });
        if anchor > 0 && self.nodes[anchor - 1].is_block() {
            self.nodes
                .splice(anchor..anchor, [Node::Line(String::new()), block]);
        } else {
            self.nodes.insert(anchor, block);
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct DirectiveKey {
    keyword: String,
    uri: String,
    prefix: Option<String>,
    combinators: String,
}

fn directive_key(line: &str) -> Option<DirectiveKey> {
    let caps = DIRECTIVE.captures(line)?;
    Some(DirectiveKey {
        keyword: caps[1].to_string(),
        uri: caps[3].to_string(),
        prefix: caps.get(4).map(|m| m.as_str().to_string()),
        combinators: caps
            .get(5)
            .map(|m| m.as_str().split_whitespace().collect::<Vec<_>>().join(" "))
            .unwrap_or_default(),
    })
}

/// Whether `line` contains `prefix.` as a whole identifier.
fn uses_prefix(line: &str, prefix: &str) -> bool {
    let needle = format!("{prefix}.");
    line.match_indices(&needle).any(|(at, _)| {
        !line[..at]
            .chars()
            .next_back()
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == '_')
    })
}

fn parse_key(rest: &str, line: usize) -> Result<BlockKey, DomainError> {
    let mut parts = rest.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(section), Some(api), None) => Ok(BlockKey::new(section, api)),
        _ => Err(DomainError::MalformedBlock {
            key: rest.trim().to_string(),
            line,
            reason: "marker must name a section and an api".into(),
        }),
    }
}

fn malformed(key: &BlockKey, line: usize, reason: &str) -> DomainError {
    DomainError::MalformedBlock {
        key: key.to_string(),
        line,
        reason: reason.to_string(),
    }
}

fn indent_lines(indent: &str, body: &[String]) -> Vec<String> {
    body.iter()
        .map(|line| {
            if line.trim().is_empty() {
                String::new()
            } else {
                format!("{indent}{line}")
            }
        })
        .collect()
}

fn push_line(out: &mut String, line: &str) {
    out.push_str(line);
    out.push('\n');
}
