//! Collision-free class naming across the artifact families of one API.
//!
//! The registry works on a kind-independent *stem*. Every kind keeps its
//! own stem table, but the candidate sequence for a path depends only on
//! the path and the stems already issued, so two kinds that walk the same
//! tree in the same order reach the same stems. Final names are
//! `stem + suffix`, which lets the mapper swap `Response` for `Entity`
//! without re-deriving anything.

use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::domain::ident::pascal;

/// One of the parallel class families generated from a shape.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ArtifactKind {
    Body,
    Response,
    Entity,
    Mapper,
}

impl ArtifactKind {
    pub const fn suffix(&self) -> &'static str {
        match self {
            Self::Body => "Body",
            Self::Response => "Response",
            Self::Entity => "Entity",
            Self::Mapper => "Mapper",
        }
    }

    pub const fn as_str(&self) -> &'static str {
        match self {
            Self::Body => "body",
            Self::Response => "response",
            Self::Entity => "entity",
            Self::Mapper => "mapper",
        }
    }
}

impl fmt::Display for ArtifactKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Field-name chain from the root object to a nested object node.
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash)]
pub struct TypePath(Vec<String>);

impl TypePath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn child(&self, field: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(field.to_string());
        Self(segments)
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }
}

impl fmt::Display for TypePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.0.is_empty() {
            f.write_str("$")
        } else {
            write!(f, "$.{}", self.0.join("."))
        }
    }
}

#[derive(Debug, Default)]
struct KindTable {
    stems: HashMap<TypePath, String>,
    taken: HashSet<String>,
    order: Vec<String>,
}

/// Name allocator scoped to one API generation call.
#[derive(Debug)]
pub struct ClassNameRegistry {
    api_stem: String,
    /// Root stems of sibling APIs on the same page.
    reserved: HashSet<String>,
    tables: HashMap<ArtifactKind, KindTable>,
}

impl ClassNameRegistry {
    pub fn new(api_name: &str) -> Self {
        Self {
            api_stem: pascal(api_name),
            reserved: HashSet::new(),
            tables: HashMap::new(),
        }
    }

    /// Keep nested classes off the root names of the other APIs of a page.
    /// The page's aggregate files import every API's models unprefixed.
    pub fn reserving<I, S>(mut self, api_names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        for name in api_names {
            let stem = pascal(name.as_ref());
            if stem != self.api_stem {
                self.reserved.insert(stem);
            }
        }
        self
    }

    /// Pascal-case API name, the root stem of every kind.
    pub fn api_stem(&self) -> &str {
        &self.api_stem
    }

    /// Allocate (or look up) the class name for `path` in `kind`.
    pub fn allocate(
        &mut self,
        path: &TypePath,
        base_name: &str,
        kind: ArtifactKind,
        is_root: bool,
    ) -> String {
        let api_stem = self.api_stem.clone();
        let reserved = &self.reserved;
        let table = self.tables.entry(kind).or_default();

        if let Some(stem) = table.stems.get(path) {
            return format!("{stem}{}", kind.suffix());
        }

        let stem = candidates(&api_stem, path, base_name, is_root)
            .find(|candidate| {
                !table.taken.contains(candidate) && !reserved.contains(candidate)
            })
            .unwrap_or_else(|| unreachable!("candidate sequence is unbounded"));

        table.taken.insert(stem.clone());
        table.stems.insert(path.clone(), stem.clone());
        table.order.push(format!("{stem}{}", kind.suffix()));
        format!("{stem}{}", kind.suffix())
    }

    /// Name already issued for `path` in `kind`.
    pub fn lookup(&self, path: &TypePath, kind: ArtifactKind) -> Option<String> {
        self.tables
            .get(&kind)
            .and_then(|t| t.stems.get(path))
            .map(|stem| format!("{stem}{}", kind.suffix()))
    }

    /// Name of the class at `path` in `to`, derived from the stem issued
    /// in `from`.
    pub fn counterpart(&self, path: &TypePath, from: ArtifactKind, to: ArtifactKind) -> Option<String> {
        self.tables
            .get(&from)
            .and_then(|t| t.stems.get(path))
            .map(|stem| format!("{stem}{}", to.suffix()))
    }

    /// Stem issued for `path` in `kind`.
    pub fn stem(&self, path: &TypePath, kind: ArtifactKind) -> Option<&str> {
        self.tables
            .get(&kind)
            .and_then(|t| t.stems.get(path))
            .map(String::as_str)
    }

    /// All names issued for `kind`, in allocation order.
    pub fn names(&self, kind: ArtifactKind) -> Vec<String> {
        self.tables
            .get(&kind)
            .map(|t| t.order.clone())
            .unwrap_or_default()
    }
}

/// Stem candidates for a node, most preferred first. Never exhausts.
fn candidates<'a>(
    api_stem: &'a str,
    path: &'a TypePath,
    base_name: &'a str,
    is_root: bool,
) -> impl Iterator<Item = String> + 'a {
    let base = pascal(base_name);

    let qualified: Vec<String> = if is_root {
        vec![base.clone()]
    } else {
        // Prepend enclosing field names, nearest first.
        let parents = &path.segments()[..path.segments().len().saturating_sub(1)];
        let mut out = vec![base.clone()];
        let mut prefix = String::new();
        for parent in parents.iter().rev() {
            prefix = format!("{}{}", pascal(parent), prefix);
            out.push(format!("{prefix}{base}"));
        }
        out.push(format!("{api_stem}{prefix}{base}"));
        out
    };

    let last = qualified.last().cloned().unwrap_or(base);
    qualified
        .into_iter()
        .chain((2usize..).map(move |n| format!("{last}{n}")))
}
