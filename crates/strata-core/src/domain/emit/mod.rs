//! Dart emitters.
//!
//! Every class family is produced by the same walker: a depth-first,
//! pre-order pass over the inferred object tree that allocates class names
//! through the [`ClassNameRegistry`] and hands each object node to an
//! [`ArtifactPolicy`]. Policies only decide what a class looks like; the
//! order in which names are allocated is fixed by the walker, which is what
//! keeps Response, Entity and Mapper in step.

pub mod body;
pub mod entity;
pub mod layers;
pub mod mapper;
pub mod response;

use std::collections::HashSet;
use std::path::PathBuf;

use crate::domain::aggregate::{BlockKey, Skeleton};
use crate::domain::api::ApiDefinition;
use crate::domain::ident::camel;
use crate::domain::inference::{ObjectShape, Primitive, SampleDocument, TypeSpec};
use crate::domain::naming::{ArtifactKind, ClassNameRegistry, TypePath};
use crate::domain::project::{GeneratorSettings, PageLayout};

/// First line of every file written whole.
pub const GENERATED_HEADER: &str = "// Generated by strata. Do not edit by hand.";
/// First line of every aggregate file.
pub const AGGREGATE_HEADER: &str =
    "// Generated by strata. Code outside strata blocks is kept on regeneration.";

/// Members generated classes declare themselves. Fields never take these
/// names.
const MEMBER_NAMES: &[&str] = &[
    "toMap",
    "toJson",
    "fromMap",
    "fromJson",
    "listFromJson",
    "copyWith",
    "toEntity",
    "toResponse",
    "hashCode",
    "runtimeType",
    "toString",
    "noSuchMethod",
];

// ── Output units ──────────────────────────────────────────────────────────────

/// A per-API file, written whole.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GeneratedFile {
    pub path: PathBuf,
    /// Path relative to the page directory.
    pub relative: PathBuf,
    pub content: String,
}

/// One API's contribution to one section of an aggregate file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ArtifactFragment {
    pub path: PathBuf,
    pub key: BlockKey,
    pub imports: Vec<String>,
    pub body: Vec<String>,
    /// Class and extension names introduced by the block.
    pub defines: Vec<String>,
    pub skeleton: Skeleton,
}

/// Everything one API produces.
#[derive(Debug, Clone, Default)]
pub struct ApiArtifacts {
    pub files: Vec<GeneratedFile>,
    pub fragments: Vec<ArtifactFragment>,
    /// Blocks that must not exist any more, e.g. a mapper block of an API
    /// that stopped returning a typed model.
    pub stale: Vec<(PathBuf, BlockKey)>,
}

/// Inputs of one API generation call.
#[derive(Debug, Clone)]
pub struct ApiInput<'a> {
    pub api: &'a ApiDefinition,
    pub page: &'a str,
    pub layout: &'a PageLayout,
    pub settings: &'a GeneratorSettings,
    pub body: Option<ObjectShape>,
    pub response: Option<SampleDocument>,
    /// Static headers, in file order.
    pub headers: Vec<(String, String)>,
}

/// Emit every file and fragment of one API.
///
/// Names are allocated Body first, then Response, Entity and Mapper, each
/// in walker order.
pub fn emit_api(input: &ApiInput<'_>, registry: &mut ClassNameRegistry) -> ApiArtifacts {
    let api = input.api;
    let layout = input.layout;
    let mut artifacts = ApiArtifacts::default();

    let body_shape = input.body.clone().unwrap_or_default();
    let body_policy = body::BodyPolicy::new(api, &input.settings.date_format_body);
    let body_classes = walk(&body_shape, &api.name, &body_policy, registry);
    artifacts.files.push(file(
        layout,
        PageLayout::body_rel(&api.name),
        body::render_file(&body_policy, &body_classes, registry),
    ));

    let model = api.return_data.is_model().then(|| {
        input
            .response
            .clone()
            .unwrap_or_default()
    });

    if let Some(model) = &model {
        let response_policy =
            response::ResponsePolicy::new(&input.settings.date_format_response, model.many);
        let response_classes = walk(&model.shape, &api.name, &response_policy, registry);
        artifacts.files.push(file(
            layout,
            PageLayout::response_rel(&api.name),
            response::render_file(&response_policy, &response_classes, registry),
        ));

        let entity_policy = entity::EntityPolicy;
        let entity_classes = walk(&model.shape, &api.name, &entity_policy, registry);
        artifacts.files.push(file(
            layout,
            PageLayout::entity_rel(&api.name),
            entity::render_file(&entity_policy, &entity_classes, registry),
        ));

        let mapper_policy = mapper::MapperPolicy::new(registry.api_stem());
        let mapper_classes = walk(&model.shape, &api.name, &mapper_policy, registry);
        artifacts
            .fragments
            .push(mapper::fragment(input, &mapper_policy, &mapper_classes, registry));
    } else {
        artifacts.stale.push((
            layout.mapper_file(),
            BlockKey::new(mapper::SECTION, api.name.clone()),
        ));
    }

    let signature = layers::Signature::new(input, registry, model.as_ref().map(|m| m.many));
    artifacts.fragments.extend(layers::fragments(input, &signature));
    artifacts.files.push(layers::use_case_file(input, &signature));

    artifacts
}

fn file(layout: &PageLayout, relative: PathBuf, content: String) -> GeneratedFile {
    GeneratedFile {
        path: layout.root().join(&relative),
        relative,
        content,
    }
}

// ── Walker ────────────────────────────────────────────────────────────────────

/// Per-family emission rules.
pub trait ArtifactPolicy {
    /// Family the walker allocates names in.
    fn kind(&self) -> ArtifactKind;

    /// Field identifiers a class at `path` declares besides its fields.
    fn reserved_members(&self, _path: &TypePath) -> Vec<String> {
        Vec::new()
    }

    /// Append the Dart source of one class.
    fn emit_class(&self, class: &ClassDecl, registry: &ClassNameRegistry, out: &mut Vec<String>);
}

/// One object node, ready to be emitted.
#[derive(Debug, Clone, PartialEq)]
pub struct ClassDecl {
    pub name: String,
    pub path: TypePath,
    pub fields: Vec<FieldDecl>,
}

impl ClassDecl {
    pub fn is_root(&self) -> bool {
        self.path.is_root()
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDecl {
    /// Key in the sample document.
    pub key: String,
    /// Dart identifier, unique within the class.
    pub ident: String,
    pub spec: TypeSpec,
    /// Path of the object node this field holds (directly or through lists).
    pub object: Option<TypePath>,
}

impl FieldDecl {
    /// Dart type of the field for `kind`, without nullability.
    pub fn dart_type(&self, registry: &ClassNameRegistry, kind: ArtifactKind) -> String {
        let name = self
            .object
            .as_ref()
            .and_then(|path| registry.lookup(path, kind))
            .unwrap_or_else(|| Primitive::Dynamic.dart().to_string());
        dart_type(&self.spec, &name)
    }

    /// Declared type: nullable unless `dynamic`.
    pub fn declared_type(&self, registry: &ClassNameRegistry, kind: ArtifactKind) -> String {
        nullable(&self.dart_type(registry, kind))
    }
}

/// Walk `shape` depth-first in pre-order, allocating a name for every
/// object node, and describe each node as a [`ClassDecl`].
pub fn walk<P: ArtifactPolicy + ?Sized>(
    shape: &ObjectShape,
    root_name: &str,
    policy: &P,
    registry: &mut ClassNameRegistry,
) -> Vec<ClassDecl> {
    let kind = policy.kind();
    let mut nodes: Vec<(TypePath, &ObjectShape)> = Vec::new();
    collect(shape, TypePath::root(), &mut nodes);

    for (path, _) in &nodes {
        let base = path
            .segments()
            .last()
            .map(String::as_str)
            .unwrap_or(root_name);
        registry.allocate(path, base, kind, path.is_root());
    }

    nodes
        .into_iter()
        .map(|(path, shape)| {
            let mut taken: HashSet<String> = MEMBER_NAMES.iter().map(|s| s.to_string()).collect();
            taken.extend(policy.reserved_members(&path));

            let fields = shape
                .fields()
                .map(|(key, spec)| FieldDecl {
                    key: key.to_string(),
                    ident: unique_ident(key, &mut taken),
                    spec: spec.clone(),
                    object: spec.innermost_object().map(|_| path.child(key)),
                })
                .collect();

            ClassDecl {
                name: registry.lookup(&path, kind).unwrap_or_default(),
                path,
                fields,
            }
        })
        .collect()
}

fn collect<'a>(shape: &'a ObjectShape, path: TypePath, out: &mut Vec<(TypePath, &'a ObjectShape)>) {
    out.push((path.clone(), shape));
    for (key, spec) in shape.fields() {
        if let Some(child) = spec.innermost_object() {
            collect(child, path.child(key), out);
        }
    }
}

fn unique_ident(key: &str, taken: &mut HashSet<String>) -> String {
    let base = camel(key);
    let ident = std::iter::once(base.clone())
        .chain((2usize..).map(|n| format!("{base}{n}")))
        .find(|candidate| !taken.contains(candidate))
        .unwrap_or_else(|| unreachable!("identifier sequence is unbounded"));
    taken.insert(ident.clone());
    ident
}

/// Emit every class of a family, separated by blank lines.
pub fn render_classes<P: ArtifactPolicy + ?Sized>(
    policy: &P,
    classes: &[ClassDecl],
    registry: &ClassNameRegistry,
) -> Vec<String> {
    let mut out = Vec::new();
    for (index, class) in classes.iter().enumerate() {
        if index > 0 {
            out.push(String::new());
        }
        policy.emit_class(class, registry, &mut out);
    }
    out
}

/// Whole per-API file: header, imports, classes.
pub(crate) fn render_whole_file(imports: &[String], classes: Vec<String>) -> String {
    let mut lines = vec![GENERATED_HEADER.to_string(), String::new()];
    if !imports.is_empty() {
        lines.extend(imports.iter().cloned());
        lines.push(String::new());
    }
    lines.extend(classes);
    let mut out = lines.join("\n");
    out.push('\n');
    out
}

/// Shape of a single family as Dart source, without writing anything.
pub fn preview(
    shape: &ObjectShape,
    many: bool,
    name: &str,
    kind: ArtifactKind,
    settings: &GeneratorSettings,
) -> String {
    let mut registry = ClassNameRegistry::new(name);
    match kind {
        ArtifactKind::Body => {
            let policy = body::BodyPolicy::standalone(&settings.date_format_body);
            let classes = walk(shape, name, &policy, &mut registry);
            body::render_file(&policy, &classes, &registry)
        }
        ArtifactKind::Response => {
            let policy = response::ResponsePolicy::new(&settings.date_format_response, many);
            let classes = walk(shape, name, &policy, &mut registry);
            response::render_file(&policy, &classes, &registry)
        }
        ArtifactKind::Entity => {
            let classes = walk(shape, name, &entity::EntityPolicy, &mut registry);
            entity::render_file(&entity::EntityPolicy, &classes, &registry)
        }
        ArtifactKind::Mapper => {
            walk(shape, name, &response::ResponsePolicy::new("", many), &mut registry);
            walk(shape, name, &entity::EntityPolicy, &mut registry);
            let policy = mapper::MapperPolicy::new(registry.api_stem());
            let classes = walk(shape, name, &policy, &mut registry);
            let mut out = render_classes(&policy, &classes, &registry).join("\n");
            out.push('\n');
            out
        }
    }
}

// ── Dart expression helpers ───────────────────────────────────────────────────

/// Dart type of `spec`, with `object` naming the innermost class.
pub fn dart_type(spec: &TypeSpec, object: &str) -> String {
    match spec {
        TypeSpec::Primitive(p) => p.dart().to_string(),
        TypeSpec::Object(_) => object.to_string(),
        TypeSpec::List(element) => format!("List<{}>", dart_type(element, object)),
    }
}

pub fn nullable(ty: &str) -> String {
    if ty == "dynamic" {
        ty.to_string()
    } else {
        format!("{ty}?")
    }
}

fn needs_conversion(spec: &TypeSpec) -> bool {
    match spec {
        TypeSpec::Primitive(Primitive::DateTime) | TypeSpec::Object(_) => true,
        TypeSpec::Primitive(_) => false,
        TypeSpec::List(element) => needs_conversion(element),
    }
}

/// Expression turning a field value into its map representation.
pub fn encode(spec: &TypeSpec, expr: &str, optional: bool, date_format: &str, depth: usize) -> String {
    let q = if optional { "?" } else { "" };
    match spec {
        TypeSpec::Primitive(Primitive::DateTime) => format!("{expr}{q}.{date_format}"),
        TypeSpec::Primitive(_) => expr.to_string(),
        TypeSpec::Object(_) => format!("{expr}{q}.toMap()"),
        TypeSpec::List(element) if needs_conversion(element) => {
            let var = format!("e{depth}");
            format!(
                "{expr}{q}.map(({var}) => {}).toList()",
                encode(element, &var, false, date_format, depth + 1)
            )
        }
        TypeSpec::List(_) => expr.to_string(),
    }
}

/// Expression reading a possibly-missing, possibly-mistyped value. Never
/// throws; anything that does not convert becomes `null`.
pub fn decode(spec: &TypeSpec, expr: &str, object: &str, depth: usize) -> String {
    match spec {
        TypeSpec::Primitive(Primitive::Int) => {
            format!("int.tryParse({expr}?.toString() ?? '')")
        }
        TypeSpec::Primitive(Primitive::Double) => {
            format!("double.tryParse({expr}?.toString() ?? '')")
        }
        TypeSpec::Primitive(Primitive::Bool) => {
            format!("bool.tryParse({expr}?.toString() ?? '')")
        }
        TypeSpec::Primitive(Primitive::String) => format!("{expr}?.toString()"),
        TypeSpec::Primitive(Primitive::DateTime) => {
            format!("DateTime.tryParse({expr}?.toString() ?? '')")
        }
        TypeSpec::Primitive(Primitive::Dynamic) => expr.to_string(),
        TypeSpec::Object(_) => format!(
            "{expr} is Map<String, dynamic> ? {object}.fromMap({expr} as Map<String, dynamic>) : null"
        ),
        TypeSpec::List(element) => {
            let var = format!("e{depth}");
            let inner = decode(element, &var, object, depth + 1);
            format!(
                "{expr} is List ? ({expr} as List).where(({var}) => {var} != null).map(({var}) => {inner}).whereType<{}>().toList() : null",
                dart_type(element, object)
            )
        }
    }
}

/// Expression converting a field between the Response and Entity shapes
/// with `method` (`toEntity` or `toResponse`).
pub fn convert(spec: &TypeSpec, expr: &str, optional: bool, method: &str, depth: usize) -> String {
    let q = if optional { "?" } else { "" };
    match spec {
        TypeSpec::Object(_) => format!("{expr}{q}.{method}()"),
        TypeSpec::List(element) if element.innermost_object().is_some() => {
            let var = format!("e{depth}");
            format!(
                "{expr}{q}.map(({var}) => {}).toList()",
                convert(element, &var, false, method, depth + 1)
            )
        }
        _ => expr.to_string(),
    }
}
