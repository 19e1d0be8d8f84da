//! Response/Entity conversion extensions.
//!
//! For every object node the mapper emits `toEntity()` on the Response
//! class and `toResponse()` on the Entity class. The counterpart class is
//! found through the registry at the same path, so the two sides always
//! name the same node. Models are imported under per-API prefixes, which
//! lets several APIs with identically named nested classes share one
//! mapper file.

use crate::domain::aggregate::{BlockKey, SectionSkeleton, Skeleton};
use crate::domain::emit::{
    AGGREGATE_HEADER, ApiInput, ArtifactFragment, ArtifactPolicy, ClassDecl, convert,
    render_classes,
};
use crate::domain::ident::snake;
use crate::domain::naming::{ArtifactKind, ClassNameRegistry};
use crate::domain::project::PageLayout;

pub const SECTION: &str = "mapper";

#[derive(Debug, Clone)]
pub struct MapperPolicy {
    api_stem: String,
    response_prefix: String,
    entity_prefix: String,
}

impl MapperPolicy {
    pub fn new(api_stem: &str) -> Self {
        let base = snake(api_stem);
        Self {
            api_stem: api_stem.to_string(),
            response_prefix: format!("{base}_response"),
            entity_prefix: format!("{base}_entity"),
        }
    }

    pub fn response_prefix(&self) -> &str {
        &self.response_prefix
    }

    pub fn entity_prefix(&self) -> &str {
        &self.entity_prefix
    }

    /// Extension names for the node at `class`: (to entity, to response).
    pub fn extension_names(&self, class: &ClassDecl, registry: &ClassNameRegistry) -> (String, String) {
        let stem = registry
            .stem(&class.path, ArtifactKind::Response)
            .unwrap_or(&self.api_stem);
        (
            format!("{}_{stem}ToEntity", self.api_stem),
            format!("{}_{stem}ToResponse", self.api_stem),
        )
    }

    fn conversion(
        &self,
        class: &ClassDecl,
        extension: &str,
        on: &str,
        target: &str,
        method: &str,
        out: &mut Vec<String>,
    ) {
        out.push(format!("extension {extension} on {on} {{"));
        out.push(format!("  {target} {method}() {{"));
        if class.fields.is_empty() {
            out.push(format!("    return const {target}();"));
        } else {
            out.push(format!("    return {target}("));
            for field in &class.fields {
                out.push(format!(
                    "      {}: {},",
                    field.ident,
                    convert(&field.spec, &field.ident, true, method, 0)
                ));
            }
            out.push("    );".into());
        }
        out.push("  }".into());
        out.push("}".into());
    }
}

impl ArtifactPolicy for MapperPolicy {
    /// The mapper walks the Response family; Entity names come from the
    /// same stems.
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Response
    }

    fn emit_class(&self, class: &ClassDecl, registry: &ClassNameRegistry, out: &mut Vec<String>) {
        let response = format!("{}.{}", self.response_prefix, class.name);
        let entity = registry
            .counterpart(&class.path, ArtifactKind::Response, ArtifactKind::Entity)
            .map(|name| format!("{}.{name}", self.entity_prefix))
            .unwrap_or_else(|| "dynamic".into());
        let (to_entity, to_response) = self.extension_names(class, registry);

        self.conversion(class, &to_entity, &response, &entity, "toEntity", out);
        out.push(String::new());
        self.conversion(class, &to_response, &entity, &response, "toResponse", out);
    }
}

/// The API's block in the page mapper file.
pub fn fragment(
    input: &ApiInput<'_>,
    policy: &MapperPolicy,
    classes: &[ClassDecl],
    registry: &ClassNameRegistry,
) -> ArtifactFragment {
    let layout = input.layout;
    let path = layout.mapper_file();
    let response = layout.import_between(&path, &layout.response_file(&input.api.name));
    let entity = layout.import_between(&path, &layout.entity_file(&input.api.name));

    ArtifactFragment {
        imports: vec![
            format!("import '{entity}' as {};", policy.entity_prefix()),
            format!("import '{response}' as {};", policy.response_prefix()),
        ],
        body: render_classes(policy, classes, registry),
        defines: classes
            .iter()
            .flat_map(|class| {
                let (a, b) = policy.extension_names(class, registry);
                [a, b]
            })
            .collect(),
        key: BlockKey::new(SECTION, input.api.name.clone()),
        skeleton: skeleton(),
        path,
    }
}

pub fn skeleton() -> Skeleton {
    Skeleton {
        header: vec![AGGREGATE_HEADER.to_string()],
        sections: vec![SectionSkeleton::new(SECTION)],
    }
}

/// Import line that brings the mapper extensions of a page into scope.
pub fn import_from(layout: &PageLayout, from: &std::path::Path) -> String {
    format!(
        "import '{}';",
        layout.import_between(from, &layout.mapper_file())
    )
}
