//! Entity classes: the Response shape without serialisation, plus
//! `copyWith`.

use crate::domain::emit::{ArtifactPolicy, ClassDecl, render_classes, render_whole_file};
use crate::domain::naming::{ArtifactKind, ClassNameRegistry};

#[derive(Debug, Clone, Copy, Default)]
pub struct EntityPolicy;

impl ArtifactPolicy for EntityPolicy {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Entity
    }

    fn emit_class(&self, class: &ClassDecl, registry: &ClassNameRegistry, out: &mut Vec<String>) {
        let name = &class.name;
        let kind = self.kind();

        out.push(format!("class {name} {{"));
        if class.fields.is_empty() {
            out.push(format!("  const {name}();"));
            out.push(String::new());
            out.push(format!("  {name} copyWith() => const {name}();"));
            out.push("}".into());
            return;
        }

        out.push(format!("  const {name}({{"));
        for field in &class.fields {
            out.push(format!("    this.{},", field.ident));
        }
        out.push("  });".into());
        out.push(String::new());
        for field in &class.fields {
            out.push(format!(
                "  final {} {};",
                field.declared_type(registry, kind),
                field.ident
            ));
        }

        out.push(String::new());
        out.push(format!("  {name} copyWith({{"));
        for field in &class.fields {
            out.push(format!(
                "    {} {},",
                field.declared_type(registry, kind),
                field.ident
            ));
        }
        out.push("  }) {".into());
        out.push(format!("    return {name}("));
        for field in &class.fields {
            out.push(format!(
                "      {ident}: {ident} ?? this.{ident},",
                ident = field.ident
            ));
        }
        out.push("    );".into());
        out.push("  }".into());
        out.push("}".into());
    }
}

pub fn render_file(
    policy: &EntityPolicy,
    classes: &[ClassDecl],
    registry: &ClassNameRegistry,
) -> String {
    render_whole_file(&[], render_classes(policy, classes, registry))
}
