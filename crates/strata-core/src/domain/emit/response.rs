//! Response classes: nullable fields, defensive decoding.

use crate::domain::emit::{
    ArtifactPolicy, ClassDecl, decode, encode, render_classes, render_whole_file,
};
use crate::domain::ident::quote;
use crate::domain::naming::{ArtifactKind, ClassNameRegistry};

#[derive(Debug, Clone)]
pub struct ResponsePolicy {
    date_format: String,
    many: bool,
}

impl ResponsePolicy {
    /// `many` adds `listFromJson` to the root class for array samples.
    pub fn new(date_format: &str, many: bool) -> Self {
        Self {
            date_format: date_format.to_string(),
            many,
        }
    }
}

impl ArtifactPolicy for ResponsePolicy {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Response
    }

    fn emit_class(&self, class: &ClassDecl, registry: &ClassNameRegistry, out: &mut Vec<String>) {
        let name = &class.name;
        let kind = self.kind();

        out.push(format!("class {name} {{"));
        if class.fields.is_empty() {
            out.push(format!("  const {name}();"));
        } else {
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
        }

        out.push(String::new());
        out.push(format!(
            "  factory {name}.fromMap(Map<String, dynamic> map) {{"
        ));
        if class.fields.is_empty() {
            out.push(format!("    return const {name}();"));
        } else {
            out.push(format!("    return {name}("));
            for field in &class.fields {
                let object = field
                    .object
                    .as_ref()
                    .and_then(|path| registry.lookup(path, kind))
                    .unwrap_or_default();
                let source = format!("map[{}]", quote(&field.key));
                out.push(format!(
                    "      {}: {},",
                    field.ident,
                    decode(&field.spec, &source, &object, 0)
                ));
            }
            out.push("    );".into());
        }
        out.push("  }".into());

        out.push(String::new());
        out.push(format!("  factory {name}.fromJson(String source) {{"));
        out.push("    final decoded = json.decode(source);".into());
        out.push(format!("    return {name}.fromMap("));
        out.push("      decoded is Map<String, dynamic> ? decoded : const <String, dynamic>{},".into());
        out.push("    );".into());
        out.push("  }".into());

        if self.many && class.is_root() {
            out.push(String::new());
            out.push(format!(
                "  static List<{name}> listFromJson(String source) {{"
            ));
            out.push("    final decoded = json.decode(source);".into());
            out.push(format!("    if (decoded is! List) return const <{name}>[];"));
            out.push(format!(
                "    return decoded.whereType<Map<String, dynamic>>().map({name}.fromMap).toList();"
            ));
            out.push("  }".into());
        }

        out.push(String::new());
        out.push("  Map<String, dynamic> toMap() {".into());
        out.push("    return {".into());
        for field in &class.fields {
            out.push(format!(
                "      {}: {},",
                quote(&field.key),
                encode(&field.spec, &field.ident, true, &self.date_format, 0)
            ));
        }
        out.push("    };".into());
        out.push("  }".into());

        out.push(String::new());
        out.push("  String toJson() => json.encode(toMap());".into());
        out.push("}".into());
    }
}

pub fn render_file(
    policy: &ResponsePolicy,
    classes: &[ClassDecl],
    registry: &ClassNameRegistry,
) -> String {
    render_whole_file(
        &["import 'dart:convert';".to_string()],
        render_classes(policy, classes, registry),
    )
}
