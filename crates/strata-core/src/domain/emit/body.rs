//! Request Body classes.
//!
//! Fields are optional. URL path parameters become required `String`
//! fields on the root class and are not sent in the payload. The root also
//! carries an `extra` map spread first into `toMap()`, and for multipart
//! APIs a `files` map.

use crate::domain::api::ApiDefinition;
use crate::domain::emit::{ArtifactPolicy, ClassDecl, encode, render_classes, render_whole_file};
use crate::domain::ident::{camel, quote};
use crate::domain::inference::{Primitive, TypeSpec};
use crate::domain::naming::{ArtifactKind, ClassNameRegistry, TypePath};

#[derive(Debug, Clone)]
pub struct BodyPolicy {
    path_params: Vec<String>,
    multipart: bool,
    date_format: String,
}

impl BodyPolicy {
    pub fn new(api: &ApiDefinition, date_format: &str) -> Self {
        let mut path_params: Vec<String> = Vec::new();
        for param in api.path.params() {
            let ident = camel(param);
            if !path_params.contains(&ident) {
                path_params.push(ident);
            }
        }
        Self {
            path_params,
            multipart: api.method.is_multipart(),
            date_format: date_format.to_string(),
        }
    }

    /// Body without path parameters or files.
    pub fn standalone(date_format: &str) -> Self {
        Self {
            path_params: Vec::new(),
            multipart: false,
            date_format: date_format.to_string(),
        }
    }

    pub fn is_multipart(&self) -> bool {
        self.multipart
    }

    fn field_value(&self, spec: &TypeSpec, ident: &str, stringify: bool) -> String {
        if !stringify {
            return encode(spec, ident, true, &self.date_format, 0);
        }
        match spec {
            TypeSpec::Primitive(Primitive::DateTime) => format!("{ident}?.{}", self.date_format),
            TypeSpec::Primitive(_) => format!("{ident}?.toString()"),
            _ => format!(
                "{ident} == null ? null : json.encode({})",
                encode(spec, ident, true, &self.date_format, 0)
            ),
        }
    }
}

impl ArtifactPolicy for BodyPolicy {
    fn kind(&self) -> ArtifactKind {
        ArtifactKind::Body
    }

    fn reserved_members(&self, path: &TypePath) -> Vec<String> {
        if !path.is_root() {
            return Vec::new();
        }
        let mut reserved = self.path_params.clone();
        reserved.push("extra".into());
        if self.multipart {
            reserved.push("files".into());
            reserved.push("toFiles".into());
        }
        reserved
    }

    fn emit_class(&self, class: &ClassDecl, registry: &ClassNameRegistry, out: &mut Vec<String>) {
        let name = &class.name;
        let root = class.is_root();
        let params: &[String] = if root { &self.path_params } else { &[] };

        let mut ctor: Vec<String> = params.iter().map(|p| format!("required this.{p},")).collect();
        ctor.extend(class.fields.iter().map(|f| format!("this.{},", f.ident)));
        if root {
            ctor.push("this.extra,".into());
            if self.multipart {
                ctor.push("this.files,".into());
            }
        }

        out.push(format!("class {name} {{"));
        if ctor.is_empty() {
            out.push(format!("  const {name}();"));
        } else {
            out.push(format!("  const {name}({{"));
            out.extend(ctor.iter().map(|line| format!("    {line}")));
            out.push("  });".into());
        }

        let mut finals: Vec<String> = params.iter().map(|p| format!("final String {p};")).collect();
        finals.extend(class.fields.iter().map(|f| {
            format!(
                "final {} {};",
                f.declared_type(registry, ArtifactKind::Body),
                f.ident
            )
        }));
        if root {
            finals.push("final Map<String, dynamic>? extra;".into());
            if self.multipart {
                finals.push("final Map<String, File>? files;".into());
            }
        }
        if !finals.is_empty() {
            out.push(String::new());
            out.extend(finals.iter().map(|line| format!("  {line}")));
        }

        out.push(String::new());
        out.push("  Map<String, dynamic> toMap() {".into());
        out.push("    return {".into());
        if root {
            out.push("      ...?extra,".into());
        }
        let stringify = root && self.multipart;
        for field in &class.fields {
            out.push(format!(
                "      {}: {},",
                quote(&field.key),
                self.field_value(&field.spec, &field.ident, stringify)
            ));
        }
        out.push("    };".into());
        out.push("  }".into());

        if root && self.multipart {
            out.push(String::new());
            out.push("  Map<String, File> toFiles() => {...?files};".into());
        }

        out.push(String::new());
        out.push("  String toJson() => json.encode(toMap());".into());
        out.push("}".into());
    }
}

pub fn render_file(policy: &BodyPolicy, classes: &[ClassDecl], registry: &ClassNameRegistry) -> String {
    let mut imports = vec!["import 'dart:convert';".to_string()];
    if policy.is_multipart() {
        imports.push("import 'dart:io';".into());
    }
    render_whole_file(&imports, render_classes(policy, classes, registry))
}
