//! Data-source, repository and use-case code for one API.

use std::path::Path;

use crate::domain::aggregate::{BlockKey, SectionSkeleton, Skeleton};
use crate::domain::api::{HttpMethod, ReturnData};
use crate::domain::emit::{AGGREGATE_HEADER, ApiInput, ArtifactFragment, GeneratedFile, mapper, render_whole_file};
use crate::domain::ident::{camel, pascal, quote};
use crate::domain::naming::{ArtifactKind, ClassNameRegistry, TypePath};
use crate::domain::project::PageLayout;

pub const REMOTE_DATA_SOURCE: &str = "remote_data_source";
pub const REMOTE_DATA_SOURCE_IMPL: &str = "remote_data_source_impl";
pub const REPOSITORY: &str = "repository";
pub const REPOSITORY_IMPL: &str = "repository_impl";

const TYPED_DATA: &str = "import 'dart:typed_data';";
const HTTP_RESPONSE: &str = "import 'package:http/http.dart' show Response;";

/// Root model names of an API when it returns a typed model.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ModelNames {
    pub response: String,
    pub entity: String,
    pub many: bool,
}

/// Method shape shared by every layer of one API.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub method: String,
    pub body_class: String,
    pub model: Option<ModelNames>,
    pub return_data: ReturnData,
    pub streaming: bool,
}

impl Signature {
    /// `many` is `Some` when the API returns a typed model.
    pub fn new(input: &ApiInput<'_>, registry: &ClassNameRegistry, many: Option<bool>) -> Self {
        let root = TypePath::root();
        let fallback = |kind: ArtifactKind| format!("{}{}", registry.api_stem(), kind.suffix());
        let model = many.map(|many| ModelNames {
            response: registry
                .lookup(&root, ArtifactKind::Response)
                .unwrap_or_else(|| fallback(ArtifactKind::Response)),
            entity: registry
                .lookup(&root, ArtifactKind::Entity)
                .unwrap_or_else(|| fallback(ArtifactKind::Entity)),
            many,
        });
        Self {
            method: camel(&input.api.name),
            body_class: registry
                .lookup(&root, ArtifactKind::Body)
                .unwrap_or_else(|| fallback(ArtifactKind::Body)),
            model,
            return_data: input.api.return_data,
            streaming: input.api.method.is_streaming(),
        }
    }

    fn value_type(&self, domain: bool) -> String {
        match (&self.model, self.return_data) {
            (Some(model), _) => {
                let name = if domain { &model.entity } else { &model.response };
                if model.many {
                    format!("List<{name}>")
                } else {
                    name.clone()
                }
            }
            (None, ReturnData::Header) => "Map<String, String>".into(),
            (None, ReturnData::BodyBytes) => "Uint8List".into(),
            (None, ReturnData::StatusCode) => "int".into(),
            (None, ReturnData::Raw) => "Response".into(),
            (None, ReturnData::BodyString | ReturnData::Model) => "String".into(),
        }
    }

    /// Full return type for the data layer (`domain == false`) or the
    /// domain layer.
    pub fn return_type(&self, domain: bool) -> String {
        let wrapper = if self.streaming { "Stream" } else { "Future" };
        format!("{wrapper}<{}>", self.value_type(domain))
    }

    pub fn params(&self) -> String {
        format!("{} body, {{Map<String, String>? headers}}", self.body_class)
    }

    fn declaration(&self, domain: bool) -> String {
        format!("{} {}({})", self.return_type(domain), self.method, self.params())
    }

    /// Library imports the signature's types need.
    fn type_imports(&self) -> Vec<String> {
        match (&self.model, self.return_data) {
            (None, ReturnData::BodyBytes) => vec![TYPED_DATA.into()],
            (None, ReturnData::Raw) => vec![HTTP_RESPONSE.into()],
            _ => Vec::new(),
        }
    }
}

fn page_class(page: &str) -> String {
    pascal(page)
}

fn relative(layout: &PageLayout, from: &Path, to: &Path) -> String {
    format!("import '{}';", layout.import_between(from, to))
}

// ── Data source ───────────────────────────────────────────────────────────────

fn data_source_skeleton(input: &ApiInput<'_>) -> Skeleton {
    let page = page_class(input.page);
    Skeleton {
        header: vec![AGGREGATE_HEADER.to_string()],
        sections: vec![
            SectionSkeleton::braced(
                REMOTE_DATA_SOURCE,
                format!("abstract class {page}RemoteDataSource {{"),
            ),
            SectionSkeleton {
                open: vec![
                    format!("class {page}RemoteDataSourceImpl implements {page}RemoteDataSource {{"),
                    format!("  {page}RemoteDataSourceImpl(this.client);"),
                    String::new(),
                    format!("  final {} client;", input.settings.http_client),
                    String::new(),
                ],
                ..SectionSkeleton::braced(REMOTE_DATA_SOURCE_IMPL, "")
            },
        ],
    }
}

fn data_source_imports(input: &ApiInput<'_>, sig: &Signature) -> Vec<String> {
    let layout = input.layout;
    let path = layout.remote_data_source_file();
    let mut imports = sig.type_imports();
    if let Some(client) = &input.settings.http_client_import {
        imports.push(format!("import '{client}';"));
    }
    imports.push(relative(layout, &path, &layout.body_file(&input.api.name)));
    if sig.model.is_some() {
        imports.push(relative(layout, &path, &layout.response_file(&input.api.name)));
    }
    imports
}

fn request_arguments(input: &ApiInput<'_>, sig: &Signature) -> Vec<String> {
    let api = input.api;
    let base = api
        .base_url
        .as_deref()
        .unwrap_or(input.settings.base_url.as_str());
    let mut args = vec![format!("'${{{base}}}{}',", api.path.interpolate("body"))];

    match api.method {
        HttpMethod::Get | HttpMethod::Delete | HttpMethod::GetSse | HttpMethod::DeleteSse => {
            args.push("queryParameters: body.toMap(),".into())
        }
        HttpMethod::Multipart => {
            args.push("body: body.toMap(),".into());
            args.push("files: body.toFiles(),".into());
        }
        _ => args.push("body: body.toMap(),".into()),
    }

    if input.headers.is_empty() {
        args.push("headers: headers,".into());
    } else {
        args.push(format!("headers: {{..._{}Headers, ...?headers}},", sig.method));
    }
    if let Some(strategy) = api.cache_strategy {
        args.push(format!("cacheStrategy: {},", strategy.dart()));
    }
    args
}

fn data_source_impl(input: &ApiInput<'_>, sig: &Signature) -> Vec<String> {
    let mut out = Vec::new();
    if !input.headers.is_empty() {
        out.push(format!(
            "static const _{}Headers = <String, String>{{",
            sig.method
        ));
        for (name, value) in &input.headers {
            out.push(format!("  {}: {},", quote(name), quote(value)));
        }
        out.push("};".into());
        out.push(String::new());
    }

    let call = input.api.method.client_call();
    out.push("@override".into());

    if sig.streaming {
        out.push(format!("{} {{", sig.declaration(false)));
        out.push(format!("  final stream = client.{call}("));
        out.extend(request_arguments(input, sig).into_iter().map(|a| format!("    {a}")));
        out.push("  );".into());
        match &sig.model {
            Some(model) if model.many => {
                out.push(format!("  return stream.map({}.listFromJson);", model.response))
            }
            Some(model) => out.push(format!("  return stream.map({}.fromJson);", model.response)),
            None => out.push("  return stream;".into()),
        }
    } else {
        out.push(format!("{} async {{", sig.declaration(false)));
        out.push(format!("  final response = await client.{call}("));
        out.extend(request_arguments(input, sig).into_iter().map(|a| format!("    {a}")));
        out.push("  );".into());
        let value = match (&sig.model, sig.return_data) {
            (Some(model), _) if model.many => format!("{}.listFromJson(response.body)", model.response),
            (Some(model), _) => format!("{}.fromJson(response.body)", model.response),
            (None, ReturnData::Header) => "response.headers".into(),
            (None, ReturnData::BodyBytes) => "response.bodyBytes".into(),
            (None, ReturnData::StatusCode) => "response.statusCode".into(),
            (None, ReturnData::Raw) => "response".into(),
            (None, ReturnData::BodyString | ReturnData::Model) => "response.body".into(),
        };
        out.push(format!("  return {value};"));
    }
    out.push("}".into());
    out
}

// ── Repository ────────────────────────────────────────────────────────────────

fn repository_skeleton(input: &ApiInput<'_>) -> Skeleton {
    Skeleton {
        header: vec![AGGREGATE_HEADER.to_string()],
        sections: vec![SectionSkeleton::braced(
            REPOSITORY,
            format!("abstract class {}Repository {{", page_class(input.page)),
        )],
    }
}

fn repository_impl_skeleton(input: &ApiInput<'_>) -> Skeleton {
    let page = page_class(input.page);
    Skeleton {
        header: vec![AGGREGATE_HEADER.to_string()],
        sections: vec![SectionSkeleton {
            open: vec![
                format!("class {page}RepositoryImpl implements {page}Repository {{"),
                format!("  {page}RepositoryImpl(this.remoteDataSource);"),
                String::new(),
                format!("  final {page}RemoteDataSource remoteDataSource;"),
                String::new(),
            ],
            ..SectionSkeleton::braced(REPOSITORY_IMPL, "")
        }],
    }
}

fn domain_imports(input: &ApiInput<'_>, sig: &Signature, from: &Path) -> Vec<String> {
    let layout = input.layout;
    let mut imports = sig.type_imports();
    imports.push(relative(layout, from, &layout.body_file(&input.api.name)));
    if sig.model.is_some() {
        imports.push(relative(layout, from, &layout.entity_file(&input.api.name)));
    }
    imports
}

fn repository_impl(sig: &Signature) -> Vec<String> {
    let call = format!("remoteDataSource.{}(body, headers: headers)", sig.method);
    let mut out = vec!["@override".to_string()];
    match &sig.model {
        None => {
            out.push(format!("{} {{", sig.declaration(true)));
            out.push(format!("  return {call};"));
        }
        Some(model) if sig.streaming => {
            out.push(format!("{} {{", sig.declaration(true)));
            let convert = if model.many {
                "(e) => e.map((e0) => e0.toEntity()).toList()"
            } else {
                "(e) => e.toEntity()"
            };
            out.push(format!("  return {call}.map({convert});"));
        }
        Some(model) => {
            out.push(format!("{} async {{", sig.declaration(true)));
            out.push(format!("  final result = await {call};"));
            if model.many {
                out.push("  return result.map((e) => e.toEntity()).toList();".into());
            } else {
                out.push("  return result.toEntity();".into());
            }
        }
    }
    out.push("}".into());
    out
}

/// Fragments for the data-source and repository aggregate files.
pub fn fragments(input: &ApiInput<'_>, sig: &Signature) -> Vec<ArtifactFragment> {
    let layout = input.layout;
    let api = input.api.name.clone();

    let data_source_path = layout.remote_data_source_file();
    let data_source_imports = data_source_imports(input, sig);
    let data_source_skeleton = data_source_skeleton(input);

    let repository_path = layout.repository_file();
    let repository_impl_path = layout.repository_impl_file();

    let mut impl_imports = domain_imports(input, sig, &repository_impl_path);
    impl_imports.push(relative(layout, &repository_impl_path, &data_source_path));
    impl_imports.push(relative(layout, &repository_impl_path, &repository_path));
    if sig.model.is_some() {
        impl_imports.push(mapper::import_from(layout, &repository_impl_path));
    }

    vec![
        ArtifactFragment {
            path: data_source_path.clone(),
            key: BlockKey::new(REMOTE_DATA_SOURCE, api.clone()),
            imports: data_source_imports.clone(),
            body: vec![format!("{};", sig.declaration(false))],
            defines: vec![sig.method.clone()],
            skeleton: data_source_skeleton.clone(),
        },
        ArtifactFragment {
            path: data_source_path,
            key: BlockKey::new(REMOTE_DATA_SOURCE_IMPL, api.clone()),
            imports: data_source_imports,
            body: data_source_impl(input, sig),
            defines: vec![sig.method.clone()],
            skeleton: data_source_skeleton,
        },
        ArtifactFragment {
            imports: domain_imports(input, sig, &repository_path),
            path: repository_path,
            key: BlockKey::new(REPOSITORY, api.clone()),
            body: vec![format!("{};", sig.declaration(true))],
            defines: vec![sig.method.clone()],
            skeleton: repository_skeleton(input),
        },
        ArtifactFragment {
            path: repository_impl_path,
            key: BlockKey::new(REPOSITORY_IMPL, api),
            imports: impl_imports,
            body: repository_impl(sig),
            defines: vec![sig.method.clone()],
            skeleton: repository_impl_skeleton(input),
        },
    ]
}

/// `<api>_use_case.dart`, a callable wrapper around the repository method.
pub fn use_case_file(input: &ApiInput<'_>, sig: &Signature) -> GeneratedFile {
    let layout = input.layout;
    let path = layout.use_case_file(&input.api.name);
    let name = format!("{}UseCase", pascal(&input.api.name));
    let repository = format!("{}Repository", page_class(input.page));

    let mut imports = domain_imports(input, sig, &path);
    imports.push(relative(layout, &path, &layout.repository_file()));

    let class = vec![
        format!("class {name} {{"),
        format!("  const {name}(this.repository);"),
        String::new(),
        format!("  final {repository} repository;"),
        String::new(),
        format!("  {} call({}) {{", sig.return_type(true), sig.params()),
        format!("    return repository.{}(body, headers: headers);", sig.method),
        "  }".into(),
        "}".into(),
    ];

    GeneratedFile {
        relative: path
            .strip_prefix(layout.root())
            .map(Path::to_path_buf)
            .unwrap_or_else(|_| path.clone()),
        content: render_whole_file(&imports, class),
        path,
    }
}
