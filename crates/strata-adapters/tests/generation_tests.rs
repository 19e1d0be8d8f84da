//! End-to-end generation over a real directory tree.

use std::{
    collections::BTreeMap,
    fs,
    path::{Path, PathBuf},
};

use strata_adapters::{LocalFilesystem, MemoryFilesystem, NoopFormatter, YamlPageLoader};
use strata_core::{
    application::{GenerationRequest, GenerationService},
    domain::{AggregateDocument, BlockKey, DomainError, GeneratorSettings, PageLayout},
    error::{ErrorCategory, StrataError},
};
use tempfile::TempDir;
use walkdir::WalkDir;

// ============================================================================
// Fixtures
// ============================================================================

struct Project {
    temp: TempDir,
}

impl Project {
    fn new() -> Self {
        Self {
            temp: TempDir::new().unwrap(),
        }
    }

    fn features(&self) -> PathBuf {
        self.temp.path().join("lib").join("features")
    }

    fn page_dir(&self, feature: &str, page: &str) -> PathBuf {
        self.features().join(feature).join(page)
    }

    fn layout(&self, feature: &str, page: &str) -> PageLayout {
        PageLayout::new(&self.page_dir(feature, page), page)
    }

    fn write(&self, feature: &str, page: &str, relative: &str, content: &str) {
        let path = self.page_dir(feature, page).join(relative);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, content).unwrap();
    }

    fn config(&self, feature: &str, page: &str, yaml: &str) {
        self.write(feature, page, "json2dart/json2dart.yaml", yaml);
    }

    fn service(&self) -> GenerationService {
        GenerationService::new(
            Box::new(YamlPageLoader::new(self.features())),
            Box::new(LocalFilesystem::new()),
            Box::new(NoopFormatter),
            GeneratorSettings::default(),
        )
    }

    /// Every generated Dart file, keyed by path.
    fn dart_files(&self) -> BTreeMap<PathBuf, String> {
        WalkDir::new(self.temp.path())
            .into_iter()
            .filter_map(Result::ok)
            .filter(|e| e.path().extension().is_some_and(|ext| ext == "dart"))
            .map(|e| {
                let content = fs::read_to_string(e.path()).unwrap();
                (e.path().to_path_buf(), content)
            })
            .collect()
    }
}

fn read(path: &Path) -> String {
    fs::read_to_string(path).unwrap()
}

fn block(path: &Path, section: &str, api: &str) -> Vec<String> {
    let document = AggregateDocument::parse(&read(path)).unwrap();
    document
        .block(&BlockKey::new(section, api))
        .map(|b| b.lines.clone())
        .unwrap_or_default()
}

const LOGIN_YAML: &str = "\
login:
  method: post
  path: /auth/login
  body: json2dart/json/body/login_body.json
  response: json2dart/json/response/login_response.json
profile:
  method: get
  path: /users/{userId}
  response: json2dart/json/response/profile_response.json
";

fn seed_login_page(project: &Project) {
    project.config("auth", "login", LOGIN_YAML);
    project.write(
        "auth",
        "login",
        "json2dart/json/body/login_body.json",
        r#"{"email": "a@b.c", "password": "secret"}"#,
    );
    project.write(
        "auth",
        "login",
        "json2dart/json/response/login_response.json",
        r#"{"token": "t", "user": {"id": 1, "name": "Ann", "createdAt": "2024-01-02T03:04:05Z"}}"#,
    );
    project.write(
        "auth",
        "login",
        "json2dart/json/response/profile_response.json",
        r#"{"id": 1, "user": {"name": "Ann"}, "tags": ["a"]}"#,
    );
}

// ============================================================================
// Properties
// ============================================================================

#[tokio::test]
async fn generates_every_layer_for_a_page() {
    let project = Project::new();
    seed_login_page(&project);

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failed());
    assert_eq!(report.units.len(), 2);

    let layout = project.layout("auth", "login");
    for api in ["login", "profile"] {
        assert!(layout.body_file(api).exists());
        assert!(layout.response_file(api).exists());
        assert!(layout.entity_file(api).exists());
        assert!(layout.use_case_file(api).exists());
    }

    let data_source = read(&layout.remote_data_source_file());
    assert!(data_source.contains("abstract class LoginRemoteDataSource {"));
    assert!(data_source.contains("'${ApiConfig.baseUrl}/users/${body.userId}'"));
    assert!(data_source.contains("queryParameters: body.toMap(),"));
    assert!(data_source.contains("// strata:anchor remote_data_source_impl"));

    let repository_impl = read(&layout.repository_impl_file());
    assert!(repository_impl.contains("return result.toEntity();"));

    let response = read(&layout.response_file("login"));
    assert!(response.contains("class LoginResponse {"));
    assert!(response.contains("DateTime? createdAt"));
}

#[tokio::test]
async fn regeneration_is_byte_identical() {
    let project = Project::new();
    seed_login_page(&project);
    let service = project.service();

    service.generate(&GenerationRequest::default()).await.unwrap();
    let first = project.dart_files();

    let report = service.generate(&GenerationRequest::default()).await.unwrap();
    assert!(report.is_success());
    assert!(report.written().is_empty(), "{:?}", report.written());
    assert_eq!(project.dart_files(), first);
}

#[tokio::test]
async fn apis_do_not_disturb_each_other_in_either_order() {
    let forward = Project::new();
    seed_login_page(&forward);

    let reversed = Project::new();
    seed_login_page(&reversed);
    let yaml: Vec<&str> = LOGIN_YAML.lines().collect();
    let (login, profile) = yaml.split_at(5);
    reversed.config("auth", "login", &format!("{}\n{}\n", profile.join("\n"), login.join("\n")));

    forward.service().generate(&GenerationRequest::default()).await.unwrap();
    reversed.service().generate(&GenerationRequest::default()).await.unwrap();

    let a = forward.layout("auth", "login");
    let b = reversed.layout("auth", "login");
    for (path_a, path_b, section) in [
        (a.remote_data_source_file(), b.remote_data_source_file(), "remote_data_source_impl"),
        (a.repository_file(), b.repository_file(), "repository"),
        (a.mapper_file(), b.mapper_file(), "mapper"),
    ] {
        for api in ["login", "profile"] {
            let left = block(&path_a, section, api);
            assert!(!left.is_empty(), "{section}/{api} missing");
            assert_eq!(left, block(&path_b, section, api), "{section}/{api}");
        }
    }
}

#[tokio::test]
async fn changing_one_api_leaves_other_blocks_alone() {
    let project = Project::new();
    seed_login_page(&project);
    let service = project.service();
    service.generate(&GenerationRequest::default()).await.unwrap();

    let layout = project.layout("auth", "login");
    let profile_before = block(&layout.mapper_file(), "mapper", "profile");
    let login_before = block(&layout.mapper_file(), "mapper", "login");

    project.write(
        "auth",
        "login",
        "json2dart/json/response/login_response.json",
        r#"{"token": "t", "refreshToken": "r"}"#,
    );
    service.generate(&GenerationRequest::default()).await.unwrap();

    assert_eq!(block(&layout.mapper_file(), "mapper", "profile"), profile_before);
    assert_ne!(block(&layout.mapper_file(), "mapper", "login"), login_before);
}

#[tokio::test]
async fn hand_written_code_outside_blocks_survives() {
    let project = Project::new();
    seed_login_page(&project);
    let service = project.service();
    service.generate(&GenerationRequest::default()).await.unwrap();

    let path = project.layout("auth", "login").repository_file();
    let edited = read(&path).replace(
        "abstract class LoginRepository {",
        "abstract class LoginRepository {\n  // keep me",
    );
    fs::write(&path, &edited).unwrap();

    service.generate(&GenerationRequest::default()).await.unwrap();
    assert_eq!(read(&path), edited);
}

#[tokio::test]
async fn one_malformed_sample_fails_exactly_one_unit() {
    let project = Project::new();
    project.config(
        "home",
        "feed",
        "\
first:
  method: get
  path: /first
  response: json2dart/json/first.json
broken:
  method: get
  path: /broken
  response: json2dart/json/broken.json
third:
  method: get
  path: /third
  response: json2dart/json/third.json
",
    );
    project.write("home", "feed", "json2dart/json/first.json", r#"{"a": 1}"#);
    project.write("home", "feed", "json2dart/json/broken.json", r#"{"a": "#);
    project.write("home", "feed", "json2dart/json/third.json", r#"{"c": true}"#);

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].api.as_deref(), Some("broken"));
    assert_eq!(failed[0].error().map(|e| e.category()), Some(ErrorCategory::Sample));

    let layout = project.layout("home", "feed");
    assert!(layout.response_file("first").exists());
    assert!(layout.response_file("third").exists());
    assert!(!layout.response_file("broken").exists());

    let data_source = read(&layout.remote_data_source_file());
    assert!(data_source.contains("strata:begin remote_data_source first"));
    assert!(data_source.contains("strata:begin remote_data_source third"));
    assert!(!data_source.contains("strata:begin remote_data_source broken"));
}

#[tokio::test]
async fn response_and_entity_declare_the_same_nodes() {
    let project = Project::new();
    seed_login_page(&project);
    project.service().generate(&GenerationRequest::default()).await.unwrap();

    let layout = project.layout("auth", "login");
    for api in ["login", "profile"] {
        let responses = read(&layout.response_file(api)).matches("\nclass ").count();
        let entities = read(&layout.entity_file(api)).matches("\nclass ").count();
        let mappers = block(&layout.mapper_file(), "mapper", api)
            .iter()
            .filter(|l| l.starts_with("extension "))
            .count();
        assert_eq!(responses, entities, "{api}");
        assert_eq!(mappers, responses * 2, "{api}");
    }
}

#[tokio::test]
async fn list_elements_follow_the_first_element() {
    let project = Project::new();
    project.config(
        "home",
        "feed",
        "feed:\n  method: get\n  path: /feed\n  response: json2dart/json/feed.json\n",
    );
    project.write(
        "home",
        "feed",
        "json2dart/json/feed.json",
        r#"{"items": [{"title": "x"}, {"other": 2}]}"#,
    );

    project.service().generate(&GenerationRequest::default()).await.unwrap();

    let response = read(&project.layout("home", "feed").response_file("feed"));
    assert!(response.contains("String? title;"));
    assert!(!response.contains("other"));
}

#[tokio::test]
async fn array_samples_generate_list_returns() {
    let project = Project::new();
    project.config(
        "home",
        "feed",
        "posts:\n  method: get\n  path: /posts\n  response: json2dart/json/posts.json\n",
    );
    project.write("home", "feed", "json2dart/json/posts.json", r#"[{"id": 1}]"#);

    project.service().generate(&GenerationRequest::default()).await.unwrap();

    let layout = project.layout("home", "feed");
    assert!(read(&layout.response_file("posts")).contains("static List<PostsResponse> listFromJson"));
    assert!(read(&layout.remote_data_source_file()).contains("PostsResponse.listFromJson(response.body)"));
}

#[tokio::test]
async fn mapper_block_is_removed_when_api_stops_returning_a_model() {
    let project = Project::new();
    seed_login_page(&project);
    let service = project.service();
    service.generate(&GenerationRequest::default()).await.unwrap();

    let mapper = project.layout("auth", "login").mapper_file();
    assert!(!block(&mapper, "mapper", "profile").is_empty());

    project.config(
        "auth",
        "login",
        &LOGIN_YAML.replace(
            "  path: /users/{userId}\n",
            "  path: /users/{userId}\n  return_data: status_code\n",
        ),
    );
    let report = service.generate(&GenerationRequest::default()).await.unwrap();
    assert!(report.is_success());

    assert!(block(&mapper, "mapper", "profile").is_empty());
    assert!(!block(&mapper, "mapper", "login").is_empty());
    assert!(
        read(&project.layout("auth", "login").remote_data_source_file())
            .contains("return response.statusCode;")
    );
}

#[tokio::test]
async fn headers_and_extra_output_dir_are_applied() {
    let project = Project::new();
    project.config(
        "auth",
        "login",
        "\
login:
  method: post
  path: /login
  header: json2dart/json/header.json
  cache_strategy: async_or_cache
  extra_output_dir: ../../../shared
",
    );
    project.write(
        "auth",
        "login",
        "json2dart/json/header.json",
        r#"{"X-Client": "mobile", "X-Version": 2}"#,
    );

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failed());

    let data_source = read(&project.layout("auth", "login").remote_data_source_file());
    assert!(data_source.contains("static const _loginHeaders = <String, String>{"));
    assert!(data_source.contains("'X-Version': '2',"));
    assert!(data_source.contains("cacheStrategy: CacheStrategy.asyncOrCache,"));

    let shared = project.temp.path().join("lib").join("shared");
    assert!(shared.join(PageLayout::body_rel("login")).exists());
    assert!(shared.join(PageLayout::response_rel("login")).exists());
}

#[tokio::test]
async fn unknown_feature_is_reported_before_generation() {
    let project = Project::new();
    seed_login_page(&project);

    let err = project
        .service()
        .generate(&GenerationRequest {
            features: vec!["billing".into()],
            ..GenerationRequest::default()
        })
        .await
        .unwrap_err();
    assert_eq!(err.category(), ErrorCategory::NotFound);
    assert!(project.dart_files().is_empty());
}

#[tokio::test]
async fn memory_filesystem_runs_the_same_pipeline() {
    let project = Project::new();
    seed_login_page(&project);

    let fs = MemoryFilesystem::new();
    for (relative, content) in [
        ("json2dart/json/body/login_body.json", r#"{"email": "a"}"#),
        ("json2dart/json/response/login_response.json", r#"{"token": "t"}"#),
        ("json2dart/json/response/profile_response.json", r#"{"id": 1}"#),
    ] {
        fs.insert(project.page_dir("auth", "login").join(relative), content);
    }

    let service = GenerationService::new(
        Box::new(YamlPageLoader::new(project.features())),
        Box::new(fs.clone()),
        Box::new(NoopFormatter),
        GeneratorSettings::default(),
    );
    let report = service.generate(&GenerationRequest::default()).await.unwrap();
    assert!(report.is_success(), "{:?}", report.failed());

    let writes = fs.write_count();
    assert!(writes > 0);
    service.generate(&GenerationRequest::default()).await.unwrap();
    assert_eq!(fs.write_count(), writes);
    assert!(project.dart_files().is_empty());
}

#[tokio::test]
async fn api_names_with_the_same_stem_fail_both_units() {
    let project = Project::new();
    project.config(
        "auth",
        "login",
        "\
loginUser:
  method: get
  path: /a
  response: json2dart/json/a.json
login_user:
  method: get
  path: /b
  response: json2dart/json/b.json
",
    );
    project.write("auth", "login", "json2dart/json/a.json", r#"{"alpha": 1}"#);
    project.write("auth", "login", "json2dart/json/b.json", r#"{"beta": "x"}"#);

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();

    let failed = report.failed();
    assert_eq!(failed.len(), 2);
    for unit in failed {
        let err = unit.error().unwrap();
        assert_eq!(err.category(), ErrorCategory::Configuration);
        assert!(
            matches!(err, StrataError::Domain(DomainError::ApiNameClash { stem, .. }) if stem == "login_user"),
            "{err:?}"
        );
    }
    let layout = project.layout("auth", "login");
    assert!(!layout.response_file("login_user").exists());
    assert!(!layout.response_file("loginUser").exists());
}

#[tokio::test]
async fn denied_response_write_fails_only_that_api() {
    let project = Project::new();
    seed_login_page(&project);
    let layout = project.layout("auth", "login");

    let fs = MemoryFilesystem::new();
    for (relative, content) in [
        ("json2dart/json/body/login_body.json", r#"{"email": "a"}"#),
        ("json2dart/json/response/login_response.json", r#"{"token": "t"}"#),
        ("json2dart/json/response/profile_response.json", r#"{"id": 1}"#),
    ] {
        fs.insert(project.page_dir("auth", "login").join(relative), content);
    }
    fs.deny_writes(layout.response_file("login"));
    let seeded = fs.list_files().len();

    let service = GenerationService::new(
        Box::new(YamlPageLoader::new(project.features())),
        Box::new(fs.clone()),
        Box::new(NoopFormatter),
        GeneratorSettings::default(),
    );
    let report = service.generate(&GenerationRequest::default()).await.unwrap();

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].api.as_deref(), Some("login"));
    assert_eq!(failed[0].error().map(|e| e.category()), Some(ErrorCategory::Io));
    assert_eq!(report.succeeded(), 1);

    let files = fs.snapshot();
    assert!(files.len() > seeded);
    assert!(!files.contains_key(&layout.response_file("login")));
    assert!(files.contains_key(&layout.response_file("profile")));
    assert!(files.contains_key(&layout.entity_file("profile")));

    let data_source = &files[&layout.remote_data_source_file()];
    assert!(data_source.contains("strata:begin remote_data_source profile"));
    assert!(!data_source.contains("strata:begin remote_data_source login"));
    let mapper = &files[&layout.mapper_file()];
    assert!(mapper.contains("strata:begin mapper profile"));
    assert!(project.dart_files().is_empty());
}

#[tokio::test]
async fn nested_classes_never_take_a_sibling_api_root_name() {
    let project = Project::new();
    project.config(
        "auth",
        "login",
        "\
login:
  method: get
  path: /login
  response: json2dart/json/login.json
user:
  method: get
  path: /user
  response: json2dart/json/user.json
",
    );
    project.write("auth", "login", "json2dart/json/login.json", r#"{"user": {"id": 1}}"#);
    project.write("auth", "login", "json2dart/json/user.json", r#"{"name": "Ann"}"#);

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();
    assert!(report.is_success(), "{:?}", report.failed());

    let layout = project.layout("auth", "login");
    let login = read(&layout.response_file("login"));
    assert!(login.contains("class LoginUserResponse {"));
    assert!(!login.contains("class UserResponse {"));
    assert!(read(&layout.response_file("user")).contains("class UserResponse {"));
}

#[tokio::test]
async fn non_utf8_sample_is_a_sample_error() {
    let project = Project::new();
    project.config(
        "home",
        "feed",
        "\
feed:
  method: get
  path: /feed
  response: json2dart/json/feed.json
",
    );
    let sample = project.page_dir("home", "feed").join("json2dart/json/feed.json");
    fs::create_dir_all(sample.parent().unwrap()).unwrap();
    fs::write(&sample, [0xff, 0xfe, 0x7b, 0x7d]).unwrap();

    let report = project
        .service()
        .generate(&GenerationRequest::default())
        .await
        .unwrap();

    let failed = report.failed();
    assert_eq!(failed.len(), 1);
    assert_eq!(failed[0].error().map(|e| e.category()), Some(ErrorCategory::Sample));
}
