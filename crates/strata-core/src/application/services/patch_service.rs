//! Patch engine - merges fragments into aggregate files.
//!
//! A missing file is created from the fragment's skeleton. An existing one
//! is parsed into an [`AggregateDocument`], the API's blocks are replaced
//! or inserted, and the file is written back only when its bytes change.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, warn};

use crate::{
    application::{ApplicationError, ports::Filesystem},
    domain::{AggregateDocument, ArtifactFragment, BlockKey, Placement},
    error::StrataResult,
};

/// Result of patching one aggregate file.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct PatchOutcome {
    pub path: PathBuf,
    pub written: bool,
    /// Anchors that had to be re-created.
    pub warnings: Vec<ApplicationError>,
}

pub struct PatchEngine<'a> {
    filesystem: &'a dyn Filesystem,
}

impl<'a> PatchEngine<'a> {
    pub fn new(filesystem: &'a dyn Filesystem) -> Self {
        Self { filesystem }
    }

    /// Merge `fragments`, all targeting `path`, in order.
    #[instrument(skip_all, fields(path = %path.display()))]
    pub async fn patch(
        &self,
        path: &Path,
        fragments: &[&ArtifactFragment],
    ) -> StrataResult<PatchOutcome> {
        let mut outcome = PatchOutcome {
            path: path.to_path_buf(),
            ..PatchOutcome::default()
        };
        let Some(first) = fragments.first() else {
            return Ok(outcome);
        };

        let original = self.filesystem.read_to_string(path).await?;
        let mut document = match &original {
            Some(content) => AggregateDocument::parse(content)?,
            None => {
                debug!("Creating aggregate file from skeleton");
                first.skeleton.document()
            }
        };

        for fragment in fragments {
            document.merge_imports(&fragment.imports);
            let placement = document.upsert(&fragment.key, &fragment.body, &fragment.skeleton);
            debug!(block = %fragment.key, ?placement, "Block merged");

            if placement == Placement::Appended {
                let warning = ApplicationError::PatchAnchorNotFound {
                    path: path.to_path_buf(),
                    section: fragment.key.section.clone(),
                    api: fragment.key.api.clone(),
                };
                warn!("{}", warning);
                outcome.warnings.push(warning);
            }
        }

        outcome.written = self.write_if_changed(path, original.as_deref(), &document).await?;
        Ok(outcome)
    }

    /// Delete the block for `key` from `path`, if both exist.
    #[instrument(skip_all, fields(path = %path.display(), block = %key))]
    pub async fn remove(&self, path: &Path, key: &BlockKey) -> StrataResult<PatchOutcome> {
        let mut outcome = PatchOutcome {
            path: path.to_path_buf(),
            ..PatchOutcome::default()
        };
        let Some(original) = self.filesystem.read_to_string(path).await? else {
            return Ok(outcome);
        };

        let mut document = AggregateDocument::parse(&original)?;
        if document.remove(key) {
            let pruned = document.prune_prefixed_imports();
            debug!(pruned, "Stale block removed");
            outcome.written = self.write_if_changed(path, Some(&original), &document).await?;
        }
        Ok(outcome)
    }

    async fn write_if_changed(
        &self,
        path: &Path,
        original: Option<&str>,
        document: &AggregateDocument,
    ) -> StrataResult<bool> {
        let rendered = document.render();
        if original == Some(rendered.as_str()) {
            debug!("Unchanged");
            return Ok(false);
        }
        self.filesystem.write(path, &rendered).await?;
        Ok(true)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::application::ports::MockFilesystem;
    use crate::domain::{DomainError, SectionSkeleton, Skeleton};
    use crate::error::StrataError;
    use mockall::predicate::eq;

    fn fragment(api: &str, body: &str) -> ArtifactFragment {
        ArtifactFragment {
            path: PathBuf::from("lib/source.dart"),
            key: BlockKey::new("source", api),
            imports: vec![format!("import '{api}.dart';")],
            body: vec![body.to_string()],
            defines: vec![api.to_string()],
            skeleton: Skeleton {
                header: vec!["// generated".into()],
                sections: vec![SectionSkeleton::braced("source", "class Source {")],
            },
        }
    }

    const CREATED: &str = "// generated\n\nimport 'a.dart';\n\nclass Source {\n  // strata:begin source a\n  void a();\n  // strata:end source a\n  // strata:anchor source\n}\n";

    #[tokio::test]
    async fn missing_file_is_created_from_skeleton() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string().returning(|_| Ok(None));
        fs.expect_write()
            .with(eq(Path::new("lib/source.dart")), eq(CREATED))
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .patch(Path::new("lib/source.dart"), &[&fragment("a", "void a();")])
            .await
            .unwrap();
        assert!(outcome.written);
        assert!(outcome.warnings.is_empty());
    }

    #[tokio::test]
    async fn unchanged_content_is_not_written() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(Some(CREATED.to_string())));
        fs.expect_write().never();

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .patch(Path::new("lib/source.dart"), &[&fragment("a", "void a();")])
            .await
            .unwrap();
        assert!(!outcome.written);
    }

    #[tokio::test]
    async fn missing_anchor_is_a_warning() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(Some("class Source {\n}\n".to_string())));
        fs.expect_write().times(1).returning(|_, _| Ok(()));

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .patch(Path::new("lib/source.dart"), &[&fragment("b", "void b();")])
            .await
            .unwrap();
        assert_eq!(outcome.warnings.len(), 1);
        assert!(matches!(
            &outcome.warnings[0],
            ApplicationError::PatchAnchorNotFound { section, api, .. } if section == "source" && api == "b"
        ));
    }

    #[tokio::test]
    async fn malformed_file_is_left_alone() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(Some("// strata:begin source a\n".to_string())));
        fs.expect_write().never();

        let engine = PatchEngine::new(&fs);
        let err = engine
            .patch(Path::new("lib/source.dart"), &[&fragment("a", "void a();")])
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            StrataError::Domain(DomainError::MalformedBlock { .. })
        ));
    }

    #[tokio::test]
    async fn remove_on_missing_file_is_a_no_op() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string().returning(|_| Ok(None));
        fs.expect_write().never();

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .remove(Path::new("lib/mapper.dart"), &BlockKey::new("mapper", "a"))
            .await
            .unwrap();
        assert!(!outcome.written);
    }

    #[tokio::test]
    async fn remove_rewrites_without_the_block() {
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(Some(CREATED.to_string())));
        fs.expect_write()
            .withf(|_, content: &str| {
                !content.contains("void a();")
                    && content.contains("// strata:anchor source")
                    && content.contains("import 'a.dart';")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .remove(Path::new("lib/source.dart"), &BlockKey::new("source", "a"))
            .await
            .unwrap();
        assert!(outcome.written);
    }

    #[tokio::test]
    async fn remove_prunes_the_block_prefixed_imports() {
        const MAPPER: &str = "import 'a_response.dart' as a_response;\nimport 'b_response.dart' as b_response;\n\n// strata:begin mapper a\nextension A on a_response.AResponse {}\n// strata:end mapper a\n\n// strata:begin mapper b\nextension B on b_response.BResponse {}\n// strata:end mapper b\n// strata:anchor mapper\n";
        let mut fs = MockFilesystem::new();
        fs.expect_read_to_string()
            .returning(|_| Ok(Some(MAPPER.to_string())));
        fs.expect_write()
            .withf(|_, content: &str| {
                !content.contains("as a_response;") && content.contains("as b_response;")
            })
            .times(1)
            .returning(|_, _| Ok(()));

        let engine = PatchEngine::new(&fs);
        let outcome = engine
            .remove(Path::new("lib/mapper.dart"), &BlockKey::new("mapper", "a"))
            .await
            .unwrap();
        assert!(outcome.written);
    }
}
