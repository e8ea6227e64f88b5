//! Implementation of `gen-build deps`.

use std::path::Path;

use anyhow::{Context, Result};
use tracing::info;

use crate::builder::{GenConfig, LibraryBuildGenerator};
use crate::ops::resolve::Session;
use crate::ops::write::{WriteMode, WriteReport};

/// Render the dependency repository's BUILD file into `output_dir`.
///
/// Archive paths render relative to the configured repository directory,
/// or to `output_dir` when none is configured.
pub fn generate_deps(
    session: &Session,
    config: &GenConfig,
    output_dir: &Path,
    mode: WriteMode,
) -> Result<WriteReport> {
    let mut config = config.clone();
    if config.repository_dir.is_none() {
        config.repository_dir = Some(output_dir.to_path_buf());
    }

    let text = LibraryBuildGenerator::new(&session.manifest, &session.index, &config)
        .generate()
        .with_context(|| format!("failed to generate {} BUILD file", config.deps_repo))?;

    let mut report = WriteReport::default();
    report.emit(&output_dir.join(&config.build_file_name), &text, mode)?;

    info!(
        "{} libraries in {}",
        session.index.libraries().len(),
        config.deps_repo
    );
    Ok(report)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::MANIFEST_NAME;
    use crate::ops::resolve::{load_session, SessionOptions};
    use crate::test_support::fixtures::ProjectFixture;

    #[test]
    fn test_generate_deps() {
        let project = ProjectFixture::new()
            .with_jar("acme-corp/widget-lib", "2.3.0", &[("widget/core.clj", "(ns widget.core)")])
            .create();
        let session = load_session(&SessionOptions {
            manifest_path: project.root().join(MANIFEST_NAME),
            ..Default::default()
        })
        .unwrap();

        let config = GenConfig::default();
        let report = generate_deps(&session, &config, project.root(), WriteMode::Write).unwrap();
        assert_eq!(report.written, vec![project.root().join("BUILD.bazel")]);

        let text = project.read("BUILD.bazel");
        assert!(text.contains("name = \"acme_corp_widget_lib\""));
        assert!(text.contains("jars = [\"m2/acme_corp_widget_lib.jar\"]"));
        assert!(text.contains("name = \"ns_acme_corp_widget_lib_widget_core\""));

        let again = generate_deps(&session, &config, project.root(), WriteMode::Check).unwrap();
        assert!(again.ensure_fresh().is_ok());
    }
}
