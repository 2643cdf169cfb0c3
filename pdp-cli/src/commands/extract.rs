use super::Settings;
use crate::errors::CliError;
use pdp_extract::batch::{run_batch, BatchSummary, SourceDocument};
use pdp_extract::gateway::AiGateway;
use pdp_extract::sink::CsvSink;
use std::path::{Path, PathBuf};
use std::sync::Arc;

/// Default output file name inside the data directory.
pub const DEFAULT_OUTPUT: &str = "data_out.csv";

/// Resolves the pages to process.
///
/// A relative `file` is looked up in `data_dir` by file name. Without `file`,
/// every `*.html` in `data_dir` is returned, sorted by name.
///
/// # Errors
/// Returns [`CliError::InputNotFound`] for a missing `file`, or an I/O error
/// if `data_dir` cannot be listed.
pub async fn resolve_inputs(data_dir: &Path, file: Option<&Path>) -> Result<Vec<PathBuf>, CliError> {
    if let Some(file) = file {
        let path = if file.is_absolute() {
            file.to_path_buf()
        } else {
            file.file_name()
                .map_or_else(|| data_dir.join(file), |name| data_dir.join(name))
        };
        if !tokio::fs::try_exists(&path).await? {
            return Err(CliError::InputNotFound(path));
        }
        return Ok(vec![path]);
    }

    let mut paths = Vec::new();
    let mut entries = tokio::fs::read_dir(data_dir).await?;
    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if path.extension().is_some_and(|ext| ext == "html") && entry.file_type().await?.is_file() {
            paths.push(path);
        }
    }
    paths.sort();
    Ok(paths)
}

/// Extracts one page or the whole data directory, upserting each product
/// into the CSV at `out` (default `<data_dir>/data_out.csv`).
///
/// # Errors
/// Returns an error if inputs cannot be resolved or read, or the taxonomy
/// cannot be loaded. Per-document extraction failures are reported in the
/// summary instead.
pub async fn run(
    settings: &Settings,
    gateway: Arc<dyn AiGateway>,
    file: Option<&Path>,
    out: Option<PathBuf>,
) -> Result<BatchSummary, CliError> {
    let paths = resolve_inputs(&settings.data_dir, file).await?;
    if paths.is_empty() {
        tracing::warn!(dir = %settings.data_dir.display(), "No .html files found");
        return Ok(BatchSummary::default());
    }

    let out = out.unwrap_or_else(|| settings.data_dir.join(DEFAULT_OUTPUT));
    let orchestrator = settings
        .orchestrator(gateway)
        .await?
        .with_sink(Arc::new(CsvSink::new(out)));

    let mut documents = Vec::with_capacity(paths.len());
    for path in paths {
        let bytes = tokio::fs::read(&path).await?;
        let key = path
            .file_name()
            .map_or_else(|| path.display().to_string(), |n| n.to_string_lossy().into_owned());
        documents.push(SourceDocument {
            key,
            html: String::from_utf8_lossy(&bytes).into_owned(),
        });
    }

    Ok(run_batch(&orchestrator, documents, &settings.config).await)
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn lists_html_files_sorted() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["nike.html", "ace.html", "notes.txt", "data_out.csv"] {
            std::fs::write(dir.path().join(name), "<html></html>").unwrap();
        }

        let paths = resolve_inputs(dir.path(), None).await.unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["ace.html", "nike.html"]);
    }

    #[tokio::test]
    async fn relative_file_is_looked_up_in_data_dir() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::write(dir.path().join("ace.html"), "<html></html>").unwrap();

        let paths = resolve_inputs(dir.path(), Some(Path::new("elsewhere/ace.html")))
            .await
            .unwrap();
        assert_eq!(paths, vec![dir.path().join("ace.html")]);
    }

    #[tokio::test]
    async fn missing_file_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = resolve_inputs(dir.path(), Some(Path::new("gone.html")))
            .await
            .unwrap_err();
        assert!(matches!(err, CliError::InputNotFound(p) if p.ends_with("gone.html")));
    }

    #[tokio::test]
    async fn empty_directory_yields_nothing() {
        let dir = tempfile::tempdir().unwrap();
        assert!(resolve_inputs(dir.path(), None).await.unwrap().is_empty());
    }
}
