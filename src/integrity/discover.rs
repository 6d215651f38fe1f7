use ignore::WalkBuilder;
use std::path::Path;

/// All files under `root` with one of `extensions`, honouring .gitignore.
///
/// Used by incremental analysis to notice files added since the last run.
/// Returned sorted.
pub fn discover_source_files(root: &Path, extensions: &[String]) -> Vec<String> {
    let walker = WalkBuilder::new(root).standard_filters(true).build();

    let mut files: Vec<String> = walker
        .filter_map(|entry| entry.ok())
        .filter(|entry| entry.file_type().is_some_and(|t| t.is_file()))
        .filter(|entry| {
            entry
                .path()
                .extension()
                .and_then(|ext| ext.to_str())
                .is_some_and(|ext| extensions.iter().any(|wanted| wanted == ext))
        })
        .map(|entry| entry.path().to_string_lossy().to_string())
        .collect();

    files.sort();
    files
}
