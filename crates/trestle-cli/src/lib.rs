//! CLI logic for the Trestle railroad diagram tool.
//!
//! This module contains the core CLI logic: reading a source file, rendering
//! every named diagram it defines and writing one SVG file per diagram.

pub mod error_adapter;

mod args;
mod config;

pub use args::Args;

use std::{
    collections::HashSet,
    fs,
    path::{Path, PathBuf},
};

use log::{debug, info, warn};

use trestle::{
    Renderer, TrestleError,
    export::{Exporter, svg::Svg},
};

/// Run the Trestle CLI application
///
/// This function processes the input file through the Trestle pipeline and
/// writes `<output_dir>/<diagram name>.svg` for every diagram in it.
///
/// # Arguments
///
/// * `args` - Command-line arguments
///
/// # Errors
///
/// Returns `TrestleError` for:
/// - File I/O errors
/// - Configuration loading errors
/// - Parsing errors
/// - Layout errors
/// - Rendering errors
pub fn run(args: &Args) -> Result<(), TrestleError> {
    info!(
        input_path = args.input,
        output_dir = args.output_dir;
        "Processing diagrams"
    );

    let app_config = config::load_config(args.config.as_ref())?;
    let renderer = Renderer::new(app_config)?;

    let source = fs::read_to_string(&args.input)?;
    let diagrams = renderer.parse(&source)?;

    fs::create_dir_all(&args.output_dir)?;

    let mut paths = OutputPaths::new(&args.output_dir);
    for diagram in &diagrams {
        let document = renderer.render(diagram.root())?;
        let path = paths.next_path(diagram.name());
        debug!(diagram = diagram.name(), path:? = path; "Exporting diagram");

        let mut exporter = Svg::new(&path);
        exporter.export_document(&document)?;
    }

    info!(
        diagrams = diagrams.len(),
        output_dir = args.output_dir;
        "SVG files exported successfully"
    );

    Ok(())
}

/// Assigns each diagram a distinct output file in one directory.
///
/// Names that sanitize to the same stem, or differ only in case, get a
/// numeric suffix: `a/b` and `a_b` are written to `a_b.svg` and `a_b-2.svg`.
struct OutputPaths {
    output_dir: PathBuf,
    taken: HashSet<String>,
}

impl OutputPaths {
    fn new(output_dir: impl AsRef<Path>) -> Self {
        Self {
            output_dir: output_dir.as_ref().to_path_buf(),
            taken: HashSet::new(),
        }
    }

    fn next_path(&mut self, name: &str) -> PathBuf {
        let base = output_stem(name);
        let mut stem = base.clone();
        let mut suffix = 1;
        while !self.taken.insert(stem.to_lowercase()) {
            suffix += 1;
            stem = format!("{base}-{suffix}");
        }
        if suffix > 1 {
            warn!(diagram = name, file = stem; "Output file name already used, adding a suffix");
        }
        self.output_dir.join(format!("{stem}.svg"))
    }
}

/// File stem for a diagram, with path separators and other characters that
/// are unsafe in file names replaced by `_`.
fn output_stem(name: &str) -> String {
    let stem: String = name
        .chars()
        .map(|c| match c {
            '/' | '\\' | ':' | '*' | '?' | '"' | '<' | '>' | '|' => '_',
            c if c.is_control() => '_',
            c => c,
        })
        .collect();
    match stem.trim() {
        "" | "." | ".." => "diagram".to_string(),
        trimmed => trimmed.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_stem_keeps_plain_names() {
        assert_eq!(output_stem("ObjectName"), "ObjectName");
        assert_eq!(output_stem("select core"), "select core");
    }

    #[test]
    fn test_output_stem_sanitizes_separators() {
        assert_eq!(output_stem("a/b\\c:d"), "a_b_c_d");
        assert_eq!(output_stem(".."), "diagram");
        assert_eq!(output_stem("  "), "diagram");
    }

    #[test]
    fn test_output_paths_never_collide() {
        let mut paths = OutputPaths::new("out");
        let out = Path::new("out");

        assert_eq!(paths.next_path("a/b"), out.join("a_b.svg"));
        assert_eq!(paths.next_path("a_b"), out.join("a_b-2.svg"));
        assert_eq!(paths.next_path("a:b"), out.join("a_b-3.svg"));
        assert_eq!(paths.next_path("a_b-2"), out.join("a_b-2-2.svg"));
        assert_eq!(paths.next_path("A_B"), out.join("A_B-4.svg"));
        assert_eq!(paths.next_path("."), out.join("diagram.svg"));
        assert_eq!(paths.next_path(".."), out.join("diagram-2.svg"));
    }
}
