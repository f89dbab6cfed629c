//! `sketchgen`: export saved drawings without a browser.
//!
//! Loads a JSON snapshot through the same editor the page uses, backed by
//! a recording surface, then writes SVG or PNG. `check` also encodes the
//! loaded surface into a Vello scene.

use clap::{Parser, Subcommand};
use sg_core::SnapshotError;
use sg_editor::{Editor, EditorConfig};
use sg_render::{RasterError, RecordingSurface, ScenePainter};
use std::collections::BTreeMap;
use std::io::{self, Write as _};
use std::path::{Path, PathBuf};
use std::process::ExitCode;

#[derive(Debug, thiserror::Error)]
enum CliError {
    #[error("cannot read {}: {source}", path.display())]
    Read { path: PathBuf, source: io::Error },
    #[error("cannot write {}: {source}", path.display())]
    Write { path: PathBuf, source: io::Error },
    #[error("invalid editor config: {0}")]
    Config(#[from] serde_json::Error),
    #[error("invalid snapshot: {0}")]
    Snapshot(#[from] SnapshotError),
    #[error("raster export failed: {0}")]
    Raster(#[from] RasterError),
    #[error("multiplier must be positive, got {0}")]
    Multiplier(f64),
}

#[derive(Parser, Debug)]
#[command(name = "sketchgen", about = "Export SketchGen drawings to SVG or PNG")]
struct Cli {
    /// Editor config JSON. Missing fields take their defaults.
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Load a snapshot, encode it into a Vello scene and print a summary.
    Check { input: PathBuf },
    /// Vector export, one element per shape.
    Svg {
        input: PathBuf,
        /// Output file; stdout when omitted.
        #[arg(short, long)]
        output: Option<PathBuf>,
    },
    /// Raster export through the full-fidelity renderer.
    Png {
        input: PathBuf,
        #[arg(short, long)]
        output: PathBuf,
        /// Overrides the configured supersampling factor.
        #[arg(long)]
        multiplier: Option<f64>,
    },
}

fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();

    match run(Cli::parse()) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            log::error!("{e}");
            eprintln!("sketchgen: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(cli: Cli) -> Result<(), CliError> {
    let mut config = match &cli.config {
        Some(path) => EditorConfig::from_json(&read(path)?)?,
        None => EditorConfig::default(),
    };

    match cli.command {
        Command::Check { input } => {
            let editor = load(&input, config)?;
            print!("{}", summary(&editor));
            Ok(())
        }
        Command::Svg { input, output } => {
            let svg = load(&input, config)?.export_svg();
            match output {
                Some(path) => write(&path, svg.as_bytes()),
                None => io::stdout()
                    .write_all(svg.as_bytes())
                    .map_err(|source| CliError::Write {
                        path: PathBuf::from("<stdout>"),
                        source,
                    }),
            }
        }
        Command::Png {
            input,
            output,
            multiplier,
        } => {
            if let Some(m) = multiplier {
                if !(m > 0.0 && m.is_finite()) {
                    return Err(CliError::Multiplier(m));
                }
                config.raster_multiplier = m;
            }
            let png = load(&input, config)?.export_raster()?;
            write(&output, &png)
        }
    }
}

/// Build an editor and import the snapshot at `path` into it.
fn load(path: &Path, config: EditorConfig) -> Result<Editor, CliError> {
    let json = read(path)?;
    let mut editor = Editor::new(Box::new(RecordingSurface::new(config.dimensions)), config);
    editor.import_json(&json)?;
    log::info!(
        "loaded {} shapes from {}",
        editor.shapes().len(),
        path.display()
    );
    Ok(editor)
}

fn summary(editor: &Editor) -> String {
    let dims = editor.dimensions();
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for shape in editor.shapes().iter() {
        *counts.entry(shape.shape_type().as_str()).or_default() += 1;
    }
    let mut out = format!(
        "canvas {}×{}, {} shapes, background: {}\n",
        dims.width,
        dims.height,
        editor.shapes().len(),
        if editor.background_image().is_some() { "yes" } else { "no" }
    );
    for (kind, n) in counts {
        out.push_str(&format!("  {kind}: {n}\n"));
    }

    // No pixels are decoded here, so image primitives are skipped.
    let surface = editor.surface().surface();
    let (_, painted) = ScenePainter::new().encode(surface);
    out.push_str(&format!(
        "vello scene: {painted} of {} primitives painted\n",
        surface.primitives().len()
    ));
    out
}

fn read(path: &Path) -> Result<String, CliError> {
    std::fs::read_to_string(path).map_err(|source| CliError::Read {
        path: path.to_path_buf(),
        source,
    })
}

fn write(path: &Path, bytes: &[u8]) -> Result<(), CliError> {
    std::fs::write(path, bytes).map_err(|source| CliError::Write {
        path: path.to_path_buf(),
        source,
    })?;
    log::info!("wrote {} bytes to {}", bytes.len(), path.display());
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;
    use pretty_assertions::assert_eq;

    const DRAWING: &str = r##"{
      "version": "1.0",
      "dimensions": { "width": 200, "height": 100 },
      "shapes": [
        { "id": "a", "type": "rectangle", "x": 10, "y": 10, "width": 50, "height": 30,
          "rotation": 0, "strokeColor": "#000000", "fillColor": "#ff0000",
          "strokeWidth": 2, "opacity": 1 },
        { "id": "b", "type": "circle", "x": 120, "y": 50, "radius": 20, "rotation": 0,
          "strokeColor": "#000000", "fillColor": "transparent", "strokeWidth": 1, "opacity": 1 },
        { "id": "c", "type": "rectangle", "x": 0, "y": 0, "width": 5, "height": 5,
          "rotation": 0, "strokeColor": "#000000", "fillColor": "#ffffff",
          "strokeWidth": 1, "opacity": 1 }
      ]
    }"##;

    fn fixture(name: &str, contents: &str) -> PathBuf {
        let path = std::env::temp_dir().join(format!("sketchgen-{}-{name}", std::process::id()));
        std::fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn summary_counts_kinds() {
        let input = fixture("summary.json", DRAWING);
        let editor = load(&input, EditorConfig::default()).unwrap();
        assert_eq!(
            summary(&editor),
            "canvas 200×100, 3 shapes, background: no\n  circle: 1\n  rectangle: 2\n\
             vello scene: 3 of 3 primitives painted\n"
        );
    }

    #[test]
    fn summary_reports_images_awaiting_pixels() {
        let drawing = r##"{
          "version": "1.0",
          "dimensions": { "width": 100, "height": 100 },
          "shapes": [
            { "id": "img", "type": "image", "x": 0, "y": 0, "src": "photo.png",
              "width": 40, "height": 30, "rotation": 0, "strokeColor": "",
              "fillColor": "", "strokeWidth": 0, "opacity": 1 },
            { "id": "bar", "type": "rectangle", "x": 0, "y": 0, "width": 5, "height": 5,
              "rotation": 0, "strokeColor": "#000000", "fillColor": "#ffffff",
              "strokeWidth": 1, "opacity": 1 }
          ]
        }"##;
        let input = fixture("images.json", drawing);
        let editor = load(&input, EditorConfig::default()).unwrap();
        assert!(summary(&editor).ends_with("vello scene: 1 of 2 primitives painted\n"));
    }

    #[test]
    fn svg_and_png_exports_are_written() {
        let input = fixture("export.json", DRAWING);
        let svg_out = std::env::temp_dir().join(format!("sketchgen-{}-out.svg", std::process::id()));
        run(Cli::parse_from([
            "sketchgen",
            "svg",
            input.to_str().unwrap(),
            "-o",
            svg_out.to_str().unwrap(),
        ]))
        .unwrap();
        let svg = std::fs::read_to_string(&svg_out).unwrap();
        assert!(svg.contains("<circle"));

        let png_out = std::env::temp_dir().join(format!("sketchgen-{}-out.png", std::process::id()));
        run(Cli::parse_from([
            "sketchgen",
            "png",
            input.to_str().unwrap(),
            "-o",
            png_out.to_str().unwrap(),
            "--multiplier",
            "1",
        ]))
        .unwrap();
        let png = std::fs::read(&png_out).unwrap();
        assert_eq!(&png[1..4], b"PNG");
    }

    #[test]
    fn bad_input_is_reported_not_panicked() {
        let input = fixture("bad.json", "{ nope");
        let err = load(&input, EditorConfig::default()).err();
        assert!(matches!(err, Some(CliError::Snapshot(SnapshotError::Parse(_)))));

        let missing = load(Path::new("/definitely/not/here.json"), EditorConfig::default()).err();
        assert!(matches!(missing, Some(CliError::Read { .. })));
    }

    #[test]
    fn non_positive_multiplier_is_rejected() {
        let input = fixture("mult.json", DRAWING);
        let err = run(Cli::parse_from([
            "sketchgen",
            "png",
            input.to_str().unwrap(),
            "-o",
            "/tmp/never-written.png",
            "--multiplier",
            "0",
        ]))
        .err();
        assert!(matches!(err, Some(CliError::Multiplier(m)) if m == 0.0));
    }
}
