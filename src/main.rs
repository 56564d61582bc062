//! folio – command-line document renderer.
//!
//! Usage:
//!   folio <input.json> [output] [--png] [--landscape] [--title "My Report"]
//!         [--dpi N] [--margin LEN] [--demo NAME]
//!
//! If `output` is omitted the result is written next to the input file with
//! the same stem (e.g. `report.json` → `report.pdf`). With `--png` every page
//! is written as `<stem>-N.png`.

use std::{env, fs, path::Path, path::PathBuf, process};

use folio::geometry::Thickness;
use folio::pipeline::{generate_pdf, generate_png_pages, PageOrientation, PipelineConfig};
use folio::templates;

fn main() {
    env_logger::init();

    let args: Vec<String> = env::args().collect();

    let mut input_path: Option<PathBuf> = None;
    let mut output_path: Option<PathBuf> = None;
    let mut demo: Option<String> = None;
    let mut png = false;
    let mut landscape = false;
    let mut title: Option<String> = None;
    let mut dpi: Option<f32> = None;
    let mut margin: Option<Thickness> = None;
    let mut positional = 0usize;

    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--landscape" | "-l" => landscape = true,
            "--png" => png = true,
            "--title" | "-t" => title = Some(flag_value(&mut iter, arg, &args[0])),
            "--dpi" => {
                let value = flag_value(&mut iter, arg, &args[0]);
                match value.parse::<f32>() {
                    Ok(v) => dpi = Some(v),
                    Err(e) => fail(&format!("invalid --dpi {value:?}: {e}")),
                }
            }
            "--margin" | "-m" => {
                let value = flag_value(&mut iter, arg, &args[0]);
                match value.parse::<Thickness>() {
                    Ok(v) => margin = Some(v),
                    Err(e) => fail(&format!("invalid --margin {value:?}: {e}")),
                }
            }
            "--demo" => demo = Some(flag_value(&mut iter, arg, &args[0])),
            "--help" | "-h" => {
                print_usage(&args[0]);
                process::exit(0);
            }
            other if other.starts_with('-') => {
                eprintln!("Unknown flag: {other}");
                print_usage(&args[0]);
                process::exit(1);
            }
            path => {
                match positional {
                    0 if demo.is_none() => input_path = Some(PathBuf::from(path)),
                    0 | 1 => output_path = Some(PathBuf::from(path)),
                    _ => {
                        eprintln!("Unexpected argument: {path}");
                        print_usage(&args[0]);
                        process::exit(1);
                    }
                }
                positional += 1;
            }
        }
    }

    let (json, stem_source) = match (&demo, &input_path) {
        (Some(name), _) => match templates::by_name(name) {
            Some(json) => (json, PathBuf::from(format!("{name}.json"))),
            None => fail(&format!(
                "unknown demo {name:?} (available: {})",
                templates::NAMES.join(", ")
            )),
        },
        (None, Some(input)) => match fs::read_to_string(input) {
            Ok(s) => (s, input.clone()),
            Err(e) => fail(&format!("Error reading '{}': {e}", input.display())),
        },
        (None, None) => {
            eprintln!("Error: no input file specified.");
            print_usage(&args[0]);
            process::exit(1);
        }
    };

    // Default output: same directory + same stem as input.
    let output = output_path.unwrap_or_else(|| {
        let mut o = stem_source.clone();
        o.set_extension(if png { "png" } else { "pdf" });
        o
    });

    // Default title: stem of the input filename.
    let default_title = stem_source
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("folio output")
        .to_string();

    let defaults = PipelineConfig::default();
    let config = PipelineConfig {
        title: title.unwrap_or(default_title),
        dpi: dpi.unwrap_or(defaults.dpi),
        margin: margin.unwrap_or(defaults.margin),
        orientation: if landscape {
            PageOrientation::Landscape
        } else {
            PageOrientation::Portrait
        },
        ..defaults
    };

    ensure_parent(&output);
    if png {
        let pages = match generate_png_pages(&json, &config) {
            Ok(pages) => pages,
            Err(e) => fail(&format!("Error generating PNG: {e}")),
        };
        for (i, bytes) in pages.iter().enumerate() {
            let path = numbered(&output, i + 1);
            write(&path, bytes);
        }
        eprintln!("Wrote {} PNG page(s) next to '{}'", pages.len(), output.display());
    } else {
        let (bytes, layout) = match generate_pdf(&json, &config) {
            Ok(result) => result,
            Err(e) => fail(&format!("Error generating PDF: {e}")),
        };
        write(&output, &bytes);
        let pages = layout.pages.len();
        eprintln!(
            "Wrote '{}' ({} bytes, {} page{})",
            output.display(),
            bytes.len(),
            pages,
            if pages == 1 { "" } else { "s" }
        );
    }
}

fn flag_value<'a>(iter: &mut impl Iterator<Item = &'a String>, flag: &str, prog: &str) -> String {
    match iter.next() {
        Some(v) => v.clone(),
        None => {
            eprintln!("Missing value for {flag}");
            print_usage(prog);
            process::exit(1);
        }
    }
}

fn fail(message: &str) -> ! {
    eprintln!("{message}");
    process::exit(1);
}

/// `out.png` → `out-3.png`.
fn numbered(path: &Path, page: usize) -> PathBuf {
    let stem = path.file_stem().and_then(|s| s.to_str()).unwrap_or("page");
    path.with_file_name(format!("{stem}-{page}.png"))
}

fn ensure_parent(output: &Path) {
    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() {
            if let Err(e) = fs::create_dir_all(parent) {
                fail(&format!("Error creating output directory: {e}"));
            }
        }
    }
}

fn write(path: &Path, bytes: &[u8]) {
    if let Err(e) = fs::write(path, bytes) {
        fail(&format!("Error writing '{}': {e}", path.display()));
    }
}

fn print_usage(prog: &str) {
    eprintln!("folio – paginated document renderer");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  {prog} <input.json> [output] [--png] [--landscape] [--title \"My Report\"]");
    eprintln!("  {prog} --demo <name> [output] [flags]");
    eprintln!();
    eprintln!("Arguments:");
    eprintln!("  <input.json>   Document description (images must be base64 data URIs)");
    eprintln!("  [output]       Output path  (default: same stem as input with .pdf/.png)");
    eprintln!();
    eprintln!("Flags:");
    eprintln!("  --png          Write one PNG per page instead of a PDF");
    eprintln!("  --title, -t    Document title in PDF metadata (default: input filename stem)");
    eprintln!("  --landscape    Use landscape page orientation");
    eprintln!("  --dpi N        Layout resolution (default 96)");
    eprintln!("  --margin LEN   Page margin, e.g. 10mm or \"15mm 20mm\" (default 10mm)");
    eprintln!("  --demo NAME    Render a built-in sample ({})", templates::NAMES.join(", "));
    eprintln!("  --help         Print this message");
}
