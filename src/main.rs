mod claims;
mod config;
mod csv_out;
mod pdf_text;

use pdf_text::PdfContent;
use std::path::{Path, PathBuf};
use std::{env, fs, process};
use tracing::{error, info};

const CONFIG_PATH: &str = ".config/remit2csv.toml";

/// Exit code for documents we could open but not read as remittance text
/// (scanned, corrupt, not a PDF). Internal I/O failures exit 1 via `main`'s
/// error return instead.
const EXIT_UNREADABLE: i32 = 2;

struct Args {
    input: PathBuf,
    output: Option<PathBuf>,
    /// Treat the input as already-extracted text instead of a PDF.
    text_mode: bool,
    /// Dump the extracted records as pretty JSON to stdout.
    json: bool,
}

fn parse_args(mut args: impl Iterator<Item = String>) -> Option<Args> {
    let mut input = None;
    let mut output = None;
    let mut text_mode = false;
    let mut json = false;
    args.next(); // program name
    for arg in args {
        match arg.as_str() {
            "--text" => text_mode = true,
            "--json" => json = true,
            _ if input.is_none() => input = Some(PathBuf::from(arg)),
            _ if output.is_none() => output = Some(PathBuf::from(arg)),
            _ => return None,
        }
    }
    Some(Args {
        input: input?,
        output,
        text_mode,
        json,
    })
}

fn usage() -> ! {
    eprintln!("usage: remit2csv [--text] [--json] <input.pdf> [output.csv]");
    process::exit(EXIT_UNREADABLE)
}

/// `<dir>/<stem>_converted.csv`, matching the download name the report
/// consumers already expect.
fn derive_output_path(input: &Path, output_dir: Option<&Path>) -> PathBuf {
    let stem = input
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "output".to_string());
    let name = format!("{stem}_converted.csv");
    match output_dir {
        Some(dir) => dir.join(name),
        None => input.with_file_name(name),
    }
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    // init tracing
    tracing_subscriber::fmt()
        .with_target(true)
        .with_level(true)
        .with_env_filter("info")
        .init();

    let Some(args) = parse_args(env::args()) else {
        usage();
    };
    let cfg = config::Config::load_or_default(CONFIG_PATH)?;

    let text = if args.text_mode {
        match fs::read_to_string(&args.input) {
            Ok(t) => t,
            Err(e) => {
                error!(input = %args.input.display(), error = %e, "could not read document");
                process::exit(EXIT_UNREADABLE);
            }
        }
    } else {
        let bytes = match fs::read(&args.input) {
            Ok(b) => b,
            Err(e) => {
                error!(input = %args.input.display(), error = %e, "could not read document");
                process::exit(EXIT_UNREADABLE);
            }
        };
        match pdf_text::extract_text(&bytes) {
            PdfContent::Text(text) => text,
            PdfContent::ScannedImage => {
                error!(
                    input = %args.input.display(),
                    "document is scanned or image-only, no text to extract"
                );
                process::exit(EXIT_UNREADABLE);
            }
            PdfContent::Error(e) => {
                error!(input = %args.input.display(), error = %e, "could not read document");
                process::exit(EXIT_UNREADABLE);
            }
        }
    };

    let span = tracing::info_span!("document", input = %args.input.display());
    let _guard = span.enter();

    let records = claims::scan_claims_with(&text, &cfg.scan.windows());
    info!(claims = records.len(), "extraction finished");
    for (idx, record) in records.iter().enumerate() {
        let (filled, total) = record.coverage();
        tracing::debug!(
            idx,
            filled,
            total,
            claim = %record.claim_number,
            service_line = record.has_service_line(),
            "record"
        );
    }

    if args.json {
        println!("{}", serde_json::to_string_pretty(&records)?);
    }

    // Zero matches is still a successful conversion; the sentinel blob is
    // what gets written.
    let csv = csv_out::to_csv(&records);
    let out_path = args
        .output
        .unwrap_or_else(|| derive_output_path(&args.input, cfg.output_dir.as_deref()));
    fs::write(&out_path, &csv)?;
    info!(output = %out_path.display(), bytes = csv.len(), "WROTE");

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(list: &[&str]) -> Option<Args> {
        parse_args(
            std::iter::once("remit2csv".to_string()).chain(list.iter().map(|s| s.to_string())),
        )
    }

    #[test]
    fn output_name_derives_from_input_stem() {
        let out = derive_output_path(Path::new("/reports/march_remit.pdf"), None);
        assert_eq!(out, PathBuf::from("/reports/march_remit_converted.csv"));
    }

    #[test]
    fn output_dir_overrides_input_location() {
        let out = derive_output_path(
            Path::new("/reports/march_remit.pdf"),
            Some(Path::new("/exports")),
        );
        assert_eq!(out, PathBuf::from("/exports/march_remit_converted.csv"));
    }

    #[test]
    fn flags_and_positionals_parse() {
        let parsed = args(&["--text", "--json", "in.txt", "out.csv"]).unwrap();
        assert!(parsed.text_mode);
        assert!(parsed.json);
        assert_eq!(parsed.input, PathBuf::from("in.txt"));
        assert_eq!(parsed.output, Some(PathBuf::from("out.csv")));
    }

    #[test]
    fn missing_input_is_rejected() {
        assert!(args(&[]).is_none());
        assert!(args(&["--json"]).is_none());
    }

    #[test]
    fn extra_positionals_are_rejected() {
        assert!(args(&["a.pdf", "b.csv", "c.csv"]).is_none());
    }
}
