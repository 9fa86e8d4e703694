//! External vector-format conversion. Proprietary artwork files (AI) are
//! PDF-based; three converter chains are tried in priority order, each
//! bounded by a per-attempt deadline, and the SVG output is sanity-checked
//! before acceptance.

use std::path::{Path, PathBuf};
use std::process::{Command, Stdio};
use std::time::{Duration, Instant};

use thiserror::Error;

pub const CONVERT_TIMEOUT: Duration = Duration::from_secs(60);

#[derive(Debug, Error)]
pub enum ConvertError {
    #[error("no converter produced usable output; attempts: {0:?}")]
    AllConvertersFailed(Vec<String>),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

#[derive(Debug, Clone, Default)]
pub struct AiVersion {
    pub numeric_version: Option<f64>,
    pub display_name: String,
    pub raw_version: Option<String>,
}

#[derive(Debug)]
pub struct ConvertOutcome {
    pub svg_text: String,
    pub converter: String,
    /// One line per converter tried, for the report.
    pub attempts: Vec<String>,
}

/// Converts an artwork file to SVG text, trying Inkscape, then UniConvertor,
/// then Ghostscript+pdf2svg. Scratch files live in a temp directory that is
/// removed on every exit path.
pub fn convert_to_svg(input: &Path) -> Result<ConvertOutcome, ConvertError> {
    let scratch = tempfile::tempdir()?;
    let out_svg = scratch.path().join("converted.svg");
    let mut attempts = Vec::new();

    if let Some(outcome) = try_inkscape(input, &out_svg, &mut attempts)? {
        return Ok(outcome);
    }
    if let Some(outcome) = try_uniconvertor(input, &out_svg, &mut attempts)? {
        return Ok(outcome);
    }
    if let Some(outcome) = try_ghostscript(input, scratch.path(), &out_svg, &mut attempts)? {
        return Ok(outcome);
    }

    Err(ConvertError::AllConvertersFailed(attempts))
}

fn try_inkscape(
    input: &Path,
    out_svg: &Path,
    attempts: &mut Vec<String>,
) -> Result<Option<ConvertOutcome>, ConvertError> {
    let Some(bin) = find_in_path("inkscape") else {
        attempts.push("inkscape: not installed".to_string());
        return Ok(None);
    };
    let mut cmd = Command::new(bin);
    cmd.arg(input).arg(format!("--export-filename={}", out_svg.display()));
    finish_attempt("inkscape", cmd, out_svg, attempts)
}

fn try_uniconvertor(
    input: &Path,
    out_svg: &Path,
    attempts: &mut Vec<String>,
) -> Result<Option<ConvertOutcome>, ConvertError> {
    let bin = match find_in_path("uniconvertor").or_else(|| find_in_path("uniconv")) {
        Some(bin) => bin,
        None => {
            attempts.push("uniconvertor: not installed".to_string());
            return Ok(None);
        }
    };
    let name = bin
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_else(|| "uniconvertor".to_string());
    let mut cmd = Command::new(&bin);
    cmd.arg(input).arg(out_svg);
    finish_attempt(&name, cmd, out_svg, attempts)
}

fn try_ghostscript(
    input: &Path,
    scratch: &Path,
    out_svg: &Path,
    attempts: &mut Vec<String>,
) -> Result<Option<ConvertOutcome>, ConvertError> {
    let Some(gs) = find_in_path("gs") else {
        attempts.push("ghostscript+pdf2svg: gs not installed".to_string());
        return Ok(None);
    };
    let Some(pdf2svg) = find_in_path("pdf2svg") else {
        attempts.push("ghostscript+pdf2svg: pdf2svg not installed".to_string());
        return Ok(None);
    };

    // Stage 1: distill the PDF stream inside the AI file.
    let temp_pdf = scratch.join("converted.pdf");
    let mut gs_cmd = Command::new(gs);
    gs_cmd
        .arg("-dNOPAUSE")
        .arg("-dBATCH")
        .arg("-sDEVICE=pdfwrite")
        .arg(format!("-sOutputFile={}", temp_pdf.display()))
        .arg(input);
    match run_with_deadline(gs_cmd, CONVERT_TIMEOUT)? {
        RunResult::Exited(0) => {}
        RunResult::Exited(code) => {
            attempts.push(format!("ghostscript+pdf2svg: gs failed (exit {code})"));
            return Ok(None);
        }
        RunResult::TimedOut => {
            attempts.push("ghostscript+pdf2svg: gs timed out (60s)".to_string());
            return Ok(None);
        }
    }

    // Stage 2: PDF to SVG.
    let mut svg_cmd = Command::new(pdf2svg);
    svg_cmd.arg(&temp_pdf).arg(out_svg);
    finish_attempt("ghostscript+pdf2svg", svg_cmd, out_svg, attempts)
}

fn finish_attempt(
    name: &str,
    cmd: Command,
    out_svg: &Path,
    attempts: &mut Vec<String>,
) -> Result<Option<ConvertOutcome>, ConvertError> {
    match run_with_deadline(cmd, CONVERT_TIMEOUT)? {
        RunResult::Exited(0) => match read_valid_svg(out_svg) {
            Some(svg_text) => {
                attempts.push(format!("{name}: success"));
                Ok(Some(ConvertOutcome {
                    svg_text,
                    converter: name.to_string(),
                    attempts: attempts.clone(),
                }))
            }
            None => {
                attempts.push(format!("{name}: produced invalid/empty output"));
                Ok(None)
            }
        },
        RunResult::Exited(code) => {
            attempts.push(format!("{name}: failed (exit {code})"));
            Ok(None)
        }
        RunResult::TimedOut => {
            attempts.push(format!("{name}: timed out (60s)"));
            Ok(None)
        }
    }
}

enum RunResult {
    Exited(i32),
    TimedOut,
}

/// Polls the child until it exits or the deadline passes; a child that
/// outlives the deadline is killed and reaped.
fn run_with_deadline(mut cmd: Command, deadline: Duration) -> std::io::Result<RunResult> {
    let mut child = cmd
        .stdin(Stdio::null())
        .stdout(Stdio::null())
        .stderr(Stdio::null())
        .spawn()?;
    let started = Instant::now();
    loop {
        if let Some(status) = child.try_wait()? {
            return Ok(RunResult::Exited(status.code().unwrap_or(-1)));
        }
        if started.elapsed() >= deadline {
            let _ = child.kill();
            let _ = child.wait();
            return Ok(RunResult::TimedOut);
        }
        std::thread::sleep(Duration::from_millis(100));
    }
}

/// Non-empty and structurally SVG, checked on the first kilobyte.
fn read_valid_svg(path: &Path) -> Option<String> {
    let text = std::fs::read_to_string(path).ok()?;
    if text.is_empty() {
        return None;
    }
    let head: String = text.chars().take(1024).collect::<String>().to_lowercase();
    if !head.contains("<svg") {
        return None;
    }
    Some(text)
}

fn find_in_path(name: &str) -> Option<PathBuf> {
    let path_var = std::env::var_os("PATH")?;
    for dir in std::env::split_paths(&path_var) {
        let candidate = dir.join(name);
        if candidate.is_file() {
            return Some(candidate);
        }
    }
    None
}

/// Reads the AI creator version from the file header. AI files embed it in
/// XMP metadata (modern) or a PostScript %%Creator comment (older).
pub fn detect_ai_version(path: &Path) -> AiVersion {
    let header = match read_header(path, 16 * 1024) {
        Ok(h) => h,
        Err(_) => return unknown_version(),
    };
    let text: String = header.iter().map(|&b| b as char).collect();

    for marker in ["<xmp:CreatorTool>", "%%Creator:", "<stEvt:softwareAgent>"] {
        if let Some(raw) = version_after_marker(&text, marker) {
            let numeric = raw.parse::<f64>().ok();
            return AiVersion {
                display_name: format!("AI {raw}"),
                numeric_version: numeric,
                raw_version: Some(raw),
            };
        }
    }
    unknown_version()
}

fn unknown_version() -> AiVersion {
    AiVersion {
        numeric_version: None,
        display_name: "Unknown".to_string(),
        raw_version: None,
    }
}

fn version_after_marker(text: &str, marker: &str) -> Option<String> {
    let mut search_from = 0;
    while let Some(offset) = text[search_from..].find(marker) {
        let after = &text[search_from + offset + marker.len()..];
        if let Some(rest) = after.trim_start().strip_prefix("Adobe Illustrator") {
            if let Some(digits_start) = rest.find(|c: char| c.is_ascii_digit()) {
                let digits: String = rest[digits_start..]
                    .chars()
                    .take_while(|c| c.is_ascii_digit() || *c == '.')
                    .collect();
                if !digits.is_empty() {
                    return Some(digits);
                }
            }
        }
        search_from += offset + marker.len();
    }
    None
}

/// AI layer names live in the embedded PDF as Optional Content Groups:
/// `/Name(...)/Type/OCG` entries, in layer order.
pub fn extract_ocg_layer_names(path: &Path) -> Vec<String> {
    let bytes = match std::fs::read(path) {
        Ok(b) => b,
        Err(_) => return Vec::new(),
    };
    let mut names = Vec::new();
    let needle = b"/Name(";
    let mut i = 0;
    while i + needle.len() < bytes.len() {
        if &bytes[i..i + needle.len()] != needle {
            i += 1;
            continue;
        }
        let name_start = i + needle.len();
        let Some(close) = bytes[name_start..].iter().position(|&b| b == b')') else {
            break;
        };
        let name_end = name_start + close;
        if bytes[name_end + 1..].starts_with(b"/Type/OCG") {
            let name: String = bytes[name_start..name_end]
                .iter()
                .map(|&b| b as char)
                .collect();
            let name = name.trim().to_string();
            if !name.is_empty() {
                names.push(name);
            }
        }
        i = name_end + 1;
    }
    names
}

fn read_header(path: &Path, len: usize) -> std::io::Result<Vec<u8>> {
    use std::io::Read;
    let mut file = std::fs::File::open(path)?;
    let mut buf = vec![0u8; len];
    let n = file.read(&mut buf)?;
    buf.truncate(n);
    Ok(buf)
}
