use std::io::Write;

use signcheck_convert::{detect_ai_version, extract_ocg_layer_names};

fn write_temp(bytes: &[u8]) -> tempfile::NamedTempFile {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    file.write_all(bytes).unwrap();
    file.flush().unwrap();
    file
}

#[test]
fn reads_version_from_postscript_creator_comment() {
    let file = write_temp(b"%!PS-Adobe-3.0\n%%Creator: Adobe Illustrator 27.9\n%%Title: sign.ai\n");
    let version = detect_ai_version(file.path());
    assert_eq!("AI 27.9", version.display_name);
    assert_eq!(Some(27.9), version.numeric_version);
    assert_eq!(Some("27.9"), version.raw_version.as_deref());
}

#[test]
fn reads_version_from_xmp_creator_tool() {
    let file = write_temp(
        b"%PDF-1.6\n<xmp:CreatorTool>Adobe Illustrator 26.0 (Windows)</xmp:CreatorTool>\n",
    );
    let version = detect_ai_version(file.path());
    assert_eq!("AI 26.0", version.display_name);
    assert_eq!(Some(26.0), version.numeric_version);
}

#[test]
fn non_illustrator_creator_is_unknown() {
    let file = write_temp(b"%%Creator: CorelDRAW 2021\n");
    let version = detect_ai_version(file.path());
    assert_eq!("Unknown", version.display_name);
    assert!(version.raw_version.is_none());
}

#[test]
fn extracts_ocg_names_in_order() {
    let file = write_temp(
        b"%PDF-1.6\n1 0 obj<</Name(return)/Type/OCG>>endobj\n2 0 obj<</Name(trimcap)/Type/OCG>>endobj\n3 0 obj<</Name(ignored)/Type/Page>>endobj\n",
    );
    let names = extract_ocg_layer_names(file.path());
    assert_eq!(vec!["return".to_string(), "trimcap".to_string()], names);
}

#[test]
fn no_ocg_entries_gives_empty_list() {
    let file = write_temp(b"%PDF-1.6\nno optional content here\n");
    assert!(extract_ocg_layer_names(file.path()).is_empty());
}
