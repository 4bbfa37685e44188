//! Terminal presentation helpers for the interactive prompt.

use std::io::Read;
use std::path::Path;

use owo_colors::OwoColorize;

use crate::models::{Record, ResultPage};

/// Print a result page as a numbered listing.
pub fn print_page(page: &ResultPage) {
    println!(
        "{}",
        format!("---------------------------------------------(page {})--", page.page_index)
            .magenta()
    );
    for (i, record) in page.records.iter().enumerate() {
        let source = if record.fields.source_name.is_empty() {
            "N/A"
        } else {
            record.fields.source_name.as_str()
        };
        println!(
            "{}: {} ({})",
            format!("{:02}", i + 1).cyan(),
            record.fields.title,
            source.yellow()
        );
    }
    println!();
}

/// Print the detail view of one record.
pub fn print_record(page_index: u32, id: usize, record: &Record) {
    let fields = &record.fields;
    println!();
    println!("*      page: {}", page_index);
    println!("*        id: {}", id);
    println!("*     title: {}", fields.title);
    println!("* published: {}", fields.published);
    println!("*   authors: {}", fields.authors.join(" ").green());
    println!(
        "*    source: {}",
        format!("{} ({})", fields.source_name, fields.source_alias).green()
    );
    println!(
        "*  classify: {}.{}",
        fields.classify_name, fields.classify_code
    );
    println!("* citations: {}", fields.citation_count.to_string().red());
    println!("* downloads: {}", fields.download_count);
    println!("*  abstract:");
    for line in wrap_text(&fields.description, 80) {
        println!("*   {}", line);
    }
    println!();
}

/// Wrap text at roughly `width` characters per line.
fn wrap_text(text: &str, width: usize) -> Vec<String> {
    let chars: Vec<char> = text.chars().collect();
    chars
        .chunks(width)
        .map(|chunk| chunk.iter().collect())
        .collect()
}

/// Replace characters that are illegal in filenames with an underscore.
pub fn make_safe_filename(name: &str) -> String {
    name.chars()
        .map(|c| {
            if matches!(c, '/' | '\\' | ':' | '*' | '?' | '"' | '>' | '<' | '|') {
                '_'
            } else {
                c
            }
        })
        .collect()
}

/// Whether the file at `path` starts with the PDF magic bytes.
pub fn is_pdf_document(path: &Path) -> bool {
    let Ok(mut file) = std::fs::File::open(path) else {
        return false;
    };
    let mut magic = [0u8; 4];
    match file.read_exact(&mut magic) {
        Ok(()) => &magic == b"%PDF",
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_make_safe_filename() {
        assert_eq!(
            make_safe_filename("a/b\\c:d*e?f\"g>h<i|j"),
            "a_b_c_d_e_f_g_h_i_j"
        );
        assert_eq!(make_safe_filename("plain name"), "plain name");
    }

    #[test]
    fn test_is_pdf_document() {
        let dir = tempfile::tempdir().unwrap();

        let pdf = dir.path().join("doc.bin");
        std::fs::write(&pdf, b"%PDF-1.4 rest").unwrap();
        assert!(is_pdf_document(&pdf));

        let other = dir.path().join("other.bin");
        std::fs::write(&other, b"CAJX rest").unwrap();
        assert!(!is_pdf_document(&other));

        assert!(!is_pdf_document(&dir.path().join("missing.bin")));
    }

    #[test]
    fn test_wrap_text() {
        let lines = wrap_text("abcdefghij", 4);
        assert_eq!(lines, vec!["abcd", "efgh", "ij"]);
        assert!(wrap_text("", 4).is_empty());
    }
}
