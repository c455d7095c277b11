//! Word document export of a report, and read-back for verification.
//!
//! The package is the smallest set of parts Word and LibreOffice open:
//! content types, package relationships, the main document and a style sheet.
//! Entries are written in a fixed order with a fixed timestamp, so the same
//! blocks always produce the same bytes.

use std::io::{Cursor, Read, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};
use time::Date;
use zip::write::{FileOptions, ZipWriter};
use zip::{CompressionMethod, ZipArchive};

use crate::error::{ValidatorError, ValidatorResult};
use crate::report::Block;

const DOCUMENT_PART: &str = "word/document.xml";

const CONTENT_TYPES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Types xmlns="http://schemas.openxmlformats.org/package/2006/content-types"><Default Extension="rels" ContentType="application/vnd.openxmlformats-package.relationships+xml"/><Default Extension="xml" ContentType="application/xml"/><Override PartName="/word/document.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml"/><Override PartName="/word/styles.xml" ContentType="application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml"/></Types>"#;

const PACKAGE_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument" Target="word/document.xml"/></Relationships>"#;

const DOCUMENT_RELS: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<Relationships xmlns="http://schemas.openxmlformats.org/package/2006/relationships"><Relationship Id="rId1" Type="http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles" Target="styles.xml"/></Relationships>"#;

const STYLES: &str = r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:styles xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:style w:type="paragraph" w:default="1" w:styleId="Normal"><w:name w:val="Normal"/><w:pPr><w:spacing w:after="120"/></w:pPr><w:rPr><w:sz w:val="22"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Title"><w:name w:val="Title"/><w:basedOn w:val="Normal"/><w:pPr><w:spacing w:after="240"/></w:pPr><w:rPr><w:b/><w:sz w:val="48"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading1"><w:name w:val="heading 1"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="360" w:after="120"/><w:outlineLvl w:val="0"/></w:pPr><w:rPr><w:b/><w:sz w:val="32"/></w:rPr></w:style><w:style w:type="paragraph" w:styleId="Heading2"><w:name w:val="heading 2"/><w:basedOn w:val="Normal"/><w:pPr><w:keepNext/><w:spacing w:before="200" w:after="80"/><w:outlineLvl w:val="1"/></w:pPr><w:rPr><w:b/><w:sz w:val="26"/></w:rPr></w:style></w:styles>"#;

/// `아이디어_검증_분석보고서_20261016.docx`
pub fn file_name(date: Date) -> String {
    format!(
        "아이디어_검증_분석보고서_{:04}{:02}{:02}.docx",
        date.year(),
        u8::from(date.month()),
        date.day()
    )
}

/// Builds the `.docx` package bytes.
pub fn to_docx(blocks: &[Block]) -> ValidatorResult<Vec<u8>> {
    let mut zw = ZipWriter::new(Cursor::new(Vec::new()));

    let fixed_time = zip::DateTime::from_date_and_time(1980, 1, 1, 0, 0, 0)
        .map_err(|_| ValidatorError::Export("failed to create fixed zip datetime".to_string()))?;
    let opts = FileOptions::<()>::default()
        .compression_method(CompressionMethod::Deflated)
        .last_modified_time(fixed_time)
        .unix_permissions(0o644);

    let document = document_xml(blocks);
    let parts: [(&str, &str); 5] = [
        ("[Content_Types].xml", CONTENT_TYPES),
        ("_rels/.rels", PACKAGE_RELS),
        ("word/_rels/document.xml.rels", DOCUMENT_RELS),
        (DOCUMENT_PART, &document),
        ("word/styles.xml", STYLES),
    ];
    for (name, body) in parts {
        zw.start_file(name, opts)
            .map_err(|e| ValidatorError::Export(e.to_string()))?;
        zw.write_all(body.as_bytes())?;
    }

    let cursor = zw
        .finish()
        .map_err(|e| ValidatorError::Export(e.to_string()))?;
    Ok(cursor.into_inner())
}

/// Writes the package to `path`.
pub fn save(blocks: &[Block], path: &Path) -> ValidatorResult<()> {
    let bytes = to_docx(blocks)?;
    std::fs::write(path, bytes)?;
    Ok(())
}

fn document_xml(blocks: &[Block]) -> String {
    let mut xml = String::from(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>"#,
    );
    for block in blocks {
        let (ppr, rpr) = match block {
            Block::Title(_) => (r#"<w:pStyle w:val="Title"/><w:jc w:val="center"/>"#, ""),
            Block::Dateline(_) => (r#"<w:jc w:val="right"/>"#, r#"<w:sz w:val="20"/>"#),
            Block::Heading1(_) => (r#"<w:pStyle w:val="Heading1"/>"#, ""),
            Block::Heading2(_) => (r#"<w:pStyle w:val="Heading2"/>"#, ""),
            Block::Body(_) => ("", ""),
            Block::Strong(_) => ("", r#"<w:b/><w:sz w:val="24"/>"#),
            Block::Footer(_) => (r#"<w:jc w:val="center"/>"#, r#"<w:i/><w:sz w:val="18"/>"#),
        };
        xml.push_str("<w:p>");
        if !ppr.is_empty() {
            xml.push_str("<w:pPr>");
            xml.push_str(ppr);
            xml.push_str("</w:pPr>");
        }
        xml.push_str("<w:r>");
        if !rpr.is_empty() {
            xml.push_str("<w:rPr>");
            xml.push_str(rpr);
            xml.push_str("</w:rPr>");
        }
        for (i, line) in block.text().split('\n').enumerate() {
            if i > 0 {
                xml.push_str("<w:br/>");
            }
            xml.push_str(r#"<w:t xml:space="preserve">"#);
            escape_into(&mut xml, line);
            xml.push_str("</w:t>");
        }
        xml.push_str("</w:r></w:p>");
    }
    xml.push_str("<w:sectPr/></w:body></w:document>");
    xml
}

fn escape_into(out: &mut String, text: &str) {
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            // Not representable in XML 1.0.
            c if (c as u32) < 0x20 && !matches!(c, '\t' | '\r') => {}
            c => out.push(c),
        }
    }
}

/// Paragraph texts of a `.docx` package, in document order.
pub fn read_paragraphs(bytes: &[u8]) -> ValidatorResult<Vec<String>> {
    let mut archive =
        ZipArchive::new(Cursor::new(bytes)).map_err(|e| ValidatorError::Export(e.to_string()))?;
    let mut xml = String::new();
    archive
        .by_name(DOCUMENT_PART)
        .map_err(|e| ValidatorError::Export(format!("{DOCUMENT_PART}: {e}")))?
        .read_to_string(&mut xml)?;
    parse_paragraphs(&xml)
}

fn parse_paragraphs(xml: &str) -> ValidatorResult<Vec<String>> {
    let mut paragraphs = Vec::new();
    let mut current: Option<String> = None;
    let mut rest = xml;

    while let Some(lt) = rest.find('<') {
        let after = &rest[lt + 1..];
        let gt = after
            .find('>')
            .ok_or_else(|| ValidatorError::Export("unterminated tag in document".to_string()))?;
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let self_closing = tag.ends_with('/');
        let name = tag
            .trim_end_matches('/')
            .split(|c: char| c.is_whitespace())
            .next()
            .unwrap_or_default();

        match name {
            "w:p" if self_closing => paragraphs.push(String::new()),
            "w:p" => current = Some(String::new()),
            "/w:p" => {
                if let Some(p) = current.take() {
                    paragraphs.push(p);
                }
            }
            "w:br" => {
                if let Some(p) = current.as_mut() {
                    p.push('\n');
                }
            }
            "w:tab" => {
                if let Some(p) = current.as_mut() {
                    p.push('\t');
                }
            }
            "w:t" if !self_closing => {
                let end = rest.find("</w:t>").ok_or_else(|| {
                    ValidatorError::Export("unterminated text run in document".to_string())
                })?;
                if let Some(p) = current.as_mut() {
                    unescape_into(p, &rest[..end]);
                }
                rest = &rest[end + "</w:t>".len()..];
            }
            _ => {}
        }
    }
    Ok(paragraphs)
}

fn unescape_into(out: &mut String, text: &str) {
    let mut rest = text;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp..];
        let Some(semi) = after.find(';') else {
            out.push_str(after);
            return;
        };
        let entity = &after[1..semi];
        let decoded = match entity {
            "amp" => Some('&'),
            "lt" => Some('<'),
            "gt" => Some('>'),
            "quot" => Some('"'),
            "apos" => Some('\''),
            e if e.starts_with("#x") => u32::from_str_radix(&e[2..], 16).ok().and_then(char::from_u32),
            e if e.starts_with('#') => e[1..].parse::<u32>().ok().and_then(char::from_u32),
            _ => None,
        };
        match decoded {
            Some(c) => out.push(c),
            None => out.push_str(&after[..=semi]),
        }
        rest = &after[semi + 1..];
    }
    out.push_str(rest);
}

/// One paragraph that did not survive the round trip.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExportMismatch {
    pub index: usize,
    pub expected: Option<String>,
    pub found: Option<String>,
}

/// Compares the document paragraphs with the blocks it was built from.
pub fn diff(bytes: &[u8], expected: &[Block]) -> ValidatorResult<Vec<ExportMismatch>> {
    let found = read_paragraphs(bytes)?;
    let len = found.len().max(expected.len());
    let mismatches = (0..len)
        .filter_map(|i| {
            let e = expected.get(i).map(|b| b.text().to_string());
            let f = found.get(i).cloned();
            (e != f).then_some(ExportMismatch {
                index: i,
                expected: e,
                found: f,
            })
        })
        .collect();
    Ok(mismatches)
}

/// Fails with the first mismatch, if any.
pub fn verify(bytes: &[u8], expected: &[Block]) -> ValidatorResult<()> {
    let mismatches = diff(bytes, expected)?;
    match mismatches.first() {
        None => Ok(()),
        Some(m) => Err(ValidatorError::Export(format!(
            "paragraph {} differs ({} mismatches): expected {:?}, found {:?}",
            m.index,
            mismatches.len(),
            m.expected,
            m.found
        ))),
    }
}
