//! WordprocessingML document writer.
//!
//! Produces a minimal `.docx` package: a flat list of styled paragraphs over
//! three built-in styles.

use crate::error::Result;
use crate::package::{xml_escape, Package};

/// Paragraph style, mapped to a named style in `styles.xml`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ParagraphStyle {
    Heading1,
    Heading2,
    #[default]
    Normal,
}

impl ParagraphStyle {
    fn style_id(self) -> Option<&'static str> {
        match self {
            ParagraphStyle::Heading1 => Some("Heading1"),
            ParagraphStyle::Heading2 => Some("Heading2"),
            ParagraphStyle::Normal => None,
        }
    }
}

/// One paragraph of text.
#[derive(Debug, Clone)]
pub struct Paragraph {
    text: String,
    style: ParagraphStyle,
}

impl Paragraph {
    pub fn heading1(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: ParagraphStyle::Heading1,
        }
    }

    pub fn heading2(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: ParagraphStyle::Heading2,
        }
    }

    pub fn normal(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            style: ParagraphStyle::Normal,
        }
    }
}

/// A document: paragraphs in order.
#[derive(Debug, Default)]
pub struct Document {
    paragraphs: Vec<Paragraph>,
}

impl Document {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, paragraph: Paragraph) {
        self.paragraphs.push(paragraph);
    }

    pub fn paragraph_count(&self) -> usize {
        self.paragraphs.len()
    }

    /// Serialize the document into `.docx` bytes.
    pub fn write_to_bytes(&self) -> Result<Vec<u8>> {
        let mut pkg = Package::new();
        pkg.add_part("[Content_Types].xml", CONTENT_TYPES.as_bytes())?;
        pkg.add_part("_rels/.rels", ROOT_RELS.as_bytes())?;
        pkg.add_part("word/document.xml", self.document_xml().as_bytes())?;
        pkg.add_part("word/_rels/document.xml.rels", DOCUMENT_RELS.as_bytes())?;
        pkg.add_part("word/styles.xml", STYLES.as_bytes())?;
        pkg.finish()
    }

    fn document_xml(&self) -> String {
        let mut xml = String::from(
            "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
             <w:document xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\"><w:body>",
        );
        for paragraph in &self.paragraphs {
            xml.push_str("<w:p>");
            if let Some(style_id) = paragraph.style.style_id() {
                xml.push_str(&format!(
                    "<w:pPr><w:pStyle w:val=\"{style_id}\"/></w:pPr>"
                ));
            }
            xml.push_str(&format!(
                "<w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>",
                xml_escape(&paragraph.text)
            ));
        }
        xml.push_str("<w:sectPr/></w:body></w:document>");
        xml
    }
}

const CONTENT_TYPES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Types xmlns=\"http://schemas.openxmlformats.org/package/2006/content-types\">\
<Default Extension=\"rels\" ContentType=\"application/vnd.openxmlformats-package.relationships+xml\"/>\
<Default Extension=\"xml\" ContentType=\"application/xml\"/>\
<Override PartName=\"/word/document.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml\"/>\
<Override PartName=\"/word/styles.xml\" ContentType=\"application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml\"/>\
</Types>";

const ROOT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument\" Target=\"word/document.xml\"/>\
</Relationships>";

const DOCUMENT_RELS: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<Relationships xmlns=\"http://schemas.openxmlformats.org/package/2006/relationships\">\
<Relationship Id=\"rId1\" Type=\"http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles\" Target=\"styles.xml\"/>\
</Relationships>";

const STYLES: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\" standalone=\"yes\"?>\
<w:styles xmlns:w=\"http://schemas.openxmlformats.org/wordprocessingml/2006/main\">\
<w:style w:type=\"paragraph\" w:default=\"1\" w:styleId=\"Normal\"><w:name w:val=\"Normal\"/></w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Heading1\"><w:name w:val=\"heading 1\"/>\
<w:basedOn w:val=\"Normal\"/><w:rPr><w:b/><w:sz w:val=\"32\"/></w:rPr></w:style>\
<w:style w:type=\"paragraph\" w:styleId=\"Heading2\"><w:name w:val=\"heading 2\"/>\
<w:basedOn w:val=\"Normal\"/><w:rPr><w:b/><w:sz w:val=\"26\"/></w:rPr></w:style>\
</w:styles>";

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::{Cursor, Read};

    fn read_part(bytes: &[u8], name: &str) -> String {
        let mut archive = zip::ZipArchive::new(Cursor::new(bytes.to_vec())).unwrap();
        let mut part = archive.by_name(name).unwrap();
        let mut content = String::new();
        part.read_to_string(&mut content).unwrap();
        content
    }

    #[test]
    fn paragraphs_carry_their_styles() {
        let mut doc = Document::new();
        doc.push(Paragraph::heading1("Report"));
        doc.push(Paragraph::heading2("Question 1"));
        doc.push(Paragraph::normal("66.67% answered yes."));
        let bytes = doc.write_to_bytes().unwrap();

        let xml = read_part(&bytes, "word/document.xml");
        assert!(xml.contains("<w:pStyle w:val=\"Heading1\"/>"));
        assert!(xml.contains("<w:pStyle w:val=\"Heading2\"/>"));
        assert!(xml.contains("66.67% answered yes."));
        // Normal paragraphs carry no explicit style.
        assert_eq!(xml.matches("<w:pStyle").count(), 2);
    }

    #[test]
    fn text_is_escaped() {
        let mut doc = Document::new();
        doc.push(Paragraph::normal("5 < 6 & \"quoted\""));
        let bytes = doc.write_to_bytes().unwrap();
        let xml = read_part(&bytes, "word/document.xml");
        assert!(xml.contains("5 &lt; 6 &amp; &quot;quoted&quot;"));
    }
}
