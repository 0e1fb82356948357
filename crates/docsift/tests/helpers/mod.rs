//! Shared builders for integration tests.
//!
//! Documents are generated in memory so the suite carries no binary fixtures.

#![allow(dead_code)]

use docsift::ocr::{OcrEngine, OcrError};
use image::DynamicImage;
use lopdf::content::{Content, Operation};
use lopdf::{Dictionary, Object, ObjectId, Stream, dictionary};
use std::io::{Cursor, Write};

/// Returns true (and logs) when pdfium cannot be loaded.
pub fn skip_without_pdfium(test: &str) -> bool {
    if docsift::pdf::pdfium_available() {
        return false;
    }
    eprintln!("Skipping {}: pdfium library not available", test);
    true
}

/// What to put on one generated page.
pub enum PageSpec<'a> {
    Text(&'a str),
    GrayImages(usize),
    Blank,
}

/// Build a PDF with one page per spec.
pub fn build_pdf(pages: &[PageSpec<'_>]) -> Vec<u8> {
    let mut doc = lopdf::Document::with_version("1.5");
    let pages_id = doc.new_object_id();
    let font_id = doc.add_object(dictionary! {
        "Type" => "Font",
        "Subtype" => "Type1",
        "BaseFont" => "Helvetica",
    });

    let mut kids = Vec::new();
    for spec in pages {
        let page_id = add_page(&mut doc, pages_id, font_id, spec);
        kids.push(Object::Reference(page_id));
    }

    let count = kids.len() as i64;
    doc.objects.insert(
        pages_id,
        Object::Dictionary(dictionary! { "Type" => "Pages", "Kids" => kids, "Count" => count }),
    );
    let catalog = doc.add_object(dictionary! { "Type" => "Catalog", "Pages" => pages_id });
    doc.trailer.set("Root", catalog);

    let mut out = Vec::new();
    doc.save_to(&mut out).expect("serialize test PDF");
    out
}

/// Text PDF, one line of text per page.
pub fn text_pdf(pages: &[&str]) -> Vec<u8> {
    let specs: Vec<PageSpec<'_>> = pages.iter().map(|text| PageSpec::Text(text)).collect();
    build_pdf(&specs)
}

fn add_page(doc: &mut lopdf::Document, parent: ObjectId, font_id: ObjectId, spec: &PageSpec<'_>) -> ObjectId {
    let mut resources = Dictionary::new();
    let mut operations = Vec::new();

    match spec {
        PageSpec::Text(text) => {
            resources.set("Font", dictionary! { "F1" => font_id });
            operations.extend([
                Operation::new("BT", vec![]),
                Operation::new("Tf", vec!["F1".into(), 12.into()]),
                Operation::new("Td", vec![72.into(), 700.into()]),
                Operation::new("Tj", vec![Object::string_literal(*text)]),
                Operation::new("ET", vec![]),
            ]);
        }
        PageSpec::GrayImages(count) => {
            let mut xobjects = Dictionary::new();
            for i in 0..*count {
                let image = doc.add_object(Stream::new(
                    dictionary! {
                        "Type" => "XObject",
                        "Subtype" => "Image",
                        "Width" => 2,
                        "Height" => 2,
                        "ColorSpace" => "DeviceGray",
                        "BitsPerComponent" => 8,
                    },
                    vec![0u8, 255, 255, 0],
                ));
                let name = format!("Im{}", i);
                xobjects.set(name.as_bytes().to_vec(), image);
                operations.extend([
                    Operation::new("q", vec![]),
                    Operation::new("cm", vec![50.into(), 0.into(), 0.into(), 50.into(), 72.into(), 600.into()]),
                    Operation::new("Do", vec![Object::Name(name.into_bytes())]),
                    Operation::new("Q", vec![]),
                ]);
            }
            resources.set("XObject", xobjects);
        }
        PageSpec::Blank => {}
    }

    let content = Content { operations };
    let content_id = doc.add_object(Stream::new(
        Dictionary::new(),
        content.encode().expect("encode page content"),
    ));

    doc.add_object(dictionary! {
        "Type" => "Page",
        "Parent" => parent,
        "MediaBox" => vec![0.into(), 0.into(), 612.into(), 792.into()],
        "Resources" => resources,
        "Contents" => content_id,
    })
}

/// DOCX with one body paragraph per entry.
pub fn docx(paragraphs: &[&str]) -> Vec<u8> {
    let body: String = paragraphs
        .iter()
        .map(|text| format!("<w:p><w:r><w:t xml:space=\"preserve\">{}</w:t></w:r></w:p>", text))
        .collect();
    let xml = format!(
        r#"<?xml version="1.0" encoding="UTF-8" standalone="yes"?>
<w:document xmlns:w="http://schemas.openxmlformats.org/wordprocessingml/2006/main"><w:body>{}</w:body></w:document>"#,
        body
    );

    let mut writer = zip::ZipWriter::new(Cursor::new(Vec::new()));
    writer
        .start_file("word/document.xml", zip::write::SimpleFileOptions::default())
        .expect("start docx entry");
    writer.write_all(xml.as_bytes()).expect("write docx entry");
    writer.finish().expect("finish docx").into_inner()
}

/// OCR engine that always answers with the same text.
pub struct FixedOcr(pub &'static str);

impl OcrEngine for FixedOcr {
    fn name(&self) -> &str {
        "fixed"
    }

    fn recognize(&self, _image: &DynamicImage) -> Result<String, OcrError> {
        Ok(self.0.to_string())
    }
}
