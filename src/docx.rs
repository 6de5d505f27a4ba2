//! WordprocessingML package writer.
//!
//! Produces the few OOXML parts a word processor needs to open a document
//! with a title, headings, plain and labelled paragraphs and inline PNG
//! pictures. All markup is emitted as [`quick_xml`] events, so text and
//! attribute values are escaped by the writer.

use crate::error::ReportError;
use chrono::{DateTime, Utc};
use quick_xml::events::{BytesDecl, BytesText, Event};
use quick_xml::Writer;
use std::io::{Cursor, Write};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipWriter};

type XmlWriter = Writer<Vec<u8>>;
type XmlResult = quick_xml::Result<()>;

const NS_W: &str = "http://schemas.openxmlformats.org/wordprocessingml/2006/main";
const NS_R: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships";
const NS_WP: &str = "http://schemas.openxmlformats.org/drawingml/2006/wordprocessingDrawing";
const NS_A: &str = "http://schemas.openxmlformats.org/drawingml/2006/main";
const NS_PIC: &str = "http://schemas.openxmlformats.org/drawingml/2006/picture";
const NS_CONTENT_TYPES: &str = "http://schemas.openxmlformats.org/package/2006/content-types";
const NS_PACKAGE_RELS: &str = "http://schemas.openxmlformats.org/package/2006/relationships";
const NS_CORE: &str = "http://schemas.openxmlformats.org/package/2006/metadata/core-properties";
const NS_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/extended-properties";

const REL_OFFICE_DOCUMENT: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/officeDocument";
const REL_CORE: &str =
    "http://schemas.openxmlformats.org/package/2006/relationships/metadata/core-properties";
const REL_EXTENDED: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/extended-properties";
const REL_STYLES: &str =
    "http://schemas.openxmlformats.org/officeDocument/2006/relationships/styles";
const REL_IMAGE: &str = "http://schemas.openxmlformats.org/officeDocument/2006/relationships/image";

const CT_RELS: &str = "application/vnd.openxmlformats-package.relationships+xml";
const PART_OVERRIDES: [(&str, &str); 4] = [
    (
        "/word/document.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.document.main+xml",
    ),
    (
        "/word/styles.xml",
        "application/vnd.openxmlformats-officedocument.wordprocessingml.styles+xml",
    ),
    (
        "/docProps/core.xml",
        "application/vnd.openxmlformats-package.core-properties+xml",
    ),
    (
        "/docProps/app.xml",
        "application/vnd.openxmlformats-officedocument.extended-properties+xml",
    ),
];

const APPLICATION: &str = "pflegeheim_report";

/// Paragraph style definition; sizes are in half points, spacing in twips.
struct ParagraphStyle {
    id: &'static str,
    name: &'static str,
    size: &'static str,
    color: &'static str,
    before: &'static str,
    after: &'static str,
    outline_level: Option<&'static str>,
}

const PARAGRAPH_STYLES: [ParagraphStyle; 2] = [
    ParagraphStyle {
        id: "Title",
        name: "Title",
        size: "52",
        color: "17365D",
        before: "0",
        after: "240",
        outline_level: None,
    },
    ParagraphStyle {
        id: "Heading1",
        name: "heading 1",
        size: "32",
        color: "1F4E79",
        before: "360",
        after: "120",
        outline_level: Some("0"),
    },
];

#[derive(Debug, Clone, PartialEq)]
enum Block {
    Styled { style_id: &'static str, text: String },
    Plain(String),
    Labelled { label: String, value: String },
    Picture { media: usize },
}

/// A document under construction. Blocks are written in insertion order.
#[derive(Debug, Clone)]
pub struct WordDocument {
    title: String,
    picture_extent: (u64, u64),
    blocks: Vec<Block>,
    media: Vec<Vec<u8>>,
}

impl WordDocument {
    /// `title` goes into the document properties; `picture_extent` is the
    /// display size of every picture in EMU.
    pub fn new(title: &str, picture_extent: (u64, u64)) -> Self {
        Self {
            title: title.to_string(),
            picture_extent,
            blocks: Vec::new(),
            media: Vec::new(),
        }
    }

    pub fn add_title(&mut self, text: &str) -> &mut Self {
        self.blocks.push(Block::Styled {
            style_id: "Title",
            text: text.to_string(),
        });
        self
    }

    pub fn add_heading(&mut self, text: &str) -> &mut Self {
        self.blocks.push(Block::Styled {
            style_id: "Heading1",
            text: text.to_string(),
        });
        self
    }

    pub fn add_paragraph(&mut self, text: &str) -> &mut Self {
        self.blocks.push(Block::Plain(text.to_string()));
        self
    }

    /// Bold `label:` followed by a plain value.
    pub fn add_labelled(&mut self, label: &str, value: &str) -> &mut Self {
        self.blocks.push(Block::Labelled {
            label: label.to_string(),
            value: value.to_string(),
        });
        self
    }

    /// Centred inline picture from PNG bytes.
    pub fn add_picture(&mut self, png: Vec<u8>) -> &mut Self {
        self.blocks.push(Block::Picture {
            media: self.media.len(),
        });
        self.media.push(png);
        self
    }

    pub fn picture_count(&self) -> usize {
        self.media.len()
    }

    /// Zip all parts into a `.docx` byte stream. `created` is the only
    /// time-dependent input, so equal documents packed with the same
    /// timestamp give identical bytes.
    pub fn pack(&self, created: DateTime<Utc>) -> Result<Vec<u8>, ReportError> {
        let parts = [
            ("[Content_Types].xml", content_types_xml()?),
            ("_rels/.rels", package_rels_xml()?),
            ("docProps/core.xml", self.core_xml(created)?),
            ("docProps/app.xml", app_xml()?),
            ("word/document.xml", self.document_xml()?),
            ("word/styles.xml", styles_xml()?),
            ("word/_rels/document.xml.rels", self.document_rels_xml()?),
        ];

        let mut zip = ZipWriter::new(Cursor::new(Vec::new()));
        let deflated = SimpleFileOptions::default()
            .compression_method(CompressionMethod::Deflated)
            .last_modified_time(zip::DateTime::default());
        // PNG data is already compressed.
        let stored = deflated.compression_method(CompressionMethod::Stored);

        for (name, xml) in &parts {
            zip.start_file(*name, deflated)?;
            zip.write_all(xml)?;
        }
        for (i, png) in self.media.iter().enumerate() {
            zip.start_file(media_path(i), stored)?;
            zip.write_all(png)?;
        }
        Ok(zip.finish()?.into_inner())
    }

    fn document_xml(&self) -> quick_xml::Result<Vec<u8>> {
        let namespaces = [
            ("xmlns:w", NS_W),
            ("xmlns:r", NS_R),
            ("xmlns:wp", NS_WP),
            ("xmlns:a", NS_A),
            ("xmlns:pic", NS_PIC),
        ];
        part(|w| {
            element(w, "w:document", &namespaces, |w| {
                element(w, "w:body", &[], |w| {
                    for block in &self.blocks {
                        self.write_block(w, block)?;
                    }
                    section_properties(w)
                })
            })
        })
    }

    fn write_block(&self, w: &mut XmlWriter, block: &Block) -> XmlResult {
        match block {
            Block::Styled { style_id, text } => element(w, "w:p", &[], |w| {
                element(w, "w:pPr", &[], |w| empty(w, "w:pStyle", &[("w:val", *style_id)]))?;
                run(w, text, false)
            }),
            Block::Plain(text) => element(w, "w:p", &[], |w| run(w, text, false)),
            Block::Labelled { label, value } => element(w, "w:p", &[], |w| {
                run(w, &format!("{}: ", label), true)?;
                run(w, value, false)
            }),
            Block::Picture { media } => self.write_picture(w, *media),
        }
    }

    fn write_picture(&self, w: &mut XmlWriter, media: usize) -> XmlResult {
        let cx = self.picture_extent.0.to_string();
        let cy = self.picture_extent.1.to_string();
        let id = (media + 1).to_string();
        let name = format!("Diagramm {}", media + 1);
        let file = format!("chart{}.png", media + 1);
        let rel = image_rel_id(media);
        let extent = [("cx", cx.as_str()), ("cy", cy.as_str())];

        element(w, "w:p", &[], |w| {
            element(w, "w:pPr", &[], |w| empty(w, "w:jc", &[("w:val", "center")]))?;
            element(w, "w:r", &[], |w| {
                element(w, "w:drawing", &[], |w| {
                    let margins = [("distT", "0"), ("distB", "0"), ("distL", "0"), ("distR", "0")];
                    element(w, "wp:inline", &margins, |w| {
                        empty(w, "wp:extent", &extent)?;
                        empty(w, "wp:docPr", &[("id", id.as_str()), ("name", name.as_str())])?;
                        element(w, "wp:cNvGraphicFramePr", &[], |w| {
                            empty(w, "a:graphicFrameLocks", &[("noChangeAspect", "1")])
                        })?;
                        element(w, "a:graphic", &[], |w| {
                            element(w, "a:graphicData", &[("uri", NS_PIC)], |w| {
                                element(w, "pic:pic", &[], |w| {
                                    element(w, "pic:nvPicPr", &[], |w| {
                                        empty(
                                            w,
                                            "pic:cNvPr",
                                            &[("id", id.as_str()), ("name", file.as_str())],
                                        )?;
                                        empty(w, "pic:cNvPicPr", &[])
                                    })?;
                                    element(w, "pic:blipFill", &[], |w| {
                                        empty(w, "a:blip", &[("r:embed", rel.as_str())])?;
                                        element(w, "a:stretch", &[], |w| empty(w, "a:fillRect", &[]))
                                    })?;
                                    element(w, "pic:spPr", &[], |w| {
                                        element(w, "a:xfrm", &[], |w| {
                                            empty(w, "a:off", &[("x", "0"), ("y", "0")])?;
                                            empty(w, "a:ext", &extent)
                                        })?;
                                        element(w, "a:prstGeom", &[("prst", "rect")], |w| {
                                            empty(w, "a:avLst", &[])
                                        })
                                    })
                                })
                            })
                        })
                    })
                })
            })
        })
    }

    fn document_rels_xml(&self) -> quick_xml::Result<Vec<u8>> {
        let images: Vec<(String, String)> = (0..self.media.len())
            .map(|i| (image_rel_id(i), format!("media/chart{}.png", i + 1)))
            .collect();
        let mut rels = vec![("rId1", REL_STYLES, "styles.xml")];
        rels.extend(
            images
                .iter()
                .map(|(id, target)| (id.as_str(), REL_IMAGE, target.as_str())),
        );
        relationships_xml(&rels)
    }

    fn core_xml(&self, created: DateTime<Utc>) -> quick_xml::Result<Vec<u8>> {
        let namespaces = [
            ("xmlns:cp", NS_CORE),
            ("xmlns:dc", "http://purl.org/dc/elements/1.1/"),
            ("xmlns:dcterms", "http://purl.org/dc/terms/"),
            ("xmlns:xsi", "http://www.w3.org/2001/XMLSchema-instance"),
        ];
        let created = created.format("%Y-%m-%dT%H:%M:%SZ").to_string();
        part(|w| {
            element(w, "cp:coreProperties", &namespaces, |w| {
                text_element(w, "dc:title", &[], &self.title)?;
                text_element(w, "dc:creator", &[], APPLICATION)?;
                text_element(
                    w,
                    "dcterms:created",
                    &[("xsi:type", "dcterms:W3CDTF")],
                    &created,
                )
            })
        })
    }
}

/// `rId1` belongs to the styles part; pictures follow from `rId2`.
fn image_rel_id(media: usize) -> String {
    format!("rId{}", media + 2)
}

fn media_path(media: usize) -> String {
    format!("word/media/chart{}.png", media + 1)
}

/// One XML part: declaration, then whatever `build` writes.
fn part<F>(build: F) -> quick_xml::Result<Vec<u8>>
where
    F: FnOnce(&mut XmlWriter) -> XmlResult,
{
    let mut w = Writer::new(Vec::new());
    w.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), Some("yes"))))?;
    build(&mut w)?;
    Ok(w.into_inner())
}

fn element<F>(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], inner: F) -> XmlResult
where
    F: FnOnce(&mut XmlWriter) -> XmlResult,
{
    w.create_element(name)
        .with_attributes(attrs.iter().copied())
        .write_inner_content(inner)?;
    Ok(())
}

fn empty(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)]) -> XmlResult {
    w.create_element(name)
        .with_attributes(attrs.iter().copied())
        .write_empty()?;
    Ok(())
}

fn text_element(w: &mut XmlWriter, name: &str, attrs: &[(&str, &str)], text: &str) -> XmlResult {
    w.create_element(name)
        .with_attributes(attrs.iter().copied())
        .write_text_content(BytesText::new(text))?;
    Ok(())
}

fn run(w: &mut XmlWriter, text: &str, bold: bool) -> XmlResult {
    element(w, "w:r", &[], |w| {
        if bold {
            element(w, "w:rPr", &[], |w| empty(w, "w:b", &[]))?;
        }
        text_element(w, "w:t", &[("xml:space", "preserve")], text)
    })
}

/// A4 portrait with 2 cm side margins.
fn section_properties(w: &mut XmlWriter) -> XmlResult {
    element(w, "w:sectPr", &[], |w| {
        empty(w, "w:pgSz", &[("w:w", "11906"), ("w:h", "16838")])?;
        empty(
            w,
            "w:pgMar",
            &[
                ("w:top", "1417"),
                ("w:right", "1134"),
                ("w:bottom", "1134"),
                ("w:left", "1134"),
                ("w:header", "708"),
                ("w:footer", "708"),
                ("w:gutter", "0"),
            ],
        )
    })
}

fn relationships_xml(rels: &[(&str, &str, &str)]) -> quick_xml::Result<Vec<u8>> {
    part(|w| {
        element(w, "Relationships", &[("xmlns", NS_PACKAGE_RELS)], |w| {
            for (id, kind, target) in rels {
                empty(
                    w,
                    "Relationship",
                    &[("Id", *id), ("Type", *kind), ("Target", *target)],
                )?;
            }
            Ok(())
        })
    })
}

fn package_rels_xml() -> quick_xml::Result<Vec<u8>> {
    relationships_xml(&[
        ("rId1", REL_OFFICE_DOCUMENT, "word/document.xml"),
        ("rId2", REL_CORE, "docProps/core.xml"),
        ("rId3", REL_EXTENDED, "docProps/app.xml"),
    ])
}

fn content_types_xml() -> quick_xml::Result<Vec<u8>> {
    part(|w| {
        element(w, "Types", &[("xmlns", NS_CONTENT_TYPES)], |w| {
            for (ext, content_type) in [
                ("rels", CT_RELS),
                ("xml", "application/xml"),
                ("png", "image/png"),
            ] {
                empty(
                    w,
                    "Default",
                    &[("Extension", ext), ("ContentType", content_type)],
                )?;
            }
            for (part_name, content_type) in PART_OVERRIDES {
                empty(
                    w,
                    "Override",
                    &[("PartName", part_name), ("ContentType", content_type)],
                )?;
            }
            Ok(())
        })
    })
}

fn app_xml() -> quick_xml::Result<Vec<u8>> {
    part(|w| {
        element(w, "Properties", &[("xmlns", NS_EXTENDED)], |w| {
            text_element(w, "Application", &[], APPLICATION)
        })
    })
}

fn styles_xml() -> quick_xml::Result<Vec<u8>> {
    part(|w| {
        element(w, "w:styles", &[("xmlns:w", NS_W)], |w| {
            element(w, "w:docDefaults", &[], |w| {
                element(w, "w:rPrDefault", &[], |w| {
                    element(w, "w:rPr", &[], |w| {
                        empty(
                            w,
                            "w:rFonts",
                            &[("w:ascii", "Calibri"), ("w:hAnsi", "Calibri"), ("w:cs", "Calibri")],
                        )?;
                        empty(w, "w:sz", &[("w:val", "22")])?;
                        empty(w, "w:lang", &[("w:val", "de-DE")])
                    })
                })?;
                element(w, "w:pPrDefault", &[], |w| {
                    element(w, "w:pPr", &[], |w| {
                        empty(
                            w,
                            "w:spacing",
                            &[("w:after", "160"), ("w:line", "259"), ("w:lineRule", "auto")],
                        )
                    })
                })
            })?;
            element(
                w,
                "w:style",
                &[("w:type", "paragraph"), ("w:default", "1"), ("w:styleId", "Normal")],
                |w| empty(w, "w:name", &[("w:val", "Normal")]),
            )?;
            for style in &PARAGRAPH_STYLES {
                paragraph_style(w, style)?;
            }
            Ok(())
        })
    })
}

fn paragraph_style(w: &mut XmlWriter, style: &ParagraphStyle) -> XmlResult {
    element(
        w,
        "w:style",
        &[("w:type", "paragraph"), ("w:styleId", style.id)],
        |w| {
            empty(w, "w:name", &[("w:val", style.name)])?;
            empty(w, "w:basedOn", &[("w:val", "Normal")])?;
            empty(w, "w:next", &[("w:val", "Normal")])?;
            element(w, "w:pPr", &[], |w| {
                if style.outline_level.is_some() {
                    empty(w, "w:keepNext", &[])?;
                }
                empty(
                    w,
                    "w:spacing",
                    &[("w:before", style.before), ("w:after", style.after)],
                )?;
                if let Some(level) = style.outline_level {
                    empty(w, "w:outlineLvl", &[("w:val", level)])?;
                }
                Ok(())
            })?;
            element(w, "w:rPr", &[], |w| {
                empty(w, "w:b", &[])?;
                empty(w, "w:sz", &[("w:val", style.size)])?;
                empty(w, "w:color", &[("w:val", style.color)])
            })
        },
    )
}
