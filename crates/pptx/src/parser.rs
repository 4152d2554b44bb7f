//! PPTX file parser implementation.

use quick_xml::events::{BytesStart, Event};
use quick_xml::Reader;
use std::collections::HashMap;
use std::fs::File;
use std::io::{BufReader, Read, Seek};
use std::path::Path;
use tagging_core::{Cell, DocumentSource, Error, Result, Row, Shape, Slide, Table};
use unicode_normalization::UnicodeNormalization;
use zip::ZipArchive;

/// DrawingML offsets are in EMU; 12700 EMU make one point.
const EMU_PER_POINT: f64 = 12700.0;

const PRESENTATION_PATH: &str = "ppt/presentation.xml";
const PRESENTATION_RELS_PATH: &str = "ppt/_rels/presentation.xml.rels";

/// Parser for PPTX (Office Open XML) files.
pub struct PptxParser;

impl PptxParser {
    /// Create a new PPTX parser.
    pub fn new() -> Self {
        Self
    }

    /// Open a PPTX file on disk.
    pub fn open_path(&self, path: &Path) -> Result<PptxDocument<BufReader<File>>> {
        let file = File::open(path)
            .map_err(|e| Error::DocumentOpen(format!("{}: {}", path.display(), e)))?;
        self.open(BufReader::new(file))
    }

    /// Open a PPTX package from a reader.
    ///
    /// Only the slide list is read up front; slides are parsed on demand.
    pub fn open<R: Read + Seek>(&self, reader: R) -> Result<PptxDocument<R>> {
        let mut archive = ZipArchive::new(reader)
            .map_err(|e| Error::DocumentOpen(format!("not a PPTX package: {}", e)))?;

        let slide_paths = self
            .get_slide_order(&mut archive)
            .map_err(|e| Error::DocumentOpen(e.to_string()))?;
        log::debug!("PPTX package lists {} slides", slide_paths.len());

        Ok(PptxDocument {
            archive,
            slide_paths,
            buffer: String::new(),
        })
    }

    /// Get the ordered list of slide part paths.
    ///
    /// The order comes from `sldIdLst` in presentation.xml. Packages without
    /// one fall back to the trailing number of each relationship.
    fn get_slide_order<R: Read + Seek>(&self, archive: &mut ZipArchive<R>) -> Result<Vec<String>> {
        let mut buf = String::new();
        read_file_from_archive(archive, PRESENTATION_RELS_PATH, &mut buf)?;
        let relationships = parse_slide_relationships(&buf)?;

        let listed = match read_file_from_archive(archive, PRESENTATION_PATH, &mut buf) {
            Ok(()) => parse_slide_id_list(&buf)?,
            Err(e) => {
                log::warn!("Falling back to relationship order: {}", e);
                Vec::new()
            }
        };

        if !listed.is_empty() {
            let by_id: HashMap<&str, &str> = relationships
                .iter()
                .map(|r| (r.id.as_str(), r.target.as_str()))
                .collect();
            return Ok(listed
                .iter()
                .filter_map(|rid| by_id.get(rid.as_str()))
                .map(|target| resolve_target(target))
                .collect());
        }

        let mut slides: Vec<(String, Option<usize>)> = relationships
            .iter()
            .map(|r| {
                let order = extract_slide_number(&r.target).or_else(|| extract_slide_number(&r.id));
                (resolve_target(&r.target), order)
            })
            .collect();

        slides.sort_by(|a, b| match (a.1, b.1) {
            (Some(na), Some(nb)) => na.cmp(&nb),
            (Some(_), None) => std::cmp::Ordering::Less,
            (None, Some(_)) => std::cmp::Ordering::Greater,
            (None, None) => a.0.cmp(&b.0),
        });

        Ok(slides.into_iter().map(|(path, _)| path).collect())
    }
}

impl Default for PptxParser {
    fn default() -> Self {
        Self::new()
    }
}

/// An opened PPTX package. Slides are parsed lazily, one at a time.
pub struct PptxDocument<R> {
    archive: ZipArchive<R>,
    slide_paths: Vec<String>,
    buffer: String,
}

impl<R: Read + Seek> PptxDocument<R> {
    /// Archive paths of the slide parts, in presentation order.
    pub fn slide_paths(&self) -> &[String] {
        &self.slide_paths
    }
}

impl<R: Read + Seek> DocumentSource for PptxDocument<R> {
    fn slide_count(&self) -> usize {
        self.slide_paths.len()
    }

    fn slide(&mut self, position: usize) -> Result<Slide> {
        let index = position + 1;
        let slide_err = |reason: String| Error::SlideProcessing {
            slide: index,
            reason,
        };

        let path = self
            .slide_paths
            .get(position)
            .ok_or_else(|| slide_err("slide index out of range".to_string()))?;

        read_file_from_archive(&mut self.archive, path, &mut self.buffer)
            .map_err(|e| slide_err(e.to_string()))?;

        parse_slide_xml(&self.buffer, index).map_err(|e| slide_err(e.to_string()))
    }

    fn reclaim(&mut self) {
        self.buffer = String::new();
    }
}

/// A slide relationship from presentation.xml.rels.
#[derive(Debug)]
struct SlideRelationship {
    id: String,
    target: String,
}

fn parse_slide_relationships(xml: &str) -> Result<Vec<SlideRelationship>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut relationships = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"Relationship" =>
            {
                let mut rel_type = String::new();
                let mut target = String::new();
                let mut id = String::new();

                for attr in e.attributes().flatten() {
                    let value = String::from_utf8_lossy(&attr.value).to_string();
                    match attr.key.as_ref() {
                        b"Type" => rel_type = value,
                        b"Target" => target = value,
                        b"Id" => id = value,
                        _ => {}
                    }
                }

                if rel_type.ends_with("/slide") {
                    relationships.push(SlideRelationship { id, target });
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing relationships: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(relationships)
}

/// Relationship ids of `p:sldId` entries, in presentation order.
fn parse_slide_id_list(xml: &str) -> Result<Vec<String>> {
    let mut reader = Reader::from_str(xml);
    reader.trim_text(true);
    let mut ids = Vec::new();

    loop {
        match reader.read_event() {
            Ok(Event::Empty(ref e)) | Ok(Event::Start(ref e))
                if local_name(e.name().as_ref()) == b"sldId" =>
            {
                // `id` is the numeric slide id; the namespaced `r:id` is the relationship.
                let rid = e.attributes().flatten().find_map(|attr| {
                    let key = attr.key.as_ref();
                    (key != b"id" && local_name(key) == b"id")
                        .then(|| String::from_utf8_lossy(&attr.value).to_string())
                });
                if let Some(rid) = rid {
                    ids.push(rid);
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "Error parsing presentation.xml: {}",
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(ids)
}

/// Shape under construction while walking slide XML.
#[derive(Debug, Default)]
struct ShapeBuilder {
    text: String,
    paragraphs: usize,
    has_text_frame: bool,
    top: Option<f64>,
    is_title: bool,
    table: Option<Table>,
}

impl ShapeBuilder {
    fn finish(self) -> Shape {
        Shape {
            text: self.has_text_frame.then(|| clean_text(&self.text)),
            top: self.top,
            is_title: self.is_title,
            table: self.table,
        }
    }
}

/// Table cell under construction.
#[derive(Debug, Default)]
struct CellBuilder {
    text: String,
    paragraphs: usize,
    failed: bool,
}

/// Parse one slide part into the document model.
///
/// Only top-level shapes of the shape tree are kept; shapes nested inside
/// group shapes are skipped.
fn parse_slide_xml(xml: &str, index: usize) -> Result<Slide> {
    let mut slide = Slide::new(index);
    let mut reader = Reader::from_str(xml);

    let mut group_depth = 0usize;
    let mut current: Option<ShapeBuilder> = None;
    let mut row: Option<Row> = None;
    let mut cell: Option<CellBuilder> = None;
    let mut in_run_text = false;

    loop {
        match reader.read_event() {
            Ok(Event::Start(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"grpSp" => group_depth += 1,
                    b"sp" | b"graphicFrame" if group_depth == 0 && current.is_none() => {
                        current = Some(ShapeBuilder::default());
                    }
                    b"t" if current.is_some() => in_run_text = true,
                    local => {
                        if let Some(shape) = current.as_mut() {
                            open_element(local, e, shape, &mut row, &mut cell);
                        }
                    }
                }
            }
            Ok(Event::Empty(ref e)) => {
                if let Some(shape) = current.as_mut() {
                    let name = e.name();
                    match local_name(name.as_ref()) {
                        b"tc" => {
                            if let Some(r) = row.as_mut() {
                                r.cells.push(Cell::default());
                            }
                        }
                        local => open_element(local, e, shape, &mut row, &mut cell),
                    }
                }
            }
            Ok(Event::Text(ref e)) => {
                if !in_run_text {
                    continue;
                }
                let Some(shape) = current.as_mut() else {
                    continue;
                };
                match e.unescape() {
                    Ok(text) => match cell.as_mut() {
                        Some(c) => c.text.push_str(&text),
                        None => shape.text.push_str(&text),
                    },
                    Err(err) => {
                        let failure = Error::CellExtraction(format!("slide {}: {}", index, err));
                        log::warn!("{}", failure);
                        if let Some(c) = cell.as_mut() {
                            c.failed = true;
                        }
                    }
                }
            }
            Ok(Event::End(ref e)) => {
                let name = e.name();
                match local_name(name.as_ref()) {
                    b"t" => in_run_text = false,
                    b"grpSp" => group_depth = group_depth.saturating_sub(1),
                    b"tc" => {
                        if let (Some(r), Some(c)) = (row.as_mut(), cell.take()) {
                            let text = if c.failed { String::new() } else { clean_text(&c.text) };
                            r.cells.push(Cell::new(text));
                        }
                    }
                    b"tr" => {
                        if let (Some(shape), Some(r)) = (current.as_mut(), row.take()) {
                            if let Some(table) = shape.table.as_mut() {
                                table.rows.push(r);
                            }
                        }
                    }
                    b"sp" | b"graphicFrame" if group_depth == 0 => {
                        if let Some(shape) = current.take() {
                            slide.shapes.push(shape.finish());
                        }
                        row = None;
                        cell = None;
                        in_run_text = false;
                    }
                    _ => {}
                }
            }
            Ok(Event::Eof) => break,
            Err(e) => {
                return Err(Error::XmlError(format!(
                    "at position {}: {}",
                    reader.buffer_position(),
                    e
                )));
            }
            _ => {}
        }
    }

    Ok(slide)
}

/// Handle an opening (or self-closing) element inside a top-level shape.
fn open_element(
    local: &[u8],
    e: &BytesStart,
    shape: &mut ShapeBuilder,
    row: &mut Option<Row>,
    cell: &mut Option<CellBuilder>,
) {
    match local {
        b"ph" => shape.is_title = is_title_placeholder(e),
        b"off" if shape.top.is_none() => {
            shape.top = attribute(e, b"y")
                .and_then(|y| y.parse::<f64>().ok())
                .map(|emu| emu / EMU_PER_POINT);
        }
        b"txBody" if cell.is_none() => shape.has_text_frame = true,
        b"tbl" => shape.table = Some(Table::default()),
        b"tr" => *row = Some(Row::default()),
        b"tc" => *cell = Some(CellBuilder::default()),
        b"p" => match cell.as_mut() {
            Some(c) => start_paragraph(&mut c.text, &mut c.paragraphs),
            None => start_paragraph(&mut shape.text, &mut shape.paragraphs),
        },
        b"br" => match cell.as_mut() {
            Some(c) => c.text.push('\n'),
            None => shape.text.push('\n'),
        },
        _ => {}
    }
}

fn start_paragraph(text: &mut String, paragraphs: &mut usize) {
    if *paragraphs > 0 {
        text.push('\n');
    }
    *paragraphs += 1;
}

/// A placeholder is the slide title if it is typed as one, or if it is the
/// untyped placeholder with index 0.
fn is_title_placeholder(e: &BytesStart) -> bool {
    match attribute(e, b"type").as_deref() {
        Some("title") | Some("ctrTitle") => true,
        Some(_) => false,
        None => attribute(e, b"idx").map_or(true, |idx| idx == "0"),
    }
}

/// Value of an unprefixed attribute.
fn attribute(e: &BytesStart, key: &[u8]) -> Option<String> {
    e.attributes()
        .flatten()
        .find(|attr| attr.key.as_ref() == key)
        .map(|attr| String::from_utf8_lossy(&attr.value).to_string())
}

/// Trim and NFC-normalize extracted text.
fn clean_text(text: &str) -> String {
    text.trim().nfc().collect()
}

/// Resolve a relationship target relative to the `ppt/` folder.
fn resolve_target(target: &str) -> String {
    match target.strip_prefix('/') {
        Some(absolute) => absolute.to_string(),
        None => format!("ppt/{}", target),
    }
}

/// Read a file from the ZIP archive into `buf`, replacing its contents.
fn read_file_from_archive<R: Read + Seek>(
    archive: &mut ZipArchive<R>,
    path: &str,
    buf: &mut String,
) -> Result<()> {
    let mut file = archive
        .by_name(path)
        .map_err(|e| Error::ZipError(format!("File not found in archive '{}': {}", path, e)))?;

    buf.clear();
    file.read_to_string(buf)
        .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

    Ok(())
}

/// Extract the local name from a potentially namespaced XML element name.
fn local_name(name: &[u8]) -> &[u8] {
    if let Some(pos) = name.iter().position(|&b| b == b':') {
        &name[pos + 1..]
    } else {
        name
    }
}

/// Extract a slide number from a string like "rId2" or "slide3.xml".
fn extract_slide_number(s: &str) -> Option<usize> {
    let s = s.trim_end_matches(".xml").trim_end_matches(".rels");

    let digits: String = s.chars().rev().take_while(|c| c.is_ascii_digit()).collect();
    if digits.is_empty() {
        return None;
    }
    let digits: String = digits.chars().rev().collect();
    digits.parse().ok()
}
