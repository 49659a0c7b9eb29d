/*!
 * EPUB books.
 *
 * Pages are the XHTML items of the package manifest. Paragraphs are the text
 * of the outermost `p` and `h1`-`h5` elements. Translations are injected by
 * re-serializing each page event by event, so markup outside the replaced
 * elements is written back byte for byte.
 */

use log::{debug, warn};
use quick_xml::events::{BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};
use std::collections::HashMap;
use std::fs::File;
use std::io::{Read, Seek, Write};
use std::path::{Path, PathBuf};
use zip::write::FileOptions;
use zip::{ZipArchive, ZipWriter};

use super::Document;
use crate::errors::DocumentError;
use crate::text_utils::{fix_indent, is_numeral, is_translatable};

const CONTAINER_PATH: &str = "META-INF/container.xml";
const PACKAGE_MEDIA_TYPE: &str = "application/oebps-package+xml";
const XHTML_MEDIA_TYPE: &str = "application/xhtml+xml";

/// Elements whose text is translated
const TARGET_TAGS: [&[u8]; 6] = [b"p", b"h1", b"h2", b"h3", b"h4", b"h5"];
const HEADING_TAGS: [&[u8]; 5] = [b"h1", b"h2", b"h3", b"h4", b"h5"];

/// EPUB archive on disk
#[derive(Debug, Clone)]
pub struct EpubDocument {
    path: PathBuf,
}

impl EpubDocument {
    pub fn new<P: AsRef<Path>>(path: P) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

impl Document for EpubDocument {
    type PageId = String;
    type Page = Vec<u8>;

    fn read(&self) -> Result<(Vec<String>, Vec<Vec<u8>>), DocumentError> {
        let mut archive = ZipArchive::new(File::open(&self.path)?)?;

        let container = read_entry(&mut archive, CONTAINER_PATH)?;
        let package_path = find_package_path(&container)?;
        let package = read_entry(&mut archive, &package_path)?;

        let base = match package_path.rfind('/') {
            Some(pos) => &package_path[..=pos],
            None => "",
        };
        let hrefs: Vec<String> = manifest_pages(&package)?
            .into_iter()
            .map(|href| format!("{}{}", base, href))
            .collect();

        let mut pages = Vec::with_capacity(hrefs.len());
        for href in &hrefs {
            pages.push(read_entry(&mut archive, href)?);
        }
        debug!("Read {} pages from {:?}", pages.len(), self.path);

        Ok((hrefs, pages))
    }

    fn extract_paragraphs(&self, pages: &[Vec<u8>]) -> Result<Vec<Vec<String>>, DocumentError> {
        pages
            .iter()
            .map(|page| {
                let texts = collect_texts(page, is_target, true)?;
                Ok(texts.into_iter().filter(|t| is_translatable(t)).collect())
            })
            .collect()
    }

    fn extract_titles(&self, pages: &[Vec<u8>]) -> Result<Vec<Vec<String>>, DocumentError> {
        let mut titles = Vec::new();
        for page in pages {
            let mut page_titles: Vec<String> = Vec::new();
            for text in collect_texts(page, is_title, false)? {
                let long_enough = text.trim().chars().count() > 2;
                if long_enough && !is_numeral(&text) && !page_titles.contains(&text) {
                    page_titles.push(text);
                }
            }
            if !page_titles.is_empty() {
                titles.push(page_titles);
            }
        }
        Ok(titles)
    }

    fn apply_translations(
        &self,
        pages: &[Vec<u8>],
        original: &[Vec<String>],
        translated: &[Vec<String>],
    ) -> Result<Vec<Vec<u8>>, DocumentError> {
        let empty = Vec::new();
        pages
            .iter()
            .enumerate()
            .map(|(index, page)| {
                let originals = original.get(index).unwrap_or(&empty);
                let translations = translated.get(index).unwrap_or(&empty);
                apply_to_page(page, originals, translations)
            })
            .collect()
    }

    fn write(&self, target: &Path, ids: &[String], pages: &[Vec<u8>]) -> Result<(), DocumentError> {
        let replacements: HashMap<&str, &Vec<u8>> = ids.iter().map(String::as_str).zip(pages).collect();

        let mut archive = ZipArchive::new(File::open(&self.path)?)?;
        let mut writer = ZipWriter::new(File::create(target)?);

        for i in 0..archive.len() {
            let file = archive.by_index(i)?;
            let name = file.name().to_string();
            match replacements.get(name.as_str()) {
                Some(content) => {
                    let options = FileOptions::default().compression_method(file.compression());
                    drop(file);
                    writer.start_file(name, options)?;
                    writer.write_all(content)?;
                }
                // Raw copies keep the `mimetype` entry first and uncompressed
                None => writer.raw_copy_file(file)?,
            }
        }

        writer.finish()?;
        Ok(())
    }
}

fn read_entry<R: Read + Seek>(archive: &mut ZipArchive<R>, name: &str) -> Result<Vec<u8>, DocumentError> {
    let mut file = archive
        .by_name(name)
        .map_err(|e| DocumentError::Malformed(format!("Missing entry '{}': {}", name, e)))?;
    let mut data = Vec::new();
    file.read_to_end(&mut data)?;
    Ok(data)
}

fn local_name_is(e: &BytesStart, names: &[&[u8]]) -> bool {
    let local = e.local_name();
    names.iter().any(|name| local.as_ref().eq_ignore_ascii_case(name))
}

fn attribute(e: &BytesStart, key: &[u8]) -> Result<Option<String>, DocumentError> {
    for attr in e.attributes() {
        let attr = attr.map_err(quick_xml::Error::from)?;
        if attr.key.as_ref() == key {
            return Ok(Some(attr.unescape_value()?.into_owned()));
        }
    }
    Ok(None)
}

fn is_target(e: &BytesStart) -> bool {
    local_name_is(e, &TARGET_TAGS)
}

fn is_title(e: &BytesStart) -> bool {
    local_name_is(e, &[b"title"])
        || local_name_is(e, &HEADING_TAGS)
        || matches!(attribute(e, b"epub:type"), Ok(Some(value)) if value == "title")
}

/// Rootfile path announced by `META-INF/container.xml`
fn find_package_path(container: &[u8]) -> Result<String, DocumentError> {
    let mut reader = Reader::from_reader(container);
    let mut buf = Vec::new();
    let mut fallback = None;

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name_is(&e, &[b"rootfile"]) => {
                let path = attribute(&e, b"full-path")?;
                let media_type = attribute(&e, b"media-type")?;
                if media_type.as_deref() == Some(PACKAGE_MEDIA_TYPE) {
                    if let Some(path) = path {
                        return Ok(path);
                    }
                }
                if fallback.is_none() {
                    fallback = path;
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    fallback.ok_or_else(|| DocumentError::Malformed("No rootfile in META-INF/container.xml".to_string()))
}

/// Hrefs of the XHTML items of the package manifest, in manifest order
fn manifest_pages(package: &[u8]) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_reader(package);
    let mut buf = Vec::new();
    let mut hrefs = Vec::new();

    loop {
        match reader.read_event_into(&mut buf)? {
            Event::Start(e) | Event::Empty(e) if local_name_is(&e, &[b"item"]) => {
                if attribute(&e, b"media-type")?.as_deref() == Some(XHTML_MEDIA_TYPE) {
                    if let Some(href) = attribute(&e, b"href")? {
                        hrefs.push(href);
                    }
                }
            }
            Event::Eof => break,
            _ => {}
        }
        buf.clear();
    }

    Ok(hrefs)
}

fn resolve_html_entity(entity: &str) -> Option<&'static str> {
    match entity {
        "nbsp" => Some("\u{a0}"),
        "mdash" => Some("\u{2014}"),
        "ndash" => Some("\u{2013}"),
        "hellip" => Some("\u{2026}"),
        "lsquo" => Some("\u{2018}"),
        "rsquo" => Some("\u{2019}"),
        "ldquo" => Some("\u{201c}"),
        "rdquo" => Some("\u{201d}"),
        _ => None,
    }
}

fn decode_text(text: &BytesText) -> String {
    text.unescape_with(resolve_html_entity)
        .map(|s| s.into_owned())
        .unwrap_or_else(|_| String::from_utf8_lossy(text).into_owned())
}

fn event_text(event: &Event) -> Option<String> {
    match event {
        Event::Text(t) => Some(decode_text(t)),
        Event::CData(c) => Some(String::from_utf8_lossy(c).into_owned()),
        _ => None,
    }
}

fn owned_event(reader: &mut Reader<&[u8]>, buf: &mut Vec<u8>) -> Result<Event<'static>, DocumentError> {
    let event = reader.read_event_into(buf)?.into_owned();
    buf.clear();
    Ok(event)
}

/// Text content of every selected element, in document order
///
/// With `outermost_only`, elements nested inside a selected element are not
/// reported on their own.
fn collect_texts(
    xml: &[u8],
    select: impl Fn(&BytesStart) -> bool,
    outermost_only: bool,
) -> Result<Vec<String>, DocumentError> {
    let mut reader = Reader::from_reader(xml);
    reader.trim_text(false);
    let mut buf = Vec::new();

    let mut texts: Vec<String> = Vec::new();
    // (depth, slot in `texts`) of each open selected element
    let mut open: Vec<(usize, usize)> = Vec::new();
    let mut depth = 0usize;

    loop {
        let event = owned_event(&mut reader, &mut buf)?;
        match &event {
            Event::Start(e) => {
                depth += 1;
                if select(e) && !(outermost_only && !open.is_empty()) {
                    open.push((depth, texts.len()));
                    texts.push(String::new());
                }
            }
            Event::End(_) => {
                if open.last().map(|(d, _)| *d) == Some(depth) {
                    open.pop();
                }
                depth = depth.saturating_sub(1);
            }
            Event::Eof => break,
            other => {
                if let Some(text) = event_text(other) {
                    for (_, slot) in &open {
                        texts[*slot].push_str(&text);
                    }
                }
            }
        }
    }

    Ok(texts)
}

/// Children of an element body, each as its complete event sequence
fn split_children(body: Vec<Event<'static>>) -> Vec<Vec<Event<'static>>> {
    let mut children = Vec::new();
    let mut current = Vec::new();
    let mut depth = 0usize;

    for event in body {
        match &event {
            Event::Start(_) => depth += 1,
            Event::End(_) => depth = depth.saturating_sub(1),
            _ => {}
        }
        current.push(event);
        if depth == 0 {
            children.push(std::mem::take(&mut current));
        }
    }
    if !current.is_empty() {
        children.push(current);
    }
    children
}

fn events_text(events: &[Event]) -> String {
    events.iter().filter_map(event_text).collect()
}

fn write_all(writer: &mut Writer<Vec<u8>>, events: Vec<Event<'static>>) -> Result<(), DocumentError> {
    for event in events {
        writer.write_event(event)?;
    }
    Ok(())
}

/// Write one buffered target element, translated when it matches `original`
fn write_element(
    writer: &mut Writer<Vec<u8>>,
    mut element: Vec<Event<'static>>,
    original: Option<&String>,
    translation: Option<&String>,
) -> Result<bool, DocumentError> {
    let text = events_text(&element);
    let (Some(original), Some(translation)) = (original, translation) else {
        write_all(writer, element)?;
        return Ok(false);
    };
    if text.is_empty() || &text != original || element.len() < 2 {
        write_all(writer, element)?;
        return Ok(false);
    }

    let end = element.pop().unwrap_or(Event::Eof);
    let start = element.remove(0);
    let children = split_children(element);

    let lines: Vec<&str> = translation.lines().filter(|line| !line.is_empty()).collect();
    let filled = children
        .iter()
        .filter(|child| !events_text(child).trim().is_empty())
        .count();

    writer.write_event(start)?;
    if lines.len() > 1 && lines.len() == filled {
        let mut lines = lines.into_iter();
        for mut child in children {
            if events_text(&child).trim().is_empty() {
                write_all(writer, child)?;
                continue;
            }
            let line = lines.next().unwrap_or_default();
            match child.first() {
                Some(Event::Start(_)) if child.len() >= 2 => {
                    let child_end = child.pop().unwrap_or(Event::Eof);
                    writer.write_event(child.remove(0))?;
                    writer.write_event(Event::Text(BytesText::new(line)))?;
                    writer.write_event(child_end)?;
                }
                _ => writer.write_event(Event::Text(BytesText::new(line)))?,
            }
        }
    } else {
        let replaced = fix_indent(&text, translation);
        writer.write_event(Event::Text(BytesText::new(&replaced)))?;
    }
    writer.write_event(end)?;

    Ok(true)
}

/// Re-serialize a page with its target elements translated
fn apply_to_page(page: &[u8], originals: &[String], translations: &[String]) -> Result<Vec<u8>, DocumentError> {
    let mut reader = Reader::from_reader(page);
    reader.trim_text(false);
    let mut writer = Writer::new(Vec::with_capacity(page.len()));
    let mut buf = Vec::new();

    let mut element: Vec<Event<'static>> = Vec::new();
    let mut nesting = 0usize;
    let mut matched = 0usize;

    loop {
        let event = owned_event(&mut reader, &mut buf)?;
        if matches!(event, Event::Eof) {
            break;
        }

        if nesting > 0 {
            match &event {
                Event::Start(_) => nesting += 1,
                Event::End(_) => nesting -= 1,
                _ => {}
            }
            element.push(event);
            if nesting == 0 {
                let buffered = std::mem::take(&mut element);
                if write_element(
                    &mut writer,
                    buffered,
                    originals.get(matched),
                    translations.get(matched),
                )? {
                    matched += 1;
                }
            }
            continue;
        }

        let opens_target = matches!(&event, Event::Start(e) if is_target(e));
        if opens_target {
            nesting = 1;
            element.push(event);
        } else {
            writer.write_event(event)?;
        }
    }

    if !element.is_empty() {
        write_all(&mut writer, element)?;
    }
    if matched < originals.len() {
        warn!(
            "Only {} of {} paragraphs could be placed back into a page",
            matched,
            originals.len()
        );
    }

    Ok(writer.into_inner())
}
