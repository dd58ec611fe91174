//! XML representation of relation files.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <relations>
//!   <metadata similarity_threshold="0.9" max_relations_per_document="2"
//!             average_relations_per_document="0.33" created="2024-01-01T00:00:00+00:00"/>
//!   <document id="A">
//!     <relation dest="B" similarity="0.99995"/>
//!   </document>
//! </relations>
//! ```
//!
//! Floats are written in their shortest round-trip form, so a reload
//! reproduces identical values. The helpers at the bottom are shared by
//! the other XML formats of the crate.

use std::collections::HashMap;
use std::fmt::Display;
use std::path::Path;
use std::str::FromStr;

use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, Event};
use quick_xml::{Reader, Writer};

use crate::error::{SimilarityError, SimilarityResult};
use crate::io::write_atomic;
use crate::relation::store::{RelationMetadata, RelationStore};

/// Origin reported in errors for XML parsed from memory.
const INLINE_ORIGIN: &str = "<inline>";

impl RelationStore {
    /// Serializes the store, metadata first when present.
    pub fn to_xml_string(&self) -> SimilarityResult<String> {
        let mut writer = new_writer()?;
        write(&mut writer, Event::Start(BytesStart::new("relations")))?;

        if let Some(metadata) = self.metadata() {
            let mut element = BytesStart::new("metadata");
            element.push_attribute((
                "similarity_threshold",
                metadata.similarity_threshold.to_string().as_str(),
            ));
            element.push_attribute((
                "max_relations_per_document",
                metadata.max_relations_per_document.to_string().as_str(),
            ));
            element.push_attribute((
                "average_relations_per_document",
                metadata.average_relations_per_document.to_string().as_str(),
            ));
            element.push_attribute(("created", chrono::Utc::now().to_rfc3339().as_str()));
            write(&mut writer, Event::Empty(element))?;
        }

        for (src, related) in self.iter() {
            let mut document = BytesStart::new("document");
            document.push_attribute(("id", src));
            write(&mut writer, Event::Start(document))?;

            for relation in related {
                let mut element = BytesStart::new("relation");
                element.push_attribute(("dest", relation.dest.as_str()));
                element.push_attribute(("similarity", relation.similarity.to_string().as_str()));
                write(&mut writer, Event::Empty(element))?;
            }

            write(&mut writer, Event::End(BytesEnd::new("document")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("relations")))?;
        finish(writer)
    }

    /// Parses a relation document.
    pub fn from_xml_str(xml: &str) -> SimilarityResult<Self> {
        parse_relations(xml, Path::new(INLINE_ORIGIN))
    }

    /// Writes the relation file atomically.
    pub fn save(&self, path: &Path) -> SimilarityResult<()> {
        let xml = self.to_xml_string()?;
        write_atomic(path, xml.as_bytes())?;
        tracing::info!(
            "Saved {} relations for {} documents to {}",
            self.relation_count(),
            self.source_count(),
            path.display()
        );
        Ok(())
    }

    /// Reads a relation file.
    pub fn load(path: &Path) -> SimilarityResult<Self> {
        let xml = read_file(path)?;
        parse_relations(&xml, path)
    }
}

fn parse_relations(xml: &str, origin: &Path) -> SimilarityResult<RelationStore> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut store = RelationStore::new();
    let mut current: Option<String> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(origin, format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"metadata" =>
            {
                let attrs = attributes(&element, origin)?;
                store.set_metadata(RelationMetadata {
                    similarity_threshold: parse_attr(&attrs, "similarity_threshold", "metadata", origin)?,
                    max_relations_per_document: parse_attr(
                        &attrs,
                        "max_relations_per_document",
                        "metadata",
                        origin,
                    )?,
                    average_relations_per_document: parse_attr(
                        &attrs,
                        "average_relations_per_document",
                        "metadata",
                        origin,
                    )?,
                });
            }
            Event::Start(element) if element.name().as_ref() == b"document" => {
                let attrs = attributes(&element, origin)?;
                current = Some(required(&attrs, "id", "document", origin)?.to_string());
            }
            Event::End(element) if element.name().as_ref() == b"document" => {
                current = None;
            }
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"relation" =>
            {
                let Some(src) = current.as_deref() else {
                    return Err(malformed(origin, "<relation> outside of a <document>"));
                };
                let attrs = attributes(&element, origin)?;
                let dest = required(&attrs, "dest", "relation", origin)?;
                let similarity = parse_attr(&attrs, "similarity", "relation", origin)?;
                store.add(src, dest, similarity);
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(store)
}

pub(crate) fn new_writer() -> SimilarityResult<Writer<Vec<u8>>> {
    let mut writer = Writer::new_with_indent(Vec::new(), b' ', 2);
    write(
        &mut writer,
        Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)),
    )?;
    Ok(writer)
}

pub(crate) fn write(writer: &mut Writer<Vec<u8>>, event: Event<'_>) -> SimilarityResult<()> {
    writer.write_event(event).map_err(serialization_error)
}

pub(crate) fn finish(writer: Writer<Vec<u8>>) -> SimilarityResult<String> {
    let mut xml = String::from_utf8(writer.into_inner()).map_err(serialization_error)?;
    xml.push('\n');
    Ok(xml)
}

fn serialization_error(error: impl Display) -> SimilarityError {
    SimilarityError::Serialization {
        reason: error.to_string(),
    }
}

pub(crate) fn malformed(origin: &Path, reason: impl Into<String>) -> SimilarityError {
    SimilarityError::Malformed {
        path: origin.to_path_buf(),
        reason: reason.into(),
    }
}

pub(crate) fn read_file(path: &Path) -> SimilarityResult<String> {
    std::fs::read_to_string(path).map_err(|source| SimilarityError::FileRead {
        path: path.to_path_buf(),
        source,
    })
}

/// Unescaped attributes of an element.
pub(crate) fn attributes(
    element: &BytesStart<'_>,
    origin: &Path,
) -> SimilarityResult<HashMap<String, String>> {
    let mut attrs = HashMap::new();
    for attr in element.attributes() {
        let attr = attr.map_err(|e| malformed(origin, e.to_string()))?;
        let key = String::from_utf8_lossy(attr.key.as_ref()).into_owned();
        let value = attr
            .unescape_value()
            .map_err(|e| malformed(origin, e.to_string()))?
            .into_owned();
        attrs.insert(key, value);
    }
    Ok(attrs)
}

pub(crate) fn required<'a>(
    attrs: &'a HashMap<String, String>,
    key: &str,
    element: &str,
    origin: &Path,
) -> SimilarityResult<&'a str> {
    attrs
        .get(key)
        .map(String::as_str)
        .ok_or_else(|| malformed(origin, format!("<{element}> is missing attribute '{key}'")))
}

pub(crate) fn parse_attr<T>(
    attrs: &HashMap<String, String>,
    key: &str,
    element: &str,
    origin: &Path,
) -> SimilarityResult<T>
where
    T: FromStr,
    T::Err: Display,
{
    let value = required(attrs, key, element, origin)?;
    value.trim().parse().map_err(|e| {
        malformed(
            origin,
            format!("<{element}> attribute '{key}' has invalid value '{value}': {e}"),
        )
    })
}
