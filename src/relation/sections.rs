//! Section level detail for document relations.
//!
//! ```xml
//! <sectionrelations>
//!   <srcdoc id="A">
//!     <destdoc id="B" similarity="0.93">
//!       <section src="0" dest="2" similarity="0.81"/>
//!     </destdoc>
//!   </srcdoc>
//! </sectionrelations>
//! ```

use std::collections::HashMap;
use std::path::Path;

use quick_xml::Reader;
use quick_xml::events::{BytesEnd, BytesStart, Event};

use crate::dataset::SectionSimilarityMatrix;
use crate::error::SimilarityResult;
use crate::io::write_atomic;
use crate::relation::store::RelationStore;
use crate::relation::xml::{attributes, finish, malformed, new_writer, parse_attr, read_file, required, write};
use crate::vector::{Similarity, VectorStore};

const INLINE_ORIGIN: &str = "<inline>";

/// Similarity of one source section to one destination section.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SectionRelation {
    pub src_section: usize,
    pub dest_section: usize,
    pub similarity: Similarity,
}

/// A document relation with its qualifying section pairs.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentSectionRelations {
    pub dest: String,
    /// Document level similarity
    pub similarity: Similarity,
    pub sections: Vec<SectionRelation>,
}

impl DocumentSectionRelations {
    pub fn new(dest: impl Into<String>, similarity: Similarity) -> Self {
        Self {
            dest: dest.into(),
            similarity,
            sections: Vec::new(),
        }
    }

    pub fn add_section(&mut self, src_section: usize, dest_section: usize, similarity: Similarity) {
        self.sections.push(SectionRelation {
            src_section,
            dest_section,
            similarity,
        });
    }
}

/// Source document -> related documents with section pairs, in insertion order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SectionRelationStore {
    sources: Vec<(String, Vec<DocumentSectionRelations>)>,
    by_source: HashMap<String, usize>,
}

impl SectionRelationStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Computes section pairs for every document relation.
    ///
    /// Sources are looked up in `source`, destinations in `target`; both
    /// are the same store for a self-compared corpus.
    pub fn from_relations(
        relations: &RelationStore,
        source: &VectorStore,
        target: &VectorStore,
        section_threshold: Similarity,
    ) -> SimilarityResult<Self> {
        let mut store = Self::new();

        for (src, related) in relations.iter() {
            let src_document = source.get(src)?;
            for relation in related {
                let dest_document = target.get(&relation.dest)?;
                let matrix = SectionSimilarityMatrix::compute(
                    &src_document.section_vectors(),
                    &dest_document.section_vectors(),
                );

                let mut entry = DocumentSectionRelations::new(&relation.dest, relation.similarity);
                for (row, src_section) in src_document.sections.iter().enumerate() {
                    for (col, dest_section) in dest_document.sections.iter().enumerate() {
                        let similarity = matrix.get(row, col);
                        if similarity >= section_threshold {
                            entry.add_section(src_section.index, dest_section.index, similarity);
                        }
                    }
                }
                store.add(src, entry);
            }
        }

        tracing::info!(
            "Found {} section relations across {} document relations",
            store.section_relation_count(),
            store.relation_count()
        );
        Ok(store)
    }

    pub fn add(&mut self, src: &str, relations: DocumentSectionRelations) {
        let slot = match self.by_source.get(src) {
            Some(&slot) => slot,
            None => {
                self.by_source.insert(src.to_string(), self.sources.len());
                self.sources.push((src.to_string(), Vec::new()));
                self.sources.len() - 1
            }
        };
        self.sources[slot].1.push(relations);
    }

    pub fn get(&self, src: &str) -> Option<&[DocumentSectionRelations]> {
        self.by_source
            .get(src)
            .map(|&slot| self.sources[slot].1.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[DocumentSectionRelations])> {
        self.sources
            .iter()
            .map(|(src, relations)| (src.as_str(), relations.as_slice()))
    }

    pub fn source_count(&self) -> usize {
        self.sources.len()
    }

    /// Number of document relations.
    pub fn relation_count(&self) -> usize {
        self.sources.iter().map(|(_, relations)| relations.len()).sum()
    }

    /// Number of section pairs over all document relations.
    pub fn section_relation_count(&self) -> usize {
        self.sources
            .iter()
            .flat_map(|(_, relations)| relations.iter())
            .map(|relation| relation.sections.len())
            .sum()
    }

    pub fn to_xml_string(&self) -> SimilarityResult<String> {
        let mut writer = new_writer()?;
        write(&mut writer, Event::Start(BytesStart::new("sectionrelations")))?;

        for (src, relations) in self.iter() {
            let mut src_element = BytesStart::new("srcdoc");
            src_element.push_attribute(("id", src));
            write(&mut writer, Event::Start(src_element))?;

            for relation in relations {
                let mut dest_element = BytesStart::new("destdoc");
                dest_element.push_attribute(("id", relation.dest.as_str()));
                dest_element.push_attribute(("similarity", relation.similarity.to_string().as_str()));
                write(&mut writer, Event::Start(dest_element))?;

                for section in &relation.sections {
                    let mut element = BytesStart::new("section");
                    element.push_attribute(("src", section.src_section.to_string().as_str()));
                    element.push_attribute(("dest", section.dest_section.to_string().as_str()));
                    element.push_attribute(("similarity", section.similarity.to_string().as_str()));
                    write(&mut writer, Event::Empty(element))?;
                }

                write(&mut writer, Event::End(BytesEnd::new("destdoc")))?;
            }

            write(&mut writer, Event::End(BytesEnd::new("srcdoc")))?;
        }

        write(&mut writer, Event::End(BytesEnd::new("sectionrelations")))?;
        finish(writer)
    }

    pub fn from_xml_str(xml: &str) -> SimilarityResult<Self> {
        parse_section_relations(xml, Path::new(INLINE_ORIGIN))
    }

    pub fn save(&self, path: &Path) -> SimilarityResult<()> {
        let xml = self.to_xml_string()?;
        write_atomic(path, xml.as_bytes())?;
        tracing::info!(
            "Saved section relations for {} documents to {}",
            self.source_count(),
            path.display()
        );
        Ok(())
    }

    pub fn load(path: &Path) -> SimilarityResult<Self> {
        let xml = read_file(path)?;
        parse_section_relations(&xml, path)
    }
}

fn parse_section_relations(xml: &str, origin: &Path) -> SimilarityResult<SectionRelationStore> {
    let mut reader = Reader::from_str(xml);
    reader.config_mut().trim_text(true);

    let mut store = SectionRelationStore::new();
    let mut src: Option<String> = None;
    let mut dest: Option<DocumentSectionRelations> = None;

    loop {
        let event = reader
            .read_event()
            .map_err(|e| malformed(origin, format!("at byte {}: {e}", reader.buffer_position())))?;

        match event {
            Event::Start(element) if element.name().as_ref() == b"srcdoc" => {
                let attrs = attributes(&element, origin)?;
                src = Some(required(&attrs, "id", "srcdoc", origin)?.to_string());
            }
            Event::End(element) if element.name().as_ref() == b"srcdoc" => {
                src = None;
            }
            Event::Start(element) if element.name().as_ref() == b"destdoc" => {
                if src.is_none() {
                    return Err(malformed(origin, "<destdoc> outside of a <srcdoc>"));
                }
                if dest.is_some() {
                    return Err(malformed(origin, "<destdoc> inside another <destdoc>"));
                }
                dest = Some(dest_relation(&element, origin)?);
            }
            Event::Empty(element) if element.name().as_ref() == b"destdoc" => {
                let Some(current_src) = src.as_deref() else {
                    return Err(malformed(origin, "<destdoc> outside of a <srcdoc>"));
                };
                if dest.is_some() {
                    return Err(malformed(origin, "<destdoc> inside another <destdoc>"));
                }
                store.add(current_src, dest_relation(&element, origin)?);
            }
            Event::End(element) if element.name().as_ref() == b"destdoc" => {
                if let (Some(current_src), Some(relation)) = (src.as_deref(), dest.take()) {
                    store.add(current_src, relation);
                }
            }
            Event::Start(element) | Event::Empty(element)
                if element.name().as_ref() == b"section" =>
            {
                let Some(relation) = dest.as_mut() else {
                    return Err(malformed(origin, "<section> outside of a <destdoc>"));
                };
                let attrs = attributes(&element, origin)?;
                relation.add_section(
                    parse_attr(&attrs, "src", "section", origin)?,
                    parse_attr(&attrs, "dest", "section", origin)?,
                    parse_attr(&attrs, "similarity", "section", origin)?,
                );
            }
            Event::Eof => break,
            _ => {}
        }
    }

    Ok(store)
}

fn dest_relation(
    element: &BytesStart<'_>,
    origin: &Path,
) -> SimilarityResult<DocumentSectionRelations> {
    let attrs = attributes(element, origin)?;
    Ok(DocumentSectionRelations::new(
        required(&attrs, "id", "destdoc", origin)?,
        parse_attr(&attrs, "similarity", "destdoc", origin)?,
    ))
}
