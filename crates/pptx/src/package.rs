//! OPC package access: parts and relationships inside the ZIP container.

use crate::xml::XmlElement;
use deck_core::{Error, Result};
use std::io::{Cursor, Read, Seek, Write};
use zip::result::ZipError;
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Largest buffer reserved up front for a part, whatever size its header claims.
const MAX_PREALLOC: u64 = 16 * 1024 * 1024;

/// An open OOXML package (PPTX, or an XLSX embedded in one).
pub struct Package<R> {
    archive: ZipArchive<R>,
}

impl<R: Read + Seek> Package<R> {
    /// Open a package from a seekable reader.
    pub fn open(reader: R) -> Result<Self> {
        let archive = ZipArchive::new(reader)
            .map_err(|e| Error::ZipError(format!("Failed to open ZIP: {}", e)))?;
        Ok(Self { archive })
    }

    /// Whether a part exists.
    pub fn has_part(&self, path: &str) -> bool {
        self.archive.file_names().any(|name| name == path)
    }

    /// Read a part as raw bytes.
    pub fn read_bytes(&mut self, path: &str) -> Result<Vec<u8>> {
        let mut file = self.archive.by_name(path).map_err(|e| match e {
            ZipError::FileNotFound => Error::MissingPart(path.to_string()),
            other => Error::ZipError(format!("Failed to open '{}': {}", path, other)),
        })?;

        let mut content = Vec::with_capacity(capacity_hint(file.size()));
        file.read_to_end(&mut content)
            .map_err(|e| Error::ZipError(format!("Failed to read '{}': {}", path, e)))?;

        Ok(content)
    }

    /// Read a part as text.
    pub fn read_string(&mut self, path: &str) -> Result<String> {
        let bytes = self.read_bytes(path)?;
        let text = String::from_utf8_lossy(&bytes);
        Ok(text.trim_start_matches('\u{feff}').to_string())
    }

    /// Read and parse an XML part.
    pub fn read_xml(&mut self, path: &str) -> Result<XmlElement> {
        let content = self.read_string(path)?;
        XmlElement::parse(&content)
            .map_err(|e| Error::XmlError(format!("{} in '{}'", e, path)))
    }

    /// Relationships of a part. A part without a `.rels` file has none.
    pub fn relationships(&mut self, part: &str) -> Result<Relationships> {
        let rels_path = rels_path_for(part);
        if !self.has_part(&rels_path) {
            return Ok(Relationships::default());
        }
        let root = self.read_xml(&rels_path)?;
        Ok(Relationships::from_xml(&root, part))
    }
}

/// Builds a package in memory, one part at a time.
pub struct PackageWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
}

impl PackageWriter {
    pub fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
        }
    }

    /// Add a deflated part at `path`, e.g. `ppt/slides/slide1.xml`.
    pub fn add(&mut self, path: &str, content: &[u8]) -> Result<()> {
        let options = FileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip
            .start_file(path, options)
            .map_err(|e| Error::ZipError(format!("Failed to add '{}': {}", path, e)))?;
        self.zip.write_all(content)?;
        Ok(())
    }

    /// Close the archive and return its bytes.
    pub fn finish(mut self) -> Result<Vec<u8>> {
        let cursor = self
            .zip
            .finish()
            .map_err(|e| Error::ZipError(format!("Failed to finish package: {}", e)))?;
        Ok(cursor.into_inner())
    }
}

impl Default for PackageWriter {
    fn default() -> Self {
        Self::new()
    }
}

/// Initial buffer size for a part whose header declares `size` bytes.
fn capacity_hint(size: u64) -> usize {
    usize::try_from(size.min(MAX_PREALLOC)).unwrap_or(0)
}

/// A single relationship from a source part.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relationship {
    pub id: String,
    pub rel_type: String,
    /// Package path of the target, already resolved against the source part.
    pub target: String,
    pub external: bool,
}

impl Relationship {
    /// Whether the relationship type ends with `/<kind>`, e.g. `slide`.
    pub fn is_type(&self, kind: &str) -> bool {
        self.rel_type
            .rsplit('/')
            .next()
            .is_some_and(|last| last == kind)
    }
}

/// Relationships of one part, in declaration order.
#[derive(Debug, Clone, Default)]
pub struct Relationships {
    entries: Vec<Relationship>,
}

impl Relationships {
    fn from_xml(root: &XmlElement, source_part: &str) -> Self {
        let entries = root
            .children_named("Relationship")
            .filter_map(|rel| {
                let id = rel.attr("Id")?;
                let target = rel.attr("Target")?;
                let external = rel.attr("TargetMode") == Some("External");
                Some(Relationship {
                    id: id.to_string(),
                    rel_type: rel.attr("Type").unwrap_or_default().to_string(),
                    target: if external {
                        target.to_string()
                    } else {
                        resolve_target(source_part, target)
                    },
                    external,
                })
            })
            .collect();
        Self { entries }
    }

    /// Look up a relationship by id.
    pub fn get(&self, id: &str) -> Option<&Relationship> {
        self.entries.iter().find(|r| r.id == id)
    }

    /// Internal relationships of the given kind.
    pub fn of_type<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Relationship> {
        self.entries
            .iter()
            .filter(move |r| !r.external && r.is_type(kind))
    }

    pub fn iter(&self) -> impl Iterator<Item = &Relationship> {
        self.entries.iter()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

/// Path of the `.rels` part describing `part`.
pub fn rels_path_for(part: &str) -> String {
    match part.rsplit_once('/') {
        Some((dir, file)) => format!("{}/_rels/{}.rels", dir, file),
        None if part.is_empty() => "_rels/.rels".to_string(),
        None => format!("_rels/{}.rels", part),
    }
}

/// Resolve a relationship target against the directory of its source part.
pub fn resolve_target(source_part: &str, target: &str) -> String {
    if let Some(absolute) = target.strip_prefix('/') {
        return absolute.to_string();
    }

    let mut segments: Vec<&str> = match source_part.rsplit_once('/') {
        Some((dir, _)) => dir.split('/').filter(|s| !s.is_empty()).collect(),
        None => Vec::new(),
    };

    for segment in target.split('/') {
        match segment {
            "" | "." => {}
            ".." => {
                segments.pop();
            }
            other => segments.push(other),
        }
    }

    segments.join("/")
}
