//! Upload extraction and archive re-packaging
//!
//! Uploads are either loose source files or zip archives. Archive members
//! stay in their original encoding and are copied raw into the rebuilt
//! archive; only source members are decompressed.

use crate::error::Result;
use crate::suffix::SuffixMap;
use crate::types::{ArchiveEntry, MemberData, ProjectLayout, SourceUnit, Translation};
use std::collections::hash_map::Entry;
use std::collections::{HashMap, HashSet};
use std::io::{Cursor, Read, Seek, Write};
use std::sync::Arc;
use tracing::{debug, warn};
use zip::write::SimpleFileOptions;
use zip::{CompressionMethod, ZipArchive, ZipWriter};

/// Extensions treated as text when classifying archive members
pub const DEFAULT_TEXT_EXTENSIONS: &[&str] = &[
    ".cs", ".txt", ".md", ".json", ".xml", ".config", ".yml", ".yaml",
];

/// One uploaded file, read fully
#[derive(Debug, Clone)]
pub struct Upload {
    pub name: String,
    pub bytes: Vec<u8>,
}

impl Upload {
    pub fn new(name: impl Into<String>, bytes: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            bytes: bytes.into(),
        }
    }
}

/// Outcome of reading a set of uploads
#[derive(Debug, Clone, Default)]
pub struct Extraction {
    pub units: Vec<SourceUnit>,
    /// Present when at least one archive was uploaded
    pub layout: Option<ProjectLayout>,
    pub warnings: Vec<String>,
}

/// Members of one archive and the decoded text of its source members
#[derive(Debug, Clone, Default)]
pub struct ArchiveContents {
    pub entries: Vec<ArchiveEntry>,
    /// `(path, content)` in archive order
    pub sources: Vec<(String, String)>,
    pub warnings: Vec<String>,
}

/// A produced archive and anything skipped while writing it
#[derive(Debug, Clone)]
pub struct Repackaged {
    pub bytes: Vec<u8>,
    pub warnings: Vec<String>,
}

type SharedArchive = ZipArchive<Cursor<Arc<[u8]>>>;

fn is_text_path(path: &str, text_extensions: &[String]) -> bool {
    text_extensions.iter().any(|ext| path.ends_with(ext.as_str()))
}

fn is_zip_name(name: &str) -> bool {
    name.to_lowercase().ends_with(".zip")
}

fn decode_member<R: Read + Seek>(archive: &mut ZipArchive<R>, index: usize) -> Result<Vec<u8>> {
    let mut file = archive.by_index(index)?;
    let mut bytes = Vec::with_capacity(file.size() as usize);
    file.read_to_end(&mut bytes)?;
    Ok(bytes)
}

/// Index every non-directory member of a zip archive.
///
/// Members are recorded without decompressing them, whatever their
/// compression method. Source members are decoded as UTF-8 text; a member
/// that cannot be decoded is reported but stays in the listing. Encrypted
/// members are skipped with a warning. An archive that cannot be opened at
/// all is an error.
pub fn read_archive(
    bytes: &[u8],
    suffixes: &SuffixMap,
    text_extensions: &[String],
) -> Result<ArchiveContents> {
    let shared: Arc<[u8]> = Arc::from(bytes);
    let mut archive = ZipArchive::new(Cursor::new(shared.clone()))?;
    let mut contents = ArchiveContents::default();

    for index in 0..archive.len() {
        let (path, is_dir, encrypted) = match archive.by_index_raw(index) {
            Ok(file) => (file.name().to_string(), file.is_dir(), file.encrypted()),
            Err(e) => {
                contents
                    .warnings
                    .push(format!("Could not read archive member #{}: {}", index, e));
                continue;
            }
        };
        if is_dir {
            continue;
        }
        if encrypted {
            warn!("Skipping encrypted archive member: {}", path);
            contents
                .warnings
                .push(format!("Skipped encrypted archive member: {}", path));
            continue;
        }

        if suffixes.is_source(&path) {
            match decode_member(&mut archive, index) {
                Ok(raw) => match String::from_utf8(raw) {
                    Ok(content) => contents.sources.push((path.clone(), content)),
                    Err(_) => contents
                        .warnings
                        .push(format!("File encoding error: {}", path)),
                },
                Err(e) => contents
                    .warnings
                    .push(format!("Could not read {}: {}", path, e)),
            }
        }

        contents.entries.push(ArchiveEntry {
            is_text: is_text_path(&path, text_extensions),
            path,
            data: MemberData::Stored {
                archive: shared.clone(),
                index,
            },
        });
    }

    Ok(contents)
}

/// Turn uploads into source units and, for archives, a project layout.
///
/// Source files that are not valid UTF-8 are skipped with a warning; the
/// archive member itself is still kept in the layout.
pub fn extract_uploads(
    uploads: &[Upload],
    suffixes: &SuffixMap,
    text_extensions: &[String],
) -> Extraction {
    let mut extraction = Extraction::default();
    let mut layout: Option<ProjectLayout> = None;

    for upload in uploads {
        if suffixes.is_source(&upload.name) {
            match String::from_utf8(upload.bytes.clone()) {
                Ok(content) => extraction
                    .units
                    .push(SourceUnit::new(upload.name.clone(), content)),
                Err(_) => extraction
                    .warnings
                    .push(format!("File encoding error: {}", upload.name)),
            }
        } else if is_zip_name(&upload.name) {
            let contents = match read_archive(&upload.bytes, suffixes, text_extensions) {
                Ok(contents) => contents,
                Err(e) => {
                    warn!("Failed to open archive {}: {}", upload.name, e);
                    extraction
                        .warnings
                        .push(format!("Could not open archive {}: {}", upload.name, e));
                    continue;
                }
            };
            extraction.warnings.extend(contents.warnings);
            debug!(
                "Archive {} has {} members",
                upload.name,
                contents.entries.len()
            );

            extraction
                .units
                .extend(contents.sources.into_iter().map(|(name, content)| SourceUnit {
                    name,
                    content,
                    archive: Some(upload.name.clone()),
                }));

            let layout = layout.get_or_insert_with(|| ProjectLayout {
                name: Some(strip_zip_suffix(&upload.name).to_string()),
                entries: Vec::new(),
            });
            layout.entries.extend(contents.entries);
        } else {
            extraction
                .warnings
                .push(format!("Unsupported file type: {}", upload.name));
        }
    }

    extraction.layout = layout;
    extraction
}

fn strip_zip_suffix(name: &str) -> &str {
    if is_zip_name(name) {
        &name[..name.len() - 4]
    } else {
        name
    }
}

/// Zip writer that refuses duplicate member names
struct ArchiveWriter {
    zip: ZipWriter<Cursor<Vec<u8>>>,
    written: HashSet<String>,
    warnings: Vec<String>,
    /// Opened source archives, keyed by buffer address
    sources: HashMap<usize, SharedArchive>,
}

impl ArchiveWriter {
    fn new() -> Self {
        Self {
            zip: ZipWriter::new(Cursor::new(Vec::new())),
            written: HashSet::new(),
            warnings: Vec::new(),
            sources: HashMap::new(),
        }
    }

    fn claim(&mut self, path: &str) -> bool {
        if self.written.insert(path.to_string()) {
            return true;
        }
        warn!("Skipping duplicate archive member: {}", path);
        self.warnings
            .push(format!("Skipped duplicate archive member: {}", path));
        false
    }

    fn write(&mut self, path: String, bytes: &[u8]) -> Result<()> {
        if !self.claim(&path) {
            return Ok(());
        }
        let options =
            SimpleFileOptions::default().compression_method(CompressionMethod::Deflated);
        self.zip.start_file(path, options)?;
        self.zip.write_all(bytes)?;
        Ok(())
    }

    /// Write a member back unchanged
    fn copy(&mut self, entry: &ArchiveEntry) -> Result<()> {
        let (archive, index) = match &entry.data {
            MemberData::Inline(bytes) => return self.write(entry.path.clone(), bytes),
            MemberData::Stored { archive, index } => (archive, *index),
        };
        if !self.claim(&entry.path) {
            return Ok(());
        }

        let key = Arc::as_ptr(archive) as *const u8 as usize;
        let source = match self.sources.entry(key) {
            Entry::Occupied(opened) => opened.into_mut(),
            Entry::Vacant(slot) => slot.insert(ZipArchive::new(Cursor::new(archive.clone()))?),
        };
        let file = source.by_index_raw(index)?;
        self.zip.raw_copy_file_rename(file, entry.path.as_str())?;
        Ok(())
    }

    fn finish(self) -> Result<Repackaged> {
        let cursor = self.zip.finish()?;
        Ok(Repackaged {
            bytes: cursor.into_inner(),
            warnings: self.warnings,
        })
    }
}

/// Rebuild the original archive with translated sources swapped in.
///
/// Members with a translation are written at their suffix-substituted path
/// with the translated text; every other member keeps its path and is copied
/// in its original compressed form. Translations with no matching member are
/// appended in order. When two members end up at the same path the first
/// one is kept.
pub fn repackage(
    original: &[ArchiveEntry],
    translations: &[Translation],
    suffixes: &SuffixMap,
) -> Result<Repackaged> {
    let by_source: HashMap<&str, &Translation> = translations
        .iter()
        .map(|t| (t.source_path.as_str(), t))
        .collect();
    let mut writer = ArchiveWriter::new();

    for entry in original {
        match by_source.get(entry.path.as_str()) {
            Some(translation) => writer.write(
                suffixes.target_path_or_same(&entry.path),
                translation.content.as_bytes(),
            )?,
            None => writer.copy(entry)?,
        }
    }

    let known: HashSet<&str> = original.iter().map(|e| e.path.as_str()).collect();
    for translation in translations {
        if known.contains(translation.source_path.as_str()) {
            continue;
        }
        writer.write(
            suffixes.target_path_or_same(&translation.source_path),
            translation.content.as_bytes(),
        )?;
    }

    writer.finish()
}

/// Archive of the translated members only
pub fn package_translations_only(
    translations: &[Translation],
    suffixes: &SuffixMap,
) -> Result<Repackaged> {
    repackage(&[], translations, suffixes)
}
