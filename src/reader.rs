//! Format detection and reading by format.
//!
//! Streams are sniffed by their first [`DETECT_HEADER_LEN`] bytes, which are then replayed
//! in front of the rest of the stream, so detection never needs a seekable source.
use std::borrow::Cow;
use std::ffi::OsStr;
use std::fs::File;
use std::io::{BufReader, Cursor, Read};
use std::path::Path;

use failure::Error;
use log::debug;

use crate::error::{UnknownMappingFormat, UnsupportedOperation};
use crate::format::{enigma, jobf, migration_map, proguard, recaf, srg, tiny, tsrg, MappingFormat};
use crate::util::{NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::MappingVisitor;

/// How many bytes are inspected to detect a format
pub const DETECT_HEADER_LEN: usize = 4096;

/// Detects the format of a header without any file extension hint
#[inline]
pub fn detect_format(header: &[u8]) -> Option<MappingFormat> {
    detect_format_with_ext(header, None)
}

/// Detects the format of the start of a mapping file.
///
/// The extension tells apart formats with otherwise identical content, like CSRG and TSRG.
/// Returns `None` instead of guessing when no rule matches.
pub fn detect_format_with_ext(header: &[u8], ext: Option<&str>) -> Option<MappingFormat> {
    if header.len() < 3 {
        return None
    }
    match &header[..3] {
        b"v1\t" => return Some(MappingFormat::TinyFile),
        b"tin" => return Some(MappingFormat::Tiny2File),
        b"tsr" => return Some(MappingFormat::Tsrg2File),
        b"CLA" => return Some(MappingFormat::EnigmaFile),
        b"PK:" | b"CL:" | b"FD:" | b"MD:" => return Some(detect_srg_variant(header, ext)),
        b"CL " | b"FD " | b"MD " | b"MP " => return Some(MappingFormat::JamFile),
        _ => {}
    }
    let text = String::from_utf8_lossy(header);
    if text.contains("<migrationMap>") {
        Some(MappingFormat::IntellijMigrationMapFile)
    } else if ["p ", "c ", "f ", "m "].iter().any(|prefix| text.starts_with(prefix)) && text.contains(" = ") {
        Some(MappingFormat::JobfFile)
    } else if text.contains(" -> ") {
        Some(MappingFormat::ProguardFile)
    } else if text.contains("\n\t") {
        Some(MappingFormat::TsrgFile)
    } else if ext == MappingFormat::CsrgFile.file_ext() {
        Some(MappingFormat::CsrgFile)
    } else {
        None
    }
}

/// XSRG has two more columns in field lines
fn detect_srg_variant(header: &[u8], ext: Option<&str>) -> MappingFormat {
    let text = String::from_utf8_lossy(header);
    let blank_or_comment = |column: &str| column.is_empty() || column.starts_with('#');
    match text.lines().find(|line| line.starts_with("FD:")) {
        Some(line) => {
            let columns: Vec<&str> = line.split(' ').collect();
            if columns.len() < 5 || blank_or_comment(columns[3]) || blank_or_comment(columns[4]) {
                MappingFormat::SrgFile
            } else {
                MappingFormat::XsrgFile
            }
        }
        None if ext == MappingFormat::XsrgFile.file_ext() => MappingFormat::XsrgFile,
        None => MappingFormat::SrgFile,
    }
}

/// Reads the detection header of a stream, returning it and a stream starting over from the beginning
fn sniff<R: Read>(mut reader: R) -> Result<(Vec<u8>, impl Read), Error> {
    let mut header = Vec::with_capacity(DETECT_HEADER_LEN);
    reader.by_ref().take(DETECT_HEADER_LEN as u64).read_to_end(&mut header)?;
    let replay = Cursor::new(header.clone()).chain(reader);
    Ok((header, replay))
}

#[inline]
fn extension(path: &Path) -> Option<Cow<str>> {
    path.extension().map(OsStr::to_string_lossy)
}

/// Detects the format of a file, or a directory of enigma mappings
pub fn detect_path_format(path: &Path) -> Result<Option<MappingFormat>, Error> {
    if path.is_dir() {
        let found = !enigma::mapping_files(path)?.is_empty();
        debug!("Directory {} contains enigma mappings: {}", path.display(), found);
        return Ok(if found { Some(MappingFormat::EnigmaDir) } else { None })
    }
    let mut header = Vec::with_capacity(DETECT_HEADER_LEN);
    File::open(path)?.take(DETECT_HEADER_LEN as u64).read_to_end(&mut header)?;
    let ext = extension(path);
    let format = detect_format_with_ext(&header, ext.as_ref().map(|ext| &**ext));
    debug!("Detected {:?} for {}", format, path.display());
    Ok(format)
}

fn require_single_file(format: MappingFormat) -> Result<(), Error> {
    if !format.has_single_file() {
        return Err(UnsupportedOperation::new(format!(
            "{} can't be read from a stream, use the path based functions", format.name()
        )).into())
    }
    Ok(())
}

fn fallback_namespaces() -> Vec<String> {
    vec![NS_SOURCE_FALLBACK.to_owned(), NS_TARGET_FALLBACK.to_owned()]
}

/// The namespaces of a stream, source first, detecting the format if not given
pub fn namespaces<R: Read>(reader: R, format: Option<MappingFormat>) -> Result<Vec<String>, Error> {
    let (format, reader) = match format {
        Some(format) => (format, Box::new(reader) as Box<dyn Read>),
        None => {
            let (header, reader) = sniff(reader)?;
            let format = detect_format(&header).ok_or(UnknownMappingFormat)?;
            (format, Box::new(reader) as Box<dyn Read>)
        }
    };
    if !format.has_namespaces() {
        return Ok(fallback_namespaces())
    }
    require_single_file(format)?;
    match format {
        MappingFormat::TinyFile => tiny::v1_namespaces(reader),
        MappingFormat::Tiny2File => tiny::v2_namespaces(reader),
        MappingFormat::Tsrg2File => tsrg::namespaces(reader),
        _ => Ok(fallback_namespaces()),
    }
}

/// The namespaces of a file or directory, source first
pub fn path_namespaces(path: &Path, format: Option<MappingFormat>) -> Result<Vec<String>, Error> {
    let format = match format {
        Some(format) => format,
        None => detect_path_format(path)?.ok_or(UnknownMappingFormat)?,
    };
    if !format.has_namespaces() {
        return Ok(fallback_namespaces())
    }
    namespaces(BufReader::new(File::open(path)?), Some(format))
}

/// Reads a stream into `visitor`, detecting the format if not given.
///
/// An explicit format is always used as given, a header that looks like another format is only logged.
pub fn read<R: Read>(reader: R, format: Option<MappingFormat>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let (header, reader) = sniff(reader)?;
    let detected = detect_format(&header);
    let format = match format {
        Some(format) => {
            if let Some(detected) = detected.filter(|&detected| detected != format) {
                debug!("Reading {} although the header looks like {}", format.name(), detected.name());
            }
            format
        }
        None => {
            let format = detected.ok_or(UnknownMappingFormat)?;
            debug!("Detected {} from stream header", format.name());
            format
        }
    };
    read_format(reader, format, visitor)
}

fn read_format<R: Read>(reader: R, format: MappingFormat, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    debug!("Reading {}", format.name());
    match format {
        MappingFormat::TinyFile => tiny::read_v1(reader, visitor),
        MappingFormat::Tiny2File => tiny::read_v2(reader, visitor),
        MappingFormat::EnigmaFile => enigma::read(reader, visitor),
        MappingFormat::SrgFile | MappingFormat::XsrgFile => srg::read(reader, visitor),
        MappingFormat::JamFile => srg::read_jam(reader, visitor),
        MappingFormat::CsrgFile | MappingFormat::TsrgFile | MappingFormat::Tsrg2File => tsrg::read(reader, visitor),
        MappingFormat::ProguardFile => proguard::read(reader, visitor),
        MappingFormat::IntellijMigrationMapFile => migration_map::read(reader, visitor),
        MappingFormat::RecafSimpleFile => recaf::read(reader, visitor),
        MappingFormat::JobfFile => jobf::read(reader, visitor),
        MappingFormat::EnigmaDir => require_single_file(format),
    }
}

/// Reads a file or directory into `visitor`, detecting the format if not given
pub fn read_path(path: &Path, format: Option<MappingFormat>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let format = match format {
        Some(format) => format,
        None => detect_path_format(path)?.ok_or(UnknownMappingFormat)?,
    };
    if format.has_single_file() {
        read_format(BufReader::new(File::open(path)?), format, visitor)
    } else {
        debug!("Reading {} from {}", format.name(), path.display());
        enigma::read_dir(path, visitor)
    }
}
