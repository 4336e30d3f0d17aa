//! Writer construction for every format.
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use failure::Error;
use log::debug;

use crate::error::UnsupportedOperation;
use crate::format::enigma::{EnigmaDirWriter, EnigmaFileWriter};
use crate::format::jobf::JobfFileWriter;
use crate::format::migration_map::MigrationMapFileWriter;
use crate::format::proguard::ProGuardFileWriter;
use crate::format::recaf::RecafSimpleFileWriter;
use crate::format::srg::{JamFileWriter, SrgFileWriter};
use crate::format::tiny::{Tiny1FileWriter, Tiny2FileWriter};
use crate::format::tsrg::{CsrgFileWriter, TsrgFileWriter};
use crate::format::MappingFormat;
use crate::visitor::MappingVisitor;

/// A visitor that produces a mapping document.
///
/// Writers finish their output in `visit_end`, so a complete visitation needs no further calls.
/// `close` flushes whatever was written so far, which is useful after a visitation failed.
pub trait MappingWriter: MappingVisitor {
    fn close(&mut self) -> Result<(), Error>;
}
impl<W: MappingWriter + ?Sized> MappingWriter for Box<W> {
    #[inline]
    fn close(&mut self) -> Result<(), Error> {
        (**self).close()
    }
}

/// Creates a writer for a single file format
pub fn create<'a, W: Write + 'a>(writer: W, format: MappingFormat) -> Result<Box<dyn MappingWriter + 'a>, Error> {
    debug!("Creating {} writer", format.name());
    Ok(match format {
        MappingFormat::TinyFile => Box::new(Tiny1FileWriter::new(writer)),
        MappingFormat::Tiny2File => Box::new(Tiny2FileWriter::new(writer, false)),
        MappingFormat::EnigmaFile => Box::new(EnigmaFileWriter::new(writer)),
        MappingFormat::SrgFile => Box::new(SrgFileWriter::new(writer, false)),
        MappingFormat::XsrgFile => Box::new(SrgFileWriter::new(writer, true)),
        MappingFormat::JamFile => Box::new(JamFileWriter::new(writer)),
        MappingFormat::CsrgFile => Box::new(CsrgFileWriter::new(writer)),
        MappingFormat::TsrgFile => Box::new(TsrgFileWriter::new(writer, false)),
        MappingFormat::Tsrg2File => Box::new(TsrgFileWriter::new(writer, true)),
        MappingFormat::ProguardFile => Box::new(ProGuardFileWriter::new(writer)),
        MappingFormat::IntellijMigrationMapFile => Box::new(MigrationMapFileWriter::new(writer)),
        MappingFormat::RecafSimpleFile => Box::new(RecafSimpleFileWriter::new(writer)),
        MappingFormat::JobfFile => Box::new(JobfFileWriter::new(writer)),
        MappingFormat::EnigmaDir => return Err(UnsupportedOperation::new(
            format!("{} can't be written to a single stream", format.name())
        ).into()),
    })
}

/// Creates a writer for the file or directory at `path`, creating parent directories as needed
pub fn create_path(path: &Path, format: MappingFormat) -> Result<Box<dyn MappingWriter>, Error> {
    if !format.has_single_file() {
        return Ok(Box::new(EnigmaDirWriter::new(path.to_owned(), true)?))
    }
    if let Some(parent) = path.parent() {
        if !parent.as_os_str().is_empty() {
            fs::create_dir_all(parent)?;
        }
    }
    let file = BufWriter::new(File::create(path)?);
    create(file, format)
}
