//! The supported mapping formats and their readers and writers.
//!
//! Formats differ along a few independent axes, described by [`FormatFeatures`]:
//! whether they declare namespaces, whether members carry descriptors,
//! how classes are nested and whether they live in one file or a directory.
use std::fmt::{self, Display, Formatter};
use std::io::Read;
use std::str::FromStr;

use failure::Error;
use failure_derive::Fail;
use log::trace;
use serde::de::{self, Deserialize, Deserializer};
use serde::ser::{Serialize, Serializer};
use serde_derive::Serialize;

use crate::error::VisitorContractViolation;
use crate::tree::MemoryMappingTree;
use crate::visitor::{MappingFlags, MappingVisitor};

pub mod column;
pub mod tiny;
pub mod enigma;
pub mod srg;
pub mod tsrg;
pub mod proguard;
pub mod jobf;
pub mod recaf;
pub mod migration_map;

pub use self::column::ColumnFileReader;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MappingFormat {
    /// Tiny v1, tab separated with one line per element
    TinyFile,
    /// Tiny v2, tab separated and nested by indentation
    Tiny2File,
    EnigmaFile,
    /// A directory of enigma files, one per outermost class
    EnigmaDir,
    SrgFile,
    /// SRG with field descriptors
    XsrgFile,
    JamFile,
    CsrgFile,
    TsrgFile,
    Tsrg2File,
    ProguardFile,
    /// IntelliJ IDEA migration map XML
    IntellijMigrationMapFile,
    RecafSimpleFile,
    JobfFile,
}
impl MappingFormat {
    pub const ALL: [MappingFormat; 14] = [
        MappingFormat::TinyFile,
        MappingFormat::Tiny2File,
        MappingFormat::EnigmaFile,
        MappingFormat::EnigmaDir,
        MappingFormat::SrgFile,
        MappingFormat::XsrgFile,
        MappingFormat::JamFile,
        MappingFormat::CsrgFile,
        MappingFormat::TsrgFile,
        MappingFormat::Tsrg2File,
        MappingFormat::ProguardFile,
        MappingFormat::IntellijMigrationMapFile,
        MappingFormat::RecafSimpleFile,
        MappingFormat::JobfFile,
    ];
    /// A human readable name
    pub fn name(self) -> &'static str {
        match self {
            MappingFormat::TinyFile => "Tiny file",
            MappingFormat::Tiny2File => "Tiny v2 file",
            MappingFormat::EnigmaFile => "Enigma file",
            MappingFormat::EnigmaDir => "Enigma directory",
            MappingFormat::SrgFile => "SRG file",
            MappingFormat::XsrgFile => "XSRG file",
            MappingFormat::JamFile => "JAM file",
            MappingFormat::CsrgFile => "CSRG file",
            MappingFormat::TsrgFile => "TSRG file",
            MappingFormat::Tsrg2File => "TSRG v2 file",
            MappingFormat::ProguardFile => "ProGuard file",
            MappingFormat::IntellijMigrationMapFile => "IntelliJ migration map file",
            MappingFormat::RecafSimpleFile => "Recaf Simple file",
            MappingFormat::JobfFile => "JOBF file",
        }
    }
    /// The extension files of this format usually have, `None` for directories
    pub fn file_ext(self) -> Option<&'static str> {
        Some(match self {
            MappingFormat::TinyFile | MappingFormat::Tiny2File => "tiny",
            MappingFormat::EnigmaFile => "mapping",
            MappingFormat::EnigmaDir => return None,
            MappingFormat::SrgFile => "srg",
            MappingFormat::XsrgFile => "xsrg",
            MappingFormat::JamFile => "jam",
            MappingFormat::CsrgFile => "csrg",
            MappingFormat::TsrgFile | MappingFormat::Tsrg2File => "tsrg",
            MappingFormat::ProguardFile => "txt",
            MappingFormat::IntellijMigrationMapFile => "xml",
            MappingFormat::RecafSimpleFile => "txt",
            MappingFormat::JobfFile => "jobf",
        })
    }
    #[inline]
    pub fn has_single_file(self) -> bool {
        self != MappingFormat::EnigmaDir
    }
    #[inline]
    pub fn has_namespaces(self) -> bool {
        self.features().has_namespaces
    }
    pub fn features(self) -> FormatFeatures {
        use self::FeaturePresence::*;
        let base = FormatFeatures {
            has_namespaces: false,
            field_descs: Absent,
            method_descs: Required,
            args: false,
            vars: false,
            comments: false,
            metadata: false,
        };
        match self {
            MappingFormat::TinyFile => FormatFeatures {
                has_namespaces: true, field_descs: Required, metadata: true, ..base
            },
            MappingFormat::Tiny2File => FormatFeatures {
                has_namespaces: true, field_descs: Required, args: true, vars: true,
                comments: true, metadata: true, ..base
            },
            MappingFormat::EnigmaFile | MappingFormat::EnigmaDir => FormatFeatures {
                field_descs: Required, args: true, comments: true, ..base
            },
            MappingFormat::SrgFile | MappingFormat::CsrgFile | MappingFormat::TsrgFile => base,
            MappingFormat::XsrgFile | MappingFormat::ProguardFile | MappingFormat::JobfFile => FormatFeatures {
                field_descs: Required, ..base
            },
            MappingFormat::JamFile => FormatFeatures { field_descs: Required, args: true, ..base },
            MappingFormat::Tsrg2File => FormatFeatures {
                has_namespaces: true, field_descs: Optional, args: true, ..base
            },
            MappingFormat::IntellijMigrationMapFile => FormatFeatures {
                method_descs: Absent, metadata: true, ..base
            },
            MappingFormat::RecafSimpleFile => FormatFeatures { field_descs: Optional, ..base },
        }
    }
    #[inline]
    pub fn id(self) -> &'static str {
        match self {
            MappingFormat::TinyFile => "tiny",
            MappingFormat::Tiny2File => "tiny2",
            MappingFormat::EnigmaFile => "enigma",
            MappingFormat::EnigmaDir => "enigma_dir",
            MappingFormat::SrgFile => "srg",
            MappingFormat::XsrgFile => "xsrg",
            MappingFormat::JamFile => "jam",
            MappingFormat::CsrgFile => "csrg",
            MappingFormat::TsrgFile => "tsrg",
            MappingFormat::Tsrg2File => "tsrg2",
            MappingFormat::ProguardFile => "proguard",
            MappingFormat::IntellijMigrationMapFile => "migration_map",
            MappingFormat::RecafSimpleFile => "recaf_simple",
            MappingFormat::JobfFile => "jobf",
        }
    }
    pub fn from_id(id: &str) -> Option<MappingFormat> {
        MappingFormat::ALL.iter().cloned().find(|format| format.id() == id)
    }
}
impl FromStr for MappingFormat {
    type Err = InvalidFormatId;

    #[inline]
    fn from_str(s: &str) -> Result<MappingFormat, InvalidFormatId> {
        MappingFormat::from_id(s).ok_or_else(|| InvalidFormatId(s.into()))
    }
}
impl Display for MappingFormat {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.id())
    }
}
impl Serialize for MappingFormat {
    #[inline]
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error> where
        S: Serializer {
        serializer.serialize_str(self.id())
    }
}
impl<'de> Deserialize<'de> for MappingFormat {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error> where
        D: Deserializer<'de> {
        struct MappingFormatVisitor;
        impl<'de> de::Visitor<'de> for MappingFormatVisitor {
            type Value = MappingFormat;

            fn expecting(&self, formatter: &mut Formatter) -> fmt::Result {
                formatter.write_str("a mapping format id")
            }

            #[inline]
            fn visit_str<E>(self, s: &str) -> Result<MappingFormat, E> where
                E: de::Error {
                MappingFormat::from_str(s).map_err(E::custom)
            }
        }
        deserializer.deserialize_str(MappingFormatVisitor)
    }
}

#[derive(Debug, Fail)]
#[fail(display = "Invalid mapping format {:?}", _0)]
pub struct InvalidFormatId(pub String);

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FeaturePresence {
    Absent,
    Optional,
    Required,
}

/// What a format is able to express
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash, Serialize)]
pub struct FormatFeatures {
    /// Whether the format names its namespaces instead of using `source`/`target`
    pub has_namespaces: bool,
    pub field_descs: FeaturePresence,
    pub method_descs: FeaturePresence,
    pub args: bool,
    pub vars: bool,
    pub comments: bool,
    pub metadata: bool,
}

/// Drives complete passes over a column based input until the visitor is satisfied.
///
/// `pass` visits header and content, this takes care of `visit_end` and replaying.
/// Visitors declaring any of `tree_flags` are fed from a [`MemoryMappingTree`] instead,
/// since the format can't satisfy them while streaming.
pub(crate) fn read_passes<R, F>(
    reader: &mut ColumnFileReader<R>,
    visitor: &mut dyn MappingVisitor,
    tree_flags: MappingFlags,
    mut pass: F,
) -> Result<(), Error>
    where R: Read, F: FnMut(&mut ColumnFileReader<R>, &mut dyn MappingVisitor) -> Result<(), Error> {
    let flags = visitor.flags();
    if flags.intersects(tree_flags) {
        trace!("Buffering through a mapping tree for {:?}", flags & tree_flags);
        let mut tree = MemoryMappingTree::new();
        pass(reader, &mut tree as &mut dyn MappingVisitor)?;
        tree.visit_end()?;
        return tree.accept(visitor)
    }
    let replayable = flags.contains(MappingFlags::NEEDS_MULTIPLE_PASSES);
    if replayable {
        reader.mark();
    }
    loop {
        pass(reader, &mut *visitor)?;
        if visitor.visit_end()? {
            return Ok(())
        }
        if !replayable {
            return Err(VisitorContractViolation::repeated_visitation().into())
        }
        trace!("Replaying input for another pass");
        reader.reset();
    }
}

/// Visits namespaces and metadata if the visitor wants the header
pub(crate) fn visit_header(
    visitor: &mut dyn MappingVisitor,
    src_namespace: &str,
    dst_namespaces: &[String],
    metadata: &[(String, Option<String>)],
) -> Result<(), Error> {
    if visitor.visit_header()? {
        visitor.visit_namespaces(src_namespace, dst_namespaces)?;
        for (key, value) in metadata {
            visitor.visit_metadata(key, value.as_ref().map(String::as_str))?;
        }
    }
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn parse_format_ids() {
        for &format in MappingFormat::ALL.iter() {
            assert_eq!(format, format.id().parse().unwrap());
            assert_eq!(format!("{}", format), format.id());
        }
        assert_eq!(MappingFormat::Tsrg2File, "tsrg2".parse().unwrap());
        assert!("tiny3".parse::<MappingFormat>().is_err());
    }
    #[test]
    fn format_features() {
        assert!(MappingFormat::Tiny2File.features().comments);
        assert!(!MappingFormat::SrgFile.has_namespaces());
        assert_eq!(MappingFormat::Tsrg2File.features().field_descs, FeaturePresence::Optional);
        assert!(!MappingFormat::EnigmaDir.has_single_file());
        assert_eq!(MappingFormat::EnigmaDir.file_ext(), None);
    }
    #[test]
    fn serialized_as_id() {
        assert_eq!(::serde_json::to_string(&MappingFormat::Tiny2File).unwrap(), "\"tiny2\"");
        let format: MappingFormat = ::serde_json::from_str("\"jam\"").unwrap();
        assert_eq!(format, MappingFormat::JamFile);
        assert!(::serde_json::from_str::<MappingFormat>("\"nope\"").is_err());
        let features = ::serde_json::to_value(MappingFormat::SrgFile.features()).unwrap();
        assert_eq!(features["method_descs"], "required");
    }
}
