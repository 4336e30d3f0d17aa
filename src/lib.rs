//! Reading, writing and transforming java deobfuscation mappings.
//!
//! Every reader pushes its content into a [`MappingVisitor`], so formats can be converted by
//! handing one format's writer to another format's reader. When a consumer needs guarantees a
//! format can't give while streaming, the content is buffered in a [`MemoryMappingTree`] first.
//!
//! ```no_run
//! use mapping_io::{reader, writer, MappingFormat};
//! # fn main() -> Result<(), failure::Error> {
//! let mut out = writer::create(std::io::stdout(), MappingFormat::Tiny2File)?;
//! reader::read(std::io::stdin(), None, &mut out)?;
//! # Ok(())
//! # }
//! ```
pub mod adapter;
pub mod error;
pub mod format;
pub mod reader;
pub mod tree;
pub mod util;
pub mod visitor;
pub mod writer;

pub use crate::format::{FeaturePresence, FormatFeatures, MappingFormat};
pub use crate::tree::MemoryMappingTree;
pub use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
pub use crate::writer::MappingWriter;
