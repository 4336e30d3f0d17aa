//! Recaf's simple mapping format, one space separated line per element.
//!
//! ```text
//! a pkg/Named
//! a.b I count
//! a.c(I)V run
//! ```
//!
//! Fields may leave out their descriptor, methods always glue it to their name.
use std::io::{Read, Write};

use failure::Error;

use crate::error::UnsupportedOperation;
use crate::format::{self, ColumnFileReader};
use crate::util::{NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

#[inline]
pub fn read<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    read_with_namespaces(reader, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK, visitor)
}

pub fn read_with_namespaces<R: Read>(
    reader: R,
    src_namespace: &str,
    dst_namespace: &str,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    let mut reader = ColumnFileReader::new(reader, b'\t', b' ');
    let dst_namespaces = [dst_namespace.to_owned()];
    format::read_passes(&mut reader, visitor, MappingFlags::NEEDS_ELEMENT_UNIQUENESS, |reader, visitor| {
        format::visit_header(visitor, src_namespace, &dst_namespaces, &[])?;
        if visitor.visit_content()? {
            let mut state = RecafReader { last_class: None, visit_class: false };
            loop {
                if let Some(line) = reader.next_cols(true)? {
                    let trimmed = line.trim();
                    if !trimmed.is_empty() && !trimmed.starts_with('#') {
                        state.read_line(reader, &line, visitor)?;
                    }
                }
                if !reader.next_line(0)? {
                    break;
                }
            }
        }
        Ok(())
    })
}

struct RecafReader {
    last_class: Option<String>,
    visit_class: bool,
}
impl RecafReader {
    fn read_line<R: Read>(&mut self, reader: &ColumnFileReader<R>, line: &str, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        let parts: Vec<&str> = line.split(' ').collect();
        if parts.len() < 2 {
            return Err(reader.malformed("insufficient column count"))
        }
        let dot = match parts[0].rfind('.') {
            Some(dot) => dot,
            None => {
                let src_name = parts[0];
                self.visit_class = visitor.visit_class(src_name)?;
                if self.visit_class {
                    visitor.visit_dst_name(MappedElementKind::Class, 0, parts[1])?;
                    self.visit_class = visitor.visit_element_content(MappedElementKind::Class)?;
                }
                self.last_class = Some(src_name.into());
                return Ok(())
            }
        };
        let owner = &parts[0][..dot];
        if self.last_class.as_ref().map(String::as_str) != Some(owner) {
            self.visit_class = visitor.visit_class(owner)?
                && visitor.visit_element_content(MappedElementKind::Class)?;
            self.last_class = Some(owner.into());
        }
        if !self.visit_class {
            return Ok(())
        }
        let identifier = &parts[0][dot + 1..];
        let (kind, src_name, src_desc, dst_name) = if parts.len() >= 3 {
            (MappedElementKind::Field, identifier, Some(parts[1]), parts[2])
        } else {
            match identifier.rfind('(') {
                Some(desc_start) => {
                    let (name, desc) = identifier.split_at(desc_start);
                    (MappedElementKind::Method, name, Some(desc), parts[1])
                }
                None => (MappedElementKind::Field, identifier, None, parts[1]),
            }
        };
        let visit = match kind {
            MappedElementKind::Field => visitor.visit_field(src_name, src_desc)?,
            _ => visitor.visit_method(src_name, src_desc)?,
        };
        if visit {
            visitor.visit_dst_name(kind, 0, dst_name)?;
            visitor.visit_element_content(kind)?;
        }
        Ok(())
    }
}

/// Writes elements that have a destination name, fields with their descriptor if known
pub struct RecafSimpleFileWriter<W: Write> {
    writer: W,
    class_src_name: String,
    member_src_name: String,
    member_src_desc: Option<String>,
    dst_name: Option<String>,
}
impl<W: Write> RecafSimpleFileWriter<W> {
    pub fn new(writer: W) -> RecafSimpleFileWriter<W> {
        RecafSimpleFileWriter {
            writer,
            class_src_name: String::new(),
            member_src_name: String::new(),
            member_src_desc: None,
            dst_name: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn visit_member(&mut self, src_name: &str, src_desc: Option<&str>) {
        self.member_src_name = src_name.into();
        self.member_src_desc = src_desc.map(String::from);
        self.dst_name = None;
    }
}
impl<W: Write> MappingVisitor for RecafSimpleFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = src_name.into();
        self.dst_name = None;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.visit_member(src_name, src_desc);
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.visit_member(src_name, src_desc);
        Ok(true)
    }
    fn visit_method_arg(&mut self, _arg_position: Option<u32>, _lv_index: Option<u32>, _src_name: Option<&str>) -> Result<bool, Error> {
        Ok(false)
    }
    fn visit_method_var(
        &mut self,
        _lvt_row_index: Option<u32>,
        _lv_index: Option<u32>,
        _start_op_idx: Option<u32>,
        _end_op_idx: Option<u32>,
        _src_name: Option<&str>,
    ) -> Result<bool, Error> {
        Ok(false)
    }
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.close()?;
        Ok(true)
    }
    fn visit_dst_name(&mut self, _kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        if namespace == 0 {
            self.dst_name = Some(name.into());
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        let is_class = kind == MappedElementKind::Class;
        let dst_name = match self.dst_name.take() {
            Some(name) => name,
            None => return Ok(is_class),
        };
        match kind {
            MappedElementKind::Class => writeln!(self.writer, "{} {}", self.class_src_name, dst_name)?,
            MappedElementKind::Field => match self.member_src_desc {
                Some(ref desc) => writeln!(self.writer, "{}.{} {} {}", self.class_src_name, self.member_src_name, desc, dst_name)?,
                None => writeln!(self.writer, "{}.{} {}", self.class_src_name, self.member_src_name, dst_name)?,
            },
            MappedElementKind::Method => match self.member_src_desc {
                Some(ref desc) => writeln!(self.writer, "{}.{}{} {}", self.class_src_name, self.member_src_name, desc, dst_name)?,
                None => return Err(UnsupportedOperation::missing_desc(kind, &self.member_src_name).into()),
            },
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => {}
        }
        Ok(is_class)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for RecafSimpleFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    const SAMPLE: &str = "a pkg/Named\na.b I count\na.c(I)V run\na.d untyped\n";

    #[test]
    fn reads_sample() {
        let mut tree = MemoryMappingTree::new();
        read(format!("# comment\n{}", SAMPLE).as_bytes(), &mut tree).unwrap();
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("pkg/Named"));
        assert_eq!(class.field("b", Some("I")).unwrap().dst_name(0), Some("count"));
        assert_eq!(class.method("c", Some("(I)V")).unwrap().dst_name(0), Some("run"));
        let untyped = class.field("d", None).unwrap();
        assert_eq!(untyped.src_desc, None);
        assert_eq!(untyped.dst_name(0), Some("untyped"));
    }
    #[test]
    fn insufficient_columns() {
        let err = read(&b"a b\nlonely\n"[..], &mut MemoryMappingTree::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<crate::error::MalformedMapping>().unwrap().line, 2);
    }
    #[test]
    fn writes_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let mut writer = RecafSimpleFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "a pkg/Named\na.b I count\na.d untyped\na.c(I)V run\n");
    }
}
