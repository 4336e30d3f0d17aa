//! JOBF, a flat format with dotted class names and `=` between source and destination.
//!
//! ```text
//! c com.example.Named = Renamed
//! f com.example.Named.count:I = a
//! m com.example.Named.run(I)V = b
//! ```
//!
//! Classes can only be renamed within their package.
use std::io::{Read, Write};

use failure::Error;

use crate::format::{self, ColumnFileReader};
use crate::util::{self, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
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
            let mut last_class: Option<String> = None;
            let mut visit_last_class = false;
            loop {
                read_line(reader, &mut last_class, &mut visit_last_class, visitor)?;
                if !reader.next_line(0)? {
                    break;
                }
            }
        }
        Ok(())
    })
}

fn read_separator<R: Read>(reader: &mut ColumnFileReader<R>) -> Result<(), Error> {
    if !reader.next_col_matching("=")? {
        return Err(reader.malformed("missing separator, expected \" = \""))
    }
    Ok(())
}

fn read_line<R: Read>(
    reader: &mut ColumnFileReader<R>,
    last_class: &mut Option<String>,
    visit_last_class: &mut bool,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    if reader.next_col_matching("c")? {
        let src_name = util::to_internal(&reader.require_col(false, "source class name")?);
        *visit_last_class = visitor.visit_class(&src_name)?;
        if *visit_last_class {
            read_separator(reader)?;
            let simple_name = reader.require_col(false, "destination class name")?;
            let package_end = src_name.rfind('/').map_or(0, |pos| pos + 1);
            let dst_name = format!("{}{}", &src_name[..package_end], simple_name);
            visitor.visit_dst_name(MappedElementKind::Class, 0, &dst_name)?;
            *visit_last_class = visitor.visit_element_content(MappedElementKind::Class)?;
        }
        *last_class = Some(src_name);
        return Ok(())
    }
    let kind = if reader.next_col_matching("f")? {
        MappedElementKind::Field
    } else if reader.next_col_matching("m")? {
        MappedElementKind::Method
    } else {
        // packages can't be represented
        return Ok(())
    };
    let src = reader.require_col(false, "source member")?;
    let is_field = kind == MappedElementKind::Field;
    let name_start = match src.rfind('.') {
        Some(pos) if pos > 0 && pos < src.len() - 1 => pos,
        _ => return Err(reader.malformed(format!("invalid source member {:?}", src))),
    };
    let desc_start = match src.rfind(if is_field { ':' } else { '(' }) {
        Some(pos) if pos > name_start + 1 && pos < src.len() - 1 => pos,
        _ => return Err(reader.malformed(format!("invalid source member {:?}", src))),
    };
    read_separator(reader)?;
    let dst_name = reader.require_col(false, "destination member name")?;
    let owner = util::to_internal(&src[..name_start]);
    if last_class.as_ref() != Some(&owner) {
        *visit_last_class = visitor.visit_class(&owner)?
            && visitor.visit_element_content(MappedElementKind::Class)?;
        *last_class = Some(owner);
    }
    if !*visit_last_class {
        return Ok(())
    }
    let name = &src[name_start + 1..desc_start];
    let desc = if is_field { &src[desc_start + 1..] } else { &src[desc_start..] };
    let visit = if is_field {
        visitor.visit_field(name, Some(desc))?
    } else {
        visitor.visit_method(name, Some(desc))?
    };
    if visit {
        visitor.visit_dst_name(kind, 0, &dst_name)?;
        visitor.visit_element_content(kind)?;
    }
    Ok(())
}

/// Writes JOBF, skipping class renames that move a class into another package
pub struct JobfFileWriter<W: Write> {
    writer: W,
    class_src_name: String,
    member_src_name: String,
    member_src_desc: String,
    dst_name: Option<String>,
}
impl<W: Write> JobfFileWriter<W> {
    pub fn new(writer: W) -> JobfFileWriter<W> {
        JobfFileWriter {
            writer,
            class_src_name: String::new(),
            member_src_name: String::new(),
            member_src_desc: String::new(),
            dst_name: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn visit_member(&mut self, src_name: &str, src_desc: Option<&str>) -> bool {
        match src_desc {
            Some(desc) => {
                self.member_src_name = src_name.into();
                self.member_src_desc = desc.into();
                self.dst_name = None;
                true
            }
            None => false,
        }
    }
}
impl<W: Write> MappingVisitor for JobfFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = util::to_dotted(src_name);
        self.dst_name = None;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        Ok(self.visit_member(src_name, src_desc))
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        Ok(self.visit_member(src_name, src_desc))
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
            MappedElementKind::Class => {
                let dotted_dst = util::to_dotted(&dst_name);
                let src_package = self.class_src_name.rfind('.').map_or(0, |pos| pos + 1);
                let dst_package = dotted_dst.rfind('.').map_or(0, |pos| pos + 1);
                if self.class_src_name[..src_package] == dotted_dst[..dst_package] {
                    writeln!(self.writer, "c {} = {}", self.class_src_name, &dotted_dst[dst_package..])?;
                }
            }
            MappedElementKind::Field => {
                writeln!(self.writer, "f {}.{}:{} = {}", self.class_src_name, self.member_src_name, self.member_src_desc, dst_name)?;
            }
            MappedElementKind::Method => {
                writeln!(self.writer, "m {}.{}{} = {}", self.class_src_name, self.member_src_name, self.member_src_desc, dst_name)?;
            }
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => {}
        }
        Ok(is_class)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for JobfFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    const SAMPLE: &str = "p com.example = org.example\n\
        c com.example.Named = Renamed\n\
        f com.example.Named.count:I = a\n\
        m com.example.Named.run(Lcom/example/Named;)V = b\n\
        f Top.value:J = c\n";

    #[test]
    fn reads_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let class = tree.class("com/example/Named").unwrap();
        assert_eq!(class.dst_name(0), Some("com/example/Renamed"));
        assert_eq!(class.field("count", Some("I")).unwrap().dst_name(0), Some("a"));
        assert_eq!(class.method("run", Some("(Lcom/example/Named;)V")).unwrap().dst_name(0), Some("b"));
        let top = tree.class("Top").unwrap();
        assert_eq!(top.dst_name(0), None);
        assert_eq!(top.field("value", Some("J")).unwrap().dst_name(0), Some("c"));
    }
    #[test]
    fn missing_separator() {
        let err = read(&b"c a.B C\n"[..], &mut MemoryMappingTree::new()).unwrap_err();
        assert!(err.downcast_ref::<crate::error::MalformedMapping>().is_some());
    }
    #[test]
    fn writes_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let mut writer = JobfFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        // packages aren't kept
        let expected = SAMPLE.lines().skip(1).map(|line| format!("{}\n", line)).collect::<String>();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), expected);
    }
    #[test]
    fn skips_package_moves() {
        let mut tree = MemoryMappingTree::new();
        tree.visit_namespaces("source", &["target".to_string()]).unwrap();
        tree.visit_class("a/B").unwrap();
        tree.visit_dst_name(MappedElementKind::Class, 0, "c/D").unwrap();
        let mut writer = JobfFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert!(writer.into_inner().is_empty());
    }
}
