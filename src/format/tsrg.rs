//! CSRG, TSRG and TSRG v2.
//!
//! TSRG nests members below their class, indented by a tab:
//!
//! ```text
//! a pkg/Named
//! 	b count
//! 	c (I)V run
//! ```
//!
//! TSRG v2 declares namespaces in a `tsrg2` header, may give field descriptors
//! and maps parameters on a second indentation level.
//! CSRG is flat, repeating the owner on every member line, and is told apart line by line.
use std::io::{Read, Write};

use failure::Error;

use crate::error::UnsupportedOperation;
use crate::format::{self, ColumnFileReader, MappingFormat};
use crate::util::{NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

#[inline]
fn columns<R: Read>(reader: R) -> ColumnFileReader<R> {
    ColumnFileReader::new(reader, b'\t', b' ')
}

/// The namespaces of a TSRG v2 header, or the fallback namespaces for the older variants
pub fn namespaces<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let mut reader = columns(reader);
    if reader.next_col_matching("tsrg2")? {
        let mut namespaces = Vec::new();
        while let Some(namespace) = reader.next_col(false)? {
            namespaces.push(namespace);
        }
        Ok(namespaces)
    } else {
        Ok(vec![NS_SOURCE_FALLBACK.into(), NS_TARGET_FALLBACK.into()])
    }
}

#[inline]
pub fn read<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    read_with_namespaces(reader, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK, visitor)
}

/// Reads any of the three variants, the namespaces only applying to those without a header
pub fn read_with_namespaces<R: Read>(
    reader: R,
    src_namespace: &str,
    dst_namespace: &str,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    let mut reader = columns(reader);
    let (format, src_namespace, dst_namespaces) = if reader.next_col_matching("tsrg2")? {
        let src_namespace = reader.require_col(false, "source namespace in TSRG v2 header")?;
        let mut dst_namespaces = Vec::new();
        while !reader.is_at_eol() {
            dst_namespaces.push(reader.require_col(false, "destination namespace in TSRG v2 header")?);
        }
        reader.next_line(0)?;
        (MappingFormat::Tsrg2File, src_namespace, dst_namespaces)
    } else {
        (MappingFormat::TsrgFile, src_namespace.to_owned(), vec![dst_namespace.to_owned()])
    };
    // CSRG may repeat owners anywhere, which a TSRG v2 header rules out
    let tree_flags = if format == MappingFormat::Tsrg2File {
        MappingFlags::empty()
    } else {
        MappingFlags::NEEDS_ELEMENT_UNIQUENESS
    };
    format::read_passes(&mut reader, visitor, tree_flags, |reader, visitor| {
        format::visit_header(visitor, &src_namespace, &dst_namespaces, &[])?;
        if visitor.visit_content()? {
            let mut state = TsrgReader {
                format,
                dst_count: dst_namespaces.len(),
                last_class: None,
                visit_last_class: false,
            };
            loop {
                if !reader.has_extra_indents()? {
                    state.read_line(reader, visitor)?;
                }
                if !reader.next_line(0)? {
                    break;
                }
            }
        }
        Ok(())
    })
}

struct TsrgReader {
    format: MappingFormat,
    dst_count: usize,
    /// The owner of the last CSRG member
    last_class: Option<String>,
    visit_last_class: bool,
}
impl TsrgReader {
    fn read_line<R: Read>(&mut self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        let line = match reader.peek_cols(false)? {
            Some(line) => line,
            None => return Ok(()),
        };
        if line.is_empty() {
            return Ok(())
        }
        let parts = split_keeping_spaces(&line);
        if self.format != MappingFormat::Tsrg2File && parts.len() >= 4 && !parts[3].starts_with('#') {
            self.format = MappingFormat::CsrgFile;
            return self.read_csrg_line(reader, &parts, visitor)
        }
        let src_name = match reader.next_col(false)? {
            Some(ref name) if name.ends_with('/') => return Ok(()),
            Some(name) => name,
            None => return Ok(()),
        };
        if src_name.is_empty() {
            return Err(reader.malformed("missing source class name"))
        }
        self.visit_last_class = visitor.visit_class(&src_name)?;
        self.last_class = Some(src_name);
        if self.visit_last_class {
            self.visit_last_class = self.read_class(reader, visitor)?;
        }
        Ok(())
    }
    /// A CSRG line, `parts` alternating between names and the spaces separating them
    fn read_csrg_line<R: Read>(&mut self, reader: &ColumnFileReader<R>, parts: &[&str], visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        let class_name = parts[0];
        if class_name.is_empty() {
            return Err(reader.malformed("missing source class name"))
        }
        if self.last_class.as_ref().map(String::as_str) != Some(class_name) {
            self.last_class = Some(class_name.into());
            self.visit_last_class = visitor.visit_class(class_name)?
                && visitor.visit_element_content(MappedElementKind::Class)?;
        }
        if !self.visit_last_class {
            return Ok(())
        }
        let valid = |name: &&str| !name.is_empty() && !name.starts_with('#');
        if parts.len() >= 6 && !parts[5].starts_with('#') {
            let dst_name = parts.get(6).cloned().filter(valid)
                .ok_or_else(|| reader.malformed("missing destination method name"))?;
            if visitor.visit_method(parts[2], Some(parts[4]))? {
                visitor.visit_dst_name(MappedElementKind::Method, 0, dst_name)?;
                visitor.visit_element_content(MappedElementKind::Method)?;
            }
        } else {
            let dst_name = parts.get(4).cloned().filter(valid)
                .ok_or_else(|| reader.malformed("missing destination field name"))?;
            if visitor.visit_field(parts[2], None)? {
                visitor.visit_dst_name(MappedElementKind::Field, 0, dst_name)?;
                visitor.visit_element_content(MappedElementKind::Field)?;
            }
        }
        Ok(())
    }
    fn read_class<R: Read>(&self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<bool, Error> {
        read_dst_names(reader, MappedElementKind::Class, 0, self.dst_count, visitor)?;
        if !visitor.visit_element_content(MappedElementKind::Class)? {
            return Ok(false)
        }
        let tsrg2 = self.format == MappingFormat::Tsrg2File;
        while reader.next_line(1)? {
            if reader.has_extra_indents()? {
                continue;
            }
            let src_name = reader.require_col(false, "source member name")?;
            let arg = match reader.next_col(false)? {
                Some(arg) => arg,
                None => return Err(reader.malformed("missing member descriptor or destination name")),
            };
            if arg.starts_with('(') {
                if visitor.visit_method(&src_name, Some(&arg))? {
                    self.read_method(reader, visitor)?;
                }
            } else if !tsrg2 {
                // TSRG fields never have a descriptor
                if visitor.visit_field(&src_name, None)? {
                    if arg.is_empty() {
                        return Err(reader.malformed("missing destination field name"))
                    }
                    visitor.visit_dst_name(MappedElementKind::Field, 0, &arg)?;
                    read_element(reader, MappedElementKind::Field, 1, self.dst_count, visitor)?;
                }
            } else {
                self.read_tsrg2_field(reader, src_name, arg, visitor)?;
            }
        }
        Ok(true)
    }
    /// A TSRG v2 field, whose descriptor is only known by counting the columns
    fn read_tsrg2_field<R: Read>(
        &self,
        reader: &mut ColumnFileReader<R>,
        src_name: String,
        arg: String,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        let mut names = Vec::with_capacity(self.dst_count);
        for _ in 1..self.dst_count {
            names.push(reader.require_col(false, "destination field name")?);
        }
        let last_name = reader.next_col(false)?;
        let desc = match last_name {
            Some(_) if arg.is_empty() => return Err(reader.malformed("empty field descriptor")),
            Some(_) => Some(arg.as_str()),
            None => None,
        };
        if !visitor.visit_field(&src_name, desc)? {
            return Ok(())
        }
        let offset = match last_name {
            Some(_) => 0,
            None => {
                if !arg.is_empty() {
                    visitor.visit_dst_name(MappedElementKind::Field, 0, &arg)?;
                }
                1
            }
        };
        for (index, name) in names.iter().enumerate() {
            visitor.visit_dst_name(MappedElementKind::Field, index + offset, name)?;
        }
        if let Some(ref last_name) = last_name {
            if !last_name.is_empty() {
                visitor.visit_dst_name(MappedElementKind::Field, self.dst_count - 1, last_name)?;
            }
        }
        visitor.visit_element_content(MappedElementKind::Field)?;
        Ok(())
    }
    fn read_method<R: Read>(&self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        read_dst_names(reader, MappedElementKind::Method, 0, self.dst_count, visitor)?;
        if !visitor.visit_element_content(MappedElementKind::Method)? {
            return Ok(())
        }
        while reader.next_line(2)? {
            if reader.has_extra_indents()? {
                continue;
            }
            // a bare marker for static methods
            if reader.next_col_matching("static")? {
                continue;
            }
            let lv_index = match reader.next_int_col()? {
                Some(index) => index,
                None => return Err(reader.malformed("missing or invalid parameter index")),
            };
            let src_name = match reader.next_col(false)? {
                Some(name) => name,
                None => return Err(reader.malformed("missing source parameter name column")),
            };
            let src_name = Some(src_name.as_str()).filter(|name| !name.is_empty());
            if visitor.visit_method_arg(None, Some(lv_index), src_name)? {
                read_element(reader, MappedElementKind::MethodArg, 0, self.dst_count, visitor)?;
            }
        }
        Ok(())
    }
}

/// Splits at spaces, every space being a part of its own
fn split_keeping_spaces(line: &str) -> Vec<&str> {
    let mut parts = Vec::new();
    let mut start = 0;
    for (index, c) in line.char_indices() {
        if c == ' ' {
            if start < index {
                parts.push(&line[start..index]);
            }
            parts.push(&line[index..index + 1]);
            start = index + 1;
        }
    }
    if start < line.len() {
        parts.push(&line[start..]);
    }
    parts
}

fn read_element<R: Read>(
    reader: &mut ColumnFileReader<R>,
    kind: MappedElementKind,
    first_namespace: usize,
    dst_count: usize,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    read_dst_names(reader, kind, first_namespace, dst_count, visitor)?;
    visitor.visit_element_content(kind)?;
    Ok(())
}

fn read_dst_names<R: Read>(
    reader: &mut ColumnFileReader<R>,
    kind: MappedElementKind,
    first_namespace: usize,
    dst_count: usize,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    for namespace in first_namespace..dst_count {
        let name = reader.require_col(false, "destination name")?;
        visitor.visit_dst_name(kind, namespace, &name)?;
    }
    Ok(())
}

/// Writes `names`, falling back to the source name where a namespace has none
fn write_names<W: Write>(writer: &mut W, names: &[Option<String>], count: usize, src_name: &str) -> Result<(), Error> {
    for namespace in 0..count {
        let name = names.get(namespace).and_then(Option::as_ref).map_or(src_name, String::as_str);
        write!(writer, " {}", name)?;
    }
    writeln!(writer)?;
    Ok(())
}

#[inline]
fn set_name(names: &mut Vec<Option<String>>, namespace: usize, name: &str) {
    if names.len() <= namespace {
        names.resize(namespace + 1, None);
    }
    names[namespace] = Some(name.into());
}

/// Writes TSRG or TSRG v2.
///
/// Every name column is required, so missing destination names are written as the source name.
/// TSRG only keeps the first destination namespace.
pub struct TsrgFileWriter<W: Write> {
    writer: W,
    v2: bool,
    dst_count: usize,
    src_name: String,
    src_desc: Option<String>,
    lv_index: Option<u32>,
    arg_src_name: Option<String>,
    dst_names: Vec<Option<String>>,
}
impl<W: Write> TsrgFileWriter<W> {
    pub fn new(writer: W, v2: bool) -> TsrgFileWriter<W> {
        TsrgFileWriter {
            writer, v2,
            dst_count: 1,
            src_name: String::new(),
            src_desc: None,
            lv_index: None,
            arg_src_name: None,
            dst_names: Vec::new(),
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn start_element(&mut self, src_name: &str, src_desc: Option<&str>) {
        self.src_name.clear();
        self.src_name.push_str(src_name);
        self.src_desc = src_desc.map(String::from);
        self.dst_names.clear();
    }
}
impl<W: Write> MappingVisitor for TsrgFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_ELEMENT_UNIQUENESS | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        if dst_namespaces.is_empty() {
            return Err(UnsupportedOperation::missing_namespace(0, 0).into())
        }
        if self.v2 {
            self.dst_count = dst_namespaces.len();
            write!(self.writer, "tsrg2 {}", src_namespace)?;
            for namespace in dst_namespaces {
                write!(self.writer, " {}", namespace)?;
            }
            writeln!(self.writer)?;
        } else {
            self.dst_count = 1;
        }
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.start_element(src_name, None);
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.start_element(src_name, src_desc);
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.start_element(src_name, src_desc);
        Ok(true)
    }
    fn visit_method_arg(&mut self, _arg_position: Option<u32>, lv_index: Option<u32>, src_name: Option<&str>) -> Result<bool, Error> {
        if !self.v2 || lv_index.is_none() {
            return Ok(false)
        }
        self.lv_index = lv_index;
        self.arg_src_name = src_name.map(String::from);
        self.dst_names.clear();
        Ok(true)
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
        if namespace < self.dst_count {
            set_name(&mut self.dst_names, namespace, name);
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        match kind {
            MappedElementKind::Class => {
                write!(self.writer, "{}", self.src_name)?;
                write_names(&mut self.writer, &self.dst_names, self.dst_count, &self.src_name)?;
                Ok(true)
            }
            MappedElementKind::Field => {
                write!(self.writer, "\t{}", self.src_name)?;
                if let (true, Some(desc)) = (self.v2, self.src_desc.as_ref()) {
                    write!(self.writer, " {}", desc)?;
                }
                write_names(&mut self.writer, &self.dst_names, self.dst_count, &self.src_name)?;
                Ok(false)
            }
            MappedElementKind::Method => {
                let desc = match self.src_desc {
                    Some(ref desc) => desc,
                    None => return Err(UnsupportedOperation::missing_desc(kind, &self.src_name).into()),
                };
                write!(self.writer, "\t{} {}", self.src_name, desc)?;
                write_names(&mut self.writer, &self.dst_names, self.dst_count, &self.src_name)?;
                Ok(self.v2)
            }
            MappedElementKind::MethodArg => {
                let lv_index = match self.lv_index {
                    Some(index) => index,
                    None => return Ok(false),
                };
                let src_name = self.arg_src_name.as_ref().map_or("", String::as_str);
                let complete = (0..self.dst_count).all(|namespace| {
                    self.dst_names.get(namespace).map_or(false, Option::is_some)
                });
                // nothing to fall back on for unnamed parameters
                if src_name.is_empty() && !complete {
                    return Ok(false)
                }
                write!(self.writer, "\t\t{} {}", lv_index, src_name)?;
                write_names(&mut self.writer, &self.dst_names, self.dst_count, src_name)?;
                Ok(false)
            }
            MappedElementKind::MethodVar => Ok(false),
        }
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for TsrgFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

/// Writes CSRG, skipping elements without a destination name
pub struct CsrgFileWriter<W: Write> {
    writer: W,
    class_src_name: String,
    member_src_name: String,
    member_src_desc: Option<String>,
    dst_name: Option<String>,
}
impl<W: Write> CsrgFileWriter<W> {
    pub fn new(writer: W) -> CsrgFileWriter<W> {
        CsrgFileWriter {
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
impl<W: Write> MappingVisitor for CsrgFileWriter<W> {
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
        let dst_name = match self.dst_name {
            Some(ref name) => name,
            None => return Ok(kind == MappedElementKind::Class),
        };
        match kind {
            MappedElementKind::Class => {
                writeln!(self.writer, "{} {}", self.class_src_name, dst_name)?;
                return Ok(true)
            }
            MappedElementKind::Field => {
                writeln!(self.writer, "{} {} {}", self.class_src_name, self.member_src_name, dst_name)?;
            }
            MappedElementKind::Method => {
                let desc = match self.member_src_desc {
                    Some(ref desc) => desc,
                    None => return Err(UnsupportedOperation::missing_desc(kind, &self.member_src_name).into()),
                };
                writeln!(self.writer, "{} {} {} {}", self.class_src_name, self.member_src_name, desc, dst_name)?;
            }
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => {}
        }
        Ok(false)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for CsrgFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    const TSRG: &str = "a pkg/Named\n\tb count\n\tc (I)V run\npkg/ other/\nd e\n";
    const TSRG2: &str = "tsrg2 obf srg named\n\
        a pkg/A pkg/Named\n\
        \tb I f_1 count\n\
        \tc (I)V m_1 run\n\
        \t\tstatic\n\
        \t\t0 o p_1 value\n";

    #[test]
    fn reads_tsrg() {
        let mut tree = MemoryMappingTree::new();
        read(TSRG.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.dst_namespaces(), &["target".to_string()]);
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("pkg/Named"));
        assert_eq!(class.field("b", None).unwrap().dst_name(0), Some("count"));
        assert_eq!(class.method("c", Some("(I)V")).unwrap().dst_name(0), Some("run"));
        assert!(tree.class("pkg/").is_none());
        assert_eq!(tree.class("d").unwrap().dst_name(0), Some("e"));
    }
    #[test]
    fn reads_tsrg2() {
        assert_eq!(namespaces(TSRG2.as_bytes()).unwrap(), vec!["obf", "srg", "named"]);
        let mut tree = MemoryMappingTree::new();
        read(TSRG2.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.src_namespace(), Some("obf"));
        let class = tree.class("a").unwrap();
        let field = class.field("b", Some("I")).unwrap();
        assert_eq!(field.dst_names, vec![Some("f_1".to_string()), Some("count".to_string())]);
        let method = class.method("c", Some("(I)V")).unwrap();
        let arg = method.arg(0).unwrap();
        assert_eq!(arg.src_name.as_ref().map(String::as_str), Some("o"));
        assert_eq!(arg.dst_name(1), Some("value"));
    }
    #[test]
    fn tsrg2_field_without_desc() {
        let text = "tsrg2 obf named\na b\n\tf g\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let field = tree.class("a").unwrap().field("f", None).unwrap();
        assert_eq!(field.src_desc, None);
        assert_eq!(field.dst_name(0), Some("g"));
    }
    #[test]
    fn reads_csrg() {
        let text = "a pkg/Named\na b count\na c (I)V run\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("pkg/Named"));
        assert_eq!(class.field("b", None).unwrap().dst_name(0), Some("count"));
        assert_eq!(class.method("c", Some("(I)V")).unwrap().dst_name(0), Some("run"));
    }
    #[test]
    fn writes_tsrg() {
        let text = "a pkg/Named\n\tb count\n\tc (I)V run\nd e\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let mut writer = TsrgFileWriter::new(Vec::new(), false);
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), text);
    }
    #[test]
    fn writes_tsrg2() {
        let mut tree = MemoryMappingTree::new();
        read(TSRG2.as_bytes(), &mut tree).unwrap();
        let mut writer = TsrgFileWriter::new(Vec::new(), true);
        tree.accept(&mut writer).unwrap();
        // the static marker isn't kept
        let expected = TSRG2.replace("\t\tstatic\n", "");
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), expected);
    }
    #[test]
    fn writes_csrg() {
        let text = "a pkg/Named\na b count\na c (I)V run\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let mut writer = CsrgFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), text);
    }
    #[test]
    fn csrg_parts_keep_spaces() {
        assert_eq!(split_keeping_spaces("a b  c "), vec!["a", " ", "b", " ", " ", "c", " "]);
        // the fourth part is always a separator, so a trailing comment still makes a member line
        let err = read(&b"a b #named\n"[..], &mut MemoryMappingTree::new()).unwrap_err();
        let malformed = err.downcast_ref::<crate::error::MalformedMapping>().unwrap();
        assert_eq!(malformed.line, 1);
        let mut tree = MemoryMappingTree::new();
        read(&b"a b\ne f g\n"[..], &mut tree).unwrap();
        assert_eq!(tree.class("e").unwrap().field("f", None).unwrap().dst_name(0), Some("g"));
    }
}
