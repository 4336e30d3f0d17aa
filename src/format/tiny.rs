//! Tiny v1 and v2, the tab separated formats with explicitly named namespaces.
//!
//! Tiny v1 repeats the owner on every member line:
//!
//! ```text
//! v1	official	named
//! CLASS	a	pkg/Named
//! FIELD	a	I	b	field
//! METHOD	a	()V	c	method
//! ```
//!
//! Tiny v2 nests members, parameters, variables and comments by indentation
//! and declares header properties below the header line.
use std::io::{Read, Write};

use failure::Error;
use log::trace;

use crate::error::UnsupportedOperation;
use crate::format::{self, ColumnFileReader};
use crate::util;
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

pub const NEXT_INTERMEDIARY_CLASS: &str = "next-intermediary-class";
pub const NEXT_INTERMEDIARY_FIELD: &str = "next-intermediary-field";
pub const NEXT_INTERMEDIARY_METHOD: &str = "next-intermediary-method";
/// The tiny v2 header property that enables escaping of names
pub const ESCAPED_NAMES: &str = "escaped-names";
const INTERMEDIARY_COUNTER: &str = "# INTERMEDIARY-COUNTER ";

#[inline]
fn columns<R: Read>(reader: R) -> ColumnFileReader<R> {
    ColumnFileReader::new(reader, b'\t', b'\t')
}

fn read_v1_header<R: Read>(reader: &mut ColumnFileReader<R>) -> Result<(String, Vec<String>), Error> {
    if !reader.next_col_matching("v1")? {
        return Err(reader.malformed("no tiny v1 header"))
    }
    let src_namespace = reader.require_col(false, "source namespace")?;
    let mut dst_namespaces = Vec::new();
    while !reader.is_at_eol() {
        dst_namespaces.push(reader.require_col(false, "destination namespace")?);
    }
    Ok((src_namespace, dst_namespaces))
}

fn read_v2_header<R: Read>(reader: &mut ColumnFileReader<R>) -> Result<(String, Vec<String>), Error> {
    if !reader.next_col_matching("tiny")? || !reader.next_col_matching("2")? || !reader.next_col_matching("0")? {
        return Err(reader.malformed("no tiny v2 header"))
    }
    let src_namespace = reader.require_col(false, "source namespace")?;
    let mut dst_namespaces = Vec::new();
    while !reader.is_at_eol() {
        dst_namespaces.push(reader.require_col(false, "destination namespace")?);
    }
    Ok((src_namespace, dst_namespaces))
}

/// The namespaces declared by a tiny v1 header, source first
pub fn v1_namespaces<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let (src, mut dst) = read_v1_header(&mut columns(reader))?;
    dst.insert(0, src);
    Ok(dst)
}

/// The namespaces declared by a tiny v2 header, source first
pub fn v2_namespaces<R: Read>(reader: R) -> Result<Vec<String>, Error> {
    let (src, mut dst) = read_v2_header(&mut columns(reader))?;
    dst.insert(0, src);
    Ok(dst)
}

fn read_dst_names<R: Read>(
    reader: &mut ColumnFileReader<R>,
    kind: MappedElementKind,
    count: usize,
    unescape: bool,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    for namespace in 0..count {
        let name = match reader.next_col(unescape)? {
            Some(name) => name,
            None => return Err(reader.malformed("missing destination name columns")),
        };
        if !name.is_empty() {
            visitor.visit_dst_name(kind, namespace, &name)?;
        }
    }
    Ok(())
}

pub fn read_v1<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let mut reader = columns(reader);
    let (src_namespace, dst_namespaces) = read_v1_header(&mut reader)?;
    // members are grouped by owner only by convention and counters are part of the content
    let tree_flags = MappingFlags::NEEDS_ELEMENT_UNIQUENESS | MappingFlags::NEEDS_HEADER_METADATA;
    format::read_passes(&mut reader, visitor, tree_flags, |reader, visitor| {
        format::visit_header(visitor, &src_namespace, &dst_namespaces, &[])?;
        if visitor.visit_content()? {
            read_v1_content(reader, dst_namespaces.len(), visitor)?;
        }
        Ok(())
    })
}

fn read_v1_content<R: Read>(
    reader: &mut ColumnFileReader<R>,
    dst_count: usize,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    let mut last_class: Option<String> = None;
    let mut visit_last_class = false;
    while reader.next_line(0)? {
        if reader.next_col_matching("CLASS")? {
            let src_name = reader.require_col(false, "class name")?;
            visit_last_class = visitor.visit_class(&src_name)?;
            if visit_last_class {
                read_dst_names(reader, MappedElementKind::Class, dst_count, false, visitor)?;
                visit_last_class = visitor.visit_element_content(MappedElementKind::Class)?;
            }
            last_class = Some(src_name);
            continue;
        }
        let kind = if reader.next_col_matching("METHOD")? {
            MappedElementKind::Method
        } else if reader.next_col_matching("FIELD")? {
            MappedElementKind::Field
        } else {
            if let Some(line) = reader.next_cols(false)? {
                read_counter(&line, visitor)?;
            }
            continue;
        };
        let owner = reader.require_col(false, "owner class name")?;
        if last_class.as_ref() != Some(&owner) {
            visit_last_class = visitor.visit_class(&owner)?
                && visitor.visit_element_content(MappedElementKind::Class)?;
            last_class = Some(owner);
        }
        if !visit_last_class {
            continue;
        }
        let src_desc = reader.require_col(false, "member descriptor")?;
        let src_name = reader.require_col(false, "member name")?;
        let visit = match kind {
            MappedElementKind::Field => visitor.visit_field(&src_name, Some(&src_desc))?,
            _ => visitor.visit_method(&src_name, Some(&src_desc))?,
        };
        if visit {
            read_dst_names(reader, kind, dst_count, false, visitor)?;
            visitor.visit_element_content(kind)?;
        }
    }
    Ok(())
}

fn read_counter(line: &str, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    if !line.starts_with(INTERMEDIARY_COUNTER) {
        return Ok(())
    }
    let parts = line[INTERMEDIARY_COUNTER.len()..].split(' ').collect::<Vec<_>>();
    if let [kind, value] = parts[..] {
        let key = match kind {
            "class" => NEXT_INTERMEDIARY_CLASS,
            "field" => NEXT_INTERMEDIARY_FIELD,
            "method" => NEXT_INTERMEDIARY_METHOD,
            _ => return Ok(()),
        };
        visitor.visit_metadata(key, Some(value))?;
    }
    Ok(())
}

pub fn read_v2<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let mut reader = columns(reader);
    let (src_namespace, dst_namespaces) = read_v2_header(&mut reader)?;
    let dst_count = dst_namespaces.len();
    format::read_passes(&mut reader, visitor, MappingFlags::empty(), |reader, visitor| {
        let visit_header = visitor.visit_header()?;
        if visit_header {
            visitor.visit_namespaces(&src_namespace, &dst_namespaces)?;
        }
        let mut escaped_names = false;
        while reader.next_line(1)? {
            if reader.next_col_matching(ESCAPED_NAMES)? {
                escaped_names = true;
                if visit_header {
                    visitor.visit_metadata(ESCAPED_NAMES, None)?;
                }
            } else if let Some(key) = reader.next_col(true)? {
                let value = reader.next_col(true)?;
                if visit_header {
                    visitor.visit_metadata(&key, value.as_ref().map(String::as_str))?;
                }
            }
        }
        if visitor.visit_content()? {
            let mut state = Tiny2State { dst_count, escaped_names };
            while reader.next_line(0)? {
                if reader.next_col_matching("c")? {
                    state.read_class(reader, visitor)?;
                }
            }
        }
        Ok(())
    })
}

struct Tiny2State {
    dst_count: usize,
    escaped_names: bool,
}
impl Tiny2State {
    fn read_class<R: Read>(&mut self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        let src_name = reader.require_col(self.escaped_names, "class name")?;
        if !visitor.visit_class(&src_name)? {
            return Ok(())
        }
        if !self.read_element(reader, MappedElementKind::Class, visitor)? {
            return Ok(())
        }
        while reader.next_line(1)? {
            if reader.next_col_matching("f")? {
                let src_desc = reader.require_col(self.escaped_names, "field descriptor")?;
                let src_name = reader.require_col(self.escaped_names, "field name")?;
                if visitor.visit_field(&src_name, Some(&src_desc))? {
                    if self.read_element(reader, MappedElementKind::Field, visitor)? {
                        self.read_comments(reader, 2, MappedElementKind::Field, visitor)?;
                    }
                }
            } else if reader.next_col_matching("m")? {
                let src_desc = reader.require_col(self.escaped_names, "method descriptor")?;
                let src_name = reader.require_col(self.escaped_names, "method name")?;
                if visitor.visit_method(&src_name, Some(&src_desc))?
                    && self.read_element(reader, MappedElementKind::Method, visitor)? {
                    self.read_method(reader, visitor)?;
                }
            } else if reader.next_col_matching("c")? {
                self.read_comment(reader, MappedElementKind::Class, visitor)?;
            }
        }
        Ok(())
    }
    fn read_method<R: Read>(&mut self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        while reader.next_line(2)? {
            if reader.next_col_matching("p")? {
                let lv_index = reader.next_int_col()?;
                let src_name = reader.next_col(self.escaped_names)?.filter(|name| !name.is_empty());
                if visitor.visit_method_arg(None, lv_index, src_name.as_ref().map(String::as_str))? {
                    if self.read_element(reader, MappedElementKind::MethodArg, visitor)? {
                        self.read_comments(reader, 3, MappedElementKind::MethodArg, visitor)?;
                    }
                }
            } else if reader.next_col_matching("v")? {
                let lv_index = reader.next_int_col()?;
                let start_op_idx = reader.next_int_col()?;
                let lvt_row_index = reader.next_int_col()?;
                let src_name = reader.next_col(self.escaped_names)?.filter(|name| !name.is_empty());
                let src_name = src_name.as_ref().map(String::as_str);
                if visitor.visit_method_var(lvt_row_index, lv_index, start_op_idx, None, src_name)? {
                    if self.read_element(reader, MappedElementKind::MethodVar, visitor)? {
                        self.read_comments(reader, 3, MappedElementKind::MethodVar, visitor)?;
                    }
                }
            } else if reader.next_col_matching("c")? {
                self.read_comment(reader, MappedElementKind::Method, visitor)?;
            }
        }
        Ok(())
    }
    /// Visits the destination names of the current element and finishes it
    #[inline]
    fn read_element<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        kind: MappedElementKind,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<bool, Error> {
        read_dst_names(reader, kind, self.dst_count, self.escaped_names, visitor)?;
        visitor.visit_element_content(kind)
    }
    fn read_comments<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        indent: usize,
        kind: MappedElementKind,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        while reader.next_line(indent)? {
            if reader.next_col_matching("c")? {
                self.read_comment(reader, kind, visitor)?;
            }
        }
        Ok(())
    }
    fn read_comment<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        kind: MappedElementKind,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        match reader.next_col(true)? {
            Some(comment) => visitor.visit_comment(kind, &comment),
            None => Err(reader.malformed("missing comment")),
        }
    }
}

fn write_dst_names<W: Write>(writer: &mut W, dst_names: &mut [Option<String>], escape: bool) -> Result<(), Error> {
    for name in dst_names.iter_mut() {
        writer.write_all(b"\t")?;
        if let Some(name) = name.take() {
            write_name(writer, &name, escape)?;
        }
    }
    Ok(())
}

#[inline]
fn write_name<W: Write>(writer: &mut W, name: &str, escape: bool) -> Result<(), Error> {
    if escape && util::needs_escaping(name) {
        writer.write_all(util::escape(name).as_bytes())?;
    } else {
        writer.write_all(name.as_bytes())?;
    }
    Ok(())
}

pub struct Tiny1FileWriter<W: Write> {
    writer: W,
    class_src_name: Option<String>,
    member_src_name: Option<String>,
    member_src_desc: Option<String>,
    dst_names: Vec<Option<String>>,
}
impl<W: Write> Tiny1FileWriter<W> {
    pub fn new(writer: W) -> Tiny1FileWriter<W> {
        Tiny1FileWriter {
            writer,
            class_src_name: None,
            member_src_name: None,
            member_src_desc: None,
            dst_names: Vec::new(),
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
}
impl<W: Write> MappingVisitor for Tiny1FileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        write!(self.writer, "v1\t{}", src_namespace)?;
        for namespace in dst_namespaces {
            write!(self.writer, "\t{}", namespace)?;
        }
        self.writer.write_all(b"\n")?;
        self.dst_names = vec![None; dst_namespaces.len()];
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        let kind = match key {
            NEXT_INTERMEDIARY_CLASS => "class",
            NEXT_INTERMEDIARY_FIELD => "field",
            NEXT_INTERMEDIARY_METHOD => "method",
            _ => return Ok(()),
        };
        if let Some(value) = value {
            writeln!(self.writer, "{}{} {}", INTERMEDIARY_COUNTER, kind, value)?;
        }
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = Some(src_name.into());
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.member_src_name = Some(src_name.into());
        self.member_src_desc = src_desc.map(String::from);
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.member_src_name = Some(src_name.into());
        self.member_src_desc = src_desc.map(String::from);
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
        if let Some(slot) = self.dst_names.get_mut(namespace) {
            *slot = Some(name.into());
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        let class = self.class_src_name.as_ref().map_or("", String::as_str);
        match kind {
            MappedElementKind::Class => {
                write!(self.writer, "CLASS\t{}", class)?;
            }
            MappedElementKind::Field | MappedElementKind::Method => {
                let tag = if kind == MappedElementKind::Field { "FIELD" } else { "METHOD" };
                let desc = match self.member_src_desc {
                    Some(ref desc) => desc,
                    None => {
                        let name = self.member_src_name.as_ref().map_or("", String::as_str);
                        return Err(UnsupportedOperation::missing_desc(kind, name).into())
                    }
                };
                let name = self.member_src_name.as_ref().map_or("", String::as_str);
                write!(self.writer, "{}\t{}\t{}\t{}", tag, class, desc, name)?;
            }
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => return Ok(false),
        }
        write_dst_names(&mut self.writer, &mut self.dst_names, false)?;
        self.writer.write_all(b"\n")?;
        Ok(kind == MappedElementKind::Class)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for Tiny1FileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

pub struct Tiny2FileWriter<W: Write> {
    writer: W,
    escape_names: bool,
    wrote_escaped_names: bool,
    dst_names: Vec<Option<String>>,
}
impl<W: Write> Tiny2FileWriter<W> {
    /// With `escape_names`, names containing special characters are escaped and the header says so
    pub fn new(writer: W, escape_names: bool) -> Tiny2FileWriter<W> {
        Tiny2FileWriter {
            writer, escape_names,
            wrote_escaped_names: false,
            dst_names: Vec::new(),
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn write_line_start(&mut self, indent: usize, tag: &str) -> Result<(), Error> {
        for _ in 0..indent {
            self.writer.write_all(b"\t")?;
        }
        self.writer.write_all(tag.as_bytes())?;
        Ok(())
    }
    #[inline]
    fn write_col(&mut self, name: &str) -> Result<(), Error> {
        self.writer.write_all(b"\t")?;
        write_name(&mut self.writer, name, self.escape_names)
    }
    fn write_optional_int(&mut self, value: Option<u32>) -> Result<(), Error> {
        match value {
            Some(value) => write!(self.writer, "\t{}", value)?,
            None => self.writer.write_all(b"\t-1")?,
        }
        Ok(())
    }
    /// The line of the current element isn't complete until its destination names arrive
    fn finish_line(&mut self) -> Result<(), Error> {
        write_dst_names(&mut self.writer, &mut self.dst_names, self.escape_names)?;
        self.writer.write_all(b"\n")?;
        Ok(())
    }
}
impl<W: Write> MappingVisitor for Tiny2FileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_HEADER_METADATA | MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        write!(self.writer, "tiny\t2\t0\t{}", src_namespace)?;
        for namespace in dst_namespaces {
            write!(self.writer, "\t{}", namespace)?;
        }
        self.writer.write_all(b"\n")?;
        self.dst_names = vec![None; dst_namespaces.len()];
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        if key == ESCAPED_NAMES {
            if self.wrote_escaped_names {
                return Ok(())
            }
            self.escape_names = true;
            self.wrote_escaped_names = true;
        }
        write!(self.writer, "\t{}", util::escape(key))?;
        if let Some(value) = value {
            write!(self.writer, "\t{}", util::escape(value))?;
        }
        self.writer.write_all(b"\n")?;
        Ok(())
    }
    fn visit_content(&mut self) -> Result<bool, Error> {
        if self.escape_names && !self.wrote_escaped_names {
            writeln!(self.writer, "\t{}", ESCAPED_NAMES)?;
            self.wrote_escaped_names = true;
        }
        Ok(true)
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.write_line_start(0, "c")?;
        self.write_col(src_name)?;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let desc = src_desc.ok_or_else(|| UnsupportedOperation::missing_desc(MappedElementKind::Field, src_name))?;
        self.write_line_start(1, "f")?;
        self.write_col(desc)?;
        self.write_col(src_name)?;
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let desc = src_desc.ok_or_else(|| UnsupportedOperation::missing_desc(MappedElementKind::Method, src_name))?;
        self.write_line_start(1, "m")?;
        self.write_col(desc)?;
        self.write_col(src_name)?;
        Ok(true)
    }
    fn visit_method_arg(&mut self, _arg_position: Option<u32>, lv_index: Option<u32>, src_name: Option<&str>) -> Result<bool, Error> {
        let lv_index = match lv_index {
            Some(lv_index) => lv_index,
            // tiny v2 identifies parameters by local variable index only
            None => return Ok(false),
        };
        self.write_line_start(2, "p")?;
        write!(self.writer, "\t{}", lv_index)?;
        self.write_col(src_name.unwrap_or(""))?;
        Ok(true)
    }
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        _end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.write_line_start(2, "v")?;
        self.write_optional_int(lv_index)?;
        self.write_optional_int(start_op_idx)?;
        self.write_optional_int(lvt_row_index)?;
        self.write_col(src_name.unwrap_or(""))?;
        Ok(true)
    }
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.close()?;
        Ok(true)
    }
    fn visit_dst_name(&mut self, _kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        if let Some(slot) = self.dst_names.get_mut(namespace) {
            *slot = Some(name.into());
        }
        Ok(())
    }
    fn visit_element_content(&mut self, _kind: MappedElementKind) -> Result<bool, Error> {
        self.finish_line()?;
        Ok(true)
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        self.write_line_start(kind.level() + 1, "c")?;
        writeln!(self.writer, "\t{}", util::escape(comment))?;
        Ok(())
    }
}
impl<W: Write> MappingWriter for Tiny2FileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        trace!("Flushing tiny v2 output");
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::{DecliningTree, MemoryMappingTree};

    const V2: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
\tsorted
c\ta\tclass_1\tpkg/Named
\tc\tA named class
\tf\tI\tb\tfield_1\tcount
\tm\t(I)V\tc\tmethod_1\trun
\t\tc\tRuns it
\t\tp\t1\t\t\tspeed
\t\tv\t2\t4\t0\t\t\ttmp
c\td\tclass_2\t
";

    #[test]
    fn reads_v1() {
        let text = "v1\tofficial\tnamed\nCLASS\ta\tNamed\n# INTERMEDIARY-COUNTER class 12\nFIELD\ta\tI\tb\tcount\nMETHOD\tx\t()V\tc\trun\n";
        let mut tree = MemoryMappingTree::new();
        read_v1(text.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.src_namespace(), Some("official"));
        assert_eq!(tree.dst_namespaces(), &["named".to_string()][..]);
        assert_eq!(tree.metadata_value(NEXT_INTERMEDIARY_CLASS), Some("12"));
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("Named"));
        assert_eq!(class.field("b", Some("I")).unwrap().dst_name(0), Some("count"));
        let owner = tree.class("x").unwrap();
        assert_eq!(owner.dst_name(0), None);
        assert_eq!(owner.method("c", Some("()V")).unwrap().dst_name(0), Some("run"));
    }
    #[test]
    fn v1_header_errors() {
        assert!(read_v1(&b"v2\ta\tb\n"[..], &mut MemoryMappingTree::new()).is_err());
        assert!(read_v1(&b"v1\ta\t\n"[..], &mut MemoryMappingTree::new()).is_err());
        assert_eq!(v1_namespaces(&b"v1\ta\tb\tc\n"[..]).unwrap(), vec!["a", "b", "c"]);
    }
    #[test]
    fn reads_v2() {
        let mut tree = MemoryMappingTree::new();
        read_v2(V2.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.dst_namespaces().len(), 2);
        assert_eq!(tree.metadata(), &[("sorted".to_string(), None)][..]);
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(1), Some("pkg/Named"));
        assert_eq!(class.comment.as_ref().map(String::as_str), Some("A named class"));
        let method = class.method("c", Some("(I)V")).unwrap();
        assert_eq!(method.comment.as_ref().map(String::as_str), Some("Runs it"));
        assert_eq!(method.arg(1).unwrap().dst_name(1), Some("speed"));
        assert_eq!(method.vars[0].lv_index, Some(2));
        assert_eq!(method.vars[0].start_op_idx, Some(4));
        assert_eq!(method.vars[0].lvt_row_index, Some(0));
        assert_eq!(method.vars[0].dst_name(1), Some("tmp"));
        assert_eq!(tree.class("d").unwrap().dst_name(1), None);
    }
    #[test]
    fn writes_v2() {
        let mut tree = MemoryMappingTree::new();
        read_v2(V2.as_bytes(), &mut tree).unwrap();
        let mut writer = Tiny2FileWriter::new(Vec::new(), false);
        tree.accept(&mut writer).unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(written, V2);
    }
    #[test]
    fn escaped_names() {
        let text = "tiny\t2\t0\ta\tb\n\tescaped-names\nc\tx\\ty\tz\n";
        let mut tree = MemoryMappingTree::new();
        read_v2(text.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.class("x\ty").unwrap().dst_name(0), Some("z"));
        let mut writer = Tiny2FileWriter::new(Vec::new(), false);
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), text);
    }
    #[test]
    fn writes_v1() {
        let mut tree = MemoryMappingTree::new();
        read_v2(V2.as_bytes(), &mut tree).unwrap();
        let mut writer = Tiny1FileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(written, "v1\tofficial\tintermediary\tnamed
CLASS\ta\tclass_1\tpkg/Named
FIELD\ta\tI\tb\tfield_1\tcount
METHOD\ta\t(I)V\tc\tmethod_1\trun
CLASS\td\tclass_2\t
");
    }
    #[test]
    fn declined_field_skips_its_comment() {
        let text = "tiny\t2\t0\ta\tb\nc\tx\ty\n\tf\tI\tf\tg\n\t\tc\tA field\n\tm\t()V\tm\tn\n\t\tc\tA method\n";
        let mut visitor = DecliningTree::new(MappedElementKind::Field);
        read_v2(text.as_bytes(), &mut visitor).unwrap();
        let class = visitor.tree.class("x").unwrap();
        let field = class.field("f", Some("I")).unwrap();
        assert_eq!(field.dst_name(0), Some("g"));
        assert_eq!(field.comment, None);
        let method = class.method("m", Some("()V")).unwrap();
        assert_eq!(method.comment.as_ref().map(String::as_str), Some("A method"));
    }
}
