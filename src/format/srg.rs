//! SRG, its extension XSRG and JAM.
//!
//! All three are space separated with one record per line and fully qualified member names.
//! SRG members are written as `owner/name`:
//!
//! ```text
//! CL: a pkg/Named
//! FD: a/b pkg/Named/count
//! MD: a/c (I)V pkg/Named/run (I)V
//! ```
//!
//! XSRG adds source and destination descriptors to fields.
//! JAM separates owner and member names and maps parameters by position.
use std::io::{Read, Write};

use failure::Error;

use crate::format::{self, ColumnFileReader, MappingFormat};
use crate::util::{NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

/// Reads SRG or XSRG, switching to XSRG as soon as a field line has descriptors
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
            read_srg_content(reader, visitor)?;
        }
        Ok(())
    })
}

/// Splits `owner/name` at the last slash, both halves being non-empty
fn split_member<R: Read>(reader: &ColumnFileReader<R>, qualified: &str, what: &str) -> Result<(String, String), Error> {
    match qualified.rfind('/') {
        Some(pos) if pos > 0 && pos < qualified.len() - 1 => {
            Ok((qualified[..pos].to_owned(), qualified[pos + 1..].to_owned()))
        }
        _ => Err(reader.malformed(format!("invalid {} {:?}", what, qualified))),
    }
}

fn read_srg_content<R: Read>(reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let mut format = MappingFormat::SrgFile;
    let mut last_class_src: Option<String> = None;
    let mut last_class_dst: Option<String> = None;
    let mut class_content_pending = false;
    // members of a declined class are skipped until the owner changes
    let mut visit_last_class = false;
    loop {
        if reader.next_col_matching("CL:")? {
            let src_name = reader.require_col(false, "source class name")?;
            let dst_name = reader.require_col(false, "destination class name")?;
            if class_content_pending {
                visitor.visit_element_content(MappedElementKind::Class)?;
                class_content_pending = false;
            }
            visit_last_class = visitor.visit_class(&src_name)?;
            if visit_last_class {
                visitor.visit_dst_name(MappedElementKind::Class, 0, &dst_name)?;
                class_content_pending = true;
            }
            last_class_src = Some(src_name);
            last_class_dst = Some(dst_name);
        } else {
            let kind = if reader.next_col_matching("MD:")? {
                Some(MappedElementKind::Method)
            } else if reader.next_col_matching("FD:")? {
                Some(MappedElementKind::Field)
            } else {
                None
            };
            if let Some(kind) = kind {
                let src = match reader.next_col(false)? {
                    Some(src) => src,
                    None => return Err(reader.malformed("missing source member name")),
                };
                let (src_owner, src_name) = split_member(reader, &src, "source member name")?;
                let cols = [reader.next_col(false)?, reader.next_col(false)?, reader.next_col(false)?];
                let is_method = kind == MappedElementKind::Method;
                if !is_method && cols[1].is_some() && cols[2].is_some() {
                    format = MappingFormat::XsrgFile;
                }
                let [col0, col1, col2] = cols;
                let (src_desc, dst, dst_desc) = if is_method || format == MappingFormat::XsrgFile {
                    let src_desc = col0.filter(|desc| !desc.is_empty())
                        .ok_or_else(|| reader.malformed("missing source descriptor"))?;
                    let dst_desc = col2.filter(|desc| !desc.is_empty())
                        .ok_or_else(|| reader.malformed("missing destination descriptor"))?;
                    (Some(src_desc), col1, Some(dst_desc))
                } else {
                    (None, col0, None)
                };
                let dst = dst.ok_or_else(|| reader.malformed("missing destination member name"))?;
                let (dst_owner, dst_name) = split_member(reader, &dst, "destination member name")?;
                let class_visit_required = last_class_src.as_ref() != Some(&src_owner)
                    || last_class_dst.as_ref() != Some(&dst_owner);
                if class_visit_required {
                    if class_content_pending {
                        visitor.visit_element_content(MappedElementKind::Class)?;
                        class_content_pending = false;
                    }
                    visit_last_class = visitor.visit_class(&src_owner)?;
                    if visit_last_class {
                        visitor.visit_dst_name(MappedElementKind::Class, 0, &dst_owner)?;
                        class_content_pending = true;
                    }
                    last_class_src = Some(src_owner);
                    last_class_dst = Some(dst_owner);
                }
                if class_content_pending {
                    class_content_pending = false;
                    visit_last_class = visitor.visit_element_content(MappedElementKind::Class)?;
                }
                if visit_last_class {
                    let src_desc = src_desc.as_ref().map(String::as_str);
                    let visit = match kind {
                        MappedElementKind::Field => visitor.visit_field(&src_name, src_desc)?,
                        _ => visitor.visit_method(&src_name, src_desc)?,
                    };
                    if visit {
                        visitor.visit_dst_name(kind, 0, &dst_name)?;
                        if let Some(ref dst_desc) = dst_desc {
                            visitor.visit_dst_desc(kind, 0, dst_desc)?;
                        }
                        visitor.visit_element_content(kind)?;
                    }
                }
            }
        }
        if !reader.next_line(0)? {
            break;
        }
    }
    if class_content_pending {
        visitor.visit_element_content(MappedElementKind::Class)?;
    }
    Ok(())
}

/// Writes SRG, or XSRG with field descriptors
pub struct SrgFileWriter<W: Write> {
    writer: W,
    xsrg: bool,
    class_src_name: String,
    class_dst_name: Option<String>,
    member_src_name: String,
    member_src_desc: Option<String>,
    member_dst_name: Option<String>,
    member_dst_desc: Option<String>,
}
impl<W: Write> SrgFileWriter<W> {
    pub fn new(writer: W, xsrg: bool) -> SrgFileWriter<W> {
        SrgFileWriter {
            writer, xsrg,
            class_src_name: String::new(),
            class_dst_name: None,
            member_src_name: String::new(),
            member_src_desc: None,
            member_dst_name: None,
            member_dst_desc: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn visit_member(&mut self, src_name: &str, src_desc: Option<&str>) {
        self.member_src_name = src_name.into();
        self.member_src_desc = src_desc.map(String::from);
        self.member_dst_name = None;
        self.member_dst_desc = None;
    }
    fn write_member(&mut self, kind: MappedElementKind) -> Result<(), Error> {
        let dst_name = match self.member_dst_name {
            Some(ref name) => name,
            None => return Ok(()),
        };
        let dst_owner = self.class_dst_name.as_ref().unwrap_or(&self.class_src_name);
        let with_descs = kind == MappedElementKind::Method || self.xsrg;
        let tag = if kind == MappedElementKind::Method { "MD:" } else { "FD:" };
        write!(self.writer, "{} {}/{}", tag, self.class_src_name, self.member_src_name)?;
        if with_descs {
            let src_desc = match self.member_src_desc {
                Some(ref desc) => desc,
                None => return Err(crate::error::UnsupportedOperation::missing_desc(kind, &self.member_src_name).into()),
            };
            let dst_desc = self.member_dst_desc.as_ref().unwrap_or(src_desc);
            writeln!(self.writer, " {} {}/{} {}", src_desc, dst_owner, dst_name, dst_desc)?;
        } else {
            writeln!(self.writer, " {}/{}", dst_owner, dst_name)?;
        }
        Ok(())
    }
}
impl<W: Write> MappingVisitor for SrgFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        let flags = MappingFlags::NEEDS_ELEMENT_UNIQUENESS | MappingFlags::NEEDS_SRC_METHOD_DESC
            | MappingFlags::NEEDS_DST_METHOD_DESC;
        if self.xsrg {
            flags | MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_DST_FIELD_DESC
        } else {
            flags
        }
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = src_name.into();
        self.class_dst_name = None;
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
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        if namespace != 0 {
            return Ok(())
        }
        match kind {
            MappedElementKind::Class => self.class_dst_name = Some(name.into()),
            MappedElementKind::Field | MappedElementKind::Method => self.member_dst_name = Some(name.into()),
            _ => {}
        }
        Ok(())
    }
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        if namespace == 0 && (kind == MappedElementKind::Field || kind == MappedElementKind::Method) {
            self.member_dst_desc = Some(desc.into());
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        match kind {
            MappedElementKind::Class => {
                if let Some(ref dst_name) = self.class_dst_name {
                    writeln!(self.writer, "CL: {} {}", self.class_src_name, dst_name)?;
                }
                Ok(true)
            }
            MappedElementKind::Field | MappedElementKind::Method => {
                self.write_member(kind)?;
                Ok(false)
            }
            _ => Ok(false),
        }
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for SrgFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[inline]
pub fn read_jam<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    read_jam_with_namespaces(reader, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK, visitor)
}

pub fn read_jam_with_namespaces<R: Read>(
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
            let mut state = JamReader::default();
            loop {
                state.read_line(reader, visitor)?;
                if !reader.next_line(0)? {
                    break;
                }
            }
        }
        Ok(())
    })
}

#[derive(Default)]
struct JamReader {
    last_class: Option<String>,
    visit_class: bool,
    last_method: Option<(String, String)>,
    visit_member: bool,
    visit_method_content: bool,
}
impl JamReader {
    fn read_line<R: Read>(&mut self, reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        if reader.next_col_matching("CL")? {
            let src_name = reader.require_col(false, "source class name")?;
            self.visit_class = visitor.visit_class(&src_name)?;
            if self.visit_class {
                let dst_name = reader.require_col(false, "destination class name")?;
                visitor.visit_dst_name(MappedElementKind::Class, 0, &dst_name)?;
                self.visit_class = visitor.visit_element_content(MappedElementKind::Class)?;
            }
            self.last_class = Some(src_name);
            return Ok(())
        }
        let kind = if reader.next_col_matching("MD")? {
            MappedElementKind::Method
        } else if reader.next_col_matching("FD")? {
            MappedElementKind::Field
        } else if reader.next_col_matching("MP")? {
            MappedElementKind::MethodArg
        } else {
            return Ok(())
        };
        let owner = match reader.next_col(false)? {
            Some(owner) => owner,
            None => return Err(reader.malformed("missing source class name")),
        };
        let member_name = reader.require_col(false, "source member name")?;
        let member_desc = reader.require_col(false, "source member descriptor")?;
        let col5 = reader.next_col(false)?;
        let col6 = reader.next_col(false)?;
        let col7 = reader.next_col(false)?;
        let mut arg_position = None;
        let dst_name = if kind == MappedElementKind::MethodArg {
            let position = col5.as_ref().and_then(|pos| pos.parse::<u32>().ok())
                .ok_or_else(|| reader.malformed("invalid parameter position"))?;
            arg_position = Some(position);
            match col7 {
                Some(ref dst) if !dst.is_empty() => {
                    // the parameter descriptor is informational only
                    if col6.as_ref().map_or(true, String::is_empty) {
                        return Err(reader.malformed("missing parameter descriptor"))
                    }
                    col7
                }
                _ => col6,
            }
        } else {
            col5
        };
        let dst_name = dst_name.filter(|name| !name.is_empty())
            .ok_or_else(|| reader.malformed("missing destination name"))?;
        if self.last_class.as_ref() != Some(&owner) {
            self.last_method = None;
            self.visit_class = visitor.visit_class(&owner)?
                && visitor.visit_element_content(MappedElementKind::Class)?;
            self.last_class = Some(owner);
        }
        if !self.visit_class {
            return Ok(())
        }
        let mut new_method = false;
        match kind {
            MappedElementKind::Field => {
                self.visit_member = visitor.visit_field(&member_name, Some(&member_desc))?;
            }
            _ => {
                new_method = match self.last_method {
                    Some((ref name, ref desc)) => *name != member_name || *desc != member_desc,
                    None => true,
                };
                if kind == MappedElementKind::Method || new_method {
                    self.visit_member = visitor.visit_method(&member_name, Some(&member_desc))?;
                    self.visit_method_content = false;
                    self.last_method = Some((member_name, member_desc));
                }
            }
        }
        if !self.visit_member {
            return Ok(())
        }
        match kind {
            MappedElementKind::Field => {
                visitor.visit_dst_name(kind, 0, &dst_name)?;
                visitor.visit_element_content(kind)?;
                return Ok(())
            }
            MappedElementKind::Method => visitor.visit_dst_name(kind, 0, &dst_name)?,
            _ => {}
        }
        if kind == MappedElementKind::Method || new_method {
            self.visit_method_content = visitor.visit_element_content(MappedElementKind::Method)?;
        }
        if kind == MappedElementKind::MethodArg && self.visit_method_content
            && visitor.visit_method_arg(arg_position, None, None)? {
            visitor.visit_dst_name(kind, 0, &dst_name)?;
            visitor.visit_element_content(kind)?;
        }
        Ok(())
    }
}

/// Writes JAM in two passes, classes first and members second
pub struct JamFileWriter<W: Write> {
    writer: W,
    class_only_pass: bool,
    class_src_name: String,
    class_dst_name: Option<String>,
    member_src_name: String,
    member_src_desc: Option<String>,
    member_dst_name: Option<String>,
    arg_position: Option<u32>,
    arg_dst_name: Option<String>,
}
impl<W: Write> JamFileWriter<W> {
    pub fn new(writer: W) -> JamFileWriter<W> {
        JamFileWriter {
            writer,
            class_only_pass: true,
            class_src_name: String::new(),
            class_dst_name: None,
            member_src_name: String::new(),
            member_src_desc: None,
            member_dst_name: None,
            arg_position: None,
            arg_dst_name: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
}
impl<W: Write> MappingVisitor for JamFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC | MappingFlags::NEEDS_MULTIPLE_PASSES
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = src_name.into();
        self.class_dst_name = None;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        if src_desc.is_none() {
            return Ok(false)
        }
        self.member_src_name = src_name.into();
        self.member_src_desc = src_desc.map(String::from);
        self.member_dst_name = None;
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.member_src_name = src_name.into();
        self.member_src_desc = src_desc.map(String::from);
        self.member_dst_name = None;
        Ok(true)
    }
    fn visit_method_arg(&mut self, arg_position: Option<u32>, _lv_index: Option<u32>, _src_name: Option<&str>) -> Result<bool, Error> {
        self.arg_position = arg_position;
        self.arg_dst_name = None;
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
        if self.class_only_pass {
            self.class_only_pass = false;
            return Ok(false)
        }
        self.class_only_pass = true;
        self.close()?;
        Ok(true)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        if namespace != 0 {
            return Ok(())
        }
        match kind {
            MappedElementKind::Class => self.class_dst_name = Some(name.into()),
            MappedElementKind::Field | MappedElementKind::Method => self.member_dst_name = Some(name.into()),
            MappedElementKind::MethodArg => self.arg_dst_name = Some(name.into()),
            MappedElementKind::MethodVar => {}
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        if kind == MappedElementKind::Class {
            if self.class_only_pass {
                if let Some(ref dst_name) = self.class_dst_name {
                    writeln!(self.writer, "CL {} {}", self.class_src_name, dst_name)?;
                }
            }
            return Ok(true)
        }
        let src_desc = match self.member_src_desc {
            Some(ref desc) if !self.class_only_pass => desc,
            _ => return Ok(false),
        };
        match kind {
            MappedElementKind::Field | MappedElementKind::Method => {
                let is_method = kind == MappedElementKind::Method;
                let dst_name = match self.member_dst_name {
                    Some(ref name) => name,
                    // parameters may be mapped without the method
                    None => return Ok(is_method),
                };
                let tag = if is_method { "MD" } else { "FD" };
                writeln!(self.writer, "{} {} {} {} {}", tag, self.class_src_name, self.member_src_name, src_desc, dst_name)?;
                Ok(is_method)
            }
            MappedElementKind::MethodArg => {
                if let (Some(position), Some(dst_name)) = (self.arg_position, self.arg_dst_name.as_ref()) {
                    writeln!(self.writer, "MP {} {} {} {} {}", self.class_src_name, self.member_src_name, src_desc, position, dst_name)?;
                }
                Ok(false)
            }
            MappedElementKind::Class | MappedElementKind::MethodVar => Ok(false),
        }
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for JamFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::{DecliningTree, MemoryMappingTree};

    #[test]
    fn reads_srg() {
        let text = "PK: ./ pkg\nCL: a pkg/Named\nFD: a/b pkg/Named/count\nMD: a/c (I)V pkg/Named/run (I)V\nFD: x/y z/w\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("pkg/Named"));
        let field = class.field("b", None).unwrap();
        assert_eq!(field.src_desc, None);
        assert_eq!(field.dst_name(0), Some("count"));
        assert_eq!(class.method("c", Some("(I)V")).unwrap().dst_name(0), Some("run"));
        // the owner of a member line is mapped too
        assert_eq!(tree.class("x").unwrap().dst_name(0), Some("z"));
    }
    #[test]
    fn reads_xsrg() {
        let text = "CL: a b\nFD: a/f La; b/g Lb;\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let field = tree.class("a").unwrap().field("f", Some("La;")).unwrap();
        assert_eq!(field.dst_name(0), Some("g"));
        assert_eq!(field.dst_descs[0].as_ref().map(String::as_str), Some("Lb;"));
    }
    #[test]
    fn invalid_member_name() {
        let err = read(&b"CL: a b\nFD: f g\n"[..], &mut MemoryMappingTree::new()).unwrap_err();
        let malformed = err.downcast_ref::<crate::error::MalformedMapping>().unwrap();
        assert_eq!(malformed.line, 2);
    }
    #[test]
    fn writes_srg() {
        let text = "CL: a pkg/Named\nFD: a/b pkg/Named/count\nMD: a/c (La;)V pkg/Named/run (Lpkg/Named;)V\n";
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        let mut writer = SrgFileWriter::new(Vec::new(), false);
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), text);
    }
    #[test]
    fn jam_round_trip() {
        let text = "CL a pkg/Named\nFD a b I count\nMD a c (II)V run\nMP a c (II)V 0 x\nMP a c (II)V 1 I y\n";
        let mut tree = MemoryMappingTree::new();
        read_jam(text.as_bytes(), &mut tree).unwrap();
        let method = tree.class("a").unwrap().method("c", Some("(II)V")).unwrap();
        assert_eq!(method.dst_name(0), Some("run"));
        assert_eq!(method.args.len(), 2);
        assert_eq!(method.args[1].arg_position, Some(1));
        assert_eq!(method.args[1].dst_name(0), Some("y"));
        let mut writer = JamFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert_eq!(
            String::from_utf8(writer.into_inner()).unwrap(),
            "CL a pkg/Named\nFD a b I count\nMD a c (II)V run\nMP a c (II)V 0 x\nMP a c (II)V 1 y\n"
        );
    }
    #[test]
    fn declined_class_skips_members() {
        let text = "CL: a b\nFD: a/f b/g\nMD: a/m ()V b/n ()V\nCL: c d\nFD: c/h d/i\n";
        let mut visitor = DecliningTree::new(MappedElementKind::Class);
        read(text.as_bytes(), &mut visitor).unwrap();
        let first = visitor.tree.class("a").unwrap();
        assert_eq!(first.dst_name(0), Some("b"));
        assert!(first.fields.is_empty());
        assert!(first.methods.is_empty());
        let second = visitor.tree.class("c").unwrap();
        assert_eq!(second.dst_name(0), Some("d"));
        assert!(second.fields.is_empty());
    }
}
