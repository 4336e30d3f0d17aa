//! ProGuard's `mapping.txt`, which uses java source syntax for names and types.
//!
//! ```text
//! com.example.Named -> a.b:
//!     int count -> c
//!     12:14:void run(int,java.lang.String) -> d
//! ```
//!
//! Line numbers are dropped. Inlined methods, which carry their original line numbers
//! or name another class before the method, are skipped.
use std::io::{Read, Write};

use failure::Error;

use crate::error::UnsupportedOperation;
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
    // indentation is insignificant, so pick a byte that never occurs
    let mut reader = ColumnFileReader::new(reader, b';', b' ');
    let dst_namespaces = [dst_namespace.to_owned()];
    format::read_passes(&mut reader, visitor, MappingFlags::empty(), |reader, visitor| {
        format::visit_header(visitor, src_namespace, &dst_namespaces, &[])?;
        if visitor.visit_content()? {
            let mut visit_class = false;
            loop {
                if let Some(line) = reader.next_cols(false)? {
                    let line = line.trim();
                    if !line.is_empty() && !line.starts_with('#') {
                        if line.ends_with(':') {
                            visit_class = read_class(reader, line, visitor)?;
                        } else if visit_class {
                            read_member(reader, line, visitor)?;
                        }
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

/// `<src> -> <dst>:`
fn read_class<R: Read>(reader: &ColumnFileReader<R>, line: &str, visitor: &mut dyn MappingVisitor) -> Result<bool, Error> {
    let pos = match line.find(" -> ") {
        Some(0) => return Err(reader.malformed(format!("empty source class in {:?}", line))),
        Some(pos) => pos,
        None => return Err(reader.malformed(format!("invalid separator in {:?}", line))),
    };
    if pos + 4 + 1 >= line.len() {
        return Err(reader.malformed(format!("empty destination class in {:?}", line)))
    }
    if !visitor.visit_class(&util::to_internal(&line[..pos]))? {
        return Ok(false)
    }
    let dst_name = util::to_internal(&line[pos + 4..line.len() - 1]);
    visitor.visit_dst_name(MappedElementKind::Class, 0, &dst_name)?;
    visitor.visit_element_content(MappedElementKind::Class)
}

/// `<type> <src> -> <dst>` for fields and
/// `[<start>:<end>:]<return type> <src>(<args>)[:<start>[:<end>]] -> <dst>` for methods
fn read_member<R: Read>(reader: &ColumnFileReader<R>, line: &str, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let parts: Vec<&str> = line.split(' ').collect();
    if parts.len() != 4 {
        return Err(reader.malformed(format!("expected 4 columns in {:?}", line)))
    }
    if parts[0].is_empty() || parts[1].is_empty() || parts[3].is_empty() {
        return Err(reader.malformed(format!("empty column in {:?}", line)))
    }
    if parts[2] != "->" {
        return Err(reader.malformed(format!("invalid separator in {:?}", line)))
    }
    let invalid_type = |ty: &str| reader.malformed(format!("invalid type {:?}", ty));
    let (kind, name, desc) = match parts[1].find('(') {
        None => {
            let mut desc = String::new();
            push_desc_type(parts[0], &mut desc).ok_or_else(|| invalid_type(parts[0]))?;
            (MappedElementKind::Field, parts[1], desc)
        }
        Some(args_start) => {
            // line numbers of the obfuscated code come first
            let return_type = parts[0].rsplit(':').next().unwrap_or(parts[0]);
            let signature = parts[1];
            let args_end = match signature[args_start..].find(')') {
                Some(offset) => args_start + offset,
                None => return Err(reader.malformed(format!("unterminated arguments in {:?}", line))),
            };
            if signature[..args_start].contains('.') || signature.len() != args_end + 1 {
                // inlined from another method
                return Ok(())
            }
            let mut desc = String::from("(");
            let args = &signature[args_start + 1..args_end];
            if !args.is_empty() {
                for arg in args.split(',') {
                    push_desc_type(arg, &mut desc).ok_or_else(|| invalid_type(arg))?;
                }
            }
            desc.push(')');
            push_desc_type(return_type, &mut desc).ok_or_else(|| invalid_type(return_type))?;
            (MappedElementKind::Method, &signature[..args_start], desc)
        }
    };
    let visit = match kind {
        MappedElementKind::Field => visitor.visit_field(name, Some(&desc))?,
        _ => visitor.visit_method(name, Some(&desc))?,
    };
    if visit {
        visitor.visit_dst_name(kind, 0, parts[3])?;
        visitor.visit_element_content(kind)?;
    }
    Ok(())
}

/// Appends the descriptor of a java source type like `int[]` or `java.lang.String`
fn push_desc_type(ty: &str, out: &mut String) -> Option<()> {
    let mut element = ty;
    while let Some(stripped) = strip_array(element) {
        out.push('[');
        element = stripped;
    }
    let primitive = match element {
        "void" => 'V',
        "boolean" => 'Z',
        "char" => 'C',
        "byte" => 'B',
        "short" => 'S',
        "int" => 'I',
        "float" => 'F',
        "long" => 'J',
        "double" => 'D',
        "" => return None,
        _ if element.contains(|c: char| c == '[' || c == ']') => return None,
        _ => {
            out.push('L');
            out.push_str(&util::to_internal(element));
            out.push(';');
            return Some(())
        }
    };
    out.push(primitive);
    Some(())
}

#[inline]
fn strip_array(ty: &str) -> Option<&str> {
    if ty.ends_with("[]") {
        Some(&ty[..ty.len() - 2])
    } else {
        None
    }
}

/// Parses the first type of a descriptor into java source syntax, returning the remainder
fn next_java_type(desc: &str) -> Option<(String, &str)> {
    let dimensions = desc.bytes().take_while(|&b| b == b'[').count();
    let element = &desc[dimensions..];
    let (mut result, rest) = match element.as_bytes().first()? {
        b'B' => ("byte".to_owned(), &element[1..]),
        b'S' => ("short".to_owned(), &element[1..]),
        b'I' => ("int".to_owned(), &element[1..]),
        b'J' => ("long".to_owned(), &element[1..]),
        b'F' => ("float".to_owned(), &element[1..]),
        b'D' => ("double".to_owned(), &element[1..]),
        b'C' => ("char".to_owned(), &element[1..]),
        b'Z' => ("boolean".to_owned(), &element[1..]),
        b'V' => ("void".to_owned(), &element[1..]),
        b'L' => {
            let end = element.find(';')?;
            (util::to_dotted(&element[1..end]), &element[end + 1..])
        }
        _ => return None,
    };
    for _ in 0..dimensions {
        result.push_str("[]");
    }
    Some((result, rest))
}

fn invalid_desc(desc: &str) -> Error {
    UnsupportedOperation::new(format!("invalid descriptor {:?}", desc)).into()
}

fn java_type(desc: &str) -> Result<String, Error> {
    match next_java_type(desc) {
        Some((ty, "")) => Ok(ty),
        _ => Err(invalid_desc(desc)),
    }
}

/// The return type and the comma separated argument types of a method descriptor
fn java_signature(desc: &str) -> Result<(String, String), Error> {
    if !desc.starts_with('(') {
        return Err(invalid_desc(desc))
    }
    let mut remaining = &desc[1..];
    let mut args = String::new();
    while !remaining.starts_with(')') {
        let (ty, rest) = next_java_type(remaining).ok_or_else(|| invalid_desc(desc))?;
        if !args.is_empty() {
            args.push(',');
        }
        args.push_str(&ty);
        remaining = rest;
    }
    Ok((java_type(&remaining[1..])?, args))
}

#[derive(Clone, Debug)]
enum DstNamespace {
    Index(usize),
    Name(String),
}

/// Writes a single destination namespace as ProGuard mappings.
///
/// Classes without a destination name are only written if some member is mapped.
pub struct ProGuardFileWriter<W: Write> {
    writer: W,
    namespace: DstNamespace,
    class_src_name: String,
    class_content_pending: bool,
    member_src_name: String,
    member_src_desc: String,
    dst_name: Option<String>,
}
impl<W: Write> ProGuardFileWriter<W> {
    /// Writes the first destination namespace
    #[inline]
    pub fn new(writer: W) -> ProGuardFileWriter<W> {
        ProGuardFileWriter::with_namespace(writer, 0)
    }
    pub fn with_namespace(writer: W, namespace: usize) -> ProGuardFileWriter<W> {
        ProGuardFileWriter::create(writer, DstNamespace::Index(namespace))
    }
    /// Writes the destination namespace with the given name, which must be declared by the source
    pub fn with_namespace_name(writer: W, namespace: &str) -> ProGuardFileWriter<W> {
        ProGuardFileWriter::create(writer, DstNamespace::Name(namespace.into()))
    }
    fn create(writer: W, namespace: DstNamespace) -> ProGuardFileWriter<W> {
        ProGuardFileWriter {
            writer, namespace,
            class_src_name: String::new(),
            class_content_pending: false,
            member_src_name: String::new(),
            member_src_desc: String::new(),
            dst_name: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer
    }
    fn namespace_index(&self) -> Option<usize> {
        match self.namespace {
            DstNamespace::Index(index) => Some(index),
            DstNamespace::Name(_) => None,
        }
    }
    fn write_class(&mut self, dst_name: &str) -> Result<(), Error> {
        writeln!(self.writer, "{} -> {}:", util::to_dotted(&self.class_src_name), util::to_dotted(dst_name))?;
        Ok(())
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
impl<W: Write> MappingVisitor for ProGuardFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        let index = match self.namespace {
            DstNamespace::Index(index) => index,
            DstNamespace::Name(ref name) => match dst_namespaces.iter().position(|namespace| namespace == name) {
                Some(index) => index,
                None => return Err(UnsupportedOperation::new(format!(
                    "destination namespace {:?} not in {:?}", name, dst_namespaces
                )).into()),
            },
        };
        if index >= dst_namespaces.len() {
            return Err(UnsupportedOperation::missing_namespace(index, dst_namespaces.len()).into())
        }
        self.namespace = DstNamespace::Index(index);
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class_src_name = src_name.into();
        self.class_content_pending = false;
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
        if self.namespace_index() == Some(namespace) {
            self.dst_name = Some(name.into());
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        let dst_name = match self.dst_name.take() {
            Some(name) => name,
            None if kind == MappedElementKind::Class => {
                self.class_content_pending = true;
                return Ok(true)
            }
            None => return Ok(false),
        };
        match kind {
            MappedElementKind::Class => {
                self.write_class(&dst_name)?;
                return Ok(true)
            }
            MappedElementKind::Field | MappedElementKind::Method => {}
            _ => return Ok(false),
        }
        if self.class_content_pending {
            let src_name = self.class_src_name.clone();
            self.write_class(&src_name)?;
            self.class_content_pending = false;
        }
        // exactly four spaces
        if kind == MappedElementKind::Field {
            let ty = java_type(&self.member_src_desc)?;
            writeln!(self.writer, "    {} {} -> {}", ty, self.member_src_name, dst_name)?;
        } else {
            let (return_type, args) = java_signature(&self.member_src_desc)?;
            writeln!(self.writer, "    {} {}({}) -> {}", return_type, self.member_src_name, args, dst_name)?;
        }
        Ok(false)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for ProGuardFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        self.writer.flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    const SAMPLE: &str = "# compiler: R8\n\
        com.example.Named -> a.b:\n\
        \x20   int count -> c\n\
        \x20   java.lang.String[][] names -> d\n\
        \x20   12:14:void run(int,java.lang.String) -> e\n\
        \x20   com.example.Named copy() -> f\n\
        \x20   15:15:void run(int,java.lang.String):30:30 -> e\n\
        \x20   1:1:void com.example.Other.inlined():5:5 -> e\n";

    #[test]
    fn reads_simple_field() {
        let mut tree = MemoryMappingTree::new();
        read(&b"a.B -> c.D:\n    int e -> f\n"[..], &mut tree).unwrap();
        let class = tree.class("a/B").unwrap();
        assert_eq!(class.dst_name(0), Some("c/D"));
        let field = class.field("e", Some("I")).unwrap();
        assert_eq!(field.dst_name(0), Some("f"));
    }
    #[test]
    fn reads_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let class = tree.class("com/example/Named").unwrap();
        assert_eq!(class.dst_name(0), Some("a/b"));
        assert_eq!(class.field("names", Some("[[Ljava/lang/String;")).unwrap().dst_name(0), Some("d"));
        assert_eq!(class.method("run", Some("(ILjava/lang/String;)V")).unwrap().dst_name(0), Some("e"));
        assert_eq!(class.method("copy", Some("()Lcom/example/Named;")).unwrap().dst_name(0), Some("f"));
        assert_eq!(class.methods.len(), 2);
    }
    #[test]
    fn rejects_bad_lines() {
        let err = read(&b"a.B -> c.D:\n    int e f\n"[..], &mut MemoryMappingTree::new()).unwrap_err();
        assert_eq!(err.downcast_ref::<crate::error::MalformedMapping>().unwrap().line, 2);
        assert!(read(&b"a.B c.D:\n"[..], &mut MemoryMappingTree::new()).is_err());
    }
    #[test]
    fn writes_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let mut writer = ProGuardFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "com.example.Named -> a.b:\n\
            \x20   int count -> c\n\
            \x20   java.lang.String[][] names -> d\n\
            \x20   void run(int,java.lang.String) -> e\n\
            \x20   com.example.Named copy() -> f\n");
    }
    #[test]
    fn writes_unmapped_class_lazily() {
        let mut tree = MemoryMappingTree::new();
        tree.visit_namespaces("official", &["named".to_string()]).unwrap();
        tree.visit_class("a").unwrap();
        tree.visit_class("b").unwrap();
        tree.visit_field("c", Some("J")).unwrap();
        tree.visit_dst_name(MappedElementKind::Field, 0, "d").unwrap();
        let mut writer = ProGuardFileWriter::with_namespace_name(Vec::new(), "named");
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), "b -> b:\n    long c -> d\n");
    }
    #[test]
    fn unknown_namespace() {
        let mut writer = ProGuardFileWriter::with_namespace_name(Vec::new(), "missing");
        assert!(writer.visit_namespaces("a", &["b".to_string()]).is_err());
        let mut writer = ProGuardFileWriter::with_namespace(Vec::new(), 1);
        assert!(writer.visit_namespaces("a", &["b".to_string()]).is_err());
    }
}
