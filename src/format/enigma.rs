//! Enigma mappings, as a single file or as a directory with one file per outermost class.
//!
//! Columns are separated by spaces and nesting is expressed by tab indentation:
//!
//! ```text
//! CLASS a pkg/Named
//! 	COMMENT A class
//! 	FIELD b count I
//! 	METHOD c run (I)V
//! 		ARG 1 speed
//! 	CLASS a$d Inner
//! ```
//!
//! Nested classes may be written with their inner name only.
//! The full name is formed by joining it to the outer name with `$`.
use std::ffi::OsStr;
use std::fs::{self, File, OpenOptions};
use std::io::{self, BufRead, BufReader, BufWriter, Cursor, Read, Write};
use std::path::{Component, Path, PathBuf};

use failure::Error;
use ignore::WalkBuilder;
use log::{debug, trace};

use crate::error::{UnsupportedOperation, VisitorContractViolation};
use crate::format::{self, ColumnFileReader};
use crate::tree::MemoryMappingTree;
use crate::util::{self, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

const FILE_EXT: &str = "mapping";

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
            read_content(reader, visitor)?;
        }
        Ok(())
    })
}

fn read_content<R: Read>(reader: &mut ColumnFileReader<R>, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    let mut state = EnigmaReader { comment: String::new() };
    loop {
        if reader.next_col_matching("CLASS")? {
            state.read_class(reader, 0, None, None, visitor)?;
        }
        if !reader.next_line(0)? {
            return Ok(())
        }
    }
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum ClassState {
    Unvisited,
    Visited,
    Skipped,
}

struct EnigmaReader {
    /// Comment lines collected for the next element
    comment: String,
}
impl EnigmaReader {
    fn read_class<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        indent: usize,
        outer_src: Option<&str>,
        outer_dst: Option<&str>,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        let src_inner = reader.require_col(false, "class name")?;
        let src_name = match outer_src {
            Some(outer) if !src_inner.contains('$') => format!("{}${}", outer, src_inner),
            _ => src_inner.clone(),
        };
        let dst_inner = reader.next_col(false)?;
        let dst_name = match (outer_src, outer_dst, dst_inner) {
            // an unmapped half falls back to the source name
            (_, Some(outer), dst_inner) => Some(format!("{}${}", outer, dst_inner.unwrap_or(src_inner))),
            (Some(outer), None, Some(dst_inner)) => Some(format!("{}${}", outer, dst_inner)),
            (_, None, dst_inner) => dst_inner,
        };
        self.read_class_body(reader, indent, &src_name, dst_name.as_ref().map(String::as_str), visitor)
    }
    fn read_class_body<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        indent: usize,
        src_name: &str,
        dst_name: Option<&str>,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        let mut visited = false;
        let mut state = ClassState::Unvisited;
        while reader.next_line(indent + 1)? {
            if reader.next_col_matching("CLASS")? {
                if !visited || !self.comment.is_empty() {
                    self.visit_class(src_name, dst_name, state, visitor)?;
                    visited = true;
                }
                self.read_class(reader, indent + 1, Some(src_name), dst_name, visitor)?;
                // the visitor moved on to the nested class
                state = ClassState::Unvisited;
            } else if reader.next_col_matching("COMMENT")? {
                self.read_comment(reader)?;
            } else {
                let kind = if reader.next_col_matching("METHOD")? {
                    MappedElementKind::Method
                } else if reader.next_col_matching("FIELD")? {
                    MappedElementKind::Field
                } else {
                    continue;
                };
                state = self.visit_class(src_name, dst_name, state, visitor)?;
                visited = true;
                if state == ClassState::Skipped {
                    continue;
                }
                let member_name = reader.require_col(false, "member name")?;
                let dst_or_desc = reader.require_col(false, "member destination name or descriptor")?;
                let (member_dst, src_desc) = match reader.next_col(false)? {
                    Some(desc) => (Some(dst_or_desc), desc),
                    None => (None, dst_or_desc),
                };
                let visit = match kind {
                    MappedElementKind::Field => visitor.visit_field(&member_name, Some(&src_desc))?,
                    _ => visitor.visit_method(&member_name, Some(&src_desc))?,
                };
                if !visit {
                    continue;
                }
                if let Some(member_dst) = member_dst.filter(|name| !name.is_empty()) {
                    visitor.visit_dst_name(kind, 0, &member_dst)?;
                }
                match kind {
                    MappedElementKind::Method => self.read_method(reader, indent, visitor)?,
                    _ => self.read_element(reader, kind, indent, visitor)?,
                }
            }
        }
        if !visited || !self.comment.is_empty() {
            self.visit_class(src_name, dst_name, state, visitor)?;
        }
        Ok(())
    }
    /// Visits the class unless it is already the current one, attaching any pending comment
    fn visit_class(
        &mut self,
        src_name: &str,
        dst_name: Option<&str>,
        state: ClassState,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<ClassState, Error> {
        if state != ClassState::Unvisited && self.comment.is_empty() {
            return Ok(state)
        }
        let mut visit = visitor.visit_class(src_name)?;
        if visit {
            if let Some(dst_name) = dst_name.filter(|name| !name.is_empty()) {
                visitor.visit_dst_name(MappedElementKind::Class, 0, dst_name)?;
            }
            visit = visitor.visit_element_content(MappedElementKind::Class)?;
        }
        if !self.comment.is_empty() {
            if visit {
                visitor.visit_comment(MappedElementKind::Class, &self.comment)?;
            }
            self.comment.clear();
        }
        Ok(if visit { ClassState::Visited } else { ClassState::Skipped })
    }
    fn read_method<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        indent: usize,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        if !visitor.visit_element_content(MappedElementKind::Method)? {
            return Ok(())
        }
        while reader.next_line(indent + 2)? {
            if reader.next_col_matching("COMMENT")? {
                self.read_comment(reader)?;
                continue;
            }
            self.submit_comment(MappedElementKind::Method, visitor)?;
            if reader.next_col_matching("ARG")? {
                let lv_index = match reader.next_int_col()? {
                    Some(lv_index) => lv_index,
                    None => return Err(reader.malformed("missing parameter lv index")),
                };
                if visitor.visit_method_arg(None, Some(lv_index), None)? {
                    if let Some(dst_name) = reader.next_col(false)?.filter(|name| !name.is_empty()) {
                        visitor.visit_dst_name(MappedElementKind::MethodArg, 0, &dst_name)?;
                    }
                    self.read_element(reader, MappedElementKind::MethodArg, indent, visitor)?;
                }
            }
        }
        self.submit_comment(MappedElementKind::Method, visitor)
    }
    fn read_element<R: Read>(
        &mut self,
        reader: &mut ColumnFileReader<R>,
        kind: MappedElementKind,
        indent: usize,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<(), Error> {
        if !visitor.visit_element_content(kind)? {
            return Ok(())
        }
        while reader.next_line(indent + kind.level() + 1)? {
            if reader.next_col_matching("COMMENT")? {
                self.read_comment(reader)?;
            }
        }
        self.submit_comment(kind, visitor)
    }
    fn read_comment<R: Read>(&mut self, reader: &mut ColumnFileReader<R>) -> Result<(), Error> {
        if !self.comment.is_empty() {
            self.comment.push('\n');
        }
        if let Some(text) = reader.next_cols(true)? {
            self.comment.push_str(&text);
        }
        Ok(())
    }
    fn submit_comment(&mut self, kind: MappedElementKind, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        if !self.comment.is_empty() {
            visitor.visit_comment(kind, &self.comment)?;
            self.comment.clear();
        }
        Ok(())
    }
}

/// Every enigma file below `dir`, in a stable order
pub(crate) fn mapping_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
    let mut files = Vec::new();
    for entry in WalkBuilder::new(dir).standard_filters(false).build() {
        let entry = entry?;
        let is_file = entry.file_type().map_or(false, |file_type| file_type.is_file());
        if is_file && entry.path().extension() == Some(OsStr::new(FILE_EXT)) {
            files.push(entry.into_path());
        }
    }
    files.sort();
    Ok(files)
}

#[inline]
pub fn read_dir(dir: &Path, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    read_dir_with_namespaces(dir, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK, visitor)
}

/// Reads every enigma file below `dir` as one mapping document.
///
/// Files are read in path order. Multiple passes replay an in-memory copy of all files,
/// so the directory is only read once.
pub fn read_dir_with_namespaces(
    dir: &Path,
    src_namespace: &str,
    dst_namespace: &str,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    if !dir.is_dir() {
        return Err(io::Error::new(io::ErrorKind::NotFound, format!("Not a directory: {}", dir.display())).into())
    }
    let files = mapping_files(dir)?;
    debug!("Reading {} enigma files from {}", files.len(), dir.display());
    let flags = visitor.flags();
    if flags.contains(MappingFlags::NEEDS_ELEMENT_UNIQUENESS) {
        let mut tree = MemoryMappingTree::new();
        let sources = files.iter().map(|path| -> Result<_, Error> { Ok(BufReader::new(File::open(path)?)) });
        read_dir_pass(sources, src_namespace, dst_namespace, &mut tree)?;
        tree.visit_end()?;
        return tree.accept(visitor)
    }
    if flags.contains(MappingFlags::NEEDS_MULTIPLE_PASSES) {
        let contents = files.iter().map(fs::read).collect::<Result<Vec<_>, _>>()?;
        loop {
            let sources = contents.iter().map(|data| Ok::<_, Error>(Cursor::new(&data[..])));
            read_dir_pass(sources, src_namespace, dst_namespace, visitor)?;
            if visitor.visit_end()? {
                return Ok(())
            }
            trace!("Replaying {} buffered enigma files", contents.len());
        }
    }
    let sources = files.iter().map(|path| -> Result<_, Error> { Ok(BufReader::new(File::open(path)?)) });
    read_dir_pass(sources, src_namespace, dst_namespace, visitor)?;
    if !visitor.visit_end()? {
        return Err(VisitorContractViolation::repeated_visitation().into())
    }
    Ok(())
}

fn read_dir_pass<I, R>(
    sources: I,
    src_namespace: &str,
    dst_namespace: &str,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> where I: Iterator<Item=Result<R, Error>>, R: Read {
    format::visit_header(visitor, src_namespace, &[dst_namespace.to_owned()], &[])?;
    if !visitor.visit_content()? {
        return Ok(())
    }
    let mut delegate = FileContent { next: visitor };
    for source in sources {
        read_with_namespaces(source?, src_namespace, dst_namespace, &mut delegate)?;
    }
    Ok(())
}

/// Forwards the content of a single file, the header and end belong to the whole directory
struct FileContent<'a> {
    next: &'a mut dyn MappingVisitor,
}
impl<'a> MappingVisitor for FileContent<'a> {
    #[inline]
    fn visit_header(&mut self) -> Result<bool, Error> {
        Ok(false)
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    #[inline]
    fn visit_content(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
    #[inline]
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.next.visit_class(src_name)
    }
    #[inline]
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.next.visit_field(src_name, src_desc)
    }
    #[inline]
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.next.visit_method(src_name, src_desc)
    }
    #[inline]
    fn visit_method_arg(&mut self, arg_position: Option<u32>, lv_index: Option<u32>, src_name: Option<&str>) -> Result<bool, Error> {
        self.next.visit_method_arg(arg_position, lv_index, src_name)
    }
    #[inline]
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.next.visit_method_var(lvt_row_index, lv_index, start_op_idx, end_op_idx, src_name)
    }
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
    #[inline]
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        self.next.visit_dst_name(kind, namespace, name)
    }
    #[inline]
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        self.next.visit_dst_desc(kind, namespace, desc)
    }
    #[inline]
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        self.next.visit_element_content(kind)
    }
    #[inline]
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        self.next.visit_comment(kind, comment)
    }
}

/// The position of the `$` ending the outer class name that starts at `start`.
///
/// A `$` directly after a package separator starts a name instead of ending one.
fn next_outer_end(name: &str, mut start: usize) -> Option<usize> {
    let bytes = name.as_bytes();
    loop {
        let search = bytes.get(start + 1..)?;
        let pos = start + 1 + search.iter().position(|&b| b == b'$')?;
        if bytes[pos - 1] != b'/' {
            return Some(pos)
        }
        start = pos + 1;
    }
}

/// Where the lines of an [`EnigmaWriter`] go
pub trait EnigmaOutput {
    /// Called before every class with its source and destination names.
    ///
    /// Returns the last class already written to the destination, if it changed.
    fn start_class(&mut self, src_name: &str, dst_name: Option<&str>) -> Result<Option<String>, Error>;
    fn output(&mut self) -> Result<&mut dyn Write, Error>;
    fn start(&mut self) -> Result<(), Error> {
        Ok(())
    }
    fn close(&mut self) -> Result<(), Error>;
}

pub struct SingleFile<W>(W);
impl<W: Write> EnigmaOutput for SingleFile<W> {
    #[inline]
    fn start_class(&mut self, _src_name: &str, _dst_name: Option<&str>) -> Result<Option<String>, Error> {
        Ok(None)
    }
    #[inline]
    fn output(&mut self) -> Result<&mut dyn Write, Error> {
        Ok(&mut self.0)
    }
    fn close(&mut self) -> Result<(), Error> {
        self.0.flush()?;
        Ok(())
    }
}

/// One file per outermost class below a directory
pub struct Directory {
    dir: PathBuf,
    delete_existing_files: bool,
    current: Option<(String, BufWriter<File>)>,
}
impl Directory {
    fn delete_existing(&self) -> Result<(), Error> {
        if !self.dir.exists() {
            return Ok(())
        }
        let mut dirs = Vec::new();
        for entry in WalkBuilder::new(&self.dir).standard_filters(false).build() {
            let entry = entry?;
            let file_type = match entry.file_type() {
                Some(file_type) => file_type,
                None => continue,
            };
            if file_type.is_dir() {
                if entry.depth() > 0 {
                    dirs.push(entry.into_path());
                }
            } else if entry.path().extension() == Some(OsStr::new(FILE_EXT)) {
                fs::remove_file(entry.path())?;
            }
        }
        // innermost directories first, so emptied parents go too
        dirs.sort_by(|a, b| b.components().count().cmp(&a.components().count()));
        for dir in dirs {
            if fs::read_dir(&dir)?.next().is_none() {
                fs::remove_dir(&dir)?;
            }
        }
        Ok(())
    }
    fn open(&mut self, name: &str) -> Result<Option<String>, Error> {
        let valid = Path::new(name).components().all(|component| match component {
            Component::Normal(_) => true,
            _ => false,
        });
        if !valid || name.is_empty() {
            return Err(UnsupportedOperation::new(format!("invalid class name {:?}", name)).into())
        }
        let file = self.dir.join(format!("{}.{}", name, FILE_EXT));
        if let Some((_, mut writer)) = self.current.take() {
            writer.flush()?;
        }
        let last_written = if file.exists() {
            last_written_class(&file)?
        } else {
            if let Some(parent) = file.parent() {
                fs::create_dir_all(parent)?;
            }
            String::new()
        };
        trace!("Writing class {} to {}", name, file.display());
        let writer = OpenOptions::new().append(true).create(true).open(&file)?;
        self.current = Some((name.to_owned(), BufWriter::new(writer)));
        Ok(Some(last_written))
    }
}
/// The full name of the last class declared in an existing file
fn last_written_class(file: &Path) -> Result<String, Error> {
    let mut parts: Vec<String> = Vec::new();
    for line in BufReader::new(File::open(file)?).lines() {
        let line = line?;
        let content = line.trim_start_matches('\t');
        let depth = line.len() - content.len();
        if content.starts_with("CLASS ") {
            let name = content["CLASS ".len()..].split(' ').next().unwrap_or("");
            parts.truncate(depth);
            parts.push(name.to_owned());
        }
    }
    Ok(parts.join("$"))
}
impl EnigmaOutput for Directory {
    fn start_class(&mut self, src_name: &str, dst_name: Option<&str>) -> Result<Option<String>, Error> {
        let name = dst_name.unwrap_or(src_name);
        let same_file = match self.current {
            Some((ref current, _)) => {
                name.starts_with(current.as_str())
                    && (name.len() == current.len() || name.as_bytes()[current.len()] == b'$')
            }
            None => false,
        };
        if same_file {
            return Ok(None)
        }
        let outermost = match next_outer_end(name, 0) {
            Some(end) => &name[..end],
            None => name,
        };
        self.open(outermost)
    }
    fn output(&mut self) -> Result<&mut dyn Write, Error> {
        match self.current {
            Some((_, ref mut writer)) => Ok(writer),
            None => Err(UnsupportedOperation::new("member visited outside of a class").into()),
        }
    }
    fn start(&mut self) -> Result<(), Error> {
        if self.delete_existing_files {
            debug!("Deleting existing enigma files in {}", self.dir.display());
            self.delete_existing()?;
        }
        Ok(())
    }
    fn close(&mut self) -> Result<(), Error> {
        if let Some((_, mut writer)) = self.current.take() {
            writer.flush()?;
        }
        Ok(())
    }
}

pub type EnigmaFileWriter<W> = EnigmaWriter<SingleFile<W>>;
pub type EnigmaDirWriter = EnigmaWriter<Directory>;

/// Writes enigma mappings of the first destination namespace
pub struct EnigmaWriter<O> {
    output: O,
    /// The nesting depth of the current class
    indent: usize,
    src_class_name: String,
    dst_class_name: Option<String>,
    last_written_class: String,
    desc: Option<String>,
}
impl<W: Write> EnigmaWriter<SingleFile<W>> {
    pub fn new(writer: W) -> EnigmaFileWriter<W> {
        EnigmaWriter::with_output(SingleFile(writer))
    }
    pub fn into_inner(self) -> W {
        (self.output).0
    }
}
impl EnigmaWriter<Directory> {
    /// With `delete_existing_files`, enigma files already in `dir` are removed when the header is visited
    pub fn new(dir: PathBuf, delete_existing_files: bool) -> Result<EnigmaDirWriter, Error> {
        let dir = if dir.is_absolute() { dir } else { std::env::current_dir()?.join(dir) };
        Ok(EnigmaWriter::with_output(Directory { dir, delete_existing_files, current: None }))
    }
}
#[inline]
fn write_indent(out: &mut dyn Write, count: usize) -> io::Result<()> {
    for _ in 0..count {
        out.write_all(b"\t")?;
    }
    Ok(())
}
impl<O: EnigmaOutput> EnigmaWriter<O> {
    fn with_output(output: O) -> EnigmaWriter<O> {
        EnigmaWriter {
            output,
            indent: 0,
            src_class_name: String::new(),
            dst_class_name: None,
            last_written_class: String::new(),
            desc: None,
        }
    }
    /// Writes the declarations of the current class and every outer class that differs from the last written one
    fn write_class_declarations(&mut self) -> Result<(), Error> {
        let src = self.src_class_name.as_str();
        let dst = self.dst_class_name.as_ref().map(String::as_str);
        let last = self.last_written_class.as_bytes();
        let out = self.output.output()?;
        let mut indent = 0;
        let mut src_start = 0;
        loop {
            let src_end = next_outer_end(src, src_start).unwrap_or(src.len());
            let part = &src[src_start..src_end];
            let already_written = last.get(src_start..src_end) == Some(part.as_bytes())
                && (src_end >= last.len() || last[src_end] == b'$');
            if !already_written {
                write_indent(out, indent)?;
                write!(out, "CLASS {}", part)?;
                if let Some(dst) = dst {
                    let mut dst_start = Some(0);
                    for _ in 0..indent {
                        dst_start = dst_start.and_then(|start| next_outer_end(dst, start)).map(|end| end + 1);
                    }
                    if let Some(dst_start) = dst_start {
                        let dst_end = next_outer_end(dst, dst_start).unwrap_or(dst.len());
                        let dst_part = &dst[dst_start..dst_end];
                        // the innermost destination is always written
                        if dst_part != part || dst_end == dst.len() {
                            write!(out, " {}", dst_part)?;
                        }
                    }
                }
                out.write_all(b"\n")?;
            }
            indent += 1;
            src_start = src_end + 1;
            if src_start >= src.len() {
                break;
            }
        }
        self.indent = indent;
        self.last_written_class = self.src_class_name.clone();
        self.dst_class_name = None;
        Ok(())
    }
}
impl<O: EnigmaOutput> MappingVisitor for EnigmaWriter<O> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_ELEMENT_UNIQUENESS | MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC
    }
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.output.start()?;
        Ok(false)
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.src_class_name = src_name.into();
        self.dst_class_name = None;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let desc = match src_desc {
            Some(desc) => desc,
            None => return Ok(false),
        };
        let out = self.output.output()?;
        write_indent(out, self.indent)?;
        write!(out, "FIELD {}", src_name)?;
        self.desc = Some(desc.into());
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let desc = match src_desc {
            Some(desc) => desc,
            None => return Ok(false),
        };
        let out = self.output.output()?;
        write_indent(out, self.indent)?;
        write!(out, "METHOD {}", src_name)?;
        self.desc = Some(desc.into());
        Ok(true)
    }
    fn visit_method_arg(&mut self, _arg_position: Option<u32>, lv_index: Option<u32>, _src_name: Option<&str>) -> Result<bool, Error> {
        let lv_index = match lv_index {
            Some(lv_index) => lv_index,
            None => return Ok(false),
        };
        let out = self.output.output()?;
        write_indent(out, self.indent + 1)?;
        write!(out, "ARG {}", lv_index)?;
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
        self.output.close()?;
        Ok(true)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        if namespace != 0 {
            return Ok(())
        }
        match kind {
            MappedElementKind::Class => self.dst_class_name = Some(name.into()),
            _ => write!(self.output.output()?, " {}", name)?,
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        match kind {
            MappedElementKind::Class => {
                let dst = self.dst_class_name.as_ref().map(String::as_str);
                if let Some(last_written) = self.output.start_class(&self.src_class_name, dst)? {
                    self.last_written_class = last_written;
                }
                self.write_class_declarations()?;
            }
            MappedElementKind::Field | MappedElementKind::Method => {
                let desc = self.desc.take().unwrap_or_default();
                writeln!(self.output.output()?, " {}", desc)?;
            }
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => {
                self.output.output()?.write_all(b"\n")?;
            }
        }
        Ok(true)
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        let indent = self.indent + kind.level();
        let out = self.output.output()?;
        for line in comment.split('\n') {
            write_indent(out, indent)?;
            if line.is_empty() {
                out.write_all(b"COMMENT\n")?;
            } else {
                writeln!(out, "COMMENT {}", util::escape(line))?;
            }
        }
        Ok(())
    }
}
impl<O: EnigmaOutput> MappingWriter for EnigmaWriter<O> {
    #[inline]
    fn close(&mut self) -> Result<(), Error> {
        self.output.close()
    }
}

#[cfg(test)]
mod test {
    use super::*;

    const SAMPLE: &str = "CLASS a pkg/Named
\tCOMMENT A class
\tCOMMENT with two lines
\tFIELD b count I
\tMETHOD c run (I)V
\t\tCOMMENT Runs
\t\tARG 1 speed
\tCLASS d Inner
\t\tFIELD e I
CLASS f
\tMETHOD g (J)V
";

    #[test]
    fn nested_class_names() {
        let mut tree = MemoryMappingTree::new();
        read("CLASS A B\n\tCLASS Inner Renamed\n".as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.class("A").unwrap().dst_name(0), Some("B"));
        assert_eq!(tree.class("A$Inner").unwrap().dst_name(0), Some("B$Renamed"));
        let mut tree = MemoryMappingTree::new();
        read("CLASS A\n\tCLASS Inner Renamed\n\tCLASS Kept\n".as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.class("A").unwrap().dst_name(0), None);
        assert_eq!(tree.class("A$Inner").unwrap().dst_name(0), Some("A$Renamed"));
        assert_eq!(tree.class("A$Kept").unwrap().dst_name(0), None);
    }
    #[test]
    fn reads_file() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.src_namespace(), Some(NS_SOURCE_FALLBACK));
        let class = tree.class("a").unwrap();
        assert_eq!(class.comment.as_ref().map(String::as_str), Some("A class\nwith two lines"));
        assert_eq!(class.field("b", Some("I")).unwrap().dst_name(0), Some("count"));
        let method = class.method("c", Some("(I)V")).unwrap();
        assert_eq!(method.dst_name(0), Some("run"));
        assert_eq!(method.comment.as_ref().map(String::as_str), Some("Runs"));
        assert_eq!(method.arg(1).unwrap().dst_name(0), Some("speed"));
        let inner = tree.class("a$d").unwrap();
        assert_eq!(inner.dst_name(0), Some("pkg/Named$Inner"));
        assert_eq!(inner.field("e", Some("I")).unwrap().dst_name(0), None);
        assert!(tree.class("f").unwrap().method("g", Some("(J)V")).is_some());
    }
    #[test]
    fn writes_file() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let mut writer = EnigmaFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        let written = String::from_utf8(writer.into_inner()).unwrap();
        assert_eq!(written, SAMPLE);
    }
    #[test]
    fn outer_ends() {
        assert_eq!(next_outer_end("a$b$c", 0), Some(1));
        assert_eq!(next_outer_end("a$b$c", 2), Some(3));
        assert_eq!(next_outer_end("pkg/$x", 0), None);
        assert_eq!(next_outer_end("abc", 0), None);
        assert_eq!(next_outer_end("", 0), None);
    }
}
