//! IntelliJ's migration maps, an XML document renaming classes.
//!
//! ```xml
//! <?xml version="1.0" encoding="UTF-8"?>
//! <migrationMap>
//!     <name value="Example"/>
//!     <entry oldName="com.example.Old" newName="com.example.New" type="class"/>
//! </migrationMap>
//! ```
//!
//! The `name`, `order` and `description` elements become metadata.
//! Package entries are skipped.
use std::io::{Read, Write};

use failure::Error;
use log::trace;
use quick_xml::events::{BytesDecl, BytesEnd, BytesStart, BytesText, Event};
use quick_xml::{Reader, Writer};

use crate::error::{MalformedMapping, VisitorContractViolation};
use crate::util::{self, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};
use crate::writer::MappingWriter;

/// The metadata key of the `order` element
pub const ORDER_KEY: &str = "migrationmap:order";
/// The name written when the source has none
pub const MISSING_NAME: &str = "Unnamed migration map";
pub const DEFAULT_ORDER: &str = "0";

#[derive(Default)]
struct Document {
    metadata: Vec<(String, String)>,
    entries: Vec<(String, String)>,
}

#[inline]
pub fn read<R: Read>(reader: R, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
    read_with_namespaces(reader, NS_SOURCE_FALLBACK, NS_TARGET_FALLBACK, visitor)
}

/// Reads the whole document into memory, so every further pass re-parses the same bytes
pub fn read_with_namespaces<R: Read>(
    mut reader: R,
    src_namespace: &str,
    dst_namespace: &str,
    visitor: &mut dyn MappingVisitor,
) -> Result<(), Error> {
    let mut data = Vec::new();
    reader.read_to_end(&mut data)?;
    let dst_namespaces = [dst_namespace.to_owned()];
    let replayable = visitor.flags().contains(MappingFlags::NEEDS_MULTIPLE_PASSES);
    loop {
        let document = parse(&data)?;
        if visitor.visit_header()? {
            visitor.visit_namespaces(src_namespace, &dst_namespaces)?;
            for &(ref key, ref value) in &document.metadata {
                visitor.visit_metadata(key, Some(value))?;
            }
        }
        if visitor.visit_content()? {
            for &(ref src_name, ref dst_name) in &document.entries {
                if visitor.visit_class(src_name)? {
                    visitor.visit_dst_name(MappedElementKind::Class, 0, dst_name)?;
                    visitor.visit_element_content(MappedElementKind::Class)?;
                }
            }
        }
        if visitor.visit_end()? {
            return Ok(())
        }
        if !replayable {
            return Err(VisitorContractViolation::repeated_visitation().into())
        }
        trace!("Re-parsing migration map for another pass");
    }
}

fn line_at(data: &[u8], pos: usize) -> usize {
    data[..pos.min(data.len())].iter().filter(|&&b| b == b'\n').count() + 1
}

fn attribute(element: &BytesStart, name: &str) -> Result<Option<String>, Error> {
    Ok(match element.try_get_attribute(name)? {
        Some(attribute) => Some(attribute.unescape_value()?.into_owned()),
        None => None,
    })
}

#[cold]
fn malformed(data: &[u8], reader: &Reader<&[u8]>, reason: String) -> Error {
    MalformedMapping::new(line_at(data, reader.buffer_position()), reason).into()
}

fn parse(data: &[u8]) -> Result<Document, Error> {
    let mut reader = Reader::from_reader(data);
    reader.trim_text(true);
    let mut buf = Vec::new();
    let mut depth = 0usize;
    let mut document = Document::default();
    loop {
        buf.clear();
        let event = reader.read_event_into(&mut buf)?;
        // empty elements have no end, so only start elements nest
        let (element, nests) = match event {
            Event::Eof => break,
            Event::End(_) => {
                depth = depth.saturating_sub(1);
                continue;
            }
            Event::Start(ref element) => (element, true),
            Event::Empty(ref element) => (element, false),
            _ => continue,
        };
        let local_name = element.local_name();
        let name = local_name.as_ref();
        let expected_depth = if name == b"migrationMap" { 0 } else { 1 };
        if depth != expected_depth {
            return Err(malformed(data, &reader, format!("unexpected element at depth {}", depth)))
        }
        match name {
            b"name" | b"order" | b"description" => {
                let value = attribute(element, "value")?.unwrap_or_default();
                let key = match name {
                    b"name" if value == MISSING_NAME => None,
                    b"name" => Some("name"),
                    b"order" => Some(ORDER_KEY),
                    _ => Some("description"),
                };
                if let Some(key) = key {
                    document.metadata.push((key.to_owned(), value));
                }
            }
            b"entry" => {
                let kind = attribute(element, "type")?.unwrap_or_default();
                match kind.as_str() {
                    "class" => {
                        let src_name = attribute(element, "oldName")?.unwrap_or_default();
                        let dst_name = attribute(element, "newName")?.unwrap_or_default();
                        if src_name.is_empty() || dst_name.is_empty() {
                            return Err(malformed(data, &reader, "missing oldName or newName attribute".into()))
                        }
                        document.entries.push((util::to_internal(&src_name), util::to_internal(&dst_name)));
                    }
                    "package" => {}
                    "" => return Err(malformed(data, &reader, "missing type attribute".into())),
                    _ => return Err(malformed(data, &reader, format!("unexpected entry type {:?}", kind))),
                }
            }
            _ => {}
        }
        if nests {
            depth += 1;
        }
    }
    Ok(document)
}

/// Writes the classes with a destination name as migration map entries.
///
/// A `name` and an `order` are added ahead of the entries if the header had none.
pub struct MigrationMapFileWriter<W: Write> {
    writer: Writer<W>,
    started: bool,
    finished: bool,
    wrote_name: bool,
    wrote_order: bool,
    src_name: String,
    dst_name: Option<String>,
}
impl<W: Write> MigrationMapFileWriter<W> {
    pub fn new(writer: W) -> MigrationMapFileWriter<W> {
        MigrationMapFileWriter {
            writer: Writer::new(writer),
            started: false,
            finished: false,
            wrote_name: false,
            wrote_order: false,
            src_name: String::new(),
            dst_name: None,
        }
    }
    pub fn into_inner(self) -> W {
        self.writer.into_inner()
    }
    fn start(&mut self) -> Result<(), Error> {
        if !self.started {
            self.started = true;
            self.writer.write_event(Event::Decl(BytesDecl::new("1.0", Some("UTF-8"), None)))?;
            self.writer.write_event(Event::Text(BytesText::new("\n")))?;
            self.writer.write_event(Event::Start(BytesStart::new("migrationMap")))?;
        }
        Ok(())
    }
    fn write_element(&mut self, element: BytesStart) -> Result<(), Error> {
        self.writer.write_event(Event::Text(BytesText::new("\n\t")))?;
        self.writer.write_event(Event::Empty(element))?;
        Ok(())
    }
    fn write_value(&mut self, name: &str, value: &str) -> Result<(), Error> {
        let mut element = BytesStart::new(name);
        element.push_attribute(("value", value));
        self.write_element(element)
    }
    fn write_defaults(&mut self) -> Result<(), Error> {
        if !self.wrote_name {
            self.wrote_name = true;
            self.write_value("name", MISSING_NAME)?;
        }
        if !self.wrote_order {
            self.wrote_order = true;
            self.write_value("order", DEFAULT_ORDER)?;
        }
        Ok(())
    }
}
impl<W: Write> MappingVisitor for MigrationMapFileWriter<W> {
    fn flags(&self) -> MappingFlags {
        MappingFlags::NEEDS_ELEMENT_UNIQUENESS
    }
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.start()?;
        Ok(true)
    }
    fn visit_namespaces(&mut self, _src_namespace: &str, _dst_namespaces: &[String]) -> Result<(), Error> {
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        let element_name = match (key, value) {
            ("name", Some(_)) => {
                self.wrote_name = true;
                "name"
            }
            (ORDER_KEY, Some(_)) => {
                self.wrote_order = true;
                "order"
            }
            ("name", None) | (ORDER_KEY, None) => return Ok(()),
            _ => key,
        };
        match value {
            Some(value) => self.write_value(element_name, value),
            None => self.write_element(BytesStart::new(element_name)),
        }
    }
    fn visit_content(&mut self) -> Result<bool, Error> {
        self.start()?;
        self.write_defaults()?;
        Ok(true)
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.src_name = src_name.into();
        self.dst_name = None;
        Ok(true)
    }
    fn visit_field(&mut self, _src_name: &str, _src_desc: Option<&str>) -> Result<bool, Error> {
        Ok(false)
    }
    fn visit_method(&mut self, _src_name: &str, _src_desc: Option<&str>) -> Result<bool, Error> {
        Ok(false)
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
        if kind != MappedElementKind::Class {
            return Ok(false)
        }
        if let Some(dst_name) = self.dst_name.take() {
            self.start()?;
            let src_name = util::to_dotted(&self.src_name);
            let dst_name = util::to_dotted(&dst_name);
            let mut element = BytesStart::new("entry");
            element.push_attribute(("oldName", src_name.as_str()));
            element.push_attribute(("newName", dst_name.as_str()));
            element.push_attribute(("type", "class"));
            self.write_element(element)?;
        }
        Ok(false)
    }
    fn visit_comment(&mut self, _kind: MappedElementKind, _comment: &str) -> Result<(), Error> {
        Ok(())
    }
}
impl<W: Write> MappingWriter for MigrationMapFileWriter<W> {
    fn close(&mut self) -> Result<(), Error> {
        if self.started && !self.finished {
            self.finished = true;
            self.write_defaults()?;
            self.writer.write_event(Event::Text(BytesText::new("\n")))?;
            self.writer.write_event(Event::End(BytesEnd::new("migrationMap")))?;
            self.writer.write_event(Event::Text(BytesText::new("\n")))?;
        }
        self.writer.get_mut().flush()?;
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    const SAMPLE: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n\
        <migrationMap>\n\
        \t<name value=\"Rename\"/>\n\
        \t<order value=\"1\"/>\n\
        \t<description value=\"Moves things\"/>\n\
        \t<entry oldName=\"a.B\" newName=\"c.D\" type=\"class\"/>\n\
        </migrationMap>\n";

    #[test]
    fn reads_sample() {
        let text = SAMPLE.replace("</migrationMap>", "\t<entry oldName=\"a\" newName=\"c\" type=\"package\" recursive=\"true\"/>\n</migrationMap>");
        let mut tree = MemoryMappingTree::new();
        read(text.as_bytes(), &mut tree).unwrap();
        assert_eq!(tree.metadata_value("name"), Some("Rename"));
        assert_eq!(tree.metadata_value(ORDER_KEY), Some("1"));
        assert_eq!(tree.metadata_value("description"), Some("Moves things"));
        assert_eq!(tree.class("a/B").unwrap().dst_name(0), Some("c/D"));
        assert_eq!(tree.classes().count(), 1);
    }
    #[test]
    fn rejects_unknown_entries() {
        let text = "<migrationMap><entry oldName=\"a\" newName=\"b\" type=\"method\"/></migrationMap>";
        let err = read(text.as_bytes(), &mut MemoryMappingTree::new()).unwrap_err();
        assert!(err.downcast_ref::<MalformedMapping>().is_some());
        let nested = "<migrationMap><entry><entry/></entry></migrationMap>";
        assert!(read(nested.as_bytes(), &mut MemoryMappingTree::new()).is_err());
    }
    #[test]
    fn writes_sample() {
        let mut tree = MemoryMappingTree::new();
        read(SAMPLE.as_bytes(), &mut tree).unwrap();
        let mut writer = MigrationMapFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        assert_eq!(String::from_utf8(writer.into_inner()).unwrap(), SAMPLE);
    }
    #[test]
    fn writes_defaults() {
        let mut tree = MemoryMappingTree::new();
        tree.visit_namespaces("source", &["target".to_string()]).unwrap();
        tree.visit_class("a/B").unwrap();
        tree.visit_dst_name(MappedElementKind::Class, 0, "c/D").unwrap();
        let mut writer = MigrationMapFileWriter::new(Vec::new());
        tree.accept(&mut writer).unwrap();
        let text = String::from_utf8(writer.into_inner()).unwrap();
        let expected = format!(
            "<migrationMap>\n\t<name value=\"{}\"/>\n\t<order value=\"0\"/>\n\t<entry oldName=\"a.B\" newName=\"c.D\" type=\"class\"/>\n</migrationMap>\n",
            MISSING_NAME
        );
        assert!(text.ends_with(&expected), "{}", text);
    }
}
