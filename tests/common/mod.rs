#![allow(dead_code)]
use failure::Error;

use mapping_io::{MappedElementKind, MappingFlags, MappingVisitor};

/// Records every call as a line of text
pub struct RecordingVisitor {
    pub flags: MappingFlags,
    /// How many times `visit_end` asks for another pass
    pub extra_passes: usize,
    /// Returns false from every `visit_class`
    pub decline_classes: bool,
    /// Returns false from `visit_element_content` for this kind
    pub declined_content: Option<MappedElementKind>,
    pub calls: Vec<String>,
}
impl RecordingVisitor {
    pub fn new() -> RecordingVisitor {
        RecordingVisitor::with_flags(MappingFlags::empty())
    }
    pub fn with_flags(flags: MappingFlags) -> RecordingVisitor {
        RecordingVisitor { flags, extra_passes: 0, decline_classes: false, declined_content: None, calls: Vec::new() }
    }
    pub fn count(&self, call: &str) -> usize {
        self.calls.iter().filter(|recorded| *recorded == call).count()
    }
    pub fn count_prefixed(&self, prefix: &str) -> usize {
        self.calls.iter().filter(|recorded| recorded.starts_with(prefix)).count()
    }
    fn record(&mut self, call: String) {
        self.calls.push(call);
    }
}
impl MappingVisitor for RecordingVisitor {
    fn flags(&self) -> MappingFlags {
        self.flags
    }
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.record("header".into());
        Ok(true)
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        self.record(format!("namespaces {} {}", src_namespace, dst_namespaces.join(",")));
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        self.record(format!("metadata {} {:?}", key, value));
        Ok(())
    }
    fn visit_content(&mut self) -> Result<bool, Error> {
        self.record("content".into());
        Ok(true)
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.record(format!("class {}", src_name));
        Ok(!self.decline_classes)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.record(format!("field {} {:?}", src_name, src_desc));
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.record(format!("method {} {:?}", src_name, src_desc));
        Ok(true)
    }
    fn visit_method_arg(&mut self, arg_position: Option<u32>, lv_index: Option<u32>, src_name: Option<&str>) -> Result<bool, Error> {
        self.record(format!("arg {:?} {:?} {:?}", arg_position, lv_index, src_name));
        Ok(true)
    }
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.record(format!("var {:?} {:?} {:?} {:?} {:?}", lvt_row_index, lv_index, start_op_idx, end_op_idx, src_name));
        Ok(true)
    }
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.record("end".into());
        if self.extra_passes > 0 {
            self.extra_passes -= 1;
            return Ok(false)
        }
        Ok(true)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        self.record(format!("dst_name {} {} {}", kind.name(), namespace, name));
        Ok(())
    }
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        self.record(format!("dst_desc {} {} {}", kind.name(), namespace, desc));
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        self.record(format!("element_content {}", kind.name()));
        Ok(self.declined_content != Some(kind))
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        self.record(format!("comment {} {}", kind.name(), comment));
        Ok(())
    }
}
