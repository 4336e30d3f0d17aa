use failure::Error;

use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};

/// Skips every field and method that doesn't have a source descriptor
pub struct MissingDescFilter<V> {
    next: V,
}
impl<V: MappingVisitor> MissingDescFilter<V> {
    #[inline]
    pub fn new(next: V) -> MissingDescFilter<V> {
        MissingDescFilter { next }
    }
    #[inline]
    pub fn into_inner(self) -> V {
        self.next
    }
}
impl<V: MappingVisitor> MappingVisitor for MissingDescFilter<V> {
    #[inline]
    fn flags(&self) -> MappingFlags {
        self.next.flags()
    }
    #[inline]
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.next.visit_header()
    }
    #[inline]
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        self.next.visit_namespaces(src_namespace, dst_namespaces)
    }
    #[inline]
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        self.next.visit_metadata(key, value)
    }
    #[inline]
    fn visit_content(&mut self) -> Result<bool, Error> {
        self.next.visit_content()
    }
    #[inline]
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.next.visit_class(src_name)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        match src_desc {
            Some(_) => self.next.visit_field(src_name, src_desc),
            None => Ok(false),
        }
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        match src_desc {
            Some(_) => self.next.visit_method(src_name, src_desc),
            None => Ok(false),
        }
    }
    #[inline]
    fn visit_method_arg(
        &mut self,
        arg_position: Option<u32>,
        lv_index: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
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
        self.next.visit_end()
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

#[cfg(test)]
mod test {
    use super::*;
    use crate::tree::MemoryMappingTree;

    #[test]
    fn drops_members_without_descs() {
        let mut filter = MissingDescFilter::new(MemoryMappingTree::new());
        filter.visit_namespaces("source", &["target".to_string()]).unwrap();
        assert!(filter.visit_class("a").unwrap());
        assert!(!filter.visit_field("f", None).unwrap());
        assert!(filter.visit_field("g", Some("I")).unwrap());
        assert!(!filter.visit_method("m", None).unwrap());
        assert!(filter.visit_method("n", Some("()V")).unwrap());
        let tree = filter.into_inner();
        let class = tree.class("a").unwrap();
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.methods.len(), 1);
        assert_eq!(class.methods[0].src_name, "n");
    }
}
