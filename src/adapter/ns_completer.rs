use failure::Error;
use indexmap::IndexMap;
use itertools::Itertools;

use crate::error::UnsupportedOperation;
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};

/// Where a destination namespace takes its names from when they are missing
#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum Alternative {
    /// Never completed
    None,
    Source,
    Destination(usize),
}

/// Fills in missing destination names by copying them from other namespaces.
///
/// The alternatives map each destination namespace to the namespace it copies from.
/// Chains are followed until a name is found or the source namespace is reached.
/// A chain that loops back on itself leaves the name missing.
pub struct MappingNsCompleter<V> {
    next: V,
    /// `None` completes every destination namespace from the source namespace
    alternatives: Option<IndexMap<String, String>>,
    add_missing_namespaces: bool,
    alternatives_mapping: Vec<Alternative>,
    src_name: Option<String>,
    dst_names: Vec<Option<String>>,
    visited: Vec<bool>,
    relay_header_or_metadata: bool,
}
impl<V: MappingVisitor> MappingNsCompleter<V> {
    /// Completes every destination namespace with the source names
    #[inline]
    pub fn new(next: V) -> MappingNsCompleter<V> {
        MappingNsCompleter::with_alternatives(next, None, false)
    }
    /// Completes the keys of `alternatives` from the namespace they map to.
    ///
    /// With `add_missing_namespaces`, keys that aren't declared by the input are added as new
    /// destination namespaces.
    pub fn with_alternatives(
        next: V,
        alternatives: Option<IndexMap<String, String>>,
        add_missing_namespaces: bool,
    ) -> MappingNsCompleter<V> {
        MappingNsCompleter {
            next, alternatives, add_missing_namespaces,
            alternatives_mapping: Vec::new(),
            src_name: None,
            dst_names: Vec::new(),
            visited: Vec::new(),
            relay_header_or_metadata: false,
        }
    }
    #[inline]
    pub fn into_inner(self) -> V {
        self.next
    }
    fn resolve(&mut self, namespace: usize) -> Option<String> {
        if let Some(ref name) = self.dst_names[namespace] {
            return Some(name.clone())
        }
        for visited in &mut self.visited {
            *visited = false;
        }
        let mut current = namespace;
        self.visited[current] = true;
        loop {
            match self.alternatives_mapping[current] {
                Alternative::None => return None,
                Alternative::Source => return self.src_name.clone(),
                Alternative::Destination(next) => {
                    if self.visited[next] {
                        // cyclic alternatives
                        return None
                    }
                    if let Some(ref name) = self.dst_names[next] {
                        return Some(name.clone())
                    }
                    self.visited[next] = true;
                    current = next;
                }
            }
        }
    }
}
impl<V: MappingVisitor> MappingVisitor for MappingNsCompleter<V> {
    #[inline]
    fn flags(&self) -> MappingFlags {
        self.next.flags()
    }
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.relay_header_or_metadata = self.next.visit_header()?;
        Ok(true)
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        let alternatives = self.alternatives.get_or_insert_with(|| {
            dst_namespaces.iter()
                .map(|namespace| (namespace.clone(), src_namespace.to_owned()))
                .collect()
        });
        let mut namespaces = dst_namespaces.to_vec();
        if self.add_missing_namespaces {
            for namespace in alternatives.keys() {
                if namespace != src_namespace && !namespaces.contains(namespace) {
                    namespaces.push(namespace.clone());
                }
            }
        }
        let mut mapping = Vec::with_capacity(namespaces.len());
        for (index, namespace) in namespaces.iter().enumerate() {
            mapping.push(match alternatives.get(namespace) {
                None => Alternative::None,
                Some(alternative) if alternative == src_namespace => Alternative::Source,
                Some(alternative) => match namespaces.iter().position(|existing| existing == alternative) {
                    Some(alternative_index) if alternative_index == index => Alternative::None,
                    Some(alternative_index) => Alternative::Destination(alternative_index),
                    None => return Err(UnsupportedOperation::new(format!(
                        "invalid alternative namespace {}: not in [{}] or {}",
                        alternative, namespaces.iter().join(", "), src_namespace
                    )).into()),
                },
            });
        }
        self.alternatives_mapping = mapping;
        self.dst_names = vec![None; namespaces.len()];
        self.visited = vec![false; namespaces.len()];
        if self.relay_header_or_metadata {
            self.next.visit_namespaces(src_namespace, &namespaces)?;
        }
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        if self.relay_header_or_metadata {
            self.next.visit_metadata(key, value)?;
        }
        Ok(())
    }
    fn visit_content(&mut self) -> Result<bool, Error> {
        // metadata inside the content is always relayed
        self.relay_header_or_metadata = true;
        self.next.visit_content()
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.src_name = Some(src_name.into());
        self.next.visit_class(src_name)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.src_name = Some(src_name.into());
        self.next.visit_field(src_name, src_desc)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.src_name = Some(src_name.into());
        self.next.visit_method(src_name, src_desc)
    }
    fn visit_method_arg(
        &mut self,
        arg_position: Option<u32>,
        lv_index: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.src_name = src_name.map(String::from);
        self.next.visit_method_arg(arg_position, lv_index, src_name)
    }
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.src_name = src_name.map(String::from);
        self.next.visit_method_var(lvt_row_index, lv_index, start_op_idx, end_op_idx, src_name)
    }
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.next.visit_end()
    }
    fn visit_dst_name(&mut self, _kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        match self.dst_names.get_mut(namespace) {
            Some(slot) => {
                *slot = Some(name.into());
                Ok(())
            }
            None => Err(UnsupportedOperation::missing_namespace(namespace, self.dst_names.len()).into()),
        }
    }
    #[inline]
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        self.next.visit_dst_desc(kind, namespace, desc)
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        for namespace in 0..self.dst_names.len() {
            if let Some(name) = self.resolve(namespace) {
                self.next.visit_dst_name(kind, namespace, &name)?;
            }
        }
        for name in &mut self.dst_names {
            *name = None;
        }
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

    fn namespaces(names: &[&str]) -> Vec<String> {
        names.iter().map(|&name| name.to_owned()).collect()
    }
    fn alternatives(pairs: &[(&str, &str)]) -> IndexMap<String, String> {
        pairs.iter().map(|&(key, value)| (key.to_owned(), value.to_owned())).collect()
    }

    #[test]
    fn completes_from_source() {
        let mut completer = MappingNsCompleter::new(MemoryMappingTree::new());
        completer.visit_header().unwrap();
        completer.visit_namespaces("official", &namespaces(&["intermediary", "named"])).unwrap();
        completer.visit_content().unwrap();
        completer.visit_class("a").unwrap();
        completer.visit_dst_name(MappedElementKind::Class, 1, "Named").unwrap();
        completer.visit_element_content(MappedElementKind::Class).unwrap();
        let tree = completer.into_inner();
        let class = tree.class("a").unwrap();
        assert_eq!(class.dst_name(0), Some("a"));
        assert_eq!(class.dst_name(1), Some("Named"));
    }
    #[test]
    fn follows_alternative_chains() {
        let alternatives = alternatives(&[("named", "intermediary"), ("intermediary", "official")]);
        let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), false);
        completer.visit_header().unwrap();
        completer.visit_namespaces("official", &namespaces(&["intermediary", "named"])).unwrap();
        completer.visit_class("a").unwrap();
        completer.visit_element_content(MappedElementKind::Class).unwrap();
        completer.visit_class("b").unwrap();
        completer.visit_dst_name(MappedElementKind::Class, 0, "class_1").unwrap();
        completer.visit_element_content(MappedElementKind::Class).unwrap();
        let tree = completer.into_inner();
        assert_eq!(tree.class("a").unwrap().dst_name(1), Some("a"));
        assert_eq!(tree.class("b").unwrap().dst_name(1), Some("class_1"));
    }
    #[test]
    fn cyclic_alternatives_terminate() {
        let alternatives = alternatives(&[("a", "b"), ("b", "a")]);
        let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), false);
        completer.visit_header().unwrap();
        completer.visit_namespaces("src", &namespaces(&["a", "b"])).unwrap();
        completer.visit_class("x").unwrap();
        completer.visit_element_content(MappedElementKind::Class).unwrap();
        let tree = completer.into_inner();
        let class = tree.class("x").unwrap();
        assert_eq!(class.dst_name(0), None);
        assert_eq!(class.dst_name(1), None);
    }
    #[test]
    fn adds_missing_namespaces() {
        let alternatives = alternatives(&[("named", "official")]);
        let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), true);
        completer.visit_header().unwrap();
        completer.visit_namespaces("official", &namespaces(&["intermediary"])).unwrap();
        completer.visit_class("a").unwrap();
        completer.visit_dst_name(MappedElementKind::Class, 0, "class_1").unwrap();
        completer.visit_element_content(MappedElementKind::Class).unwrap();
        let tree = completer.into_inner();
        assert_eq!(tree.dst_namespaces(), &namespaces(&["intermediary", "named"])[..]);
        assert_eq!(tree.class("a").unwrap().dst_name(1), Some("a"));
    }
    #[test]
    fn unknown_alternative_namespace() {
        let alternatives = alternatives(&[("named", "missing")]);
        let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), false);
        completer.visit_header().unwrap();
        let err = completer.visit_namespaces("official", &namespaces(&["named"])).unwrap_err();
        assert!(err.downcast_ref::<UnsupportedOperation>().is_some());
    }
}
