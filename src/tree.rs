//! An in-memory mapping tree, both a visitor sink and a visitation source.
//!
//! Readers buffer through it when a consumer needs guarantees the streaming order of a format
//! can't give, like every element being visited only once.
use failure::Error;
use indexmap::IndexMap;

use crate::error::{UnsupportedOperation, VisitorContractViolation};
use crate::util::{self, NS_SOURCE_FALLBACK};
use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ClassMapping {
    pub src_name: String,
    pub dst_names: Vec<Option<String>>,
    pub comment: Option<String>,
    pub fields: Vec<MemberMapping>,
    pub methods: Vec<MemberMapping>,
}
impl ClassMapping {
    #[inline]
    pub fn dst_name(&self, namespace: usize) -> Option<&str> {
        dst_name(&self.dst_names, namespace)
    }
    pub fn field(&self, name: &str, desc: Option<&str>) -> Option<&MemberMapping> {
        find_member(&self.fields, name, desc).map(|index| &self.fields[index])
    }
    pub fn method(&self, name: &str, desc: Option<&str>) -> Option<&MemberMapping> {
        find_member(&self.methods, name, desc).map(|index| &self.methods[index])
    }
}

/// A field or a method
#[derive(Clone, Debug, Default, PartialEq)]
pub struct MemberMapping {
    pub src_name: String,
    pub src_desc: Option<String>,
    pub dst_names: Vec<Option<String>>,
    pub dst_descs: Vec<Option<String>>,
    pub comment: Option<String>,
    pub args: Vec<ArgMapping>,
    pub vars: Vec<VarMapping>,
}
impl MemberMapping {
    #[inline]
    pub fn dst_name(&self, namespace: usize) -> Option<&str> {
        dst_name(&self.dst_names, namespace)
    }
    pub fn arg(&self, lv_index: u32) -> Option<&ArgMapping> {
        self.args.iter().find(|arg| arg.lv_index == Some(lv_index))
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct ArgMapping {
    pub arg_position: Option<u32>,
    pub lv_index: Option<u32>,
    pub src_name: Option<String>,
    pub dst_names: Vec<Option<String>>,
    pub comment: Option<String>,
}
impl ArgMapping {
    #[inline]
    pub fn dst_name(&self, namespace: usize) -> Option<&str> {
        dst_name(&self.dst_names, namespace)
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct VarMapping {
    pub lvt_row_index: Option<u32>,
    pub lv_index: Option<u32>,
    pub start_op_idx: Option<u32>,
    pub end_op_idx: Option<u32>,
    pub src_name: Option<String>,
    pub dst_names: Vec<Option<String>>,
    pub comment: Option<String>,
}
impl VarMapping {
    #[inline]
    pub fn dst_name(&self, namespace: usize) -> Option<&str> {
        dst_name(&self.dst_names, namespace)
    }
}

#[inline]
fn dst_name(names: &[Option<String>], namespace: usize) -> Option<&str> {
    names.get(namespace).and_then(|name| name.as_ref()).map(String::as_str)
}

fn find_member(members: &[MemberMapping], name: &str, desc: Option<&str>) -> Option<usize> {
    let exact = members.iter().position(|member| {
        member.src_name == name && member.src_desc.as_ref().map(String::as_str) == desc
    });
    // a missing descriptor on either side still matches by name
    exact.or_else(|| members.iter().position(|member| {
        member.src_name == name && (desc.is_none() || member.src_desc.is_none())
    }))
}

#[derive(Copy, Clone, Debug)]
enum Member {
    Field(usize),
    Method(usize),
}

#[derive(Copy, Clone, Debug)]
enum Sub {
    Arg(usize),
    Var(usize),
}

#[derive(Clone, Debug, Default)]
pub struct MemoryMappingTree {
    src_namespace: Option<String>,
    dst_namespaces: Vec<String>,
    metadata: Vec<(String, Option<String>)>,
    classes: IndexMap<String, ClassMapping>,
    current_class: Option<usize>,
    current_member: Option<Member>,
    current_sub: Option<Sub>,
}
impl MemoryMappingTree {
    #[inline]
    pub fn new() -> MemoryMappingTree {
        MemoryMappingTree::default()
    }
    #[inline]
    pub fn src_namespace(&self) -> Option<&str> {
        self.src_namespace.as_ref().map(String::as_str)
    }
    #[inline]
    pub fn dst_namespaces(&self) -> &[String] {
        &self.dst_namespaces
    }
    #[inline]
    pub fn metadata(&self) -> &[(String, Option<String>)] {
        &self.metadata
    }
    pub fn metadata_value(&self, key: &str) -> Option<&str> {
        self.metadata.iter()
            .find(|&&(ref existing, _)| existing == key)
            .and_then(|&(_, ref value)| value.as_ref().map(String::as_str))
    }
    #[inline]
    pub fn classes(&self) -> impl Iterator<Item=&ClassMapping> {
        self.classes.values()
    }
    #[inline]
    pub fn class(&self, src_name: &str) -> Option<&ClassMapping> {
        self.classes.get(src_name)
    }
    /// Replays the whole tree into `visitor`, as often as it asks for
    pub fn accept(&self, visitor: &mut dyn MappingVisitor) -> Result<(), Error> {
        let flags = visitor.flags();
        loop {
            if visitor.visit_header()? {
                let src_namespace = self.src_namespace().unwrap_or(NS_SOURCE_FALLBACK);
                visitor.visit_namespaces(src_namespace, &self.dst_namespaces)?;
                for &(ref key, ref value) in &self.metadata {
                    visitor.visit_metadata(key, value.as_ref().map(String::as_str))?;
                }
            }
            if visitor.visit_content()? {
                for class in self.classes.values() {
                    self.accept_class(class, visitor, flags)?;
                }
            }
            if visitor.visit_end()? {
                return Ok(())
            }
            if !flags.contains(MappingFlags::NEEDS_MULTIPLE_PASSES) {
                return Err(VisitorContractViolation::repeated_visitation().into())
            }
        }
    }
    fn accept_class(&self, class: &ClassMapping, visitor: &mut dyn MappingVisitor, flags: MappingFlags) -> Result<(), Error> {
        if !visitor.visit_class(&class.src_name)? {
            return Ok(())
        }
        if !accept_element(visitor, MappedElementKind::Class, &class.dst_names, &class.comment)? {
            return Ok(())
        }
        for field in &class.fields {
            let dst_descs = flags.contains(MappingFlags::NEEDS_DST_FIELD_DESC);
            self.accept_member(field, MappedElementKind::Field, dst_descs, visitor)?;
        }
        for method in &class.methods {
            let dst_descs = flags.contains(MappingFlags::NEEDS_DST_METHOD_DESC);
            if !self.accept_member(method, MappedElementKind::Method, dst_descs, visitor)? {
                continue;
            }
            for arg in &method.args {
                let src_name = arg.src_name.as_ref().map(String::as_str);
                if visitor.visit_method_arg(arg.arg_position, arg.lv_index, src_name)? {
                    accept_element(visitor, MappedElementKind::MethodArg, &arg.dst_names, &arg.comment)?;
                }
            }
            for var in &method.vars {
                let src_name = var.src_name.as_ref().map(String::as_str);
                if visitor.visit_method_var(var.lvt_row_index, var.lv_index, var.start_op_idx, var.end_op_idx, src_name)? {
                    accept_element(visitor, MappedElementKind::MethodVar, &var.dst_names, &var.comment)?;
                }
            }
        }
        Ok(())
    }
    fn accept_member(
        &self,
        member: &MemberMapping,
        kind: MappedElementKind,
        derive_dst_descs: bool,
        visitor: &mut dyn MappingVisitor,
    ) -> Result<bool, Error> {
        let src_desc = member.src_desc.as_ref().map(String::as_str);
        let visit = match kind {
            MappedElementKind::Field => visitor.visit_field(&member.src_name, src_desc)?,
            _ => visitor.visit_method(&member.src_name, src_desc)?,
        };
        if !visit {
            return Ok(false)
        }
        for namespace in 0..self.dst_namespaces.len() {
            match member.dst_descs.get(namespace).and_then(|desc| desc.as_ref()) {
                Some(desc) => visitor.visit_dst_desc(kind, namespace, desc)?,
                None => if let (true, Some(src_desc)) = (derive_dst_descs, src_desc) {
                    let desc = self.map_desc(src_desc, namespace);
                    visitor.visit_dst_desc(kind, namespace, &desc)?;
                },
            }
        }
        accept_element(visitor, kind, &member.dst_names, &member.comment)
    }
    /// Translates the class names in a source descriptor into the given namespace
    pub fn map_desc(&self, desc: &str, namespace: usize) -> String {
        util::map_desc(desc, |class_name| {
            self.classes.get(class_name).and_then(|class| class.dst_name(namespace))
        })
    }
    fn current_class(&mut self) -> Result<&mut ClassMapping, Error> {
        let class = match self.current_class {
            Some(index) => self.classes.get_index_mut(index).map(|(_, class)| class),
            None => None,
        };
        class.ok_or_else(|| UnsupportedOperation::new("member visited outside of a class").into())
    }
    fn current_method(&mut self) -> Result<&mut MemberMapping, Error> {
        match self.current_member {
            Some(Member::Method(index)) => Ok(&mut self.current_class()?.methods[index]),
            _ => Err(UnsupportedOperation::new("method content visited outside of a method").into()),
        }
    }
    /// The destination names and comment of the current element of the given kind
    fn current_element(&mut self, kind: MappedElementKind) -> Result<(&mut Vec<Option<String>>, &mut Option<String>), Error> {
        let missing = || UnsupportedOperation::new(format!("no current {}", kind));
        Ok(match kind {
            MappedElementKind::Class => {
                let class = self.current_class()?;
                (&mut class.dst_names, &mut class.comment)
            }
            MappedElementKind::Field | MappedElementKind::Method => {
                let member = self.current_member_mut(kind).ok_or_else(missing)?;
                (&mut member.dst_names, &mut member.comment)
            }
            MappedElementKind::MethodArg => match self.current_sub {
                Some(Sub::Arg(index)) => {
                    let arg = &mut self.current_method()?.args[index];
                    (&mut arg.dst_names, &mut arg.comment)
                }
                _ => return Err(missing().into()),
            },
            MappedElementKind::MethodVar => match self.current_sub {
                Some(Sub::Var(index)) => {
                    let var = &mut self.current_method()?.vars[index];
                    (&mut var.dst_names, &mut var.comment)
                }
                _ => return Err(missing().into()),
            },
        })
    }
    fn current_member_mut(&mut self, kind: MappedElementKind) -> Option<&mut MemberMapping> {
        let member = self.current_member;
        let (_, class) = self.classes.get_index_mut(self.current_class?)?;
        match (kind, member) {
            (MappedElementKind::Field, Some(Member::Field(index))) => Some(&mut class.fields[index]),
            (MappedElementKind::Method, Some(Member::Method(index))) => Some(&mut class.methods[index]),
            _ => None,
        }
    }
    fn check_namespace(&self, namespace: usize) -> Result<(), Error> {
        if namespace >= self.dst_namespaces.len() {
            return Err(UnsupportedOperation::missing_namespace(namespace, self.dst_namespaces.len()).into())
        }
        Ok(())
    }
}
fn accept_element(
    visitor: &mut dyn MappingVisitor,
    kind: MappedElementKind,
    dst_names: &[Option<String>],
    comment: &Option<String>,
) -> Result<bool, Error> {
    for (namespace, name) in dst_names.iter().enumerate() {
        if let Some(name) = name {
            visitor.visit_dst_name(kind, namespace, name)?;
        }
    }
    if !visitor.visit_element_content(kind)? {
        return Ok(false)
    }
    if let Some(comment) = comment {
        visitor.visit_comment(kind, comment)?;
    }
    Ok(true)
}
fn set_slot(slots: &mut Vec<Option<String>>, namespace: usize, count: usize, value: &str) {
    if slots.len() < count {
        slots.resize(count, None);
    }
    slots[namespace] = Some(value.into());
}
impl PartialEq for MemoryMappingTree {
    fn eq(&self, other: &MemoryMappingTree) -> bool {
        self.src_namespace == other.src_namespace
            && self.dst_namespaces == other.dst_namespaces
            && self.metadata == other.metadata
            && self.classes == other.classes
    }
}
impl MappingVisitor for MemoryMappingTree {
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        self.src_namespace = Some(src_namespace.into());
        self.dst_namespaces = dst_namespaces.to_vec();
        Ok(())
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        self.metadata.push((key.into(), value.map(String::from)));
        Ok(())
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        let index = match self.classes.get_full(src_name) {
            Some((index, _, _)) => index,
            None => {
                let class = ClassMapping { src_name: src_name.into(), ..Default::default() };
                self.classes.insert(src_name.into(), class);
                self.classes.len() - 1
            }
        };
        self.current_class = Some(index);
        self.current_member = None;
        self.current_sub = None;
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let class = self.current_class()?;
        let index = insert_member(&mut class.fields, src_name, src_desc);
        self.current_member = Some(Member::Field(index));
        self.current_sub = None;
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        let class = self.current_class()?;
        let index = insert_member(&mut class.methods, src_name, src_desc);
        self.current_member = Some(Member::Method(index));
        self.current_sub = None;
        Ok(true)
    }
    fn visit_method_arg(
        &mut self,
        arg_position: Option<u32>,
        lv_index: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        let method = self.current_method()?;
        let existing = method.args.iter().position(|arg| {
            (lv_index.is_some() && arg.lv_index == lv_index)
                || (arg_position.is_some() && arg.arg_position == arg_position)
        });
        let index = match existing {
            Some(index) => {
                let arg = &mut method.args[index];
                arg.arg_position = arg.arg_position.or(arg_position);
                arg.lv_index = arg.lv_index.or(lv_index);
                if arg.src_name.is_none() {
                    arg.src_name = src_name.map(String::from);
                }
                index
            }
            None => {
                method.args.push(ArgMapping {
                    arg_position, lv_index,
                    src_name: src_name.map(String::from),
                    ..Default::default()
                });
                method.args.len() - 1
            }
        };
        self.current_sub = Some(Sub::Arg(index));
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
        let method = self.current_method()?;
        let existing = method.vars.iter().position(|var| {
            var.lv_index == lv_index && var.start_op_idx == start_op_idx
                && (var.lvt_row_index.is_none() || lvt_row_index.is_none() || var.lvt_row_index == lvt_row_index)
        });
        let index = match existing {
            Some(index) => {
                let var = &mut method.vars[index];
                var.lvt_row_index = var.lvt_row_index.or(lvt_row_index);
                var.end_op_idx = var.end_op_idx.or(end_op_idx);
                if var.src_name.is_none() {
                    var.src_name = src_name.map(String::from);
                }
                index
            }
            None => {
                method.vars.push(VarMapping {
                    lvt_row_index, lv_index, start_op_idx, end_op_idx,
                    src_name: src_name.map(String::from),
                    ..Default::default()
                });
                method.vars.len() - 1
            }
        };
        self.current_sub = Some(Sub::Var(index));
        Ok(true)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        self.check_namespace(namespace)?;
        let count = self.dst_namespaces.len();
        let (names, _) = self.current_element(kind)?;
        set_slot(names, namespace, count, name);
        Ok(())
    }
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        self.check_namespace(namespace)?;
        let count = self.dst_namespaces.len();
        match kind {
            MappedElementKind::Field | MappedElementKind::Method => {
                if let Some(member) = self.current_member_mut(kind) {
                    set_slot(&mut member.dst_descs, namespace, count, desc);
                }
            }
            _ => {}
        }
        Ok(())
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        let (_, existing) = self.current_element(kind)?;
        *existing = Some(comment.into());
        Ok(())
    }
}
fn insert_member(members: &mut Vec<MemberMapping>, src_name: &str, src_desc: Option<&str>) -> usize {
    match find_member(members, src_name, src_desc) {
        Some(index) => {
            let member = &mut members[index];
            if member.src_desc.is_none() {
                member.src_desc = src_desc.map(String::from);
            }
            index
        }
        None => {
            members.push(MemberMapping {
                src_name: src_name.into(),
                src_desc: src_desc.map(String::from),
                ..Default::default()
            });
            members.len() - 1
        }
    }
}

/// Collects into a tree, declining the content of every element of one kind
#[cfg(test)]
pub(crate) struct DecliningTree {
    pub tree: MemoryMappingTree,
    declined: MappedElementKind,
}
#[cfg(test)]
impl DecliningTree {
    pub fn new(declined: MappedElementKind) -> DecliningTree {
        DecliningTree { tree: MemoryMappingTree::new(), declined }
    }
}
#[cfg(test)]
impl MappingVisitor for DecliningTree {
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        self.tree.visit_namespaces(src_namespace, dst_namespaces)
    }
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        self.tree.visit_metadata(key, value)
    }
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.tree.visit_class(src_name)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.tree.visit_field(src_name, src_desc)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.tree.visit_method(src_name, src_desc)
    }
    fn visit_method_arg(&mut self, arg_position: Option<u32>, lv_index: Option<u32>, src_name: Option<&str>) -> Result<bool, Error> {
        self.tree.visit_method_arg(arg_position, lv_index, src_name)
    }
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.tree.visit_method_var(lvt_row_index, lv_index, start_op_idx, end_op_idx, src_name)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        self.tree.visit_dst_name(kind, namespace, name)
    }
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        self.tree.visit_dst_desc(kind, namespace, desc)
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        Ok(self.tree.visit_element_content(kind)? && kind != self.declined)
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        self.tree.visit_comment(kind, comment)
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn sample() -> MemoryMappingTree {
        let mut tree = MemoryMappingTree::new();
        tree.visit_namespaces("official", &["named".to_string()]).unwrap();
        tree.visit_class("a").unwrap();
        tree.visit_dst_name(MappedElementKind::Class, 0, "pkg/Named").unwrap();
        tree.visit_method("m", Some("(La;)La;")).unwrap();
        tree.visit_dst_name(MappedElementKind::Method, 0, "method").unwrap();
        tree.visit_method_arg(None, Some(1), None).unwrap();
        tree.visit_dst_name(MappedElementKind::MethodArg, 0, "arg").unwrap();
        tree.visit_comment(MappedElementKind::MethodArg, "An argument").unwrap();
        tree
    }

    #[test]
    fn merges_repeated_elements() {
        let mut tree = sample();
        tree.visit_class("a").unwrap();
        tree.visit_field("f", None).unwrap();
        tree.visit_dst_name(MappedElementKind::Field, 0, "field").unwrap();
        tree.visit_class("a").unwrap();
        tree.visit_field("f", Some("I")).unwrap();
        let class = tree.class("a").unwrap();
        assert_eq!(class.fields.len(), 1);
        assert_eq!(class.fields[0].src_desc.as_ref().map(String::as_str), Some("I"));
        assert_eq!(class.fields[0].dst_name(0), Some("field"));
        assert_eq!(class.dst_name(0), Some("pkg/Named"));
    }
    #[test]
    fn derives_dst_descs() {
        let tree = sample();
        assert_eq!(tree.map_desc("(La;)La;", 0), "(Lpkg/Named;)Lpkg/Named;");
        let method = tree.class("a").unwrap().method("m", None).unwrap();
        assert_eq!(method.arg(1).unwrap().dst_name(0), Some("arg"));
        assert_eq!(method.args[0].comment.as_ref().map(String::as_str), Some("An argument"));
    }
    #[test]
    fn rejects_unknown_namespace() {
        let mut tree = sample();
        let err = tree.visit_dst_name(MappedElementKind::Class, 3, "x").unwrap_err();
        assert!(err.downcast_ref::<UnsupportedOperation>().is_some());
    }
    #[test]
    fn replays_into_copy() {
        let tree = sample();
        let mut copy = MemoryMappingTree::new();
        tree.accept(&mut copy).unwrap();
        assert_eq!(tree, copy);
    }
}
