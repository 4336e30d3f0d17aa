//! Translation between regular visitation and flat visitation.
//!
//! A flat visitor receives every element fully qualified in one call,
//! together with the names of all of its parents.
use failure::Error;

use crate::visitor::{MappedElementKind, MappingFlags, MappingVisitor};

#[derive(Copy, Clone, Debug)]
pub struct FlatClass<'a> {
    pub src_name: &'a str,
    pub dst_names: &'a [Option<String>],
}

/// A field or method together with its owner
#[derive(Copy, Clone, Debug)]
pub struct FlatMember<'a> {
    pub owner: FlatClass<'a>,
    pub src_name: &'a str,
    pub src_desc: Option<&'a str>,
    pub dst_names: &'a [Option<String>],
    pub dst_descs: &'a [Option<String>],
}

#[derive(Copy, Clone, Debug)]
pub struct FlatMethodArg<'a> {
    pub method: FlatMember<'a>,
    pub arg_position: Option<u32>,
    pub lv_index: Option<u32>,
    pub src_name: Option<&'a str>,
    pub dst_names: &'a [Option<String>],
}

#[derive(Copy, Clone, Debug)]
pub struct FlatMethodVar<'a> {
    pub method: FlatMember<'a>,
    pub lvt_row_index: Option<u32>,
    pub lv_index: Option<u32>,
    pub start_op_idx: Option<u32>,
    pub end_op_idx: Option<u32>,
    pub src_name: Option<&'a str>,
    pub dst_names: &'a [Option<String>],
}

pub trait FlatMappingVisitor {
    #[inline]
    fn flags(&self) -> MappingFlags {
        MappingFlags::empty()
    }
    #[inline]
    fn visit_header(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error>;
    #[inline]
    fn visit_metadata(&mut self, _key: &str, _value: Option<&str>) -> Result<(), Error> {
        Ok(())
    }
    #[inline]
    fn visit_content(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
    fn visit_class(&mut self, class: FlatClass) -> Result<bool, Error>;
    fn visit_class_comment(&mut self, class: FlatClass, comment: &str) -> Result<(), Error>;
    fn visit_field(&mut self, field: FlatMember) -> Result<bool, Error>;
    fn visit_field_comment(&mut self, field: FlatMember, comment: &str) -> Result<(), Error>;
    fn visit_method(&mut self, method: FlatMember) -> Result<bool, Error>;
    fn visit_method_comment(&mut self, method: FlatMember, comment: &str) -> Result<(), Error>;
    fn visit_method_arg(&mut self, arg: FlatMethodArg) -> Result<bool, Error>;
    fn visit_method_arg_comment(&mut self, arg: FlatMethodArg, comment: &str) -> Result<(), Error>;
    fn visit_method_var(&mut self, var: FlatMethodVar) -> Result<bool, Error>;
    fn visit_method_var_comment(&mut self, var: FlatMethodVar, comment: &str) -> Result<(), Error>;
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
}

#[derive(Clone, Debug, Eq, PartialEq)]
enum LastMember {
    Field(String, Option<String>),
    Method(String, Option<String>),
}

#[derive(Copy, Clone, Debug, Eq, PartialEq)]
enum LastSub {
    Arg { arg_position: Option<u32>, lv_index: Option<u32> },
    Var { lvt_row_index: Option<u32>, lv_index: Option<u32>, start_op_idx: Option<u32> },
}

/// Accepts flat calls and forwards them to a regular visitor.
///
/// Consecutive calls for the same class, member or method sub-element are only forwarded once,
/// and later calls get the answer of the first one.
pub struct RegularAsFlatMappingVisitor<V> {
    next: V,
    relay_dst_field_descs: bool,
    relay_dst_method_descs: bool,
    last_class: Option<(String, bool)>,
    last_member: Option<(LastMember, bool)>,
    last_sub: Option<(LastSub, bool)>,
}
impl<V: MappingVisitor> RegularAsFlatMappingVisitor<V> {
    pub fn new(next: V) -> RegularAsFlatMappingVisitor<V> {
        RegularAsFlatMappingVisitor {
            next,
            relay_dst_field_descs: false,
            relay_dst_method_descs: false,
            last_class: None,
            last_member: None,
            last_sub: None,
        }
    }
    #[inline]
    pub fn into_inner(self) -> V {
        self.next
    }
    fn enter_class(&mut self, class: FlatClass) -> Result<bool, Error> {
        if let Some((ref last, relay)) = self.last_class {
            if last == class.src_name {
                return Ok(relay)
            }
        }
        self.last_member = None;
        self.last_sub = None;
        let relay = self.next.visit_class(class.src_name)?
            && self.visit_dst_names(MappedElementKind::Class, class.dst_names)?;
        self.last_class = Some((class.src_name.into(), relay));
        Ok(relay)
    }
    fn enter_member(&mut self, kind: MappedElementKind, member: FlatMember) -> Result<bool, Error> {
        if !self.enter_class(member.owner)? {
            return Ok(false)
        }
        let src_desc = member.src_desc.map(String::from);
        if let Some((ref last, relay)) = self.last_member {
            let same = match (kind, last) {
                (MappedElementKind::Field, &LastMember::Field(ref name, ref desc))
                | (MappedElementKind::Method, &LastMember::Method(ref name, ref desc)) => {
                    name == member.src_name && (src_desc.is_none() || src_desc == *desc)
                }
                _ => false,
            };
            if same {
                return Ok(relay)
            }
        }
        self.last_sub = None;
        let visited = match kind {
            MappedElementKind::Field => self.next.visit_field(member.src_name, member.src_desc)?,
            _ => self.next.visit_method(member.src_name, member.src_desc)?,
        };
        let relay = visited && self.visit_dst_names_descs(kind, member.dst_names, member.dst_descs)?;
        let last = match kind {
            MappedElementKind::Field => LastMember::Field(member.src_name.into(), src_desc),
            _ => LastMember::Method(member.src_name.into(), src_desc),
        };
        self.last_member = Some((last, relay));
        Ok(relay)
    }
    fn enter_arg(&mut self, arg: FlatMethodArg) -> Result<bool, Error> {
        if !self.enter_member(MappedElementKind::Method, arg.method)? {
            return Ok(false)
        }
        let key = LastSub::Arg { arg_position: arg.arg_position, lv_index: arg.lv_index };
        if let Some((last, relay)) = self.last_sub {
            if last == key {
                return Ok(relay)
            }
        }
        let relay = self.next.visit_method_arg(arg.arg_position, arg.lv_index, arg.src_name)?
            && self.visit_dst_names(MappedElementKind::MethodArg, arg.dst_names)?;
        self.last_sub = Some((key, relay));
        Ok(relay)
    }
    fn enter_var(&mut self, var: FlatMethodVar) -> Result<bool, Error> {
        if !self.enter_member(MappedElementKind::Method, var.method)? {
            return Ok(false)
        }
        let key = LastSub::Var {
            lvt_row_index: var.lvt_row_index,
            lv_index: var.lv_index,
            start_op_idx: var.start_op_idx,
        };
        if let Some((last, relay)) = self.last_sub {
            if last == key {
                return Ok(relay)
            }
        }
        let relay = self.next.visit_method_var(
            var.lvt_row_index, var.lv_index, var.start_op_idx, var.end_op_idx, var.src_name
        )? && self.visit_dst_names(MappedElementKind::MethodVar, var.dst_names)?;
        self.last_sub = Some((key, relay));
        Ok(relay)
    }
    fn visit_dst_names(&mut self, kind: MappedElementKind, dst_names: &[Option<String>]) -> Result<bool, Error> {
        for (namespace, name) in dst_names.iter().enumerate() {
            if let Some(name) = name {
                self.next.visit_dst_name(kind, namespace, name)?;
            }
        }
        self.next.visit_element_content(kind)
    }
    fn visit_dst_names_descs(
        &mut self,
        kind: MappedElementKind,
        dst_names: &[Option<String>],
        dst_descs: &[Option<String>],
    ) -> Result<bool, Error> {
        let relay_descs = match kind {
            MappedElementKind::Field => self.relay_dst_field_descs,
            _ => self.relay_dst_method_descs,
        };
        for (namespace, name) in dst_names.iter().enumerate() {
            if let Some(name) = name {
                self.next.visit_dst_name(kind, namespace, name)?;
            }
        }
        if relay_descs {
            for (namespace, desc) in dst_descs.iter().enumerate() {
                if let Some(desc) = desc {
                    self.next.visit_dst_desc(kind, namespace, desc)?;
                }
            }
        }
        self.next.visit_element_content(kind)
    }
}
impl<V: MappingVisitor> FlatMappingVisitor for RegularAsFlatMappingVisitor<V> {
    #[inline]
    fn flags(&self) -> MappingFlags {
        self.next.flags()
    }
    #[inline]
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.next.visit_header()
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        self.next.visit_namespaces(src_namespace, dst_namespaces)?;
        let flags = self.next.flags();
        self.relay_dst_field_descs = flags.contains(MappingFlags::NEEDS_DST_FIELD_DESC);
        self.relay_dst_method_descs = flags.contains(MappingFlags::NEEDS_DST_METHOD_DESC);
        Ok(())
    }
    #[inline]
    fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
        self.next.visit_metadata(key, value)
    }
    fn visit_content(&mut self) -> Result<bool, Error> {
        self.last_class = None;
        self.last_member = None;
        self.last_sub = None;
        self.next.visit_content()
    }
    #[inline]
    fn visit_class(&mut self, class: FlatClass) -> Result<bool, Error> {
        self.enter_class(class)
    }
    fn visit_class_comment(&mut self, class: FlatClass, comment: &str) -> Result<(), Error> {
        if self.enter_class(class)? {
            self.next.visit_comment(MappedElementKind::Class, comment)?;
        }
        Ok(())
    }
    #[inline]
    fn visit_field(&mut self, field: FlatMember) -> Result<bool, Error> {
        self.enter_member(MappedElementKind::Field, field)
    }
    fn visit_field_comment(&mut self, field: FlatMember, comment: &str) -> Result<(), Error> {
        if self.enter_member(MappedElementKind::Field, field)? {
            self.next.visit_comment(MappedElementKind::Field, comment)?;
        }
        Ok(())
    }
    #[inline]
    fn visit_method(&mut self, method: FlatMember) -> Result<bool, Error> {
        self.enter_member(MappedElementKind::Method, method)
    }
    fn visit_method_comment(&mut self, method: FlatMember, comment: &str) -> Result<(), Error> {
        if self.enter_member(MappedElementKind::Method, method)? {
            self.next.visit_comment(MappedElementKind::Method, comment)?;
        }
        Ok(())
    }
    #[inline]
    fn visit_method_arg(&mut self, arg: FlatMethodArg) -> Result<bool, Error> {
        self.enter_arg(arg)
    }
    fn visit_method_arg_comment(&mut self, arg: FlatMethodArg, comment: &str) -> Result<(), Error> {
        if self.enter_arg(arg)? {
            self.next.visit_comment(MappedElementKind::MethodArg, comment)?;
        }
        Ok(())
    }
    #[inline]
    fn visit_method_var(&mut self, var: FlatMethodVar) -> Result<bool, Error> {
        self.enter_var(var)
    }
    fn visit_method_var_comment(&mut self, var: FlatMethodVar, comment: &str) -> Result<(), Error> {
        if self.enter_var(var)? {
            self.next.visit_comment(MappedElementKind::MethodVar, comment)?;
        }
        Ok(())
    }
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.next.visit_end()
    }
}

#[derive(Clone, Debug, Default)]
struct ElementState {
    src_name: Option<String>,
    src_desc: Option<String>,
    dst_names: Vec<Option<String>>,
    dst_descs: Vec<Option<String>>,
}
impl ElementState {
    fn start(&mut self, src_name: Option<&str>, src_desc: Option<&str>) {
        self.src_name = src_name.map(String::from);
        self.src_desc = src_desc.map(String::from);
        for name in &mut self.dst_names {
            *name = None;
        }
        for desc in &mut self.dst_descs {
            *desc = None;
        }
    }
    #[inline]
    fn src_name(&self) -> &str {
        self.src_name.as_ref().map_or("", String::as_str)
    }
}

#[derive(Copy, Clone, Debug, Default)]
struct SubState {
    arg_position: Option<u32>,
    lv_index: Option<u32>,
    lvt_row_index: Option<u32>,
    start_op_idx: Option<u32>,
    end_op_idx: Option<u32>,
}

/// Accepts regular calls and forwards them to a flat visitor
pub struct FlatAsRegularMappingVisitor<V> {
    next: V,
    class: ElementState,
    member: ElementState,
    member_is_field: bool,
    sub: ElementState,
    sub_state: SubState,
}
impl<V: FlatMappingVisitor> FlatAsRegularMappingVisitor<V> {
    pub fn new(next: V) -> FlatAsRegularMappingVisitor<V> {
        FlatAsRegularMappingVisitor {
            next,
            class: ElementState::default(),
            member: ElementState::default(),
            member_is_field: false,
            sub: ElementState::default(),
            sub_state: SubState::default(),
        }
    }
    #[inline]
    pub fn into_inner(self) -> V {
        self.next
    }
}
fn flat_class(class: &ElementState) -> FlatClass {
    FlatClass { src_name: class.src_name(), dst_names: &class.dst_names }
}
fn flat_member<'a>(class: &'a ElementState, member: &'a ElementState) -> FlatMember<'a> {
    FlatMember {
        owner: flat_class(class),
        src_name: member.src_name(),
        src_desc: member.src_desc.as_ref().map(String::as_str),
        dst_names: &member.dst_names,
        dst_descs: &member.dst_descs,
    }
}
fn flat_arg<'a>(class: &'a ElementState, member: &'a ElementState, sub: &'a ElementState, state: SubState) -> FlatMethodArg<'a> {
    FlatMethodArg {
        method: flat_member(class, member),
        arg_position: state.arg_position,
        lv_index: state.lv_index,
        src_name: sub.src_name.as_ref().map(String::as_str),
        dst_names: &sub.dst_names,
    }
}
fn flat_var<'a>(class: &'a ElementState, member: &'a ElementState, sub: &'a ElementState, state: SubState) -> FlatMethodVar<'a> {
    FlatMethodVar {
        method: flat_member(class, member),
        lvt_row_index: state.lvt_row_index,
        lv_index: state.lv_index,
        start_op_idx: state.start_op_idx,
        end_op_idx: state.end_op_idx,
        src_name: sub.src_name.as_ref().map(String::as_str),
        dst_names: &sub.dst_names,
    }
}
impl<V: FlatMappingVisitor> MappingVisitor for FlatAsRegularMappingVisitor<V> {
    #[inline]
    fn flags(&self) -> MappingFlags {
        self.next.flags()
    }
    #[inline]
    fn visit_header(&mut self) -> Result<bool, Error> {
        self.next.visit_header()
    }
    fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
        let count = dst_namespaces.len();
        for state in &mut [&mut self.class, &mut self.member, &mut self.sub] {
            state.dst_names = vec![None; count];
            state.dst_descs = vec![None; count];
        }
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
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
        self.class.start(Some(src_name), None);
        Ok(true)
    }
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.member.start(Some(src_name), src_desc);
        self.member_is_field = true;
        Ok(true)
    }
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
        self.member.start(Some(src_name), src_desc);
        self.member_is_field = false;
        Ok(true)
    }
    fn visit_method_arg(
        &mut self,
        arg_position: Option<u32>,
        lv_index: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error> {
        self.sub.start(src_name, None);
        self.sub_state = SubState { arg_position, lv_index, ..SubState::default() };
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
        self.sub.start(src_name, None);
        self.sub_state = SubState {
            lvt_row_index, lv_index, start_op_idx, end_op_idx,
            ..SubState::default()
        };
        Ok(true)
    }
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        self.next.visit_end()
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
        let state = match kind {
            MappedElementKind::Class => &mut self.class,
            MappedElementKind::Field | MappedElementKind::Method => &mut self.member,
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => &mut self.sub,
        };
        if state.dst_names.len() <= namespace {
            state.dst_names.resize(namespace + 1, None);
        }
        state.dst_names[namespace] = Some(name.into());
        Ok(())
    }
    fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
        match kind {
            MappedElementKind::Field | MappedElementKind::Method => {
                if self.member.dst_descs.len() <= namespace {
                    self.member.dst_descs.resize(namespace + 1, None);
                }
                self.member.dst_descs[namespace] = Some(desc.into());
            }
            _ => {}
        }
        Ok(())
    }
    fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
        let (class, member, sub, state) = (&self.class, &self.member, &self.sub, self.sub_state);
        match kind {
            MappedElementKind::Class => self.next.visit_class(flat_class(class)),
            MappedElementKind::Field => self.next.visit_field(flat_member(class, member)),
            MappedElementKind::Method => self.next.visit_method(flat_member(class, member)),
            MappedElementKind::MethodArg => self.next.visit_method_arg(flat_arg(class, member, sub, state)),
            MappedElementKind::MethodVar => self.next.visit_method_var(flat_var(class, member, sub, state)),
        }
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
        let (class, member, sub, state) = (&self.class, &self.member, &self.sub, self.sub_state);
        match kind {
            MappedElementKind::Class => self.next.visit_class_comment(flat_class(class), comment),
            MappedElementKind::Field => self.next.visit_field_comment(flat_member(class, member), comment),
            MappedElementKind::Method => self.next.visit_method_comment(flat_member(class, member), comment),
            MappedElementKind::MethodArg => self.next.visit_method_arg_comment(flat_arg(class, member, sub, state), comment),
            MappedElementKind::MethodVar => self.next.visit_method_var_comment(flat_var(class, member, sub, state), comment),
        }
    }
}
