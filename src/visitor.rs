//! The push-style visitation protocol every reader drives and every writer implements.
//!
//! A well-formed visitation looks like this:
//!
//! ```text
//! visit_header -> visit_namespaces -> visit_metadata*
//! visit_content
//!   visit_class -> visit_dst_name* -> visit_dst_desc* -> visit_element_content -> visit_comment?
//!     visit_field/visit_method -> ... -> visit_element_content -> visit_comment?
//!       visit_method_arg/visit_method_var -> ... -> visit_element_content -> visit_comment?
//! visit_end
//! ```
//!
//! Returning `false` from any of the `visit_*` methods that return a `bool` skips the
//! content that would follow it, while siblings are still visited.
//! Returning `false` from `visit_end` requests another complete pass,
//! which is only allowed after declaring [`MappingFlags::NEEDS_MULTIPLE_PASSES`].
use std::fmt::{self, Display, Formatter};

use bitflags::bitflags;
use failure::Error;

#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub enum MappedElementKind {
    Class,
    Field,
    Method,
    MethodArg,
    MethodVar,
}
impl MappedElementKind {
    /// The nesting depth of this kind of element below its class
    #[inline]
    pub fn level(self) -> usize {
        match self {
            MappedElementKind::Class => 0,
            MappedElementKind::Field | MappedElementKind::Method => 1,
            MappedElementKind::MethodArg | MappedElementKind::MethodVar => 2,
        }
    }
    #[inline]
    pub fn name(self) -> &'static str {
        match self {
            MappedElementKind::Class => "class",
            MappedElementKind::Field => "field",
            MappedElementKind::Method => "method",
            MappedElementKind::MethodArg => "method arg",
            MappedElementKind::MethodVar => "method var",
        }
    }
}
impl Display for MappedElementKind {
    #[inline]
    fn fmt(&self, f: &mut Formatter) -> fmt::Result {
        f.write_str(self.name())
    }
}

bitflags! {
    /// Requirements a visitor places on whoever drives it
    pub struct MappingFlags: u32 {
        /// Every element must be visited at most once per pass
        const NEEDS_ELEMENT_UNIQUENESS = 0b0000_0001;
        /// Header metadata must be complete before any content is visited
        const NEEDS_HEADER_METADATA = 0b0000_0010;
        /// The visitor may return `false` from `visit_end` to see the data again
        const NEEDS_MULTIPLE_PASSES = 0b0000_0100;
        const NEEDS_SRC_FIELD_DESC = 0b0000_1000;
        const NEEDS_SRC_METHOD_DESC = 0b0001_0000;
        const NEEDS_DST_FIELD_DESC = 0b0010_0000;
        const NEEDS_DST_METHOD_DESC = 0b0100_0000;
    }
}

pub trait MappingVisitor {
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
    fn visit_class(&mut self, src_name: &str) -> Result<bool, Error>;
    fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error>;
    fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error>;
    fn visit_method_arg(
        &mut self,
        arg_position: Option<u32>,
        lv_index: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error>;
    fn visit_method_var(
        &mut self,
        lvt_row_index: Option<u32>,
        lv_index: Option<u32>,
        start_op_idx: Option<u32>,
        end_op_idx: Option<u32>,
        src_name: Option<&str>,
    ) -> Result<bool, Error>;
    /// Finishes a pass, returning `false` to request another one
    #[inline]
    fn visit_end(&mut self) -> Result<bool, Error> {
        Ok(true)
    }
    fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error>;
    #[inline]
    fn visit_dst_desc(&mut self, _kind: MappedElementKind, _namespace: usize, _desc: &str) -> Result<(), Error> {
        Ok(())
    }
    #[inline]
    fn visit_element_content(&mut self, _kind: MappedElementKind) -> Result<bool, Error> {
        Ok(true)
    }
    fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error>;
}

macro_rules! forward_visitor {
    ($target:ty) => {
        impl<V: MappingVisitor + ?Sized> MappingVisitor for $target {
            #[inline]
            fn flags(&self) -> MappingFlags {
                (**self).flags()
            }
            #[inline]
            fn visit_header(&mut self) -> Result<bool, Error> {
                (**self).visit_header()
            }
            #[inline]
            fn visit_namespaces(&mut self, src_namespace: &str, dst_namespaces: &[String]) -> Result<(), Error> {
                (**self).visit_namespaces(src_namespace, dst_namespaces)
            }
            #[inline]
            fn visit_metadata(&mut self, key: &str, value: Option<&str>) -> Result<(), Error> {
                (**self).visit_metadata(key, value)
            }
            #[inline]
            fn visit_content(&mut self) -> Result<bool, Error> {
                (**self).visit_content()
            }
            #[inline]
            fn visit_class(&mut self, src_name: &str) -> Result<bool, Error> {
                (**self).visit_class(src_name)
            }
            #[inline]
            fn visit_field(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
                (**self).visit_field(src_name, src_desc)
            }
            #[inline]
            fn visit_method(&mut self, src_name: &str, src_desc: Option<&str>) -> Result<bool, Error> {
                (**self).visit_method(src_name, src_desc)
            }
            #[inline]
            fn visit_method_arg(
                &mut self,
                arg_position: Option<u32>,
                lv_index: Option<u32>,
                src_name: Option<&str>,
            ) -> Result<bool, Error> {
                (**self).visit_method_arg(arg_position, lv_index, src_name)
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
                (**self).visit_method_var(lvt_row_index, lv_index, start_op_idx, end_op_idx, src_name)
            }
            #[inline]
            fn visit_end(&mut self) -> Result<bool, Error> {
                (**self).visit_end()
            }
            #[inline]
            fn visit_dst_name(&mut self, kind: MappedElementKind, namespace: usize, name: &str) -> Result<(), Error> {
                (**self).visit_dst_name(kind, namespace, name)
            }
            #[inline]
            fn visit_dst_desc(&mut self, kind: MappedElementKind, namespace: usize, desc: &str) -> Result<(), Error> {
                (**self).visit_dst_desc(kind, namespace, desc)
            }
            #[inline]
            fn visit_element_content(&mut self, kind: MappedElementKind) -> Result<bool, Error> {
                (**self).visit_element_content(kind)
            }
            #[inline]
            fn visit_comment(&mut self, kind: MappedElementKind, comment: &str) -> Result<(), Error> {
                (**self).visit_comment(kind, comment)
            }
        }
    };
}
forward_visitor!(&mut V);
forward_visitor!(Box<V>);

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn element_levels() {
        assert_eq!(MappedElementKind::Class.level(), 0);
        assert_eq!(MappedElementKind::Field.level(), 1);
        assert_eq!(MappedElementKind::Method.level(), 1);
        assert_eq!(MappedElementKind::MethodArg.level(), 2);
        assert_eq!(MappedElementKind::MethodVar.level(), 2);
    }
    #[test]
    fn desc_flags() {
        let flags = MappingFlags::NEEDS_SRC_FIELD_DESC | MappingFlags::NEEDS_SRC_METHOD_DESC;
        assert!(flags.contains(MappingFlags::NEEDS_SRC_METHOD_DESC));
        assert!(!flags.intersects(MappingFlags::NEEDS_MULTIPLE_PASSES));
    }
}
