use failure_derive::Fail;

use crate::visitor::MappedElementKind;

/// The input doesn't follow the syntax of its format.
#[derive(Debug, Fail)]
#[fail(display = "{} in line {}", reason, line)]
pub struct MalformedMapping {
    /// The 1-based line the problem was found in
    pub line: usize,
    pub reason: String
}
impl MalformedMapping {
    #[inline]
    pub fn new<S: Into<String>>(line: usize, reason: S) -> MalformedMapping {
        MalformedMapping { line, reason: reason.into() }
    }
}

/// No detection rule matched the input.
#[derive(Debug, Fail)]
#[fail(display = "Unknown mapping format, specify the format explicitly")]
pub struct UnknownMappingFormat;

/// The caller asked for something the format or visitor can't do.
#[derive(Debug, Fail)]
#[fail(display = "Unsupported operation: {}", _0)]
pub struct UnsupportedOperation(pub String);
impl UnsupportedOperation {
    #[inline]
    pub fn new<S: Into<String>>(reason: S) -> UnsupportedOperation {
        UnsupportedOperation(reason.into())
    }
    #[cold]
    pub fn missing_namespace(index: usize, count: usize) -> UnsupportedOperation {
        UnsupportedOperation(format!(
            "destination namespace {} doesn't exist, only {} declared",
            index, count
        ))
    }
    #[cold]
    pub fn missing_desc(kind: MappedElementKind, name: &str) -> UnsupportedOperation {
        UnsupportedOperation(format!("{} {} has no descriptor, which the format requires", kind, name))
    }
}

/// A visitor broke the visitation protocol.
///
/// This is a bug in the visitor, not a problem with the input.
#[derive(Debug, Fail)]
#[fail(display = "Visitor contract violation: {}", _0)]
pub struct VisitorContractViolation(pub &'static str);
impl VisitorContractViolation {
    #[inline]
    pub fn repeated_visitation() -> VisitorContractViolation {
        VisitorContractViolation("repeated visitation requested without NEEDS_MULTIPLE_PASSES")
    }
}
