//! Visitors that sit between a reader and another visitor and reshape the visitation.
mod flat;
mod missing_desc;
mod ns_completer;

pub use self::flat::{
    FlatAsRegularMappingVisitor, FlatClass, FlatMappingVisitor, FlatMember, FlatMethodArg, FlatMethodVar,
    RegularAsFlatMappingVisitor,
};
pub use self::missing_desc::MissingDescFilter;
pub use self::ns_completer::MappingNsCompleter;
