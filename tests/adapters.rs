use indexmap::IndexMap;

use mapping_io::adapter::{FlatAsRegularMappingVisitor, MappingNsCompleter, MissingDescFilter, RegularAsFlatMappingVisitor};
use mapping_io::error::UnsupportedOperation;
use mapping_io::format::tiny::Tiny2FileWriter;
use mapping_io::{reader, MappingFormat, MemoryMappingTree};

const SRG: &str = "CL: a pkg/Named\nFD: a/b pkg/Named/count\nMD: a/c (I)V pkg/Named/run (I)V\n";

#[test]
fn srg_fields_need_filtering_for_tiny() {
    let mut writer = Tiny2FileWriter::new(Vec::new(), false);
    let err = reader::read(SRG.as_bytes(), Some(MappingFormat::SrgFile), &mut writer).unwrap_err();
    assert!(err.downcast_ref::<UnsupportedOperation>().is_some());

    let mut filter = MissingDescFilter::new(Tiny2FileWriter::new(Vec::new(), false));
    reader::read(SRG.as_bytes(), Some(MappingFormat::SrgFile), &mut filter).unwrap();
    let written = String::from_utf8(filter.into_inner().into_inner()).unwrap();
    assert!(written.starts_with("tiny\t2\t0\tsource\ttarget\n"), "{}", written);
    assert!(written.contains("c\ta\tpkg/Named\n"), "{}", written);
    assert!(written.contains("\tm\t(I)V\tc\trun\n"), "{}", written);
    assert!(!written.contains("\tf\t"), "{}", written);
}

const TINY2: &str = "tiny\t2\t0\tofficial\tintermediary\tnamed
c\ta\tclass_1\tpkg/Named
\tm\t(I)V\tb\tmethod_1\t
c\td\tclass_2\t
";

#[test]
fn completes_from_alternatives() {
    let mut alternatives = IndexMap::new();
    alternatives.insert("named".to_owned(), "intermediary".to_owned());
    let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), false);
    reader::read(TINY2.as_bytes(), None, &mut completer).unwrap();
    let tree = completer.into_inner();
    let named = tree.dst_namespaces().iter().position(|ns| ns == "named").unwrap();
    let class = tree.class("a").unwrap();
    assert_eq!(class.dst_name(named), Some("pkg/Named"));
    assert_eq!(class.method("b", Some("(I)V")).unwrap().dst_name(named), Some("method_1"));
    assert_eq!(tree.class("d").unwrap().dst_name(named), Some("class_2"));
}

#[test]
fn cyclic_alternatives_stay_missing() {
    let mut alternatives = IndexMap::new();
    alternatives.insert("intermediary".to_owned(), "named".to_owned());
    alternatives.insert("named".to_owned(), "intermediary".to_owned());
    let text = "tiny\t2\t0\tofficial\tintermediary\tnamed\nc\ta\t\t\n";
    let mut completer = MappingNsCompleter::with_alternatives(MemoryMappingTree::new(), Some(alternatives), false);
    reader::read(text.as_bytes(), None, &mut completer).unwrap();
    let tree = completer.into_inner();
    let class = tree.class("a").unwrap();
    assert_eq!(class.dst_name(0), None);
    assert_eq!(class.dst_name(1), None);
}

#[test]
fn flat_round_trip_through_a_reader() {
    let text = "tiny\t2\t0\tofficial\tnamed
c\ta\tNamed
\tc\tA class
\tf\tI\tb\tcount
\tm\t(I)V\tc\trun
\t\tp\t1\t\tspeed
";
    let mut direct = MemoryMappingTree::new();
    reader::read(text.as_bytes(), None, &mut direct).unwrap();
    let mut flat = FlatAsRegularMappingVisitor::new(RegularAsFlatMappingVisitor::new(MemoryMappingTree::new()));
    reader::read(text.as_bytes(), None, &mut flat).unwrap();
    assert_eq!(flat.into_inner().into_inner(), direct);
}
