mod common;

use mapping_io::error::{MalformedMapping, UnknownMappingFormat, VisitorContractViolation};
use mapping_io::{reader, writer, MappedElementKind, MappingFlags, MappingFormat, MemoryMappingTree};

use crate::common::RecordingVisitor;

#[test]
fn tiny_v1_single_class() {
    let mut visitor = RecordingVisitor::new();
    reader::read(&b"v1\tsource\ttarget\nCLASS\ta/b\tc/d\n"[..], None, &mut visitor).unwrap();
    assert_eq!(visitor.calls, vec![
        "header",
        "namespaces source target",
        "content",
        "class a/b",
        "dst_name class 0 c/d",
        "element_content class",
        "end",
    ]);
}

#[test]
fn proguard_field() {
    let mut visitor = RecordingVisitor::new();
    reader::read(&b"a.B -> c.D:\n    int e -> f\n"[..], None, &mut visitor).unwrap();
    assert_eq!(visitor.count_prefixed("class "), 1);
    assert_eq!(visitor.count("class a/B"), 1);
    assert_eq!(visitor.count("dst_name class 0 c/D"), 1);
    assert_eq!(visitor.count("field e Some(\"I\")"), 1);
    assert_eq!(visitor.count("dst_name field 0 f"), 1);
    assert_eq!(visitor.count_prefixed("method "), 0);
}

#[test]
fn enigma_nested_class() {
    let mut tree = MemoryMappingTree::new();
    reader::read(&b"CLASS A B\n\tCLASS Inner Renamed\n"[..], None, &mut tree).unwrap();
    assert_eq!(tree.class("A").unwrap().dst_name(0), Some("B"));
    assert_eq!(tree.class("A$Inner").unwrap().dst_name(0), Some("B$Renamed"));
    assert_eq!(tree.classes().count(), 2);
}

#[test]
fn malformed_lines_are_numbered() {
    let text = "tiny\t2\t0\tofficial\tnamed\nc\ta\tb\n\tf\tI\n";
    let err = reader::read(text.as_bytes(), None, &mut MemoryMappingTree::new()).unwrap_err();
    let malformed = err.downcast_ref::<MalformedMapping>().unwrap();
    assert_eq!(malformed.line, 3);
}

#[test]
fn unknown_format() {
    let err = reader::read(&b"\x00\x01\x02 definitely not mappings"[..], None, &mut RecordingVisitor::new()).unwrap_err();
    assert!(err.downcast_ref::<UnknownMappingFormat>().is_some());
}

#[test]
fn uniqueness_buffers_repeated_owners() {
    let text = "a b\nx y\na c d\n";
    let mut visitor = RecordingVisitor::with_flags(MappingFlags::NEEDS_ELEMENT_UNIQUENESS);
    reader::read(text.as_bytes(), Some(MappingFormat::CsrgFile), &mut visitor).unwrap();
    assert_eq!(visitor.count("class a"), 1);
    assert_eq!(visitor.count("class x"), 1);
    assert_eq!(visitor.count("field c None"), 1);
}

const TINY2: &str = "tiny\t2\t0\tofficial\tnamed\n\tsorted\nc\ta\tb\n\tm\t()V\tc\td\n";
const MIGRATION_MAP: &str = "<?xml version=\"1.0\" encoding=\"UTF-8\"?>
<migrationMap>
\t<name value=\"Example\"/>
\t<entry oldName=\"a.B\" newName=\"c.D\" type=\"class\"/>
</migrationMap>
";

fn assert_replayed_once(text: &str, format: MappingFormat) {
    let mut visitor = RecordingVisitor::with_flags(MappingFlags::NEEDS_MULTIPLE_PASSES);
    visitor.extra_passes = 1;
    reader::read(text.as_bytes(), Some(format), &mut visitor).unwrap();
    assert_eq!(visitor.count("header"), 2, "{}", format);
    assert_eq!(visitor.count("end"), 2, "{}", format);
    let half = visitor.calls.len() / 2;
    assert_eq!(visitor.calls[..half], visitor.calls[half..], "{}", format);
}

#[test]
fn multiple_passes_replay_everything() {
    assert_replayed_once(TINY2, MappingFormat::Tiny2File);
    assert_replayed_once("CL: a b\nFD: a/c b/d\nMD: a/e ()V b/f ()V\n", MappingFormat::SrgFile);
    assert_replayed_once("tsrg2 left right\na b\n\tc d\n", MappingFormat::Tsrg2File);
    assert_replayed_once(MIGRATION_MAP, MappingFormat::IntellijMigrationMapFile);
}

#[test]
fn tree_replays_passes() {
    let mut tree = MemoryMappingTree::new();
    reader::read(TINY2.as_bytes(), None, &mut tree).unwrap();
    let mut visitor = RecordingVisitor::with_flags(MappingFlags::NEEDS_MULTIPLE_PASSES);
    visitor.extra_passes = 1;
    tree.accept(&mut visitor).unwrap();
    assert_eq!(visitor.count("class a"), 2);
}

#[test]
fn undeclared_extra_pass_is_a_violation() {
    for &(text, format) in &[(TINY2, MappingFormat::Tiny2File), (MIGRATION_MAP, MappingFormat::IntellijMigrationMapFile)] {
        let mut visitor = RecordingVisitor::new();
        visitor.extra_passes = 1;
        let err = reader::read(text.as_bytes(), Some(format), &mut visitor).unwrap_err();
        assert!(err.downcast_ref::<VisitorContractViolation>().is_some(), "{}", format);
        assert_eq!(visitor.count("header"), 1);
    }
}

const COMMENTED: &str = "tiny\t2\t0\tofficial\tnamed
c\tpkg/A\tpkg/Renamed
\tc\tThe main class
\tf\tI\ta\tcount
\t\tc\tHow many
\tm\t(Lpkg/A;)V\tb\trun
\t\tc\tRuns it
\t\tp\t1\t\tspeed
c\tpkg/A$B\tpkg/Renamed$Inner
\tf\tJ\tc\ttotal
";

/// `COMMENTED` in every single file format
fn commented_samples() -> Vec<(MappingFormat, Vec<u8>)> {
    let mut tree = MemoryMappingTree::new();
    reader::read(COMMENTED.as_bytes(), None, &mut tree).unwrap();
    MappingFormat::ALL.iter().cloned().filter(|format| format.has_single_file()).map(|format| {
        let mut buffer = Vec::new();
        {
            let mut writer = writer::create(&mut buffer, format).unwrap();
            tree.accept(&mut writer).unwrap();
        }
        (format, buffer)
    }).collect()
}

fn read_declining(format: MappingFormat, text: &[u8], flags: MappingFlags, configure: fn(&mut RecordingVisitor)) -> RecordingVisitor {
    let mut visitor = RecordingVisitor::with_flags(flags);
    configure(&mut visitor);
    reader::read(text, Some(format), &mut visitor)
        .unwrap_or_else(|e| panic!("{} failed with {:?}: {}", format, flags, e));
    visitor
}

#[test]
fn declined_elements_skip_their_content() {
    let flag_sets = [MappingFlags::empty(), MappingFlags::NEEDS_ELEMENT_UNIQUENESS];
    for (format, text) in commented_samples() {
        for &flags in flag_sets.iter() {
            let visitor = read_declining(format, &text, flags, |visitor| visitor.decline_classes = true);
            assert!(visitor.count_prefixed("class ") > 0, "{}", format);
            for call in &["dst_name", "element_content", "field", "method", "arg", "var", "comment"] {
                assert_eq!(visitor.count_prefixed(call), 0, "{} with {:?} declined classes: {:?}", format, flags, visitor.calls);
            }

            let visitor = read_declining(format, &text, flags, |visitor| {
                visitor.declined_content = Some(MappedElementKind::Class)
            });
            assert!(visitor.count("dst_name class 0 pkg/Renamed") > 0, "{}", format);
            for call in &["field", "method", "arg", "var", "comment"] {
                assert_eq!(visitor.count_prefixed(call), 0, "{} with {:?} declined class content: {:?}", format, flags, visitor.calls);
            }

            let visitor = read_declining(format, &text, flags, |visitor| {
                visitor.declined_content = Some(MappedElementKind::Field)
            });
            assert_eq!(visitor.count_prefixed("comment field"), 0, "{} with {:?}: {:?}", format, flags, visitor.calls);
            if format != MappingFormat::IntellijMigrationMapFile {
                assert!(visitor.count_prefixed("field a") > 0, "{}", format);
                assert!(visitor.count_prefixed("method b") > 0, "{}", format);
            }
        }
    }
}

#[test]
fn declined_field_keeps_method_comments() {
    let mut visitor = RecordingVisitor::new();
    visitor.declined_content = Some(MappedElementKind::Field);
    reader::read(COMMENTED.as_bytes(), None, &mut visitor).unwrap();
    assert_eq!(visitor.count("comment field How many"), 0);
    assert_eq!(visitor.count("comment method Runs it"), 1);
    assert_eq!(visitor.count("comment class The main class"), 1);
}
