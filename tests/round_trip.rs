use std::fs;

use mapping_io::format::FeaturePresence;
use mapping_io::{reader, writer, MappingFormat, MemoryMappingTree};

const SOURCE: &str = "tiny\t2\t0\tofficial\tnamed
c\tpkg/A\tpkg/Renamed
\tc\tThe main class
\tf\tI\ta\tcount
\tm\t(Lpkg/A;)V\tb\trun
\t\tp\t1\t\tspeed
c\tpkg/A$B\tpkg/Renamed$Inner
\tf\tJ\tc\ttotal
";

fn source() -> MemoryMappingTree {
    let mut tree = MemoryMappingTree::new();
    reader::read(SOURCE.as_bytes(), None, &mut tree).unwrap();
    tree
}

fn write(tree: &MemoryMappingTree, format: MappingFormat) -> Vec<u8> {
    let mut buffer = Vec::new();
    {
        let mut writer = writer::create(&mut buffer, format).unwrap();
        tree.accept(&mut writer).unwrap();
    }
    buffer
}

fn assert_names(tree: &MemoryMappingTree, format: MappingFormat) {
    let class = tree.class("pkg/A").unwrap_or_else(|| panic!("{} lost pkg/A", format));
    assert_eq!(class.dst_name(0), Some("pkg/Renamed"), "{}", format);
    let inner = tree.class("pkg/A$B").unwrap_or_else(|| panic!("{} lost pkg/A$B", format));
    assert_eq!(inner.dst_name(0), Some("pkg/Renamed$Inner"), "{}", format);
    if format == MappingFormat::IntellijMigrationMapFile {
        return
    }
    assert_eq!(class.field("a", Some("I")).unwrap().dst_name(0), Some("count"), "{}", format);
    assert_eq!(inner.field("c", Some("J")).unwrap().dst_name(0), Some("total"), "{}", format);
    let method = class.method("b", Some("(Lpkg/A;)V")).unwrap();
    assert_eq!(method.dst_name(0), Some("run"), "{}", format);
    if format.features().method_descs == FeaturePresence::Required {
        assert_eq!(method.src_desc.as_ref().map(String::as_str), Some("(Lpkg/A;)V"), "{}", format);
    }
    if format.features().field_descs == FeaturePresence::Required {
        assert_eq!(class.field("a", None).unwrap().src_desc.as_ref().map(String::as_str), Some("I"), "{}", format);
    }
}

#[test]
fn every_format_keeps_names() {
    let source = source();
    for &format in MappingFormat::ALL.iter().filter(|format| format.has_single_file()) {
        let written = write(&source, format);
        let mut tree = MemoryMappingTree::new();
        reader::read(&written[..], Some(format), &mut tree)
            .unwrap_or_else(|e| panic!("{} failed to read back: {}", format, e));
        assert_names(&tree, format);
    }
}

#[test]
fn writing_is_stable() {
    let source = source();
    for &format in MappingFormat::ALL.iter().filter(|format| format.has_single_file()) {
        let first = write(&source, format);
        let mut tree = MemoryMappingTree::new();
        reader::read(&first[..], Some(format), &mut tree).unwrap();
        let second = write(&tree, format);
        assert_eq!(String::from_utf8_lossy(&first), String::from_utf8_lossy(&second), "{}", format);
    }
}

#[test]
fn tiny2_keeps_everything() {
    let source = source();
    let written = write(&source, MappingFormat::Tiny2File);
    assert_eq!(String::from_utf8(written.clone()).unwrap(), SOURCE);
    let mut tree = MemoryMappingTree::new();
    reader::read(&written[..], None, &mut tree).unwrap();
    assert_eq!(tree, source);
}

#[test]
fn enigma_directory() {
    let dir = tempfile::tempdir().unwrap();
    let out = dir.path().join("mappings");
    let source = source();
    {
        let mut writer = writer::create_path(&out, MappingFormat::EnigmaDir).unwrap();
        source.accept(&mut writer).unwrap();
    }
    let file = out.join("pkg").join("Renamed.mapping");
    assert!(file.is_file());
    let content = fs::read_to_string(&file).unwrap();
    assert!(content.starts_with("CLASS pkg/A pkg/Renamed\n"), "{}", content);
    assert!(content.contains("\tCLASS B Inner\n"), "{}", content);

    assert_eq!(reader::detect_path_format(&out).unwrap(), Some(MappingFormat::EnigmaDir));
    let mut tree = MemoryMappingTree::new();
    reader::read_path(&out, None, &mut tree).unwrap();
    let class = tree.class("pkg/A").unwrap();
    assert_eq!(class.comment.as_ref().map(String::as_str), Some("The main class"));
    assert_eq!(class.method("b", Some("(Lpkg/A;)V")).unwrap().arg(1).unwrap().dst_name(0), Some("speed"));
    assert_eq!(tree.class("pkg/A$B").unwrap().dst_name(0), Some("pkg/Renamed$Inner"));
}

#[test]
fn enigma_directory_replaces_stale_files() {
    let dir = tempfile::tempdir().unwrap();
    let stale = dir.path().join("old").join("Gone.mapping");
    fs::create_dir_all(stale.parent().unwrap()).unwrap();
    fs::write(&stale, "CLASS old/Gone\n").unwrap();
    fs::write(dir.path().join("notes.txt"), "kept").unwrap();
    {
        let mut writer = writer::create_path(dir.path(), MappingFormat::EnigmaDir).unwrap();
        source().accept(&mut writer).unwrap();
    }
    assert!(!stale.exists());
    assert!(!dir.path().join("old").exists());
    assert!(dir.path().join("notes.txt").exists());
    assert!(dir.path().join("pkg").join("Renamed.mapping").exists());
}

#[test]
fn path_detection_uses_extension() {
    let dir = tempfile::tempdir().unwrap();
    let csrg = dir.path().join("mappings.csrg");
    fs::write(&csrg, "a b\na c d\n").unwrap();
    assert_eq!(reader::detect_path_format(&csrg).unwrap(), Some(MappingFormat::CsrgFile));
    let xsrg = dir.path().join("mappings.xsrg");
    fs::write(&xsrg, "CL: a b\n").unwrap();
    assert_eq!(reader::detect_path_format(&xsrg).unwrap(), Some(MappingFormat::XsrgFile));
    let tiny = dir.path().join("mappings.tiny");
    fs::write(&tiny, SOURCE).unwrap();
    assert_eq!(reader::path_namespaces(&tiny, None).unwrap(), vec!["official", "named"]);
    assert_eq!(reader::path_namespaces(&csrg, None).unwrap(), vec!["source", "target"]);
}
