use mapping_io::reader::{self, detect_format, detect_format_with_ext};
use mapping_io::{writer, MappingFormat, MemoryMappingTree};

const SAMPLES: &[(MappingFormat, &str)] = &[
    (MappingFormat::TinyFile, "v1\tofficial\tnamed\nCLASS\ta\tb\n"),
    (MappingFormat::Tiny2File, "tiny\t2\t0\tofficial\tnamed\nc\ta\tb\n"),
    (MappingFormat::EnigmaFile, "CLASS a b\n\tFIELD c d I\n"),
    (MappingFormat::SrgFile, "PK: ./ pkg\nCL: a b\nFD: a/c b/d\n"),
    (MappingFormat::XsrgFile, "CL: a b\nFD: a/c I b/d I\n"),
    (MappingFormat::JamFile, "CL a b\nFD a c I d\n"),
    (MappingFormat::TsrgFile, "a b\n\tc d\n"),
    (MappingFormat::Tsrg2File, "tsrg2 left right\na b\n"),
    (MappingFormat::ProguardFile, "a.B -> c.D:\n    int e -> f\n"),
    (MappingFormat::IntellijMigrationMapFile, "<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n<migrationMap>\n</migrationMap>\n"),
    (MappingFormat::JobfFile, "c a.B = C\nf a.B.d:I = e\n"),
];

#[test]
fn canonical_samples() {
    for &(format, sample) in SAMPLES {
        assert_eq!(detect_format(sample.as_bytes()), Some(format), "{:?}", sample);
    }
}

#[test]
fn csrg_needs_its_extension() {
    let sample = b"a b\na c d\n";
    assert_eq!(detect_format(sample), None);
    assert_eq!(detect_format_with_ext(sample, Some("csrg")), Some(MappingFormat::CsrgFile));
}

#[test]
fn no_guessing() {
    for sample in &["", "hello", "a pkg/Named\na.b I count\n", "{\"json\": true}\n"] {
        assert_eq!(detect_format(sample.as_bytes()), None, "{:?}", sample);
    }
}

#[test]
fn samples_read_through_detection() {
    for &(format, sample) in SAMPLES {
        let mut tree = MemoryMappingTree::new();
        reader::read(sample.as_bytes(), None, &mut tree).unwrap_or_else(|e| panic!("{}: {}", format, e));
        if format != MappingFormat::IntellijMigrationMapFile {
            assert!(tree.classes().count() > 0, "{}", format);
        }
    }
}

#[test]
fn written_output_is_detected() {
    let mut tree = MemoryMappingTree::new();
    reader::read(&b"tiny\t2\t0\tofficial\tnamed\nc\ta\tb\n\tf\tI\tc\td\n"[..], None, &mut tree).unwrap();
    let undetectable = [MappingFormat::CsrgFile, MappingFormat::RecafSimpleFile, MappingFormat::EnigmaDir];
    for &format in MappingFormat::ALL.iter().filter(|format| !undetectable.contains(format)) {
        let mut buffer = Vec::new();
        {
            let mut writer = writer::create(&mut buffer, format).unwrap();
            tree.accept(&mut writer).unwrap();
        }
        assert_eq!(detect_format(&buffer), Some(format), "{}", String::from_utf8_lossy(&buffer));
    }
}
