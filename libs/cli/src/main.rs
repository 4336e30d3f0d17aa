#[macro_use]
extern crate clap;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use clap::ArgMatches;
use failure::{bail, Error};
use indexmap::IndexMap;
use log::{debug, info};
use scopeguard::ScopeGuard;
use serde_derive::Serialize;

use mapping_io::adapter::{MappingNsCompleter, MissingDescFilter};
use mapping_io::error::UnknownMappingFormat;
use mapping_io::{reader, writer, FeaturePresence, FormatFeatures, MappingFormat, MappingVisitor};

fn app() -> clap::App<'static, 'static> {
    clap_app!(mapping_io =>
        (version: crate_version!())
        (author: crate_authors!())
        (about: crate_description!())
        (@setting SubcommandRequiredElseHelp)
        (@subcommand detect =>
            (about: "Detects the format of a mapping file or directory")
            (@arg json: --json "Print the format and its features as json")
            (@arg input: +required "The mapping file or directory"))
        (@subcommand namespaces =>
            (about: "Lists the namespaces of a mapping file, source first")
            (@arg format: -f --format +takes_value "The input format, detected if missing")
            (@arg input: +required "The mapping file or directory"))
        (@subcommand convert =>
            (about: "Converts mappings into another format")
            (@arg from: -f --from +takes_value "The input format, detected if missing")
            (@arg to: -t --to +takes_value +required "The output format")
            (@arg complete: -c --complete "Fill in missing destination names with the source names")
            (@arg alternatives: -a --alternatives +takes_value
                "Fill in missing names of namespaces from other namespaces, as ns=alternative,...")
            (@arg input: +required "The mapping file or directory to read")
            (@arg output: +required "Where to write the converted mappings"))
    )
}

fn main() -> Result<(), Error> {
    env_logger::init();
    let matches = app().get_matches();
    match matches.subcommand() {
        ("detect", Some(matches)) => detect(matches),
        ("namespaces", Some(matches)) => namespaces(matches),
        ("convert", Some(matches)) => convert(matches),
        _ => {
            app().print_help()?;
            println!();
            Ok(())
        }
    }
}

fn optional_format(matches: &ArgMatches, name: &str) -> Option<MappingFormat> {
    if matches.is_present(name) {
        Some(value_t!(matches, name, MappingFormat).unwrap_or_else(|e| e.exit()))
    } else {
        None
    }
}

#[derive(Serialize)]
struct DetectedFormat {
    id: MappingFormat,
    name: &'static str,
    features: FormatFeatures,
}

fn detect(matches: &ArgMatches) -> Result<(), Error> {
    let input = value_t!(matches, "input", PathBuf).unwrap_or_else(|e| e.exit());
    let format = reader::detect_path_format(&input)?.ok_or(UnknownMappingFormat)?;
    if matches.is_present("json") {
        let detected = DetectedFormat { id: format, name: format.name(), features: format.features() };
        serde_json::to_writer_pretty(io::stdout(), &detected)?;
        println!();
    } else {
        println!("{} ({})", format.name(), format.id());
    }
    Ok(())
}

fn namespaces(matches: &ArgMatches) -> Result<(), Error> {
    let input = value_t!(matches, "input", PathBuf).unwrap_or_else(|e| e.exit());
    for namespace in reader::path_namespaces(&input, optional_format(matches, "format"))? {
        println!("{}", namespace);
    }
    Ok(())
}

/// Parses `ns=alternative` pairs separated by commas
fn parse_alternatives(text: &str) -> Result<IndexMap<String, String>, Error> {
    let mut alternatives = IndexMap::new();
    for pair in text.split(',').map(str::trim).filter(|pair| !pair.is_empty()) {
        match pair.find('=') {
            Some(pos) if pos > 0 && pos < pair.len() - 1 => {
                alternatives.insert(pair[..pos].to_owned(), pair[pos + 1..].to_owned());
            }
            _ => bail!("Invalid alternative {:?}, expected ns=alternative", pair),
        }
    }
    Ok(alternatives)
}

fn requires_descs(features: FormatFeatures) -> bool {
    features.field_descs == FeaturePresence::Required || features.method_descs == FeaturePresence::Required
}

fn remove_partial_output(path: &Path) {
    if path.is_file() {
        debug!("Removing partial output {}", path.display());
        let _ = fs::remove_file(path);
    }
}

fn convert(matches: &ArgMatches) -> Result<(), Error> {
    let input = value_t!(matches, "input", PathBuf).unwrap_or_else(|e| e.exit());
    let output = value_t!(matches, "output", PathBuf).unwrap_or_else(|e| e.exit());
    let from = optional_format(matches, "from");
    let to = value_t!(matches, "to", MappingFormat).unwrap_or_else(|e| e.exit());
    let alternatives = match matches.value_of("alternatives") {
        Some(text) => Some(parse_alternatives(text)?),
        None => None,
    };
    let cleanup = scopeguard::guard(output.clone(), |path| remove_partial_output(&path));
    let writer = writer::create_path(&output, to)?;
    let mut visitor: Box<dyn MappingVisitor> = if requires_descs(to.features()) {
        Box::new(MissingDescFilter::new(writer))
    } else {
        Box::new(writer)
    };
    if alternatives.is_some() {
        visitor = Box::new(MappingNsCompleter::with_alternatives(visitor, alternatives, true));
    } else if matches.is_present("complete") {
        visitor = Box::new(MappingNsCompleter::new(visitor));
    }
    reader::read_path(&input, from, &mut *visitor)?;
    ScopeGuard::into_inner(cleanup);
    info!("Converted {} to {} ({})", input.display(), output.display(), to.name());
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    #[test]
    fn alternatives() {
        let parsed = parse_alternatives("named=intermediary, intermediary=official").unwrap();
        assert_eq!(parsed.get("named").map(String::as_str), Some("intermediary"));
        assert_eq!(parsed.keys().collect::<Vec<_>>(), vec!["named", "intermediary"]);
        assert!(parse_alternatives("named").is_err());
        assert!(parse_alternatives("=official").is_err());
    }
    #[test]
    fn cli_parses() {
        let matches = app().get_matches_from_safe(vec!["mapping-io", "convert", "--to", "tiny2", "in.srg", "out.tiny"]).unwrap();
        let (name, sub) = matches.subcommand();
        assert_eq!(name, "convert");
        let sub = sub.unwrap();
        assert_eq!(value_t!(sub, "to", MappingFormat).unwrap(), MappingFormat::Tiny2File);
    }
}
