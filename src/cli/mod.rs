use clap::Parser;
use log::{error, info, LevelFilter};
use std::fs::{self, File};
use std::io::BufWriter;
use std::path::{Path, PathBuf};

use seedxml::{seed_to_xml, xml_to_seed, DocumentOptions};

#[derive(Parser)]
#[command(name = "seedxml")]
#[command(version)]
#[command(about = "Convert between dataless SEED volumes and FDSN StationXML", long_about = None)]
struct Cli {
    /// Files or directories to convert; directories are walked recursively.
    /// Files ending in .xml convert to dataless SEED, everything else to
    /// StationXML
    #[arg(value_name = "SOURCE", required = true)]
    sources: Vec<PathBuf>,

    /// Output file (single source only) or directory
    #[arg(short, long, value_name = "PATH")]
    output: Option<PathBuf>,

    /// Overrides the document source organization
    #[arg(long, visible_alias = "org")]
    organization: Option<String>,

    /// Volume label, appended to the organization
    #[arg(long)]
    label: Option<String>,

    /// Keep going after a file fails to convert
    #[arg(short = 'c', long)]
    continue_on_error: bool,

    /// Increase log verbosity (-v errors, -vv warnings, -vvv info, -vvvv debug)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

pub fn run() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let level = match cli.verbose {
        0 => LevelFilter::Off,
        1 => LevelFilter::Error,
        2 => LevelFilter::Warn,
        3 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    env_logger::Builder::new().filter_level(level).init();

    let mut inputs = Vec::new();
    for source in &cli.sources {
        collect_inputs(source, &mut inputs)?;
    }
    if inputs.is_empty() {
        return Err("no input files found".into());
    }
    if inputs.len() > 1 {
        if let Some(output) = &cli.output {
            if !output.is_dir() {
                return Err("--output must be a directory when converting multiple files".into());
            }
        }
    }

    let options = DocumentOptions {
        organization: cli.organization.clone(),
        label: cli.label.clone(),
    };

    let mut failed = 0;
    for input in &inputs {
        let target = output_path(input, cli.output.as_deref());
        match convert_file(input, &target, &options) {
            Ok(()) => info!("{} -> {}", input.display(), target.display()),
            Err(e) => {
                failed += 1;
                if cli.continue_on_error {
                    error!("{}: {}", input.display(), e);
                } else {
                    return Err(format!("{}: {}", input.display(), e).into());
                }
            }
        }
    }
    if failed > 0 {
        return Err(format!("{} of {} files failed to convert", failed, inputs.len()).into());
    }
    Ok(())
}

fn collect_inputs(source: &Path, inputs: &mut Vec<PathBuf>) -> Result<(), std::io::Error> {
    if source.is_dir() {
        let mut entries: Vec<_> = fs::read_dir(source)?
            .collect::<Result<Vec<_>, _>>()?
            .into_iter()
            .map(|e| e.path())
            .collect();
        entries.sort();
        for entry in entries {
            collect_inputs(&entry, inputs)?;
        }
    } else {
        inputs.push(source.to_path_buf());
    }
    Ok(())
}

fn is_xml(path: &Path) -> bool {
    path.extension()
        .map(|ext| ext.eq_ignore_ascii_case("xml"))
        .unwrap_or(false)
}

/// `station.dataless` converts to `station.dataless.converted.xml` next to
/// its input, or inside `--output` when that is a directory.
fn output_path(input: &Path, output: Option<&Path>) -> PathBuf {
    let ext = if is_xml(input) { "dataless" } else { "xml" };
    let name = format!(
        "{}.converted.{}",
        input
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default(),
        ext
    );
    match output {
        Some(output) if output.is_dir() => output.join(name),
        Some(output) => output.to_path_buf(),
        None => input.with_file_name(name),
    }
}

fn convert_file(
    input: &Path,
    target: &Path,
    options: &DocumentOptions,
) -> Result<(), Box<dyn std::error::Error>> {
    let mut source = File::open(input)?;
    let mut sink = BufWriter::new(File::create(target)?);
    if is_xml(input) {
        xml_to_seed(&mut source, &mut sink)?;
    } else {
        seed_to_xml(&mut source, &mut sink, options)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn output_name_flips_direction() {
        let from_binary = output_path(Path::new("/data/IU.dataless"), None);
        assert_eq!(from_binary, Path::new("/data/IU.dataless.converted.xml"));
        let from_xml = output_path(Path::new("/data/IU.xml"), None);
        assert_eq!(from_xml, Path::new("/data/IU.xml.converted.dataless"));
    }

    #[test]
    fn explicit_output_file_wins() {
        let target = output_path(Path::new("in.dataless"), Some(Path::new("out.xml")));
        assert_eq!(target, Path::new("out.xml"));
    }
}
