use anyhow::{bail, ensure, Context, Result};
use encoding_rs::Encoding;
use indicatif::{ProgressBar, ProgressIterator, ProgressStyle};
use serde::Serialize;
use std::{
    env,
    fs::{self, File},
    io::{BufWriter, Write},
    path::{Path, PathBuf},
};
use tracing::{info, warn};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use aozora_epub3::{
    config::ConverterConfig,
    converter::{
        section::{Section, SingleFileSink},
        Converter, Dictionaries,
    },
    metadata::BookMetadata,
};

struct Args {
    dictionary_path: Option<String>,
    config_path: Option<String>,
    metadata_path: Option<String>,
    encoding: String,
    vertical: bool,
    output_path: String,
    input_paths: Vec<String>,
}

fn get_args() -> Result<Option<Args>> {
    let args: Vec<String> = env::args().skip(1).collect();

    let mut opts = getopts::Options::new();
    opts.optopt(
        "d",
        "dict",
        "directory with chuki_tag.txt, chuki_tag_suf.txt, replace.txt",
        "DIR",
    );
    opts.optopt("c", "config", "converter config (JSON)", "FILE");
    opts.optopt("m", "metadata", "title and author lines (JSON)", "FILE");
    opts.optopt("e", "encoding", "encoding of input (default: Shift_JIS)", "LABEL");
    opts.optflag("v", "vertical", "vertical writing");
    opts.optopt("o", "output", "output directory (default: .)", "DIR");
    opts.optflag("h", "help", "print this help");

    let matches = match opts.parse(&args) {
        Ok(m) => m,
        Err(f) => bail!(f),
    };

    if matches.opt_present("h") {
        print!("{}", opts.usage("Usage: aozora-epub3 [options] FILE..."));
        return Ok(None);
    }

    ensure!(!matches.free.is_empty(), "input file is required");

    Ok(Some(Args {
        dictionary_path: matches.opt_str("d"),
        config_path: matches.opt_str("c"),
        metadata_path: matches.opt_str("m"),
        encoding: matches.opt_str("e").unwrap_or_else(|| "Shift_JIS".to_owned()),
        vertical: matches.opt_present("v"),
        output_path: matches.opt_str("o").unwrap_or_else(|| ".".to_owned()),
        input_paths: matches.free,
    }))
}

#[derive(Serialize)]
struct SectionsJson<'a> {
    sections: &'a [Section],
    images: &'a [String],
}

fn main() -> Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "aozora_epub3=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let Some(args) = get_args()? else {
        return Ok(());
    };

    let dictionaries = match &args.dictionary_path {
        Some(path) => Dictionaries::load(Path::new(path))
            .with_context(|| format!("Failed to load dictionaries: {}", path))?,
        None => Dictionaries::builtin(),
    };
    info!(
        annotations = dictionaries.annotations.len(),
        forward_references = dictionaries.forward_references.len(),
        "Loaded dictionaries"
    );

    let config = match &args.config_path {
        Some(path) => ConverterConfig::from_json_file(Path::new(path))?,
        None => ConverterConfig::default(),
    };

    let mut metadata = match &args.metadata_path {
        Some(path) => {
            let json = fs::read_to_string(path)
                .with_context(|| format!("Failed to read metadata: {}", path))?;
            serde_json::from_str::<BookMetadata>(&json)
                .with_context(|| format!("Invalid metadata: {}", path))?
        }
        None => BookMetadata::default(),
    };
    metadata.vertical |= args.vertical;

    let encoding = Encoding::for_label(args.encoding.as_bytes())
        .with_context(|| format!("Unknown encoding: {}", args.encoding))?;

    let output_path = PathBuf::from(&args.output_path);
    fs::create_dir_all(&output_path).context("Failed to create output directory")?;

    let converter = Converter::new(&dictionaries, &config)?;

    let pb = create_progress_bar(args.input_paths.len() as u64);
    for input_path in args.input_paths.iter().progress_with(pb) {
        let input_path = Path::new(input_path);
        convert_file(&converter, input_path, encoding, &metadata, &output_path)
            .with_context(|| format!("Failed to convert {}", input_path.display()))?;
    }

    Ok(())
}

fn convert_file(
    converter: &Converter,
    input_path: &Path,
    encoding: &'static Encoding,
    metadata: &BookMetadata,
    output_path: &Path,
) -> Result<()> {
    let bytes = fs::read(input_path)?;
    let (txt, _, had_errors) = encoding.decode(&bytes);
    if had_errors {
        warn!(path = %input_path.display(), "Input contains malformed characters");
    }

    let stem = input_path
        .file_stem()
        .context("Input path has no file name")?
        .to_string_lossy();

    let mut sink = SingleFileSink::new().with_image_section_lines(&metadata.image_section_lines);

    let xhtml_path = output_path.join(format!("{}.xhtml", stem));
    let mut out = BufWriter::new(
        File::create(&xhtml_path)
            .with_context(|| format!("Failed to create {}", xhtml_path.display()))?,
    );
    converter.convert(txt.as_bytes(), &mut out, metadata, &mut sink)?;
    out.flush()?;

    fs::write(
        output_path.join(format!("{}.sections.json", stem)),
        serde_json::to_string_pretty(&SectionsJson {
            sections: sink.sections(),
            images: sink.images(),
        })?,
    )?;

    Ok(())
}

fn create_progress_bar(len: u64) -> ProgressBar {
    let pb = ProgressBar::new(len);
    pb.set_style(
        ProgressStyle::with_template(
            "{percent:>3}% [{wide_bar:.cyan/blue}] {pos}/{len} [{elapsed_precise} < {eta_precise}]",
        )
        .unwrap()
        .progress_chars("#-"),
    );
    pb
}
