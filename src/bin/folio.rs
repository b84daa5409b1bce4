//! Command-line front end for folio.
//!
//! Usage:
//!   folio `<path>` [--group-by chapter] [--filter text=aorangi] [--normalization group]
//!   folio `<path>` --tokens --format json
//!   folio `<path>` --group-by chapter --tf-idf --stop-words en
//!
//! Logging goes to stderr and is controlled by `RUST_LOG`.

use std::error::Error as StdError;
use std::fs::File;
use std::io::{self, BufReader, BufWriter, Write};
use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, ValueEnum};
use folio::{
    read_lexicon_tsv, sentiment_counts, tf_idf, write_frequencies_tsv, write_tf_idf_tsv,
    write_tokens_tsv, ConfigLoader, Dimension, Error, FrequencyQuery, Normalization, Order,
    StopWords, TermShape, TokenPredicate,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Format {
    Tsv,
    Json,
}

#[derive(Parser)]
#[command(name = "folio")]
#[command(version, about = "Structural text analysis for plain-text books")]
struct Args {
    /// Path to the text file
    path: PathBuf,

    /// TOML file layered over the built-in defaults
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Override a configuration key, e.g. `tokenizer.hyphens=keep`
    #[arg(long = "set", value_name = "KEY=VALUE")]
    overrides: Vec<String>,

    /// Group by `chapter` and/or `paragraph` (comma separated)
    #[arg(short, long, value_delimiter = ',')]
    group_by: Vec<String>,

    /// Token predicate, e.g. `text=aorangi | following=cook`
    #[arg(long)]
    filter: Option<String>,

    /// `word`, `bigram` or `matches`
    #[arg(long, default_value = "word")]
    terms: String,

    /// `count`, `percent-of-matches` or `percent-of-group`
    #[arg(short, long, default_value = "count")]
    normalization: String,

    /// `source` or `count`
    #[arg(long, default_value = "source")]
    sort: String,

    /// Drop stop words for a language (`en`, `de`, ...)
    #[arg(long, value_name = "LANGUAGE")]
    stop_words: Option<String>,

    /// Count sentiment categories from a `word<TAB>category` lexicon
    #[arg(
        long,
        value_name = "TSV",
        conflicts_with_all = ["filter", "terms", "normalization", "sort", "tf_idf"]
    )]
    lexicon: Option<PathBuf>,

    /// Weight word counts by TF-IDF over the groups
    #[arg(long, conflicts_with_all = ["filter", "terms", "normalization", "sort"])]
    tf_idf: bool,

    /// Print the token table instead of frequencies
    #[arg(
        long,
        conflicts_with_all = ["group_by", "filter", "terms", "normalization", "sort", "lexicon", "tf_idf"]
    )]
    tokens: bool,

    /// Output format
    #[arg(short, long, value_enum, default_value_t = Format::Tsv)]
    format: Format,
}

fn main() -> ExitCode {
    env_logger::init();
    let args = Args::parse();

    match run(&args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("folio: {e}");
            ExitCode::FAILURE
        }
    }
}

fn run(args: &Args) -> Result<(), Box<dyn StdError>> {
    let mut loader = ConfigLoader::new();
    if let Some(path) = &args.config {
        loader = loader.with_file(path);
    }
    for entry in &args.overrides {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| Error::Configuration(format!("expected KEY=VALUE, got {entry:?}")))?;
        loader = loader.set_override(key.trim(), value.trim())?;
    }
    let pipeline = loader.build()?.build()?;

    let dimensions = args
        .group_by
        .iter()
        .map(|d| d.parse::<Dimension>())
        .collect::<folio::Result<Vec<_>>>()?;
    let mut query = FrequencyQuery::new()
        .group_by(dimensions.iter().copied())
        .terms(args.terms.parse::<TermShape>()?)
        .normalization(args.normalization.parse::<Normalization>()?)
        .order(args.sort.parse::<Order>()?);
    if let Some(filter) = &args.filter {
        query = query.filter(filter.parse::<TokenPredicate>()?);
    }
    query.validate()?;

    let analysis = pipeline.run_path(&args.path)?;
    for skipped in &analysis.skipped {
        eprintln!("folio: skipped {skipped}");
    }

    let tokens = match &args.stop_words {
        Some(language) => StopWords::for_language(language)?.remove(&analysis.tokens),
        None => analysis.tokens,
    };

    let mut out = BufWriter::new(io::stdout().lock());

    if args.tokens {
        match args.format {
            Format::Tsv => write_tokens_tsv(&tokens, &mut out)?,
            Format::Json => serde_json::to_writer_pretty(&mut out, &tokens)?,
        }
    } else if let Some(path) = &args.lexicon {
        let file = File::open(path).map_err(|source| Error::ResourceUnavailable {
            resource: path.display().to_string(),
            source,
        })?;
        let lexicon = read_lexicon_tsv(BufReader::new(file))?;
        let records = sentiment_counts(&tokens, &lexicon, &dimensions)?;
        match args.format {
            Format::Tsv => write_frequencies_tsv(&records, &dimensions, &mut out)?,
            Format::Json => serde_json::to_writer_pretty(&mut out, &records)?,
        }
    } else if args.tf_idf {
        let counts = FrequencyQuery::new()
            .group_by(dimensions.iter().copied())
            .run(&tokens)?;
        let records = tf_idf(&counts)?;
        match args.format {
            Format::Tsv => write_tf_idf_tsv(&records, &dimensions, &mut out)?,
            Format::Json => serde_json::to_writer_pretty(&mut out, &records)?,
        }
    } else {
        let records = query.run(&tokens)?;
        match args.format {
            Format::Tsv => write_frequencies_tsv(&records, &dimensions, &mut out)?,
            Format::Json => serde_json::to_writer_pretty(&mut out, &records)?,
        }
    }

    if args.format == Format::Json {
        writeln!(out)?;
    }
    out.flush()?;
    Ok(())
}
