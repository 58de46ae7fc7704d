use std::error::Error;
use std::fs::File;
use std::io::{BufRead, BufWriter, Write};
use std::path::PathBuf;
use std::sync::Arc;

use milkcat::model::{LexType, Lexicon};
use milkcat::{AnalyzedWord, Analyzer, Model};

use clap::{Parser, ValueEnum};
use tracing_subscriber::EnvFilter;

#[derive(Clone, Copy, Debug, ValueEnum)]
enum Mode {
    /// Words separated by spaces.
    Seg,
    /// Words with their tags as `word/tag`.
    Tag,
    /// One word per line as `id<TAB>word<TAB>tag<TAB>head<TAB>label`.
    Parse,
}

#[derive(Parser, Debug)]
#[clap(name = "analyze", about = "Analyzes sentences read from stdin, one per line")]
struct Args {
    /// Binary model compiled by `compile` (in zstd).
    #[clap(short = 'i', long)]
    model_in: PathBuf,

    /// User lexicon file of `word[,cost]` rows, replacing the compiled one.
    #[clap(short = 'u', long)]
    user_lexicon_in: Option<PathBuf>,

    /// Output format.
    #[clap(short = 'm', long, value_enum, default_value_t = Mode::Seg)]
    mode: Mode,

    /// Number of hypotheses kept at each token boundary.
    #[clap(short = 'b', long)]
    beam_width: Option<usize>,

    /// Maximum number of tokens in a sentence.
    #[clap(long)]
    max_tokens: Option<usize>,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("Loading the model...");
    let mut model = Model::read(zstd::Decoder::new(File::open(&args.model_in)?)?)?;
    if let Some(user_lexicon_in) = &args.user_lexicon_in {
        let user_lexicon = Lexicon::from_reader(File::open(user_lexicon_in)?, LexType::User)?;
        model = model.with_user_lexicon(user_lexicon)?;
    }

    let mut analyzer = Analyzer::new(Arc::new(model))?;
    if let Some(beam_width) = args.beam_width {
        analyzer = analyzer.beam_width(beam_width)?;
    }
    if let Some(max_tokens) = args.max_tokens {
        analyzer = analyzer.max_tokens(max_tokens);
    }
    match args.mode {
        Mode::Tag if !analyzer.has_tagger() => {
            return Err("the model has no part-of-speech model".into());
        }
        Mode::Parse if !analyzer.has_parser() => {
            return Err("the model has no dependency model".into());
        }
        _ => (),
    }
    tracing::info!("Ready to analyze");

    let out = std::io::stdout();
    let mut out = BufWriter::new(out.lock());
    for line in std::io::stdin().lock().lines() {
        let line = line?;
        match analyzer.analyze(&line) {
            Ok(words) => write_words(&mut out, words, args.mode)?,
            Err(e) => {
                tracing::warn!("skipped a line: {e}");
                writeln!(out)?;
            }
        }
    }
    out.flush()?;

    Ok(())
}

fn write_words<W>(out: &mut W, words: &[AnalyzedWord], mode: Mode) -> std::io::Result<()>
where
    W: Write,
{
    match mode {
        Mode::Seg => {
            for (i, word) in words.iter().enumerate() {
                let sep = if i + 1 == words.len() { "" } else { " " };
                write!(out, "{}{sep}", word.text())?;
            }
            writeln!(out)
        }
        Mode::Tag => {
            for (i, word) in words.iter().enumerate() {
                let sep = if i + 1 == words.len() { "" } else { " " };
                write!(out, "{}/{}{sep}", word.text(), word.tag().unwrap_or("-"))?;
            }
            writeln!(out)
        }
        Mode::Parse => {
            for (i, word) in words.iter().enumerate() {
                writeln!(
                    out,
                    "{}\t{}\t{}\t{}\t{}",
                    i + 1,
                    word.text(),
                    word.tag().unwrap_or_else(|| word.word_type().abbreviation()),
                    word.head().unwrap_or(0),
                    word.label().unwrap_or("-"),
                )?;
            }
            writeln!(out)
        }
    }
}
