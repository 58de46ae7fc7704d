use std::error::Error;
use std::fs::File;
use std::path::PathBuf;
use std::time::Instant;

use milkcat::model::{CrfModel, DependencyModel, LexType, Lexicon};
use milkcat::Model;

use clap::{error::ErrorKind, CommandFactory, Parser};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[clap(
    name = "compile",
    about = "A program to compile the model tables into one binary model."
)]
struct Args {
    /// System lexicon file of `word,cost` rows.
    #[clap(short = 'l', long)]
    lexicon_in: PathBuf,

    /// User lexicon file of `word[,cost]` rows.
    #[clap(short = 'u', long)]
    user_lexicon_in: Option<PathBuf>,

    /// Bi-gram cost file of `left,right,cost` rows.
    #[clap(short = 'b', long)]
    bigram_in: Option<PathBuf>,

    /// Part-of-speech CRF model in the text format of `crf_learn -t`.
    #[clap(short = 'c', long)]
    crf_in: Option<PathBuf>,

    /// Transition classifier of the dependency parser.
    ///
    /// It must be given together with `--templates-in`.
    #[clap(short = 'm', long)]
    maxent_in: Option<PathBuf>,

    /// Feature templates of the dependency parser, one per line.
    #[clap(short = 't', long)]
    templates_in: Option<PathBuf>,

    /// File to which the binary model is output (in zstd).
    #[clap(short = 'o', long)]
    model_out: PathBuf,
}

fn main() -> Result<(), Box<dyn Error>> {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    tracing::info!("Compiling the model...");
    let start = Instant::now();
    let lexicon = Lexicon::from_reader(File::open(&args.lexicon_in)?, LexType::System)?;
    tracing::info!("{} words in the system lexicon", lexicon.num_words());
    let mut model = Model::new(lexicon)?;

    if let Some(user_lexicon_in) = &args.user_lexicon_in {
        let user_lexicon = Lexicon::from_reader(File::open(user_lexicon_in)?, LexType::User)?;
        tracing::info!("{} words in the user lexicon", user_lexicon.num_words());
        model = model.with_user_lexicon(user_lexicon)?;
    }
    if let Some(bigram_in) = &args.bigram_in {
        model = model.with_bigram_from_reader(File::open(bigram_in)?)?;
    }
    if let Some(crf_in) = &args.crf_in {
        let crf = CrfModel::from_reader(File::open(crf_in)?)?;
        tracing::info!("{} part-of-speech tags", crf.num_tags());
        model = model.with_pos_model(crf);
    }
    match (&args.maxent_in, &args.templates_in) {
        (Some(maxent_in), Some(templates_in)) => {
            let dependency =
                DependencyModel::from_readers(File::open(maxent_in)?, File::open(templates_in)?)?;
            tracing::info!(
                "{} transitions, {} feature templates",
                dependency.classifier().ysize(),
                dependency.templates().len()
            );
            model = model.with_dependency_model(dependency);
        }
        (None, None) => (),
        _ => {
            Args::command()
                .error(
                    ErrorKind::ArgumentConflict,
                    "--maxent-in and --templates-in must be specified together.",
                )
                .exit();
        }
    }
    tracing::info!("{} seconds", start.elapsed().as_secs_f64());

    tracing::info!("Writing the model in zstd...: {:?}", &args.model_out);
    let mut f = zstd::Encoder::new(File::create(&args.model_out)?, 19)?;
    let num_bytes = model.write(&mut f)?;
    f.finish()?;
    tracing::info!("{num_bytes} bytes before compression");

    Ok(())
}
