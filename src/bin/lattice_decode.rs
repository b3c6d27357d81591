use std::path::{Path, PathBuf};

use chrono::Utc;
use clap::{Parser, ValueEnum};
use indicatif::{ProgressBar, ProgressStyle};
use lattice_decoder::{
    DecodeOutput, DecodeReport, DecoderConfig, DecoderError, FrameBuffer, Recognizer,
    RecognizerBuilder, TransitionLogBase, UtteranceReport,
};
use tracing_subscriber::EnvFilter;

#[path = "lattice_decode/json_report_formatter.rs"]
mod json_report_formatter;

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum OutputFormat {
    /// `word<TAB>endFrame<TAB>scoreDelta` lines per utterance.
    Text,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum LogBaseChoice {
    Base10,
    Natural,
}

impl From<LogBaseChoice> for TransitionLogBase {
    fn from(choice: LogBaseChoice) -> Self {
        match choice {
            LogBaseChoice::Base10 => Self::Base10,
            LogBaseChoice::Natural => Self::Natural,
        }
    }
}

#[derive(Debug, Parser)]
#[command(name = "lattice_decode")]
#[command(about = "Decode feature files against a word lattice with token-passing Viterbi")]
struct Args {
    /// JSON decoder config; individual flags override its fields.
    #[arg(long, env = "LATTICE_DECODE_CONFIG")]
    config: Option<PathBuf>,
    #[arg(long, env = "LATTICE_DECODE_LEXICON")]
    lexicon: Option<PathBuf>,
    #[arg(long, env = "LATTICE_DECODE_MODELS")]
    models: Option<PathBuf>,
    #[arg(long, env = "LATTICE_DECODE_STATES")]
    states: Option<PathBuf>,
    #[arg(long, env = "LATTICE_DECODE_TRANSITIONS")]
    transitions: Option<PathBuf>,
    #[arg(long, env = "LATTICE_DECODE_NETWORK")]
    network: Option<PathBuf>,
    #[arg(long)]
    epsilon_label: Option<String>,
    #[arg(long, value_enum)]
    transition_log_base: Option<LogBaseChoice>,
    /// Fail when a phone has no acoustic model instead of leaving it unbound.
    #[arg(long, default_value_t = false)]
    strict_binding: bool,
    #[arg(long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,
    /// Report destination for `--format json`; stdout when absent.
    #[arg(long)]
    out: Option<PathBuf>,
    /// Overrides RUST_LOG.
    #[arg(long, env = "LATTICE_DECODE_LOG")]
    log_level: Option<String>,
    /// Little-endian f64 feature files, one utterance each.
    #[arg(required = true, num_args = 1..)]
    features: Vec<PathBuf>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("lattice_decode: {err}");
        std::process::exit(1);
    }
}

fn run() -> Result<(), String> {
    let args = Args::parse();
    init_tracing(args.log_level.as_deref());

    let config = resolve_config(&args)?;
    let mut recognizer = RecognizerBuilder::new(config.clone())
        .build()
        .map_err(|err| format!("Failed to build recognizer: {err}"))?;
    let dimension = recognizer
        .dimension()
        .ok_or_else(|| "States file defines no emission states.".to_string())?;

    let progress = ProgressBar::new(args.features.len() as u64);
    progress.set_style(
        ProgressStyle::with_template("[{elapsed_precise}] [{wide_bar:.cyan/blue}] {pos}/{len} {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("=>-"),
    );

    let mut results = Vec::with_capacity(args.features.len());
    for path in &args.features {
        progress.set_message(path.display().to_string());
        let result = decode_file(&mut recognizer, path, dimension);
        if let Err((_, err)) = &result {
            tracing::error!(path = %path.display(), error = %err, "decode failed");
        }
        results.push((path.clone(), result));
        progress.inc(1);
    }
    progress.finish_with_message("decoding complete");

    match args.format {
        OutputFormat::Text => print_text(&results),
        OutputFormat::Json => {
            let utterances = results
                .iter()
                .map(|(path, result)| match result {
                    Ok(output) => UtteranceReport::decoded(path.display().to_string(), output.clone()),
                    Err((frames, err)) => {
                        UtteranceReport::failed(path.display().to_string(), *frames, err)
                    }
                })
                .collect();
            let report = DecodeReport::new(
                Utc::now().to_rfc3339(),
                config.network_path.clone(),
                config.models_path.clone(),
                config.transition_log_base,
                utterances,
            );
            match &args.out {
                Some(out) => json_report_formatter::write_report(out, &report)?,
                None => json_report_formatter::print_report(&report)?,
            }
        }
    }

    let failed = results.iter().filter(|(_, r)| r.is_err()).count();
    if failed > 0 {
        return Err(format!("{failed} of {} utterances produced no result", results.len()));
    }
    Ok(())
}

type FileResult = Result<DecodeOutput, (usize, DecoderError)>;

fn decode_file(recognizer: &mut Recognizer, path: &Path, dimension: usize) -> FileResult {
    let mut source = FrameBuffer::from_file(path, dimension).map_err(|err| (0, err))?;
    let frames = source.len();
    recognizer.recognize(&mut source).map_err(|err| (frames, err))
}

fn print_text(results: &[(PathBuf, FileResult)]) {
    let with_headers = results.len() > 1;
    for (path, result) in results {
        if with_headers {
            println!("# {}", path.display());
        }
        match result {
            Ok(output) => {
                for word in &output.words {
                    println!("{}\t{}\t{}", word.word, word.end_frame, word.score_delta);
                }
            }
            Err((_, err)) => eprintln!("{}: {err}", path.display()),
        }
    }
}

fn resolve_config(args: &Args) -> Result<DecoderConfig, String> {
    let mut config = match &args.config {
        Some(path) => DecoderConfig::load(path)
            .map_err(|err| format!("Failed to load config '{}': {err}", path.display()))?,
        None => DecoderConfig::default(),
    };

    let overrides = [
        (&args.lexicon, &mut config.lexicon_path),
        (&args.models, &mut config.models_path),
        (&args.states, &mut config.states_path),
        (&args.transitions, &mut config.transitions_path),
        (&args.network, &mut config.network_path),
    ];
    for (flag, field) in overrides {
        if let Some(path) = flag {
            *field = path.to_string_lossy().into_owned();
        }
    }
    if let Some(label) = &args.epsilon_label {
        config.epsilon_label = label.clone();
    }
    if let Some(base) = args.transition_log_base {
        config.transition_log_base = base.into();
    }
    config.strict_model_binding |= args.strict_binding;

    let missing = [
        ("--lexicon", &config.lexicon_path),
        ("--models", &config.models_path),
        ("--states", &config.states_path),
        ("--transitions", &config.transitions_path),
        ("--network", &config.network_path),
    ]
    .into_iter()
    .filter(|(_, value)| value.is_empty())
    .map(|(flag, _)| flag)
    .collect::<Vec<_>>();
    if !missing.is_empty() {
        return Err(format!(
            "Missing model inputs: pass {} or a --config file.",
            missing.join(", ")
        ));
    }
    Ok(config)
}

fn init_tracing(level: Option<&str>) {
    let filter = match level {
        Some(level) => EnvFilter::new(level),
        None => EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
    };
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
