use std::fs::{self, File};
use std::io::BufReader;
use std::path::{Path, PathBuf};

use lattice_decoder::{
    DecodeOutput, DecoderConfig, DecoderError, FrameBuffer, Recognizer, RecognizerBuilder,
};
use libtest_mimic::{Arguments, Failed, Trial};
use serde::Deserialize;

const SUITE_NAME: &str = "decode_reference_matches_fixture";
const SCORE_TOLERANCE: f32 = 1e-4;

#[derive(Debug, Deserialize)]
struct DecodeCase {
    #[serde(default)]
    description: String,
    frames: Vec<Vec<f64>>,
    #[serde(default)]
    expected_words: Vec<ExpectedWord>,
    expected_total_score: Option<f32>,
    expected_error: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ExpectedWord {
    word: String,
    end_frame: usize,
    score_delta: Option<f32>,
}

fn main() {
    let args = Arguments::from_args();
    let repo_root = PathBuf::from(env!("CARGO_MANIFEST_DIR"));

    let case_dirs = match list_case_dirs(&repo_root.join("test-data").join("decoding")) {
        Ok(dirs) => dirs,
        Err(err) => {
            run_setup_failure(&args, err);
            return;
        }
    };
    if case_dirs.is_empty() {
        run_setup_failure(
            &args,
            "No decoding fixtures found under test-data/decoding.".to_string(),
        );
        return;
    }

    let tests = case_dirs
        .into_iter()
        .map(|dir| {
            let id = dir
                .file_name()
                .map(|name| name.to_string_lossy().into_owned())
                .unwrap_or_default();
            Trial::test(format!("{SUITE_NAME}::{id}"), move || {
                run_case(&id, &dir).map_err(Failed::from)
            })
        })
        .collect();

    libtest_mimic::run(&args, tests).exit();
}

fn run_setup_failure(args: &Arguments, message: String) {
    let test = Trial::test(format!("{SUITE_NAME}::setup"), move || {
        Err(Failed::from(message))
    });
    libtest_mimic::run(args, vec![test]).exit();
}

fn list_case_dirs(root: &Path) -> Result<Vec<PathBuf>, String> {
    let entries = fs::read_dir(root)
        .map_err(|err| format!("Failed to list fixtures in '{}': {err}", root.display()))?;
    let mut dirs = entries
        .filter_map(Result::ok)
        .map(|entry| entry.path())
        .filter(|path| path.join("case.json").is_file())
        .collect::<Vec<_>>();
    dirs.sort();
    Ok(dirs)
}

fn load_case(path: &Path) -> Result<DecodeCase, String> {
    let file = File::open(path)
        .map_err(|err| format!("Failed to open fixture '{}': {err}", path.display()))?;
    serde_json::from_reader(BufReader::new(file))
        .map_err(|err| format!("Failed to parse fixture '{}': {err}", path.display()))
}

fn build_recognizer(dir: &Path) -> Result<Recognizer, String> {
    let path = |name: &str| dir.join(name).to_string_lossy().into_owned();
    let config = DecoderConfig {
        lexicon_path: path("lexicon.txt"),
        models_path: path("models.txt"),
        states_path: path("states.txt"),
        transitions_path: path("transitions.txt"),
        network_path: path("network.slf"),
        ..DecoderConfig::default()
    };
    RecognizerBuilder::new(config)
        .build()
        .map_err(|err| format!("Failed to build recognizer for '{}': {err}", dir.display()))
}

/// Writes the case frames as a little-endian f64 stream so decoding goes
/// through the same feature reader as the CLI.
fn write_feature_file(id: &str, frames: &[Vec<f64>]) -> Result<PathBuf, String> {
    let path = std::env::temp_dir().join(format!("lattice_decoder_reference_{id}.bin"));
    let bytes: Vec<u8> = frames
        .iter()
        .flatten()
        .flat_map(|value| value.to_le_bytes())
        .collect();
    fs::write(&path, bytes)
        .map_err(|err| format!("Failed to write features '{}': {err}", path.display()))?;
    Ok(path)
}

fn decode(recognizer: &mut Recognizer, features: &Path) -> Result<DecodeOutput, DecoderError> {
    let dimension = recognizer.dimension().unwrap_or(0);
    let mut source = FrameBuffer::from_file(features, dimension)?;
    recognizer.recognize(&mut source)
}

fn run_case(id: &str, dir: &Path) -> Result<(), String> {
    let case = load_case(&dir.join("case.json"))?;
    let mut recognizer = build_recognizer(dir)?;
    let features = write_feature_file(id, &case.frames)?;

    let first = decode(&mut recognizer, &features);
    let second = decode(&mut recognizer, &features);
    let _ = fs::remove_file(&features);

    match (&case.expected_error, first) {
        (Some(expected), Err(err)) => {
            let kind = error_kind(&err);
            if kind != expected.as_str() {
                return Err(format!("{id}: expected error '{expected}', got '{kind}' ({err})"));
            }
            if second.is_ok() {
                return Err(format!("{id}: second decode unexpectedly succeeded"));
            }
            Ok(())
        }
        (Some(expected), Ok(output)) => Err(format!(
            "{id}: expected error '{expected}', decoded {:?}",
            output.words
        )),
        (None, Err(err)) => Err(format!("{id} ({}): decode failed: {err}", case.description)),
        (None, Ok(output)) => {
            compare_output(id, &case, &output)?;
            match second {
                Ok(again) if again == output => Ok(()),
                Ok(again) => Err(format!(
                    "{id}: repeated decode differs: {:?} vs {:?}",
                    output, again
                )),
                Err(err) => Err(format!("{id}: repeated decode failed: {err}")),
            }
        }
    }
}

fn compare_output(id: &str, case: &DecodeCase, output: &DecodeOutput) -> Result<(), String> {
    if output.frame_count != case.frames.len() {
        return Err(format!(
            "{id}: decoded {} frames, fixture has {}",
            output.frame_count,
            case.frames.len()
        ));
    }

    let got: Vec<(&str, usize)> = output
        .words
        .iter()
        .map(|w| (w.word.as_str(), w.end_frame))
        .collect();
    let want: Vec<(&str, usize)> = case
        .expected_words
        .iter()
        .map(|w| (w.word.as_str(), w.end_frame))
        .collect();
    if got != want {
        return Err(format!("{id}: words {got:?}, expected {want:?}"));
    }

    for (word, expected) in output.words.iter().zip(&case.expected_words) {
        if let Some(delta) = expected.score_delta {
            if (word.score_delta - delta).abs() > SCORE_TOLERANCE {
                return Err(format!(
                    "{id}: '{}' score delta {} differs from {delta}",
                    word.word, word.score_delta
                ));
            }
        }
    }
    if output.words.windows(2).any(|w| w[0].end_frame > w[1].end_frame) {
        return Err(format!("{id}: end frames are not monotonic"));
    }

    if let Some(total) = case.expected_total_score {
        if (output.total_score - total).abs() > SCORE_TOLERANCE {
            return Err(format!(
                "{id}: total score {} differs from {total}",
                output.total_score
            ));
        }
    }
    Ok(())
}

fn error_kind(err: &DecoderError) -> &'static str {
    match err {
        DecoderError::Io { .. } => "io",
        DecoderError::Json { .. } => "json",
        DecoderError::Parse { .. } => "parse",
        DecoderError::GraphStructure { .. } => "graph_structure",
        DecoderError::InvalidModel { .. } => "invalid_model",
        DecoderError::DimensionMismatch { .. } => "dimension_mismatch",
        DecoderError::UnboundPhone { .. } => "unbound_phone",
        DecoderError::EmptyHistory => "empty_history",
        DecoderError::Cancelled { .. } => "cancelled",
        DecoderError::InvalidInput { .. } => "invalid_input",
    }
}
