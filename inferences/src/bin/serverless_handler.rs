//! Serverless runtime loop.
//!
//! Loads the model once (cold start), then answers one event per input line
//! with one envelope per output line, reusing the model for every warm
//! invocation of this process. Events come from stdin, or from the files
//! named on the command line.

use std::fs::File;
use std::io::{self, BufRead, BufReader, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::{error, info, warn};
use scene_inference::{pipeline, serverless, Envelope, InferenceError, Pipeline};

#[derive(Parser, Debug)]
#[command(name = "serverless_handler")]
#[command(about = "Answer base64 image events with statusCode/body envelopes")]
struct Cli {
    /// Model artifact (overrides MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,

    /// Files holding one JSON event per line; stdin when empty
    events: Vec<PathBuf>,
}

fn main() -> Result<()> {
    scene_inference::init_logging();
    let cli = Cli::parse();

    let mut config = scene_inference::ModelConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model_path(model);
    }

    let loaded = Pipeline::load(&config)
        .with_context(|| format!("cannot serve without a model ({})", config.model_path.display()))?;
    if !pipeline::install(loaded) {
        warn!(
            "A model was already loaded; {} is ignored",
            config.model_path.display()
        );
    }
    let pipeline = pipeline::global()?;
    info!("Model ready, waiting for events");

    let stdout = io::stdout();
    let mut out = stdout.lock();

    if cli.events.is_empty() {
        serve(pipeline, io::stdin().lock(), &mut out)?;
    } else {
        for path in &cli.events {
            let file = File::open(path).with_context(|| format!("opening {}", path.display()))?;
            serve(pipeline, BufReader::new(file), &mut out)?;
        }
    }

    Ok(())
}

/// Answers every line of `input`. A line that is not UTF-8 JSON gets a 500
/// envelope and the loop moves on to the next one.
fn serve<R: BufRead, W: Write>(pipeline: &Pipeline, input: R, out: &mut W) -> Result<()> {
    for line in input.split(b'\n') {
        let line = line?;
        let text = String::from_utf8_lossy(&line);
        if text.trim().is_empty() {
            continue;
        }

        let envelope = match parse_event(&line) {
            Ok(event) => serverless::handle_event(pipeline, &event),
            Err(e) => {
                error!("Unparseable event: {}", e);
                Envelope::error(&e)
            }
        };

        serde_json::to_writer(&mut *out, &envelope)?;
        out.write_all(b"\n")?;
        out.flush()?;
    }
    Ok(())
}

fn parse_event(line: &[u8]) -> scene_inference::Result<serde_json::Value> {
    let text = std::str::from_utf8(line)
        .map_err(|e| InferenceError::InvalidRequest(format!("event is not UTF-8: {}", e)))?;
    serde_json::from_str(text.trim_end_matches('\r'))
        .map_err(|e| InferenceError::InvalidRequest(e.to_string()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use base64::engine::general_purpose::STANDARD;
    use base64::Engine;
    use image::{DynamicImage, ImageFormat, RgbImage};
    use scene_inference::{Batch, Classifier, Preprocessor};
    use serde_json::{json, Value};
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[derive(Default)]
    struct CountingClassifier {
        calls: AtomicUsize,
    }

    impl Classifier for CountingClassifier {
        fn classify(&self, _batch: &Batch) -> scene_inference::Result<Vec<f32>> {
            self.calls.fetch_add(1, Ordering::SeqCst);
            Ok(vec![0.1, 0.1, 0.1, 0.1, 0.1, 0.5])
        }
    }

    fn png_event() -> String {
        let mut bytes = Vec::new();
        DynamicImage::ImageRgb8(RgbImage::new(12, 12))
            .write_to(&mut io::Cursor::new(&mut bytes), ImageFormat::Png)
            .unwrap();
        json!({ "image": STANDARD.encode(bytes) }).to_string()
    }

    fn run(classifier: Arc<CountingClassifier>, input: &[u8]) -> Vec<Envelope> {
        let pipeline = Pipeline::new(classifier, Preprocessor::default());
        let mut out = Vec::new();
        serve(&pipeline, input, &mut out).unwrap();
        String::from_utf8(out)
            .unwrap()
            .lines()
            .map(|line| serde_json::from_str(line).unwrap())
            .collect()
    }

    #[test]
    fn bad_lines_get_500_and_later_events_still_run() {
        let classifier = Arc::new(CountingClassifier::default());
        let input = format!("\u{1}\n{{not json\n{{}}\n{}\n", png_event());
        let mut input = input.into_bytes();
        input.splice(0..1, b"\xff\xfe garbage".iter().copied());

        let envelopes = run(classifier.clone(), &input);
        let codes: Vec<u16> = envelopes.iter().map(|e| e.status_code).collect();
        assert_eq!(codes, vec![500, 500, 400, 200]);

        let body: Value = serde_json::from_str(&envelopes[0].body).unwrap();
        assert!(body["error"].as_str().unwrap().contains("UTF-8"));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn model_is_reused_across_events() {
        let classifier = Arc::new(CountingClassifier::default());
        let event = png_event();
        let input = format!("{event}\r\n\n{event}\n{event}");

        let envelopes = run(classifier.clone(), input.as_bytes());
        assert_eq!(envelopes.len(), 3);
        assert!(envelopes.iter().all(|e| e.status_code == 200));
        assert!(envelopes.windows(2).all(|w| w[0] == w[1]));
        assert_eq!(classifier.calls.load(Ordering::SeqCst), 3);
    }
}
