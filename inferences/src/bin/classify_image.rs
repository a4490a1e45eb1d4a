//! Runs the model on one local image and prints what it sees.

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use scene_inference::{Classifier, ModelConfig, OnnxClassifier, Prediction, Preprocessor};

#[derive(Parser, Debug)]
#[command(name = "classify_image")]
#[command(about = "Smoke-test the scene classifier on a single image")]
struct Cli {
    /// Image to classify (JPEG or PNG)
    image: PathBuf,

    /// Model artifact (overrides MODEL_PATH)
    #[arg(long)]
    model: Option<PathBuf>,
}

fn main() -> Result<()> {
    scene_inference::init_logging();
    let cli = Cli::parse();

    let mut config = ModelConfig::from_env()?;
    if let Some(model) = cli.model {
        config = config.with_model_path(model);
    }

    let classifier = OnnxClassifier::load_with_size(&config.model_path, config.image_size)?;

    let bytes = std::fs::read(&cli.image)
        .with_context(|| format!("Image file not found: {}", cli.image.display()))?;
    let batch = Preprocessor::from(&config).preprocess(&bytes)?;
    println!("{:?}", batch.shape());

    let scores = classifier.classify(&batch)?;
    println!("{:?}", scores);

    let prediction = Prediction::from_scores(scores)?;
    println!("The predicted class is: {}", prediction.label);

    Ok(())
}
