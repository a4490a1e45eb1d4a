//! Posts one image to a running prediction API and prints the reply.

use std::path::PathBuf;
use std::process::ExitCode;
use std::time::Duration;

use clap::Parser;
use reqwest::blocking::{multipart, Client};

#[derive(Parser, Debug)]
#[command(name = "smoke_client")]
#[command(about = "Smoke-test a running scene-api server")]
struct Cli {
    /// Image to upload
    image: PathBuf,

    /// Prediction endpoint
    #[arg(long, env = "PREDICT_URL", default_value = "http://127.0.0.1:8080/predict")]
    url: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    if !cli.image.is_file() {
        eprintln!("Image file not found: {}", cli.image.display());
        return ExitCode::FAILURE;
    }

    match post_image(&cli) {
        Ok(body) => {
            println!("{}", body);
            ExitCode::SUCCESS
        }
        Err(e) => {
            eprintln!("Error during request: {}", e);
            ExitCode::FAILURE
        }
    }
}

fn post_image(cli: &Cli) -> anyhow::Result<String> {
    let client = Client::builder()
        .timeout(Duration::from_secs(cli.timeout))
        .user_agent(format!("scene-api-smoke/{}", env!("CARGO_PKG_VERSION")))
        .build()?;

    let form = multipart::Form::new().file("file", &cli.image)?;
    let response = client.post(&cli.url).multipart(form).send()?.error_for_status()?;

    Ok(response.text()?)
}
