use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use console::style;
use serde::Serialize;
use tracing_subscriber::EnvFilter;

use idcheck::{
    classify, load_settings, ArtifactKind, CaptureSource, CapturedArtifact, DocumentType,
    FileAcquisition, HttpTransport, OcrEngine, Settings, SubmissionOutcome, SubmissionPipeline,
    TesseractOcr, WorkflowController,
};

#[derive(Parser)]
#[command(name = "idcheck")]
#[command(about = "Capture, classify and submit identity documents for verification")]
#[command(version)]
struct Cli {
    /// Enable debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Classify document text
    Classify {
        /// Text to classify
        text: Option<String>,
        /// Read text from a file instead
        #[arg(short, long, conflicts_with = "text")]
        file: Option<PathBuf>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Run OCR on a document image and classify it
    Extract {
        /// Document image
        #[arg(long)]
        id: PathBuf,
        /// Tesseract language
        #[arg(long, env = "IDCHECK_OCR_LANGUAGE")]
        lang: Option<String>,
        /// Print JSON
        #[arg(long)]
        json: bool,
    },
    /// Capture both images, classify and submit for verification
    Verify {
        /// Document image
        #[arg(long)]
        id: PathBuf,
        /// Selfie image
        #[arg(long)]
        selfie: PathBuf,
        /// Treat the document as a camera capture rather than a gallery pick
        #[arg(long)]
        camera: bool,
        /// Verification endpoint
        #[arg(long, env = "IDCHECK_ENDPOINT")]
        endpoint: Option<String>,
    },
    /// Check that the OCR tool is installed
    Check,
}

#[derive(Serialize)]
struct ClassifyOutput<'a> {
    document_type: DocumentType,
    label: &'static str,
    raw_text: &'a str,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    let cli = Cli::parse();

    let default_level = if cli.verbose { "debug" } else { "info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    let settings = load_settings().await;

    match cli.command {
        Commands::Classify { text, file, json } => {
            let text = match (text, file) {
                (Some(text), _) => text,
                (None, Some(path)) => std::fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                (None, None) => bail!("provide TEXT or --file"),
            };
            print_classification(&text, json)?;
        }
        Commands::Extract { id, lang, json } => {
            let ocr = ocr_engine(&settings, lang.as_deref());
            let artifact =
                CapturedArtifact::new(ArtifactKind::Document, id, CaptureSource::Gallery);
            let text = ocr
                .recognize(&artifact)
                .await
                .with_context(|| format!("OCR failed for {}", artifact.path().display()))?;
            print_classification(&text, json)?;
        }
        Commands::Verify {
            id,
            selfie,
            camera,
            endpoint,
        } => {
            let endpoint = endpoint.unwrap_or_else(|| settings.endpoint.clone());
            verify(&settings, id, selfie, camera, endpoint).await?;
        }
        Commands::Check => {
            let ocr = ocr_engine(&settings, None);
            if ocr.is_available() {
                println!("{} {}", style("✓").green(), settings.ocr_binary);
            } else {
                println!(
                    "{} {} not found (install tesseract-ocr)",
                    style("✗").red(),
                    settings.ocr_binary
                );
                std::process::exit(1);
            }
        }
    }

    Ok(())
}

fn ocr_engine(settings: &Settings, lang: Option<&str>) -> TesseractOcr {
    TesseractOcr::new()
        .with_binary(&settings.ocr_binary)
        .with_language(lang.unwrap_or(&settings.ocr_language))
}

fn print_classification(text: &str, json: bool) -> Result<()> {
    let document_type = classify(text);
    if json {
        let output = ClassifyOutput {
            document_type,
            label: document_type.label(),
            raw_text: text,
        };
        println!("{}", serde_json::to_string_pretty(&output)?);
    } else {
        println!("{}", style(document_type.label()).bold());
    }
    Ok(())
}

async fn verify(
    settings: &Settings,
    id: PathBuf,
    selfie: PathBuf,
    camera: bool,
    endpoint: String,
) -> Result<()> {
    let acquisition = FileAcquisition::new()
        .with_document(id)
        .with_selfie(selfie);
    let transport = HttpTransport::with_user_agent(
        settings.request_timeout(),
        settings.user_agent.as_deref(),
    )?;
    let pipeline = SubmissionPipeline::new(Arc::new(transport), endpoint);
    tracing::debug!(endpoint = pipeline.endpoint(), "Submission pipeline ready");
    let mut controller = WorkflowController::new(
        Arc::new(acquisition),
        Arc::new(ocr_engine(settings, None)),
        pipeline,
    );

    let source = if camera {
        CaptureSource::Camera
    } else {
        CaptureSource::Gallery
    };
    controller.capture_id(source).await?;
    controller.capture_selfie().await?;
    controller.settle().await;

    let session = controller.snapshot().await;
    println!("Detected: {}", style(session.document_type().label()).bold());

    match controller.submit().await? {
        SubmissionOutcome::Success => {
            println!("{} Verification submitted successfully", style("✓").green());
            Ok(())
        }
        SubmissionOutcome::Failure(failure) => {
            println!("{} {}", style("✗").red(), failure);
            bail!("submission failed")
        }
    }
}
