use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;
use inspection_pdf::{DirPhotoStore, Error, RenderConfig, Report};

#[derive(Parser, Debug)]
#[command(name = "inspection-pdf", version, about = "Render a property inspection report to PDF")]
struct Cli {
    /// Report as JSON
    input: PathBuf,
    /// Output PDF path (defaults to the input path with a .pdf extension)
    output: Option<PathBuf>,
    #[arg(long, help = "Directory holding photos as <bucket>/<path>", default_value = ".")]
    photos: PathBuf,
    #[arg(long, help = "Layout overrides as JSON; unset fields keep their defaults")]
    config: Option<PathBuf>,
    #[arg(long, help = "TrueType font for body text")]
    font: Option<PathBuf>,
    #[arg(long, help = "TrueType font for headings (defaults to --font)")]
    bold_font: Option<PathBuf>,
}

fn load_config(cli: &Cli) -> Result<RenderConfig, Error> {
    let mut config = match &cli.config {
        Some(path) => {
            let mut config: RenderConfig = serde_json::from_slice(&std::fs::read(path)?)?;
            let env = RenderConfig::from_env();
            config.font_path = config.font_path.or(env.font_path);
            config.bold_font_path = config.bold_font_path.or(env.bold_font_path);
            config
        }
        None => RenderConfig::from_env(),
    };
    if let Some(font) = &cli.font {
        config.font_path = Some(font.clone());
    }
    if let Some(font) = &cli.bold_font {
        config.bold_font_path = Some(font.clone());
    }
    Ok(config)
}

async fn run(cli: Cli) -> Result<(), Error> {
    let config = load_config(&cli)?;
    let report: Report = serde_json::from_slice(&std::fs::read(&cli.input)?)?;
    let output = cli
        .output
        .clone()
        .unwrap_or_else(|| cli.input.with_extension("pdf"));
    let store = DirPhotoStore::new(&cli.photos);

    let rendered = inspection_pdf::render_report_to_file(&report, &store, &config, &output).await?;
    println!(
        "Wrote {} ({} pages, {} sections)",
        output.display(),
        rendered.page_count,
        rendered.toc.len()
    );
    for entry in &rendered.toc {
        log::debug!("  {:<40} {:>4} items  p.{}", entry.title, entry.item_count, entry.page);
    }
    Ok(())
}

#[tokio::main]
async fn main() -> ExitCode {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("warn")).init();
    let cli = Cli::parse();
    match run(cli).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e}");
            ExitCode::FAILURE
        }
    }
}
