use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Parser;
use log::info;

use sphinx_docfx_yaml::docfx::{EXTENSION_NAME, OUTPUT_SETTING};
use sphinx_docfx_yaml::{manifest, BuildConfig, ExtensionLoader, SphinxApp};

#[derive(Parser)]
#[command(name = "sphinx-docfx-yaml")]
#[command(about = "Generate DocFX YAML API reference files from a symbol manifest")]
#[command(version)]
struct Cli {
    /// Symbol manifest to replay (.json, .yaml or .yml)
    #[arg(short, long)]
    manifest: PathBuf,

    /// Builder output directory
    #[arg(short, long, default_value = "_build")]
    outdir: PathBuf,

    /// Directory inside the documented repository; git is asked about it
    #[arg(long, default_value = ".")]
    repo_dir: PathBuf,

    /// Configuration file (TOML, YAML or JSON)
    #[arg(short, long)]
    conf: Option<PathBuf>,

    /// Output directory for the YAML files, relative to the outdir
    #[arg(long)]
    output: Option<String>,

    /// Increase verbosity (-v, -vv)
    #[arg(short, long, action = clap::ArgAction::Count)]
    verbose: u8,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let default_filter = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(default_filter))
        .init();

    let mut config = match &cli.conf {
        Some(path) => BuildConfig::from_file(path)
            .with_context(|| format!("Failed to load configuration from {}", path.display()))?,
        None => BuildConfig::from_env().context("Failed to read configuration from environment")?,
    };

    let loader = ExtensionLoader::new();
    if !config.extensions.iter().any(|name| loader.is_known(name)) {
        config.extensions.push(EXTENSION_NAME.to_string());
    }
    if let Some(output) = cli.output {
        config.set_value(OUTPUT_SETTING, serde_json::Value::from(output));
    }

    let mut app = SphinxApp::new(config, cli.repo_dir, cli.outdir);
    app.set_verbosity(cli.verbose);
    loader.load_configured(&mut app)?;

    app.emit_builder_inited()?;

    let manifest = manifest::load(&cli.manifest)?;
    info!(
        "Loaded {} symbols from {}",
        manifest.symbols.len(),
        cli.manifest.display()
    );

    let replayed = manifest::replay(&mut app, &manifest);
    let stats = app.emit_build_finished(replayed.as_ref().err())?;
    replayed?;

    println!("Wrote {} files:", stats.files_written.len());
    for path in &stats.files_written {
        println!("  {}", path.display());
    }
    if !stats.warnings.is_empty() {
        println!("{} warnings:", stats.warnings.len());
        for warning in &stats.warnings {
            println!("  {}", warning);
        }
    }

    Ok(())
}
