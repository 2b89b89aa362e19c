use std::fs;
use std::path::{Path, PathBuf};
use std::process;

use clap::{Parser, Subcommand};
use tracing_subscriber::EnvFilter;

use preview_pipeline::config::PreviewConfig;
use preview_pipeline::file::VirtualFile;
use preview_pipeline::synth::{PatchHint, Synthesizer};

#[derive(Parser)]
#[command(name = "preview", version)]
#[command(about = "Live preview pipeline for assistant-authored UI code")]
struct Cli {
    /// JSON config file (retries, delays, runtime URLs, sandbox)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the virtual files in a transcript, reply or directory
    Extract {
        /// Transcript (.json), reply (.md/.txt) or directory
        input: PathBuf,

        /// Write the files under this directory instead of listing them
        #[arg(short)]
        o: Option<PathBuf>,

        /// Print the file set as JSON
        #[arg(long)]
        json: bool,
    },

    /// Synthesize the preview document for an input
    Build {
        /// Transcript, reply, directory or single file
        input: PathBuf,

        /// Patch the entry against this runtime error first
        #[arg(long)]
        error: Option<String>,

        /// Write output to file instead of stdout
        #[arg(short)]
        o: Option<PathBuf>,
    },

    /// Report which synthesis strategy an input selects
    Check {
        input: PathBuf,
    },

    /// Print a component source rewritten to the canonical entry point
    Normalize {
        file: PathBuf,
    },

    /// Apply the auto-patch rules for an error message to a source file
    Patch {
        file: PathBuf,

        /// Runtime error message, e.g. "Foo is not defined"
        #[arg(long)]
        error: String,
    },

    /// Start the live preview dev server
    Dev {
        input: PathBuf,

        /// Server port
        #[arg(long, default_value_t = 3333)]
        port: u16,
    },
}

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let config = match PreviewConfig::load_or_default(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => fail(e),
    };

    match cli.command {
        Commands::Extract { input, o, json } => {
            let files = load(&input, &config);
            if let Some(dir) = o {
                for f in &files {
                    let path = dir.join(&f.name);
                    if let Some(parent) = path.parent() {
                        if let Err(e) = fs::create_dir_all(parent) {
                            fail(format!("cannot create '{}': {e}", parent.display()));
                        }
                    }
                    if let Err(e) = fs::write(&path, &f.content) {
                        fail(format!("cannot write '{}': {e}", path.display()));
                    }
                    eprintln!("  {} ({} bytes)", path.display(), f.content.len());
                }
                eprintln!("extracted {} files", files.len());
            } else if json {
                match serde_json::to_string_pretty(&files) {
                    Ok(text) => println!("{text}"),
                    Err(e) => fail(e),
                }
            } else {
                for f in &files {
                    println!("{}\t{}\t{} bytes", f.name, f.language, f.content.len());
                }
                if files.is_empty() {
                    eprintln!("{}: no code blocks", input.display());
                }
            }
        }

        Commands::Build { input, error, o } => {
            let files = load(&input, &config);
            let hint = error.map(PatchHint::retry).unwrap_or_default();
            let doc = Synthesizer::new(&config).build(&files, &hint);
            if doc.is_empty() {
                fail(format!("nothing renderable in '{}'", input.display()));
            }
            if !doc.patches.is_empty() {
                eprintln!("patched: {}", doc.patches.join(", "));
            }

            if let Some(out_path) = o {
                match fs::write(&out_path, &doc.html) {
                    Ok(()) => {
                        eprintln!(
                            "wrote {} document to {} ({} bytes)",
                            doc.strategy.as_str(),
                            out_path.display(),
                            doc.html.len()
                        );
                    }
                    Err(e) => fail(format!("cannot write '{}': {e}", out_path.display())),
                }
            } else {
                print!("{}", doc.html);
            }
        }

        Commands::Check { input } => {
            let files = load(&input, &config);
            let doc = Synthesizer::new(&config).build(&files, &PatchHint::none());
            if doc.is_empty() {
                eprintln!("{}: {} files, nothing renderable", input.display(), files.len());
                process::exit(1);
            }
            match &doc.entry {
                Some(entry) => eprintln!(
                    "{}: {} ({} files, entry {entry})",
                    input.display(),
                    doc.strategy.as_str(),
                    files.len()
                ),
                None => eprintln!(
                    "{}: {} ({} files)",
                    input.display(),
                    doc.strategy.as_str(),
                    files.len()
                ),
            }
        }

        Commands::Normalize { file } => {
            let source = read(&file);
            print!("{}", preview_pipeline::normalize::normalize(&source));
        }

        Commands::Patch { file, error } => {
            let source = read(&file);
            let outcome = preview_pipeline::patch::apply_rules(&source, &error);
            if outcome.changed() {
                eprintln!("applied: {}", outcome.applied.join(", "));
            } else {
                eprintln!("no rule applies");
            }
            print!("{}", outcome.source);
        }

        Commands::Dev { input, port } => {
            let rt = match tokio::runtime::Runtime::new() {
                Ok(rt) => rt,
                Err(e) => fail(format!("failed to create tokio runtime: {e}")),
            };
            rt.block_on(async {
                if let Err(e) = preview_pipeline::server::run_dev_server(input, port, config).await {
                    fail(e);
                }
            });
        }
    }
}

fn load(input: &Path, config: &PreviewConfig) -> Vec<VirtualFile> {
    match preview_pipeline::input::load_input(input, config) {
        Ok(files) => files,
        Err(e) => fail(e),
    }
}

fn read(path: &Path) -> String {
    match fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) => fail(format!("cannot read '{}': {e}", path.display())),
    }
}

fn fail(e: impl std::fmt::Display) -> ! {
    eprintln!("error: {e}");
    process::exit(1);
}
