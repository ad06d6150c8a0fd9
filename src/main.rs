//! # Docwright
//!
//! Command-line shell around the docwright editing core.
//!
//! ```bash
//! # Print a source with highlighting
//! docwright highlight source/index.rst
//!
//! # Open a documentation project and list its pages
//! docwright open path/to/docs
//! ```

mod render;

use anyhow::Context;
use clap::{Parser, Subcommand};
use std::path::{Path, PathBuf};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use docwright_core::{Config, DocsProject, EditorSession};
use docwright_syntax::Theme;

/// Docwright - an editing shell for reStructuredText documentation
#[derive(Parser, Debug)]
#[command(name = "docwright")]
#[command(author, version, about, long_about = None)]
struct Args {
    #[command(subcommand)]
    command: Command,

    /// Config file to use instead of the default one
    #[arg(long, global = true, value_name = "FILE")]
    config: Option<PathBuf>,

    /// Verbose logging
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    verbose: u8,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Print a file with syntax highlighting
    Highlight {
        #[arg(value_name = "FILE")]
        file: PathBuf,

        /// Grammar name or alias, instead of picking by extension
        #[arg(short, long)]
        grammar: Option<String>,

        /// Built-in theme
        #[arg(short, long, conflicts_with = "theme_file")]
        theme: Option<String>,

        /// Theme definition file
        #[arg(long, value_name = "PATH")]
        theme_file: Option<PathBuf>,

        /// Extra grammar definition files
        #[arg(long = "grammar-file", value_name = "PATH")]
        grammar_files: Vec<PathBuf>,
    },

    /// List the available grammars
    Grammars,

    /// List the built-in themes
    Themes,

    /// Open a documentation project and list its sources
    Open {
        #[arg(value_name = "DIR")]
        dir: PathBuf,
    },

    /// Set the editor font
    Font { family: String, size: u32 },
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let log_level = match args.verbose {
        0 => tracing::Level::WARN,
        1 => tracing::Level::INFO,
        2 => tracing::Level::DEBUG,
        _ => tracing::Level::TRACE,
    };

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::fmt::layer()
                .with_writer(std::io::stderr)
                .with_target(false)
                .with_level(true),
        )
        .with(tracing_subscriber::filter::LevelFilter::from_level(
            log_level,
        ))
        .init();

    tracing::info!("Starting docwright v{}", env!("CARGO_PKG_VERSION"));

    let (mut config, config_path) = match &args.config {
        Some(path) => (
            Config::load_from(path).with_context(|| format!("reading {}", path.display()))?,
            Some(path.clone()),
        ),
        None => (Config::load(), None),
    };

    match args.command {
        Command::Highlight {
            file,
            grammar,
            theme,
            theme_file,
            grammar_files,
        } => {
            if let Some(theme) = theme {
                config.syntax.theme = theme;
                config.syntax.theme_path = None;
            }
            if theme_file.is_some() {
                config.syntax.theme_path = theme_file;
            }
            config.syntax.grammar_paths.extend(grammar_files);
            print!("{}", highlight(&config, &file, grammar.as_deref())?);
        }
        Command::Grammars => {
            let registry = config.grammar_registry()?;
            for grammar in registry.grammars() {
                let aliases = grammar.aliases().join(", ");
                let extensions = grammar.extensions().join(", ");
                println!("{:<12} aliases: [{aliases}] extensions: [{extensions}]", grammar.name());
            }
        }
        Command::Themes => {
            for name in Theme::builtin_names() {
                let marker = if *name == config.syntax.theme { "*" } else { " " };
                println!("{marker} {name}");
            }
        }
        Command::Open { dir } => {
            let project = DocsProject::open(&dir)?;
            print!("{}", project_listing(&project)?);
            config.remember_folder(project.root());
            save_config(&config, config_path.as_deref())?;
        }
        Command::Font { family, size } => {
            config.set_font(family, size);
            save_config(&config, config_path.as_deref())?;
        }
    }

    Ok(())
}

/// Opens a file in a fresh session and renders it for the terminal.
fn highlight(config: &Config, file: &Path, grammar: Option<&str>) -> anyhow::Result<String> {
    let mut session = EditorSession::from_config(config)?;
    session
        .open_file(file)
        .with_context(|| format!("opening {}", file.display()))?;
    if let Some(grammar) = grammar {
        session.set_grammar(grammar)?;
    }

    let stats = session.stats();
    tracing::debug!(
        passes = stats.passes,
        stale = stats.stale_passes,
        "highlighted {}",
        file.display()
    );
    Ok(render::to_ansi(session.document()))
}

/// Lists the entry document and every source with its preview page.
fn project_listing(project: &DocsProject) -> anyhow::Result<String> {
    let root = project.root();
    let mut out = String::new();

    let entry = project.entry_file(None);
    if entry.is_file() {
        out.push_str(&format!(
            "entry: {} -> {}\n",
            display_relative(&entry, root),
            display_relative(&project.html_preview_path(&entry), root)
        ));
    } else {
        tracing::warn!("no {} in {}", docwright_core::project::DEFAULT_ENTRY, root.display());
    }

    for source in project.source_files()? {
        out.push_str(&format!(
            "{} -> {}\n",
            display_relative(&source, root),
            display_relative(&project.html_preview_path(&source), root)
        ));
    }
    Ok(out)
}

fn save_config(config: &Config, path: Option<&Path>) -> anyhow::Result<()> {
    match path {
        Some(path) => config.save_to(path)?,
        None => config.save()?,
    }
    Ok(())
}

fn display_relative(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}
