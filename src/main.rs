use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::Colorize;
use nxstyle::config::registry_from_path_with;
use nxstyle::pattern::{Grammar, OpenGrammar};
use nxstyle::pool::with_parser;
use nxstyle::style::{check_file, CheckOptions, Diagnostic, Severity, SourceKind, StyleError};
use nxstyle::tree::c_language;
use nxstyle::{emit, match_tree, telemetry, Registry, SyntaxTree};
use std::fs;
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "nxstyle")]
#[command(about = "NuttX C coding style checker", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check C files against the NuttX coding style
    Check {
        /// Not a NuttX tree: skip NuttX-only rules such as pointer qualifiers
        #[arg(short = 'n', long)]
        non_nuttx: bool,

        /// Pattern file to use instead of the builtin rules
        #[arg(short, long)]
        patterns: Option<PathBuf>,

        /// Files or directories to check
        #[arg(required = true)]
        paths: Vec<PathBuf>,
    },

    /// Print the tagged spans of a C file
    Tags {
        /// Pattern file to use instead of the builtin rules
        #[arg(short, long)]
        patterns: Option<PathBuf>,

        /// Emit JSON instead of text
        #[arg(long)]
        json: bool,

        /// Read the syntax tree from a JSON file instead of parsing FILE
        #[arg(long)]
        tree: Option<PathBuf>,

        /// Source file the spans refer to
        file: PathBuf,
    },
}

fn main() -> Result<()> {
    telemetry::initialise()?;
    let cli = Cli::parse();

    match cli.command {
        Commands::Check {
            non_nuttx,
            patterns,
            paths,
        } => cmd_check(non_nuttx, patterns, &paths),

        Commands::Tags {
            patterns,
            json,
            tree,
            file,
        } => cmd_tags(patterns, json, tree, &file),
    }
}

/// Helper: Run `f` with the builtin registry or one loaded from `patterns`.
///
/// A pattern file is validated against `grammar`.
fn with_registry<R>(
    patterns: Option<PathBuf>,
    grammar: impl Grammar + 'static,
    f: impl FnOnce(&Registry) -> R,
) -> Result<R> {
    match patterns {
        Some(path) => {
            let registry = registry_from_path_with(&path, grammar)?;
            for warning in registry.warnings() {
                eprintln!("{} {}", "warning:".yellow().bold(), warning);
            }
            Ok(f(&registry))
        }
        None => Ok(f(Registry::builtin())),
    }
}

/// Helper: Expand directories into the C sources and headers below them.
fn collect_files(path: &Path) -> Result<Vec<PathBuf>> {
    if !path.is_dir() {
        return Ok(vec![path.to_path_buf()]);
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(path).sort_by_file_name() {
        let entry = entry?;
        if entry.file_type().is_file() && SourceKind::from_path(entry.path()).is_some() {
            files.push(entry.path().to_path_buf());
        }
    }
    Ok(files)
}

fn print_diagnostic(diagnostic: &Diagnostic) {
    let location = format!(
        "{}:{}:{}:",
        diagnostic.path.display(),
        diagnostic.point.row + 1,
        diagnostic.point.column
    );
    let level = match diagnostic.severity {
        Severity::Error => format!("[{}]", diagnostic.severity).red().bold(),
        Severity::Warning => format!("[{}]", diagnostic.severity).yellow().bold(),
    };
    println!("{} {} {}", location.bold(), level, diagnostic.message);
}

fn cmd_check(non_nuttx: bool, patterns: Option<PathBuf>, paths: &[PathBuf]) -> Result<()> {
    let options = CheckOptions {
        nuttx_codebase: !non_nuttx,
    };

    let (checked, errors, warnings, invalid) = with_registry(patterns, c_language(), |registry| {
        let mut checked = 0;
        let mut errors = 0;
        let mut warnings = 0;
        let mut invalid = 0;

        for path in paths {
            if !path.exists() {
                eprintln!("{} {}: No such file or directory", "✗".red(), path.display());
                invalid += 1;
                continue;
            }

            let files = match collect_files(path) {
                Ok(files) => files,
                Err(e) => {
                    eprintln!("{} {}: {}", "✗".red(), path.display(), e);
                    invalid += 1;
                    continue;
                }
            };

            for file in files {
                match check_file(&file, registry, &options) {
                    Ok(diagnostics) => {
                        checked += 1;
                        for diagnostic in &diagnostics {
                            print_diagnostic(diagnostic);
                            match diagnostic.severity {
                                Severity::Error => errors += 1,
                                Severity::Warning => warnings += 1,
                            }
                        }
                    }
                    Err(StyleError::Unsupported(file)) => {
                        eprintln!(
                            "{} {}: File extension not supported",
                            "✗".red(),
                            file.display()
                        );
                        invalid += 1;
                    }
                    Err(e) => {
                        eprintln!("{} {}: {}", "✗".red(), file.display(), e);
                        invalid += 1;
                    }
                }
            }
        }

        (checked, errors, warnings, invalid)
    })?;

    println!();
    println!("{}", "Summary:".bold());
    println!("  {} file(s) checked", checked);
    println!("  {} error(s)", format!("{}", errors).red());
    println!("  {} warning(s)", format!("{}", warnings).yellow());
    if invalid > 0 {
        println!("  {} invalid path(s)", format!("{}", invalid).red());
    }

    if errors > 0 || invalid > 0 {
        std::process::exit(1);
    }

    Ok(())
}

fn cmd_tags(patterns: Option<PathBuf>, json: bool, tree: Option<PathBuf>, file: &Path) -> Result<()> {
    let source =
        fs::read_to_string(file).with_context(|| format!("failed to read {}", file.display()))?;

    // Trees read from JSON come from an unknown parser, so any kind or field
    // name is accepted in the pattern file.
    let (tree, grammar): (SyntaxTree, Box<dyn Grammar>) = match tree {
        Some(tree_path) => {
            let text = fs::read_to_string(&tree_path)
                .with_context(|| format!("failed to read {}", tree_path.display()))?;
            (SyntaxTree::from_json(source, &text)?, Box::new(OpenGrammar))
        }
        None => (
            with_parser(|parser| parser.parse(&source))??,
            Box::new(c_language()),
        ),
    };

    let output = with_registry(patterns, grammar, |registry| {
        let tagged = emit(match_tree(&tree, registry));
        if json {
            serde_json::to_string_pretty(&tagged).map_err(anyhow::Error::from)
        } else {
            Ok(tagged
                .iter()
                .map(|t| format!("{}\t{}\t{:?}", t.tag, t.span, truncate(&tree, t)))
                .collect::<Vec<_>>()
                .join("\n"))
        }
    })??;

    println!("{output}");
    Ok(())
}

/// First line of a tagged span, for the text listing.
fn truncate<'t>(tree: &'t SyntaxTree, tagged: &nxstyle::Tagged<'_>) -> &'t str {
    let text = tree.source().get(tagged.span.byte_range()).unwrap_or_default();
    text.lines().next().unwrap_or_default()
}
