//! promptcat CLI - Pack a directory of source files into one LLM prompt.

use std::io::{BufWriter, Write};
use std::path::PathBuf;

use clap::{CommandFactory, Parser, ValueEnum};
use clap_complete::{generate, Shell};
use promptcat::config::{
    split_patterns, OutputMode, ScanConfig, DEFAULT_MAX_DEPTH, DEFAULT_MAX_SIZE,
};
use promptcat::errors::{exit_code, PromptcatError};
use promptcat::logging::{init_subscriber, Verbosity};
use promptcat::output::{render_json, Renderer};
use promptcat::record::sort_by_path;
use promptcat::scanner::Scanner;
use promptcat::select::{materialize, PatternPicker, Picker, Selection};
use promptcat::tokens::{TokenizerKind, TokenizerSpec, DEFAULT_TOKEN_LIMIT};
use serde::Serialize;
use tracing::debug;

/// Disables token counting when passed to `--tokenizer`.
const NO_TOKENIZER: &str = "none";

#[derive(Parser)]
#[command(name = "promptcat")]
#[command(about = "Pack a directory of source files into a single LLM prompt")]
#[command(version)]
struct Cli {
    /// Directory or file to pack
    #[arg(default_value = ".")]
    path: PathBuf,

    /// Only include paths matching these patterns (comma-separated)
    #[arg(long)]
    include: Option<String>,

    /// Replace the default exclude list (comma-separated; "" excludes nothing)
    #[arg(long)]
    exclude: Option<String>,

    /// Skip files larger than this many bytes
    #[arg(long, default_value_t = DEFAULT_MAX_SIZE)]
    max_size: u64,

    /// Maximum directory depth
    #[arg(long, default_value_t = DEFAULT_MAX_DEPTH)]
    max_depth: usize,

    /// Sections to print
    #[arg(long, value_enum, default_value = "both")]
    output: OutputArg,

    /// Worker threads for reading files (0 = one per CPU)
    #[arg(long, default_value_t = 0)]
    threads: usize,

    /// Include hidden files
    #[arg(long)]
    hidden: bool,

    /// Honour .gitignore files
    #[arg(long)]
    gitignore: bool,

    /// Follow symbolic links
    #[arg(long)]
    follow_links: bool,

    /// Tokenizer: gpt-3.5-turbo, gpt-4, gpt-4o, claude, huggingface, estimate, or none
    #[arg(long, default_value = "gpt-3.5-turbo")]
    tokenizer: String,

    /// Path to a tokenizer.json for the huggingface tokenizer
    #[arg(long)]
    tokenizer_model: Option<PathBuf>,

    /// Token budget the usage figures are computed against
    #[arg(long, default_value_t = DEFAULT_TOKEN_LIMIT)]
    token_limit: usize,

    /// Keep only files matching these patterns after scanning (comma-separated, repeatable)
    #[arg(long)]
    select: Vec<String>,

    /// Output as JSON
    #[arg(long)]
    json: bool,

    /// Debug logging on stderr
    #[arg(short, long)]
    verbose: bool,

    /// Only log errors
    #[arg(short, long)]
    quiet: bool,

    /// Print shell completions and exit
    #[arg(long, value_enum, value_name = "SHELL")]
    completions: Option<Shell>,
}

#[derive(Clone, Copy, ValueEnum)]
enum OutputArg {
    Tree,
    Files,
    Both,
}

impl From<OutputArg> for OutputMode {
    fn from(arg: OutputArg) -> Self {
        match arg {
            OutputArg::Tree => OutputMode::Tree,
            OutputArg::Files => OutputMode::Files,
            OutputArg::Both => OutputMode::Both,
        }
    }
}

fn main() {
    let cli = Cli::parse();

    if let Some(shell) = cli.completions {
        generate(shell, &mut Cli::command(), "promptcat", &mut std::io::stdout());
        return;
    }

    init_subscriber(Verbosity::from_flags(cli.verbose, cli.quiet));
    let json_output = cli.json;

    if let Err(e) = run(cli) {
        if json_output {
            #[derive(Serialize)]
            struct ErrorOutput {
                error: String,
            }

            let payload = ErrorOutput {
                error: e.to_string(),
            };

            let json = serde_json::to_string(&payload)
                .unwrap_or_else(|_| "{\"error\":\"serialization failed\"}".to_string());
            eprintln!("{json}");
        } else {
            eprintln!("error: {}", e);
        }
        std::process::exit(exit_code(&e));
    }
}

fn run(cli: Cli) -> Result<(), PromptcatError> {
    let mode = OutputMode::from(cli.output);
    let needs_content = cli.json || mode.includes_files();

    let tokenizer = if cli.tokenizer == NO_TOKENIZER {
        None
    } else {
        let kind: TokenizerKind = cli.tokenizer.parse()?;
        let mut spec = TokenizerSpec::new(kind).limit(cli.token_limit);
        if let Some(model) = cli.tokenizer_model {
            spec = spec.model_path(model);
        }
        Some(spec)
    };

    let select: Vec<String> = cli
        .select
        .iter()
        .map(String::as_str)
        .flat_map(split_patterns)
        .collect();

    let config = ScanConfig {
        root: cli.path,
        include: cli.include.as_deref().map(split_patterns).unwrap_or_default(),
        exclude: cli.exclude.as_deref().map(split_patterns),
        max_size: cli.max_size,
        max_depth: cli.max_depth,
        include_hidden: cli.hidden,
        threads: cli.threads,
        tokenizer,
        respect_gitignore: cli.gitignore,
        follow_links: cli.follow_links,
        defer_content: !select.is_empty() || !needs_content,
    };

    let scanner = Scanner::new(config)?;
    let report = scanner.scan()?;
    let mut records = report.records;
    sort_by_path(&mut records);

    if !select.is_empty() {
        let mut picker = PatternPicker::new(select);
        records = match picker.pick(&records) {
            Selection::Selected(chosen) => chosen,
            Selection::Empty => {
                eprintln!("No files selected.");
                return Ok(());
            }
            Selection::Cancelled => {
                eprintln!("Operation cancelled.");
                return Ok(());
            }
        };
    }

    if needs_content {
        let (loaded, failures) = materialize(records, &scanner);
        debug!(failures = failures.len(), "loaded selected files");
        records = loaded;
    }

    let text = if cli.json {
        let mut json = render_json(&records)?;
        json.push('\n');
        json
    } else {
        Renderer::default().render(&records, mode)?
    };

    let stdout = std::io::stdout();
    let mut out = BufWriter::new(stdout.lock());
    out.write_all(text.as_bytes())?;
    out.flush()?;

    Ok(())
}
