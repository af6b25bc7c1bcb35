//! MoltLang CLI
//!
//! Translate between English instructions and MoltLang tokens, and check
//! the quality of a translation.

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;

use molt_config::MoltConfig;
use molt_core::{Category, TokenCatalog, TranslationResult};
use molt_translate::Translator;
use molt_validate::{TranslationQuality, Validator};

#[derive(Parser)]
#[command(name = "molt")]
#[command(about = "MoltLang - compact token language for machine-to-machine instructions")]
#[command(version)]
struct Cli {
    /// Print results as JSON
    #[arg(long, global = true)]
    json: bool,

    /// Config file (default: <config dir>/moltlang/config.yaml)
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    /// Debug logging
    #[arg(short, long, global = true)]
    verbose: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Translate English to tokens
    Translate {
        /// English instruction
        text: String,
    },

    /// Translate tokens back to English
    Decode {
        /// Token string, e.g. "[OP:fetch][SRC:api]"
        tokens: String,
    },

    /// Validate a token string against its original text
    Validate {
        /// Original English text
        original: String,

        /// Candidate token string
        tokens: String,
    },

    /// Translate to tokens and back, reporting similarity
    Roundtrip {
        /// English instruction
        text: String,
    },

    /// List the token vocabulary
    Tokens {
        /// Only this category (OP, SRC, PARAM, RET, CTL, TYPE, ERR, MOD)
        #[arg(short = 'C', long)]
        category: Option<Category>,
    },

    /// Run the built-in examples
    Demo,
}

/// Translator and validator sharing one catalog snapshot
struct Session {
    translator: Translator,
    validator: Validator,
    json: bool,
}

impl Session {
    fn open(config_path: Option<PathBuf>, json: bool) -> Result<Self> {
        let config = MoltConfig::load(config_path.as_deref())?;
        let catalog = config.catalog_registry()?.snapshot();
        tracing::debug!(subtypes = catalog.len(), "catalog loaded");
        Ok(Self {
            translator: Translator::new(config.clone(), Arc::clone(&catalog)),
            validator: Validator::new(config, catalog),
            json,
        })
    }

    fn catalog(&self) -> &Arc<TokenCatalog> {
        self.translator.catalog()
    }
}

fn main() -> Result<ExitCode> {
    let cli = Cli::parse();
    init_logging(cli.verbose)?;

    let session = Session::open(cli.config, cli.json)?;

    match cli.command {
        Commands::Translate { text } => cmd_translate(&session, &text),
        Commands::Decode { tokens } => cmd_decode(&session, &tokens),
        Commands::Validate { original, tokens } => cmd_validate(&session, &original, &tokens),
        Commands::Roundtrip { text } => cmd_roundtrip(&session, &text),
        Commands::Tokens { category } => cmd_tokens(&session, category),
        Commands::Demo => cmd_demo(&session),
    }
}

fn init_logging(verbose: bool) -> Result<()> {
    let directive = if verbose { "molt=debug" } else { "molt=info" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .with_writer(std::io::stderr)
        .init();
    Ok(())
}

fn cmd_translate(session: &Session, text: &str) -> Result<ExitCode> {
    let result = session.translator.translate_to_tokens(text)?;
    print_result(session, &result)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_decode(session: &Session, tokens: &str) -> Result<ExitCode> {
    let result = session.translator.translate_from_tokens(tokens)?;
    print_result(session, &result)?;
    Ok(ExitCode::SUCCESS)
}

fn cmd_validate(session: &Session, original: &str, tokens: &str) -> Result<ExitCode> {
    let quality = session.validator.validate(original, tokens);
    print_quality(session, &quality)?;
    Ok(exit_for(&quality))
}

fn cmd_roundtrip(session: &Session, text: &str) -> Result<ExitCode> {
    let quality = session.validator.validate_roundtrip(text, &session.translator)?;
    if let (false, Some(roundtrip)) = (session.json, &quality.metrics.roundtrip) {
        println!("  original:      {}", text);
        println!("  tokens:        {}", roundtrip.tokens);
        println!("  reconstructed: {}", roundtrip.reconstructed);
        println!("  similarity:    {:.2}", roundtrip.similarity);
    }
    print_quality(session, &quality)?;
    Ok(exit_for(&quality))
}

fn cmd_tokens(session: &Session, category: Option<Category>) -> Result<ExitCode> {
    let entries = session.catalog().list(category);
    if session.json {
        let listing: Vec<_> = entries
            .iter()
            .map(|(category, subtype)| {
                serde_json::json!({ "category": category, "subtype": subtype })
            })
            .collect();
        println!("{}", serde_json::to_string_pretty(&listing)?);
        return Ok(ExitCode::SUCCESS);
    }

    for category in Category::ALL {
        let subtypes: Vec<&str> = entries
            .iter()
            .filter(|(c, _)| *c == category)
            .map(|(_, s)| s.as_str())
            .collect();
        if !subtypes.is_empty() {
            println!("  {:<6} {:<16} {}", category.prefix(), category.name(), subtypes.join(" "));
        }
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_demo(session: &Session) -> Result<ExitCode> {
    const EXAMPLES: [&str; 5] = [
        "Fetch user data from the API and return JSON",
        "Search database for user with ID 12345, return profile as dictionary",
        "Try to fetch from API, retry on failure, otherwise log error",
        "Parse JSON data from file, validate structure, transform to CSV",
        "Safely process 100 records from the queue in parallel",
    ];

    println!("\n  MOLTLANG DEMO");
    println!("  =============\n");

    for (n, text) in EXAMPLES.iter().enumerate() {
        let forward = session.translator.translate_to_tokens(text)?;
        let back = session.translator.translate_from_tokens(&forward.text)?;
        let quality = session.validator.validate(text, &forward.text);

        println!("  {}. {}", n + 1, text);
        println!("     → {}", forward.text);
        println!("     ← {}", back.text);
        println!(
            "     {} tokens / {} words, efficiency {:.0}%, confidence {:.2}, score {:.2}\n",
            forward.token_count,
            forward.original_token_count,
            forward.token_efficiency * 100.0,
            forward.confidence,
            quality.score
        );
    }

    let check = session.validator.check_syntax("[op:fetch][src:api]");
    println!("  Syntax check of [op:fetch][src:api]: valid={}", check.is_valid);
    for issue in &check.issues {
        println!("     {}", issue);
    }
    let check = session.validator.check_syntax("[OP:fetch");
    println!("  Syntax check of [OP:fetch: valid={}", check.is_valid);
    for issue in &check.issues {
        println!("     {}", issue);
    }

    Ok(ExitCode::SUCCESS)
}

fn print_result(session: &Session, result: &TranslationResult) -> Result<()> {
    if session.json {
        println!("{}", serde_json::to_string_pretty(result)?);
        return Ok(());
    }
    println!("{}", result.text);
    println!(
        "  tokens: {}  words: {}  efficiency: {:.0}%  confidence: {:.2}",
        result.token_count,
        result.original_token_count,
        result.token_efficiency * 100.0,
        result.confidence
    );
    Ok(())
}

fn print_quality(session: &Session, quality: &TranslationQuality) -> Result<()> {
    if session.json {
        println!("{}", serde_json::to_string_pretty(quality)?);
        return Ok(());
    }
    println!("{}", quality);
    for issue in &quality.issues {
        println!("  {}", issue);
    }
    Ok(())
}

fn exit_for(quality: &TranslationQuality) -> ExitCode {
    if quality.is_valid {
        ExitCode::SUCCESS
    } else {
        ExitCode::FAILURE
    }
}
