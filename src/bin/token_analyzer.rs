//! token-analyzer: 提示词 Token 与成本分析命令行工具
//!
//! Usage:
//!   token-analyzer analyze --model <id> [--output-tokens <n>] <text|->   Count tokens and estimate cost
//!   token-analyzer share --model <id> [--page <url>] <text|->           Print a shareable link
//!   token-analyzer open <url>                                            Decode and analyze a shared link
//!   token-analyzer summarize --model <id> <text|->                       Summarize and report savings
//!   token-analyzer models                                                List known models

use anyhow::{anyhow, bail, Context};
use context_optimizer::analyzer::{AnalyzerHandle, DEFAULT_PAGE_URL};
use context_optimizer::tokens::format_usage;
use context_optimizer::url_state::{self, StaticLocation};
use context_optimizer::{Analyzer, AnalyzerConfig, ModelCatalog, OptimizerClient, Phase};
use std::io::Read;
use std::sync::Arc;
use std::time::Duration;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let args: Vec<String> = std::env::args().collect();
    if args.len() < 2 {
        print_usage();
        std::process::exit(1);
    }

    let outcome = match args[1].as_str() {
        "analyze" => cmd_analyze(&args[2..]).await,
        "share" => cmd_share(&args[2..]),
        "open" => cmd_open(&args[2..]).await,
        "summarize" => cmd_summarize(&args[2..]).await,
        "models" => cmd_models(),
        "version" | "--version" | "-V" => {
            println!("token-analyzer {}", env!("CARGO_PKG_VERSION"));
            Ok(())
        }
        "help" | "--help" | "-h" => {
            print_usage();
            Ok(())
        }
        other => {
            eprintln!("Unknown command: {other}");
            eprintln!();
            print_usage();
            std::process::exit(1);
        }
    };

    if let Err(e) = outcome {
        eprintln!("Error: {e:#}");
        std::process::exit(1);
    }
}

fn print_usage() {
    println!(
        r#"token-analyzer: 提示词 Token 与成本分析工具

USAGE:
    token-analyzer <COMMAND> [OPTIONS]

COMMANDS:
    analyze --model <id> [--output-tokens <n>] <text|->
                                Count tokens and estimate cost
    share --model <id> [--page <url>] <text|->
                                Print a shareable link
    open <url>                  Decode a shared link and analyze it
    summarize --model <id> <text|->
                                Summarize the text and report token savings
    models                      List known models and pricing
    version                     Show version information
    help                        Show this help message

Pass "-" as the text to read it from stdin.

ENVIRONMENT:
    OPTIMIZER_API_URL           Optimizer service address (required for analyze/summarize)
    OPTIMIZER_HTTP_TIMEOUT_SECS Request timeout
    OPTIMIZER_OUTPUT_TOKENS     Default expected output tokens
    OPTIMIZER_EXCHANGE_RATE     USD to INR rate
    OPTIMIZER_MODELS_PATH       YAML model catalog replacing the built-in one
    RUST_LOG                    Log filter (default: warn)"#
    );
}

/// Flags and the single positional argument of a subcommand.
struct Parsed {
    model: Option<String>,
    output_tokens: Option<u64>,
    page: Option<String>,
    positional: Option<String>,
}

fn parse_args(args: &[String]) -> anyhow::Result<Parsed> {
    let mut parsed = Parsed {
        model: None,
        output_tokens: None,
        page: None,
        positional: None,
    };
    let mut iter = args.iter();
    while let Some(arg) = iter.next() {
        match arg.as_str() {
            "--model" | "-m" => {
                parsed.model = Some(iter.next().context("--model needs a value")?.clone());
            }
            "--output-tokens" => {
                let raw = iter.next().context("--output-tokens needs a value")?;
                parsed.output_tokens = Some(
                    raw.parse()
                        .with_context(|| format!("invalid --output-tokens '{raw}'"))?,
                );
            }
            "--page" => {
                parsed.page = Some(iter.next().context("--page needs a value")?.clone());
            }
            other if parsed.positional.is_none() => parsed.positional = Some(other.to_string()),
            other => bail!("unexpected argument '{other}'"),
        }
    }
    Ok(parsed)
}

fn read_text(arg: Option<String>) -> anyhow::Result<String> {
    match arg.as_deref() {
        Some("-") => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading text from stdin")?;
            Ok(buf.trim_end_matches('\n').to_string())
        }
        Some(text) => Ok(text.to_string()),
        None => bail!("missing text argument"),
    }
}

fn load(config: &AnalyzerConfig) -> anyhow::Result<ModelCatalog> {
    config.load_catalog().context("loading model catalog")
}

fn require_model(catalog: &ModelCatalog, model: Option<String>) -> anyhow::Result<String> {
    let model = model.context("--model is required")?;
    if !catalog.contains(&model) {
        bail!(
            "unknown model '{model}' (known: {})",
            catalog.ids().join(", ")
        );
    }
    Ok(model)
}

async fn cmd_analyze(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_args(args)?;
    let mut config = AnalyzerConfig::from_env();
    config.validate()?;
    let catalog = load(&config)?;
    let model = require_model(&catalog, parsed.model)?;
    let text = read_text(parsed.positional)?;
    if text.is_empty() {
        bail!("text must not be empty");
    }
    if let Some(n) = parsed.output_tokens {
        config = config.with_output_tokens(n);
    }

    let client = OptimizerClient::from_config(&config)?;
    let analyzer = Analyzer::builder(Arc::new(client))
        .config(&config)
        .debounce(Duration::ZERO)
        .catalog(Arc::new(catalog))
        .spawn();
    analyzer.select_model(&model)?;
    analyzer.set_text(text)?;
    report(analyzer).await
}

/// Wait for the analysis to finish and print it.
async fn report(analyzer: AnalyzerHandle) -> anyhow::Result<()> {
    let state = analyzer.settled().await?;
    analyzer.shutdown().await;

    if state.phase == Phase::Failed {
        let message = state
            .last_error
            .map(|n| n.to_string())
            .unwrap_or_else(|| "analysis failed".to_string());
        bail!(message);
    }

    let (Some(result), Some(descriptor), Some(cost)) =
        (state.current_result(), state.model.as_ref(), state.cost())
    else {
        bail!("nothing to analyze");
    };

    println!("Model:          {}", descriptor.name);
    println!("Input tokens:   {}", result.input_tokens);
    println!("Words:          {}", result.word_count);
    println!("Characters:     {}", result.character_count);
    println!(
        "Context usage:  {}",
        format_usage(result.input_tokens, descriptor.context_window)
    );
    println!("Output tokens:  {}", state.output_tokens);
    println!("Input cost:     {}", cost.format_input());
    println!("Output cost:    {}", cost.format_output());
    println!(
        "Total cost:     {} ({})",
        cost.format_total(),
        cost.format_converted()
    );
    Ok(())
}

fn cmd_share(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_args(args)?;
    let config = AnalyzerConfig::from_env();
    let catalog = load(&config)?;
    let model = require_model(&catalog, parsed.model)?;
    let text = read_text(parsed.positional)?;
    let location = StaticLocation::new(parsed.page.unwrap_or_else(|| DEFAULT_PAGE_URL.to_string()));
    println!("{}", url_state::export(&location, &model, &text)?);
    Ok(())
}

async fn cmd_open(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_args(args)?;
    let href = parsed.positional.context("missing url argument")?;
    let config = AnalyzerConfig::from_env();
    let catalog = load(&config)?;
    let shared = url_state::import_href(&href, &catalog);
    match &shared.model_id {
        Some(model) => println!("Model: {model}"),
        None => println!("Model: (none)"),
    }
    println!("Text:  {}", shared.text);

    if shared.model_id.is_none() || shared.text.is_empty() || config.api_url.is_none() {
        return Ok(());
    }
    config.validate()?;
    println!();

    let client = OptimizerClient::from_config(&config)?;
    let analyzer = Analyzer::builder(Arc::new(client))
        .config(&config)
        .debounce(Duration::ZERO)
        .catalog(Arc::new(catalog))
        .location(Arc::new(StaticLocation::new(href)))
        .import_location(true)
        .spawn();
    report(analyzer).await
}

async fn cmd_summarize(args: &[String]) -> anyhow::Result<()> {
    let parsed = parse_args(args)?;
    let config = AnalyzerConfig::from_env();
    config.validate()?;
    let catalog = load(&config)?;
    let model = require_model(&catalog, parsed.model)?;
    let text = read_text(parsed.positional)?;
    if text.trim().is_empty() {
        return Err(anyhow!("text must not be empty"));
    }

    let client = OptimizerClient::from_config(&config)?;
    let summary = client.summarize(&text, &model).await?;
    println!("{}", summary.summary);
    println!();
    println!("Original tokens: {}", summary.original_token_count);
    println!("Summary tokens:  {}", summary.summary_token_count);
    println!("Savings:         {:.1}%", summary.savings_percent());
    Ok(())
}

fn cmd_models() -> anyhow::Result<()> {
    let config = AnalyzerConfig::from_env();
    let catalog = load(&config)?;
    for model in catalog.iter() {
        println!("{} ({})", model.name, model.id);
        println!("    {}", model.summary_line());
    }
    Ok(())
}
