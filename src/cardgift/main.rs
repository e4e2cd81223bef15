use cardgift::api::{CardFilter, CardPage, CardService, SaveReceipt};
use cardgift::config::CardGiftConfig;
use cardgift::error::{CardError, Result};
use cardgift::format::CardView;
use cardgift::identity::{FounderRegistry, IdentityClaim, IdentityResolver};
use cardgift::model::{CardPatch, CardStyle};
use cardgift::store::fs::FileStore;
use chrono::{DateTime, Utc};
use clap::Parser;
use colored::*;
use directories::ProjectDirs;
use log::{LevelFilter, debug};
use serde::Serialize;
use serde_json::{Map, Value, json};
use std::path::PathBuf;
use unicode_width::UnicodeWidthStr;

mod args;
use args::{Cli, Commands, OutputFormat};

fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(e) = run(cli) {
        eprintln!("Error: {}", e);
        std::process::exit(1);
    }
}

fn init_logging(verbose: u8) {
    let level = match verbose {
        0 => LevelFilter::Warn,
        1 => LevelFilter::Info,
        _ => LevelFilter::Debug,
    };
    let _ = env_logger::builder()
        .format_timestamp_millis()
        .filter_level(level)
        .parse_default_env()
        .try_init();
}

struct AppContext {
    service: CardService<FileStore>,
    config: CardGiftConfig,
    data_dir: PathBuf,
    output: OutputFormat,
}

fn run(cli: Cli) -> Result<()> {
    let ctx = init_context(&cli)?;

    match cli.command {
        Some(Commands::Save {
            card_id,
            text,
            user,
            creator,
            wallet,
            style,
            tags,
            meta,
        }) => {
            let patch = CardPatch {
                greeting_text: text,
                user_id: user,
                actual_creator: creator,
                wallet_address: wallet,
                style: style.as_deref().map(CardStyle::from),
                tags: (!tags.is_empty()).then_some(tags),
                meta: (!meta.is_empty()).then(|| {
                    meta.into_iter()
                        .map(|(k, v)| (k, Value::String(v)))
                        .collect::<Map<String, Value>>()
                }),
                ..Default::default()
            };
            handle_save(&ctx, card_id, patch)
        }
        Some(Commands::Get { card_id }) => handle_get(&ctx, &card_id),
        Some(Commands::List {
            user,
            wallet,
            level,
            search,
            page,
            limit,
        }) => {
            let claim = IdentityClaim {
                user_id: user,
                wallet_address: wallet,
                level,
            };
            handle_list(&ctx, &claim, search, page, limit)
        }
        Some(Commands::View { card_id }) => handle_counter(&ctx, &card_id, "view"),
        Some(Commands::Click { card_id }) => handle_counter(&ctx, &card_id, "click"),
        Some(Commands::Config { key, value }) => handle_config(ctx, key, value),
        None => handle_list(&ctx, &IdentityClaim::default(), None, None, None),
    }
}

fn init_context(cli: &Cli) -> Result<AppContext> {
    let data_dir = match &cli.data_dir {
        Some(dir) => dir.clone(),
        None => ProjectDirs::from("com", "cardgift", "cardgift")
            .map(|dirs| dirs.data_dir().to_path_buf())
            .ok_or_else(|| CardError::Store("could not determine data directory".to_string()))?,
    };
    debug!("using data dir {}", data_dir.display());

    let config = CardGiftConfig::load(&data_dir)?;
    let effective = config.clone().with_env_overrides();
    let service = CardService::from_config(FileStore::new(data_dir.clone()), &effective);

    Ok(AppContext {
        service,
        config,
        data_dir,
        output: cli.output,
    })
}

fn handle_save(ctx: &AppContext, card_id: Option<String>, patch: CardPatch) -> Result<()> {
    let card_id = card_id.unwrap_or_else(|| format!("card_{}", uuid::Uuid::new_v4().simple()));
    let receipt = ctx.service.save(&card_id, patch)?;
    match ctx.output {
        OutputFormat::Json => print_json(&receipt),
        OutputFormat::Text => {
            print_receipt(&receipt);
            Ok(())
        }
    }
}

fn handle_get(ctx: &AppContext, card_id: &str) -> Result<()> {
    let view = ctx.service.get(card_id)?;
    match ctx.output {
        OutputFormat::Json => print_json(&view),
        OutputFormat::Text => {
            print_full_card(&view);
            Ok(())
        }
    }
}

fn handle_list(
    ctx: &AppContext,
    claim: &IdentityClaim,
    search: Option<String>,
    page: Option<usize>,
    limit: Option<usize>,
) -> Result<()> {
    let requester = FounderRegistry::from_config(&ctx.config.founders).resolve(claim);
    let filter = CardFilter {
        requester,
        search_text: search,
        page,
        page_size: limit,
    };
    let page = ctx.service.list(&filter)?;
    match ctx.output {
        OutputFormat::Json => print_json(&page),
        OutputFormat::Text => {
            print_cards(&page);
            Ok(())
        }
    }
}

fn handle_counter(ctx: &AppContext, card_id: &str, what: &str) -> Result<()> {
    let recorded = match what {
        "click" => ctx.service.record_click(card_id)?,
        _ => ctx.service.record_view(card_id)?,
    };
    if !recorded {
        return Err(CardError::NotFound(card_id.to_string()));
    }

    match ctx.output {
        OutputFormat::Json => print_json(&json!({ "cardId": card_id, "recorded": what })),
        OutputFormat::Text => {
            println!("{}", format!("Recorded {} for {}", what, card_id).green());
            Ok(())
        }
    }
}

fn handle_config(ctx: AppContext, key: Option<String>, value: Option<String>) -> Result<()> {
    let mut config = ctx.config;

    match (key.as_deref(), value) {
        (None, _) => {}
        (Some("base-url"), Some(v)) => config.set_base_url(&v),
        (Some("page-size"), Some(v)) => config.default_page_size = parse_size("page-size", &v)?,
        (Some("max-page-size"), Some(v)) => {
            config.max_page_size = parse_size("max-page-size", &v)?
        }
        (Some(k @ ("base-url" | "page-size" | "max-page-size")), None) => {
            println!("{} = {}", k, config_value(&config, k));
            return Ok(());
        }
        (Some(other), _) => {
            return Err(CardError::Validation(format!(
                "Unknown config key: {}",
                other
            )));
        }
    }

    if key.is_some() {
        config.save(&ctx.data_dir)?;
        if ctx.output == OutputFormat::Text {
            println!("{}", "Configuration saved.".green());
        }
    }

    match ctx.output {
        OutputFormat::Json => print_json(&config),
        OutputFormat::Text => {
            for k in ["base-url", "page-size", "max-page-size"] {
                println!("{} = {}", k, config_value(&config, k));
            }
            Ok(())
        }
    }
}

fn config_value(config: &CardGiftConfig, key: &str) -> String {
    match key {
        "base-url" => config.base_url.clone(),
        "page-size" => config.default_page_size.to_string(),
        _ => config.max_page_size.to_string(),
    }
}

fn parse_size(key: &str, value: &str) -> Result<usize> {
    match value.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(CardError::Validation(format!(
            "{} must be a positive number, got `{}`",
            key, value
        ))),
    }
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_receipt(receipt: &SaveReceipt) {
    println!("{} {}", "Saved card".green(), receipt.card_id.bold());
    println!("  share:   {}", receipt.share_url);
    println!("  preview: {}", receipt.preview_url);
}

fn print_full_card(view: &CardView) {
    println!("{} {}", view.card_id.yellow(), view.title.bold());
    println!("--------------------------------");
    println!("{}", view.greeting_text);
    println!("--------------------------------");
    println!(
        "{}",
        format!(
            "style {} · {} views · {} clicks · created {}",
            view.style,
            view.views,
            view.clicks,
            format_time_ago(view.created_at).trim()
        )
        .dimmed()
    );
    if !view.tags.is_empty() {
        println!("{}", format!("tags: {}", view.tags.join(", ")).dimmed());
    }
    println!("share:  {}", view.share_url);
    println!("viewer: {}", view.viewer_url);
}

const LINE_WIDTH: usize = 100;
const TIME_WIDTH: usize = 14;
const COUNTS_WIDTH: usize = 14;
const OWNER_MARKER: &str = "★";

fn print_cards(page: &CardPage) {
    if page.cards.is_empty() {
        println!("No cards found.");
        return;
    }

    let first = (page.page - 1) * page.limit;
    for (offset, view) in page.cards.iter().enumerate() {
        let idx_str = format!("{}. ", first + offset + 1);
        let marker = if view.is_owner == Some(true) {
            format!("  {} ", OWNER_MARKER)
        } else {
            "    ".to_string()
        };
        let counts = format!("{:>5}v {:>4}c  ", view.views, view.clicks);

        let fixed_width = marker.width() + idx_str.width() + COUNTS_WIDTH + TIME_WIDTH;
        let available = LINE_WIDTH.saturating_sub(fixed_width);
        let title_display = truncate_to_width(&view.title, available);
        let padding = available.saturating_sub(title_display.width());

        println!(
            "{}{}{}{}{}{}",
            marker,
            idx_str.yellow(),
            title_display,
            " ".repeat(padding),
            format!("{:>width$}", counts, width = COUNTS_WIDTH).dimmed(),
            format_time_ago(view.created_at).dimmed()
        );
    }

    println!();
    println!(
        "{}",
        format!(
            "page {} · showing {} of {} cards",
            page.page,
            page.cards.len(),
            page.total
        )
        .dimmed()
    );
}

fn truncate_to_width(s: &str, max_width: usize) -> String {
    use unicode_width::UnicodeWidthChar;

    let mut result = String::new();
    let mut current_width = 0;

    for c in s.chars() {
        let char_width = c.width().unwrap_or(0);
        if current_width + char_width > max_width.saturating_sub(1) {
            result.push('…');
            return result;
        }
        result.push(c);
        current_width += char_width;
    }

    result
}

fn format_time_ago(timestamp: DateTime<Utc>) -> String {
    let duration = Utc::now().signed_duration_since(timestamp);
    let time_str = timeago::Formatter::new().convert(duration.to_std().unwrap_or_default());
    format!("{:>width$}", time_str, width = TIME_WIDTH)
}
