use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "cardgift")]
#[command(about = "Store, share and list greeting cards", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Directory holding cards.json and config.json
    #[arg(long, global = true, env = "CARDGIFT_DATA")]
    pub data_dir: Option<PathBuf>,

    /// Output format
    #[arg(short, long, global = true, value_enum, default_value_t = OutputFormat::Text)]
    pub output: OutputFormat,

    /// Verbose output (repeat for more)
    #[arg(short, long, global = true, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Create or update a card
    #[command(alias = "s")]
    Save {
        /// Card id (generated when omitted)
        card_id: Option<String>,

        /// Greeting text; the first line becomes the title (required for new cards)
        #[arg(short, long)]
        text: Option<String>,

        /// Owning user id
        #[arg(short, long)]
        user: Option<String>,

        /// Real author when saved on someone's behalf
        #[arg(long)]
        creator: Option<String>,

        /// Wallet address of the owner
        #[arg(short, long)]
        wallet: Option<String>,

        /// Visual style (classic, sunset, ocean, space)
        #[arg(long)]
        style: Option<String>,

        /// Tag (repeatable)
        #[arg(long = "tag")]
        tags: Vec<String>,

        /// Metadata entry as key=value (repeatable)
        #[arg(long = "meta", value_parser = parse_key_value)]
        meta: Vec<(String, String)>,
    },

    /// Show one card
    #[command(alias = "g")]
    Get { card_id: String },

    /// List the cards visible to a requester
    #[command(alias = "ls")]
    List {
        /// Requesting user id
        #[arg(short, long)]
        user: Option<String>,

        /// Requesting wallet address
        #[arg(short, long)]
        wallet: Option<String>,

        /// Registry access level (5 = manager, 6 = author)
        #[arg(long)]
        level: Option<i64>,

        /// Search term
        #[arg(short, long)]
        search: Option<String>,

        /// Page number, starting at 1
        #[arg(short, long)]
        page: Option<usize>,

        /// Cards per page
        #[arg(short, long)]
        limit: Option<usize>,
    },

    /// Record a view of a card
    View { card_id: String },

    /// Record a click on a card
    Click { card_id: String },

    /// Get or set configuration
    Config {
        /// Configuration key (base-url, page-size, max-page-size)
        key: Option<String>,

        /// Value to set (if omitted, prints current value)
        value: Option<String>,
    },
}

fn parse_key_value(s: &str) -> Result<(String, String), String> {
    match s.split_once('=') {
        Some((key, value)) if !key.trim().is_empty() => {
            Ok((key.trim().to_string(), value.to_string()))
        }
        _ => Err(format!("expected key=value, got `{}`", s)),
    }
}
