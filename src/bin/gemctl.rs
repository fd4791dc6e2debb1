//! Command-line companion for gemini-proxy.
//!
//! Talks to capsules directly with the same client the proxy uses, which is
//! handy for checking what a capsule returns without a browser in the way.
//!
//! # Usage
//!
//! ```bash
//! # Fetch a document and print it
//! cargo run --bin gemctl -- fetch gemini://geminiprotocol.net/
//!
//! # Send a query to an input endpoint
//! cargo run --bin gemctl -- fetch gemini://example.org/search --query "rust"
//!
//! # Render a local gemtext file as HTML
//! cargo run --bin gemctl -- render page.gmi
//!
//! # Show where the proxy would send a link
//! cargo run --bin gemctl -- link "/docs/" --base gemini://example.org/index.gmi
//! ```
//!
//! # Environment Variables
//!
//! - `GEMINI_*` - Same transport settings as the server (see `config` module)

use gemini_proxy::application::services::proxy_service::proxied_href;
use gemini_proxy::config;
use gemini_proxy::domain::client::GeminiClient;
use gemini_proxy::domain::gemini::{GeminiRequest, StatusCategory, decode_text};
use gemini_proxy::domain::gemtext;
use gemini_proxy::infrastructure::gemini::TlsGeminiClient;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use std::path::PathBuf;

/// Command-line tool for gemini-proxy.
#[derive(Parser)]
#[command(name = "gemctl")]
#[command(author, version, about, long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Fetch a Gemini URL and print the response
    Fetch {
        /// Absolute gemini:// URL
        url: String,

        /// Query to send with the request
        #[arg(short, long)]
        query: Option<String>,

        /// Print only the header line
        #[arg(long)]
        head: bool,
    },

    /// Render a gemtext file as HTML
    Render {
        /// Path to the gemtext file
        file: PathBuf,
    },

    /// Show the proxy path a link resolves to
    Link {
        /// The href as written in the document
        href: String,

        /// URL of the document containing the link
        #[arg(short, long)]
        base: String,
    },
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    match cli.command {
        Commands::Fetch { url, query, head } => fetch(&url, query.as_deref(), head).await?,
        Commands::Render { file } => render(&file)?,
        Commands::Link { href, base } => link(&href, &base)?,
    }

    Ok(())
}

/// Fetches a URL and prints status, meta and (for text) the body.
async fn fetch(url: &str, query: Option<&str>, head: bool) -> Result<()> {
    let config = config::load_from_env()?;
    let client = TlsGeminiClient::new(config.client_settings())
        .context("Failed to initialize Gemini client")?;

    let mut request = GeminiRequest::parse(url).context("Invalid Gemini URL")?;
    if let Some(query) = query {
        request = GeminiRequest::new(
            request.host(),
            request.port(),
            request.url().path(),
            Some(query),
        )?;
    }

    println!("{} {}", "→".bright_blue(), request.url().as_str().bold());

    let response = client.fetch(&request).await?;

    let status = response.status.to_string();
    let status = match response.category() {
        StatusCategory::Success => status.green().bold(),
        StatusCategory::Input | StatusCategory::Redirect => status.yellow().bold(),
        _ => status.red().bold(),
    };
    println!("{} {}", status, response.meta);

    if head {
        return Ok(());
    }

    if let Some(fingerprint) = client
        .known_hosts()
        .get(request.host())
        .map(|known| known.fingerprint)
    {
        println!("{} {}", "Certificate:".dimmed(), fingerprint.dimmed());
    }

    if let Some(body) = &response.body {
        println!();
        let mime = response.mime();
        match mime.charset() {
            Some(charset) => println!("{}", decode_text(body, &charset)),
            None => println!(
                "{}",
                format!("<{} bytes of {}>", body.len(), mime.essence).dimmed()
            ),
        }
    }

    Ok(())
}

/// Prints the HTML for a local gemtext file.
fn render(file: &PathBuf) -> Result<()> {
    let source = std::fs::read_to_string(file)
        .with_context(|| format!("Failed to read {}", file.display()))?;

    println!("{}", gemtext::to_html(&source));

    Ok(())
}

/// Prints where the proxy sends a link found in the document at `base`.
fn link(href: &str, base: &str) -> Result<()> {
    let request = GeminiRequest::parse(base).context("Invalid base URL")?;
    let current_path = format!("/{}{}", request.host(), request.url().path());

    match proxied_href(request.url(), href, &current_path) {
        Some(target) => println!("{} {}", "proxied:".green(), target),
        None => println!("{} {}", "unchanged:".yellow(), href),
    }

    Ok(())
}
