//! CLI runner - executes commands

use crate::cli::commands::{Cli, Commands};
use crate::config::{load_definition, PagingDefinition};
use crate::error::{Error, Result, ResultExt};
use crate::http::{HttpClient, HttpClientConfig};
use crate::paging::ItemPaged;
use serde_json::{json, Value};
use std::io::{self, Write};
use std::time::{Duration, Instant};
use tracing::{info, warn};

/// CLI runner
pub struct Runner {
    cli: Cli,
}

impl Runner {
    /// Create a new runner
    pub fn new(cli: Cli) -> Self {
        Self { cli }
    }

    /// Run the CLI command, writing results to stdout
    pub async fn run(&self) -> Result<()> {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        self.run_to(&mut out).await
    }

    /// Run the CLI command, writing results to `out`
    pub async fn run_to<W: Write>(&self, out: &mut W) -> Result<()> {
        match &self.cli.command {
            Commands::Items { url, max_items } => self.items(url, *max_items, out).await,
            Commands::Pages { url, max_pages } => self.pages(url, *max_pages, out).await,
            Commands::Validate => self.validate(out),
        }
    }

    fn definition(&self) -> Result<PagingDefinition> {
        match &self.cli.definition {
            Some(path) => load_definition(path),
            None => Ok(PagingDefinition::default()),
        }
    }

    /// Build the listing for `url` from the definition and CLI flags
    fn listing(&self, url: &str) -> Result<ItemPaged<Value>> {
        let definition = self.definition()?;
        let options = definition.build()?;

        let config = HttpClientConfig::builder()
            .timeout(Duration::from_secs(self.cli.timeout))
            .build();
        let client = HttpClient::with_config(config)?;

        let mut request = client.get(url)?;
        for (name, value) in &definition.headers {
            request.set_header(name, value)?;
        }
        // CLI headers override the definition's
        for raw in &self.cli.headers {
            let (name, value) = parse_header(raw)?;
            request.set_header(name, value)?;
        }

        let mut builder = ItemPaged::builder(client, request).options(options);
        if let Some(token) = &self.cli.continuation_token {
            builder = builder.continuation_token(token.clone());
        }
        Ok(builder.build())
    }

    async fn items<W: Write>(&self, url: &str, max_items: Option<usize>, out: &mut W) -> Result<()> {
        let mut items = self.listing(url)?;
        let start = Instant::now();
        let mut count = 0usize;

        while max_items.map_or(true, |max| count < max) {
            let Some(item) = items.next_item().await else {
                break;
            };
            let item = item.map_err(report_resumption)?;
            let line = serde_json::to_string(&item).context("Failed to serialize item")?;
            writeln!(out, "{line}")?;
            count += 1;
        }

        info!("Wrote {} items in {:?}", count, start.elapsed());
        Ok(())
    }

    async fn pages<W: Write>(&self, url: &str, max_pages: Option<usize>, out: &mut W) -> Result<()> {
        let mut pages = self.listing(url)?.by_page(self.cli.continuation_token.clone());
        let start = Instant::now();

        while max_pages.map_or(true, |max| pages.pages_fetched() < max) {
            let Some(page) = pages.next_page().await else {
                break;
            };
            let page = page.map_err(report_resumption)?;
            let line = json!({
                "page": pages.pages_fetched(),
                "items": page.len(),
                "continuation_token": page.continuation_token,
            });
            writeln!(out, "{line}")?;
        }

        info!(
            "Walked {} pages in {:?}",
            pages.pages_fetched(),
            start.elapsed()
        );
        Ok(())
    }

    fn validate<W: Write>(&self, out: &mut W) -> Result<()> {
        let definition = self.definition()?;
        definition.build()?;
        let rendered = serde_yaml::to_string(&definition).context("Failed to render definition")?;
        write!(out, "{rendered}")?;
        Ok(())
    }
}

/// Log where to resume from before handing the error back
fn report_resumption(error: Error) -> Error {
    if error.is_resumable() {
        match error.continuation_token() {
            Some(token) => warn!("Resume with --continuation-token {}", token),
            None => warn!("Failed on the first page; rerun without --continuation-token"),
        }
    }
    error
}

/// Parse a `NAME:VALUE` header argument
pub fn parse_header(raw: &str) -> Result<(&str, &str)> {
    let (name, value) = raw
        .split_once(':')
        .ok_or_else(|| Error::invalid_value("header", format!("expected NAME:VALUE, got '{raw}'")))?;

    let name = name.trim();
    if name.is_empty() {
        return Err(Error::invalid_value("header", "header name is empty"));
    }
    Ok((name, value.trim()))
}
