//! queryset-cli
//!
//! Filters a JSON array of records and prints one page of the result,
//! the same way a view would with request parameters.
//!
//! ```sh
//! # Active users whose email ends with example.com, page 2 of 20
//! queryset-cli users.json \
//!     --filter active=is_active --filter domain=user.email__endswith \
//!     --param active=true --param domain='"example.com"' \
//!     --page 2 --per-page 20
//!
//! # Validate config without reading any records
//! queryset-cli --check
//! ```

use std::path::PathBuf;

use clap::Parser;
use serde_json::Value;
use tracing::{error, info};

use queryset_tools::config::AppConfig;
use queryset_tools::logging::{init_json_tracing, init_tracing};
use queryset_tools::{
    apply_filters, default_config_path, Filter, FilterParams, MemoryQuerySet, Page, PerPage,
    QuerySetFilter, QuerySetPaginator,
};

/// Filter and paginate JSON records.
#[derive(Parser, Debug)]
#[command(name = "queryset-cli", version, about = "Filter and paginate JSON record files")]
struct Cli {
    /// JSON file holding an array of records.
    input: Option<PathBuf>,

    /// Filter rule as KEY=LOOKUP (e.g. active=is_active, email=user.email__iexact).
    #[arg(short, long = "filter", value_parser = parse_key_value)]
    filters: Vec<(String, String)>,

    /// Filter parameter as KEY=VALUE. VALUE is parsed as JSON, falling back to a string.
    #[arg(short, long = "param", value_parser = parse_key_value)]
    params: Vec<(String, String)>,

    /// Page number (1-based).
    #[arg(long, default_value_t = 1, allow_negative_numbers = true)]
    page: i64,

    /// Page size; -1 returns everything on one page.
    #[arg(long, allow_negative_numbers = true)]
    per_page: Option<i64>,

    /// Path to the configuration file (TOML).
    #[arg(short, long, env = "QUERYSET_TOOLS_CONFIG")]
    config: Option<PathBuf>,

    /// Override the log level (trace, debug, info, warn, error).
    #[arg(short, long)]
    log_level: Option<String>,

    /// Emit logs as JSON lines.
    #[arg(long)]
    json_logs: bool,

    /// Validate the configuration file and exit.
    #[arg(long)]
    check: bool,
}

fn parse_key_value(raw: &str) -> Result<(String, String), String> {
    raw.split_once('=')
        .filter(|(key, _)| !key.is_empty())
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .ok_or_else(|| format!("expected KEY=VALUE, got {raw:?}"))
}

fn parse_param(raw: &str) -> Value {
    serde_json::from_str(raw).unwrap_or_else(|_| Value::String(raw.to_string()))
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    // ── Load configuration ─────────────────────────────────────
    let config_path = cli.config.clone().unwrap_or_else(default_config_path);
    let loaded = AppConfig::load(&config_path);
    let mut config = loaded.as_ref().cloned().unwrap_or_default();

    if let Some(ref level) = cli.log_level {
        config.logging.level = level.clone();
    }
    if cli.json_logs {
        init_json_tracing(&config.logging.level);
    } else {
        init_tracing(&config.logging.level);
    }

    match loaded {
        Ok(_) => info!("Configuration loaded from {}", config_path.display()),
        Err(e) => {
            error!("Failed to load config from {}: {}", config_path.display(), e);
            if cli.check {
                return Err(e.into());
            }
            error!("Using default configuration.");
        }
    }

    if cli.check {
        println!("Configuration is valid");
        println!("   Config file      : {}", config_path.display());
        println!("   Default per_page : {}", config.pagination.default_per_page());
        println!("   Max per_page     : {}", config.pagination.max_per_page);
        println!("   Log level        : {}", config.logging.level);
        return Ok(());
    }

    let input = cli.input.ok_or("missing input file")?;

    // ── Build query set ────────────────────────────────────────
    let records: Vec<Value> = serde_json::from_str(&std::fs::read_to_string(&input)?)?;
    info!("Loaded {} records from {}", records.len(), input.display());

    let filters = cli
        .filters
        .iter()
        .map(|(key, lookup)| QuerySetFilter::new(key.as_str(), lookup))
        .collect::<Result<Vec<_>, _>>()?;
    let filter_refs: Vec<&dyn Filter<MemoryQuerySet>> =
        filters.iter().map(|f| f as &dyn Filter<MemoryQuerySet>).collect();

    let params: FilterParams = cli
        .params
        .iter()
        .map(|(key, raw)| (key.clone(), parse_param(raw)))
        .collect();

    let queryset = apply_filters(&filter_refs, MemoryQuerySet::new(records), &params)?;

    // ── Paginate ───────────────────────────────────────────────
    let requested = cli.per_page.map(PerPage::try_from).transpose()?;
    let per_page = config.pagination.resolve_per_page(requested);
    let paginator = QuerySetPaginator::new(queryset, per_page).await?;
    let (page, pagination) = paginator.get_page(cli.page);

    let output = Page::new(page.into_records(), pagination);
    println!("{}", serde_json::to_string_pretty(&output)?);

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn key_value_splits_on_first_equals() {
        assert_eq!(
            parse_key_value("q=a=b").unwrap(),
            ("q".to_string(), "a=b".to_string())
        );
        assert!(parse_key_value("novalue").is_err());
        assert!(parse_key_value("=x").is_err());
    }

    #[test]
    fn params_parse_as_json_or_string() {
        assert_eq!(parse_param("true"), Value::Bool(true));
        assert_eq!(parse_param("[1,2]"), serde_json::json!([1, 2]));
        assert_eq!(parse_param("alice"), Value::String("alice".to_string()));
    }

    #[test]
    fn cli_parses_repeated_filters() {
        let cli = Cli::try_parse_from([
            "queryset-cli",
            "data.json",
            "--filter",
            "active=is_active",
            "-f",
            "min=age__gte",
            "--param",
            "active=true",
            "--per-page",
            "-1",
        ])
        .unwrap();
        assert_eq!(cli.filters.len(), 2);
        assert_eq!(cli.per_page, Some(-1));
        assert_eq!(cli.page, 1);
    }
}
