use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

use probe_shim::analytics::AnalyticsClient;
use probe_shim::config::AnalyticsConfig;

#[derive(Parser)]
#[command(name = "probe-cli")]
#[command(about = "Inspect PHP probe reports", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(clap::Args)]
struct ShimArgs {
    /// Base URL of a running shim
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// Reporting path prefix
    #[arg(long, default_value = "/__phplog")]
    prefix: String,

    /// Reporting bearer token
    #[arg(short, long, env = "PROBE_SHIM_REPORTING_TOKEN", default_value = "")]
    token: String,
}

#[derive(Subcommand)]
enum Commands {
    /// Most recent probes from the last 24 hours
    Last(ShimArgs),
    /// Most probed paths over the last 30 days
    Top(ShimArgs),
    /// Run an ad-hoc SQL query against the analytics API
    Query {
        /// SQL to run
        sql: String,

        #[arg(long, env = "PROBE_SHIM_ACCOUNT_ID")]
        account_id: String,

        #[arg(long, env = "PROBE_SHIM_ANALYTICS_TOKEN")]
        api_token: String,

        #[arg(long, default_value = "https://api.cloudflare.com/client/v4")]
        api_base_url: String,
    },
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    match cli.command {
        Commands::Last(args) => fetch_report(&args, "_last").await?,
        Commands::Top(args) => fetch_report(&args, "_top").await?,
        Commands::Query {
            sql,
            account_id,
            api_token,
            api_base_url,
        } => {
            let config = AnalyticsConfig {
                account_id,
                api_token,
                api_base_url,
                ..Default::default()
            };
            let result = AnalyticsClient::new(&config).query(&sql).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
    }

    Ok(())
}

async fn fetch_report(args: &ShimArgs, suffix: &str) -> Result<(), Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    if !args.token.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", args.token))?,
        );
    }

    let url = format!("{}{}{}", args.url.trim_end_matches('/'), args.prefix, suffix);
    let res = reqwest::Client::new().get(url).headers(headers).send().await?;
    print_response(res).await
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    let cache = res
        .headers()
        .get("x-cache")
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-")
        .to_string();

    if !status.is_success() {
        let text = res.text().await.unwrap_or_default();
        return Err(format!("shim returned status {}: {}", status, text).into());
    }

    let json: Value = res.json().await?;
    eprintln!("cache: {}", cache);
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
