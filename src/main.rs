//! Command-line front end for the REST client.
//!
//! ```text
//! pubsub-rest [--config client.toml] request GET /time
//! pubsub-rest request POST /channels/test/messages --body '{"name":"e"}' -H 'x-custom: 1'
//! pubsub-rest probe
//! ```

use std::path::PathBuf;
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use http::{HeaderMap, HeaderName, HeaderValue, Method};
use serde_json::{json, Map, Value};

use pubsub_rest::config::{load_config, ClientConfig};
use pubsub_rest::observability::{logging::init_logging, metrics::describe_metrics};
use pubsub_rest::{RestClient, RestResponse};

#[derive(Parser)]
#[command(name = "pubsub-rest")]
#[command(about = "REST client with host fallback", long_about = None)]
struct Cli {
    /// TOML configuration file; defaults apply when omitted
    #[arg(short, long)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Issue a request against the configured hosts
    Request {
        /// HTTP method
        method: String,
        /// Path relative to the host, or an absolute URI
        target: String,
        /// Header as `name: value`, repeatable
        #[arg(short = 'H', long = "header")]
        headers: Vec<String>,
        /// Query parameter as `key=value`, repeatable
        #[arg(short, long = "query")]
        query: Vec<String>,
        /// Request body
        #[arg(short, long)]
        body: Option<String>,
    },
    /// Check internet connectivity
    Probe,
}

#[tokio::main]
async fn main() -> Result<ExitCode, Box<dyn std::error::Error>> {
    let cli = Cli::parse();

    let config = match &cli.config {
        Some(path) => load_config(path)?,
        None => ClientConfig::default(),
    };
    init_logging(&config.observability);
    describe_metrics();

    tracing::debug!(
        config = ?cli.config,
        primary = %config.hosts.primary(),
        "Configuration loaded"
    );

    let client = RestClient::new(config)?;

    match cli.command {
        Commands::Request {
            method,
            target,
            headers,
            query,
            body,
        } => {
            let method = Method::from_bytes(method.to_ascii_uppercase().as_bytes())?;
            let headers = parse_headers(&headers)?;
            let query = parse_query(&query)?;
            let response = client
                .request(
                    method,
                    target.as_str(),
                    headers,
                    body.map(Into::into),
                    Some(query),
                )
                .await;

            println!("{}", serde_json::to_string_pretty(&render(&response))?);
            Ok(if response.is_error {
                ExitCode::FAILURE
            } else {
                ExitCode::SUCCESS
            })
        }
        Commands::Probe => {
            let up = client.check_connectivity().await;
            println!("{}", json!({ "connected": up }));
            Ok(if up { ExitCode::SUCCESS } else { ExitCode::FAILURE })
        }
    }
}

fn parse_headers(raw: &[String]) -> Result<HeaderMap, Box<dyn std::error::Error>> {
    let mut headers = HeaderMap::new();
    for entry in raw {
        let (name, value) = entry
            .split_once(':')
            .ok_or_else(|| format!("invalid header '{}', expected 'name: value'", entry))?;
        headers.append(
            HeaderName::from_bytes(name.trim().as_bytes())?,
            HeaderValue::from_str(value.trim())?,
        );
    }
    Ok(headers)
}

fn parse_query(raw: &[String]) -> Result<Vec<(String, String)>, Box<dyn std::error::Error>> {
    let mut query = Vec::with_capacity(raw.len());
    for entry in raw {
        let (key, value) = entry
            .split_once('=')
            .ok_or_else(|| format!("invalid query parameter '{}', expected 'key=value'", entry))?;
        query.push((key.to_string(), value.to_string()));
    }
    Ok(query)
}

fn render(response: &RestResponse) -> Value {
    let headers: Map<String, Value> = response
        .headers
        .iter()
        .map(|(name, value)| {
            (
                name.as_str().to_string(),
                Value::String(String::from_utf8_lossy(value.as_bytes()).into_owned()),
            )
        })
        .collect();

    json!({
        "error": response.error,
        "body": response.body.as_ref().map(|body| body.to_json()),
        "headers": headers,
        "isError": response.is_error,
        "statusCode": response.status_code,
    })
}
