use clap::{Args, Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "status-cli")]
#[command(about = "Management CLI for the status checker", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    /// API key for trigger routes; falls back to STATUS_API_KEY.
    #[arg(short, long, env = "STATUS_API_KEY", default_value = "")]
    key: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Check the server is up
    Ping,
    /// Run every suite now, or one named service
    Run { service: Option<String> },
    /// Show stored run reports
    Results(Filter),
    /// Show stored summary records
    Summaries(Filter),
}

#[derive(Args)]
struct Filter {
    #[arg(long)]
    service: Option<String>,
    #[arg(long)]
    region: Option<String>,
    #[arg(long)]
    limit: Option<usize>,
}

impl Filter {
    fn pairs(&self) -> Vec<(&'static str, String)> {
        let mut pairs = Vec::new();
        if let Some(service) = &self.service {
            pairs.push(("service", service.clone()));
        }
        if let Some(region) = &self.region {
            pairs.push(("region", region.clone()));
        }
        if let Some(limit) = self.limit {
            pairs.push(("limit", limit.to_string()));
        }
        pairs
    }
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();
    let base = cli.url.trim_end_matches('/');

    let mut headers = HeaderMap::new();
    if !cli.key.is_empty() {
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
        );
    }

    match cli.command {
        Commands::Ping => {
            let res = client.get(format!("{}/ping", base)).send().await?;
            let status = res.status();
            println!("{} {}", status.as_u16(), res.text().await?);
        }
        Commands::Run { service } => {
            let url = match service {
                Some(service) => format!("{}/test/{}", base, service),
                None => format!("{}/test", base),
            };
            let res = client.post(url).headers(headers).send().await?;
            print_response(res).await?;
        }
        Commands::Results(filter) => {
            let res = client
                .get(format!("{}/results", base))
                .query(&filter.pairs())
                .send()
                .await?;
            print_response(res).await?;
        }
        Commands::Summaries(filter) => {
            let res = client
                .get(format!("{}/summaries", base))
                .query(&filter.pairs())
                .send()
                .await?;
            print_response(res).await?;
        }
    }

    Ok(())
}

async fn print_response(res: reqwest::Response) -> Result<(), Box<dyn std::error::Error>> {
    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: server returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let json: Value = res.json().await?;
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
