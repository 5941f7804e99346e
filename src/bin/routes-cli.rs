use clap::{Parser, Subcommand};
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use serde_json::Value;

#[derive(Parser)]
#[command(name = "routes-cli")]
#[command(about = "Inspect the route table of a running route-groups server", long_about = None)]
struct Cli {
    #[arg(short, long, default_value = "http://localhost:8080")]
    url: String,

    #[arg(short, long, env = "ROUTES_ADMIN_KEY")]
    key: String,

    /// Admin API path prefix
    #[arg(long, default_value = "/admin")]
    prefix: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Application name, version and table sizes
    Status,
    /// List every registered route, mounts expanded
    Routes {
        /// Only show routes whose name starts with this prefix
        #[arg(long)]
        name: Option<String>,
    },
    /// List route groups
    Groups,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let client = reqwest::Client::new();

    let mut headers = HeaderMap::new();
    headers.insert(
        AUTHORIZATION,
        HeaderValue::from_str(&format!("Bearer {}", cli.key))?,
    );

    let base = format!(
        "{}/{}",
        cli.url.trim_end_matches('/'),
        cli.prefix.trim_matches('/')
    );
    let endpoint = match &cli.command {
        Commands::Status => "status",
        Commands::Routes { .. } => "routes",
        Commands::Groups => "groups",
    };

    let res = client
        .get(format!("{base}/{endpoint}"))
        .headers(headers)
        .send()
        .await?;

    let status = res.status();
    if !status.is_success() {
        eprintln!("Error: Admin API returned status {}", status);
        if let Ok(text) = res.text().await {
            eprintln!("Response: {}", text);
        }
        return Ok(());
    }

    let mut json: Value = res.json().await?;
    if let (Commands::Routes { name: Some(prefix) }, Value::Array(routes)) = (&cli.command, &mut json) {
        routes.retain(|route| {
            route["name"]
                .as_str()
                .is_some_and(|name| name.starts_with(prefix.as_str()))
        });
    }
    println!("{}", serde_json::to_string_pretty(&json)?);
    Ok(())
}
