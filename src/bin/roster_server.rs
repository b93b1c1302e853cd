//! Roster API Server binary
//!
//! HTTP REST API for schedule and duty-roster queries.

use clap::Parser;
use royalbit_roster::api::{run_api_server, server::ApiConfig};
use royalbit_roster::config::DEFAULT_CONFIG_FILE;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "roster-server")]
#[command(version)]
#[command(about = "Roster API Server - HTTP REST API for schedule and duty-roster queries")]
#[command(long_about = r#"
Roster API Server - HTTP REST API

Provides RESTful endpoints over the cached schedule workbooks:
  - POST /api/v1/schedule     - A person's schedule for a month
  - POST /api/v1/duties       - Duties for a date
  - POST /api/v1/duties/month - Duties for every day of a month
  - POST /api/v1/heads        - Heads working on a date
  - POST /api/v1/group        - Members of a head's group
  - POST /api/v1/invalidate   - Drop cached sheets of a replaced file

Additional endpoints:
  - GET  /api/v1/cache        - Cache counters
  - GET  /health              - Health check
  - GET  /version             - Server version info
  - GET  /                    - API documentation

Example usage:
  roster-server                           # Start on localhost:8080
  roster-server --host 0.0.0.0 --port 3000 --config /etc/roster.yaml

  curl -X POST http://localhost:8080/api/v1/duties \
    -H "Content-Type: application/json" \
    -d '{"date": "2024-07-01", "division": "support"}'
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "ROSTER_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "ROSTER_PORT")]
    port: u16,

    /// Path to roster.yaml
    #[arg(short, long, default_value = DEFAULT_CONFIG_FILE, env = "ROSTER_CONFIG")]
    config: PathBuf,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let config = ApiConfig {
        host: args.host,
        port: args.port,
        config_path: args.config,
    };

    run_api_server(config).await
}
