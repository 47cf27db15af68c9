//! Keystone T&E API server binary

use clap::Parser;
use keystone_te::api::{run_api_server, ApiConfig};
use keystone_te::config::RulesConfig;
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "keystone-te-server")]
#[command(version)]
#[command(about = "Keystone T&E API server - workbook intake, validation and reports")]
#[command(long_about = r#"
Keystone T&E API server

Endpoints:
  - POST /api/v1/uploads?employee_id=N   - Intake a raw .xlsx workbook
  - POST /api/v1/validate                - Validate a parsed workbook (JSON)
  - GET  /api/v1/windows?today=YYYY-MM-DD - Months open for upload
  - POST /api/v1/reports/{kind}          - category, daily or payroll report

Additional endpoints:
  - GET  /health           - Health check
  - GET  /version          - Server version info
  - GET  /                 - API documentation

Logging follows RUST_LOG (default: keystone_te=info,tower_http=info).

Example usage:
  keystone-te-server                           # Start on localhost:8080
  keystone-te-server --host 0.0.0.0 --port 3000 --config rules.yaml

  curl -X POST "http://localhost:8080/api/v1/uploads?employee_id=7" \
    --data-binary @TE_2026_01.xlsx
"#)]
struct Args {
    /// Host address to bind to (use 0.0.0.0 for all interfaces)
    #[arg(short = 'H', long, default_value = "127.0.0.1", env = "KEYSTONE_TE_HOST")]
    host: String,

    /// Port to listen on
    #[arg(short, long, default_value = "8080", env = "KEYSTONE_TE_PORT")]
    port: u16,

    /// Business-rules YAML file
    #[arg(short, long, env = "KEYSTONE_TE_RULES")]
    config: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let rules = RulesConfig::load(args.config.as_deref())?;

    let config = ApiConfig {
        host: args.host,
        port: args.port,
    };

    run_api_server(config, rules).await
}
