use clap::Parser;

#[derive(Parser, Debug)]
#[command(name = "whoami")]
#[command(version)]
#[command(about = "Diagnostic HTTP server returning request details and synthetic payloads", long_about = None)]
#[command(after_help = "Endpoints:\n  \
  /                  request and host details as text\n  \
  /api               request and host details as JSON\n  \
  /data?size=2&unit=kb[&attachment]   synthetic payload\n  \
  /health            GET status, POST a status code to change it\n  \
  /metrics           Prometheus metrics\n\n\
Environment: WHOAMI_<SECTION>__<KEY>, e.g. WHOAMI_SERVER__PORT=9000")]
pub struct Cli {
    /// Configuration file (TOML, extension optional)
    #[arg(short = 'c', long, value_name = "FILE", default_value = "whoami")]
    pub config: String,

    /// Listen address
    #[arg(long)]
    pub host: Option<String>,

    /// Listen port
    #[arg(short = 'p', long)]
    pub port: Option<u16>,

    /// Worker threads (default: CPU cores)
    #[arg(long)]
    pub workers: Option<u16>,

    /// Log level: debug, info, warn, error
    #[arg(long, value_name = "LEVEL")]
    pub log_level: Option<String>,

    /// Log format: text or json
    #[arg(long, value_name = "FORMAT")]
    pub log_format: Option<String>,

    /// Enable the access log
    #[arg(long)]
    pub access_log: bool,

    /// Comma separated path prefixes left out of the access log
    #[arg(long, value_name = "PATHS", value_delimiter = ',')]
    pub access_log_skip_paths: Option<Vec<String>>,

    /// Seconds allowed to read a whole request, 0 disables
    #[arg(long, value_name = "SECS")]
    pub read_timeout: Option<u32>,

    /// Seconds allowed to read request headers, 0 falls back to --read-timeout
    #[arg(long, value_name = "SECS")]
    pub read_header_timeout: Option<u32>,

    /// Seconds allowed to handle a request and write the response, 0 disables
    #[arg(long, value_name = "SECS")]
    pub write_timeout: Option<u32>,
}
