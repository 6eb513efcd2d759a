use clap::Parser;

/// WebBridge: native host for an embedded web page with a two-way message bridge.
#[derive(Parser, Debug)]
#[command(name = "webbridge", version, about)]
pub struct Args {
    /// Config file path override.
    #[arg(long)]
    pub config: Option<String>,

    /// Log level or filter directive (e.g. `debug`, `webbridge_core=trace`).
    #[arg(long)]
    pub log_level: Option<String>,

    /// Page to load instead of `webview.start_url`.
    #[arg(long)]
    pub url: Option<String>,

    /// Directory served under `webbridge://localhost/`.
    #[arg(long)]
    pub assets: Option<String>,

    /// Print the effective configuration as JSON and exit.
    #[arg(long)]
    pub print_config: bool,
}

pub fn parse() -> Args {
    Args::parse()
}

/// Turn `--log-level` into an `EnvFilter` directive.
pub fn log_directive(level: &str) -> String {
    if level.contains('=') {
        level.to_string()
    } else {
        format!("webbridge={level}")
    }
}
