use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "wa-relay")]
#[command(about = "WhatsApp to AI relay", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Show version
    Version,

    /// Run the webhook gateway. Settings come from the config file, then the environment (and a .env file in the working directory).
    Serve {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,

        /// HTTP port (default from PORT, config, or 5000)
        #[arg(long, short)]
        port: Option<u16>,

        /// Bind address (default from config or 127.0.0.1)
        #[arg(long, value_name = "ADDR")]
        bind: Option<String>,
    },

    /// Report which required settings are missing. Exits 1 if any are.
    CheckConfig {
        /// Config file path (default: RELAY_CONFIG_PATH or ~/.wa-relay/config.json)
        #[arg(long, short, value_name = "PATH")]
        config: Option<std::path::PathBuf>,
    },
}

#[tokio::main]
async fn main() {
    // .env first so RUST_LOG from it applies.
    let dotenv = dotenv::dotenv();
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    if let Err(e) = dotenv {
        log::debug!("no .env loaded: {}", e);
    }

    let cli = Cli::parse();

    match cli.command {
        Some(Commands::Version) => {
            println!("wa-relay {}", env!("CARGO_PKG_VERSION"));
        }
        Some(Commands::Serve { config, port, bind }) => {
            if let Err(e) = run_serve(config, port, bind).await {
                log::error!("gateway failed: {:#}", e);
                std::process::exit(1);
            }
        }
        Some(Commands::CheckConfig { config }) => match run_check_config(config) {
            Ok(true) => {}
            Ok(false) => std::process::exit(1),
            Err(e) => {
                log::error!("check-config failed: {:#}", e);
                std::process::exit(1);
            }
        },
        None => {
            println!("Run with --help for usage");
        }
    }
}

async fn run_serve(
    config_path: Option<std::path::PathBuf>,
    port: Option<u16>,
    bind: Option<String>,
) -> anyhow::Result<()> {
    let (mut config, path) = lib::config::load_config(config_path)?;
    if let Some(p) = port {
        config.gateway.port = p;
    }
    if let Some(b) = bind {
        config.gateway.bind = b;
    }
    log::info!(
        "starting gateway on {}:{} (config {})",
        config.gateway.bind,
        config.gateway.port,
        path.display()
    );
    lib::gateway::run_gateway(config).await
}

/// Prints the resolved settings (secrets as set/unset only). Returns false when any are missing.
fn run_check_config(config_path: Option<std::path::PathBuf>) -> anyhow::Result<bool> {
    let (config, path) = lib::config::load_config(config_path)?;
    let set = |v: &Option<String>| {
        if lib::config::non_empty(v).is_some() {
            "set"
        } else {
            "unset"
        }
    };
    println!("config file:      {}", path.display());
    println!("listen:           {}:{}", config.gateway.bind, config.gateway.port);
    println!("verify token:     {}", set(&config.whatsapp.verify_token));
    println!("access token:     {}", set(&config.whatsapp.access_token));
    println!(
        "phone number id:  {}",
        lib::config::non_empty(&config.whatsapp.phone_number_id).unwrap_or("unset")
    );
    println!("app secret:       {}", set(&config.whatsapp.app_secret));
    println!("ai backend:       {}", config.ai.backend.name());
    println!(
        "ai url:           {}",
        lib::config::non_empty(&config.ai.url).unwrap_or("unset")
    );
    println!("ai api key:       {}", set(&config.ai.api_key));

    let missing = config.missing_settings();
    if missing.is_empty() {
        println!("all required settings present");
        Ok(true)
    } else {
        println!("missing: {}", missing.join(", "));
        Ok(false)
    }
}
