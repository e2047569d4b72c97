use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;
use weatherly::config::{
    AppConfig, DEFAULT_PORT, DEFAULT_STORE_PATH, DEFAULT_VAPID_SUBJECT, WeatherApiConfig,
};
use weatherly::push::{VapidConfigStatus, load_vapid_config};
use weatherly::weather::DEFAULT_WEATHER_API_URL;

#[allow(clippy::large_enum_variant)]
pub(crate) enum RunOutcome {
    Serve(AppConfig),
    Exit(i32),
}

pub(crate) fn run() -> RunOutcome {
    let cli = Cli::parse();
    if let Some(Command::Init(args)) = cli.command {
        let code = run_init(args);
        return RunOutcome::Exit(code);
    }

    match resolve_config(cli) {
        Ok(config) => RunOutcome::Serve(config),
        Err(err) => {
            eprintln!("error: {err}");
            RunOutcome::Exit(2)
        }
    }
}

#[derive(Parser, Debug)]
#[command(
    name = "weatherly",
    version,
    about = "Two-hourly weather push notifications"
)]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
    #[arg(long, env = "WEATHERLY_WEATHER_API_KEY")]
    weather_api_key: Option<String>,
    #[arg(long, env = "WEATHERLY_WEATHER_API_URL", default_value = DEFAULT_WEATHER_API_URL)]
    weather_api_url: String,
    #[arg(long, env = "WEATHERLY_VAPID_PRIVATE_KEY")]
    vapid_private_key: Option<String>,
    #[arg(long, env = "WEATHERLY_VAPID_PUBLIC_KEY")]
    vapid_public_key: Option<String>,
    #[arg(long, env = "WEATHERLY_VAPID_SUBJECT", default_value = DEFAULT_VAPID_SUBJECT)]
    vapid_subject: String,
    #[arg(long, env = "WEATHERLY_ALLOWED_ORIGIN")]
    allowed_origin: Option<String>,
    #[arg(long, env = "WEATHERLY_PORT", default_value_t = DEFAULT_PORT)]
    port: u16,
    #[arg(long = "store", env = "WEATHERLY_STORE", default_value = DEFAULT_STORE_PATH)]
    store_path: PathBuf,
}

#[derive(Subcommand, Debug)]
enum Command {
    Init(InitArgs),
}

#[derive(Args, Debug)]
struct InitArgs {
    #[arg(long)]
    subject: Option<String>,
}

fn run_init(args: InitArgs) -> i32 {
    let credentials = match weatherly::generate_vapid_credentials() {
        Ok(credentials) => credentials,
        Err(err) => {
            eprintln!("failed to generate VAPID credentials: {err}");
            return 1;
        }
    };
    let (subject, show_subject_note) = match args.subject {
        Some(subject) => (subject, false),
        None => (DEFAULT_VAPID_SUBJECT.to_string(), true),
    };

    println!("VAPID credentials generated.");
    println!();
    println!("WEATHERLY_VAPID_PRIVATE_KEY=\"{}\"", credentials.private_key);
    println!("WEATHERLY_VAPID_PUBLIC_KEY=\"{}\"", credentials.public_key);
    println!("WEATHERLY_VAPID_SUBJECT=\"{subject}\"");
    if show_subject_note {
        println!();
        println!("Note: replace WEATHERLY_VAPID_SUBJECT with a contact URI you control.");
    }
    0
}

fn resolve_config(cli: Cli) -> Result<AppConfig, String> {
    let api_key = cli
        .weather_api_key
        .as_deref()
        .map(str::trim)
        .filter(|key| !key.is_empty())
        .ok_or("--weather-api-key is required")?
        .to_string();

    let base_url = cli.weather_api_url.trim();
    if base_url.is_empty() {
        return Err("weather api url cannot be empty".to_string());
    }

    let vapid = match load_vapid_config(
        cli.vapid_private_key.as_deref(),
        cli.vapid_public_key.as_deref(),
        &cli.vapid_subject,
    ) {
        VapidConfigStatus::Ready(vapid) => vapid,
        VapidConfigStatus::Incomplete => {
            return Err(
                "incomplete VAPID configuration: both --vapid-private-key and --vapid-public-key are required"
                    .to_string(),
            );
        }
        VapidConfigStatus::Missing => {
            return Err(
                "missing VAPID keys; run `weatherly init` to generate a key pair".to_string(),
            );
        }
    };
    if vapid.subject.is_empty() {
        return Err("vapid subject cannot be empty".to_string());
    }

    Ok(AppConfig {
        weather: WeatherApiConfig {
            api_key,
            base_url: base_url.to_string(),
        },
        vapid,
        allowed_origin: cli
            .allowed_origin
            .map(|origin| origin.trim().to_string())
            .filter(|origin| !origin.is_empty()),
        port: cli.port,
        store_path: cli.store_path,
    })
}
