mod cli;

#[tokio::main]
async fn main() {
    match cli::run() {
        cli::RunOutcome::Serve(config) => {
            weatherly::init_tracing();
            if let Err(err) = weatherly::serve(config).await {
                tracing::error!(%err, "weatherly stopped");
                std::process::exit(1);
            }
        }
        cli::RunOutcome::Exit(code) => std::process::exit(code),
    }
}
