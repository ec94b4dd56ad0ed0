use clap::Parser;

#[tokio::main]
async fn main() {
    let cli = hookpit::cli::Cli::parse();
    if let Err(e) = hookpit::cmd::dispatch(cli).await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}
