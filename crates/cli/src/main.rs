use std::process::ExitCode;

#[tokio::main]
async fn main() -> ExitCode {
    mercabot_cli::run().await
}
