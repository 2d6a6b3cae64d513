//! Entrypoint for the `imgshift` binary.

#[tokio::main]
async fn main() {
    let code = imgshift_cli::run().await;
    std::process::exit(code);
}
