#[tokio::main]
async fn main() {
    if let Err(err) = pm_api::run().await {
        eprintln!("pm-api failed to start: {err}");
        std::process::exit(1);
    }
}
