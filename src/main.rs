use std::process::ExitCode;
use tracing::error;

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    match pricewatch::run().await {
        Ok(summary) if summary.persisted_any() => ExitCode::SUCCESS,
        Ok(_) => {
            error!("Run finished without persisting any observations");
            ExitCode::FAILURE
        }
        Err(e) => {
            eprintln!("pricewatch: {:#}", e);
            ExitCode::FAILURE
        }
    }
}
