use clap::Parser;
use tokengate::main_helper::run_pipeline;
use tokengate::Args;

fn main() -> tokengate::Result<()> {
    use tracing_subscriber::prelude::*;

    let filter = match tracing_subscriber::EnvFilter::try_from_default_env() {
        Ok(f) => f,
        Err(_) => "tokengate=info".into(),
    };

    // Records go to stdout; logs stay on stderr.
    tracing_subscriber::registry()
        .with(filter)
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let args = Args::parse();
    let summary = run_pipeline(&args)?;
    tracing::debug!(
        records_in = summary.records_in,
        records_out = summary.records_out,
        "stream complete"
    );
    Ok(())
}
