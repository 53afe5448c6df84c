use clap::Parser;
use precon::{
    partition_inputs, AssessmentClient, Config, CostEstimator, DocxRenderer, ReportBuilder,
    ReqwestHttpClient, RetryPolicy, RunId,
};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Initialize tracing
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "precon=info".into()),
        )
        .init();

    let args = precon::Args::parse();
    let config = Config::load(&args)?;

    // Credential gate: the pipeline entry point requires the session object
    let session = precon::authenticate(&config.auth, &args.username, &args.password)?;

    let (images, rejected) = partition_inputs(args.images.clone());
    for reject in &rejected {
        eprintln!("Skipping `{}`: {}", reject.path.display(), reject.error);
    }
    if images.is_empty() {
        anyhow::bail!("no valid images to process (.jpg/.jpeg/.png only)");
    }
    println!(
        "Processing {} image(s) ({} rejected)",
        images.len(),
        rejected.len()
    );

    let client = AssessmentClient::new(ReqwestHttpClient::new(), config.api.clone());
    let retry = RetryPolicy::new(config.retry.clone());
    let estimator = CostEstimator::for_model(&config.api.model, &config.pricing)?;
    let builder = ReportBuilder::new(client, retry, estimator, config.report.clone());

    let run_id = RunId::new();
    let renderer = DocxRenderer::new(&config.report, &run_id)?;
    let result = builder.run(&session, run_id, &images, renderer).await?;

    println!("Report generated!");
    println!("  File: {}", result.artifact_path.display());
    println!(
        "  Entries: {} ({} with fallback captions)",
        result.entries, result.failures
    );
    println!("  Estimated API cost: ${}", result.total_cost);

    Ok(())
}
