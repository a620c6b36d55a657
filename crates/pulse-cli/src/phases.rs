//! Enrichment and normalization phase handlers.

use pulse_core::AppConfig;
use pulse_nlp::{BosonNlpClient, EnrichSummary, Enricher, RateLimiter, TokenPool};
use pulse_normalize::JoinSummary;

/// Pool name reported when every NLP token is rate limited.
pub(crate) const NLP_POOL: &str = "boson";

/// Enrich every harvested post and comment file of the configured company.
///
/// # Errors
///
/// Returns an error if no NLP tokens are configured, a file cannot be
/// enriched, or the token pool is exhausted.
pub(crate) async fn run_enrich(config: &AppConfig) -> anyhow::Result<EnrichSummary> {
    let pool = TokenPool::new(NLP_POOL, config.nlp_tokens.clone())
        .map_err(|e| anyhow::anyhow!("{e} (set PULSE_NLP_TOKENS)"))?;
    let analyzer = BosonNlpClient::new(
        &config.nlp_base_url,
        config.http_timeout_secs,
        &config.user_agent,
    )?;

    let mut enricher = Enricher::new(&analyzer, RateLimiter::new(pool))
        .with_top_k(config.nlp_top_k)
        .with_batch_size(config.batch_size);
    let summary = enricher.enrich_company(&config.company_dir()).await?;

    println!(
        "enriched {} files: {} rows in, {} rows out",
        summary.files, summary.input_rows, summary.output_rows
    );
    Ok(summary)
}

/// Join the enriched files of the configured company into the canonical
/// outputs.
///
/// # Errors
///
/// Returns an error if an enriched file cannot be read or bound to its
/// column map, or an output cannot be written.
pub(crate) fn run_normalize(config: &AppConfig) -> anyhow::Result<JoinSummary> {
    let dir = config.company_dir();
    let summary = pulse_normalize::join_all(&dir, &config.company, config.batch_size)?;

    println!(
        "joined {} files into {}: {} posts, {} comments",
        summary.files,
        dir.display(),
        summary.posts,
        summary.comments
    );
    if summary.skipped_files > 0 {
        println!("skipped {} files without a column map", summary.skipped_files);
    }
    Ok(summary)
}
