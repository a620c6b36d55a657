//! Harvest phase handler.
//!
//! Platforms run one after another, each with its own HTTP client. A platform
//! that fails is logged and the remaining platforms still run; the phase
//! reports the failure once every platform has been attempted.

use pulse_core::{AppConfig, Channel, SourcesFile};
use pulse_scraper::{
    FacebookHarvester, HarvestSettings, HarvestSummary, HttpClient, InstagramHarvester,
    LinkedInHarvester, ScraperError, TwitterHarvester, WeiboHarvester,
};

/// Whether `sources` has a section for `channel`.
pub(crate) fn configured(sources: &SourcesFile, channel: Channel) -> bool {
    match channel {
        Channel::Facebook => sources.facebook.is_some(),
        Channel::Twitter => sources.twitter.is_some(),
        Channel::LinkedIn => sources.linkedin.is_some(),
        Channel::Instagram => sources.instagram.is_some(),
        Channel::Weibo => sources.weibo.is_some(),
    }
}

/// Platforms to harvest, in harvest order.
///
/// # Errors
///
/// Returns an error if `only` names a platform without a sources section.
pub(crate) fn selected(sources: &SourcesFile, only: Option<Channel>) -> anyhow::Result<Vec<Channel>> {
    if let Some(channel) = only {
        if !configured(sources, channel) {
            anyhow::bail!("no sources configured for {channel}");
        }
        return Ok(vec![channel]);
    }
    Ok(Channel::ALL
        .into_iter()
        .filter(|c| configured(sources, *c))
        .collect())
}

fn credential(value: Option<&str>, channel: Channel, var: &str) -> Result<String, ScraperError> {
    value
        .map(str::to_owned)
        .ok_or_else(|| ScraperError::MissingCredential {
            channel: channel.to_string(),
            var: var.to_owned(),
        })
}

async fn harvest_one(
    config: &AppConfig,
    settings: &HarvestSettings,
    sources: &SourcesFile,
    channel: Channel,
) -> Result<Option<HarvestSummary>, ScraperError> {
    let summary = match channel {
        Channel::Facebook => {
            let Some(target) = &sources.facebook else {
                return Ok(None);
            };
            let token = credential(
                config.facebook_access_token.as_deref(),
                channel,
                "FACEBOOK_ACCESS_TOKEN",
            )?;
            let client = HttpClient::from_config(config)?;
            FacebookHarvester::new(&client, settings, target, token)
                .run()
                .await?
        }
        Channel::Twitter => {
            let Some(target) = &sources.twitter else {
                return Ok(None);
            };
            let token = credential(
                config.twitter_bearer_token.as_deref(),
                channel,
                "TWITTER_BEARER_TOKEN",
            )?;
            let client = HttpClient::from_config(config)?.with_bearer(token);
            TwitterHarvester::new(&client, settings, target).run().await?
        }
        Channel::LinkedIn => {
            let Some(target) = &sources.linkedin else {
                return Ok(None);
            };
            let token = credential(
                config.linkedin_access_token.as_deref(),
                channel,
                "LINKEDIN_ACCESS_TOKEN",
            )?;
            let client = HttpClient::from_config(config)?;
            LinkedInHarvester::new(&client, settings, target, token)
                .run()
                .await?
        }
        Channel::Instagram => {
            let Some(target) = &sources.instagram else {
                return Ok(None);
            };
            let token = credential(
                config.instagram_access_token.as_deref(),
                channel,
                "INSTAGRAM_ACCESS_TOKEN",
            )?;
            let client = HttpClient::from_config(config)?;
            InstagramHarvester::new(&client, settings, target, token)
                .run()
                .await?
        }
        Channel::Weibo => {
            let Some(target) = &sources.weibo else {
                return Ok(None);
            };
            let client = HttpClient::from_config(config)?;
            WeiboHarvester::new(&client, settings, target).run().await?
        }
    };
    Ok(Some(summary))
}

/// Harvest every selected platform into the company directory.
///
/// When `dry_run` is `true` the selected platforms are printed and nothing is
/// fetched.
///
/// # Errors
///
/// Returns an error if the platform filter cannot be satisfied, or after all
/// platforms have run if any of them failed.
pub(crate) async fn run_harvest(
    config: &AppConfig,
    sources: &SourcesFile,
    only: Option<Channel>,
    dry_run: bool,
) -> anyhow::Result<Vec<HarvestSummary>> {
    let channels = selected(sources, only)?;

    if dry_run {
        let names: Vec<&str> = channels.iter().map(|c| c.dir_name()).collect();
        println!(
            "dry-run: would harvest {} platforms for {}: [{}]",
            channels.len(),
            config.company,
            names.join(", ")
        );
        return Ok(Vec::new());
    }

    let settings = HarvestSettings::from_config(config);
    let mut summaries = Vec::with_capacity(channels.len());
    let mut failed: Vec<Channel> = Vec::new();

    for channel in channels {
        tracing::info!(%channel, company = %config.company, "harvest starting");
        match harvest_one(config, &settings, sources, channel).await {
            Ok(Some(summary)) => {
                if summary.reaction_drift > 0 {
                    tracing::warn!(
                        %channel,
                        rows = summary.reaction_drift,
                        "reaction totals smaller than the sum of known kinds"
                    );
                }
                println!(
                    "{}: {} profiles, {} posts, {} comments, {} report rows",
                    channel.dir_name(),
                    summary.profiles,
                    summary.posts,
                    summary.comments,
                    summary.reports
                );
                summaries.push(summary);
            }
            Ok(None) => {}
            Err(e) => {
                tracing::error!(%channel, error = %e, "harvest failed");
                eprintln!("error: failed to harvest {}: {e}", channel.dir_name());
                failed.push(channel);
            }
        }
    }

    if !failed.is_empty() {
        let names: Vec<&str> = failed.iter().map(|c| c.dir_name()).collect();
        anyhow::bail!("harvest failed for: {}", names.join(", "));
    }
    Ok(summaries)
}
