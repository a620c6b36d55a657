use super::*;

use pulse_core::{SourcesFile, TwitterSource, WeiboSource};

fn sources() -> SourcesFile {
    SourcesFile {
        twitter: Some(TwitterSource {
            handle: "acme".to_string(),
            user_id: "42".to_string(),
            api_base: None,
        }),
        weibo: Some(WeiboSource {
            uid: "1001".to_string(),
            container_id: "1076031001".to_string(),
            max_pages: 5,
            api_base: None,
        }),
        ..SourcesFile::default()
    }
}

#[test]
fn no_command_is_none() {
    let cli = Cli::try_parse_from(["pulse"]).expect("expected valid cli args");
    assert!(cli.command.is_none());
}

#[test]
fn parses_run_without_filter() {
    let cli = Cli::try_parse_from(["pulse", "run"]).expect("expected valid cli args");
    assert!(matches!(cli.command, Some(Commands::Run { platform: None })));
}

#[test]
fn parses_harvest_with_platform_filter() {
    let cli = Cli::try_parse_from(["pulse", "harvest", "--platform", "weibo"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Harvest {
            platform: Some(Channel::Weibo),
            dry_run: false
        })
    ));
}

#[test]
fn platform_filter_accepts_short_aliases() {
    let cli = Cli::try_parse_from(["pulse", "harvest", "--platform", "FB", "--dry-run"])
        .expect("expected valid cli args");
    assert!(matches!(
        cli.command,
        Some(Commands::Harvest {
            platform: Some(Channel::Facebook),
            dry_run: true
        })
    ));
}

#[test]
fn unknown_platform_is_rejected() {
    assert!(Cli::try_parse_from(["pulse", "harvest", "--platform", "myspace"]).is_err());
}

#[test]
fn parses_enrich_and_normalize() {
    let enrich = Cli::try_parse_from(["pulse", "enrich"]).expect("expected valid cli args");
    assert!(matches!(enrich.command, Some(Commands::Enrich)));
    let normalize = Cli::try_parse_from(["pulse", "normalize"]).expect("expected valid cli args");
    assert!(matches!(normalize.command, Some(Commands::Normalize)));
}

#[test]
fn selection_follows_harvest_order_and_skips_unconfigured() {
    let channels = harvest::selected(&sources(), None).expect("selection failed");
    assert_eq!(channels, [Channel::Twitter, Channel::Weibo]);
}

#[test]
fn filter_on_unconfigured_platform_fails() {
    let err = harvest::selected(&sources(), Some(Channel::LinkedIn)).unwrap_err();
    assert!(err.to_string().contains("linkedin"));
}

#[test]
fn filter_on_configured_platform_selects_only_it() {
    let channels = harvest::selected(&sources(), Some(Channel::Weibo)).expect("selection failed");
    assert_eq!(channels, [Channel::Weibo]);
}
