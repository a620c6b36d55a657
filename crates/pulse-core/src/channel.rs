use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::schema::{COMMENT_FIELDS, POST_FIELDS};

/// A supported social platform.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Channel {
    Facebook,
    Twitter,
    LinkedIn,
    Instagram,
    Weibo,
}

impl Channel {
    pub const ALL: [Channel; 5] = [
        Channel::Facebook,
        Channel::Twitter,
        Channel::LinkedIn,
        Channel::Instagram,
        Channel::Weibo,
    ];

    /// Lowercase tag used in file names.
    #[must_use]
    pub fn tag(self) -> &'static str {
        match self {
            Channel::Facebook => "facebook",
            Channel::Twitter => "twitter",
            Channel::LinkedIn => "linkedin",
            Channel::Instagram => "instagram",
            Channel::Weibo => "weibo",
        }
    }

    /// Display name: the per-platform output directory and the value of the
    /// canonical `channel` column.
    #[must_use]
    pub fn dir_name(self) -> &'static str {
        match self {
            Channel::Facebook => "Facebook",
            Channel::Twitter => "Twitter",
            Channel::LinkedIn => "LinkedIn",
            Channel::Instagram => "Instagram",
            Channel::Weibo => "Weibo",
        }
    }

    /// File name of one harvested record kind, e.g. `acme_twitter_tweet.csv`.
    #[must_use]
    pub fn file_name(self, name: &str, kind: RecordKind) -> String {
        format!("{name}_{}_{}.csv", self.tag(), kind.file_tag(self))
    }

    /// File name of an account-level report, e.g. `acme_facebook_insights.csv`.
    ///
    /// Reports are not records: [`parse_file_name`] does not recognize them,
    /// so enrichment and joining pass them by.
    #[must_use]
    pub fn report_file_name(self, name: &str, report: &str) -> String {
        format!("{name}_{}_{report}.csv", self.tag())
    }
}

impl std::fmt::Display for Channel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.tag())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("unknown channel: {0}")]
pub struct UnknownChannel(pub String);

impl FromStr for Channel {
    type Err = UnknownChannel;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "facebook" | "fb" => Ok(Channel::Facebook),
            "twitter" => Ok(Channel::Twitter),
            "linkedin" => Ok(Channel::LinkedIn),
            "instagram" | "ig" => Ok(Channel::Instagram),
            "weibo" => Ok(Channel::Weibo),
            _ => Err(UnknownChannel(s.to_string())),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RecordKind {
    Profile,
    Post,
    Comment,
}

impl RecordKind {
    /// Twitter and Weibo call their posts tweets.
    #[must_use]
    pub fn file_tag(self, channel: Channel) -> &'static str {
        match (self, channel) {
            (RecordKind::Profile, _) => "profile",
            (RecordKind::Post, Channel::Twitter | Channel::Weibo) => "tweet",
            (RecordKind::Post, _) => "post",
            (RecordKind::Comment, _) => "comment",
        }
    }

    /// Ordered canonical header for joined output of this kind.
    ///
    /// Profiles have no canonical form and return an empty slice.
    #[must_use]
    pub fn canonical_fields(self) -> &'static [&'static str] {
        match self {
            RecordKind::Profile => &[],
            RecordKind::Post => &POST_FIELDS,
            RecordKind::Comment => &COMMENT_FIELDS,
        }
    }
}

/// Splits a harvested file name of the form `<name>_<platform>_<kind>[_nlp].csv`.
///
/// Returns the platform and record kind, or `None` if the name does not follow
/// the layout.
#[must_use]
pub fn parse_file_name(file_name: &str) -> Option<(Channel, RecordKind)> {
    let stem = file_name.strip_suffix(".csv")?;
    let stem = stem.strip_suffix("_nlp").unwrap_or(stem);
    let mut parts = stem.rsplitn(3, '_');
    let kind = match parts.next()? {
        "post" | "tweet" => RecordKind::Post,
        "comment" => RecordKind::Comment,
        "profile" => RecordKind::Profile,
        _ => return None,
    };
    let channel = parts.next()?.parse().ok()?;
    // a name segment must precede the platform
    parts.next().filter(|name| !name.is_empty())?;
    Some((channel, kind))
}
