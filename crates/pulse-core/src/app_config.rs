use std::path::PathBuf;

#[derive(Clone)]
pub struct AppConfig {
    /// Shop/company identifier; also the name of the output folder.
    pub company: String,
    pub output_root: PathBuf,
    pub sources_path: PathBuf,
    pub log_level: String,
    pub tz_offset_hours: i32,
    pub batch_size: usize,
    pub page_size: u32,
    pub reply_depth: u8,
    pub max_pages: Option<usize>,
    pub http_timeout_secs: u64,
    pub user_agent: String,
    pub retry_delay_secs: u64,
    pub retry_max_attempts: Option<u32>,
    pub nlp_base_url: String,
    pub nlp_tokens: Vec<String>,
    pub nlp_top_k: usize,
    pub facebook_access_token: Option<String>,
    pub twitter_bearer_token: Option<String>,
    pub instagram_access_token: Option<String>,
    pub linkedin_access_token: Option<String>,
}

impl AppConfig {
    /// Directory holding one sub-folder per platform plus the joined outputs.
    #[must_use]
    pub fn company_dir(&self) -> PathBuf {
        self.output_root.join(&self.company)
    }
}

fn redact(secret: Option<&String>) -> Option<&'static str> {
    secret.map(|_| "[redacted]")
}

impl std::fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AppConfig")
            .field("company", &self.company)
            .field("output_root", &self.output_root)
            .field("sources_path", &self.sources_path)
            .field("log_level", &self.log_level)
            .field("tz_offset_hours", &self.tz_offset_hours)
            .field("batch_size", &self.batch_size)
            .field("page_size", &self.page_size)
            .field("reply_depth", &self.reply_depth)
            .field("max_pages", &self.max_pages)
            .field("http_timeout_secs", &self.http_timeout_secs)
            .field("user_agent", &self.user_agent)
            .field("retry_delay_secs", &self.retry_delay_secs)
            .field("retry_max_attempts", &self.retry_max_attempts)
            .field("nlp_base_url", &self.nlp_base_url)
            .field("nlp_tokens", &format!("[{} redacted]", self.nlp_tokens.len()))
            .field("nlp_top_k", &self.nlp_top_k)
            .field(
                "facebook_access_token",
                &redact(self.facebook_access_token.as_ref()),
            )
            .field(
                "twitter_bearer_token",
                &redact(self.twitter_bearer_token.as_ref()),
            )
            .field(
                "instagram_access_token",
                &redact(self.instagram_access_token.as_ref()),
            )
            .field(
                "linkedin_access_token",
                &redact(self.linkedin_access_token.as_ref()),
            )
            .finish()
    }
}
