use crate::config::toml_config::{SubmissionConfig, TomlConfig};
use crate::core::form::{FormField, FormState};
use crate::utils::error::Result;
use crate::utils::validation::Validate;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Clone, Parser)]
#[command(name = "postbox")]
#[command(about = "Create a post, and its subreddit if needed, through the GraphQL backend")]
pub struct CliConfig {
    #[arg(long, help = "TOML configuration file")]
    pub config: Option<PathBuf>,

    #[arg(long, env = "POSTBOX_GRAPHQL_ENDPOINT")]
    pub endpoint: Option<String>,

    #[arg(long, env = "STEPZEN_API_KEY", hide_env_values = true)]
    pub api_key: Option<String>,

    #[arg(long, help = "Timeout for each remote call, in seconds")]
    pub timeout_seconds: Option<u64>,

    #[arg(long, default_value = "")]
    pub title: String,

    #[arg(long)]
    pub body: Option<String>,

    #[arg(long, help = "Image URL attached to the post")]
    pub image: Option<String>,

    #[arg(long, default_value = "", help = "Subreddit to post in, created if missing")]
    pub topic: String,

    #[arg(long, help = "Subreddit implied by the current page; overrides --topic")]
    pub fixed_topic: Option<String>,

    #[arg(long, env = "POSTBOX_USER", help = "Signed-in user handle")]
    pub user: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,

    #[arg(long, help = "Emit logs as JSON lines")]
    pub json_logs: bool,
}

impl CliConfig {
    /// TOML file (or defaults) with command-line overrides applied, validated.
    pub fn settings(&self) -> Result<TomlConfig> {
        let mut settings = match &self.config {
            Some(path) => TomlConfig::from_file(path)?,
            None => TomlConfig::default(),
        };

        if let Some(endpoint) = &self.endpoint {
            settings.graphql.endpoint = endpoint.clone();
        }
        if let Some(api_key) = &self.api_key {
            settings.graphql.api_key = Some(api_key.clone());
        }
        if let Some(timeout) = self.timeout_seconds {
            settings
                .submission
                .get_or_insert_with(SubmissionConfig::default)
                .call_timeout_seconds = Some(timeout);
        }

        settings.validate()?;
        Ok(settings)
    }

    /// `(verbose, json)` logging switches: either the flag or the file's
    /// `[logging]` table turns a switch on.
    pub fn log_flags(&self, settings: &TomlConfig) -> (bool, bool) {
        (
            self.verbose || settings.verbose(),
            self.json_logs || settings.json_logs(),
        )
    }

    /// The form as a user would have filled it in.
    pub fn form_state(&self) -> FormState {
        let mut form = FormState::new();
        form.set_field(FormField::Title, self.title.as_str());
        form.set_field(FormField::Topic, self.topic.as_str());
        if let Some(body) = &self.body {
            form.set_field(FormField::Body, body.as_str());
        }
        if let Some(image) = &self.image {
            form.toggle_image_panel();
            form.set_field(FormField::ImageUrl, image.as_str());
        }
        form
    }
}
