use std::{sync::Arc, time::Duration};

use polyglot_core::config::{AppConfig, ConfigError, LoadOptions};
use polyglot_core::LanguageResolver;
use polyglot_deepl::{DeepLClient, DeepLError};
use polyglot_slack::{
    translation_dispatcher, ReconnectPolicy, SlackWebClient, SocketModeRunner,
    TranslationServices, WebSocketTransport,
};
use thiserror::Error;
use tracing::info;

const SLACK_HTTP_TIMEOUT_SECS: u64 = 30;

pub struct Application {
    pub config: AppConfig,
    pub translator: Arc<DeepLClient>,
    pub slack_runner: SocketModeRunner,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("translation client setup failed: {0}")]
    Translator(#[from] DeepLError),
    #[error("slack http client setup failed: {0}")]
    SlackHttp(#[source] reqwest::Error),
}

pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    info!(
        event_name = "system.bootstrap.start",
        correlation_id = "bootstrap",
        "starting application bootstrap"
    );

    let translator = Arc::new(DeepLClient::new(&config.deepl)?);
    info!(
        event_name = "system.bootstrap.translator_ready",
        correlation_id = "bootstrap",
        endpoint = translator.endpoint(),
        "translation client ready"
    );

    let http = reqwest::Client::builder()
        .timeout(Duration::from_secs(SLACK_HTTP_TIMEOUT_SECS))
        .build()
        .map_err(BootstrapError::SlackHttp)?;
    let slack = SlackWebClient::new(
        http.clone(),
        config.slack.bot_token.clone(),
        config.slack.api_base_url.clone(),
    );

    let services = TranslationServices::new(
        Arc::new(slack),
        translator.clone(),
        LanguageResolver::default(),
    );
    let transport = WebSocketTransport::new(
        http,
        config.slack.app_token.clone(),
        config.slack.api_base_url.clone(),
    );
    let slack_runner = SocketModeRunner::new(
        Arc::new(transport),
        translation_dispatcher(services),
        ReconnectPolicy::from(&config.socket),
    );
    info!(
        event_name = "system.bootstrap.slack_ready",
        correlation_id = "bootstrap",
        max_retries = config.socket.max_retries,
        "slack socket mode runner ready"
    );

    Ok(Application { config, translator, slack_runner })
}
