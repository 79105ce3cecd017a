use std::sync::Arc;

use propflow_core::config::{AppConfig, ConfigError, LoadOptions};
use propflow_core::workflow::Orchestrator;
use propflow_hubspot::HubspotClient;
use propflow_llm::AnthropicClient;
use propflow_slack::ResultNotifier;
use thiserror::Error;
use tracing::info;

pub struct Application {
    pub config: AppConfig,
    pub orchestrator: Arc<Orchestrator>,
    pub notifier: Arc<ResultNotifier>,
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("client construction failed: {0}")]
    Client(#[source] anyhow::Error),
}

/// Builds the one orchestrator and its clients from validated configuration.
/// Missing credentials fail here, before the server accepts any request.
pub fn bootstrap(options: LoadOptions) -> Result<Application, BootstrapError> {
    let config = AppConfig::load(options)?;
    bootstrap_with_config(config)
}

pub fn bootstrap_with_config(config: AppConfig) -> Result<Application, BootstrapError> {
    let crm = HubspotClient::new(&config.hubspot).map_err(BootstrapError::Client)?;
    let llm = AnthropicClient::new(&config.llm).map_err(BootstrapError::Client)?;
    let notifier = ResultNotifier::new().map_err(BootstrapError::Client)?;

    let orchestrator =
        Orchestrator::new(config.hubspot.portal_id.clone(), Arc::new(crm), Arc::new(llm));
    info!(portal_id = %config.hubspot.portal_id, "application bootstrapped");

    Ok(Application { config, orchestrator: Arc::new(orchestrator), notifier: Arc::new(notifier) })
}
