use std::path::PathBuf;
use std::time::Duration;

use clap::Args;
use url::Url;

use common::crypto::{derive_app_key, SecretKey};
use common::publish::{PublishOptions, Publisher, PARALLEL_UPLOADS_DEFAULT};
use common::registry::{publish_resolver, RegistryNode};
use common::storage::PortalClient;

use crate::config::{self, ConfigError};

/// How long to wait for the first registry peer before giving up
const PEER_WAIT_TIMEOUT: Duration = Duration::from_secs(30);

#[derive(Args, Debug, Clone)]
pub struct Publish {
    /// Directory to publish (or set DIR)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Max uploads in flight (or set PARALLEL_UPLOADS, default 10)
    #[arg(long)]
    pub parallel: Option<usize>,

    /// Portal base URL (or set PORTAL_URL)
    #[arg(long)]
    pub portal: Option<Url>,

    /// App name recorded in the manifest
    #[arg(long)]
    pub name: Option<String>,

    /// Error page mapping, repeatable: --error-page 404=/404.html
    #[arg(long = "error-page", value_name = "CODE=PATH")]
    pub error_pages: Vec<String>,

    /// Registry bootstrap node ids (or set APP_BOOTSTRAP)
    #[arg(long)]
    pub bootstrap: Vec<String>,
}

#[derive(Debug, thiserror::Error)]
pub enum PublishOpError {
    #[error(transparent)]
    Config(#[from] ConfigError),
    #[error("portal login failed: {0}")]
    Login(common::storage::StorageError),
    #[error("publish failed: {0}")]
    Publish(#[from] common::publish::PublishError),
    #[error("registry publish failed: {0}")]
    Registry(#[from] common::registry::RegistryError),
}

impl Publish {
    fn parallelism(&self, env: &config::EnvConfig) -> Result<usize, ConfigError> {
        match self.parallel {
            Some(n) if n >= 1 => Ok(n),
            Some(n) => Err(ConfigError::InvalidParallelism(n.to_string())),
            None => env
                .parallel_uploads
                .as_deref()
                .map(config::parse_parallelism)
                .transpose()
                .map(|n| n.unwrap_or(PARALLEL_UPLOADS_DEFAULT)),
        }
    }

    fn options(&self) -> Result<PublishOptions, ConfigError> {
        let mut options = PublishOptions {
            name: self.name.clone(),
            error_pages: Vec::with_capacity(self.error_pages.len()),
        };
        for raw in &self.error_pages {
            options.error_pages.push(config::parse_error_page(raw)?);
        }
        Ok(options)
    }
}

#[async_trait::async_trait]
impl crate::op::Op for Publish {
    type Error = PublishOpError;
    type Output = String;

    async fn execute(&self, ctx: &crate::op::OpContext) -> Result<Self::Output, Self::Error> {
        let env = &ctx.env;

        // Validate all input before the first byte moves
        let dir = self
            .dir
            .clone()
            .or_else(|| env.dir.clone())
            .ok_or(ConfigError::MissingDir)?;
        let portal_key = config::portal_key(env.portal_private_key.as_deref())?;
        let parallelism = self.parallelism(env)?;
        let portal_url = match &self.portal {
            Some(url) => url.clone(),
            None => config::portal_url(env.portal_url.as_deref())?,
        };
        let options = self.options()?;
        let app_key: Option<SecretKey> = env
            .app_seed
            .as_deref()
            .map(derive_app_key)
            .transpose()
            .map_err(ConfigError::from)?;

        tracing::debug!(
            "publishing {} through {} ({} uploads in flight)",
            dir.display(),
            portal_url,
            parallelism
        );
        let portal = PortalClient::new(portal_url, portal_key);
        portal.login().await.map_err(PublishOpError::Login)?;

        let publisher = Publisher::new(portal).with_parallelism(parallelism);
        let report = publisher.publish(&dir, &options).await?;

        let mut output = format!("Web app published: {}", report.manifest_cid);

        // With a derived key, point the key's registry slot at the new
        // manifest; without one we are done
        if let Some(app_key) = app_key {
            let bootstrap = config::resolve_bootstrap(&self.bootstrap, env.bootstrap.as_deref())?;
            let node = RegistryNode::builder()
                .secret_key(app_key.clone())
                .bootstrap(bootstrap)
                .spawn()
                .await?;

            // The node comes down whether or not the entry lands
            let result = async {
                node.wait_for_peer(PEER_WAIT_TIMEOUT).await?;
                publish_resolver(&node, &app_key, &report.manifest_cid).await
            }
            .await;
            node.shutdown().await;

            let resolver_cid = result?;
            output.push_str(&format!("\nResolver entry published: {}", resolver_cid));
        }

        Ok(output)
    }
}
