//! Provider Registry
//!
//! Opens every configured provider as one scoped unit and guarantees that
//! each opened connection is released exactly once, on success and on error
//! paths alike.

use anyhow::Result;
use serde_json::{Map, Value};
use std::collections::HashSet;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

use super::channel::{OperationSpec, ProviderChannel, ProviderLauncher};
use super::config::ProviderConfig;
use crate::core::RegistryError;
use crate::tools::ToolInvocationResult;

/// A live connection to one provider
pub struct ProviderConnection {
    config: ProviderConfig,
    channel: Arc<dyn ProviderChannel>,

    /// Serializes calls from concurrent turns
    call_lock: Mutex<()>,

    released: AtomicBool,
}

impl std::fmt::Debug for ProviderConnection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ProviderConnection")
            .field("name", &self.config.name)
            .field("released", &self.is_released())
            .finish()
    }
}

impl ProviderConnection {
    pub fn new(config: ProviderConfig, channel: Arc<dyn ProviderChannel>) -> Self {
        Self {
            config,
            channel,
            call_lock: Mutex::new(()),
            released: AtomicBool::new(false),
        }
    }

    /// Provider name
    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    pub fn is_released(&self) -> bool {
        self.released.load(Ordering::SeqCst)
    }

    /// List the provider's operations
    pub async fn list_operations(&self) -> Result<Vec<OperationSpec>> {
        let _guard = self.call_lock.lock().await;
        self.channel.list_operations().await
    }

    /// Invoke one operation, waiting for any call already in flight
    pub async fn invoke(
        &self,
        operation: &str,
        arguments: Map<String, Value>,
    ) -> Result<ToolInvocationResult> {
        let _guard = self.call_lock.lock().await;
        self.channel.invoke(operation, arguments).await
    }

    /// Release the connection; later calls are no-ops
    pub async fn release(&self) -> Result<(), RegistryError> {
        if self.released.swap(true, Ordering::SeqCst) {
            tracing::debug!("[ProviderRegistry] '{}' already released", self.name());
            return Ok(());
        }

        tracing::info!("[ProviderRegistry] Releasing '{}'", self.name());
        self.channel
            .close()
            .await
            .map_err(|e| RegistryError::ProviderReleaseFailed {
                name: self.name().to_string(),
                cause: format!("{:#}", e),
            })
    }
}

/// Owns the connections of all enabled providers
pub struct ProviderRegistry {
    /// Opened connections in configuration order
    connections: Vec<Arc<ProviderConnection>>,

    closed: AtomicBool,
}

impl ProviderRegistry {
    /// Open a connection for every enabled provider, in configuration order
    ///
    /// If any launch fails, every connection opened so far is released (most
    /// recent first) before the launch error is returned.
    pub async fn open(
        configs: &[ProviderConfig],
        launcher: &dyn ProviderLauncher,
    ) -> Result<Self, RegistryError> {
        let mut seen = HashSet::new();
        for config in configs.iter().filter(|c| c.enabled) {
            if !seen.insert(config.name.as_str()) {
                return Err(RegistryError::DuplicateProvider(config.name.clone()));
            }
        }

        let mut connections: Vec<Arc<ProviderConnection>> = Vec::new();

        for config in configs {
            if !config.enabled {
                tracing::info!(
                    "[ProviderRegistry] Skipping disabled provider '{}'",
                    config.name
                );
                continue;
            }

            match launcher.launch(config).await {
                Ok(channel) => {
                    tracing::info!("[ProviderRegistry] Opened provider '{}'", config.name);
                    connections.push(Arc::new(ProviderConnection::new(config.clone(), channel)));
                }
                Err(e) => {
                    tracing::error!(
                        "[ProviderRegistry] Failed to open provider '{}': {:#}",
                        config.name,
                        e
                    );
                    release_all(&connections).await;
                    return Err(RegistryError::ProviderLaunchFailed {
                        name: config.name.clone(),
                        cause: format!("{:#}", e),
                    });
                }
            }
        }

        tracing::info!(
            "[ProviderRegistry] {} provider(s) open",
            connections.len()
        );

        Ok(Self {
            connections,
            closed: AtomicBool::new(false),
        })
    }

    /// Open the registry, run `f`, then close the registry whatever `f` returned
    pub async fn with_open<F, Fut, T>(
        configs: &[ProviderConfig],
        launcher: &dyn ProviderLauncher,
        f: F,
    ) -> Result<T, RegistryError>
    where
        F: FnOnce(Arc<ProviderRegistry>) -> Fut,
        Fut: Future<Output = T>,
    {
        let registry = Arc::new(Self::open(configs, launcher).await?);
        let output = f(registry.clone()).await;
        registry.close().await;
        Ok(output)
    }

    /// Opened connections in configuration order
    pub fn connections(&self) -> &[Arc<ProviderConnection>] {
        &self.connections
    }

    /// Get a connection by provider name
    pub fn get(&self, name: &str) -> Option<Arc<ProviderConnection>> {
        self.connections.iter().find(|c| c.name() == name).cloned()
    }

    pub fn len(&self) -> usize {
        self.connections.len()
    }

    pub fn is_empty(&self) -> bool {
        self.connections.is_empty()
    }

    pub fn is_closed(&self) -> bool {
        self.closed.load(Ordering::SeqCst)
    }

    /// Release every connection
    ///
    /// Release failures are logged and returned; they never stop the
    /// remaining releases. Closing an already closed registry does nothing.
    pub async fn close(&self) -> Vec<RegistryError> {
        if self.closed.swap(true, Ordering::SeqCst) {
            return Vec::new();
        }
        release_all(&self.connections).await
    }
}

impl Drop for ProviderRegistry {
    fn drop(&mut self) {
        if !self.is_closed() && self.connections.iter().any(|c| !c.is_released()) {
            tracing::warn!(
                "[ProviderRegistry] Dropped without close(); provider processes are killed on drop"
            );
        }
    }
}

/// Release connections most recent first, collecting failures
async fn release_all(connections: &[Arc<ProviderConnection>]) -> Vec<RegistryError> {
    let mut failures = Vec::new();

    for connection in connections.iter().rev() {
        if let Err(e) = connection.release().await {
            tracing::warn!("[ProviderRegistry] {}", e);
            failures.push(e);
        }
    }

    failures
}
