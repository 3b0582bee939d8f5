//! Client handles for topics and subscriptions.
//!
//! A [`Client`] binds a project to a [`ResourceApi`] and hands out
//! [`Topic`] and [`Subscription`] handles. Handles are cheap to create and
//! perform no I/O until one of their operations is awaited.

mod listener;
mod subscription;
mod topic;

pub use listener::{Listener, StopHandle};
pub use subscription::Subscription;
pub use topic::Topic;

use std::sync::Arc;

use crate::api::{BearerToken, HttpApi, NoAuth, ResourceApi};
use crate::config::Config;
use crate::error::Result;
use crate::names;

/// Entry point bound to one project.
#[derive(Clone)]
pub struct Client {
    project: Arc<str>,
    api: Arc<dyn ResourceApi>,
}

impl Client {
    /// Create a client over any resource control implementation.
    pub fn new(project: impl Into<String>, api: impl ResourceApi) -> Result<Self> {
        Self::with_api(project, Arc::new(api))
    }

    /// Create a client sharing an existing API instance.
    pub fn with_api(project: impl Into<String>, api: Arc<dyn ResourceApi>) -> Result<Self> {
        let project = project.into();
        names::validate("project", &project)?;
        Ok(Self {
            project: project.into(),
            api,
        })
    }

    /// Create an HTTP client from configuration.
    pub fn from_config(config: &Config) -> Result<Self> {
        let http = config.to_http_config();
        let api = match &config.token {
            Some(token) => HttpApi::new(http, BearerToken::new(token.clone()))?,
            None => HttpApi::new(http, NoAuth)?,
        };
        Self::new(config.project.clone(), api)
    }

    pub fn project(&self) -> &str {
        &self.project
    }

    /// Handle for the named topic in this project.
    pub fn topic(&self, name: impl Into<String>) -> Topic {
        Topic::new(self.project.clone(), name.into(), self.api.clone())
    }

    /// Handle for the named subscription in this project.
    pub fn subscription(&self, name: impl Into<String>) -> Subscription {
        Subscription::new(self.project.clone(), name.into(), self.api.clone())
    }
}

impl std::fmt::Debug for Client {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Client")
            .field("project", &self.project)
            .finish_non_exhaustive()
    }
}
