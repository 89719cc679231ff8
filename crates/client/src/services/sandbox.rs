//! Sandbox lifecycle over a [`SandboxApi`].
//!
//! The orchestrator does all the work; this service only issues actions and
//! polls for the resulting status.

use std::time::Duration;

use glt_core::{SandboxDescriptor, SandboxStatus};
use tracing::{debug, info, instrument};

use crate::api::{ApiError, SandboxAction, SandboxApi};
use crate::error::ClientError;
use crate::services::tokens::TokenStore;

#[derive(Clone)]
pub struct SandboxService<S: SandboxApi + Clone> {
    api: S,
    tokens: TokenStore,
}

impl<S: SandboxApi + Clone> SandboxService<S> {
    #[must_use]
    pub fn new(api: S, tokens: TokenStore) -> Self {
        Self { api, tokens }
    }

    /// Current sandbox descriptor.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the request fails.
    pub async fn status(&self) -> Result<SandboxDescriptor, ClientError> {
        let token = self.access_token()?;
        Ok(self.api.sandbox_status(&token).await?)
    }

    /// Create the user's sandbox.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the orchestrator rejects the action.
    pub async fn create(&self) -> Result<SandboxDescriptor, ClientError> {
        self.perform(SandboxAction::Create).await
    }

    /// # Errors
    ///
    /// Returns an error if not logged in or the orchestrator rejects the action.
    pub async fn pause(&self) -> Result<SandboxDescriptor, ClientError> {
        self.perform(SandboxAction::Pause).await
    }

    /// # Errors
    ///
    /// Returns an error if not logged in or the orchestrator rejects the action.
    pub async fn resume(&self) -> Result<SandboxDescriptor, ClientError> {
        self.perform(SandboxAction::Resume).await
    }

    /// Rebuild the sandbox from a clean image.
    ///
    /// # Errors
    ///
    /// Returns an error if not logged in or the orchestrator rejects the action.
    pub async fn reset(&self) -> Result<SandboxDescriptor, ClientError> {
        self.perform(SandboxAction::Reset).await
    }

    /// # Errors
    ///
    /// Returns an error if not logged in or the orchestrator rejects the action.
    pub async fn delete(&self) -> Result<SandboxDescriptor, ClientError> {
        self.perform(SandboxAction::Delete).await
    }

    /// Poll until the sandbox reports `target`.
    ///
    /// Checks immediately, then waits `poll_interval` between checks, giving
    /// up after `max_polls` checks in total.
    ///
    /// # Errors
    ///
    /// Returns `SandboxTimeout` if the status never matched, or the first
    /// request error encountered.
    #[instrument(skip(self))]
    pub async fn wait_for_status(
        &self,
        target: SandboxStatus,
        poll_interval: Duration,
        max_polls: u32,
    ) -> Result<SandboxDescriptor, ClientError> {
        for poll in 1..=max_polls {
            let descriptor = self.status().await?;
            if descriptor.status == target {
                debug!(poll, "Sandbox reached target status");
                return Ok(descriptor);
            }
            if poll < max_polls {
                tokio::time::sleep(poll_interval).await;
            }
        }

        Err(ClientError::SandboxTimeout {
            target,
            polls: max_polls,
        })
    }

    #[instrument(skip(self))]
    async fn perform(&self, action: SandboxAction) -> Result<SandboxDescriptor, ClientError> {
        let token = self.access_token()?;
        let descriptor = self.api.sandbox_action(&token, action).await?;
        info!(%action, status = %descriptor.status, "Sandbox action accepted");
        Ok(descriptor)
    }

    fn access_token(&self) -> Result<String, ClientError> {
        self.tokens
            .access_token()
            .ok_or_else(|| ApiError::NotAuthenticated.into())
    }
}
