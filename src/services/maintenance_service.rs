use anyhow::{anyhow, Result};
use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::auth::AuthService;

/// Periodic housekeeping for token tables
pub struct MaintenanceService {
    scheduler: JobScheduler,
    auth_service: AuthService,
}

impl MaintenanceService {
    pub async fn new(auth_service: AuthService) -> Result<Self> {
        let scheduler = JobScheduler::new()
            .await
            .map_err(|e| anyhow!("Failed to create job scheduler: {}", e))?;

        Ok(Self {
            scheduler,
            auth_service,
        })
    }

    /// Register the token purge on `cron` and start the scheduler
    pub async fn start(&self, cron: &str) -> Result<()> {
        let auth_service = self.auth_service.clone();

        let job = Job::new_async(cron, move |_uuid, _l| {
            let auth_service = auth_service.clone();
            Box::pin(async move {
                Self::purge_tokens(&auth_service).await;
            })
        })
        .map_err(|e| anyhow!("Failed to create token purge job for {:?}: {}", cron, e))?;

        self.scheduler
            .add(job)
            .await
            .map_err(|e| anyhow!("Failed to add job to scheduler: {}", e))?;

        self.scheduler
            .start()
            .await
            .map_err(|e| anyhow!("Failed to start job scheduler: {}", e))?;

        info!(cron, "maintenance scheduler started");
        Ok(())
    }

    pub async fn shutdown(&mut self) -> Result<()> {
        self.scheduler
            .shutdown()
            .await
            .map_err(|e| anyhow!("Failed to stop job scheduler: {}", e))?;

        info!("maintenance scheduler stopped");
        Ok(())
    }

    async fn purge_tokens(auth_service: &AuthService) {
        match auth_service.purge_expired_tokens().await {
            Ok((blacklisted, refresh)) => {
                info!(blacklisted, refresh, "purged expired tokens");
            }
            Err(e) => error!(error = %e, "token purge failed"),
        }
    }
}
