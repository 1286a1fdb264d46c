use std::sync::Arc;

use tokio_cron_scheduler::{Job, JobScheduler};
use tracing::{error, info};

use crate::errors::ReportError;
use crate::jobs::daily_report_job;
use crate::state::ReportContext;

/// Registers the daily report job and starts the scheduler. The returned
/// handle must be kept alive for the jobs to keep firing.
pub async fn start(ctx: Arc<ReportContext>) -> Result<JobScheduler, ReportError> {
    let scheduler = JobScheduler::new()
        .await
        .map_err(|e| ReportError::External(format!("failed to create scheduler: {e}")))?;

    let schedule = ctx.config.schedule.clone();
    let job_ctx = ctx.clone();

    // Cron format: sec min hour day month weekday
    let job = Job::new_async(schedule.as_str(), move |_uuid, _lock| {
        let ctx = job_ctx.clone();
        Box::pin(async move {
            info!("⏰ Scheduled report run starting");
            if let Err(e) = daily_report_job::run(&ctx).await {
                error!("Scheduled report run failed: {e}");
            }
        })
    })
    .map_err(|e| ReportError::Config(format!("invalid REPORT_SCHEDULE '{schedule}': {e}")))?;

    scheduler
        .add(job)
        .await
        .map_err(|e| ReportError::External(format!("failed to register report job: {e}")))?;
    scheduler
        .start()
        .await
        .map_err(|e| ReportError::External(format!("failed to start scheduler: {e}")))?;

    info!("🚀 Report scheduler started ({})", schedule);
    Ok(scheduler)
}
