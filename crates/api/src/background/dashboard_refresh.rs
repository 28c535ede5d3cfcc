//! Periodic recomputation of the dashboard overview.
//!
//! The dashboard screen polls rather than subscribes, so the snapshot it
//! reads may lag the store by one refresh interval.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration;

use atelier_core::chat::{SENDER_USER, THREADS_COLLECTION};
use atelier_core::stats::{self, Stats};
use atelier_core::types::Timestamp;
use atelier_db::models::admin::Admin;
use atelier_db::models::certificate::Certificate;
use atelier_db::models::company::Company;
use atelier_db::models::course_video::CourseVideo;
use atelier_db::models::faq::Faq;
use atelier_db::models::feature::Feature;
use atelier_db::models::journey::Journey;
use atelier_db::models::login_request::{LoginRequest, STATUS_PENDING};
use atelier_db::models::pricing_plan::PricingPlan;
use atelier_db::models::quiz::Quiz;
use atelier_db::models::registration::Registration;
use atelier_db::models::scholarship::Scholarship;
use atelier_db::models::student_project::StudentProject;
use atelier_db::models::trainer::Trainer;
use atelier_db::models::workshop::Workshop;
use atelier_db::models::Entity;
use atelier_db::{Facade, StoreError};
use serde::Serialize;
use tokio::sync::RwLock;
use tokio_util::sync::CancellationToken;

/// Overview figures shown on the dashboard.
#[derive(Debug, Clone, Serialize)]
pub struct DashboardSnapshot {
    /// Record count per collection.
    pub counts: BTreeMap<String, usize>,
    /// Registration stats, including confirmed revenue.
    pub registrations: Stats,
    pub pending_scholarships: usize,
    pub pending_login_requests: usize,
    /// Threads whose last message came from the user.
    pub open_threads: usize,
    pub refreshed_at: Timestamp,
}

/// Holds the most recent snapshot. Empty until the first refresh.
#[derive(Default)]
pub struct DashboardCache {
    snapshot: RwLock<Option<DashboardSnapshot>>,
}

impl DashboardCache {
    pub fn new() -> Self {
        Self::default()
    }

    pub async fn get(&self) -> Option<DashboardSnapshot> {
        self.snapshot.read().await.clone()
    }

    pub async fn set(&self, snapshot: DashboardSnapshot) {
        *self.snapshot.write().await = Some(snapshot);
    }

    /// Recompute and store a fresh snapshot.
    pub async fn refresh(&self, facade: &Facade) -> Result<DashboardSnapshot, StoreError> {
        let snapshot = compute(facade).await?;
        self.set(snapshot.clone()).await;
        Ok(snapshot)
    }
}

async fn count<E: Entity>(
    facade: &Facade,
    counts: &mut BTreeMap<String, usize>,
) -> Result<Stats, StoreError> {
    let docs = facade.list_documents::<E>().await?;
    counts.insert(E::SCHEMA.collection.to_string(), docs.len());
    Ok(stats::compute(&docs, &E::SCHEMA))
}

/// Walk every collection once and build the overview.
pub async fn compute(facade: &Facade) -> Result<DashboardSnapshot, StoreError> {
    let mut counts = BTreeMap::new();

    count::<Workshop>(facade, &mut counts).await?;
    count::<Certificate>(facade, &mut counts).await?;
    let registrations = count::<Registration>(facade, &mut counts).await?;
    count::<Trainer>(facade, &mut counts).await?;
    count::<PricingPlan>(facade, &mut counts).await?;
    count::<Faq>(facade, &mut counts).await?;
    count::<Feature>(facade, &mut counts).await?;
    let scholarships = count::<Scholarship>(facade, &mut counts).await?;
    count::<Company>(facade, &mut counts).await?;
    count::<Journey>(facade, &mut counts).await?;
    count::<StudentProject>(facade, &mut counts).await?;
    count::<Quiz>(facade, &mut counts).await?;
    count::<CourseVideo>(facade, &mut counts).await?;
    count::<Admin>(facade, &mut counts).await?;
    let login_requests = count::<LoginRequest>(facade, &mut counts).await?;

    let threads = facade.list_threads().await?;
    let open_threads = threads
        .iter()
        .filter(|t| t.data.last_sender.as_deref() == Some(SENDER_USER))
        .count();
    counts.insert(THREADS_COLLECTION.to_string(), threads.len());

    Ok(DashboardSnapshot {
        counts,
        registrations,
        pending_scholarships: scholarships.count(STATUS_PENDING),
        pending_login_requests: login_requests.count(STATUS_PENDING),
        open_threads,
        refreshed_at: chrono::Utc::now(),
    })
}

/// Run the dashboard refresh loop until `cancel` is triggered.
///
/// The first tick fires immediately so the dashboard is populated at startup.
pub async fn run(
    facade: Facade,
    cache: Arc<DashboardCache>,
    every: Duration,
    cancel: CancellationToken,
) {
    tracing::info!(interval_secs = every.as_secs(), "Dashboard refresh job started");

    let mut interval = tokio::time::interval(every);

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                tracing::info!("Dashboard refresh job stopping");
                break;
            }
            _ = interval.tick() => {
                match cache.refresh(&facade).await {
                    Ok(snapshot) => {
                        tracing::debug!(
                            open_threads = snapshot.open_threads,
                            pending_login_requests = snapshot.pending_login_requests,
                            "Dashboard snapshot refreshed"
                        );
                    }
                    Err(e) => {
                        tracing::error!(error = %e, "Dashboard refresh failed");
                    }
                }
            }
        }
    }
}
