use std::cmp::Ordering;
use std::sync::Arc;

use chrono::{DateTime, Local, TimeZone, Utc};
use reqwest::Method;
use tracing::{debug, info, warn};

use shared_config::AppConfig;
use shared_models::error::PortalError;
use shared_store::{LocalStore, PortalApiClient};
use shared_utils::clock::Clock;

use crate::models::{AnswerSet, AssessmentRecord, MirrorAssessmentRequest, ProfileResponse};
use crate::services::decode::{AssessmentDecoder, DecodedAssessment};
use crate::services::pdf::render_pdf;
use crate::services::scoring::build_record;

pub const LOCAL_KEY: &str = "theraPH_preAssessment";

/// Result of mirroring a record to the patient profile.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RemoteSync {
    Mirrored,
    /// No API or patient configured.
    Skipped,
    /// The local copy was kept; the remote copy is stale.
    Failed(String),
}

/// Which copy survived a reconcile.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcileOutcome {
    RemoteNewer,
    LocalNewer,
    InSync,
    Empty,
    Skipped,
}

/// The patient's active pre-assessment: a local cache plus a best-effort
/// mirror on the remote profile, which is the source of truth.
pub struct AssessmentRepository {
    local: LocalStore,
    client: PortalApiClient,
    clock: Arc<dyn Clock>,
    decoder: AssessmentDecoder,
    patient_email: String,
}

impl AssessmentRepository {
    pub fn new(config: &AppConfig, patient_email: impl Into<String>, clock: Arc<dyn Clock>) -> Self {
        Self {
            local: LocalStore::open(config.local_storage_path.clone()),
            client: PortalApiClient::new(config),
            clock,
            decoder: AssessmentDecoder::new(),
            patient_email: patient_email.into(),
        }
    }

    pub fn with_decoder(mut self, decoder: AssessmentDecoder) -> Self {
        self.decoder = decoder;
        self
    }

    pub fn patient_email(&self) -> &str {
        &self.patient_email
    }

    fn remote_enabled(&self) -> bool {
        !self.patient_email.is_empty() && !self.client.get_base_url().is_empty()
    }

    fn timestamp(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        Local
            .from_local_datetime(&now)
            .earliest()
            .map(|local| local.with_timezone(&Utc))
            .unwrap_or_else(|| Utc.from_utc_datetime(&now))
    }

    /// Score a completed questionnaire and make it the active record.
    pub async fn submit(&self, answers: AnswerSet) -> Result<(AssessmentRecord, RemoteSync), PortalError> {
        let record = build_record(answers, self.timestamp())?;
        let sync = self.persist(&record).await?;

        info!("Pre-assessment submitted with score {}", record.percentage);
        Ok((record, sync))
    }

    /// Overwrite the local copy, then mirror it remotely.
    ///
    /// Only a local write failure is an error.
    pub async fn persist(&self, record: &AssessmentRecord) -> Result<RemoteSync, PortalError> {
        self.local.set(LOCAL_KEY, record).await?;

        if !self.remote_enabled() {
            debug!("Remote mirror skipped; no API or patient configured");
            return Ok(RemoteSync::Skipped);
        }

        let mirrored = self.mirror(record).await;
        match mirrored {
            Ok(()) => Ok(RemoteSync::Mirrored),
            Err(e) => {
                warn!("Pre-assessment kept locally, remote mirror failed: {}", e);
                Ok(RemoteSync::Failed(e.to_string()))
            }
        }
    }

    async fn mirror(&self, record: &AssessmentRecord) -> Result<(), PortalError> {
        let body = serde_json::to_value(MirrorAssessmentRequest {
            email: &self.patient_email,
            data: record,
        })
        .map_err(|e| PortalError::validation(e.to_string()))?;

        self.client.post_acknowledged("/patient/pre-assessment", body).await?;
        debug!("Mirrored pre-assessment for {}", self.patient_email);
        Ok(())
    }

    /// Decode an uploaded report and make it the active record.
    ///
    /// A report that cannot be decoded leaves the active record untouched.
    pub async fn import_pdf(&self, pdf_bytes: Vec<u8>) -> Result<(DecodedAssessment, RemoteSync), PortalError> {
        let decoded = self.decoder.decode_owned(pdf_bytes, self.timestamp()).await?;
        let sync = self.persist(&decoded.record).await?;

        info!(
            "Imported pre-assessment ({:?}) with score {}",
            decoded.source, decoded.record.percentage
        );
        Ok((decoded, sync))
    }

    pub async fn export_pdf(&self) -> Result<Vec<u8>, PortalError> {
        let record = self
            .active()
            .await?
            .ok_or_else(|| PortalError::validation("No pre-assessment to export"))?;
        render_pdf(&record)
    }

    pub async fn active(&self) -> Result<Option<AssessmentRecord>, PortalError> {
        self.local.get(LOCAL_KEY).await
    }

    /// Forget the local copy. Returns whether one existed.
    pub async fn clear(&self) -> Result<bool, PortalError> {
        self.local.remove(LOCAL_KEY).await
    }

    /// Newer `createdAt` wins; the losing side is overwritten.
    pub async fn reconcile(&self) -> Result<ReconcileOutcome, PortalError> {
        if !self.remote_enabled() {
            return Ok(ReconcileOutcome::Skipped);
        }

        let local = self.active().await?;
        let query = [("email", self.patient_email.clone())];
        let profile: ProfileResponse = self.client
            .request(Method::GET, "/patient/profile", &query, None)
            .await?;

        let outcome = match (local, profile.pre_assessment) {
            (None, None) => ReconcileOutcome::Empty,
            (None, Some(remote)) => {
                self.local.set(LOCAL_KEY, &remote).await?;
                ReconcileOutcome::RemoteNewer
            }
            (Some(local), None) => {
                self.mirror(&local).await?;
                ReconcileOutcome::LocalNewer
            }
            (Some(local), Some(remote)) => match remote.created_at.cmp(&local.created_at) {
                Ordering::Greater => {
                    self.local.set(LOCAL_KEY, &remote).await?;
                    ReconcileOutcome::RemoteNewer
                }
                Ordering::Less => {
                    self.mirror(&local).await?;
                    ReconcileOutcome::LocalNewer
                }
                Ordering::Equal => ReconcileOutcome::InSync,
            },
        };

        debug!("Reconciled pre-assessment for {}: {:?}", self.patient_email, outcome);
        Ok(outcome)
    }
}
