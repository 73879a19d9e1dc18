//! Report ingestion: validate, route to a division, notify its officers,
//! persist, acknowledge the citizen, then email the division.
//!
//! A location-bearing report is persisted only when at least one officer
//! message was accepted by the provider. The citizen's acknowledgement and the
//! division email are best effort and never change the outcome.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Serialize;
use serde_json::json;
use thiserror::Error;
use tracing::{info, warn};
use uuid::Uuid;

use roadwatch_common::text::report_label;
use roadwatch_common::{
    chat_address, localized, normalize_user_id, DeliveryStatus, Division, Language,
    OfficerNotification, Report, ReportDraft, ReportStatus, ReportType, TextKey,
};
use roadwatch_geo::PolygonIndex;

use crate::notify::{EmailSender, MessageSender};
use crate::storage::ObjectStore;

/// Durable home for accepted reports.
#[async_trait]
pub trait ReportStore: Send + Sync {
    async fn insert(&self, report: &Report) -> anyhow::Result<()>;
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum RejectionReason {
    MissingFields,
    OutsideJurisdiction,
    NotificationFailed,
    StorageFailed,
}

impl RejectionReason {
    pub fn code(&self) -> &'static str {
        match self {
            RejectionReason::MissingFields => "MISSING_FIELDS",
            RejectionReason::OutsideJurisdiction => "OUTSIDE_JURISDICTION",
            RejectionReason::NotificationFailed => "NOTIFICATION_FAILED",
            RejectionReason::StorageFailed => "STORAGE_FAILED",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
#[error("report rejected: {}", .reason.code())]
pub struct Rejection {
    pub reason: RejectionReason,
    /// Set when the report was routed before it failed.
    pub division_name: Option<String>,
}

impl Rejection {
    fn new(reason: RejectionReason) -> Self {
        Self {
            reason,
            division_name: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Accepted {
    pub report_id: Uuid,
    pub division_name: Option<String>,
    pub officers_notified: usize,
}

/// Division email queued by ingestion, sent once the citizen has been told.
struct DivisionEmail {
    recipient: String,
    subject: String,
    payload: serde_json::Value,
}

/// One send to one officer number.
#[derive(Debug, Clone)]
pub struct NotificationAttempt {
    pub officer_id: Uuid,
    pub phone: String,
    pub attempted_at: DateTime<Utc>,
    /// Provider message id on success, error text on failure.
    pub result: Result<String, String>,
}

impl NotificationAttempt {
    pub fn delivered(&self) -> bool {
        self.result.is_ok()
    }

    /// Stored record for a delivered attempt. Failed attempts are only logged.
    fn into_record(self) -> Option<OfficerNotification> {
        let message_id = self.result.ok()?;
        Some(OfficerNotification {
            officer_id: self.officer_id,
            phone: self.phone,
            sent_at: self.attempted_at,
            delivery_status: DeliveryStatus::Sent,
            provider_message_id: Some(message_id),
        })
    }
}

pub struct ReportIngestionPipeline {
    divisions: Arc<PolygonIndex>,
    reports: Arc<dyn ReportStore>,
    messages: Arc<dyn MessageSender>,
    email: Arc<dyn EmailSender>,
    objects: Arc<dyn ObjectStore>,
    max_officers: usize,
}

impl ReportIngestionPipeline {
    pub fn new(
        divisions: Arc<PolygonIndex>,
        reports: Arc<dyn ReportStore>,
        messages: Arc<dyn MessageSender>,
        email: Arc<dyn EmailSender>,
        objects: Arc<dyn ObjectStore>,
        max_officers: usize,
    ) -> Self {
        Self {
            divisions,
            reports,
            messages,
            email,
            objects,
            max_officers,
        }
    }

    /// Run a draft through the pipeline. The citizen is told the outcome over
    /// chat either way.
    pub async fn submit(&self, draft: ReportDraft) -> Result<Accepted, Rejection> {
        match self.ingest(&draft).await {
            Ok((accepted, email)) => {
                info!(
                    report_id = %accepted.report_id,
                    report_type = %draft.report_type,
                    division = accepted.division_name.as_deref().unwrap_or("-"),
                    officers_notified = accepted.officers_notified,
                    "Report accepted"
                );
                self.acknowledge(&draft, &accepted).await;
                if let Some(email) = email {
                    self.email_division(email).await;
                }
                Ok(accepted)
            }
            Err(rejection) => {
                info!(
                    report_type = %draft.report_type,
                    reason = rejection.reason.code(),
                    "Report rejected"
                );
                self.notify_rejection(&draft, &rejection).await;
                Err(rejection)
            }
        }
    }

    /// Upload a photo for a report. Failures are logged and the report goes
    /// ahead without a photo.
    pub async fn upload_photo(&self, bytes: Vec<u8>, mime: &str) -> Option<String> {
        if bytes.is_empty() {
            return None;
        }
        match self.objects.upload(bytes, mime, "reports").await {
            Ok(url) => Some(url),
            Err(e) => {
                warn!(error = %e, "Photo upload failed, continuing without photo");
                None
            }
        }
    }

    async fn ingest(
        &self,
        draft: &ReportDraft,
    ) -> Result<(Accepted, Option<DivisionEmail>), Rejection> {
        validate(draft)?;

        if !draft.report_type.requires_location() {
            let report = build_report(draft, None, Vec::new());
            self.persist(&report).await?;
            let accepted = Accepted {
                report_id: report.id,
                division_name: None,
                officers_notified: 0,
            };
            return Ok((accepted, None));
        }

        let Some(location) = draft.location.as_ref() else {
            return Err(Rejection::new(RejectionReason::MissingFields));
        };

        let Some(division) = self.divisions.resolve(location.lat, location.lng).await else {
            return Err(Rejection::new(RejectionReason::OutsideJurisdiction));
        };

        let attempts = self.notify_officers(&division, draft).await;
        let delivered = attempts.iter().filter(|a| a.delivered()).count();
        if delivered == 0 {
            warn!(
                division = division.name.as_str(),
                attempts = attempts.len(),
                "No officer could be notified, report not stored"
            );
            return Err(Rejection {
                reason: RejectionReason::NotificationFailed,
                division_name: Some(division.name.clone()),
            });
        }

        let records: Vec<_> = attempts
            .into_iter()
            .filter_map(NotificationAttempt::into_record)
            .collect();
        let report = build_report(draft, Some(&division), records);
        self.persist(&report).await.map_err(|mut rejection| {
            rejection.division_name = Some(division.name.clone());
            rejection
        })?;

        let email = division_email(&division, &report);
        let accepted = Accepted {
            report_id: report.id,
            division_name: Some(division.name),
            officers_notified: delivered,
        };
        Ok((accepted, email))
    }

    async fn persist(&self, report: &Report) -> Result<(), Rejection> {
        self.reports.insert(report).await.map_err(|e| {
            warn!(error = %e, report_id = %report.id, "Failed to store report");
            Rejection::new(RejectionReason::StorageFailed)
        })
    }

    /// Message up to `max_officers` active officers in roster order, falling
    /// back to an officer's alternate number when the primary fails.
    pub async fn notify_officers(
        &self,
        division: &Division,
        draft: &ReportDraft,
    ) -> Vec<NotificationAttempt> {
        let alert = officer_alert(division, draft);
        let mut attempts = Vec::new();

        for officer in division.active_officers().take(self.max_officers) {
            let primary = self.attempt(officer.id, &officer.phone, &alert).await;
            let delivered = primary.delivered();
            attempts.push(primary);
            if delivered {
                continue;
            }

            let alternate = officer
                .alternate_phone
                .as_deref()
                .filter(|p| !normalize_user_id(p).is_empty());
            if let Some(alternate) = alternate {
                attempts.push(self.attempt(officer.id, alternate, &alert).await);
            }
        }

        attempts
    }

    async fn attempt(&self, officer_id: Uuid, phone: &str, body: &str) -> NotificationAttempt {
        let attempted_at = Utc::now();
        let digits = normalize_user_id(phone);
        let result = if digits.is_empty() {
            Err("officer has no usable phone number".to_string())
        } else {
            self.messages
                .send(&chat_address(&digits), body)
                .await
                .map(|sent| sent.message_id)
                .map_err(|e| e.to_string())
        };

        if let Err(error) = &result {
            warn!(%officer_id, error = error.as_str(), "Officer notification failed");
        }

        NotificationAttempt {
            officer_id,
            phone: phone.to_string(),
            attempted_at,
            result,
        }
    }

    async fn email_division(&self, email: DivisionEmail) {
        if let Err(e) = self
            .email
            .send(&email.recipient, &email.subject, &email.payload)
            .await
        {
            warn!(error = %e, subject = email.subject.as_str(), "Division email failed");
        }
    }

    async fn acknowledge(&self, draft: &ReportDraft, accepted: &Accepted) {
        let body = match draft.report_type {
            ReportType::Suggestion => localized(TextKey::SuggestionReceived, draft.language, &[]),
            ReportType::JoinRequest => {
                let name = draft
                    .join_details
                    .as_ref()
                    .map(|d| d.name.trim())
                    .unwrap_or_default();
                localized(TextKey::JoinReceived, draft.language, &[name])
            }
            _ => localized(
                TextKey::ReportAccepted,
                draft.language,
                &[accepted.division_name.as_deref().unwrap_or_default()],
            ),
        };
        self.tell_user(&draft.user_id, &body).await;
    }

    async fn notify_rejection(&self, draft: &ReportDraft, rejection: &Rejection) {
        let body = match rejection.reason {
            RejectionReason::MissingFields => localized(TextKey::MissingFields, draft.language, &[]),
            RejectionReason::OutsideJurisdiction => {
                localized(TextKey::OutsideJurisdiction, draft.language, &[])
            }
            RejectionReason::NotificationFailed => localized(
                TextKey::NotificationFailed,
                draft.language,
                &[rejection.division_name.as_deref().unwrap_or_default()],
            ),
            RejectionReason::StorageFailed => {
                localized(TextKey::SubmissionFailed, draft.language, &[])
            }
        };
        self.tell_user(&draft.user_id, &body).await;
    }

    async fn tell_user(&self, user_id: &str, body: &str) {
        let digits = normalize_user_id(user_id);
        if digits.is_empty() {
            return;
        }
        if let Err(e) = self.messages.send(&chat_address(&digits), body).await {
            warn!(error = %e, "Failed to send outcome message to citizen");
        }
    }
}

/// Field checks that do not need any collaborator.
pub fn validate(draft: &ReportDraft) -> Result<(), Rejection> {
    let missing = Err(Rejection::new(RejectionReason::MissingFields));

    if normalize_user_id(&draft.user_id).is_empty() {
        return missing;
    }

    match draft.report_type {
        ReportType::Suggestion => {
            if draft.description.trim().is_empty() {
                return missing;
            }
        }
        ReportType::JoinRequest => {
            let complete = draft.join_details.as_ref().is_some_and(|d| {
                !d.name.trim().is_empty() && !d.email.trim().is_empty() && !d.phone.trim().is_empty()
            });
            if !complete {
                return missing;
            }
        }
        _ => {
            let located = draft
                .location
                .as_ref()
                .is_some_and(|l| l.lat.is_finite() && l.lng.is_finite());
            if !located {
                return missing;
            }
        }
    }

    Ok(())
}

fn build_report(
    draft: &ReportDraft,
    division: Option<&Division>,
    officers_notified: Vec<OfficerNotification>,
) -> Report {
    Report {
        id: Uuid::new_v4(),
        user_id: normalize_user_id(&draft.user_id),
        user_name: draft.user_name.clone(),
        report_type: draft.report_type,
        description: draft.description.trim().to_string(),
        photo_url: draft.photo_url.clone(),
        location: draft.location.clone(),
        status: ReportStatus::Pending,
        division_id: division.map(|d| d.id),
        division_name: division.map(|d| d.name.clone()),
        division_notified: officers_notified
            .iter()
            .any(|n| n.delivery_status == DeliveryStatus::Sent),
        officers_notified,
        join_details: draft.join_details.clone(),
        created_at: Utc::now(),
    }
}

fn division_email(division: &Division, report: &Report) -> Option<DivisionEmail> {
    let recipient = division.email.as_deref().map(str::trim).filter(|e| !e.is_empty())?;
    Some(DivisionEmail {
        recipient: recipient.to_string(),
        subject: format!(
            "New {} report: {}",
            report_label(report.report_type, Language::En),
            division.name
        ),
        payload: report_payload(report),
    })
}

fn officer_alert(division: &Division, draft: &ReportDraft) -> String {
    let reporter = match draft.user_name.as_deref() {
        Some(name) if !name.trim().is_empty() => {
            format!("{} (+{})", name.trim(), normalize_user_id(&draft.user_id))
        }
        _ => format!("+{}", normalize_user_id(&draft.user_id)),
    };
    let description = non_empty_or_dash(Some(draft.description.as_str()));
    let address = non_empty_or_dash(draft.location.as_ref().and_then(|l| l.address.as_deref()));
    let (lat, lng) = draft
        .location
        .as_ref()
        .map(|l| (format!("{:.6}", l.lat), format!("{:.6}", l.lng)))
        .unwrap_or_default();
    let photo = non_empty_or_dash(draft.photo_url.as_deref());

    localized(
        TextKey::OfficerAlert,
        Language::En,
        &[
            report_label(draft.report_type, Language::En),
            &division.name,
            &reporter,
            description,
            address,
            &lat,
            &lng,
            photo,
        ],
    )
}

fn non_empty_or_dash(value: Option<&str>) -> &str {
    match value.map(str::trim) {
        Some(v) if !v.is_empty() => v,
        _ => "-",
    }
}

fn report_payload(report: &Report) -> serde_json::Value {
    json!({
        "id": report.id,
        "type": report.report_type.slug(),
        "description": report.description,
        "reporter": report.user_name,
        "reporterPhone": format!("+{}", report.user_id),
        "photoUrl": report.photo_url,
        "latitude": report.location.as_ref().map(|l| l.lat),
        "longitude": report.location.as_ref().map(|l| l.lng),
        "address": report.location.as_ref().and_then(|l| l.address.clone()),
        "division": report.division_name,
        "officersNotified": report
            .officers_notified
            .iter()
            .filter(|n| n.delivery_status == DeliveryStatus::Sent)
            .count(),
        "createdAt": report.created_at.to_rfc3339(),
    })
}
