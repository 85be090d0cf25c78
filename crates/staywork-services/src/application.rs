//! Application admission service
//!
//! Admission runs the availability matcher against the opportunity's time
//! slots before anything is persisted. Every admitted application enters as
//! PENDING with the host id stamped from the opportunity; notification
//! dispatch is handed to the outbound queue and never blocks or fails the
//! request.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use staywork_core::models::{
    is_date_range_available, Application, ApplicationStatus, NewApplication, NotificationKind,
    ReviewDetails,
};
use staywork_core::{AppError, AppResult};
use staywork_db::{ApplicationFilter, ApplicationStore, OpportunityStore, Page, StatField};
use uuid::Uuid;

use crate::dispatch::{HostNotification, NotificationDispatch};

#[derive(Clone)]
pub struct ApplicationService {
    applications: Arc<dyn ApplicationStore>,
    opportunities: Arc<dyn OpportunityStore>,
    dispatch: Arc<dyn NotificationDispatch>,
}

impl ApplicationService {
    pub fn new(
        applications: Arc<dyn ApplicationStore>,
        opportunities: Arc<dyn OpportunityStore>,
        dispatch: Arc<dyn NotificationDispatch>,
    ) -> Self {
        Self {
            applications,
            opportunities,
            dispatch,
        }
    }

    /// Admit a new application.
    ///
    /// The requested stay must fit inside one open time slot when the
    /// opportunity tracks availability; opportunities without time slots skip
    /// date validation entirely.
    #[tracing::instrument(skip(self, new), fields(user_id = %new.user_id, opportunity_id = %new.opportunity_id))]
    pub async fn create(&self, new: NewApplication) -> AppResult<Application> {
        let opportunity = self.opportunities.get(new.opportunity_id).await?;

        if new.details.start_date > new.details.end_date {
            return Err(AppError::Validation(
                "start date must not be after end date".to_string(),
            ));
        }

        if opportunity.has_time_slots
            && !is_date_range_available(
                &opportunity.time_slots,
                new.details.start_date,
                new.details.end_date,
            )
        {
            return Err(AppError::Validation(
                "selected dates are not available in any open time slot".to_string(),
            ));
        }

        let now = Utc::now();
        let application = Application {
            id: Uuid::new_v4(),
            user_id: new.user_id,
            opportunity_id: new.opportunity_id,
            host_id: opportunity.host_id,
            status: ApplicationStatus::Pending,
            status_note: None,
            details: new.details,
            review: ReviewDetails::default(),
            created_at: now,
            updated_at: now,
        };

        self.applications.insert(&application).await?;

        // Counter bump is best-effort; admission already succeeded.
        if let Err(e) = self
            .opportunities
            .bump_stat(opportunity.id, StatField::Applications, 1)
            .await
        {
            tracing::warn!(
                error = %e,
                opportunity_id = %opportunity.id,
                "Failed to bump application counter"
            );
        }

        let mut data = HashMap::new();
        data.insert("applicationId".to_string(), application.id.to_string());
        data.insert("opportunityId".to_string(), opportunity.id.to_string());
        self.dispatch.enqueue(HostNotification {
            host_id: opportunity.host_id,
            kind: NotificationKind::ApplicationCreated,
            title: "New application received".to_string(),
            message: format!("You have a new application for \"{}\"", opportunity.title),
            data,
        });

        tracing::info!(application_id = %application.id, "Application admitted");
        Ok(application)
    }

    pub async fn get(&self, id: Uuid) -> AppResult<Application> {
        self.applications.get(id).await
    }

    pub async fn list(
        &self,
        filter: &ApplicationFilter,
        limit: i64,
        offset: i64,
    ) -> AppResult<Page<Application>> {
        self.applications.list(filter, limit, offset).await
    }

    /// Change an application's status.
    ///
    /// Legality is checked against the transition table; REJECTED and
    /// CANCELLED are terminal. A same-status update is accepted and returns
    /// the stored application untouched.
    #[tracing::instrument(skip(self, note), fields(application_id = %id, new_status = %new_status))]
    pub async fn update_status(
        &self,
        id: Uuid,
        new_status: ApplicationStatus,
        note: Option<String>,
        acting_user: Uuid,
    ) -> AppResult<Application> {
        let application = self.applications.get(id).await?;

        if application.status == new_status {
            return Ok(application);
        }
        if !application.status.can_transition_to(new_status) {
            return Err(AppError::Validation(format!(
                "illegal status transition {} -> {}",
                application.status, new_status
            )));
        }

        // Accepting or rejecting is a review; record who did it and when.
        let review = match new_status {
            ApplicationStatus::Accepted | ApplicationStatus::Rejected => ReviewDetails {
                reviewed_by: Some(acting_user),
                reviewed_at: Some(Utc::now()),
                notes: note.clone(),
            },
            _ => application.review.clone(),
        };

        self.applications
            .update_status(id, new_status, note.as_deref(), &review)
            .await?;

        let mut data = HashMap::new();
        data.insert("applicationId".to_string(), id.to_string());
        data.insert("status".to_string(), new_status.as_str().to_string());
        self.dispatch.enqueue(HostNotification {
            host_id: application.host_id,
            kind: NotificationKind::ApplicationStatusChanged,
            title: "Application status changed".to_string(),
            message: format!("An application moved to {}", new_status),
            data,
        });

        self.applications.get(id).await
    }

    /// Delete an application. Only the applicant may delete, and only while it
    /// is still unreviewed (DRAFT or PENDING).
    #[tracing::instrument(skip(self), fields(application_id = %id))]
    pub async fn delete(&self, id: Uuid, acting_user: Uuid) -> AppResult<()> {
        let application = self.applications.get(id).await?;

        if application.user_id != acting_user {
            return Err(AppError::Forbidden(
                "only the applicant may delete an application".to_string(),
            ));
        }
        if !application.status.is_deletable() {
            return Err(AppError::Validation(
                "application can no longer be deleted".to_string(),
            ));
        }

        self.applications.delete(id).await?;

        if let Err(e) = self
            .opportunities
            .bump_stat(application.opportunity_id, StatField::Applications, -1)
            .await
        {
            tracing::warn!(
                error = %e,
                opportunity_id = %application.opportunity_id,
                "Failed to decrement application counter"
            );
        }

        Ok(())
    }
}
