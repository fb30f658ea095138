//! Appointment scheduling with per-staff conflict detection.

use chrono::{DateTime, Utc};
use gymdesk_core::error::{GymError, GymResult};
use gymdesk_core::models::appointment::{
    Appointment, AppointmentStatus, CreateAppointment, UpdateAppointment,
};
use gymdesk_core::repository::{ActivityLogRepository, AppointmentRepository};
use serde_json::json;
use uuid::Uuid;

use crate::activity::{Activity, ActivityRecorder};

pub struct ScheduleService<P: AppointmentRepository, A: ActivityLogRepository> {
    appointments: P,
    activity: ActivityRecorder<A>,
}

fn check_interval(starts_at: DateTime<Utc>, ends_at: DateTime<Utc>) -> GymResult<()> {
    if ends_at <= starts_at {
        return Err(GymError::validation("appointment must end after it starts"));
    }
    Ok(())
}

impl<P: AppointmentRepository, A: ActivityLogRepository> ScheduleService<P, A> {
    pub fn new(appointments: P, activity: ActivityRecorder<A>) -> Self {
        Self {
            appointments,
            activity,
        }
    }

    /// Fail with `Conflict` when the staff member already holds an
    /// agenda-blocking appointment intersecting `[starts_at, ends_at)`.
    async fn ensure_free(
        &self,
        unit_id: Uuid,
        staff_id: Uuid,
        starts_at: DateTime<Utc>,
        ends_at: DateTime<Utc>,
        ignore: Option<Uuid>,
    ) -> GymResult<()> {
        let clash = self
            .appointments
            .list_for_staff_between(unit_id, staff_id, starts_at, ends_at)
            .await?
            .into_iter()
            .find(|a| {
                Some(a.id) != ignore && a.status.blocks_agenda() && a.overlaps(starts_at, ends_at)
            });

        match clash {
            Some(existing) => Err(GymError::Conflict {
                message: format!(
                    "staff member already booked for \"{}\" at {}",
                    existing.title,
                    existing.starts_at.format("%d/%m/%Y %H:%M")
                ),
            }),
            None => Ok(()),
        }
    }

    pub async fn create(
        &self,
        actor_id: Option<Uuid>,
        input: CreateAppointment,
    ) -> GymResult<Appointment> {
        if input.title.trim().is_empty() {
            return Err(GymError::validation("title is required"));
        }
        check_interval(input.starts_at, input.ends_at)?;
        if let Some(staff_id) = input.staff_id {
            self.ensure_free(input.unit_id, staff_id, input.starts_at, input.ends_at, None)
                .await?;
        }

        let appointment = self.appointments.create(input).await?;
        self.activity
            .record(Activity::new(
                appointment.unit_id,
                actor_id,
                "appointment.created",
                "appointment",
                appointment.id,
                format!("Appointment \"{}\" scheduled", appointment.title),
            ))
            .await;
        Ok(appointment)
    }

    /// Apply changes, re-checking the interval and the staff agenda with
    /// the merged values.
    pub async fn update(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
        input: UpdateAppointment,
    ) -> GymResult<Appointment> {
        let current = self.appointments.get_by_id(unit_id, id).await?;
        let starts_at = input.starts_at.unwrap_or(current.starts_at);
        let ends_at = input.ends_at.unwrap_or(current.ends_at);
        let staff_id = input.staff_id.or(current.staff_id);
        let status = input.status.unwrap_or(current.status);

        check_interval(starts_at, ends_at)?;
        if let Some(staff_id) = staff_id
            && status.blocks_agenda()
        {
            self.ensure_free(unit_id, staff_id, starts_at, ends_at, Some(id))
                .await?;
        }

        let moved = starts_at != current.starts_at || ends_at != current.ends_at;
        let appointment = self.appointments.update(unit_id, id, input).await?;

        let activity = Activity::new(
            unit_id,
            actor_id,
            if moved {
                "appointment.rescheduled"
            } else {
                "appointment.updated"
            },
            "appointment",
            id,
            format!("Appointment \"{}\" updated", appointment.title),
        );
        let activity = if current.status != appointment.status {
            activity.with_metadata(json!({ "from": current.status, "to": appointment.status }))
        } else {
            activity
        };
        self.activity.record(activity).await;
        Ok(appointment)
    }

    pub async fn cancel(
        &self,
        unit_id: Uuid,
        actor_id: Option<Uuid>,
        id: Uuid,
    ) -> GymResult<Appointment> {
        self.update(
            unit_id,
            actor_id,
            id,
            UpdateAppointment {
                status: Some(AppointmentStatus::Cancelled),
                ..Default::default()
            },
        )
        .await
    }

    pub async fn get(&self, unit_id: Uuid, id: Uuid) -> GymResult<Appointment> {
        self.appointments.get_by_id(unit_id, id).await
    }

    pub async fn delete(&self, unit_id: Uuid, actor_id: Option<Uuid>, id: Uuid) -> GymResult<()> {
        let appointment = self.appointments.get_by_id(unit_id, id).await?;
        self.appointments.delete(unit_id, id).await?;
        self.activity
            .record(Activity::new(
                unit_id,
                actor_id,
                "appointment.deleted",
                "appointment",
                id,
                format!("Appointment \"{}\" deleted", appointment.title),
            ))
            .await;
        Ok(())
    }

    /// Agenda for `[from, to)`, optionally narrowed to one staff member.
    pub async fn agenda(
        &self,
        unit_id: Uuid,
        staff_id: Option<Uuid>,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> GymResult<Vec<Appointment>> {
        check_interval(from, to)?;
        match staff_id {
            Some(staff_id) => {
                self.appointments
                    .list_for_staff_between(unit_id, staff_id, from, to)
                    .await
            }
            None => self.appointments.list_between(unit_id, from, to).await,
        }
    }
}
