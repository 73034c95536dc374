use sigesda_core::capabilities::{
    allowed_actions_for, capabilities_for, ensure_can_create, ensure_can_edit,
    ensure_can_manage_rooms, ensure_can_perform, Capability,
};
use sigesda_core::conflict::{detect_conflicts, ensure_no_conflicts, reservations_in_window};
use sigesda_core::models::{
    Actor, CreateReservationRequest, NewReservation, Reservation, ReservationCandidate,
    ReservationEdit, ReservationStatus, ReservationWindow, Room, StatusChange,
};
use sigesda_core::validation::{ensure_room_available, validate_create_request, validate_time_range};
use sigesda_core::{
    apply_action, apply_edit, transition, AppError, AppResult, CreationPolicy, ReservationAction,
    ReservationConfig, ReservationRules, ReservationSource,
};
use std::sync::Arc;
use uuid::Uuid;

/// Runs reservation rules against a fresh snapshot of the room.
///
/// Every check fetches the room's reservations immediately before evaluating
/// them. Nothing is locked: two clients can still race for the same slot, and
/// the backend's own check at persistence time has the last word.
pub struct ReservationService<S: ReservationSource> {
    source: Arc<S>,
    policy: CreationPolicy,
    rules: ReservationRules,
}

impl<S: ReservationSource> Clone for ReservationService<S> {
    fn clone(&self) -> Self {
        Self {
            source: Arc::clone(&self.source),
            policy: self.policy.clone(),
            rules: self.rules,
        }
    }
}

impl<S: ReservationSource> ReservationService<S> {
    pub fn new(source: Arc<S>, config: &ReservationConfig) -> Self {
        Self {
            source,
            policy: config.creation_policy.clone(),
            rules: config.rules(),
        }
    }

    async fn snapshot(&self, candidate: &ReservationCandidate) -> AppResult<Vec<Reservation>> {
        let window = ReservationWindow {
            from: candidate.start_time,
            to: candidate.end_time,
        };
        self.source
            .list_room_reservations(candidate.room_id, Some(window))
            .await
    }

    /// Advisory check: reservations that would conflict with `candidate`.
    /// `exclude_id` skips the reservation being edited.
    #[tracing::instrument(skip(self), fields(room_id = %candidate.room_id))]
    pub async fn check_availability(
        &self,
        candidate: &ReservationCandidate,
        exclude_id: Option<Uuid>,
    ) -> AppResult<Vec<Reservation>> {
        validate_time_range(candidate.start_time, candidate.end_time, &self.rules)?;

        let existing = self.snapshot(candidate).await?;
        let conflicts = detect_conflicts(candidate, &existing, exclude_id);

        tracing::debug!(
            checked = existing.len(),
            conflicts = conflicts.len(),
            "Availability checked"
        );

        Ok(conflicts)
    }

    #[tracing::instrument(skip(self, request), fields(room_id = %request.room_id, actor = %actor.user_id))]
    pub async fn create(
        &self,
        request: CreateReservationRequest,
        actor: &Actor,
    ) -> AppResult<Reservation> {
        ensure_can_create(actor)?;
        if request.requester_id != actor.user_id
            && !capabilities_for(actor.role).contains(Capability::EditAnyReservation)
        {
            return Err(AppError::Forbidden(format!(
                "Role {} cannot reserve on behalf of another user",
                actor.role
            )));
        }

        validate_create_request(&request, &self.rules)?;

        let room = self.source.get_room(request.room_id).await?;
        ensure_room_available(&room)?;

        let candidate = ReservationCandidate::from(&request);
        let existing = self.snapshot(&candidate).await?;
        if let Err(err) = ensure_no_conflicts(&candidate, &existing, None) {
            tracing::warn!(
                conflicts = err.conflicts().len(),
                "Reservation request overlaps existing reservations"
            );
            return Err(err);
        }

        // Auto-confirmation applies only to the requester's own reservations.
        let status = if request.requester_id == actor.user_id {
            self.policy.initial_status(actor.role)
        } else {
            ReservationStatus::Pending
        };
        let created = self
            .source
            .create_reservation(&NewReservation::from_request(request, status))
            .await?;

        tracing::info!(
            reservation_id = %created.id,
            status = %created.status,
            "Reservation created"
        );

        Ok(created)
    }

    #[tracing::instrument(skip(self, edit), fields(reservation_id = %id, actor = %actor.user_id))]
    pub async fn edit(&self, id: Uuid, edit: ReservationEdit, actor: &Actor) -> AppResult<Reservation> {
        let current = self.source.get_reservation(id).await?;
        ensure_can_edit(actor, &current)?;
        let updated = apply_edit(&current, &edit, &self.rules)?;

        if edit.changes_slot() {
            if updated.room_id != current.room_id {
                let room = self.source.get_room(updated.room_id).await?;
                ensure_room_available(&room)?;
            }

            let candidate = updated.as_candidate();
            let existing = self.snapshot(&candidate).await?;
            if let Err(err) = ensure_no_conflicts(&candidate, &existing, Some(id)) {
                tracing::warn!(
                    conflicts = err.conflicts().len(),
                    "Edited reservation overlaps existing reservations"
                );
                return Err(err);
            }
        }

        let saved = self.source.update_reservation(&updated).await?;
        tracing::info!("Reservation edited");
        Ok(saved)
    }

    pub async fn approve(&self, id: Uuid, actor: &Actor) -> AppResult<Reservation> {
        self.perform(id, actor, ReservationAction::Approve, None).await
    }

    pub async fn reject(&self, id: Uuid, actor: &Actor, reason: &str) -> AppResult<Reservation> {
        self.perform(id, actor, ReservationAction::Reject, Some(reason))
            .await
    }

    /// Cancel a confirmed reservation (reason required) or withdraw a pending one.
    pub async fn cancel(
        &self,
        id: Uuid,
        actor: &Actor,
        reason: Option<&str>,
    ) -> AppResult<Reservation> {
        self.perform(id, actor, ReservationAction::Cancel, reason)
            .await
    }

    /// Run a workflow action.
    ///
    /// The transition is checked first, so terminal reservations report an
    /// invalid transition whatever the actor's role. Approval re-checks the
    /// slot against confirmed reservations only: two overlapping pending
    /// requests may coexist, but only one of them can be confirmed.
    #[tracing::instrument(skip(self, reason), fields(reservation_id = %id, actor = %actor.user_id, action = %action))]
    pub async fn perform(
        &self,
        id: Uuid,
        actor: &Actor,
        action: ReservationAction,
        reason: Option<&str>,
    ) -> AppResult<Reservation> {
        let current = self.source.get_reservation(id).await?;
        transition(current.status, action)?;
        ensure_can_perform(actor, &current, action)?;
        let updated = apply_action(&current, action, reason)?;

        if action == ReservationAction::Approve {
            let candidate = current.as_candidate();
            let confirmed: Vec<Reservation> = self
                .snapshot(&candidate)
                .await?
                .into_iter()
                .filter(|r| r.status == ReservationStatus::Confirmed)
                .collect();
            if let Err(err) = ensure_no_conflicts(&candidate, &confirmed, Some(id)) {
                tracing::warn!(
                    conflicts = err.conflicts().len(),
                    "Approval blocked by confirmed reservations"
                );
                return Err(err);
            }
        }

        let reason = match action {
            ReservationAction::Approve => None,
            ReservationAction::Reject => updated.rejection_reason.clone(),
            ReservationAction::Cancel => updated.cancellation_reason.clone(),
        };
        let change = StatusChange {
            status: updated.status,
            reason,
        };
        let saved = self.source.patch_status(id, &change).await?;

        tracing::info!(from = %current.status, to = %saved.status, "Reservation status changed");
        Ok(saved)
    }

    /// Actions `actor` may run on reservation `id` right now
    pub async fn allowed_actions(&self, id: Uuid, actor: &Actor) -> AppResult<Vec<ReservationAction>> {
        let reservation = self.source.get_reservation(id).await?;
        Ok(allowed_actions_for(&reservation, actor))
    }

    /// Reservations of a room, ordered by start time
    pub async fn room_schedule(
        &self,
        room_id: Uuid,
        window: Option<ReservationWindow>,
    ) -> AppResult<Vec<Reservation>> {
        let reservations = self
            .source
            .list_room_reservations(room_id, window)
            .await?;
        Ok(reservations_in_window(&reservations, room_id, window.as_ref()))
    }

    pub async fn active_rooms(&self) -> AppResult<Vec<Room>> {
        self.source.list_active_rooms().await
    }

    /// Open or close a room for new reservations. Existing reservations are kept.
    #[tracing::instrument(skip(self), fields(actor = %actor.user_id))]
    pub async fn set_room_availability(
        &self,
        room_id: Uuid,
        available: bool,
        actor: &Actor,
    ) -> AppResult<Room> {
        ensure_can_manage_rooms(actor)?;
        let room = self.source.set_room_availability(room_id, available).await?;
        tracing::info!(room = %room.name, available, "Room availability changed");
        Ok(room)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_helpers::{at, reservation, room, InMemoryReservationSource};
    use sigesda_core::models::Role;

    struct Fixture {
        source: Arc<InMemoryReservationSource>,
        service: ReservationService<InMemoryReservationSource>,
        room: Room,
        teacher: Actor,
        secretary: Actor,
    }

    fn fixture_with(config: ReservationConfig) -> Fixture {
        let source = Arc::new(InMemoryReservationSource::new());
        let room = room("Sala 1");
        source.add_room(room.clone());
        let service = ReservationService::new(Arc::clone(&source), &config);
        Fixture {
            source,
            service,
            room,
            teacher: Actor::new(Uuid::new_v4(), Role::Teacher),
            secretary: Actor::new(Uuid::new_v4(), Role::Secretary),
        }
    }

    fn fixture() -> Fixture {
        fixture_with(ReservationConfig::default())
    }

    fn request(f: &Fixture, start: (u32, u32), end: (u32, u32)) -> CreateReservationRequest {
        CreateReservationRequest {
            room_id: f.room.id,
            requester_id: f.teacher.user_id,
            activity_id: None,
            start_time: at(start.0, start.1),
            end_time: at(end.0, end.1),
            observations: Some("Piano lesson".to_string()),
        }
    }

    #[tokio::test]
    async fn create_starts_pending_by_default() {
        let f = fixture();
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap();
        assert_eq!(created.status, ReservationStatus::Pending);
        assert_eq!(f.source.reservation_count(), 1);
    }

    #[tokio::test]
    async fn create_honours_auto_confirm_policy() {
        let config = ReservationConfig {
            creation_policy: CreationPolicy::new(vec![Role::Secretary]),
            ..Default::default()
        };
        let f = fixture_with(config);
        let mut req = request(&f, (10, 0), (11, 0));
        req.requester_id = f.secretary.user_id;
        let created = f.service.create(req, &f.secretary).await.unwrap();
        assert_eq!(created.status, ReservationStatus::Confirmed);
    }

    #[tokio::test]
    async fn auto_confirm_does_not_extend_to_requests_made_on_behalf() {
        let config = ReservationConfig {
            creation_policy: CreationPolicy::new(vec![Role::Secretary]),
            ..Default::default()
        };
        let f = fixture_with(config);
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.secretary)
            .await
            .unwrap();
        assert_eq!(created.requester_id, f.teacher.user_id);
        assert_eq!(created.status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn create_rejects_overlap_and_accepts_touching_slot() {
        let f = fixture();
        let a = reservation(
            f.room.id,
            Uuid::new_v4(),
            at(10, 0),
            at(12, 0),
            ReservationStatus::Confirmed,
        );
        f.source.add_reservation(a.clone());

        let err = f
            .service
            .create(request(&f, (11, 0), (13, 0)), &f.teacher)
            .await
            .unwrap_err();
        assert_eq!(err.conflicts(), &[a][..]);

        let created = f
            .service
            .create(request(&f, (12, 0), (13, 0)), &f.teacher)
            .await
            .unwrap();
        assert_eq!(created.start_time, at(12, 0));
    }

    #[tokio::test]
    async fn create_validates_before_touching_the_source() {
        let f = fixture();
        let err = f
            .service
            .create(request(&f, (13, 0), (12, 0)), &f.teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.source.reservation_count(), 0);
    }

    #[tokio::test]
    async fn create_in_unavailable_room_fails() {
        let f = fixture();
        let mut closed = room("Sala cerrada");
        closed.available = false;
        f.source.add_room(closed.clone());

        let mut req = request(&f, (10, 0), (11, 0));
        req.room_id = closed.id;
        let err = f.service.create(req, &f.teacher).await.unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn students_and_proxies_are_forbidden() {
        let f = fixture();
        let student = Actor::new(Uuid::new_v4(), Role::Student);
        let mut req = request(&f, (10, 0), (11, 0));
        req.requester_id = student.user_id;
        assert!(matches!(
            f.service.create(req, &student).await,
            Err(AppError::Forbidden(_))
        ));

        let other_teacher = Actor::new(Uuid::new_v4(), Role::Teacher);
        assert!(matches!(
            f.service
                .create(request(&f, (10, 0), (11, 0)), &other_teacher)
                .await,
            Err(AppError::Forbidden(_))
        ));

        let on_behalf = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.secretary)
            .await
            .unwrap();
        assert_eq!(on_behalf.requester_id, f.teacher.user_id);
    }

    #[tokio::test]
    async fn approve_and_cancel_flow() {
        let f = fixture();
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap();

        assert!(matches!(
            f.service.approve(created.id, &f.teacher).await,
            Err(AppError::Forbidden(_))
        ));

        let confirmed = f.service.approve(created.id, &f.secretary).await.unwrap();
        assert_eq!(confirmed.status, ReservationStatus::Confirmed);
        assert_eq!(
            f.service.allowed_actions(created.id, &f.secretary).await.unwrap(),
            vec![ReservationAction::Cancel]
        );

        assert!(matches!(
            f.service.cancel(created.id, &f.teacher, None).await,
            Err(AppError::Validation(_))
        ));
        let cancelled = f
            .service
            .cancel(created.id, &f.teacher, Some("Recital postponed"))
            .await
            .unwrap();
        assert_eq!(cancelled.status, ReservationStatus::Cancelled);
        assert_eq!(
            cancelled.cancellation_reason.as_deref(),
            Some("Recital postponed")
        );

        let err = f.service.approve(created.id, &f.secretary).await.unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn terminal_reservation_reports_invalid_transition_even_for_strangers() {
        let f = fixture();
        let rejected = reservation(
            f.room.id,
            Uuid::new_v4(),
            at(9, 0),
            at(10, 0),
            ReservationStatus::Rejected,
        );
        f.source.add_reservation(rejected.clone());

        let err = f
            .service
            .cancel(rejected.id, &f.teacher, Some("whatever"))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::InvalidTransition { .. }));
    }

    #[tokio::test]
    async fn reject_stores_reason() {
        let f = fixture();
        let pending = reservation(
            f.room.id,
            f.teacher.user_id,
            at(9, 0),
            at(10, 0),
            ReservationStatus::Pending,
        );
        f.source.add_reservation(pending.clone());

        let rejected = f
            .service
            .reject(pending.id, &f.secretary, "Room booked for exams")
            .await
            .unwrap();
        assert_eq!(rejected.status, ReservationStatus::Rejected);
        assert_eq!(
            rejected.rejection_reason.as_deref(),
            Some("Room booked for exams")
        );
    }

    #[tokio::test]
    async fn approval_blocked_by_confirmed_overlap_but_not_by_pending() {
        let f = fixture();
        let first = reservation(
            f.room.id,
            f.teacher.user_id,
            at(10, 0),
            at(11, 0),
            ReservationStatus::Pending,
        );
        let second = reservation(
            f.room.id,
            Uuid::new_v4(),
            at(10, 30),
            at(11, 30),
            ReservationStatus::Pending,
        );
        f.source.add_reservation(first.clone());
        f.source.add_reservation(second.clone());

        f.service.approve(first.id, &f.secretary).await.unwrap();

        let err = f.service.approve(second.id, &f.secretary).await.unwrap_err();
        assert_eq!(err.conflicts().len(), 1);
        assert_eq!(err.conflicts()[0].id, first.id);
        assert_eq!(
            f.source.reservation(second.id).unwrap().status,
            ReservationStatus::Pending
        );
    }

    #[tokio::test]
    async fn edit_pending_moves_slot_without_self_conflict() {
        let f = fixture();
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap();

        let edit = ReservationEdit {
            end_time: Some(at(11, 30)),
            ..Default::default()
        };
        let edited = f.service.edit(created.id, edit, &f.teacher).await.unwrap();
        assert_eq!(edited.end_time, at(11, 30));
        assert_eq!(edited.status, ReservationStatus::Pending);
    }

    #[tokio::test]
    async fn edit_into_conflict_or_after_confirmation_fails() {
        let f = fixture();
        let blocker = reservation(
            f.room.id,
            Uuid::new_v4(),
            at(12, 0),
            at(13, 0),
            ReservationStatus::Confirmed,
        );
        f.source.add_reservation(blocker);
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap();

        let edit = ReservationEdit {
            end_time: Some(at(12, 30)),
            ..Default::default()
        };
        let err = f
            .service
            .edit(created.id, edit.clone(), &f.teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Conflict { .. }));

        f.service.approve(created.id, &f.secretary).await.unwrap();
        let err = f
            .service
            .edit(created.id, edit, &f.teacher)
            .await
            .unwrap_err();
        assert!(matches!(
            err,
            AppError::EditNotAllowed {
                status: ReservationStatus::Confirmed
            }
        ));
    }

    #[tokio::test]
    async fn edit_into_unavailable_room_fails() {
        let f = fixture();
        let mut closed = room("Sala cerrada");
        closed.available = false;
        f.source.add_room(closed.clone());
        let created = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap();

        let edit = ReservationEdit {
            room_id: Some(closed.id),
            ..Default::default()
        };
        let err = f
            .service
            .edit(created.id, edit, &f.teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
        assert_eq!(f.source.reservation(created.id).unwrap().room_id, f.room.id);
    }

    #[tokio::test]
    async fn closing_a_room_requires_manage_rooms() {
        let f = fixture();
        assert!(matches!(
            f.service
                .set_room_availability(f.room.id, false, &f.secretary)
                .await,
            Err(AppError::Forbidden(_))
        ));

        let admin = Actor::new(Uuid::new_v4(), Role::Administrator);
        let closed = f
            .service
            .set_room_availability(f.room.id, false, &admin)
            .await
            .unwrap();
        assert!(!closed.available);
        assert!(f.service.active_rooms().await.unwrap().is_empty());

        let err = f
            .service
            .create(request(&f, (10, 0), (11, 0)), &f.teacher)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::Validation(_)));
    }

    #[tokio::test]
    async fn check_availability_is_advisory() {
        let f = fixture();
        let a = reservation(
            f.room.id,
            Uuid::new_v4(),
            at(10, 0),
            at(12, 0),
            ReservationStatus::Confirmed,
        );
        f.source.add_reservation(a.clone());

        let busy = ReservationCandidate::new(f.room.id, at(11, 0), at(13, 0));
        assert_eq!(
            f.service.check_availability(&busy, None).await.unwrap(),
            vec![a.clone()]
        );
        assert!(f
            .service
            .check_availability(&busy, Some(a.id))
            .await
            .unwrap()
            .is_empty());
        assert_eq!(f.source.reservation_count(), 1);
    }

    #[tokio::test]
    async fn unknown_reservation_is_not_found() {
        let f = fixture();
        let err = f
            .service
            .approve(Uuid::new_v4(), &f.secretary)
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::NotFound(_)));
    }
}
