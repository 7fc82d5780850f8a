//! Downstream registration events.
//!
//! Publishing is fire-and-forget: the pipeline never waits for consumers and
//! never fails because nobody is listening.

use serde::{Deserialize, Serialize};
use tokio::sync::broadcast;

use assess_model::{AssessmentId, RegistrationChange, StudentId, StudentRegistration};

/// Which pipeline step produced an event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventType {
    /// A registration file row changed a registration.
    StudentRegistration,
    /// Promotion of a staged result changed a registration.
    ResultPromotion,
}

/// What happened to the registration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum EventOutcome {
    Created,
    Updated,
    Deleted,
}

/// One data-changing outcome, as seen by downstream consumers.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegistrationEvent {
    pub event_type: EventType,
    pub student_id: StudentId,
    pub assessment_id: AssessmentId,
    pub outcome: EventOutcome,
    pub payload: StudentRegistration,
}

impl RegistrationEvent {
    pub fn from_change(event_type: EventType, change: &RegistrationChange) -> Self {
        let outcome = match change {
            RegistrationChange::Created(_) => EventOutcome::Created,
            RegistrationChange::Updated(_) => EventOutcome::Updated,
            RegistrationChange::Deleted(_) => EventOutcome::Deleted,
        };
        let payload = change.registration().clone();
        Self {
            event_type,
            student_id: payload.student_id.clone(),
            assessment_id: payload.assessment_id.clone(),
            outcome,
            payload,
        }
    }
}

/// Sink for registration events.
pub trait EventPublisher: Send + Sync {
    fn publish(&self, event: RegistrationEvent);
}

/// Broadcast bus for registration events.
///
/// Sending never blocks; slow subscribers lag and miss old events rather
/// than holding up the pipeline.
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<RegistrationEvent>,
    capacity: usize,
}

impl EventBus {
    /// Create a bus buffering up to `capacity` events per subscriber.
    pub fn new(capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let (tx, _) = broadcast::channel(capacity);
        Self { tx, capacity }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<RegistrationEvent> {
        self.tx.subscribe()
    }

    /// Emit an event to all subscribers.
    ///
    /// Returns `Ok(subscriber_count)`, or `Err` when nobody is subscribed.
    #[allow(clippy::result_large_err)]
    pub fn emit(
        &self,
        event: RegistrationEvent,
    ) -> Result<usize, broadcast::error::SendError<RegistrationEvent>> {
        self.tx.send(event)
    }

    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }
}

impl EventPublisher for EventBus {
    fn publish(&self, event: RegistrationEvent) {
        if let Err(err) = self.emit(event) {
            tracing::warn!(
                outcome = ?err.0.outcome,
                "no subscribers for registration event; dropped"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use assess_model::{CourseStatus, Pen, RegistrationId, SessionId};

    fn registration() -> StudentRegistration {
        StudentRegistration {
            id: RegistrationId::new("R1").unwrap(),
            student_id: StudentId::new("S1").unwrap(),
            pen: Pen::parse("123456789").unwrap(),
            assessment_id: AssessmentId::new("A1").unwrap(),
            assessment_type: "NME10".to_string(),
            session_id: SessionId::new("202409").unwrap(),
            school_of_record_id: None,
            assessment_centre_id: None,
            surname: None,
            given_name: None,
            course_status: CourseStatus::Active,
            proficiency_score: None,
            irt_score: None,
            special_case: None,
            adapted_assessment: None,
        }
    }

    #[test]
    fn test_subscriber_receives_event() {
        let bus = EventBus::new(8);
        let mut rx = bus.subscribe();
        assert_eq!(bus.subscriber_count(), 1);

        let change = RegistrationChange::Deleted(registration());
        bus.publish(RegistrationEvent::from_change(
            EventType::StudentRegistration,
            &change,
        ));

        let event = rx.try_recv().unwrap();
        assert_eq!(event.outcome, EventOutcome::Deleted);
        assert_eq!(event.student_id.as_str(), "S1");
    }

    #[test]
    fn test_publish_without_subscribers_does_not_fail() {
        let bus = EventBus::new(8);
        let change = RegistrationChange::Created(registration());
        let event = RegistrationEvent::from_change(EventType::ResultPromotion, &change);
        assert!(bus.emit(event.clone()).is_err());
        bus.publish(event);
    }

    #[test]
    fn test_zero_capacity_is_raised_to_one() {
        assert_eq!(EventBus::new(0).capacity(), 1);
    }

    #[test]
    fn test_event_serializes_camel_case() {
        let change = RegistrationChange::Updated(registration());
        let event = RegistrationEvent::from_change(EventType::StudentRegistration, &change);
        let json = serde_json::to_value(&event).unwrap();
        assert_eq!(json["eventType"], "STUDENT_REGISTRATION");
        assert_eq!(json["outcome"], "UPDATED");
        assert_eq!(json["assessmentId"], "A1");
    }
}
