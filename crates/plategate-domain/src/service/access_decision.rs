//! Access decision engine

use plategate_types::{AccessDecision, AuditEvent, DeniedPlate, RecognitionResult};

use crate::repository::PlateRegistry;

/// Decide whether a recognition result opens the gate.
///
/// Pure and total: anything not recognized is denied as unrecognized, a
/// recognized plate is granted only when the registry knows it.
pub fn decide<R>(result: &RecognitionResult, registry: &R) -> AccessDecision
where
    R: PlateRegistry + ?Sized,
{
    match result {
        RecognitionResult::NotRecognized(_) => AccessDecision::Denied(DeniedPlate::Unrecognized),
        RecognitionResult::Recognized(plate) => match registry.lookup(plate) {
            Some(record) => AccessDecision::Granted(record.clone()),
            None => AccessDecision::Denied(DeniedPlate::Unlisted(plate.clone())),
        },
    }
}

/// Audit payload for a decided capture attempt
pub fn audit_event_for(decision: &AccessDecision, result: &RecognitionResult) -> AuditEvent {
    let event = match decision {
        AccessDecision::Granted(record) => AuditEvent::granted(record),
        AccessDecision::Denied(plate) => AuditEvent::denied(plate),
    };

    match result {
        RecognitionResult::NotRecognized(reason) => event.with_detail(reason.to_string()),
        RecognitionResult::Recognized(_) => event,
    }
}
