//! Monitoring session: per-subject debounce state and the transition
//! notification contract.
//!
//! A session owns one [`DebounceState`] per subject key and a designated
//! driver subject for session-level alerting. Updates for the same
//! subject must arrive from a single writer, in observation order; the
//! session guarantees exactly one event per actual transition and none
//! for frames that do not cross a threshold.

use std::collections::HashMap;

use crate::debounce::{DebounceEngine, DebounceState, Thresholds};
use crate::score;
use crate::{AlertState, FrameObservation, SubjectKey, TransitionEvent};

/// Consumer of transition events (UI overlay, logging, external alarm).
pub trait TransitionSink: Send {
    fn on_transition(&mut self, event: &TransitionEvent);
}

/// Sink that writes each transition to the log at info level.
pub struct LogSink;

impl TransitionSink for LogSink {
    fn on_transition(&mut self, event: &TransitionEvent) {
        log::info!(
            "subject {} {:?} -> {:?} at seq {}",
            event.subject,
            event.from,
            event.to,
            event.seq
        );
    }
}

/// One monitoring session: engine thresholds, per-subject state, and the
/// registered event sinks. Created at monitoring start; dropped (or
/// reset per subject) at session end.
pub struct MonitorSession {
    engine: DebounceEngine,
    subjects: HashMap<SubjectKey, DebounceState>,
    driver: SubjectKey,
    sinks: Vec<Box<dyn TransitionSink>>,
    transition_count: u64,
}

impl MonitorSession {
    pub fn new(thresholds: Thresholds, driver: SubjectKey) -> Self {
        Self {
            engine: DebounceEngine::new(thresholds),
            subjects: HashMap::new(),
            driver,
            sinks: Vec::new(),
            transition_count: 0,
        }
    }

    pub fn thresholds(&self) -> &Thresholds {
        self.engine.thresholds()
    }

    /// The subject whose state answers "is the driver drowsy". Other
    /// subject keys are tracked but informational only.
    pub fn driver_subject(&self) -> &SubjectKey {
        &self.driver
    }

    pub fn add_sink(&mut self, sink: Box<dyn TransitionSink>) {
        self.sinks.push(sink);
    }

    /// Feed one observation for one subject.
    ///
    /// Malformed scores are logged and skipped without touching any
    /// state; a dropped frame must never take down the loop. Returns the
    /// transition event when this frame crossed a debounce threshold.
    pub fn observe(
        &mut self,
        subject: &SubjectKey,
        observation: FrameObservation,
    ) -> Option<TransitionEvent> {
        let Some(evidence) = score::frame_evidence(&observation, self.engine.thresholds()) else {
            log::warn!(
                "skipping malformed observation for subject {} at seq {}: {:?}",
                subject,
                observation.seq,
                observation.score
            );
            return None;
        };

        let state = self.subjects.entry(subject.clone()).or_default();
        let change = self.engine.update(state, observation.seq, evidence)?;

        let event = TransitionEvent {
            subject: subject.clone(),
            from: change.from,
            to: change.to,
            seq: observation.seq,
            trigger: observation,
        };
        self.transition_count += 1;
        for sink in &mut self.sinks {
            sink.on_transition(&event);
        }
        Some(event)
    }

    /// Current state for a subject. `None` means the subject has never
    /// been observed, which is not an error.
    pub fn current_state(&self, subject: &SubjectKey) -> Option<AlertState> {
        self.subjects.get(subject).map(DebounceState::state)
    }

    /// Current state of the designated driver subject.
    pub fn driver_state(&self) -> Option<AlertState> {
        self.current_state(&self.driver)
    }

    /// Explicit re-arm for one subject: counters zeroed, state forced
    /// back to `Alert`. No transition event is emitted.
    pub fn reset(&mut self, subject: &SubjectKey) {
        if let Some(state) = self.subjects.get_mut(subject) {
            state.reset();
            log::info!("subject {} re-armed", subject);
        }
    }

    /// Total transitions emitted across all subjects this session.
    pub fn transition_count(&self) -> u64 {
        self.transition_count
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::score::RawScore;
    use std::sync::{Arc, Mutex};

    fn session() -> MonitorSession {
        let thresholds = Thresholds::new(0.25, 3, 2, 3).expect("valid thresholds");
        MonitorSession::new(thresholds, SubjectKey::from("subject:driver"))
    }

    fn ratio_frame(seq: u64, ratio: f32) -> FrameObservation {
        FrameObservation::detected(seq, RawScore::GeometricRatio { ratio })
    }

    struct RecordingSink(Arc<Mutex<Vec<TransitionEvent>>>);

    impl TransitionSink for RecordingSink {
        fn on_transition(&mut self, event: &TransitionEvent) {
            self.0.lock().expect("sink lock").push(event.clone());
        }
    }

    #[test]
    fn unknown_subject_has_no_state() {
        let session = session();
        assert_eq!(
            session.current_state(&SubjectKey::from("subject:passenger")),
            None
        );
        assert_eq!(session.driver_state(), None);
    }

    #[test]
    fn sinks_receive_each_transition_once() {
        let mut session = session();
        let events = Arc::new(Mutex::new(Vec::new()));
        session.add_sink(Box::new(RecordingSink(events.clone())));

        let driver = session.driver_subject().clone();
        for seq in 0..3 {
            session.observe(&driver, ratio_frame(seq, 0.10));
        }

        let events = events.lock().expect("sink lock");
        assert_eq!(events.len(), 1);
        assert_eq!(events[0].to, AlertState::Drowsy);
        assert_eq!(events[0].seq, 2);
        assert_eq!(session.transition_count(), 1);
    }

    #[test]
    fn malformed_observation_is_skipped_without_creating_state() {
        let mut session = session();
        let driver = session.driver_subject().clone();

        let result = session.observe(&driver, ratio_frame(0, f32::NAN));
        assert_eq!(result, None);
        assert_eq!(session.driver_state(), None);
    }

    #[test]
    fn subjects_are_debounced_independently() {
        let mut session = session();
        let driver = session.driver_subject().clone();
        let passenger = SubjectKey::from("subject:passenger");

        for seq in 0..3 {
            session.observe(&driver, ratio_frame(seq, 0.10));
            session.observe(&passenger, ratio_frame(seq, 0.35));
        }

        assert_eq!(session.driver_state(), Some(AlertState::Drowsy));
        assert_eq!(
            session.current_state(&passenger),
            Some(AlertState::Alert)
        );
    }

    #[test]
    fn reset_forces_alert_without_an_event() {
        let mut session = session();
        let driver = session.driver_subject().clone();

        for seq in 0..3 {
            session.observe(&driver, ratio_frame(seq, 0.10));
        }
        assert_eq!(session.driver_state(), Some(AlertState::Drowsy));

        session.reset(&driver);
        assert_eq!(session.driver_state(), Some(AlertState::Alert));
        assert_eq!(session.transition_count(), 1);
    }
}
