//! Stage transition engine.
//!
//! Every question moves `Ask -> (Help) -> Final`. The engine applies one event
//! at a time against a single clock reading taken by the caller, mutates the
//! session's score and level when a question finalizes, and rejects events
//! that do not belong to the current stage without touching the session.

use std::time::Instant;

use crate::error::AssessError;
use crate::ladder::LevelLadder;
use crate::model::{Confidence, EscalationReason, HelpModality, SessionEvent, Stage, Transition};
use crate::policy::{Outcome, TimingPolicy};
use crate::session::{elapsed_since, SessionState};

/// Applies events to a session according to the timing and outcome policy.
#[derive(Debug, Clone)]
pub struct StageEngine {
    ladder: LevelLadder,
    timing: TimingPolicy,
}

impl StageEngine {
    pub fn new(ladder: LevelLadder, timing: TimingPolicy) -> Self {
        Self { ladder, timing }
    }

    pub fn ladder(&self) -> &LevelLadder {
        &self.ladder
    }

    pub fn timing(&self) -> &TimingPolicy {
        &self.timing
    }

    /// Apply `event` observed at `now`.
    ///
    /// Time thresholds are checked before the event itself: a submission that
    /// arrives after the ask stage auto-escalated, or after the help window
    /// closed, is superseded by that transition.
    pub fn handle(
        &self,
        state: &mut SessionState,
        event: &SessionEvent,
        now: Instant,
    ) -> Result<Transition, AssessError> {
        if state.current_question.is_none() {
            return Err(AssessError::NoActiveQuestion);
        }

        let transition = match state.stage {
            Stage::Ask => self.handle_ask(state, event, now)?,
            Stage::Help => self.handle_help(state, event, now)?,
            Stage::Final => {
                return Err(AssessError::OutOfStage {
                    stage: Stage::Final,
                    event: event.name(),
                })
            }
        };

        tracing::debug!(event = event.name(), stage = %state.stage, ?transition, "stage transition");
        Ok(transition)
    }

    fn handle_ask(
        &self,
        state: &mut SessionState,
        event: &SessionEvent,
        now: Instant,
    ) -> Result<Transition, AssessError> {
        let elapsed = elapsed_since(state.ask_started_at, now);

        if self.timing.should_auto_escalate(elapsed) {
            enter_help(state, now);
            return Ok(Transition::AutoEscalated);
        }

        match event {
            SessionEvent::Tick => Ok(Transition::Waiting),
            SessionEvent::SubmitAnswer { answer, confidence } => {
                let correct = current_is_correct(state, answer)?;
                record_first_answer(state, answer, *confidence, elapsed);

                let in_time = self.timing.within_reward_deadline(elapsed);
                let reason = match (correct, in_time) {
                    (true, true) => return self.finalize(state, Outcome::CorrectFirstTry),
                    (false, true) => EscalationReason::Wrong,
                    (true, false) => EscalationReason::Slow,
                    (false, false) => EscalationReason::WrongAndSlow,
                };
                enter_help(state, now);
                Ok(Transition::Escalated { reason })
            }
            other => Err(AssessError::OutOfStage {
                stage: Stage::Ask,
                event: other.name(),
            }),
        }
    }

    fn handle_help(
        &self,
        state: &mut SessionState,
        event: &SessionEvent,
        now: Instant,
    ) -> Result<Transition, AssessError> {
        let elapsed = elapsed_since(state.help_started_at, now);

        if self.timing.help_expired(elapsed) {
            return self.finalize(state, Outcome::HelpTimeout);
        }

        match event {
            SessionEvent::Tick => Ok(Transition::Waiting),
            SessionEvent::ChooseHelp(modality) => {
                if state.pending_choice.is_some() {
                    return Err(AssessError::HelpAlreadyChosen);
                }
                state.pending_choice = Some(*modality);
                Ok(Transition::HelpChosen(*modality))
            }
            SessionEvent::SubmitSecondAnswer { answer } => {
                let modality: HelpModality =
                    state.pending_choice.ok_or(AssessError::NoHelpChosen)?;
                let correct = current_is_correct(state, answer)?;
                state.draft.second_answer = Some(answer.clone());
                state.draft.second_time = Some(elapsed);
                self.finalize(state, Outcome::after_help(modality, correct))
            }
            other => Err(AssessError::OutOfStage {
                stage: Stage::Help,
                event: other.name(),
            }),
        }
    }

    /// Apply the outcome's score delta and level move, then enter `Final`.
    fn finalize(
        &self,
        state: &mut SessionState,
        outcome: Outcome,
    ) -> Result<Transition, AssessError> {
        let effect = outcome.effect();
        let level = self.ladder.apply(&state.level, effect.level_move)?;

        state.score += effect.score_delta;
        state.level = level.clone();
        state.stage = Stage::Final;
        state.draft.outcome = Some(outcome);

        Ok(Transition::Finalized {
            outcome,
            score_delta: effect.score_delta,
            level,
        })
    }
}

fn current_is_correct(state: &SessionState, answer: &str) -> Result<bool, AssessError> {
    state
        .current_question
        .as_ref()
        .map(|q| q.is_correct(answer))
        .ok_or(AssessError::NoActiveQuestion)
}

fn record_first_answer(
    state: &mut SessionState,
    answer: &str,
    confidence: Confidence,
    elapsed: std::time::Duration,
) {
    state.draft.initial_answer = Some(answer.to_string());
    state.draft.confidence = Some(confidence);
    state.draft.initial_time = Some(elapsed);
}

fn enter_help(state: &mut SessionState, now: Instant) {
    state.stage = Stage::Help;
    state.help_started_at = Some(now);
    state.pending_choice = None;
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;
    use std::time::Duration;

    use crate::ladder::{Level, LevelMove};
    use crate::model::Question;

    fn engine() -> StageEngine {
        StageEngine::new(LevelLadder::default(), TimingPolicy::default())
    }

    fn question() -> Arc<Question> {
        Arc::new(Question {
            level: Level::new("B1"),
            text: "I have a ___.".into(),
            options: vec!["cat".into(), "car".into(), "cut".into()],
            answer: "cat".into(),
            hint: "It meows.".into(),
            example: "The cat is asleep.".into(),
        })
    }

    fn started(level: &str) -> (SessionState, Instant) {
        let mut state = SessionState::new(Level::new(level), 20);
        let t0 = Instant::now();
        state.begin_question(question(), t0);
        (state, t0)
    }

    fn secs(s: u64) -> Duration {
        Duration::from_secs(s)
    }

    fn submit(answer: &str) -> SessionEvent {
        SessionEvent::SubmitAnswer {
            answer: answer.into(),
            confidence: Confidence::Medium,
        }
    }

    fn second(answer: &str) -> SessionEvent {
        SessionEvent::SubmitSecondAnswer {
            answer: answer.into(),
        }
    }

    /// Drive a question into `Help` with a wrong first answer at t0+10s.
    fn in_help(level: &str) -> (SessionState, Instant) {
        let e = engine();
        let (mut state, t0) = started(level);
        e.handle(&mut state, &submit("car"), t0 + secs(10)).unwrap();
        assert_eq!(state.stage, Stage::Help);
        (state, t0 + secs(10))
    }

    #[test]
    fn correct_within_deadline_finalizes_up() {
        let e = engine();
        let (mut state, t0) = started("B1");
        let t = e.handle(&mut state, &submit("cat"), t0 + secs(119)).unwrap();

        assert_eq!(
            t,
            Transition::Finalized {
                outcome: Outcome::CorrectFirstTry,
                score_delta: 5,
                level: Level::new("B2"),
            }
        );
        assert_eq!(state.stage, Stage::Final);
        assert_eq!(state.score, 5);
        assert_eq!(state.draft.initial_time, Some(secs(119)));
        assert_eq!(state.draft.confidence, Some(Confidence::Medium));
    }

    #[test]
    fn correct_after_deadline_escalates() {
        let e = engine();
        let (mut state, t0) = started("B1");
        let now = t0 + secs(121);
        let t = e.handle(&mut state, &submit("cat"), now).unwrap();

        assert_eq!(
            t,
            Transition::Escalated {
                reason: EscalationReason::Slow
            }
        );
        assert_eq!(state.stage, Stage::Help);
        assert_eq!(state.help_started_at, Some(now));
        assert_eq!(state.score, 0);
        assert_eq!(state.level, Level::new("B1"));
        assert_eq!(state.draft.initial_answer.as_deref(), Some("cat"));
    }

    #[test]
    fn wrong_answer_escalates_and_clears_choice() {
        let e = engine();
        let (mut state, t0) = started("B1");
        state.pending_choice = Some(HelpModality::Hint);
        let t = e.handle(&mut state, &submit("cut"), t0 + secs(5)).unwrap();
        assert_eq!(
            t,
            Transition::Escalated {
                reason: EscalationReason::Wrong
            }
        );
        assert!(state.pending_choice.is_none());

        let (mut state, t0) = started("B1");
        let t = e.handle(&mut state, &submit("cut"), t0 + secs(150)).unwrap();
        assert_eq!(
            t,
            Transition::Escalated {
                reason: EscalationReason::WrongAndSlow
            }
        );
    }

    #[test]
    fn tick_auto_escalates_at_threshold() {
        let e = engine();
        let (mut state, t0) = started("B1");
        assert_eq!(
            e.handle(&mut state, &SessionEvent::Tick, t0 + secs(177))
                .unwrap(),
            Transition::Waiting
        );
        assert_eq!(state.stage, Stage::Ask);

        let now = t0 + secs(178);
        assert_eq!(
            e.handle(&mut state, &SessionEvent::Tick, now).unwrap(),
            Transition::AutoEscalated
        );
        assert_eq!(state.stage, Stage::Help);
        assert_eq!(state.help_started_at, Some(now));
        assert!(state.draft.initial_answer.is_none());
    }

    #[test]
    fn late_submission_is_superseded_by_auto_escalation() {
        let e = engine();
        let (mut state, t0) = started("B1");
        let t = e.handle(&mut state, &submit("cat"), t0 + secs(179)).unwrap();
        assert_eq!(t, Transition::AutoEscalated);
        assert!(state.draft.initial_answer.is_none());
        assert_eq!(state.score, 0);
    }

    #[test]
    fn help_rows_apply_exactly() {
        let cases = [
            (HelpModality::Hint, "cat", 3, "C1"),
            (HelpModality::Hint, "car", -2, "B1"),
            (HelpModality::Example, "cat", 2, "B2"),
            (HelpModality::Example, "car", -2, "B1"),
        ];
        for (modality, answer, delta, level) in cases {
            let e = engine();
            let (mut state, help_at) = in_help("B2");
            e.handle(&mut state, &SessionEvent::ChooseHelp(modality), help_at + secs(3))
                .unwrap();
            let t = e
                .handle(&mut state, &second(answer), help_at + secs(45))
                .unwrap();

            match t {
                Transition::Finalized { score_delta, .. } => assert_eq!(score_delta, delta),
                other => panic!("expected Finalized, got {other:?}"),
            }
            assert_eq!(state.score, delta);
            assert_eq!(state.level, Level::new(level), "{modality} {answer}");
            assert_eq!(state.draft.second_time, Some(secs(45)));
            assert_eq!(state.draft.second_answer.as_deref(), Some(answer));
        }
    }

    #[test]
    fn example_success_never_moves_up() {
        let outcome = Outcome::after_help(HelpModality::Example, true);
        assert_eq!(outcome.effect().level_move, LevelMove::Stay);
    }

    #[test]
    fn second_answer_at_window_edge_counts() {
        let e = engine();
        let (mut state, help_at) = in_help("B1");
        e.handle(
            &mut state,
            &SessionEvent::ChooseHelp(HelpModality::Hint),
            help_at,
        )
        .unwrap();
        let t = e
            .handle(&mut state, &second("cat"), help_at + secs(60))
            .unwrap();
        assert!(matches!(
            t,
            Transition::Finalized {
                outcome: Outcome::CorrectAfterHint,
                ..
            }
        ));
    }

    #[test]
    fn help_timeout_without_choice() {
        let e = engine();
        let (mut state, help_at) = in_help("B2");
        let t = e
            .handle(&mut state, &SessionEvent::Tick, help_at + secs(61))
            .unwrap();
        assert_eq!(
            t,
            Transition::Finalized {
                outcome: Outcome::HelpTimeout,
                score_delta: -2,
                level: Level::new("B1"),
            }
        );
        assert_eq!(state.score, -2);
        assert!(state.draft.second_answer.is_none());
    }

    #[test]
    fn help_timeout_supersedes_late_second_answer() {
        let e = engine();
        let (mut state, help_at) = in_help("B1");
        e.handle(
            &mut state,
            &SessionEvent::ChooseHelp(HelpModality::Example),
            help_at + secs(1),
        )
        .unwrap();
        let t = e
            .handle(
                &mut state,
                &second("cat"),
                help_at + secs(60) + Duration::from_micros(1),
            )
            .unwrap();
        assert!(matches!(
            t,
            Transition::Finalized {
                outcome: Outcome::HelpTimeout,
                ..
            }
        ));
        assert!(state.draft.second_answer.is_none());
        // Bottom of the ladder: the down step clamps
        assert_eq!(state.level, Level::new("B1"));
        assert_eq!(state.pending_choice, Some(HelpModality::Example));
    }

    #[test]
    fn out_of_stage_events_are_rejected_without_mutation() {
        let e = engine();
        let (mut state, t0) = started("B1");
        let before = state.clone();

        let err = e
            .handle(
                &mut state,
                &SessionEvent::ChooseHelp(HelpModality::Hint),
                t0 + secs(1),
            )
            .unwrap_err();
        assert_eq!(
            err,
            AssessError::OutOfStage {
                stage: Stage::Ask,
                event: "choose_help"
            }
        );
        assert!(e.handle(&mut state, &second("cat"), t0 + secs(1)).is_err());
        assert_eq!(state.stage, before.stage);
        assert_eq!(state.draft, before.draft);

        let (mut state, help_at) = in_help("B1");
        assert!(matches!(
            e.handle(&mut state, &submit("cat"), help_at + secs(1)),
            Err(AssessError::OutOfStage {
                stage: Stage::Help,
                ..
            })
        ));
        assert_eq!(
            e.handle(&mut state, &second("cat"), help_at + secs(1)),
            Err(AssessError::NoHelpChosen)
        );
        e.handle(
            &mut state,
            &SessionEvent::ChooseHelp(HelpModality::Hint),
            help_at + secs(2),
        )
        .unwrap();
        assert_eq!(
            e.handle(
                &mut state,
                &SessionEvent::ChooseHelp(HelpModality::Example),
                help_at + secs(3)
            ),
            Err(AssessError::HelpAlreadyChosen)
        );
        assert_eq!(state.pending_choice, Some(HelpModality::Hint));
    }

    #[test]
    fn final_and_idle_reject_everything() {
        let e = engine();
        let (mut state, t0) = started("B1");
        e.handle(&mut state, &submit("cat"), t0 + secs(1)).unwrap();
        assert!(matches!(
            e.handle(&mut state, &SessionEvent::Tick, t0 + secs(2)),
            Err(AssessError::OutOfStage {
                stage: Stage::Final,
                ..
            })
        ));

        let mut idle = SessionState::new(Level::new("B1"), 1);
        assert_eq!(
            e.handle(&mut idle, &SessionEvent::Tick, t0),
            Err(AssessError::NoActiveQuestion)
        );
    }

    #[test]
    fn score_may_go_negative() {
        let e = engine();
        let (mut state, help_at) = in_help("B1");
        state.score = -4;
        e.handle(&mut state, &SessionEvent::Tick, help_at + secs(90))
            .unwrap();
        assert_eq!(state.score, -6);
    }
}
