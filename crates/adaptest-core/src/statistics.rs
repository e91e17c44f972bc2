//! Summary statistics over a finished session log.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::ladder::{Level, LevelLadder};
use crate::policy::Outcome;
use crate::record::SessionLog;

/// Aggregate figures for one session.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SessionStats {
    pub questions: usize,
    pub first_try_correct: usize,
    /// `first_try_correct / questions`, 0.0 for an empty log.
    pub first_try_rate: f64,
    pub help_taken: usize,
    pub hint_count: usize,
    pub example_count: usize,
    pub help_timeouts: usize,
    pub correct_after_help: usize,
    /// Mean seconds to the first answer over questions that have one.
    pub mean_initial_time: Option<f64>,
    /// Questions drawn per level.
    pub per_level: BTreeMap<Level, usize>,
    /// Highest level held after any question.
    pub peak_level: Option<Level>,
    /// Score after each question, in order.
    pub score_trajectory: Vec<i32>,
}

impl SessionStats {
    /// Compute statistics for `log`. `peak_level` follows the order of
    /// `ladder`, or of the default B1..C2 ladder when none is given; levels
    /// not on the ladder are not ranked.
    pub fn from_log(log: &SessionLog, ladder: Option<&LevelLadder>) -> Self {
        let records = &log.records;
        let mut stats = SessionStats {
            questions: records.len(),
            ..Default::default()
        };

        let mut initial_times = Vec::new();
        for r in records {
            match r.outcome {
                Outcome::CorrectFirstTry => stats.first_try_correct += 1,
                Outcome::CorrectAfterHint | Outcome::CorrectAfterExample => {
                    stats.correct_after_help += 1
                }
                Outcome::HelpTimeout => stats.help_timeouts += 1,
                Outcome::WrongAfterHint | Outcome::WrongAfterExample => {}
            }
            stats.hint_count += usize::from(r.hint_binary);
            stats.example_count += usize::from(r.example_binary);
            if r.used_help() {
                stats.help_taken += 1;
            }
            if let Some(t) = r.initial_time {
                initial_times.push(t);
            }
            *stats.per_level.entry(r.level.clone()).or_insert(0) += 1;
            stats.score_trajectory.push(r.score_after);
        }

        if stats.questions > 0 {
            stats.first_try_rate = stats.first_try_correct as f64 / stats.questions as f64;
        }
        if !initial_times.is_empty() {
            stats.mean_initial_time =
                Some(initial_times.iter().sum::<f64>() / initial_times.len() as f64);
        }

        let default_ladder;
        let ladder = match ladder {
            Some(ladder) => ladder,
            None => {
                default_ladder = LevelLadder::default();
                &default_ladder
            }
        };
        stats.peak_level = records
            .iter()
            .filter_map(|r| ladder.position(&r.level_after).ok().map(|p| (p, r)))
            .max_by_key(|(p, _)| *p)
            .map(|(_, r)| r.level_after.clone());

        stats
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::tests::{make_log, make_record};

    #[test]
    fn empty_log() {
        let stats = SessionStats::from_log(&make_log(vec![]), None);
        assert_eq!(stats.questions, 0);
        assert_eq!(stats.first_try_rate, 0.0);
        assert!(stats.mean_initial_time.is_none());
        assert!(stats.peak_level.is_none());
    }

    #[test]
    fn counts_each_outcome() {
        let mut timeout = make_record(4, Outcome::HelpTimeout, 6);
        timeout.initial_time = None;
        let log = make_log(vec![
            make_record(1, Outcome::CorrectFirstTry, 5),
            make_record(2, Outcome::CorrectAfterHint, 8),
            make_record(3, Outcome::WrongAfterExample, 6),
            timeout,
        ]);
        let stats = SessionStats::from_log(&log, None);

        assert_eq!(stats.questions, 4);
        assert_eq!(stats.first_try_correct, 1);
        assert_eq!(stats.first_try_rate, 0.25);
        assert_eq!(stats.help_taken, 2);
        assert_eq!(stats.hint_count, 1);
        assert_eq!(stats.example_count, 1);
        assert_eq!(stats.help_timeouts, 1);
        assert_eq!(stats.correct_after_help, 1);
        assert_eq!(stats.mean_initial_time, Some(12.5));
        assert_eq!(stats.per_level.get(&Level::new("B1")), Some(&4));
        assert_eq!(stats.score_trajectory, vec![5, 8, 6, 6]);
    }

    #[test]
    fn peak_level_follows_ladder_order() {
        let mut a = make_record(1, Outcome::CorrectFirstTry, 5);
        a.level_after = Level::new("C1");
        let mut b = make_record(2, Outcome::WrongAfterHint, 3);
        b.level_after = Level::new("B2");
        let log = make_log(vec![a, b]);

        let ladder = LevelLadder::default();
        let stats = SessionStats::from_log(&log, Some(&ladder));
        assert_eq!(stats.peak_level, Some(Level::new("C1")));
    }

    #[test]
    fn peak_level_without_ladder_uses_default_order() {
        let levels = ["B1", "B2", "C1", "B2"];
        let records = levels
            .iter()
            .enumerate()
            .map(|(i, level)| {
                let mut r = make_record(i as u32 + 1, Outcome::CorrectFirstTry, 5);
                r.level_after = Level::new(*level);
                r
            })
            .collect();
        let stats = SessionStats::from_log(&make_log(records), None);
        assert_eq!(stats.peak_level, Some(Level::new("C1")));
    }

    #[test]
    fn off_ladder_levels_are_not_ranked() {
        let mut r = make_record(1, Outcome::CorrectFirstTry, 5);
        r.level_after = Level::new("A2");
        let stats = SessionStats::from_log(&make_log(vec![r]), None);
        assert_eq!(stats.peak_level, None);

        let ladder = LevelLadder::new(["A1", "A2"]).unwrap();
        let mut r = make_record(1, Outcome::CorrectFirstTry, 5);
        r.level_after = Level::new("A2");
        let stats = SessionStats::from_log(&make_log(vec![r]), Some(&ladder));
        assert_eq!(stats.peak_level, Some(Level::new("A2")));
    }
}
