//! User statistics snapshot.
//!
//! A snapshot is always rebuilt from the full collections fetched from the
//! backend; nothing is maintained incrementally.

use serde::{Deserialize, Serialize};

use crate::backend::{Flashcard, Note, QuizRecord};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserStatsSnapshot {
    pub notes_count: u32,
    pub flashcard_count: u32,
    /// Total earned over total possible points across all quizzes, 0..=100.
    pub average_score_percent: f64,
    /// Quizzes where every possible point was earned.
    pub perfect_quiz_count: u32,
}

impl UserStatsSnapshot {
    pub fn from_collections(notes: &[Note], flashcards: &[Flashcard], quizzes: &[QuizRecord]) -> Self {
        let (earned, possible) = quizzes.iter().fold((0u64, 0u64), |(e, p), q| {
            (e + u64::from(q.earned_points), p + u64::from(q.possible_points))
        });
        let average_score_percent = if possible == 0 {
            0.0
        } else {
            (earned as f64 / possible as f64 * 100.0).clamp(0.0, 100.0)
        };
        let perfect_quiz_count = quizzes.iter().filter(|q| q.is_perfect()).count();

        Self {
            notes_count: saturating_u32(notes.len()),
            flashcard_count: saturating_u32(flashcards.len()),
            average_score_percent,
            perfect_quiz_count: saturating_u32(perfect_quiz_count),
        }
    }

    pub fn perfect_quiz_achieved(&self) -> bool {
        self.perfect_quiz_count >= 1
    }
}

fn saturating_u32(n: usize) -> u32 {
    u32::try_from(n).unwrap_or(u32::MAX)
}
