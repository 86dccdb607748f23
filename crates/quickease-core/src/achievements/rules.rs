use super::stats::UserStatsSnapshot;

/// A fixed milestone. `id` matches the badge identifier stored remotely.
#[derive(Debug, Clone, Copy)]
pub struct AchievementRule {
    pub id: &'static str,
    pub title: &'static str,
    pub description: &'static str,
    pub predicate: fn(&UserStatsSnapshot) -> bool,
}

impl AchievementRule {
    pub fn is_met(&self, snapshot: &UserStatsSnapshot) -> bool {
        (self.predicate)(snapshot)
    }
}

/// Evaluation and display order.
pub static RULES: &[AchievementRule] = &[
    AchievementRule {
        id: "first-note",
        title: "First Note",
        description: "Create your first note",
        predicate: |s| s.notes_count >= 1,
    },
    AchievementRule {
        id: "note-collector",
        title: "Note Collector",
        description: "Create 10 notes",
        predicate: |s| s.notes_count >= 10,
    },
    AchievementRule {
        id: "first-flashcard",
        title: "First Flashcard",
        description: "Create your first flashcard",
        predicate: |s| s.flashcard_count >= 1,
    },
    AchievementRule {
        id: "flashcard-collector",
        title: "Flashcard Collector",
        description: "Create 50 flashcards",
        predicate: |s| s.flashcard_count >= 50,
    },
    AchievementRule {
        id: "quiz-scholar",
        title: "Quiz Scholar",
        description: "Keep an average quiz score of 90% or more",
        predicate: |s| s.average_score_percent >= 90.0,
    },
    AchievementRule {
        id: "perfect-quiz-1",
        title: "Perfectionist",
        description: "Score 100% on a quiz",
        predicate: |s| s.perfect_quiz_achieved(),
    },
    AchievementRule {
        id: "perfect-quiz-2",
        title: "Double Perfect",
        description: "Score 100% on two quizzes",
        predicate: |s| s.perfect_quiz_count >= 2,
    },
    AchievementRule {
        id: "perfect-quiz-3",
        title: "Triple Perfect",
        description: "Score 100% on three quizzes",
        predicate: |s| s.perfect_quiz_count >= 3,
    },
];
