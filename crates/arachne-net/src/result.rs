//! Round records and run history for the refinement loop.

use crate::engine::ConfusionSummary;
use crate::weights::WeightVector;

/// Whether a run retains every round or only the best-fitting one.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryMode {
    /// Keep every completed round.
    Full,
    /// Keep only the round with the highest fit quality seen so far.
    BestOnly,
}

/// The outcome of one completed refinement round.
///
/// `weights` holds the normalized importances computed from this round's
/// forest: the vector the NEXT round trains with, which doubles as this
/// round's importance result.
#[derive(Debug, Clone)]
pub struct RoundRecord {
    /// One-based round number.
    pub round: usize,
    /// Normalized importances / next-round weights.
    pub weights: WeightVector,
    /// Fit quality of this round's forest.
    pub fit_quality: f64,
    /// Out-of-bag prediction error of this round's forest.
    pub prediction_error: f64,
    /// Out-of-bag prediction per sample (NaN where uncovered).
    pub oob_predictions: Vec<f64>,
    /// Confusion counts, present for classification runs.
    pub confusion: Option<ConfusionSummary>,
    /// The mtry this round trained with.
    pub mtry: usize,
    /// Predictors still active after reweighting.
    pub active_predictors: usize,
}

/// Ordered record of a refinement run, one entry per retained round.
///
/// Under [`HistoryMode::Full`] the records are every completed round in
/// order; under [`HistoryMode::BestOnly`] a single record survives. Either
/// way [`RunHistory::best`] selects the highest fit quality, breaking ties
/// toward the earliest round.
#[derive(Debug)]
pub struct RunHistory {
    mode: HistoryMode,
    records: Vec<RoundRecord>,
    rounds_completed: usize,
}

impl RunHistory {
    pub(crate) fn new(mode: HistoryMode) -> Self {
        Self {
            mode,
            records: Vec::new(),
            rounds_completed: 0,
        }
    }

    pub(crate) fn push(&mut self, record: RoundRecord) {
        self.rounds_completed = record.round;
        match self.mode {
            HistoryMode::Full => self.records.push(record),
            HistoryMode::BestOnly => {
                if self.records.is_empty() {
                    self.records.push(record);
                } else if record.fit_quality > self.records[0].fit_quality {
                    // Strict comparison keeps the earliest round on ties.
                    self.records[0] = record;
                }
            }
        }
    }

    /// Return the retained rounds in order.
    #[must_use]
    pub fn records(&self) -> &[RoundRecord] {
        &self.records
    }

    /// Return the number of rounds the run completed (retained or not).
    #[must_use]
    pub fn rounds_completed(&self) -> usize {
        self.rounds_completed
    }

    /// Return the best-fitting retained round, if any.
    #[must_use]
    pub fn best(&self) -> Option<&RoundRecord> {
        let mut best: Option<&RoundRecord> = None;
        for record in &self.records {
            match best {
                Some(b) if record.fit_quality > b.fit_quality => best = Some(record),
                None => best = Some(record),
                Some(_) => {}
            }
        }
        best
    }

    /// Consume the history and return the best-fitting round, if any.
    #[must_use]
    pub fn into_best(mut self) -> Option<RoundRecord> {
        let best_round = self.best()?.round;
        let idx = self.records.iter().position(|r| r.round == best_round)?;
        Some(self.records.swap_remove(idx))
    }
}
