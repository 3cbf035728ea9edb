//! Labels each punish by what the opponent was doing when it started.

use std::collections::HashMap;

use slippi_slp::FrameStore;

use crate::common::{PairFrame, PairTracker, PlayerIndices, fold_pairs};
use crate::punishes::{OpeningType, Punish};

struct OpeningTracker<'p> {
    indices: PlayerIndices,
    punishes: &'p [Punish],
    /// Punish index keyed by (attacker, start frame).
    by_start: &'p HashMap<(u8, i32), usize>,
    /// The opponent punish currently running, if any.
    opponent_punish: Option<usize>,
    labels: Vec<(usize, OpeningType)>,
}

impl PairTracker for OpeningTracker<'_> {
    type Output = (usize, OpeningType);

    fn step(&mut self, frame: &PairFrame<'_>) {
        if let Some(running) = self.opponent_punish {
            if self.punishes[running].end_frame == Some(frame.frame) {
                self.opponent_punish = None;
            }
        }

        if let Some(&started) = self.by_start.get(&(self.indices.opponent_index, frame.frame)) {
            self.opponent_punish = Some(started);
        }

        let Some(&index) = self.by_start.get(&(self.indices.player_index, frame.frame)) else {
            return;
        };

        let opening_type = match self.opponent_punish {
            Some(running) if self.punishes[running].start_frame == frame.frame => OpeningType::Trade,
            Some(_) => OpeningType::CounterAttack,
            None => OpeningType::NeutralWin,
        };

        self.labels.push((index, opening_type));
    }

    fn finish(self) -> Vec<(usize, OpeningType)> {
        self.labels
    }
}

/// Fills in `opening_type` on every punish in `punishes`, which must have
/// come from the same `store`.
pub(crate) fn classify_openings(store: &FrameStore, punishes: &mut [Punish]) {
    let by_start: HashMap<(u8, i32), usize> = punishes
        .iter()
        .enumerate()
        .map(|(index, punish)| ((punish.player_index, punish.start_frame), index))
        .collect();

    let known: &[Punish] = punishes;
    let by_start = &by_start;

    let labels = fold_pairs(store, |indices| OpeningTracker {
        indices,
        punishes: known,
        by_start,
        opponent_punish: None,
        labels: Vec::new(),
    });

    for (index, opening_type) in labels {
        punishes[index].opening_type = opening_type;
    }
}
