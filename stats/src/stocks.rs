use serde::Serialize;
use slippi_slp::FrameStore;

use crate::common::{PairFrame, PairTracker, PlayerIndices, did_lose_stock, fold_pairs, is_dead, percent};

/// One life of a player, from spawning until it's lost.
#[derive(Clone, Debug, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Stock {
    pub player_index: u8,
    pub opponent_index: u8,
    pub start_frame: i32,
    pub end_frame: Option<i32>,
    pub start_percent: f32,
    pub current_percent: f32,
    pub end_percent: Option<f32>,
    /// Stocks remaining when this one began.
    pub count: u8,
    /// Action state on the frame the stock was lost.
    pub death_animation: Option<u16>,
}

#[derive(Debug)]
struct StockTracker {
    indices: PlayerIndices,
    stocks: Vec<Stock>,
    active: Option<usize>,
}

impl StockTracker {
    fn new(indices: PlayerIndices) -> Self {
        Self {
            indices,
            stocks: Vec::new(),
            active: None,
        }
    }
}

impl PairTracker for StockTracker {
    type Output = Stock;

    fn step(&mut self, frame: &PairFrame<'_>) {
        let player = frame.player;

        let Some(index) = self.active else {
            // Wait out the spawn before starting the stock.
            if player.action_state_id.is_some_and(is_dead) {
                return;
            }

            self.active = Some(self.stocks.len());
            self.stocks.push(Stock {
                player_index: self.indices.player_index,
                opponent_index: self.indices.opponent_index,
                start_frame: frame.frame,
                end_frame: None,
                start_percent: 0.0,
                current_percent: 0.0,
                end_percent: None,
                count: player.stocks_remaining.unwrap_or(0),
                death_animation: None,
            });

            return;
        };

        let stock = &mut self.stocks[index];

        if did_lose_stock(player, frame.prev_player) {
            stock.end_frame = Some(frame.frame);
            stock.end_percent = Some(percent(frame.prev_player));
            stock.death_animation = player.action_state_id;
            self.active = None;
        } else {
            stock.current_percent = percent(Some(player));
        }
    }

    fn finish(self) -> Vec<Stock> {
        self.stocks
    }
}

/// Every stock of a singles game, grouped by player and in the order they
/// started. Any other player count yields nothing.
pub fn compute_stocks(store: &FrameStore) -> Vec<Stock> {
    fold_pairs(store, StockTracker::new)
}
