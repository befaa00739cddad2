//! Presentation seam
//!
//! The engine drives a `Presenter`; it never reads anything back from it
//! except the table size and the completion of futures. Visual and logical
//! state are independent: a failed draw is logged and the game carries on.

use std::future::Future;

use glam::Vec2;

use crate::error::RenderError;
use crate::sim::{CupId, GameSummary, RoundReport, SwapMotion, TableLayout};

pub mod headless;
#[cfg(target_arch = "wasm32")]
pub mod dom;

pub use headless::{HeadlessPresenter, PresenterCall};

/// HUD contents, pushed after every phase change
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HudFields {
    pub phase_text: &'static str,
    pub level: u8,
    pub round: u32,
    pub score: u32,
    pub miss: u32,
    pub total_points: u32,
}

/// Everything the round driver asks of a renderer
pub trait Presenter {
    /// Table size in pixels, used to lay out the slots
    fn table_size(&self) -> Vec2;

    /// Draw the cups, `cups[i]` standing in `layout` slot `i`
    fn render_layout(&self, cups: &[CupId], layout: &TableLayout) -> Result<(), RenderError>;

    /// Animate one swap; completes when the cups have landed
    fn animate_swap(&self, motion: &SwapMotion) -> impl Future<Output = Result<(), RenderError>>;

    fn set_ball_visible(&self, visible: bool) -> Result<(), RenderError>;

    fn set_ball_position(&self, slot: usize, at: Vec2) -> Result<(), RenderError>;

    /// Highlight the picked cup as a hit or a miss
    fn mark_pick(&self, _cup: CupId, _correct: bool) -> Result<(), RenderError> {
        Ok(())
    }

    /// Remove pick highlights before the next round
    fn clear_marks(&self) -> Result<(), RenderError> {
        Ok(())
    }

    fn update_hud(&self, hud: &HudFields) -> Result<(), RenderError>;

    /// A round finished (called once per resolved pick)
    fn round_finished(&self, _report: &RoundReport) -> Result<(), RenderError> {
        Ok(())
    }

    /// Final round done; show the results view
    fn game_over(&self, summary: &GameSummary) -> Result<(), RenderError>;

    /// Short, non-blocking message for the player
    fn notify(&self, _message: &str) {}

    /// Suspend for `ms` milliseconds
    fn wait(&self, ms: u32) -> impl Future<Output = ()>;
}
