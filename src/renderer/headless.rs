//! Headless presenter
//!
//! Records every call instead of drawing and never actually waits. Drives the
//! native autoplay binary and the controller tests.

use std::cell::{Cell, RefCell};

use glam::Vec2;

use super::{HudFields, Presenter};
use crate::error::RenderError;
use crate::sim::{CupId, GameSummary, RoundReport, SwapMotion, TableLayout};

/// One recorded presenter call
#[derive(Debug, Clone, PartialEq)]
pub enum PresenterCall {
    Layout(Vec<CupId>),
    Swap(SwapMotion),
    BallVisible(bool),
    BallPosition(usize),
    Mark { cup: CupId, correct: bool },
    ClearMarks,
    Hud(HudFields),
    RoundFinished(RoundReport),
    GameOver(GameSummary),
    Notify(String),
    Wait(u32),
}

#[derive(Debug)]
pub struct HeadlessPresenter {
    table: Vec2,
    calls: RefCell<Vec<PresenterCall>>,
    /// When set, every drawing call fails (waits and notifications still work)
    failing: Cell<bool>,
}

impl Default for HeadlessPresenter {
    fn default() -> Self {
        Self::new(Vec2::new(800.0, 500.0))
    }
}

impl HeadlessPresenter {
    pub fn new(table: Vec2) -> Self {
        Self {
            table,
            calls: RefCell::new(Vec::new()),
            failing: Cell::new(false),
        }
    }

    pub fn set_failing(&self, failing: bool) {
        self.failing.set(failing);
    }

    /// Everything recorded so far
    pub fn calls(&self) -> Vec<PresenterCall> {
        self.calls.borrow().clone()
    }

    /// Drain the recording
    pub fn take_calls(&self) -> Vec<PresenterCall> {
        std::mem::take(&mut *self.calls.borrow_mut())
    }

    /// Whether the ball was last left visible
    pub fn ball_visible(&self) -> bool {
        self.calls
            .borrow()
            .iter()
            .rev()
            .find_map(|c| match c {
                PresenterCall::BallVisible(v) => Some(*v),
                _ => None,
            })
            .unwrap_or(false)
    }

    /// Recorded swap animations, in order
    pub fn swaps(&self) -> Vec<SwapMotion> {
        self.calls
            .borrow()
            .iter()
            .filter_map(|c| match c {
                PresenterCall::Swap(m) => Some(*m),
                _ => None,
            })
            .collect()
    }

    /// Last HUD pushed
    pub fn last_hud(&self) -> Option<HudFields> {
        self.calls.borrow().iter().rev().find_map(|c| match c {
            PresenterCall::Hud(h) => Some(h.clone()),
            _ => None,
        })
    }

    fn record(&self, call: PresenterCall) -> Result<(), RenderError> {
        if self.failing.get() {
            return Err(RenderError(format!("headless presenter refused {:?}", call)));
        }
        log::trace!("{:?}", call);
        self.calls.borrow_mut().push(call);
        Ok(())
    }
}

impl Presenter for HeadlessPresenter {
    fn table_size(&self) -> Vec2 {
        self.table
    }

    fn render_layout(&self, cups: &[CupId], _layout: &TableLayout) -> Result<(), RenderError> {
        self.record(PresenterCall::Layout(cups.to_vec()))
    }

    async fn animate_swap(&self, motion: &SwapMotion) -> Result<(), RenderError> {
        self.record(PresenterCall::Swap(*motion))
    }

    fn set_ball_visible(&self, visible: bool) -> Result<(), RenderError> {
        self.record(PresenterCall::BallVisible(visible))
    }

    fn set_ball_position(&self, slot: usize, _at: Vec2) -> Result<(), RenderError> {
        self.record(PresenterCall::BallPosition(slot))
    }

    fn mark_pick(&self, cup: CupId, correct: bool) -> Result<(), RenderError> {
        self.record(PresenterCall::Mark { cup, correct })
    }

    fn clear_marks(&self) -> Result<(), RenderError> {
        self.record(PresenterCall::ClearMarks)
    }

    fn update_hud(&self, hud: &HudFields) -> Result<(), RenderError> {
        self.record(PresenterCall::Hud(hud.clone()))
    }

    fn round_finished(&self, report: &RoundReport) -> Result<(), RenderError> {
        self.record(PresenterCall::RoundFinished(*report))
    }

    fn game_over(&self, summary: &GameSummary) -> Result<(), RenderError> {
        self.record(PresenterCall::GameOver(*summary))
    }

    fn notify(&self, message: &str) {
        self.calls
            .borrow_mut()
            .push(PresenterCall::Notify(message.to_string()));
    }

    async fn wait(&self, ms: u32) {
        self.calls.borrow_mut().push(PresenterCall::Wait(ms));
    }
}
