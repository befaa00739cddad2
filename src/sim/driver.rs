//! Async round driver
//!
//! `GameController` owns one session's `RoundMachine` and a presenter, and
//! walks the machine through its phases with explicit `.await` points: one
//! per swap animation and one per fixed display delay.
//!
//! The machine lives in a `RefCell` and is never borrowed across an `.await`,
//! so input arriving mid-animation reaches the machine and gets dropped by
//! phase instead of panicking or queueing.

use std::cell::RefCell;

use super::cups::CupId;
use super::round::{CooldownExit, RoundMachine};
use super::state::{GameSummary, RoundPhase};
use crate::consts::{COOLDOWN_MS, HINT_MS, RESOLVE_DELAY_MS};
use crate::error::{GameError, RenderError};
use crate::leaderboard::{LeaderboardEntry, sanitize_name};
use crate::renderer::{HudFields, Presenter};

/// One game session
pub struct GameController<P: Presenter> {
    machine: RefCell<RoundMachine>,
    presenter: P,
}

impl<P: Presenter> GameController<P> {
    pub fn new(presenter: P, seed: u64, rounds_per_game: u32) -> Self {
        Self {
            machine: RefCell::new(RoundMachine::new(seed, rounds_per_game)),
            presenter,
        }
    }

    pub fn presenter(&self) -> &P {
        &self.presenter
    }

    pub fn phase(&self) -> RoundPhase {
        self.machine.borrow().phase()
    }

    /// Cups in slot order (empty before setup)
    pub fn cups(&self) -> Vec<CupId> {
        self.machine
            .borrow()
            .state()
            .map(|s| s.board.cups().to_vec())
            .unwrap_or_default()
    }

    pub fn summary(&self) -> Option<GameSummary> {
        self.machine.borrow().summary()
    }

    /// Run `f` against the machine. For read-only inspection.
    pub fn with_machine<T>(&self, f: impl FnOnce(&RoundMachine) -> T) -> T {
        f(&self.machine.borrow())
    }

    /// Log a presenter failure and tell the player. Core state stays as is.
    fn paint(&self, result: Result<(), RenderError>) {
        if let Err(e) = result {
            log::warn!("{}", GameError::RenderFailure(e));
            self.presenter.notify("Display glitch, the game continues");
        }
    }

    fn refresh_hud(&self) {
        let hud = {
            let machine = self.machine.borrow();
            let phase = machine.phase();
            match machine.state() {
                Some(s) => HudFields {
                    phase_text: phase.label(),
                    level: s.level(),
                    round: s.round,
                    score: s.score,
                    miss: s.miss_count,
                    total_points: s.total_points,
                },
                None => HudFields {
                    phase_text: phase.label(),
                    level: 0,
                    round: 0,
                    score: 0,
                    miss: 0,
                    total_points: 0,
                },
            }
        };
        self.paint(self.presenter.update_hud(&hud));
    }

    /// Put the ball under `slot` (visibility untouched)
    fn place_ball(&self, slot: usize) {
        let at = self
            .machine
            .borrow()
            .state()
            .and_then(|s| s.layout.ball_position(slot));
        if let Some(at) = at {
            self.paint(self.presenter.set_ball_position(slot, at));
        }
    }

    /// Set up a new board for `level` and play the opening reveal.
    ///
    /// Also serves as restart: whatever was in flight becomes stale.
    pub async fn start(&self, level: u8) -> Result<(), GameError> {
        let table = self.presenter.table_size();
        let plan = self.machine.borrow_mut().setup(level, table)?;

        self.paint(self.presenter.clear_marks());
        self.paint(self.presenter.render_layout(&plan.cups, &plan.layout));
        self.paint(self.presenter.set_ball_visible(false));
        self.place_ball(plan.answer_slot);

        let intro = self.machine.borrow_mut().finish_setup(&plan.ticket);
        self.refresh_hud();

        if let Some(ms) = intro {
            self.paint(self.presenter.set_ball_visible(true));
            self.presenter.wait(ms).await;
            if self.machine.borrow_mut().finish_intro(&plan.ticket) {
                self.paint(self.presenter.set_ball_visible(false));
                self.refresh_hud();
            }
        }
        Ok(())
    }

    /// Run a full shuffle: each swap is animated, then committed, before the
    /// next one starts.
    pub async fn shuffle(&self) -> Result<(), GameError> {
        let Some(job) = self.machine.borrow_mut().begin_shuffle()? else {
            return Ok(());
        };

        self.paint(self.presenter.set_ball_visible(false));
        self.refresh_hud();

        for pair in job.pairs.iter().copied() {
            let Some(motion) = self.machine.borrow_mut().swap_motion(&job.ticket, pair) else {
                log::debug!("Shuffle abandoned (session moved on)");
                return Ok(());
            };

            self.paint(self.presenter.animate_swap(&motion).await);

            if !self.machine.borrow_mut().commit_swap(&job.ticket, pair) {
                log::debug!("Shuffle abandoned after animation (session moved on)");
                return Ok(());
            }
        }

        if self.machine.borrow_mut().finish_shuffle(&job.ticket) {
            let answer = self
                .machine
                .borrow()
                .state()
                .map(|s| s.board.answer_slot_index());
            if let Some(slot) = answer {
                self.place_ball(slot);
            }
            self.refresh_hud();
        }
        Ok(())
    }

    /// Pick a cup, show the result, then move on to the next round or the
    /// results view.
    pub async fn pick(&self, cup: CupId) -> Result<(), GameError> {
        let Some(res) = self.machine.borrow_mut().pick(cup)? else {
            return Ok(());
        };

        self.paint(self.presenter.mark_pick(res.picked, res.correct));
        self.place_ball(res.answer_slot);
        self.paint(self.presenter.set_ball_visible(true));
        self.refresh_hud();

        self.presenter.wait(RESOLVE_DELAY_MS).await;

        // Round-completion notifier: the Resolving -> Cooldown step itself
        let Some(report) = self.machine.borrow_mut().finish_resolve(&res.ticket) else {
            return Ok(());
        };
        self.paint(self.presenter.round_finished(&report));
        self.refresh_hud();

        self.presenter.wait(COOLDOWN_MS).await;

        let exit = self.machine.borrow_mut().finish_cooldown(&res.ticket);
        match exit {
            Some(CooldownExit::NextRound) => {
                self.paint(self.presenter.set_ball_visible(false));
                self.paint(self.presenter.clear_marks());
                self.refresh_hud();
            }
            Some(CooldownExit::Ended(summary)) => {
                self.refresh_hud();
                self.paint(self.presenter.game_over(&summary));
            }
            None => {}
        }
        Ok(())
    }

    /// Show where the ball is, once per round, then hide it again
    pub async fn reveal(&self) -> Result<(), GameError> {
        let Some(hint) = self.machine.borrow_mut().reveal_answer()? else {
            return Ok(());
        };

        self.place_ball(hint.answer_slot);
        self.paint(self.presenter.set_ball_visible(true));
        self.refresh_hud();

        self.presenter.wait(HINT_MS).await;

        if self.machine.borrow_mut().hint_expired(&hint.ticket) {
            self.paint(self.presenter.set_ball_visible(false));
        }
        Ok(())
    }

    /// Abandon the session and go back to `Idle`
    pub fn reset(&self) {
        self.machine.borrow_mut().reset();
        self.paint(self.presenter.set_ball_visible(false));
        self.paint(self.presenter.clear_marks());
        self.refresh_hud();
    }

    /// Leaderboard entry for the current totals; None before setup.
    /// Building it never touches the session.
    pub fn entry_for(&self, name: &str, timestamp: i64) -> Option<LeaderboardEntry> {
        let summary = self.summary()?;
        Some(LeaderboardEntry {
            name: sanitize_name(name),
            score: summary.score,
            miss_count: summary.miss_count,
            total_points: summary.total_points,
            level: summary.level,
            timestamp,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::leaderboard::Leaderboard;
    use crate::persistence::MemoryStorage;
    use crate::renderer::{HeadlessPresenter, PresenterCall};
    use pollster::block_on;

    fn controller(rounds: u32) -> GameController<HeadlessPresenter> {
        GameController::new(HeadlessPresenter::default(), 4242, rounds)
    }

    fn ball_cup(ctrl: &GameController<HeadlessPresenter>) -> CupId {
        ctrl.with_machine(|m| m.state().unwrap().board.ball_cup())
    }

    #[test]
    fn test_start_plays_intro() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);

        let calls = ctrl.presenter().calls();
        assert!(matches!(calls[1], PresenterCall::Layout(ref cups) if cups.len() == 3));
        assert!(calls.contains(&PresenterCall::BallVisible(true)));
        assert!(calls.contains(&PresenterCall::Wait(1500)));
        assert!(!ctrl.presenter().ball_visible());
        assert_eq!(ctrl.presenter().last_hud().unwrap().phase_text, "Ready");
    }

    #[test]
    fn test_blind_level_skips_intro() {
        let ctrl = controller(3);
        block_on(ctrl.start(4)).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);
        let calls = ctrl.presenter().calls();
        assert!(!calls.contains(&PresenterCall::BallVisible(true)));
        assert!(!calls.iter().any(|c| matches!(c, PresenterCall::Wait(_))));
    }

    #[test]
    fn test_start_invalid_level() {
        let ctrl = controller(3);
        assert_eq!(block_on(ctrl.start(7)), Err(GameError::InvalidLevel(7)));
        assert_eq!(ctrl.phase(), RoundPhase::Idle);
        assert!(ctrl.presenter().calls().is_empty());
    }

    #[test]
    fn test_shuffle_animates_then_commits() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        ctrl.presenter().take_calls();

        block_on(ctrl.shuffle()).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitPick);

        let swaps = ctrl.presenter().swaps();
        assert_eq!(swaps.len(), 8);
        assert!(swaps.iter().all(|m| m.duration_ms == 800));

        // Replaying the animated swaps from a fresh layout reproduces the board
        let mut cups: Vec<CupId> = (0..3).map(CupId).collect();
        for m in &swaps {
            assert_eq!(cups[m.pair.i], m.first);
            assert_eq!(cups[m.pair.j], m.second);
            cups.swap(m.pair.i, m.pair.j);
        }
        assert_eq!(ctrl.cups(), cups);

        // Ball stays hidden for the whole shuffle
        assert!(!ctrl.presenter().ball_visible());
        assert!(
            !ctrl
                .presenter()
                .calls()
                .contains(&PresenterCall::BallVisible(true))
        );
    }

    #[test]
    fn test_input_before_setup_not_ready() {
        let ctrl = controller(3);
        assert_eq!(block_on(ctrl.shuffle()), Err(GameError::NotReady));
        assert_eq!(block_on(ctrl.pick(CupId(0))), Err(GameError::NotReady));
        assert_eq!(block_on(ctrl.reveal()), Err(GameError::NotReady));
        assert_eq!(ctrl.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_pick_before_shuffle_dropped() {
        let ctrl = controller(3);
        block_on(ctrl.start(2)).unwrap();
        ctrl.presenter().take_calls();
        block_on(ctrl.pick(CupId(0))).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);
        assert!(ctrl.presenter().calls().is_empty());
    }

    #[test]
    fn test_correct_pick_round_trip() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        let ball = ball_cup(&ctrl);
        ctrl.presenter().take_calls();

        block_on(ctrl.pick(ball)).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);

        let calls = ctrl.presenter().calls();
        assert!(calls.contains(&PresenterCall::Mark {
            cup: ball,
            correct: true
        }));
        assert!(calls.contains(&PresenterCall::Wait(RESOLVE_DELAY_MS)));
        assert!(calls.contains(&PresenterCall::Wait(COOLDOWN_MS)));
        let report = calls
            .iter()
            .find_map(|c| match c {
                PresenterCall::RoundFinished(r) => Some(*r),
                _ => None,
            })
            .unwrap();
        assert!(report.correct);
        assert_eq!(report.total_points, 10);

        let hud = ctrl.presenter().last_hud().unwrap();
        assert_eq!(hud.round, 2);
        assert_eq!(hud.score, 1);
        assert_eq!(hud.miss, 0);
    }

    #[test]
    fn test_game_ends_after_configured_rounds() {
        let ctrl = controller(2);
        block_on(ctrl.start(3)).unwrap();
        for _ in 0..2 {
            block_on(ctrl.shuffle()).unwrap();
            let cups = ctrl.cups();
            let ball = ball_cup(&ctrl);
            let wrong = *cups.iter().find(|&&c| c != ball).unwrap();
            block_on(ctrl.pick(wrong)).unwrap();
        }
        assert_eq!(ctrl.phase(), RoundPhase::Ended);

        let summary = ctrl.summary().unwrap();
        assert_eq!(summary.miss_count, 2);
        assert_eq!(summary.score, 0);
        assert!(
            ctrl.presenter()
                .calls()
                .contains(&PresenterCall::GameOver(summary))
        );

        // Ended is terminal until a restart
        block_on(ctrl.shuffle()).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::Ended);
        block_on(ctrl.start(3)).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);
        assert_eq!(ctrl.summary().unwrap().miss_count, 0);
    }

    #[test]
    fn test_reveal_hint_once() {
        let ctrl = controller(3);
        block_on(ctrl.start(4)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        ctrl.presenter().take_calls();

        block_on(ctrl.reveal()).unwrap();
        let answer = ctrl.with_machine(|m| m.state().unwrap().board.answer_slot_index());
        let calls = ctrl.presenter().calls();
        assert!(calls.contains(&PresenterCall::BallPosition(answer)));
        assert!(calls.contains(&PresenterCall::BallVisible(true)));
        assert!(calls.contains(&PresenterCall::Wait(HINT_MS)));
        assert!(!ctrl.presenter().ball_visible());

        assert_eq!(block_on(ctrl.reveal()), Err(GameError::RevealUsed));
        assert_eq!(ctrl.phase(), RoundPhase::AwaitPick);
        assert!(ctrl.with_machine(|m| m.state().unwrap().reveal_used));
    }

    #[test]
    fn test_render_failure_keeps_state() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        ctrl.presenter().set_failing(true);

        block_on(ctrl.shuffle()).unwrap();
        assert_eq!(ctrl.phase(), RoundPhase::AwaitPick);

        let ball = ball_cup(&ctrl);
        block_on(ctrl.pick(ball)).unwrap();
        let summary = ctrl.summary().unwrap();
        assert_eq!(summary.score, 1);
        assert_eq!(summary.total_points, 10);
        assert!(
            ctrl.presenter()
                .calls()
                .iter()
                .any(|c| matches!(c, PresenterCall::Notify(_)))
        );
    }

    #[test]
    fn test_reset_returns_to_idle() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        ctrl.reset();
        assert_eq!(ctrl.phase(), RoundPhase::Idle);
        assert!(ctrl.cups().is_empty());
        assert!(ctrl.entry_for("sam", 0).is_none());
        assert_eq!(block_on(ctrl.pick(CupId(0))), Err(GameError::NotReady));
    }

    #[test]
    fn test_entry_for_session() {
        let ctrl = controller(3);
        block_on(ctrl.start(2)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        let ball = ball_cup(&ctrl);
        block_on(ctrl.pick(ball)).unwrap();

        let entry = ctrl.entry_for("  Jo  ", 1_700_000_000_000).unwrap();
        assert_eq!(entry.name, "Jo");
        assert_eq!(entry.score, 1);
        assert_eq!(entry.total_points, 20);
        assert_eq!(entry.level, 2);
        assert_eq!(entry.timestamp, 1_700_000_000_000);
    }

    #[test]
    fn test_failed_save_keeps_session_totals() {
        let ctrl = controller(3);
        block_on(ctrl.start(1)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        let ball = ball_cup(&ctrl);
        block_on(ctrl.pick(ball)).unwrap();
        block_on(ctrl.shuffle()).unwrap();
        let wrong = *ctrl.cups().iter().find(|&&c| c != ball_cup(&ctrl)).unwrap();
        block_on(ctrl.pick(wrong)).unwrap();

        let before = ctrl.summary().unwrap();
        assert_eq!((before.score, before.miss_count), (1, 1));
        let entry = ctrl.entry_for("Ada", 1_700_000_000_000).unwrap();

        let mut board = Leaderboard::new(MemoryStorage::new());
        board.storage_mut().set_fail_writes(true);
        assert!(matches!(
            board.append(entry.clone()),
            Err(GameError::StorageFailure(_))
        ));
        assert!(board.is_empty());

        assert_eq!(ctrl.summary().unwrap(), before);
        assert_eq!(ctrl.entry_for("Ada", 1_700_000_000_000).unwrap(), entry);
        assert_eq!(ctrl.phase(), RoundPhase::AwaitShuffle);

        board.storage_mut().set_fail_writes(false);
        assert_eq!(board.append(entry.clone()).unwrap(), 1);
        assert_eq!(board.entries(), vec![entry]);
    }
}
