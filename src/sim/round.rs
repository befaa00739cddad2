//! Round state machine
//!
//! Synchronous transitions only. The async driver calls in here between
//! suspension points; every call either advances the phase, drops the input
//! (wrong phase), or reports an error without touching state.
//!
//! Lifecycle:
//! `Idle → Setup → (RevealIntro) → AwaitShuffle → Shuffling → AwaitPick →
//! Resolving → Cooldown → AwaitShuffle | Ended`

use glam::Vec2;

use super::cups::{CupBoard, CupId};
use super::layout::{SwapMotion, TableLayout};
use super::rng::GameRng;
use super::shuffle::{SwapPair, plan_swaps};
use super::state::{GameSummary, RoundPhase, RoundReport, RoundState, Ticket};
use crate::consts::{SWAP_LIFT_MAX, SWAP_LIFT_MIN};
use crate::difficulty::config_for;
use crate::error::GameError;

/// Fresh board, ready to be drawn
#[derive(Debug, Clone)]
pub struct SetupPlan {
    pub ticket: Ticket,
    pub cups: Vec<CupId>,
    pub layout: TableLayout,
    pub answer_slot: usize,
}

/// Swaps for one shuffle, to be animated and committed in order
#[derive(Debug, Clone)]
pub struct ShuffleJob {
    pub ticket: Ticket,
    pub pairs: Vec<SwapPair>,
}

/// Outcome of an accepted pick
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Resolution {
    pub ticket: Ticket,
    pub picked: CupId,
    pub picked_slot: usize,
    pub answer_slot: usize,
    pub correct: bool,
}

/// Accepted hint request
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Hint {
    pub ticket: Ticket,
    pub answer_slot: usize,
}

/// Where the machine went after the cooldown
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CooldownExit {
    NextRound,
    Ended(GameSummary),
}

/// One game session's round lifecycle
#[derive(Debug, Clone)]
pub struct RoundMachine {
    rng: GameRng,
    rounds_per_game: u32,
    generation: u64,
    state: Option<RoundState>,
}

impl RoundMachine {
    pub fn new(seed: u64, rounds_per_game: u32) -> Self {
        Self {
            rng: GameRng::new(seed),
            rounds_per_game: rounds_per_game.max(1),
            generation: 0,
            state: None,
        }
    }

    pub fn phase(&self) -> RoundPhase {
        self.state.as_ref().map_or(RoundPhase::Idle, |s| s.phase)
    }

    pub fn state(&self) -> Option<&RoundState> {
        self.state.as_ref()
    }

    pub fn rounds_per_game(&self) -> u32 {
        self.rounds_per_game
    }

    pub fn summary(&self) -> Option<GameSummary> {
        self.state.as_ref().map(RoundState::summary)
    }

    /// Whether a continuation holding `ticket` may still act
    pub fn is_current(&self, ticket: &Ticket) -> bool {
        self.state
            .as_ref()
            .is_some_and(|s| ticket.generation == self.generation && ticket.round == s.round)
    }

    fn ticket(&self) -> Option<Ticket> {
        self.state.as_ref().map(|s| Ticket {
            generation: self.generation,
            round: s.round,
        })
    }

    /// State for `ticket`, only while the round is in `phase`
    fn state_in(&mut self, ticket: &Ticket, phase: RoundPhase) -> Option<&mut RoundState> {
        if !self.is_current(ticket) {
            log::debug!("Stale continuation ignored ({:?})", ticket);
            return None;
        }
        self.state.as_mut().filter(|s| s.phase == phase)
    }

    /// Build a new board for `level` and enter `Setup`.
    ///
    /// Allowed from any phase (this is also how a restart happens). An unknown
    /// level leaves the current session untouched.
    pub fn setup(&mut self, level: u8, table: Vec2) -> Result<SetupPlan, GameError> {
        let config = config_for(level)?;
        let board = CupBoard::initialize(config.cup_count, &mut self.rng)?;
        let layout = TableLayout::for_table(config.cup_count, table);

        self.generation += 1;
        let plan = SetupPlan {
            ticket: Ticket {
                generation: self.generation,
                round: 1,
            },
            cups: board.cups().to_vec(),
            layout: layout.clone(),
            answer_slot: board.answer_slot_index(),
        };

        self.state = Some(RoundState {
            config,
            board,
            layout,
            phase: RoundPhase::Setup,
            round: 1,
            score: 0,
            miss_count: 0,
            total_points: 0,
            reveal_used: false,
            picked: None,
        });

        log::info!(
            "Level {} set up: {} cups, answer in slot {}",
            level,
            config.cup_count,
            plan.answer_slot
        );
        Ok(plan)
    }

    /// Layout is drawn. Returns the opening reveal duration when the level
    /// shows the ball first, otherwise goes straight to `AwaitShuffle`.
    pub fn finish_setup(&mut self, ticket: &Ticket) -> Option<u32> {
        let state = self.state_in(ticket, RoundPhase::Setup)?;
        if state.config.reveal_at_start {
            state.phase = RoundPhase::RevealIntro;
            Some(state.config.reveal_ms)
        } else {
            state.phase = RoundPhase::AwaitShuffle;
            None
        }
    }

    /// Opening reveal is over; returns false when the ticket went stale
    pub fn finish_intro(&mut self, ticket: &Ticket) -> bool {
        match self.state_in(ticket, RoundPhase::RevealIntro) {
            Some(state) => {
                state.phase = RoundPhase::AwaitShuffle;
                true
            }
            None => false,
        }
    }

    /// Start a shuffle.
    ///
    /// `NotReady` before the board exists or while setup is still running;
    /// `Ok(None)` (dropped) in every other phase except `AwaitShuffle`.
    pub fn begin_shuffle(&mut self) -> Result<Option<ShuffleJob>, GameError> {
        let ticket = self.ticket().ok_or(GameError::NotReady)?;
        let Some(state) = self.state.as_mut() else {
            return Err(GameError::NotReady);
        };

        match state.phase {
            RoundPhase::Setup | RoundPhase::RevealIntro => return Err(GameError::NotReady),
            RoundPhase::AwaitShuffle => {}
            phase => {
                log::debug!("Shuffle dropped during {:?}", phase);
                return Ok(None);
            }
        }

        let pairs = plan_swaps(state.config.swap_count, state.board.len(), &mut self.rng);
        state.phase = RoundPhase::Shuffling;
        log::info!("Round {}: shuffling {} swaps", state.round, pairs.len());

        Ok(Some(ShuffleJob { ticket, pairs }))
    }

    /// Motion for the next swap, resolved against the board as it is now
    pub fn swap_motion(&mut self, ticket: &Ticket, pair: SwapPair) -> Option<SwapMotion> {
        let lift = self.rng.range(SWAP_LIFT_MIN, SWAP_LIFT_MAX);
        let state = self.state_in(ticket, RoundPhase::Shuffling)?;
        let first = state.board.cup_at(pair.i)?;
        let second = state.board.cup_at(pair.j)?;
        state
            .layout
            .swap_motion(pair, first, second, lift, state.config.animation_speed_ms)
    }

    /// Apply a swap whose animation has finished.
    /// Returns false (and changes nothing) for a stale ticket.
    pub fn commit_swap(&mut self, ticket: &Ticket, pair: SwapPair) -> bool {
        let Some(state) = self.state_in(ticket, RoundPhase::Shuffling) else {
            return false;
        };
        match state.board.swap(pair.i, pair.j) {
            Ok(()) => true,
            Err(e) => {
                log::warn!("Swap rejected: {}", e);
                false
            }
        }
    }

    /// All swaps are in; start accepting picks
    pub fn finish_shuffle(&mut self, ticket: &Ticket) -> bool {
        match self.state_in(ticket, RoundPhase::Shuffling) {
            Some(state) => {
                state.phase = RoundPhase::AwaitPick;
                true
            }
            None => false,
        }
    }

    /// Pick a cup.
    ///
    /// Correctness is judged on the live board: the picked cup's current slot
    /// against the ball's current slot.
    pub fn pick(&mut self, cup: CupId) -> Result<Option<Resolution>, GameError> {
        let ticket = self.ticket().ok_or(GameError::NotReady)?;
        let Some(state) = self.state.as_mut() else {
            return Err(GameError::NotReady);
        };

        if state.phase != RoundPhase::AwaitPick {
            log::debug!("Pick dropped during {:?}", state.phase);
            return Ok(None);
        }
        let Some(picked_slot) = state.board.slot_of(cup) else {
            log::debug!("Pick of unknown cup {:?} dropped", cup);
            return Ok(None);
        };

        let answer_slot = state.board.answer_slot_index();
        let correct = picked_slot == answer_slot;
        if correct {
            state.score += 1;
            state.total_points += state.config.points;
        } else {
            state.miss_count += 1;
        }
        state.picked = Some(cup);
        state.phase = RoundPhase::Resolving;

        log::info!(
            "Round {}: picked slot {}, ball in slot {} ({})",
            state.round,
            picked_slot,
            answer_slot,
            if correct { "hit" } else { "miss" }
        );

        Ok(Some(Resolution {
            ticket,
            picked: cup,
            picked_slot,
            answer_slot,
            correct,
        }))
    }

    /// Spend the round's hint.
    ///
    /// `Ok(None)` outside `AwaitPick`; `RevealUsed` on a second request.
    pub fn reveal_answer(&mut self) -> Result<Option<Hint>, GameError> {
        let ticket = self.ticket().ok_or(GameError::NotReady)?;
        let Some(state) = self.state.as_mut() else {
            return Err(GameError::NotReady);
        };

        if state.phase != RoundPhase::AwaitPick {
            log::debug!("Reveal dropped during {:?}", state.phase);
            return Ok(None);
        }
        if state.reveal_used {
            return Err(GameError::RevealUsed);
        }

        state.reveal_used = true;
        Ok(Some(Hint {
            ticket,
            answer_slot: state.board.answer_slot_index(),
        }))
    }

    /// Hint display time is up. True when the ball should be hidden again,
    /// false when the round has moved on (a pick already revealed it).
    pub fn hint_expired(&mut self, ticket: &Ticket) -> bool {
        self.state_in(ticket, RoundPhase::AwaitPick).is_some()
    }

    /// Result display is over: enter `Cooldown` and hand back the report for
    /// the round-completion notifier.
    pub fn finish_resolve(&mut self, ticket: &Ticket) -> Option<RoundReport> {
        let state = self.state_in(ticket, RoundPhase::Resolving)?;
        let picked_slot = state.picked.and_then(|c| state.board.slot_of(c))?;
        let answer_slot = state.board.answer_slot_index();
        let correct = picked_slot == answer_slot;

        state.phase = RoundPhase::Cooldown;
        Some(RoundReport {
            round: state.round,
            correct,
            picked_slot,
            answer_slot,
            points_awarded: if correct { state.config.points } else { 0 },
            score: state.score,
            miss_count: state.miss_count,
            total_points: state.total_points,
        })
    }

    /// Cooldown is over: next round on the same board, or the game ends
    pub fn finish_cooldown(&mut self, ticket: &Ticket) -> Option<CooldownExit> {
        let rounds_per_game = self.rounds_per_game;
        let state = self.state_in(ticket, RoundPhase::Cooldown)?;

        if state.round >= rounds_per_game {
            state.phase = RoundPhase::Ended;
            log::info!(
                "Game over: {} hits, {} misses, {} points",
                state.score,
                state.miss_count,
                state.total_points
            );
            return Some(CooldownExit::Ended(state.summary()));
        }

        state.round += 1;
        state.reveal_used = false;
        state.picked = None;
        state.phase = RoundPhase::AwaitShuffle;
        Some(CooldownExit::NextRound)
    }

    /// Drop the board and return to `Idle`. Any in-flight continuation is
    /// now stale.
    pub fn reset(&mut self) {
        self.generation += 1;
        self.state = None;
        log::info!("Session reset");
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const TABLE: Vec2 = Vec2::new(800.0, 500.0);

    fn ready_machine(level: u8) -> (RoundMachine, Ticket) {
        let mut m = RoundMachine::new(12345, 3);
        let plan = m.setup(level, TABLE).unwrap();
        if m.finish_setup(&plan.ticket).is_some() {
            assert!(m.finish_intro(&plan.ticket));
        }
        (m, plan.ticket)
    }

    fn shuffled_machine(level: u8) -> (RoundMachine, Ticket) {
        let (mut m, _) = ready_machine(level);
        let job = m.begin_shuffle().unwrap().unwrap();
        for pair in &job.pairs {
            assert!(m.swap_motion(&job.ticket, *pair).is_some());
            assert!(m.commit_swap(&job.ticket, *pair));
        }
        assert!(m.finish_shuffle(&job.ticket));
        (m, job.ticket)
    }

    #[test]
    fn test_setup_with_intro() {
        let mut m = RoundMachine::new(1, 3);
        assert_eq!(m.phase(), RoundPhase::Idle);

        let plan = m.setup(1, TABLE).unwrap();
        assert_eq!(m.phase(), RoundPhase::Setup);
        assert_eq!(plan.cups.len(), 3);
        assert_eq!(plan.layout.len(), 3);

        assert_eq!(m.finish_setup(&plan.ticket), Some(1500));
        assert_eq!(m.phase(), RoundPhase::RevealIntro);
        assert!(m.finish_intro(&plan.ticket));
        assert_eq!(m.phase(), RoundPhase::AwaitShuffle);
    }

    #[test]
    fn test_setup_without_intro() {
        let mut m = RoundMachine::new(1, 3);
        let plan = m.setup(4, TABLE).unwrap();
        assert_eq!(m.finish_setup(&plan.ticket), None);
        assert_eq!(m.phase(), RoundPhase::AwaitShuffle);
        assert!(!m.finish_intro(&plan.ticket));
    }

    #[test]
    fn test_invalid_level_keeps_session() {
        let (mut m, _) = ready_machine(2);
        assert_eq!(m.setup(9, TABLE).unwrap_err(), GameError::InvalidLevel(9));
        assert_eq!(m.phase(), RoundPhase::AwaitShuffle);
        assert_eq!(m.state().unwrap().level(), 2);
    }

    #[test]
    fn test_not_ready_before_setup() {
        let mut m = RoundMachine::new(1, 3);
        assert_eq!(m.begin_shuffle().unwrap_err(), GameError::NotReady);
        assert_eq!(m.pick(CupId(0)).unwrap_err(), GameError::NotReady);
        assert_eq!(m.reveal_answer().unwrap_err(), GameError::NotReady);
        assert_eq!(m.phase(), RoundPhase::Idle);
    }

    #[test]
    fn test_shuffle_during_setup_not_ready() {
        let mut m = RoundMachine::new(1, 3);
        let plan = m.setup(1, TABLE).unwrap();
        assert_eq!(m.begin_shuffle().unwrap_err(), GameError::NotReady);
        m.finish_setup(&plan.ticket);
        assert_eq!(m.begin_shuffle().unwrap_err(), GameError::NotReady);
        assert_eq!(m.phase(), RoundPhase::RevealIntro);
    }

    #[test]
    fn test_level_one_full_shuffle() {
        let (m, _) = shuffled_machine(1);
        let state = m.state().unwrap();
        assert_eq!(m.phase(), RoundPhase::AwaitPick);
        assert!(state.board.answer_slot_index() < 3);
        let bound: Vec<_> = state
            .board
            .cups()
            .iter()
            .filter(|&&c| c == state.board.ball_cup())
            .collect();
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn test_pick_during_shuffling_ignored() {
        let (mut m, _) = ready_machine(1);
        let job = m.begin_shuffle().unwrap().unwrap();
        let before = m.state().unwrap().clone();

        assert_eq!(m.pick(CupId(0)), Ok(None));
        assert_eq!(m.reveal_answer(), Ok(None));
        assert!(matches!(m.begin_shuffle(), Ok(None)));

        let after = m.state().unwrap();
        assert_eq!(m.phase(), RoundPhase::Shuffling);
        assert_eq!(after.score, before.score);
        assert_eq!(after.miss_count, before.miss_count);
        assert!(!after.reveal_used);
        assert!(m.is_current(&job.ticket));
    }

    #[test]
    fn test_pick_before_shuffle_ignored() {
        let (mut m, _) = ready_machine(1);
        assert_eq!(m.pick(CupId(1)), Ok(None));
        assert_eq!(m.phase(), RoundPhase::AwaitShuffle);
    }

    #[test]
    fn test_correct_pick_scores() {
        let (mut m, _) = shuffled_machine(1);
        let ball = m.state().unwrap().board.ball_cup();
        let res = m.pick(ball).unwrap().unwrap();
        assert!(res.correct);
        assert_eq!(res.picked_slot, res.answer_slot);

        let state = m.state().unwrap();
        assert_eq!(state.score, 1);
        assert_eq!(state.total_points, 10);
        assert_eq!(state.miss_count, 0);
        assert_eq!(m.phase(), RoundPhase::Resolving);

        // Only one pick per round
        assert_eq!(m.pick(ball), Ok(None));
        assert_eq!(m.state().unwrap().score, 1);
    }

    #[test]
    fn test_wrong_pick_counts_miss() {
        let (mut m, _) = shuffled_machine(2);
        let state = m.state().unwrap();
        let ball = state.board.ball_cup();
        let wrong = *state.board.cups().iter().find(|&&c| c != ball).unwrap();

        let res = m.pick(wrong).unwrap().unwrap();
        assert!(!res.correct);
        let state = m.state().unwrap();
        assert_eq!(state.score, 0);
        assert_eq!(state.miss_count, 1);
        assert_eq!(state.total_points, 0);
    }

    #[test]
    fn test_reveal_once_per_round() {
        let (mut m, _) = shuffled_machine(4);
        let answer = m.state().unwrap().board.answer_slot_index();

        let hint = m.reveal_answer().unwrap().unwrap();
        assert_eq!(hint.answer_slot, answer);
        assert_eq!(m.phase(), RoundPhase::AwaitPick);

        assert_eq!(m.reveal_answer(), Err(GameError::RevealUsed));
        let state = m.state().unwrap();
        assert!(state.reveal_used);
        assert_eq!(state.score, 0);
        assert_eq!(state.miss_count, 0);
        assert_eq!(m.phase(), RoundPhase::AwaitPick);

        assert!(m.hint_expired(&hint.ticket));
    }

    #[test]
    fn test_hint_not_hidden_after_pick() {
        let (mut m, _) = shuffled_machine(4);
        let hint = m.reveal_answer().unwrap().unwrap();
        let ball = m.state().unwrap().board.ball_cup();
        m.pick(ball).unwrap();
        assert!(!m.hint_expired(&hint.ticket));
    }

    #[test]
    fn test_rounds_then_end() {
        let (mut m, _) = shuffled_machine(1);
        for round in 1..=3 {
            let ball = m.state().unwrap().board.ball_cup();
            let res = m.pick(ball).unwrap().unwrap();
            let report = m.finish_resolve(&res.ticket).unwrap();
            assert_eq!(report.round, round);
            assert!(report.correct);
            assert_eq!(report.points_awarded, 10);
            assert_eq!(m.phase(), RoundPhase::Cooldown);

            match m.finish_cooldown(&res.ticket).unwrap() {
                CooldownExit::NextRound => {
                    assert!(round < 3);
                    let state = m.state().unwrap();
                    assert_eq!(state.round, round + 1);
                    assert!(!state.reveal_used);
                    assert!(!m.is_current(&res.ticket));

                    let job = m.begin_shuffle().unwrap().unwrap();
                    for pair in &job.pairs {
                        assert!(m.commit_swap(&job.ticket, *pair));
                    }
                    m.finish_shuffle(&job.ticket);
                }
                CooldownExit::Ended(summary) => {
                    assert_eq!(round, 3);
                    assert_eq!(summary.score, 3);
                    assert_eq!(summary.total_points, 30);
                    assert_eq!(summary.rounds_played, 3);
                }
            }
        }
        assert_eq!(m.phase(), RoundPhase::Ended);
        assert!(matches!(m.begin_shuffle(), Ok(None)));
    }

    #[test]
    fn test_reset_makes_continuations_stale() {
        let (mut m, _) = ready_machine(1);
        let job = m.begin_shuffle().unwrap().unwrap();
        let first = job.pairs[0];

        m.reset();
        assert_eq!(m.phase(), RoundPhase::Idle);
        assert!(!m.commit_swap(&job.ticket, first));
        assert!(m.swap_motion(&job.ticket, first).is_none());
        assert!(!m.finish_shuffle(&job.ticket));

        // A fresh board is not disturbed by the old shuffle's callbacks
        let plan = m.setup(1, TABLE).unwrap();
        let board = m.state().unwrap().board.clone();
        assert!(!m.commit_swap(&job.ticket, first));
        assert!(!m.finish_shuffle(&job.ticket));
        assert_eq!(m.state().unwrap().board, board);
        assert!(m.is_current(&plan.ticket));
    }

    #[test]
    fn test_commit_follows_motion_cups() {
        let (mut m, _) = ready_machine(2);
        let job = m.begin_shuffle().unwrap().unwrap();
        let pair = job.pairs[0];
        let motion = m.swap_motion(&job.ticket, pair).unwrap();
        assert!(m.commit_swap(&job.ticket, pair));

        let board = &m.state().unwrap().board;
        assert_eq!(board.cup_at(pair.i), Some(motion.second));
        assert_eq!(board.cup_at(pair.j), Some(motion.first));
    }
}
