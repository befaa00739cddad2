//! Game engine
//!
//! All gameplay logic lives here, independent of any renderer:
//! - Seeded RNG only
//! - Board state is plain data (slot order + ball binding)
//! - Phase changes happen only in `RoundMachine`; `GameController` sequences
//!   them around presenter animations

pub mod cups;
pub mod driver;
pub mod layout;
pub mod rng;
pub mod round;
pub mod shuffle;
pub mod state;

pub use cups::{CupBoard, CupId};
pub use driver::GameController;
pub use layout::{SwapMotion, TableLayout};
pub use rng::GameRng;
pub use round::{CooldownExit, Hint, Resolution, RoundMachine, SetupPlan, ShuffleJob};
pub use shuffle::{SwapPair, plan_swaps};
pub use state::{GameSummary, RoundPhase, RoundReport, RoundState, Ticket};
