mod bankroll;
mod dedup;
mod engine;
mod error;
mod observation;
mod sizing;

pub use bankroll::{Bankroll, NoDateCap};
pub use dedup::FastPathDedup;
pub use engine::{execute_edge_candidate, ExecutionOutcome};
pub use error::{ExecutorError, ExecutorResult};
pub use observation::{
    execute_metar_guaranteed_win, execute_pws_guaranteed_win, ObservationCandidate,
    ObservationOutcome,
};
pub use sizing::{
    city_factor, size_edge_trade, size_metar_guaranteed_win, size_pws_guaranteed_win,
    time_factor, volume_gate_blocks, SizedPosition,
};
