mod context;
mod engine;
mod error;
mod signals;

pub use context::{ExitSignal, MonitorContext, ObservationSnapshot};
pub use engine::MonitorEngine;
pub use error::{MonitorError, MonitorResult};
pub use signals::{
    default_signal_bus, evaluate_signals, EdgeGone, GuaranteedLoss, GuaranteedWin,
    SignalEvaluator, TakeProfit,
};
