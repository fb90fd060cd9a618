use crate::context::{ExitSignal, MonitorContext};
use crate::error::MonitorResult;
use crate::signals::{default_signal_bus, evaluate_signals, SignalEvaluator};
use chrono::Utc;
use weather_config::{CalibrationConfig, MonitorConfig};
use weather_storage::StorageGateway;

pub struct MonitorEngine {
    bus: Vec<Box<dyn SignalEvaluator>>,
}

impl MonitorEngine {
    pub fn new() -> Self {
        Self { bus: default_signal_bus() }
    }

    /// Evaluate one open trade's signal chain and, if an exit fires,
    /// persist every field spec.md §4.6 requires in one write. A silent
    /// resolution missing `observation_high`/`wu_high` is the recurring
    /// failure mode this is guarding against.
    pub async fn evaluate_and_exit(
        &self,
        storage: &StorageGateway,
        ctx: &MonitorContext<'_>,
        monitor_cfg: &MonitorConfig,
        cal_cfg: &CalibrationConfig,
    ) -> MonitorResult<Option<(&'static str, ExitSignal)>> {
        let fired = evaluate_signals(&self.bus, ctx, monitor_cfg, cal_cfg);

        if let Some((_name, ref signal)) = fired {
            storage
                .mark_exited(
                    ctx.trade.id,
                    signal.reason,
                    Utc::now(),
                    signal.exit_price,
                    signal.pnl,
                    signal.won,
                    signal.actual_temp,
                    ctx.observation.map(|o| o.running_high),
                    ctx.observation.map(|o| o.wu_high),
                )
                .await?;
        }

        let snapshot = serde_json::json!({
            "evaluated_at": ctx.now.to_rfc3339(),
            "current_ask": ctx.current_ask,
            "current_bid": ctx.current_bid,
            "current_corrected_probability": ctx.current_corrected_probability,
            "fired": fired.as_ref().map(|(name, _)| *name),
        });
        storage
            .append_evaluator_log(ctx.trade.id, snapshot, monitor_cfg.evaluator_log_cap)
            .await?;

        Ok(fired)
    }
}

impl Default for MonitorEngine {
    fn default() -> Self {
        Self::new()
    }
}
