use crate::context::SimContext;
use crate::error::SimResult;

/// A propagation pass that runs each tick.
///
/// Systems are executed in registration order after movement, emitter
/// aging and the clock advance. Each system receives a mutable context
/// providing access to the world, environment, emitter pools, RNG and
/// event log.
pub trait System: std::fmt::Debug {
    /// Human-readable name for this system.
    fn name(&self) -> &str;

    /// Called once per tick.
    fn tick(&mut self, ctx: &mut SimContext<'_>) -> SimResult<()>;

    /// Called once before the first tick. Optional setup hook.
    fn init(&mut self, _ctx: &mut SimContext<'_>) -> SimResult<()> {
        Ok(())
    }

    /// Support downcasting to concrete types for inspection.
    fn as_any(&self) -> &dyn std::any::Any;

    /// Support downcasting to concrete types for inspection.
    fn as_any_mut(&mut self) -> &mut dyn std::any::Any;
}
