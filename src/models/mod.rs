pub mod gateway;
pub mod pump;

pub use gateway::{GatewayLiveness, GatewayStatusResponse, ONLINE_TIMEOUT_SECS};
pub use pump::{
    Busy, CommandSource, Commit, FeedbackStatus, PumpId, PumpState, StateSnapshot, PUMP_COUNT,
};
