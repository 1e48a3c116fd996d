pub mod constants;
pub mod fast_math;
pub mod gain_processor;
pub mod meter_communication;
