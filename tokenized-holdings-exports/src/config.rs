//! This file defines a configuration structure containing all settings for the holdings system

/// Holdings configuration
#[derive(Debug, Clone)]
pub struct HoldingsConfig {
    /// capacity of the flush channel between `save` callers and the writer thread
    pub channel_size: usize,
    /// maximum number of outstanding statuses accepted when decoding a holding
    pub max_holding_statuses: u32,
}
