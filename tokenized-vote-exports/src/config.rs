//! This file defines a configuration structure containing all settings for the vote system

/// Vote configuration
#[derive(Debug, Clone)]
pub struct VoteConfig {
    /// maximum number of ballots a single vote may hold
    pub max_ballots: usize,
}
