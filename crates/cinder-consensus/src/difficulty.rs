//! Difficulty and gas-limit rules.

use cinder_types::{empty_uncle_hash, Header};
use primitive_types::U256;

/// Difficulty floor.
pub const MIN_DIFFICULTY: u64 = 131_072;

/// Absolute gas-limit floor.
pub const MIN_GAS_LIMIT: u64 = 5_000;

/// Next-block difficulty from the parent header.
///
/// `δ = (time − parent.time) / 10`; the adjustment is `1 − δ` (or `2 − δ`
/// when the parent carried uncles), clamped at `−10`, applied in units of
/// `parent.difficulty / 1024`, floored at `min_difficulty` (the network
/// parameter from the chain config; [`MIN_DIFFICULTY`] is its default).
pub fn calc_difficulty(time: u64, parent: &Header, min_difficulty: U256) -> U256 {
    let delta = time.saturating_sub(parent.time) / 10;
    let base: i64 = if parent.uncle_hash == empty_uncle_hash() {
        1
    } else {
        2
    };
    let adjustment = (base - delta as i64).max(-10);

    let unit = parent.difficulty / U256::from(1024);
    let next = if adjustment >= 0 {
        parent
            .difficulty
            .saturating_add(unit.saturating_mul(U256::from(adjustment as u64)))
    } else {
        parent
            .difficulty
            .saturating_sub(unit.saturating_mul(U256::from((-adjustment) as u64)))
    };

    next.max(min_difficulty)
}

/// Next-block gas limit, drifting from the parent toward the configured
/// `[floor, ceil]` corridor by at most a 1/1024 step per block.
pub fn calc_gas_limit(parent_gas_used: u64, parent_gas_limit: u64, floor: u64, ceil: u64) -> u64 {
    let contrib = (parent_gas_used + parent_gas_used / 2) / 1024;
    let decay = (parent_gas_limit / 1024).saturating_sub(1);

    let mut limit = parent_gas_limit.saturating_sub(decay).saturating_add(contrib);
    if limit < MIN_GAS_LIMIT {
        limit = MIN_GAS_LIMIT;
    }
    if limit < floor {
        limit = (parent_gas_limit.saturating_add(decay)).min(floor);
    } else if limit > ceil {
        limit = (parent_gas_limit.saturating_sub(decay)).max(ceil);
    }
    limit
}
