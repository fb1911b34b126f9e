// SPDX-License-Identifier: MIT OR Apache-2.0
//! Clamped sigmoid and log lookup tables.
//!
//! Scoring paths call these instead of `f32::exp`/`f32::ln`. The tables are
//! coarse on purpose: prediction only ranks scores, and the clamping doubles
//! as the numeric guard (no `ln(0)`, no overflow at large logits).

use std::sync::OnceLock;

/// Number of sigmoid table buckets over `[-MAX_SIGMOID, MAX_SIGMOID]`.
pub const SIGMOID_TABLE_SIZE: usize = 512;

/// Sigmoid saturates to exactly 0 / 1 outside this bound.
pub const MAX_SIGMOID: f32 = 8.0;

/// Number of log table buckets over `(0, 1]`.
pub const LOG_TABLE_SIZE: usize = 512;

fn sigmoid_table() -> &'static [f32; SIGMOID_TABLE_SIZE + 1] {
    static TABLE: OnceLock<[f32; SIGMOID_TABLE_SIZE + 1]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0.0f32; SIGMOID_TABLE_SIZE + 1];
        for (i, slot) in t.iter_mut().enumerate() {
            let x = (i as f64 * 2.0 * f64::from(MAX_SIGMOID)) / SIGMOID_TABLE_SIZE as f64
                - f64::from(MAX_SIGMOID);
            *slot = (1.0 / (1.0 + (-x).exp())) as f32;
        }
        t
    })
}

fn log_table() -> &'static [f32; LOG_TABLE_SIZE + 1] {
    static TABLE: OnceLock<[f32; LOG_TABLE_SIZE + 1]> = OnceLock::new();
    TABLE.get_or_init(|| {
        let mut t = [0.0f32; LOG_TABLE_SIZE + 1];
        for (i, slot) in t.iter_mut().enumerate() {
            // Index 0 maps to ln(1e-5 / 512), so a zero probability never
            // reaches ln(0).
            let x = (i as f64 + 1e-5) / LOG_TABLE_SIZE as f64;
            *slot = x.ln() as f32;
        }
        t
    })
}

/// Table sigmoid, clamped to exactly 0 below `-MAX_SIGMOID` and 1 above it.
#[inline]
#[must_use]
pub fn sigmoid(x: f32) -> f32 {
    if x < -MAX_SIGMOID {
        0.0
    } else if x > MAX_SIGMOID {
        1.0
    } else {
        let i = ((x + MAX_SIGMOID) * SIGMOID_TABLE_SIZE as f32 / MAX_SIGMOID / 2.0) as usize;
        sigmoid_table()[i]
    }
}

/// Table natural log over `(0, 1]`, clamped to 0.0 above 1.0.
#[inline]
#[must_use]
pub fn log(x: f32) -> f32 {
    if x > 1.0 {
        return 0.0;
    }
    let i = (x * LOG_TABLE_SIZE as f32) as usize;
    log_table()[i]
}
