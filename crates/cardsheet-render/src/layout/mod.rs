// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Layout module: physical sheet metrics and pixel slot geometry.

pub mod metrics;
pub mod slot;

pub use metrics::LayoutMetrics;
pub use slot::{SlotGeometry, SlotRect};
