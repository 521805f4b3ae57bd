// SPDX-License-Identifier: PMPL-1.0-or-later
// Copyright (c) 2026 Jonathan D.A. Jewell (hyperpolymath) <jonathan.jewell@open.ac.uk>
//
// Canvas module: page rasters, card placement, and cut guides.

pub mod guides;
pub mod page;
pub mod placement;

pub use guides::{GuideAxis, GuideLine, SlotLabel, guide_lines, slot_size_labels};
pub use page::{CanvasPage, WHITE};
pub use placement::{Placement, bleed_inset_px};
