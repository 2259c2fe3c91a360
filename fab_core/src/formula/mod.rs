//! # Measurement Derivation
//!
//! Turns a panel specification (category, leaf variant, outer dimensions,
//! drill-phase count) into the named fabrication measurements the shop cuts
//! to: rail lengths, mesh size, pleat count, drill pitch, rope lengths.
//!
//! The engine follows the pattern used throughout this crate:
//!
//! - [`PanelSpec`] - Input parameters (JSON-serializable)
//! - [`CutSheet`] - Derived measurements (JSON-serializable)
//! - [`compute`]`(spec) -> CutSheet` - Pure calculation function
//!
//! `compute` never fails: a spec without usable dimensions yields
//! [`CutSheet::Unsized`], which renders as an all-zero placeholder row so a
//! multi-panel entry form can keep going.
//!
//! Deduction constants live in [`deductions`] as explicit per-category tables
//! rather than literals buried in the formulas; [`sheet::compute_with_table`]
//! accepts a table directly for calibrated cutting setups.

pub mod deductions;
pub mod sheet;

use serde::{Deserialize, Serialize};

pub use deductions::{DeductionTable, DOOR_DEDUCTIONS, WINDOW_DEDUCTIONS};
pub use sheet::{compute, compute_with_table, CutSheet, FramedCuts, FreeFormEstimate};

/// Panel hardware family. Selects the deduction table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelCategory {
    Door,
    Window,
}

impl PanelCategory {
    pub const ALL: [PanelCategory; 2] = [PanelCategory::Door, PanelCategory::Window];

    pub fn display_name(&self) -> &'static str {
        match self {
            PanelCategory::Door => "door",
            PanelCategory::Window => "window",
        }
    }
}

impl std::fmt::Display for PanelCategory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Leaf layout of the panel.
///
/// `Free` marks a custom panel priced by coverage area instead of rail
/// geometry; no deduction formulas apply to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PanelVariant {
    Single,
    Double,
    Free,
}

impl PanelVariant {
    pub const ALL: [PanelVariant; 3] = [
        PanelVariant::Single,
        PanelVariant::Double,
        PanelVariant::Free,
    ];

    pub fn display_name(&self) -> &'static str {
        match self {
            PanelVariant::Single => "single",
            PanelVariant::Double => "double",
            PanelVariant::Free => "free-form",
        }
    }

    pub fn is_double(&self) -> bool {
        matches!(self, PanelVariant::Double)
    }
}

impl std::fmt::Display for PanelVariant {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Installation side for single-leaf doors (handle/hinge position).
///
/// Carried through to the worksheet for the installer; the formulas never
/// read it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HingeSide {
    Left,
    Right,
}

impl HingeSide {
    pub fn display_name(&self) -> &'static str {
        match self {
            HingeSide::Left => "left",
            HingeSide::Right => "right",
        }
    }
}

impl std::fmt::Display for HingeSide {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.display_name())
    }
}

/// Input parameters for one panel.
///
/// Dimensions are in centimeters. `phase_count` is the number of
/// drill/attachment points along the frame; the entry form constrains it to
/// a sane range (≥ 2), the engine accepts it as given.
///
/// ## JSON Example
///
/// ```json
/// {
///   "category": "door",
///   "variant": "single",
///   "width": 100.0,
///   "height": 200.0,
///   "phase_count": 4,
///   "side": "left"
/// }
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct PanelSpec {
    /// Hardware family (door or window)
    pub category: PanelCategory,

    /// Leaf layout (single, double, or free-form)
    pub variant: PanelVariant,

    /// Outer width in cm
    pub width: f64,

    /// Outer height in cm
    pub height: f64,

    /// Number of drill/attachment points along the frame
    pub phase_count: u32,

    /// Installation side; only meaningful for single-leaf doors
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub side: Option<HingeSide>,
}

impl PanelSpec {
    /// Build a spec, dropping `side` unless it applies (single-leaf door).
    pub fn new(
        category: PanelCategory,
        variant: PanelVariant,
        width: f64,
        height: f64,
        phase_count: u32,
        side: Option<HingeSide>,
    ) -> Self {
        let side = match (category, variant) {
            (PanelCategory::Door, PanelVariant::Single) => side,
            _ => None,
        };
        PanelSpec {
            category,
            variant,
            width,
            height,
            phase_count,
            side,
        }
    }

    /// Both dimensions present and positive.
    pub fn has_size(&self) -> bool {
        self.width.is_finite()
            && self.height.is_finite()
            && self.width > 0.0
            && self.height > 0.0
    }

    /// Worksheet type label, e.g. "door (double)" or "window".
    pub fn type_label(&self) -> String {
        match self.variant {
            PanelVariant::Free => "free-form".to_string(),
            PanelVariant::Single => self.category.display_name().to_string(),
            PanelVariant::Double => format!("{} (double)", self.category),
        }
    }
}
