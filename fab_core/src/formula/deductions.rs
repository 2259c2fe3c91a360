//! Deduction Tables
//!
//! Each constant is the material consumed by a frame channel, seam allowance,
//! or hem specific to that hardware family, subtracted from the outer panel
//! dimensions to get the raw cut length. Door and window profiles differ, so
//! each category carries its own table.
//!
//! The tables are passed into the engine as values (see
//! [`compute_with_table`](super::compute_with_table)) so a calibrated setup
//! can substitute its own numbers without touching the formulas.

use serde::{Deserialize, Serialize};

use super::PanelCategory;

/// Per-category deduction constants, in cm.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct DeductionTable {
    /// Handle/side-rail channel
    pub handle: f64,

    /// Vertical frame rail seam
    pub frame_rail: f64,

    /// Top/bottom rail end caps
    pub top_rail: f64,

    /// Secondary short rail; doors only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_rail: Option<f64>,

    /// Mesh hem allowance
    pub net_size: f64,

    /// Margin kept clear of the first and last drill point
    pub drill_phase: f64,
}

/// Deductions for the door hardware profile.
pub const DOOR_DEDUCTIONS: DeductionTable = DeductionTable {
    handle: 5.5,
    frame_rail: 0.5,
    top_rail: 2.2,
    short_rail: Some(4.0),
    net_size: 1.7,
    drill_phase: 1.6,
};

/// Deductions for the window hardware profile. Windows have no short rail.
pub const WINDOW_DEDUCTIONS: DeductionTable = DeductionTable {
    handle: 6.3,
    frame_rail: 0.2,
    top_rail: 2.2,
    short_rail: None,
    net_size: 2.5,
    drill_phase: 1.6,
};

impl PanelCategory {
    /// The stock deduction table for this category.
    pub fn deductions(&self) -> &'static DeductionTable {
        match self {
            PanelCategory::Door => &DOOR_DEDUCTIONS,
            PanelCategory::Window => &WINDOW_DEDUCTIONS,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_selection() {
        assert_eq!(PanelCategory::Door.deductions().handle, 5.5);
        assert_eq!(PanelCategory::Window.deductions().handle, 6.3);
        assert!(PanelCategory::Door.deductions().short_rail.is_some());
        assert!(PanelCategory::Window.deductions().short_rail.is_none());
    }

    #[test]
    fn test_shared_constants() {
        // Both profiles keep the same top-rail caps and drill margin.
        assert_eq!(DOOR_DEDUCTIONS.top_rail, WINDOW_DEDUCTIONS.top_rail);
        assert_eq!(DOOR_DEDUCTIONS.drill_phase, WINDOW_DEDUCTIONS.drill_phase);
    }

    #[test]
    fn test_short_rail_absent_in_window_json() {
        let json = serde_json::to_string(&WINDOW_DEDUCTIONS).unwrap();
        assert!(!json.contains("short_rail"));

        let roundtrip: DeductionTable = serde_json::from_str(&json).unwrap();
        assert_eq!(roundtrip, WINDOW_DEDUCTIONS);
    }
}
