//! Cut-Sheet Computation
//!
//! The cut sheet is the engine's output: every measurement the shop needs to
//! fabricate one panel, addressed by name. Earlier tooling passed these
//! around as a bare array whose indices shifted by one between doors and
//! windows (doors carry an extra short rail); two consumers disagreed about
//! the offsets. The tagged [`CutSheet`] makes that impossible — a window
//! sheet simply has no short-rail field.

use serde::{Deserialize, Serialize};

use super::deductions::DeductionTable;
use super::{PanelCategory, PanelSpec, PanelVariant};

/// Pleats added beyond the width-derived count.
const PLEAT_BASE_COUNT: f64 = 4.0;

/// Slack added to the rope run before halving, in cm.
const ROPE_SLACK: f64 = 5.0;

/// Material-waste allowance applied to free-form coverage area.
const FREE_FORM_WASTE_FACTOR: f64 = 1.2;

/// Derived measurements for one panel.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CutSheet {
    /// Full rail/mesh/rope set for a framed panel.
    Framed(FramedCuts),
    /// Area-priced free-form panel; no rail geometry.
    FreeForm(FreeFormEstimate),
    /// Width or height missing; placeholder that renders as zeros.
    Unsized,
}

impl CutSheet {
    /// Human-readable designation of the formula that was applied.
    pub fn label(&self) -> &'static str {
        match self {
            CutSheet::Framed(cuts) => match (cuts.category, cuts.double_leaf) {
                (PanelCategory::Door, false) => "door panel, single leaf",
                (PanelCategory::Door, true) => "door panel, double leaf",
                (PanelCategory::Window, false) => "window panel, single leaf",
                (PanelCategory::Window, true) => "window panel, double leaf",
            },
            CutSheet::FreeForm(_) => "free-form panel",
            CutSheet::Unsized => "unspecified size",
        }
    }

    pub fn as_framed(&self) -> Option<&FramedCuts> {
        match self {
            CutSheet::Framed(cuts) => Some(cuts),
            _ => None,
        }
    }
}

/// Named measurements for a framed (single- or double-leaf) panel.
///
/// Lengths in cm, counts as integers. `short_rail` exists only for doors;
/// for windows it is structurally absent, not zero, and serializes as a
/// missing field.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FramedCuts {
    /// Which deduction table produced this sheet
    pub category: PanelCategory,

    /// Double-leaf panel; the worksheet doubles handle and pleat rows
    pub double_leaf: bool,

    /// Handle/side-rail cut length
    pub handle: f64,

    /// Vertical frame rail cut length
    pub frame_rail: f64,

    /// Top/bottom rail cut length
    pub top_bottom_rail: f64,

    /// Secondary short rail; doors only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub short_rail: Option<f64>,

    /// Finished mesh panel height
    pub net_size: f64,

    /// Number of mesh pleats, rounded
    pub cut_count: u32,

    /// Spacing between drill/attachment points
    pub drill_pitch: f64,

    /// Length of one retaining cord
    pub rope_length: f64,

    /// Number of retaining cords
    pub rope_count: u32,
}

/// Coverage estimate for a free-form panel, in cm².
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct FreeFormEstimate {
    /// width × height plus the waste allowance
    pub coverage: f64,
}

/// Derive the cut sheet for a panel using the stock table for its category.
///
/// Pure and total: invalid dimensions come back as [`CutSheet::Unsized`]
/// rather than an error, so a caller filling a multi-panel order can render
/// a safe placeholder and keep going.
///
/// # Example
///
/// ```rust
/// use fab_core::formula::{compute, CutSheet, PanelCategory, PanelSpec, PanelVariant};
///
/// let spec = PanelSpec::new(PanelCategory::Door, PanelVariant::Single, 100.0, 200.0, 4, None);
/// match compute(&spec) {
///     CutSheet::Framed(cuts) => assert_eq!(cuts.handle, 194.5),
///     _ => unreachable!(),
/// }
/// ```
pub fn compute(spec: &PanelSpec) -> CutSheet {
    compute_with_table(spec, spec.category.deductions())
}

/// Derive the cut sheet with an explicit deduction table.
///
/// The table only matters for framed variants; free-form and unsized specs
/// take the same paths as [`compute`].
pub fn compute_with_table(spec: &PanelSpec, table: &DeductionTable) -> CutSheet {
    if !spec.has_size() {
        return CutSheet::Unsized;
    }

    let w = spec.width;
    let h = spec.height;

    if spec.variant == PanelVariant::Free {
        return CutSheet::FreeForm(FreeFormEstimate {
            coverage: w * h * FREE_FORM_WASTE_FACTOR,
        });
    }

    let double = spec.variant.is_double();
    let p = spec.phase_count;

    // Each leaf of a double panel is half as wide, so the pleat pitch and the
    // rope span halve while the rope count doubles.
    let cut_divisor = if double { 4.0 } else { 2.0 };
    let net_size = h - table.net_size;
    let rope_span = if double { w / 2.0 } else { w };
    let leaf_factor = if double { 2 } else { 1 };

    CutSheet::Framed(FramedCuts {
        category: spec.category,
        double_leaf: double,
        handle: h - table.handle,
        frame_rail: h - table.frame_rail,
        top_bottom_rail: w - table.top_rail,
        short_rail: table.short_rail.map(|d| w - d),
        net_size,
        cut_count: (w / cut_divisor + PLEAT_BASE_COUNT).round() as u32,
        drill_pitch: (net_size - table.drill_phase) / p as f64,
        rope_length: (rope_span + h + ROPE_SLACK) / 2.0,
        rope_count: p.saturating_sub(1) * leaf_factor,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::formula::HingeSide;

    const EPS: f64 = 1e-9;

    fn spec(
        category: PanelCategory,
        variant: PanelVariant,
        width: f64,
        height: f64,
        phase_count: u32,
    ) -> PanelSpec {
        PanelSpec::new(category, variant, width, height, phase_count, None)
    }

    fn framed(sheet: CutSheet) -> FramedCuts {
        match sheet {
            CutSheet::Framed(cuts) => cuts,
            other => panic!("expected framed cuts, got {:?}", other),
        }
    }

    #[test]
    fn test_single_door_worked_example() {
        let cuts = framed(compute(&spec(
            PanelCategory::Door,
            PanelVariant::Single,
            100.0,
            200.0,
            4,
        )));

        assert!((cuts.handle - 194.5).abs() < EPS);
        assert!((cuts.frame_rail - 199.5).abs() < EPS);
        assert!((cuts.top_bottom_rail - 97.8).abs() < EPS);
        assert!((cuts.short_rail.unwrap() - 96.0).abs() < EPS);
        assert!((cuts.net_size - 198.3).abs() < EPS);
        assert_eq!(cuts.cut_count, 54);
        assert!((cuts.drill_pitch - 49.175).abs() < EPS);
        assert!((cuts.rope_length - 152.5).abs() < EPS);
        assert_eq!(cuts.rope_count, 3);
    }

    #[test]
    fn test_double_door_halves_leaf_spans() {
        let cuts = framed(compute(&spec(
            PanelCategory::Door,
            PanelVariant::Double,
            100.0,
            200.0,
            4,
        )));

        assert!(cuts.double_leaf);
        assert_eq!(cuts.cut_count, 29); // round(100/4 + 4)
        assert!((cuts.rope_length - 127.5).abs() < EPS); // (50 + 200 + 5) / 2
        assert_eq!(cuts.rope_count, 6); // (4 - 1) * 2
    }

    #[test]
    fn test_single_window_worked_example() {
        let cuts = framed(compute(&spec(
            PanelCategory::Window,
            PanelVariant::Single,
            80.0,
            150.0,
            5,
        )));

        assert!((cuts.handle - 143.7).abs() < EPS);
        assert!((cuts.frame_rail - 149.8).abs() < EPS);
        assert!((cuts.top_bottom_rail - 77.8).abs() < EPS);
        assert!((cuts.net_size - 147.5).abs() < EPS);
        assert_eq!(cuts.short_rail, None);
    }

    #[test]
    fn test_window_short_rail_absent_in_json() {
        let sheet = compute(&spec(
            PanelCategory::Window,
            PanelVariant::Single,
            80.0,
            150.0,
            5,
        ));
        let json = serde_json::to_string(&sheet).unwrap();
        assert!(!json.contains("short_rail"));
    }

    #[test]
    fn test_drill_pitch_relation_holds_across_inputs() {
        for (category, w, h, p) in [
            (PanelCategory::Door, 64.0, 188.0, 2),
            (PanelCategory::Door, 120.5, 210.0, 7),
            (PanelCategory::Window, 45.0, 90.0, 3),
            (PanelCategory::Window, 150.0, 150.0, 10),
        ] {
            let cuts = framed(compute(&spec(category, PanelVariant::Single, w, h, p)));
            let expected = (cuts.net_size - 1.6) / p as f64;
            assert!((cuts.drill_pitch - expected).abs() < EPS);
        }
    }

    #[test]
    fn test_free_form_collapses_to_area() {
        let sheet = compute(&spec(
            PanelCategory::Door,
            PanelVariant::Free,
            50.0,
            60.0,
            2,
        ));
        match sheet {
            CutSheet::FreeForm(est) => assert!((est.coverage - 3600.0).abs() < EPS),
            other => panic!("expected free-form estimate, got {:?}", other),
        }
    }

    #[test]
    fn test_missing_size_degrades_without_panic() {
        let zero_width = compute(&spec(
            PanelCategory::Door,
            PanelVariant::Single,
            0.0,
            200.0,
            4,
        ));
        assert_eq!(zero_width, CutSheet::Unsized);
        assert_eq!(zero_width.label(), "unspecified size");

        let nan_height = compute(&spec(
            PanelCategory::Window,
            PanelVariant::Double,
            80.0,
            f64::NAN,
            4,
        ));
        assert_eq!(nan_height, CutSheet::Unsized);

        // Free-form panels degrade the same way.
        let free = compute(&spec(
            PanelCategory::Door,
            PanelVariant::Free,
            -1.0,
            60.0,
            2,
        ));
        assert_eq!(free, CutSheet::Unsized);
    }

    #[test]
    fn test_compute_is_idempotent() {
        let input = spec(PanelCategory::Door, PanelVariant::Double, 97.3, 201.8, 6);
        assert_eq!(compute(&input), compute(&input));
    }

    #[test]
    fn test_custom_table_injection() {
        let table = DeductionTable {
            handle: 1.0,
            frame_rail: 1.0,
            top_rail: 1.0,
            short_rail: None,
            net_size: 1.0,
            drill_phase: 1.0,
        };
        let cuts = match compute_with_table(
            &spec(PanelCategory::Door, PanelVariant::Single, 100.0, 200.0, 4),
            &table,
        ) {
            CutSheet::Framed(cuts) => cuts,
            other => panic!("expected framed cuts, got {:?}", other),
        };
        assert!((cuts.handle - 199.0).abs() < EPS);
        // The injected table has no short rail, even for a door spec.
        assert_eq!(cuts.short_rail, None);
    }

    #[test]
    fn test_labels() {
        let door = compute(&spec(
            PanelCategory::Door,
            PanelVariant::Single,
            100.0,
            200.0,
            4,
        ));
        assert_eq!(door.label(), "door panel, single leaf");

        let window_double = compute(&spec(
            PanelCategory::Window,
            PanelVariant::Double,
            80.0,
            150.0,
            4,
        ));
        assert_eq!(window_double.label(), "window panel, double leaf");
    }

    #[test]
    fn test_double_door_clears_hinge_side() {
        let spec = PanelSpec::new(
            PanelCategory::Door,
            PanelVariant::Double,
            100.0,
            200.0,
            4,
            Some(HingeSide::Left),
        );
        assert_eq!(spec.side, None);
        assert!(framed(compute(&spec)).double_leaf);
    }

    #[test]
    fn test_sheet_serialization_roundtrip() {
        let sheet = compute(&spec(
            PanelCategory::Door,
            PanelVariant::Single,
            100.0,
            200.0,
            4,
        ));
        let json = serde_json::to_string_pretty(&sheet).unwrap();
        let roundtrip: CutSheet = serde_json::from_str(&json).unwrap();
        assert_eq!(sheet, roundtrip);
    }
}
