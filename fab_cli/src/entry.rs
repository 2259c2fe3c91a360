//! Interactive panel entry.
//!
//! Stdin prompts for the order header and the panel loop. After each panel
//! the computed drill pitch is echoed back, the same live check the counter
//! staff use to catch a mistyped height before the order is saved.

use std::io::{self, BufRead, Write};

use chrono::{Local, NaiveDate};

use fab_core::formula::{CutSheet, HingeSide, PanelCategory, PanelSpec, PanelVariant};
use fab_core::order::Order;

fn read_line(prompt: &str) -> String {
    print!("{}", prompt);
    if io::stdout().flush().is_err() {
        return String::new();
    }

    let mut input = String::new();
    if io::stdin().lock().read_line(&mut input).is_err() {
        return String::new();
    }

    input.trim().to_string()
}

fn prompt_text(prompt: &str, default: &str) -> String {
    let input = read_line(&format!("{} [{}]: ", prompt, default));
    if input.is_empty() {
        default.to_string()
    } else {
        input
    }
}

fn prompt_f64(prompt: &str, default: f64) -> f64 {
    read_line(&format!("{} [{}]: ", prompt, default))
        .parse()
        .unwrap_or(default)
}

fn prompt_u32(prompt: &str, default: u32) -> u32 {
    read_line(&format!("{} [{}]: ", prompt, default))
        .parse()
        .unwrap_or(default)
}

fn prompt_date(prompt: &str, default: Option<NaiveDate>) -> Option<NaiveDate> {
    let hint = match default {
        Some(d) => d.format("%Y-%m-%d").to_string(),
        None => "none".to_string(),
    };
    let input = read_line(&format!("{} [{}]: ", prompt, hint));
    if input.is_empty() {
        return default;
    }
    NaiveDate::parse_from_str(&input, "%Y-%m-%d").ok().or(default)
}

fn prompt_category() -> PanelCategory {
    loop {
        match read_line("Category (d)oor / (w)indow: ").to_lowercase().as_str() {
            "d" | "door" => return PanelCategory::Door,
            "w" | "window" => return PanelCategory::Window,
            _ => println!("  please answer d or w"),
        }
    }
}

fn prompt_variant() -> PanelVariant {
    loop {
        match read_line("Variant (s)ingle / (d)ouble / (f)ree-form: ")
            .to_lowercase()
            .as_str()
        {
            "s" | "single" => return PanelVariant::Single,
            "d" | "double" => return PanelVariant::Double,
            "f" | "free" | "free-form" => return PanelVariant::Free,
            _ => println!("  please answer s, d or f"),
        }
    }
}

fn prompt_side() -> Option<HingeSide> {
    loop {
        match read_line("Hinge side (l)eft / (r)ight: ").to_lowercase().as_str() {
            "l" | "left" => return Some(HingeSide::Left),
            "r" | "right" => return Some(HingeSide::Right),
            "" => return None,
            _ => println!("  please answer l or r"),
        }
    }
}

/// Prompt for the order header and build an empty order.
pub fn prompt_order_header() -> Order {
    let site_name = prompt_text("Site / customer name", "unnamed site");
    let today = Local::now().date_naive();
    let start_date = prompt_date("Start date", Some(today)).unwrap_or(today);
    let due_date = prompt_date("Due date", None);
    Order::new(site_name, start_date, due_date)
}

/// Loop adding panels to the order until the operator stops.
///
/// Returns the number of panels added.
pub fn prompt_items(order: &mut Order) -> usize {
    let mut added = 0;

    loop {
        println!();
        println!("--- Panel {} ---", order.item_count() + 1);

        let category = prompt_category();
        let variant = prompt_variant();
        let side = if category == PanelCategory::Door && variant == PanelVariant::Single {
            prompt_side()
        } else {
            None
        };

        let width = prompt_f64("Width (cm)", 0.0);
        let height = prompt_f64("Height (cm)", 0.0);
        let phase_count = if variant == PanelVariant::Free {
            2
        } else {
            prompt_u32("Drill phases", 4)
        };
        let frame_color = prompt_text("Frame color", "black");
        let mesh_color = prompt_text("Mesh color", "grey");

        let spec = PanelSpec::new(category, variant, width, height, phase_count, side);
        let preview = fab_core::compute(&spec);
        match &preview {
            CutSheet::Framed(cuts) => {
                println!(
                    "  => {}: drill pitch {:.2} cm",
                    preview.label(),
                    cuts.drill_pitch
                );
            }
            CutSheet::FreeForm(est) => {
                println!("  => free-form panel: coverage {:.0} cm2", est.coverage);
            }
            CutSheet::Unsized => {
                println!("  => size not set; row will print as zeros");
            }
        }

        order.add_item(spec, frame_color, mesh_color);
        added += 1;

        let again = read_line("Add another panel? (y/N): ");
        if !matches!(again.to_lowercase().as_str(), "y" | "yes") {
            break;
        }
    }

    added
}
