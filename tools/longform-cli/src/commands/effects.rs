//! List motion effects, or preview a resolved sequence.

use longform_motion::{resolve_sequence, MotionPlan, CANVAS_FPS, CANVAS_HEIGHT, CANVAS_WIDTH};
use longform_project_model::MotionEffect;

pub fn run(sequence: Vec<String>, duration: f64, json: bool) -> anyhow::Result<()> {
    if sequence.is_empty() {
        list_effects();
        return Ok(());
    }

    let plan = resolve_sequence(sequence.as_slice(), duration, CANVAS_FPS)
        .map_err(|e| anyhow::anyhow!("Cannot resolve sequence: {e}"))?;

    if json {
        println!("{}", serde_json::to_string_pretty(&plan)?);
    } else {
        print_plan(&plan);
    }
    Ok(())
}

fn list_effects() {
    println!("Motion effects ({}x{} @ {}fps)", CANVAS_WIDTH, CANVAS_HEIGHT, CANVAS_FPS);
    println!("{}", "=".repeat(50));
    for effect in MotionEffect::ALL {
        let c = effect.controls();
        println!(
            "{:<10} zoom {:.1} -> {:.1}  focus ({:.1}, {:.1}) -> ({:.1}, {:.1})",
            effect.as_str(),
            c.start_zoom,
            c.end_zoom,
            c.start_x,
            c.start_y,
            c.end_x,
            c.end_y
        );
    }
    println!();
    println!("Unknown ids render as a still frame.");
}

fn print_plan(plan: &MotionPlan) {
    let (w, h) = (CANVAS_WIDTH as f64, CANVAS_HEIGHT as f64);
    println!(
        "Plan: {} frame(s), {} slice(s)",
        plan.total_frames,
        plan.slices.len()
    );

    let mut start = 0;
    for (i, slice) in plan.slices.iter().enumerate() {
        let end = start + slice.total_frames;
        let (x0, y0) = slice.viewport_px(0.0, w, h);
        let (x1, y1) = slice.viewport_px(1.0, w, h);
        println!(
            "  {}. {:<10} frames {}..{}  zoom {:.2} -> {:.2}  origin ({:.0}, {:.0}) -> ({:.0}, {:.0})",
            i + 1,
            slice.label(),
            start,
            end,
            slice.zoom(0.0),
            slice.zoom(1.0),
            x0,
            y0,
            x1,
            y1
        );
        start = end;
    }
}
