//! Show which artifacts exist for each segment.

use serde::Serialize;

use super::ProjectArgs;

#[derive(Debug, Serialize)]
struct SegmentStatus {
    chapter: String,
    segment_id: String,
    motion: Vec<String>,
    image: bool,
    audio: bool,
    clip: bool,
}

pub fn run(args: ProjectArgs, json: bool) -> anyhow::Result<()> {
    let project = args.load_project()?;
    let layout = args.layout();

    let rows: Vec<SegmentStatus> = project
        .segments()
        .map(|entry| {
            let status = layout.status(&entry.segment.segment_id);
            SegmentStatus {
                chapter: entry.chapter.display_title(),
                segment_id: entry.segment.segment_id.clone(),
                motion: entry.segment.effects_in(entry.chapter).to_vec(),
                image: status.image,
                audio: status.audio,
                clip: status.clip,
            }
        })
        .collect();

    if json {
        println!("{}", serde_json::to_string_pretty(&rows)?);
        return Ok(());
    }

    let mark = |present: bool| if present { "x" } else { " " };

    println!("Project: {}", project.display_name());
    println!("  Voice: {}", project.voice);
    if let Some(style) = &project.visual_style {
        println!("  Style: {style}");
    }
    println!();

    let mut chapter = None;
    for row in &rows {
        if chapter != Some(&row.chapter) {
            println!("{}", row.chapter);
            chapter = Some(&row.chapter);
        }
        let motion = if row.motion.is_empty() {
            "static".to_string()
        } else {
            row.motion.join(" -> ")
        };
        println!(
            "  [{}] image [{}] audio [{}] clip  {}  ({motion})",
            mark(row.image),
            mark(row.audio),
            mark(row.clip),
            row.segment_id,
        );
    }

    let clips = rows.iter().filter(|r| r.clip).count();
    let ready = rows.iter().filter(|r| r.image && r.audio && !r.clip).count();
    println!();
    println!("Clips rendered: {clips}/{}", rows.len());
    println!("Ready to render: {ready}");

    let missing = layout.missing_sources(&project);
    if !missing.is_empty() {
        println!("[WARN] Segments without image or narration:");
        for id in &missing {
            println!("  - {id}");
        }
    }
    Ok(())
}
