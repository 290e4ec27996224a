use std::path::PathBuf;

use longform_motion::{resolve_segment, CANVAS_FPS};
use longform_project_model::effect::MotionEffect;
use longform_project_model::project::Project;

fn load_fixture_project() -> Project {
    let path = PathBuf::from(env!("CARGO_MANIFEST_DIR"))
        .join("..")
        .join("..")
        .join("fixtures")
        .join("sample-project")
        .join("segments.json");

    Project::load(path).expect("fixture project should load")
}

#[test]
fn fixture_segments_resolve_to_expected_plans() {
    let project = load_fixture_project();
    let plans: Vec<_> = project
        .segments()
        .map(|entry| {
            let plan = resolve_segment(entry.segment, entry.chapter, 6.0, CANVAS_FPS)
                .expect("fixture durations are valid");
            let labels = plan
                .slices
                .iter()
                .map(|s| s.label())
                .collect::<Vec<_>>()
                .join("+");
            (entry.segment.segment_id.clone(), labels, plan.frame_counts())
        })
        .collect();

    assert_eq!(
        plans,
        vec![
            ("ch01_s01".to_string(), "zoom_in".to_string(), vec![180]),
            ("ch01_s02".to_string(), "pan_down+zoom_in".to_string(), vec![90, 90]),
            ("ch02_s01".to_string(), "static".to_string(), vec![180]),
            ("ch03_s01".to_string(), "zoom_out+static".to_string(), vec![90, 90]),
        ]
    );
}

#[test]
fn chained_plan_is_continuous_within_each_slice() {
    let project = load_fixture_project();
    let entry = project.find_segment("ch01_s02").expect("segment exists");
    let plan = resolve_segment(entry.segment, entry.chapter, 4.0, CANVAS_FPS).unwrap();

    assert_eq!(plan.slices[0].effect, Some(MotionEffect::PanDown));
    assert_eq!(plan.at_frame(0).y, 0.3);
    assert_eq!(plan.at_frame(59).zoom, 1.2);
    assert_eq!(plan.at_frame(60).zoom, 1.0);
    assert_eq!(plan.at_frame(plan.total_frames).zoom, 1.3);
}
