use std::f64::consts::PI;
use std::path::{Path, PathBuf};
use std::time::Duration;

use sunburst_renderer::layout_dump::write_layout_dump;
use sunburst_renderer::{
    Chart, Config, Error, FocusState, Hierarchy, InputNode, MalformedInputError, Phase,
    RenderOptions, VisibilityPolicy, ZoomOutcome, load_config, partition, render_with_options,
};

const EPS: f64 = 1e-9;

fn fixture(name: &str) -> PathBuf {
    Path::new(env!("CARGO_MANIFEST_DIR"))
        .join("tests")
        .join("fixtures")
        .join(name)
}

fn new_state(hierarchy: &Hierarchy) -> FocusState {
    let config = Config::default();
    FocusState::new(
        hierarchy,
        partition(hierarchy),
        config.layout.transition,
        config.layout.visibility(),
    )
}

/// Deterministic pseudo-random tree: up to `fanout` children per node, `depth` levels.
fn generated_tree(seed: u64, depth: usize, fanout: u64) -> InputNode {
    fn next(state: &mut u64) -> u64 {
        *state = state.wrapping_mul(6364136223846793005).wrapping_add(1442695040888963407);
        *state >> 33
    }
    fn grow(state: &mut u64, name: String, depth: usize, fanout: u64) -> InputNode {
        let count = if depth == 0 { 0 } else { next(state) % (fanout + 1) };
        if count == 0 {
            return InputNode::leaf(&name, (next(state) % 50) as f64);
        }
        let children = (0..count)
            .map(|idx| grow(state, format!("{name}.{idx}"), depth - 1, fanout))
            .collect();
        InputNode::branch(&name, children)
    }
    let mut state = seed;
    let children = (0..fanout)
        .map(|idx| grow(&mut state, format!("n{idx}"), depth, fanout))
        .collect();
    InputNode::branch("root", children)
}

#[test]
fn aggregation_and_coverage_hold_for_generated_trees() {
    for seed in 1..=20 {
        let hierarchy = Hierarchy::build(&generated_tree(seed, 4, 4)).unwrap();
        let layout = partition(&hierarchy);
        for (id, node) in hierarchy.iter() {
            if node.is_leaf() {
                continue;
            }
            let sum: f64 = node
                .children
                .iter()
                .map(|child| hierarchy.node(*child).aggregated_value)
                .sum();
            assert!((sum - node.aggregated_value).abs() < EPS, "seed {seed}");

            let parent = layout.get(id);
            let mut cursor = parent.x0;
            for child in &node.children {
                let interval = layout.get(*child);
                assert!((interval.x0 - cursor).abs() < EPS, "gap under {}", node.name);
                cursor = interval.x1;
            }
            assert!((cursor - parent.x1).abs() < 1e-6, "seed {seed}: {}", node.name);
        }
    }
}

#[test]
fn scenario_build_layout_and_zoom() {
    let hierarchy = Hierarchy::load(&fixture("scenario.json")).unwrap();
    assert_eq!(hierarchy.node(hierarchy.root()).aggregated_value, 20.0);

    let mut state = new_state(&hierarchy);
    let a = hierarchy.find_path("A").unwrap();
    let a1 = hierarchy.find_path("A/A1").unwrap();
    let a2 = hierarchy.find_path("A/A2").unwrap();
    let b = hierarchy.find_path("B").unwrap();

    assert!(state.current(a).x0.abs() < EPS);
    assert!((state.current(a).x1 - PI).abs() < EPS);
    assert!((state.current(b).x0 - PI).abs() < EPS);
    assert!((state.current(b).x1 - 2.0 * PI).abs() < EPS);
    assert!((state.current(a1).angle_span() - 0.6 * PI).abs() < EPS);
    assert!((state.current(a2).angle_span() - 0.4 * PI).abs() < EPS);
    assert!(state.current(a2).x0 >= state.current(a).x0 - EPS);
    assert!(state.current(a2).x1 <= state.current(a).x1 + EPS);

    assert_eq!(state.zoom_to(&hierarchy, a), ZoomOutcome::Started);
    assert!(state.target(a).x0.abs() < EPS);
    assert!((state.target(a).x1 - 2.0 * PI).abs() < EPS);
    assert!(state.target(a1).x0.abs() < EPS);
    assert!((state.target(a1).x1 - 1.2 * PI).abs() < EPS);
    for interval in state.target_intervals() {
        assert!(interval.x0 >= 0.0 && interval.x1 <= 2.0 * PI + EPS);
    }
}

#[test]
fn zoom_then_parent_restores_intervals() {
    let hierarchy = Hierarchy::load(&fixture("skills.json")).unwrap();
    let mut state = new_state(&hierarchy);
    let cloud = hierarchy.find_path("Infrastructure/Cloud").unwrap();
    let infrastructure = hierarchy.find_path("Infrastructure").unwrap();

    state.zoom_to(&hierarchy, infrastructure);
    state.finish();
    let at_parent = state.current_intervals().to_vec();

    state.zoom_to(&hierarchy, cloud);
    state.finish();
    state.zoom_to(&hierarchy, infrastructure);
    state.finish();

    for id in hierarchy.descendants(infrastructure) {
        assert!(
            state.current(id).approx_eq(&at_parent[id.index()], EPS),
            "{}",
            hierarchy.path(id)
        );
    }
}

#[test]
fn visibility_boundary_relative_to_focus_depth() {
    let policy = VisibilityPolicy::default();
    let hierarchy = Hierarchy::load(&fixture("skills.json")).unwrap();
    let layout = partition(&hierarchy);
    let perl = layout.get(hierarchy.find_path("Programming Languages/Legacy/Perl").unwrap());
    // Perl occupies band 3..4.
    assert_eq!(perl.y1 - 1.0, policy.max_visible_depth);
    assert!(policy.arc_visible(&perl, 1.0));
    assert!(!policy.arc_visible(&perl, 0.0));
    assert!(!policy.arc_visible(&perl, 3.0));
}

#[test]
fn leaf_click_leaves_state_unchanged() {
    let hierarchy = Hierarchy::load(&fixture("scenario.json")).unwrap();
    let mut state = new_state(&hierarchy);
    let before = state.current_intervals().to_vec();
    let b = hierarchy.find_path("B").unwrap();
    assert_eq!(state.zoom_to(&hierarchy, b), ZoomOutcome::Ignored);
    assert_eq!(state.phase(), Phase::Idle);
    assert_eq!(state.focus(), hierarchy.root());
    assert_eq!(state.current_intervals(), before.as_slice());
    assert_eq!(state.target_intervals(), before.as_slice());
}

#[test]
fn interrupted_zoom_converges_to_latest_target() {
    let hierarchy = Hierarchy::load(&fixture("skills.json")).unwrap();
    let mut state = new_state(&hierarchy);
    let programming = hierarchy.find_path("Programming Languages").unwrap();
    let infrastructure = hierarchy.find_path("Infrastructure").unwrap();

    state.zoom_to(&hierarchy, programming);
    state.tick(Duration::from_millis(200));
    let sampled = state.current_intervals().to_vec();
    assert_eq!(state.zoom_to(&hierarchy, infrastructure), ZoomOutcome::Restarted);
    assert_eq!(state.current_intervals(), sampled.as_slice());

    while state.tick(Duration::from_millis(16)) == Phase::Transitioning {}
    assert_eq!(state.focus(), infrastructure);
    assert_eq!(state.current_intervals(), state.target_intervals());
}

#[test]
fn malformed_input_is_rejected_before_layout() {
    let err = Hierarchy::load(&fixture("malformed_leaf.json")).unwrap_err();
    match err {
        Error::Malformed(MalformedInputError::MissingValue { path }) => {
            assert_eq!(path, "A/A1");
        }
        other => panic!("unexpected error: {other}"),
    }

    let missing = Hierarchy::load(&fixture("does_not_exist.json")).unwrap_err();
    assert!(matches!(missing, Error::Load(_)));
}

#[test]
fn renders_fixture_with_escaped_labels() {
    let input = std::fs::read_to_string(fixture("skills.json")).unwrap();
    let svg = render_with_options(&input, RenderOptions::default()).unwrap();
    assert!(svg.contains("<svg"));
    assert!(svg.contains("</svg>"));
    assert!(svg.contains("Writing &lt;docs&gt;"));
    assert!(svg.contains("Networking &amp;"));
    assert!(!svg.contains("Writing <docs>"));
}

#[test]
fn focus_option_renders_zoomed_state() {
    let input = std::fs::read_to_string(fixture("skills.json")).unwrap();
    let zoomed = render_with_options(
        &input,
        RenderOptions {
            focus: Some("Programming Languages/Legacy".to_string()),
            ..RenderOptions::default()
        },
    )
    .unwrap();
    assert!(zoomed.contains("Perl"));
    assert!(!zoomed.contains(">Design<"));

    let err = render_with_options(
        &input,
        RenderOptions {
            focus: Some("Design".to_string()),
            ..RenderOptions::default()
        },
    )
    .unwrap_err();
    assert!(matches!(err, Error::NotZoomable(_)));
}

#[test]
fn dark_mode_changes_colors_not_geometry() {
    let input = std::fs::read_to_string(fixture("skills.json")).unwrap();
    let mut chart = Chart::from_json_str(&input, &Config::default()).unwrap();
    let light = chart.render_svg();
    chart.set_theme(sunburst_renderer::Theme::dark());
    let dark = chart.render_svg();
    assert_ne!(light, dark);

    let paths = |svg: &str| -> Vec<String> {
        svg.split(" d=\"")
            .skip(1)
            .map(|rest| rest.split('"').next().unwrap_or_default().to_string())
            .collect()
    };
    assert_eq!(paths(&light), paths(&dark));
    assert_eq!(chart.state().focus(), chart.hierarchy().root());
}

#[test]
fn config_file_and_layout_dump() {
    let dir = tempfile::tempdir().unwrap();
    let config_path = dir.path().join("config.json");
    std::fs::write(
        &config_path,
        r#"{"theme":"dark","sunburst":{"maxVisibleDepth":2,"radialScale":"linear"}}"#,
    )
    .unwrap();
    let config = load_config(Some(&config_path)).unwrap();
    assert_eq!(config.layout.max_visible_depth, 2.0);

    let hierarchy = Hierarchy::load(&fixture("skills.json")).unwrap();
    let mut chart = Chart::new(hierarchy, &config);
    chart.zoom_to_path("Infrastructure").unwrap();
    chart.finish();

    let dump_path = dir.path().join("layout.json");
    write_layout_dump(&dump_path, chart.hierarchy(), chart.state()).unwrap();
    let dump: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(&dump_path).unwrap()).unwrap();
    assert_eq!(dump["focus"], "Infrastructure");
    let nodes = dump["nodes"].as_array().unwrap();
    let visible: Vec<&str> = nodes
        .iter()
        .filter(|node| node["arc_visible"] == true)
        .map(|node| node["path"].as_str().unwrap())
        .collect();
    // maxVisibleDepth 2 shows Cloud's ring but not its children.
    assert!(visible.contains(&"Infrastructure/Cloud"));
    assert!(!visible.contains(&"Infrastructure/Cloud/Object Storage"));
    assert!(!visible.contains(&"Design"));
}
