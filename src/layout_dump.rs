use crate::focus::FocusState;
use crate::hierarchy::Hierarchy;
use crate::layout::Interval;
use serde::Serialize;
use std::fs::File;
use std::io::BufWriter;
use std::path::Path;

#[derive(Debug, Serialize)]
pub struct LayoutDump {
    pub focus: String,
    pub focus_depth: usize,
    pub nodes: Vec<NodeDump>,
}

#[derive(Debug, Serialize)]
pub struct NodeDump {
    pub id: usize,
    pub path: String,
    pub name: String,
    pub depth: usize,
    pub value: Option<f64>,
    pub aggregated_value: f64,
    pub category: Option<usize>,
    pub base: Interval,
    pub current: Interval,
    pub target: Interval,
    pub arc_visible: bool,
    pub label_visible: bool,
}

impl LayoutDump {
    pub fn from_state(hierarchy: &Hierarchy, state: &FocusState) -> Self {
        let nodes = hierarchy
            .iter()
            .map(|(id, node)| NodeDump {
                id: id.index(),
                path: hierarchy.path(id),
                name: node.name.clone(),
                depth: node.depth,
                value: node.value,
                aggregated_value: node.aggregated_value,
                category: node.category,
                base: state.base().get(id),
                current: state.current(id),
                target: state.target(id),
                arc_visible: state.arc_visible(id),
                label_visible: state.label_visible(id),
            })
            .collect();

        LayoutDump {
            focus: hierarchy.path(state.focus()),
            focus_depth: hierarchy.node(state.focus()).depth,
            nodes,
        }
    }
}

pub fn write_layout_dump(path: &Path, hierarchy: &Hierarchy, state: &FocusState) -> anyhow::Result<()> {
    let file = File::create(path)?;
    let writer = BufWriter::new(file);
    let dump = LayoutDump::from_state(hierarchy, state);
    serde_json::to_writer_pretty(writer, &dump)?;
    Ok(())
}
