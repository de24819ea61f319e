//! Scene flattening into material-keyed batches and the generic batch walk
//! shared by every pass that draws a scene graph.

use crate::scene::{parse_asset_id, NodeId, Scene};
use glam::Mat4;
use std::collections::{BTreeMap, HashMap};

/// Which identifier a pass writes per draw.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum IdSource {
    #[default]
    None,
    /// Traversal order identifier of the owning node.
    Node,
    /// `asset_<n>` parsed from the node name, else from the material name.
    Asset,
}

/// One draw: a geometry of a node with its accumulated world transform.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BatchEntry {
    pub node: NodeId,
    pub geometry: usize,
    pub transform: Mat4,
    pub node_id: u32,
    /// 0 if neither the node nor the material names an asset.
    pub asset_id: u32,
    /// Index into the per-draw uniform array.
    pub slot: u32,
}

impl BatchEntry {
    pub fn id(&self, source: IdSource) -> u32 {
        match source {
            IdSource::None => 0,
            IdSource::Node => self.node_id,
            IdSource::Asset => self.asset_id,
        }
    }
}

#[derive(Clone, Debug, Default)]
pub struct SceneBatches {
    pub opaque: BTreeMap<usize, Vec<BatchEntry>>,
    pub transparent: BTreeMap<usize, Vec<BatchEntry>>,
    node_ids: HashMap<NodeId, u32>,
    len: usize,
}

impl SceneBatches {
    /// Flattens `scene` depth-first. Node identifiers start at 1 in
    /// first-visit order; 0 is left for the background.
    pub fn preprocess(scene: &Scene, root_transform: Mat4) -> Self {
        let mut batches = Self::default();
        let mut next_id = 1u32;

        // Reversed so the stack pops roots and children in declaration order.
        let mut stack: Vec<(NodeId, Mat4)> = scene
            .roots
            .iter()
            .rev()
            .map(|r| (*r, root_transform))
            .collect();

        while let Some((node_id, parent)) = stack.pop() {
            let Some(node) = scene.nodes.get(node_id) else {
                log::warn!("scene references missing node {}", node_id);
                continue;
            };
            if batches.node_ids.contains_key(&node_id) {
                log::warn!("node {} is reachable twice, skipping", node_id);
                continue;
            }
            let node_key = next_id;
            next_id += 1;
            batches.node_ids.insert(node_id, node_key);

            let world = parent * node.transform.unwrap_or(Mat4::IDENTITY);

            for binding in &node.bindings {
                let Some(material) = scene.materials.get(binding.material) else {
                    log::warn!("node {} references missing material", node_id);
                    continue;
                };
                let asset_id = node
                    .name
                    .as_deref()
                    .and_then(parse_asset_id)
                    .or_else(|| material.name.as_deref().and_then(parse_asset_id))
                    .unwrap_or(0);
                let entry = BatchEntry {
                    node: node_id,
                    geometry: binding.geometry,
                    transform: world,
                    node_id: node_key,
                    asset_id,
                    slot: batches.len as u32,
                };
                batches.len += 1;

                let target = if material.is_transparent {
                    &mut batches.transparent
                } else {
                    &mut batches.opaque
                };
                target.entry(binding.material).or_default().push(entry);
            }

            stack.extend(node.children.iter().rev().map(|c| (*c, world)));
        }

        log::debug!(
            "preprocessed {} nodes into {} draws ({} opaque / {} transparent materials)",
            batches.node_ids.len(),
            batches.len,
            batches.opaque.len(),
            batches.transparent.len()
        );
        batches
    }

    pub fn node_id(&self, node: NodeId) -> Option<u32> {
        self.node_ids.get(&node).copied()
    }

    /// Number of draws over both batches.
    pub fn len(&self) -> usize {
        self.len
    }

    pub fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// All entries in slot order.
    pub fn entries(&self) -> Vec<BatchEntry> {
        let mut all: Vec<BatchEntry> = self
            .opaque
            .values()
            .chain(self.transparent.values())
            .flatten()
            .copied()
            .collect();
        all.sort_by_key(|e| e.slot);
        all
    }
}

/// Per-pass state binding, injected into each [`execute`] call.
pub trait PassBindings {
    type Pass;

    /// Called once before any draw.
    fn bind_uniforms(&self, pass: &mut Self::Pass);
    /// Called once per material batch.
    fn bind_material(&self, pass: &mut Self::Pass, material: usize);
    fn draw(&self, pass: &mut Self::Pass, entry: &BatchEntry);
}

/// Draws all batches, opaque first. Does nothing without a scene.
pub fn execute<B: PassBindings>(pass: &mut B::Pass, batches: Option<&SceneBatches>, bindings: &B) {
    let Some(batches) = batches else {
        return;
    };
    if batches.is_empty() {
        return;
    }

    bindings.bind_uniforms(pass);
    for batch in [&batches.opaque, &batches.transparent] {
        for (material, entries) in batch {
            bindings.bind_material(pass, *material);
            for entry in entries {
                bindings.draw(pass, entry);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scene::{Geometry, GeometryBinding, Material, Node};
    use glam::Vec3;
    use std::collections::HashSet;

    fn scene() -> Scene {
        let mut scene = Scene::default();
        let g0 = scene.add_geometry(Geometry::default());
        let g1 = scene.add_geometry(Geometry::default());
        let wall = scene.add_material(Material {
            name: Some("wall".into()),
            ..Material::default()
        });
        let glass = scene.add_material(Material {
            name: Some("asset_9_glass".into()),
            is_transparent: true,
            ..Material::default()
        });

        let root = scene.add_node(Node {
            name: Some("apartment".into()),
            transform: Some(Mat4::from_translation(Vec3::X)),
            ..Node::default()
        });
        scene.roots.push(root);
        scene.add_child(
            root,
            Node {
                name: Some("asset_3".into()),
                transform: Some(Mat4::from_translation(Vec3::Y)),
                bindings: vec![
                    GeometryBinding { geometry: g0, material: wall },
                    GeometryBinding { geometry: g1, material: glass },
                ],
                ..Node::default()
            },
        );
        scene.add_child(
            root,
            Node {
                bindings: vec![GeometryBinding { geometry: g1, material: glass }],
                ..Node::default()
            },
        );
        scene
    }

    #[derive(Default)]
    struct Recorder;

    impl PassBindings for Recorder {
        type Pass = Vec<String>;

        fn bind_uniforms(&self, pass: &mut Vec<String>) {
            pass.push("uniforms".into());
        }

        fn bind_material(&self, pass: &mut Vec<String>, material: usize) {
            pass.push(format!("material {}", material));
        }

        fn draw(&self, pass: &mut Vec<String>, entry: &BatchEntry) {
            pass.push(format!("draw {}/{}", entry.node, entry.geometry));
        }
    }

    #[test]
    fn node_ids_are_unique_and_stable() {
        let scene = scene();
        let a = SceneBatches::preprocess(&scene, Mat4::IDENTITY);
        let b = SceneBatches::preprocess(&scene, Mat4::IDENTITY);

        let ids: Vec<u32> = (0..scene.nodes.len()).filter_map(|n| a.node_id(n)).collect();
        assert_eq!(ids, vec![1, 2, 3]);
        let unique: HashSet<u32> = ids.iter().copied().collect();
        assert_eq!(unique.len(), ids.len());
        for n in 0..scene.nodes.len() {
            assert_eq!(a.node_id(n), b.node_id(n));
        }
    }

    #[test]
    fn one_entry_per_binding() {
        let scene = scene();
        let batches = SceneBatches::preprocess(&scene, Mat4::IDENTITY);
        let expected: HashSet<(usize, usize)> = scene
            .nodes
            .iter()
            .enumerate()
            .flat_map(|(n, node)| node.bindings.iter().map(move |b| (n, b.geometry)))
            .collect();
        let entries = batches.entries();
        let got: HashSet<(usize, usize)> = entries.iter().map(|e| (e.node, e.geometry)).collect();
        assert_eq!(entries.len(), 3);
        assert_eq!(got, expected);
        assert_eq!(batches.opaque.values().flatten().count(), 1);
        assert_eq!(batches.transparent.values().flatten().count(), 2);
    }

    #[test]
    fn transforms_accumulate() {
        let scene = scene();
        let root = Mat4::from_translation(Vec3::Z);
        let batches = SceneBatches::preprocess(&scene, root);
        let entry = batches.entries()[0];
        assert_eq!(
            entry.transform.transform_point3(Vec3::ZERO),
            Vec3::new(1.0, 1.0, 1.0)
        );
    }

    #[test]
    fn asset_ids_prefer_node_name() {
        let scene = scene();
        let batches = SceneBatches::preprocess(&scene, Mat4::IDENTITY);
        let entries = batches.entries();
        let assets: Vec<u32> = entries.iter().map(|e| e.id(IdSource::Asset)).collect();
        // asset_3 node for both of its bindings, then the material name.
        assert_eq!(assets, vec![3, 3, 9]);
        let nodes: Vec<u32> = entries.iter().map(|e| e.id(IdSource::Node)).collect();
        assert_eq!(nodes, vec![2, 2, 3]);
        assert!(entries.iter().all(|e| e.id(IdSource::None) == 0));
    }

    #[test]
    fn opaque_batches_draw_first() {
        let scene = scene();
        let batches = SceneBatches::preprocess(&scene, Mat4::IDENTITY);
        let mut calls = Vec::new();
        execute(&mut calls, Some(&batches), &Recorder);
        assert_eq!(
            calls,
            vec![
                "uniforms",
                "material 0",
                "draw 1/0",
                "material 1",
                "draw 1/1",
                "draw 2/1",
            ]
        );
    }

    #[test]
    fn missing_scene_is_a_no_op() {
        let mut calls = Vec::new();
        execute(&mut calls, None, &Recorder);
        execute(&mut calls, Some(&SceneBatches::default()), &Recorder);
        assert!(calls.is_empty());
    }
}
