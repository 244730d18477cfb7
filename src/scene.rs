use glam::Vec3;

use crate::assets::MaterialKey;

// ── Color ───────────────────────────────────────────────────────────────────

/// Linear RGBA color.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Color(pub [f32; 4]);

impl Color {
    pub const WHITE: Self = Self([1.0, 1.0, 1.0, 1.0]);
    pub const BLACK: Self = Self([0.0, 0.0, 0.0, 1.0]);

    /// Decode a `0xRRGGBB` sRGB hex value into linear space.
    pub fn from_hex(hex: u32) -> Self {
        let channel = |shift: u32| srgb_to_linear(((hex >> shift) & 0xff) as f32 / 255.0);
        Self([channel(16), channel(8), channel(0), 1.0])
    }

    pub fn rgb(self) -> [f32; 3] {
        [self.0[0], self.0[1], self.0[2]]
    }

    pub fn with_alpha(self, a: f32) -> Self {
        Self([self.0[0], self.0[1], self.0[2], a])
    }
}

fn srgb_to_linear(c: f32) -> f32 {
    if c <= 0.04045 {
        c / 12.92
    } else {
        ((c + 0.055) / 1.055).powf(2.4)
    }
}

// ── Nodes ───────────────────────────────────────────────────────────────────

/// Generational handle to a scene node. Stale handles (node removed, slot
/// reused) never resolve.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NodeId {
    index: u32,
    generation: u32,
}

impl NodeId {
    pub fn index(self) -> u32 {
        self.index
    }

    pub fn generation(self) -> u32 {
        self.generation
    }
}

/// Unit primitives; a node's scale stretches them to size.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Shape {
    /// Axis-aligned box spanning `[-0.5, 0.5]` on every axis.
    Cube,
    /// Sphere of radius 0.5.
    Sphere,
}

#[derive(Clone, Debug, PartialEq)]
pub struct MeshNode {
    pub shape: Shape,
    pub position: Vec3,
    pub scale: Vec3,
    pub material: MaterialKey,
    /// Multiplied with the resolved material color.
    pub tint: Color,
    /// Replaces the material's emissive intensity when set.
    pub emissive_override: Option<f32>,
    pub visible: bool,
}

impl MeshNode {
    pub fn new(shape: Shape, material: MaterialKey, position: Vec3, scale: Vec3) -> Self {
        Self {
            shape,
            position,
            scale,
            material,
            tint: Color::WHITE,
            emissive_override: None,
            visible: true,
        }
    }
}

struct Slot {
    generation: u32,
    node: Option<MeshNode>,
}

// ── SceneGraph ──────────────────────────────────────────────────────────────

/// Flat arena of drawable nodes.
///
/// Gameplay code owns `NodeId`s as back-references; the graph never points
/// back at gameplay state. Removing a node bumps its slot's generation so a
/// retained handle cannot touch whatever reuses the slot.
pub struct SceneGraph {
    slots: Vec<Slot>,
    free: Vec<u32>,
    live: usize,
    pub background: Color,
}

impl Default for SceneGraph {
    fn default() -> Self {
        Self::new()
    }
}

impl SceneGraph {
    pub fn new() -> Self {
        Self {
            slots: Vec::new(),
            free: Vec::new(),
            live: 0,
            background: Color::from_hex(0x0b0f1a),
        }
    }

    pub fn insert(&mut self, node: MeshNode) -> NodeId {
        self.live += 1;
        if let Some(index) = self.free.pop() {
            let slot = &mut self.slots[index as usize];
            slot.node = Some(node);
            NodeId { index, generation: slot.generation }
        } else {
            let index = self.slots.len() as u32;
            self.slots.push(Slot { generation: 0, node: Some(node) });
            NodeId { index, generation: 0 }
        }
    }

    /// Returns the removed node, or `None` for a stale handle.
    pub fn remove(&mut self, id: NodeId) -> Option<MeshNode> {
        if !self.contains(id) {
            return None;
        }
        let slot = &mut self.slots[id.index as usize];
        slot.generation += 1;
        self.free.push(id.index);
        self.live -= 1;
        slot.node.take()
    }

    pub fn contains(&self, id: NodeId) -> bool {
        self.slots
            .get(id.index as usize)
            .is_some_and(|s| s.generation == id.generation && s.node.is_some())
    }

    pub fn get(&self, id: NodeId) -> Option<&MeshNode> {
        self.slots
            .get(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_ref())
    }

    pub fn get_mut(&mut self, id: NodeId) -> Option<&mut MeshNode> {
        self.slots
            .get_mut(id.index as usize)
            .filter(|s| s.generation == id.generation)
            .and_then(|s| s.node.as_mut())
    }

    pub fn len(&self) -> usize {
        self.live
    }

    pub fn is_empty(&self) -> bool {
        self.live == 0
    }

    pub fn iter(&self) -> impl Iterator<Item = (NodeId, &MeshNode)> {
        self.slots.iter().enumerate().filter_map(|(i, s)| {
            s.node.as_ref().map(|n| (NodeId { index: i as u32, generation: s.generation }, n))
        })
    }

    pub fn clear(&mut self) {
        for (i, slot) in self.slots.iter_mut().enumerate() {
            if slot.node.take().is_some() {
                slot.generation += 1;
                self.free.push(i as u32);
            }
        }
        self.live = 0;
    }
}
