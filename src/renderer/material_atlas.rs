use std::collections::{HashMap, HashSet};
use std::hash::Hash;

use image::{Rgba, RgbaImage};
use wgpu::util::DeviceExt;

use crate::assets::{AssetError, MaterialKey, ResourceManager};

/// Edge-extended border around every packed texture so linear filtering at
/// a face edge never picks up a neighbour.
const GUTTER: u32 = 2;
/// Side of the solid white patch that flat materials sample.
const WHITE_PATCH: u32 = 4;

// ── UvRect ──────────────────────────────────────────────────────────────────

/// Sub-rectangle of the atlas in normalised texture coordinates.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct UvRect {
    pub min: [f32; 2],
    pub max: [f32; 2],
}

impl UvRect {
    pub fn to_array(self) -> [f32; 4] {
        [self.min[0], self.min[1], self.max[0], self.max[1]]
    }

    fn from_pixels(x: u32, y: u32, w: u32, h: u32, atlas_w: u32, atlas_h: u32) -> Self {
        Self {
            min: [x as f32 / atlas_w as f32, y as f32 / atlas_h as f32],
            max: [(x + w) as f32 / atlas_w as f32, (y + h) as f32 / atlas_h as f32],
        }
    }
}

// ── Shelf packing (pure, GPU-free) ───────────────────────────────────────────

/// One item's position inside the packed atlas.
#[derive(Debug, PartialEq)]
pub(crate) struct Placed<K> {
    pub key: K,
    /// Top-left pixel coordinate inside the atlas.
    pub atlas_x: u32,
    pub atlas_y: u32,
    pub pixel_w: u32,
    pub pixel_h: u32,
}

/// Shelf packing over `(key, pixel_w, pixel_h)` items.
///
/// Duplicate keys are skipped (only the first occurrence after sorting is
/// packed). Items wider than `max_width` are skipped with a warning. Both
/// atlas dimensions are rounded up to the next power of two.
pub(crate) fn pack<K>(items: &[(K, u32, u32)], max_width: u32) -> (Vec<Placed<K>>, u32, u32)
where
    K: Copy + Eq + Hash + std::fmt::Debug,
{
    // Tallest first for better shelf utilisation.
    let mut order: Vec<usize> = (0..items.len()).collect();
    order.sort_by(|&a, &b| items[b].2.cmp(&items[a].2));

    let mut seen: HashSet<K> = HashSet::new();
    let mut placements = Vec::new();
    let mut cur_x = 0u32;
    let mut cur_y = 0u32;
    let mut row_h = 0u32;

    for &i in &order {
        let (key, w, h) = items[i];
        if !seen.insert(key) {
            continue;
        }
        if w > max_width {
            tracing::warn!(?key, width = w, max_width, "texture wider than atlas; skipping");
            continue;
        }
        if cur_x + w > max_width {
            cur_y += row_h;
            cur_x = 0;
            row_h = 0;
        }
        placements.push(Placed { key, atlas_x: cur_x, atlas_y: cur_y, pixel_w: w, pixel_h: h });
        cur_x += w;
        row_h = row_h.max(h);
    }

    let atlas_h = (cur_y + row_h).next_power_of_two().max(1);
    let atlas_w = max_width.next_power_of_two();
    (placements, atlas_w, atlas_h)
}

/// Copy `img` to `(x + GUTTER, y + GUTTER)` and smear its border pixels
/// outward across the gutter.
fn blit_with_gutter(atlas: &mut RgbaImage, img: &RgbaImage, x: u32, y: u32) {
    let (w, h) = img.dimensions();
    if w == 0 || h == 0 {
        return;
    }
    for dy in 0..h + 2 * GUTTER {
        for dx in 0..w + 2 * GUTTER {
            let sx = dx.saturating_sub(GUTTER).min(w - 1);
            let sy = dy.saturating_sub(GUTTER).min(h - 1);
            atlas.put_pixel(x + dx, y + dy, *img.get_pixel(sx, sy));
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
enum Slot {
    White,
    Material(MaterialKey),
}

// ── MaterialAtlas ───────────────────────────────────────────────────────────

/// Every loaded material texture packed into one GPU texture, plus a white
/// patch that untextured materials sample so one pipeline draws both.
pub struct MaterialAtlas {
    uvs: HashMap<MaterialKey, UvRect>,
    white: UvRect,
    pub texture_view: wgpu::TextureView,
    pub sampler: wgpu::Sampler,
}

impl MaterialAtlas {
    /// Maximum row width of the packed atlas texture in pixels.
    const ATLAS_WIDTH: u32 = 4096;

    /// Pack the textured materials of `resources` and upload them.
    pub fn build(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        resources: &ResourceManager,
    ) -> Result<Self, AssetError> {
        let textures = resources.textures()?;

        let mut items = vec![(Slot::White, WHITE_PATCH, WHITE_PATCH)];
        items.extend(textures.iter().map(|(key, img)| {
            (Slot::Material(*key), img.width() + 2 * GUTTER, img.height() + 2 * GUTTER)
        }));
        let (placements, atlas_w, atlas_h) = pack(&items, Self::ATLAS_WIDTH);

        let lookup: HashMap<MaterialKey, &RgbaImage> =
            textures.iter().map(|(k, img)| (*k, img.as_ref())).collect();
        let mut atlas_img = RgbaImage::new(atlas_w, atlas_h);
        let mut uvs = HashMap::new();
        let mut white = UvRect { min: [0.0; 2], max: [0.0; 2] };

        for p in &placements {
            match p.key {
                Slot::White => {
                    for dy in 0..p.pixel_h {
                        for dx in 0..p.pixel_w {
                            atlas_img.put_pixel(p.atlas_x + dx, p.atlas_y + dy, Rgba([255; 4]));
                        }
                    }
                    // Inset by one texel so filtering stays inside the patch.
                    white = UvRect::from_pixels(
                        p.atlas_x + 1,
                        p.atlas_y + 1,
                        p.pixel_w - 2,
                        p.pixel_h - 2,
                        atlas_w,
                        atlas_h,
                    );
                }
                Slot::Material(key) => {
                    let Some(img) = lookup.get(&key) else { continue };
                    blit_with_gutter(&mut atlas_img, img, p.atlas_x, p.atlas_y);
                    uvs.insert(
                        key,
                        UvRect::from_pixels(
                            p.atlas_x + GUTTER,
                            p.atlas_y + GUTTER,
                            img.width(),
                            img.height(),
                            atlas_w,
                            atlas_h,
                        ),
                    );
                }
            }
        }

        tracing::debug!(textures = uvs.len(), atlas_w, atlas_h, "material atlas built");
        let (texture_view, sampler) = Self::upload(device, queue, &atlas_img);
        Ok(Self { uvs, white, texture_view, sampler })
    }

    /// A white-only atlas, used until the first build.
    pub fn empty(device: &wgpu::Device, queue: &wgpu::Queue) -> Self {
        let img = RgbaImage::from_pixel(WHITE_PATCH, WHITE_PATCH, Rgba([255; 4]));
        let (texture_view, sampler) = Self::upload(device, queue, &img);
        let white = UvRect { min: [0.25, 0.25], max: [0.75, 0.75] };
        Self { uvs: HashMap::new(), white, texture_view, sampler }
    }

    /// Where `key` lives in the atlas; flat materials get the white patch.
    pub fn uv(&self, key: MaterialKey) -> UvRect {
        self.uvs.get(&key).copied().unwrap_or(self.white)
    }

    pub fn white(&self) -> UvRect {
        self.white
    }

    fn upload(
        device: &wgpu::Device,
        queue: &wgpu::Queue,
        img: &RgbaImage,
    ) -> (wgpu::TextureView, wgpu::Sampler) {
        let (w, h) = img.dimensions();
        let texture = device.create_texture_with_data(
            queue,
            &wgpu::TextureDescriptor {
                label: Some("material_atlas_tex"),
                size: wgpu::Extent3d { width: w, height: h, depth_or_array_layers: 1 },
                mip_level_count: 1,
                sample_count: 1,
                dimension: wgpu::TextureDimension::D2,
                format: wgpu::TextureFormat::Rgba8UnormSrgb,
                usage: wgpu::TextureUsages::TEXTURE_BINDING | wgpu::TextureUsages::COPY_DST,
                view_formats: &[],
            },
            wgpu::util::TextureDataOrder::LayerMajor,
            img.as_raw(),
        );
        let texture_view = texture.create_view(&wgpu::TextureViewDescriptor::default());
        let sampler = device.create_sampler(&wgpu::SamplerDescriptor {
            address_mode_u: wgpu::AddressMode::ClampToEdge,
            address_mode_v: wgpu::AddressMode::ClampToEdge,
            mag_filter: wgpu::FilterMode::Linear,
            min_filter: wgpu::FilterMode::Linear,
            ..Default::default()
        });
        (texture_view, sampler)
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pack_empty_input_returns_no_placements() {
        let (placements, atlas_w, atlas_h) = pack::<u32>(&[], 512);
        assert!(placements.is_empty());
        assert_eq!(atlas_h, 1);
        assert_eq!(atlas_w, 512);
    }

    #[test]
    fn pack_single_item_placed_at_origin() {
        let (pl, _, _) = pack(&[(7u32, 16, 24)], 512);
        assert_eq!(pl.len(), 1);
        assert_eq!((pl[0].atlas_x, pl[0].atlas_y), (0, 0));
        assert_eq!((pl[0].pixel_w, pl[0].pixel_h), (16, 24));
    }

    #[test]
    fn pack_wraps_to_next_shelf_when_row_full() {
        let items = [(1u32, 200, 32), (2, 200, 32), (3, 200, 32)];
        let (pl, _, _) = pack(&items, 512);
        assert_eq!(pl.len(), 3);
        let row0 = pl.iter().filter(|p| p.atlas_y == 0).count();
        let row1: Vec<_> = pl.iter().filter(|p| p.atlas_y > 0).collect();
        assert_eq!(row0, 2, "first two items fit on row 0");
        assert_eq!(row1.len(), 1, "third item wraps to row 1");
        assert_eq!(row1[0].atlas_y, 32, "row 1 starts at y = row-0 height");
    }

    #[test]
    fn pack_sorts_taller_items_first() {
        let items = [(1u32, 32, 16), (2, 32, 64)];
        let (pl, _, _) = pack(&items, 512);
        let tall = pl.iter().find(|p| p.key == 2).unwrap();
        let small = pl.iter().find(|p| p.key == 1).unwrap();
        assert!(tall.atlas_x < small.atlas_x, "tallest item placed first");
    }

    #[test]
    fn pack_skips_item_wider_than_atlas() {
        let items = [(1u32, 600, 48), (2, 16, 24)];
        let (pl, _, _) = pack(&items, 512);
        assert_eq!(pl.len(), 1, "oversized item is excluded");
        assert_eq!(pl[0].key, 2);
    }

    #[test]
    fn pack_duplicate_key_only_placed_once() {
        let items = [(1u32, 16, 24), (1, 64, 64)];
        let (pl, _, _) = pack(&items, 512);
        assert_eq!(pl.len(), 1);
        assert_eq!((pl[0].pixel_w, pl[0].pixel_h), (64, 64));
    }

    #[test]
    fn pack_never_overflows_the_atlas() {
        let items: Vec<_> = (0..10u32).map(|i| (i, 100, 30 + i)).collect();
        let (pl, atlas_w, atlas_h) = pack(&items, 256);
        assert!(atlas_w.is_power_of_two() && atlas_h.is_power_of_two());
        for p in &pl {
            assert!(p.atlas_x + p.pixel_w <= atlas_w, "{:?} overflows x", p.key);
            assert!(p.atlas_y + p.pixel_h <= atlas_h, "{:?} overflows y", p.key);
        }
    }

    #[test]
    fn gutter_repeats_edge_pixels() {
        let mut img = RgbaImage::new(2, 2);
        img.put_pixel(0, 0, Rgba([10, 0, 0, 255]));
        img.put_pixel(1, 1, Rgba([0, 20, 0, 255]));
        let mut atlas = RgbaImage::new(2 + 2 * GUTTER, 2 + 2 * GUTTER);
        blit_with_gutter(&mut atlas, &img, 0, 0);

        assert_eq!(atlas.get_pixel(0, 0), &Rgba([10, 0, 0, 255]), "top-left corner smeared");
        assert_eq!(
            atlas.get_pixel(1 + 2 * GUTTER, 1 + 2 * GUTTER),
            &Rgba([0, 20, 0, 255]),
            "bottom-right corner smeared"
        );
        assert_eq!(atlas.get_pixel(GUTTER, GUTTER), img.get_pixel(0, 0));
    }

    #[test]
    fn uv_rect_from_pixels_is_normalised() {
        let uv = UvRect::from_pixels(64, 0, 64, 32, 256, 128);
        assert_eq!(uv.to_array(), [0.25, 0.0, 0.5, 0.25]);
    }
}
