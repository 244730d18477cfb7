use glam::{Mat4, Vec2, Vec3, Vec4};

/// Camera data uploaded to the GPU.
///
/// `view_proj` is column-major, matching WGSL `mat4x4<f32>`. `eye` carries
/// the world-space camera position in `xyz` (w unused) for billboarding and
/// specular terms; `right` and `up` are the camera basis for particle quads.
#[repr(C)]
#[derive(Copy, Clone, Debug, bytemuck::Pod, bytemuck::Zeroable)]
pub struct CameraUniform {
    pub view_proj: [[f32; 4]; 4],
    pub eye: [f32; 4],
    pub right: [f32; 4],
    pub up: [f32; 4],
}

/// Perspective camera aimed at the board, with screen shake.
pub struct Camera {
    pub eye: Vec3,
    pub target: Vec3,
    /// Vertical field of view in degrees.
    pub fov_y: f32,
    pub near: f32,
    pub far: f32,
    aspect: f32,
    /// Remaining shake time in seconds.
    pub(crate) shake_timer: f32,
    /// Peak shake displacement in world units.
    pub(crate) shake_intensity: f32,
    pub(crate) shake_offset: Vec2,
}

impl Camera {
    pub const SHAKE_DURATION: f32 = 0.5;

    pub fn new(eye: Vec3, target: Vec3, width: u32, height: u32) -> Self {
        Self {
            eye,
            target,
            fov_y: 45.0,
            near: 0.1,
            far: 200.0,
            aspect: aspect_of(width, height),
            shake_timer: 0.0,
            shake_intensity: 0.0,
            shake_offset: Vec2::ZERO,
        }
    }

    /// Framing for an `N×N` board of `cell`-sized tiles centred on the origin.
    pub fn for_board(grid_size: u32, cell_size: f32, width: u32, height: u32) -> Self {
        let half = grid_size as f32 * cell_size / 2.0;
        Self::new(Vec3::new(0.0, half * 1.8 + 10.0, half + 10.0), Vec3::ZERO, width, height)
    }

    pub fn aspect(&self) -> f32 {
        self.aspect
    }

    /// Recompute the projection's aspect ratio for a new viewport.
    pub fn resize(&mut self, width: u32, height: u32) {
        self.aspect = aspect_of(width, height);
    }

    pub fn is_shaking(&self) -> bool {
        self.shake_timer > 0.0
    }

    /// Decay and re-sample the shake displacement.
    pub fn tick(&mut self, dt: f32) {
        if self.shake_timer > 0.0 {
            self.shake_timer -= dt;
            let decay = (self.shake_timer / Self::SHAKE_DURATION).max(0.0);
            let t = self.shake_timer;
            use std::f32::consts::TAU;
            self.shake_offset = Vec2::new(
                (t * 47.0 * TAU).sin() * self.shake_intensity * decay,
                (t * 37.0 * TAU + 1.1).sin() * self.shake_intensity * decay,
            );
            if self.shake_timer <= 0.0 {
                self.shake_timer = 0.0;
                self.shake_offset = Vec2::ZERO;
            }
        }
    }

    /// Shake for half a second, peaking at `intensity` world units. A shake
    /// already in progress keeps the stronger of the two intensities.
    pub fn shake(&mut self, intensity: f32) {
        self.shake_intensity = if self.is_shaking() {
            intensity.max(self.shake_intensity)
        } else {
            intensity
        };
        self.shake_timer = Self::SHAKE_DURATION;
    }

    fn shaken(&self) -> (Vec3, Vec3) {
        let offset = Vec3::new(self.shake_offset.x, 0.0, self.shake_offset.y);
        (self.eye + offset, self.target + offset)
    }

    pub fn view(&self) -> Mat4 {
        let (eye, target) = self.shaken();
        Mat4::look_at_rh(eye, target, Vec3::Y)
    }

    pub fn projection(&self) -> Mat4 {
        Mat4::perspective_rh(self.fov_y.to_radians(), self.aspect, self.near, self.far)
    }

    pub fn view_proj(&self) -> Mat4 {
        self.projection() * self.view()
    }

    pub fn build_uniform(&self) -> CameraUniform {
        let view = self.view();
        let inv = view.inverse();
        let (eye, _) = self.shaken();
        CameraUniform {
            view_proj: self.view_proj().to_cols_array_2d(),
            eye: eye.extend(1.0).to_array(),
            right: inv.x_axis.truncate().extend(0.0).to_array(),
            up: inv.y_axis.truncate().extend(0.0).to_array(),
        }
    }

    /// Intersect the ray through a screen pixel with the plane `y = height`.
    /// Returns `None` when the ray points away from the plane.
    pub fn ray_to_plane(&self, screen: Vec2, viewport: Vec2, height: f32) -> Option<Vec3> {
        if viewport.x <= 0.0 || viewport.y <= 0.0 {
            return None;
        }
        let ndc = Vec2::new(
            screen.x / viewport.x * 2.0 - 1.0,
            1.0 - screen.y / viewport.y * 2.0,
        );
        let inv = self.view_proj().inverse();
        let near = inv * Vec4::new(ndc.x, ndc.y, 0.0, 1.0);
        let far = inv * Vec4::new(ndc.x, ndc.y, 1.0, 1.0);
        let near = near.truncate() / near.w;
        let far = far.truncate() / far.w;

        let dir = far - near;
        if dir.y.abs() < f32::EPSILON {
            return None;
        }
        let t = (height - near.y) / dir.y;
        (t >= 0.0).then(|| near + dir * t)
    }
}

fn aspect_of(width: u32, height: u32) -> f32 {
    width.max(1) as f32 / height.max(1) as f32
}
