use crate::config::{ArtConfig, Quality};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum PostEffect {
    Bloom,
    ChromaticAberration,
    Vignette,
    FilmGrain,
}

impl PostEffect {
    /// Order the effects run in.
    pub const CHAIN: [PostEffect; 4] = [
        PostEffect::Bloom,
        PostEffect::ChromaticAberration,
        PostEffect::Vignette,
        PostEffect::FilmGrain,
    ];

    pub fn name(self) -> &'static str {
        match self {
            PostEffect::Bloom => "bloom",
            PostEffect::ChromaticAberration => "chromatic_aberration",
            PostEffect::Vignette => "vignette",
            PostEffect::FilmGrain => "film_grain",
        }
    }
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct BloomSettings {
    pub enabled: bool,
    /// Luminance above which pixels glow.
    pub threshold: f32,
    pub strength: f32,
    pub radius: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct ChromaticSettings {
    pub enabled: bool,
    /// Channel separation in UV units.
    pub offset: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct VignetteSettings {
    pub enabled: bool,
    pub offset: f32,
    pub darkness: f32,
}

#[derive(Copy, Clone, Debug, PartialEq)]
pub struct FilmGrainSettings {
    pub enabled: bool,
    pub intensity: f32,
}

/// Full-screen effect parameters, derived from [`ArtConfig`].
///
/// `time` feeds the film-grain noise and advances with every update even
/// while grain is off, so re-enabling it does not restart the pattern.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct PostProcessSettings {
    pub bloom: BloomSettings,
    pub chromatic: ChromaticSettings,
    pub vignette: VignetteSettings,
    pub film_grain: FilmGrainSettings,
    pub time: f32,
}

impl PostProcessSettings {
    pub fn disabled() -> Self {
        Self {
            bloom: BloomSettings { enabled: false, threshold: 0.6, strength: 1.0, radius: 0.4 },
            chromatic: ChromaticSettings { enabled: false, offset: 0.002 },
            vignette: VignetteSettings { enabled: false, offset: 1.0, darkness: 0.4 },
            film_grain: FilmGrainSettings { enabled: false, intensity: 0.05 },
            time: 0.0,
        }
    }

    pub fn preset(quality: Quality) -> Self {
        let mut s = Self::disabled();
        match quality {
            Quality::Low => {
                s.vignette = VignetteSettings { enabled: true, offset: 1.0, darkness: 0.3 };
            }
            Quality::Medium => {
                s.bloom = BloomSettings { enabled: true, threshold: 0.6, strength: 1.0, radius: 0.4 };
                s.vignette = VignetteSettings { enabled: true, offset: 1.0, darkness: 0.4 };
                s.film_grain = FilmGrainSettings { enabled: true, intensity: 0.05 };
            }
            Quality::High => {
                s.bloom = BloomSettings { enabled: true, threshold: 0.5, strength: 1.5, radius: 0.5 };
                s.chromatic = ChromaticSettings { enabled: true, offset: 0.002 };
                s.vignette = VignetteSettings { enabled: true, offset: 1.0, darkness: 0.5 };
                s.film_grain = FilmGrainSettings { enabled: true, intensity: 0.08 };
            }
        }
        s
    }

    pub fn from_config(art: &ArtConfig) -> Self {
        if art.enable_post_processing {
            Self::preset(art.texture_quality)
        } else {
            Self::disabled()
        }
    }

    /// Replace the parameters with those derived from `art`, keeping `time`.
    pub fn apply_config(&mut self, art: &ArtConfig) {
        let time = self.time;
        *self = Self::from_config(art);
        self.time = time;
    }

    pub fn update(&mut self, dt: f32) {
        self.time += dt;
    }

    pub fn is_enabled(&self, effect: PostEffect) -> bool {
        match effect {
            PostEffect::Bloom => self.bloom.enabled,
            PostEffect::ChromaticAberration => self.chromatic.enabled,
            PostEffect::Vignette => self.vignette.enabled,
            PostEffect::FilmGrain => self.film_grain.enabled,
        }
    }

    pub fn set_enabled(&mut self, effect: PostEffect, enabled: bool) {
        match effect {
            PostEffect::Bloom => self.bloom.enabled = enabled,
            PostEffect::ChromaticAberration => self.chromatic.enabled = enabled,
            PostEffect::Vignette => self.vignette.enabled = enabled,
            PostEffect::FilmGrain => self.film_grain.enabled = enabled,
        }
    }

    /// Enabled effects in chain order.
    pub fn active(&self) -> impl Iterator<Item = PostEffect> + '_ {
        PostEffect::CHAIN.into_iter().filter(|e| self.is_enabled(*e))
    }

    /// Four floats of shader parameters for `effect`.
    pub fn params(&self, effect: PostEffect) -> [f32; 4] {
        match effect {
            PostEffect::Bloom => [self.bloom.threshold, self.bloom.strength, self.bloom.radius, 0.0],
            PostEffect::ChromaticAberration => [self.chromatic.offset, 0.0, 0.0, 0.0],
            PostEffect::Vignette => [self.vignette.offset, self.vignette.darkness, 0.0, 0.0],
            PostEffect::FilmGrain => [self.film_grain.intensity, self.time, 0.0, 0.0],
        }
    }
}
