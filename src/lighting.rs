//! Scene lights and their packed uniform form.

use glam::Vec3;

use crate::color::Color;
use crate::scene::Scene;

/// Directional lights beyond this count are ignored by the mesh shader.
pub const MAX_DIRECTIONAL_LIGHTS: usize = 4;

#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Light {
    /// Sky/ground gradient: surfaces facing `up` get `sky`, facing away get
    /// `ground`, blended in between.
    Hemisphere {
        sky: Color,
        ground: Color,
        intensity: f32,
        up: Vec3,
    },
    /// Parallel light shining from `position` toward `target`.
    Directional {
        color: Color,
        intensity: f32,
        position: Vec3,
        target: Vec3,
    },
}

impl Light {
    pub fn hemisphere(sky: Color, ground: Color, intensity: f32) -> Self {
        Light::Hemisphere {
            sky,
            ground,
            intensity,
            up: Vec3::Y,
        }
    }

    pub fn directional(color: Color, intensity: f32, position: Vec3) -> Self {
        Light::Directional {
            color,
            intensity,
            position,
            target: Vec3::ZERO,
        }
    }
}

/// Adds a soft daylight rig: a warm-ground/blue-sky hemisphere fill and a
/// bright warm key light from the upper left.
pub fn add_natural_light(scene: &mut Scene) {
    scene.add_light(Light::hemisphere(
        Color::from_hsl(0.6, 1.0, 0.6),
        Color::from_hsl(0.095, 1.0, 0.75),
        0.6,
    ));
    scene.add_light(Light::directional(
        Color::from_hsl(0.1, 1.0, 0.95),
        1.0,
        Vec3::new(-1.0, 1.75, 1.0) * 30.0,
    ));
}

#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct DirectionalUniform {
    /// Unit vector pointing toward the light.
    pub direction: [f32; 4],
    /// Linear color premultiplied by intensity.
    pub color: [f32; 4],
}

/// Light block consumed by `mesh.wgsl`.
#[repr(C)]
#[derive(Copy, Clone, Debug, Default, bytemuck::Pod, bytemuck::Zeroable)]
pub struct LightUniforms {
    pub sky: [f32; 4],
    pub ground: [f32; 4],
    pub hemisphere_up: [f32; 4],
    pub directional: [DirectionalUniform; MAX_DIRECTIONAL_LIGHTS],
    pub directional_count: u32,
    pub _padding: [u32; 3],
}

impl LightUniforms {
    /// Pack `lights`. Hemisphere lights add up; directional lights past
    /// [`MAX_DIRECTIONAL_LIGHTS`] are dropped.
    pub fn from_lights(lights: &[Light]) -> Self {
        let mut uniforms = Self {
            hemisphere_up: [0.0, 1.0, 0.0, 0.0],
            ..Default::default()
        };
        let mut sky = Vec3::ZERO;
        let mut ground = Vec3::ZERO;

        for light in lights {
            match *light {
                Light::Hemisphere {
                    sky: s,
                    ground: g,
                    intensity,
                    up,
                } => {
                    sky += linear_rgb(s) * intensity;
                    ground += linear_rgb(g) * intensity;
                    uniforms.hemisphere_up = up.normalize_or(Vec3::Y).extend(0.0).into();
                }
                Light::Directional {
                    color,
                    intensity,
                    position,
                    target,
                } => {
                    let slot = uniforms.directional_count as usize;
                    if slot >= MAX_DIRECTIONAL_LIGHTS {
                        tracing::warn!("directional light limit reached, ignoring extra light");
                        continue;
                    }
                    uniforms.directional[slot] = DirectionalUniform {
                        direction: (position - target).normalize_or(Vec3::Y).extend(0.0).into(),
                        color: (linear_rgb(color) * intensity).extend(1.0).into(),
                    };
                    uniforms.directional_count += 1;
                }
            }
        }

        uniforms.sky = sky.extend(1.0).into();
        uniforms.ground = ground.extend(1.0).into();
        uniforms
    }
}

fn linear_rgb(color: Color) -> Vec3 {
    let c = color.to_linear();
    Vec3::new(c.r, c.g, c.b)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn natural_light_rig() {
        let mut scene = Scene::new();
        add_natural_light(&mut scene);

        let lights = scene.lights();
        assert_eq!(lights.len(), 2);
        assert!(matches!(
            lights[0],
            Light::Hemisphere { intensity, .. } if intensity == 0.6
        ));
        match lights[1] {
            Light::Directional {
                intensity,
                position,
                ..
            } => {
                assert_eq!(intensity, 1.0);
                assert_eq!(position, Vec3::new(-30.0, 52.5, 30.0));
            }
            other => panic!("expected directional light, got {other:?}"),
        }
    }

    #[test]
    fn uniforms_point_toward_light() {
        let mut scene = Scene::new();
        add_natural_light(&mut scene);
        let uniforms = LightUniforms::from_lights(scene.lights());

        assert_eq!(uniforms.directional_count, 1);
        let dir = Vec3::from_slice(&uniforms.directional[0].direction[..3]);
        let expected = Vec3::new(-1.0, 1.75, 1.0).normalize();
        assert!((dir - expected).length() < 1e-5);
        // Sky is blue-dominant, ground is warm
        assert!(uniforms.sky[2] > uniforms.sky[0]);
        assert!(uniforms.ground[0] > uniforms.ground[2]);
    }

    #[test]
    fn directional_lights_are_capped() {
        let lights = vec![Light::directional(Color::WHITE, 1.0, Vec3::X); 6];
        let uniforms = LightUniforms::from_lights(&lights);
        assert_eq!(uniforms.directional_count as usize, MAX_DIRECTIONAL_LIGHTS);
    }

    #[test]
    fn uniform_block_is_16_byte_aligned() {
        assert_eq!(std::mem::size_of::<LightUniforms>() % 16, 0);
        assert_eq!(std::mem::size_of::<LightUniforms>(), 48 + 32 * 4 + 16);
    }
}
