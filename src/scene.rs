//! The scene graph the demo draws: a camera, a flat list of objects and
//! the lights that shade them.

use crate::camera::Camera;
use crate::color::Color;
use crate::lighting::Light;
use crate::mesh::Transform;

/// Index of a mesh uploaded to the render application.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct MeshId(pub usize);

/// What the mesh pass needs to draw one object.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct DrawItem {
    pub mesh: MeshId,
    pub transform: Transform,
    pub color: Color,
}

/// An object living in the scene.
///
/// `update` runs once per frame before drawing; `dt` is the frame time in
/// seconds and never negative.
pub trait SceneObject {
    fn update(&mut self, dt: f32);
    fn draw_item(&self) -> DrawItem;
}

#[derive(Default)]
pub struct Scene {
    pub camera: Camera,
    objects: Vec<Box<dyn SceneObject>>,
    lights: Vec<Light>,
}

impl Scene {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, object: impl SceneObject + 'static) {
        self.objects.push(Box::new(object));
    }

    pub fn add_light(&mut self, light: Light) {
        self.lights.push(light);
    }

    pub fn objects(&self) -> usize {
        self.objects.len()
    }

    pub fn lights(&self) -> &[Light] {
        &self.lights
    }

    pub fn update(&mut self, dt: f32) {
        let dt = dt.max(0.0);
        for object in &mut self.objects {
            object.update(dt);
        }
    }

    pub fn draw_items(&self) -> Vec<DrawItem> {
        self.objects.iter().map(|o| o.draw_item()).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Counter {
        elapsed: f32,
    }

    impl SceneObject for Counter {
        fn update(&mut self, dt: f32) {
            self.elapsed += dt;
        }

        fn draw_item(&self) -> DrawItem {
            DrawItem {
                mesh: MeshId(0),
                transform: Transform::new().uniform_scale(self.elapsed),
                color: Color::WHITE,
            }
        }
    }

    #[test]
    fn update_clamps_negative_dt() {
        let mut scene = Scene::new();
        scene.add(Counter { elapsed: 1.0 });

        scene.update(-0.5);
        scene.update(0.25);

        let items = scene.draw_items();
        assert_eq!(items.len(), 1);
        assert_eq!(items[0].transform.scale.x, 1.25);
    }
}
