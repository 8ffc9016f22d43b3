//! Perspective projection and flat lighting
//!
//! The renderer turns world-space geometry into [`Surface`] calls. Points are
//! scaled by `ideal / distance(point, camera)` where `ideal = camera.z² / fov`
//! is fixed whenever the camera or field of view is set. Anything whose
//! representative vertex is level with or behind the camera (`z >= camera.z`)
//! is culled and the draw call returns `false`.
//!
//! Polygons are lit by replacing the HSL lightness of their color with a
//! value derived from the angles between the face normal, the light and the
//! camera. Faces seen from the side opposite the light use a separate branch
//! so the back of a surface stays visibly darker.

use std::f64::consts::FRAC_PI_2;

use crate::color::Color;
use crate::config::RendererConfig;
use crate::surface::{Rect, ScreenPoint, Surface};
use crate::vector::Vector;

/// Projection state and lighting parameters
#[derive(Debug, Clone)]
pub struct Renderer {
    camera: Vector,
    fov: f64,
    ideal: f64,
    /// Screen position of the camera axis
    pub origin: ScreenPoint,
    pub light: Option<Vector>,
    pub lighting: bool,
    shadow_max: f64,
    shadow_contrast: f64,
    shadow_threshold: f64,
    brightness_multiplier: f64,
    brightness: f64,
}

impl Default for Renderer {
    fn default() -> Self {
        let mut renderer = Self {
            camera: Vector::new(0.0, 0.0, 1000.0),
            fov: 1000.0,
            ideal: 0.0,
            origin: ScreenPoint::default(),
            light: Some(Vector::new(0.0, 1000.0, 0.0)),
            lighting: true,
            shadow_max: 0.4,
            shadow_contrast: 0.5,
            shadow_threshold: 0.2,
            brightness_multiplier: 0.5,
            brightness: 0.0,
        };
        renderer.set_fov(1000.0);
        renderer.set_lighting_optimal_range(1000.0);
        renderer
    }
}

impl Renderer {
    pub fn from_config(config: &RendererConfig) -> Self {
        let mut renderer = Self {
            camera: config.camera,
            light: config.light,
            lighting: config.lighting,
            brightness_multiplier: config.lighting_multiplier,
            ..Self::default()
        };
        renderer.set_fov(config.fov);
        renderer.set_shadow_contrast(config.shadow_contrast);
        renderer.set_shadow_max(config.shadow_max);
        renderer.set_lighting_optimal_range(config.lighting_optimal_range);
        renderer
    }

    pub fn camera(&self) -> Vector {
        self.camera
    }

    /// Move the camera and refit the lens to the new distance
    pub fn set_camera(&mut self, camera: Vector) {
        self.camera = camera;
        self.refit();
    }

    /// Move the eye along z keeping the lens, which zooms the view
    pub fn dolly(&mut self, z: f64) {
        self.camera.z = z;
    }

    pub fn fov(&self) -> f64 {
        self.fov
    }

    pub fn set_fov(&mut self, fov: f64) {
        self.fov = fov;
        self.refit();
    }

    /// Projection scale at unit distance
    pub fn ideal(&self) -> f64 {
        self.ideal
    }

    fn refit(&mut self) {
        self.ideal = self.camera.z * self.camera.z / self.fov;
    }

    pub fn shadow_max(&self) -> f64 {
        self.shadow_max
    }

    /// Darkest a face turned away from the light may get, in lightness
    pub fn set_shadow_max(&mut self, max: f64) {
        self.shadow_max = max;
        self.shadow_threshold = max * self.shadow_contrast;
    }

    pub fn shadow_contrast(&self) -> f64 {
        self.shadow_contrast
    }

    pub fn set_shadow_contrast(&mut self, contrast: f64) {
        self.shadow_contrast = contrast;
        self.set_shadow_max(self.shadow_max);
    }

    /// Distance from the light at which a face is lit at full lightness
    pub fn lighting_optimal_range(&self) -> f64 {
        (self.brightness / self.brightness_multiplier).sqrt()
    }

    pub fn set_lighting_optimal_range(&mut self, range: f64) {
        self.brightness = range * range * self.brightness_multiplier;
    }

    pub fn is_visible(&self, point: Vector) -> bool {
        point.z < self.camera.z
    }

    pub fn scale_at(&self, point: Vector) -> f64 {
        self.ideal / point.distance(self.camera)
    }

    pub fn project(&self, point: Vector) -> ScreenPoint {
        let scale = self.scale_at(point);
        ScreenPoint::new(
            ((point.x - self.camera.x) * scale + self.origin.x as f64).round() as i32,
            ((-point.y + self.camera.y) * scale + self.origin.y as f64).round() as i32,
        )
    }

    pub fn project_all(&self, points: &[Vector]) -> Vec<ScreenPoint> {
        points.iter().map(|p| self.project(*p)).collect()
    }

    /// Screen square of side `width` (world units) centered on `center`
    fn screen_square(&self, center: Vector, width: f64) -> Rect {
        let scale = self.scale_at(center);
        let half = width * 0.5;
        Rect::new(
            (center.x - self.camera.x - half) * scale + self.origin.x as f64,
            (-center.y + self.camera.y - half) * scale + self.origin.y as f64,
            width * scale,
            width * scale,
        )
    }

    pub fn draw_polygon<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        vertices: &[Vector],
    ) -> bool {
        match vertices.first() {
            Some(first) if self.is_visible(*first) => {
                surface.draw_polygon(color, &self.project_all(vertices));
                true
            }
            _ => false,
        }
    }

    /// Fill a polygon, lit when lighting is enabled
    pub fn fill_polygon<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        vertices: &[Vector],
    ) -> bool {
        match vertices.first() {
            Some(first) if self.is_visible(*first) => {
                let color = if self.lighting {
                    self.compute_lighting(color, vertices)
                } else {
                    color
                };
                surface.fill_polygon(color, &self.project_all(vertices));
                true
            }
            _ => false,
        }
    }

    pub fn draw_circle<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        center: Vector,
        radius: f64,
    ) -> bool {
        if !self.is_visible(center) {
            return false;
        }
        surface.draw_ellipse(color, self.screen_square(center, radius * 2.0));
        true
    }

    pub fn fill_circle<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        center: Vector,
        radius: f64,
    ) -> bool {
        if !self.is_visible(center) {
            return false;
        }
        surface.fill_ellipse(color, self.screen_square(center, radius * 2.0));
        true
    }

    pub fn draw_square<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        center: Vector,
        width: f64,
    ) -> bool {
        if !self.is_visible(center) {
            return false;
        }
        surface.draw_rectangle(color, self.screen_square(center, width));
        true
    }

    pub fn fill_square<S: Surface + ?Sized>(
        &self,
        surface: &mut S,
        color: Color,
        center: Vector,
        width: f64,
    ) -> bool {
        if !self.is_visible(center) {
            return false;
        }
        surface.fill_rectangle(color, self.screen_square(center, width));
        true
    }

    /// A single pixel at the projected location
    pub fn draw_point<S: Surface + ?Sized>(&self, surface: &mut S, color: Color, point: Vector) -> bool {
        if !self.is_visible(point) {
            return false;
        }
        let p = self.project(point);
        surface.fill_rectangle(color, Rect::new(p.x as f64, p.y as f64, 1.0, 1.0));
        true
    }

    /// Lit color of a face with the given vertices.
    ///
    /// Returns `color` unchanged when there is no light or the face has no
    /// defined normal (fewer than three vertices, or collinear ones).
    pub fn compute_lighting(&self, color: Color, vertices: &[Vector]) -> Color {
        let Some(light) = self.light else {
            return color;
        };
        if vertices.len() < 3 {
            return color;
        }

        let centroid = Vector::average(vertices);
        let to_light = light.to(centroid);
        let to_camera = self.camera.to(centroid);
        let normal = (vertices[1] - vertices[0]).cross(vertices[2] - vertices[0]);

        let distance = to_light.magnitude();
        if normal.magnitude() == 0.0 || distance == 0.0 {
            return color;
        }

        let light_angle = angle_between(to_light, normal);
        let camera_angle = angle_between(to_camera, normal);
        let k = self.brightness * 0.001 / distance;

        let opposite_sides = (light_angle < FRAC_PI_2 && camera_angle > FRAC_PI_2)
            || (light_angle > FRAC_PI_2 && camera_angle < FRAC_PI_2);

        let lightness = if opposite_sides {
            k * (light_angle.sin().abs() * self.shadow_max + 1.0
                - self.shadow_max
                - self.shadow_threshold)
        } else {
            k * (light_angle.cos().abs() * self.shadow_threshold + 1.0 - self.shadow_threshold)
        };

        let mut hsl = color.to_hsl();
        hsl.l = lightness.clamp(0.0, 1.0);
        Color::from_hsl(hsl, color.a())
    }
}

/// Angle with the cosine clamped so rounding on (anti)parallel vectors
/// cannot produce NaN
fn angle_between(a: Vector, b: Vector) -> f64 {
    let magnitude = a.magnitude() * b.magnitude();
    if magnitude == 0.0 {
        return FRAC_PI_2;
    }
    (a.dot(b) / magnitude).clamp(-1.0, 1.0).acos()
}
