//! Shape generation for 2D primitives
//!
//! Everything is emitted as triangle lists in screen pixels; the pipeline
//! maps pixels to clip space.

use glam::Vec2;
use std::f32::consts::PI;

use super::iso::{DrawCommand, Frame};
use super::vertex::Vertex;

/// Outline width in pixels
pub const OUTLINE_WIDTH: f32 = 1.5;
/// Segments used for discs
pub const DISC_SEGMENTS: u32 = 20;

/// Generate vertices for a convex polygon as a triangle fan
pub fn polygon(points: &[Vec2], color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 3 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity((points.len() - 2) * 3);
    let first = points[0];
    for pair in points[1..].windows(2) {
        vertices.push(Vertex::new(first.x, first.y, color));
        vertices.push(Vertex::new(pair[0].x, pair[0].y, color));
        vertices.push(Vertex::new(pair[1].x, pair[1].y, color));
    }
    vertices
}

/// Generate vertices for a closed polygon outline, one thin quad per edge
pub fn outline(points: &[Vec2], width: f32, color: [f32; 4]) -> Vec<Vertex> {
    if points.len() < 2 {
        return Vec::new();
    }
    let mut vertices = Vec::with_capacity(points.len() * 6);
    let half = width * 0.5;

    for (i, &a) in points.iter().enumerate() {
        let b = points[(i + 1) % points.len()];
        let dir = (b - a).normalize_or_zero();
        let perp = Vec2::new(-dir.y, dir.x) * half;

        let a1 = a + perp;
        let a2 = a - perp;
        let b1 = b + perp;
        let b2 = b - perp;

        vertices.push(Vertex::new(a1.x, a1.y, color));
        vertices.push(Vertex::new(a2.x, a2.y, color));
        vertices.push(Vertex::new(b1.x, b1.y, color));

        vertices.push(Vertex::new(b1.x, b1.y, color));
        vertices.push(Vertex::new(a2.x, a2.y, color));
        vertices.push(Vertex::new(b2.x, b2.y, color));
    }

    vertices
}

/// Generate vertices for a filled circle
pub fn circle(center: Vec2, radius: f32, color: [f32; 4], segments: u32) -> Vec<Vertex> {
    let mut vertices = Vec::with_capacity((segments * 3) as usize);

    for i in 0..segments {
        let theta1 = (i as f32 / segments as f32) * 2.0 * PI;
        let theta2 = ((i + 1) as f32 / segments as f32) * 2.0 * PI;

        // Triangle from center to edge
        vertices.push(Vertex::new(center.x, center.y, color));
        vertices.push(Vertex::new(
            center.x + radius * theta1.cos(),
            center.y + radius * theta1.sin(),
            color,
        ));
        vertices.push(Vertex::new(
            center.x + radius * theta2.cos(),
            center.y + radius * theta2.sin(),
            color,
        ));
    }

    vertices
}

/// Tessellate a display list. Returns the clear color and the vertices in
/// paint order.
pub fn frame_vertices(frame: &Frame) -> ([f32; 4], Vec<Vertex>) {
    let mut clear = [0.0, 0.0, 0.0, 1.0];
    let mut vertices = Vec::new();

    for command in &frame.commands {
        match command {
            DrawCommand::Clear { color } => {
                clear = *color;
                vertices.clear();
            }
            DrawCommand::Polygon {
                points,
                fill,
                outline: stroke,
            } => {
                vertices.extend(polygon(points, *fill));
                if let Some(stroke) = stroke {
                    vertices.extend(outline(points, OUTLINE_WIDTH, *stroke));
                }
            }
            DrawCommand::Disc {
                center,
                radius,
                color,
            } => {
                vertices.extend(circle(*center, *radius, *color, DISC_SEGMENTS));
            }
        }
    }

    (clear, vertices)
}
