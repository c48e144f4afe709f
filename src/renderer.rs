use tiny_skia::{FillRule, Paint, Path, PathBuilder, Pixmap, Stroke, Transform};

use crate::emitter::{Primitive, Shape};
use crate::error::{MapError, Result};
use crate::types::ViewBox;
use crate::utils::parse_hex_color;

/// 位图快照渲染器（把当前可见窗口画到 PNG）
pub struct MapRenderer {
    pixmap: Pixmap,
    transform: Transform,
}

impl MapRenderer {
    /// 创建渲染器，`view_box` 会被拉伸到整张位图
    pub fn new(width: u32, height: u32, view_box: ViewBox) -> Result<Self> {
        let pixmap = Pixmap::new(width, height)
            .ok_or_else(|| MapError::Raster(format!("invalid pixmap size {}x{}", width, height)))?;

        let sx = (width as f64 / view_box.width) as f32;
        let sy = (height as f64 / view_box.height) as f32;
        let transform = Transform::from_row(
            sx,
            0.0,
            0.0,
            sy,
            -(view_box.x as f32) * sx,
            -(view_box.y as f32) * sy,
        );

        Ok(Self { pixmap, transform })
    }

    /// 绘制背景
    pub fn draw_background(&mut self, color_hex: &str) {
        if let Some(color) = parse_hex_color(color_hex) {
            self.pixmap.fill(color);
        }
    }

    /// 按顺序绘制图元（后面的覆盖前面的）
    pub fn draw_primitives(&mut self, primitives: &[Primitive]) {
        for primitive in primitives {
            let Some(path) = build_path(&primitive.shape) else {
                continue;
            };

            let closed = !matches!(primitive.shape, Shape::Path { closed: false, .. });
            let fill = closed
                .then(|| parse_hex_color(&primitive.style.fill))
                .flatten();
            if let Some(color) = fill {
                let mut paint = Paint::default();
                paint.set_color(color);
                paint.anti_alias = true;
                self.pixmap
                    .fill_path(&path, &paint, FillRule::EvenOdd, self.transform, None);
            }

            let stroke_width = primitive.style.stroke_width as f32;
            let stroke_color = (stroke_width > 0.0)
                .then(|| parse_hex_color(&primitive.style.stroke))
                .flatten();
            if let Some(color) = stroke_color {
                let mut paint = Paint::default();
                paint.set_color(color);
                paint.anti_alias = true;
                let stroke = Stroke {
                    width: stroke_width,
                    ..Default::default()
                };
                self.pixmap
                    .stroke_path(&path, &paint, &stroke, self.transform, None);
            }
        }
    }

    /// 导出为 PNG
    pub fn encode_png(self) -> Result<Vec<u8>> {
        self.pixmap
            .encode_png()
            .map_err(|e| MapError::Raster(e.to_string()))
    }

    #[cfg(test)]
    fn pixel(&self, x: u32, y: u32) -> Option<tiny_skia::PremultipliedColorU8> {
        self.pixmap.pixel(x, y)
    }
}

fn build_path(shape: &Shape) -> Option<Path> {
    match shape {
        Shape::Circle { cx, cy, r } => PathBuilder::from_circle(*cx as f32, *cy as f32, *r as f32),
        Shape::Path { rings, closed } => {
            let mut pb = PathBuilder::new();
            for ring in rings.iter().filter(|r| r.len() >= 2) {
                let (x, y) = ring[0];
                pb.move_to(x as f32, y as f32);
                for &(x, y) in &ring[1..] {
                    pb.line_to(x as f32, y as f32);
                }
                if *closed {
                    pb.close();
                }
            }
            pb.finish()
        }
    }
}
