use geo_types::{Geometry, LineString};
use serde::{Deserialize, Serialize};

use crate::error::{MapError, Result};
use crate::framing::{ViewFrame, ZoomIntent};
use crate::projection::geometry_kind;
use crate::types::{FeatureCollection, MapFeature, Palette, ViewBox};
use crate::utils::{escape_xml, format_number};

/// 最终样式（要素自带的值优先，否则用默认配色）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Style {
    pub fill: String,
    pub stroke: String,
    pub stroke_width: f64,
    pub class: Option<String>,
}

impl Style {
    fn resolve(feature: &MapFeature, palette: &Palette) -> Self {
        let props = &feature.properties;
        Self {
            fill: props.fill.clone().unwrap_or_else(|| palette.country_fill.clone()),
            stroke: props
                .stroke
                .clone()
                .unwrap_or_else(|| palette.country_stroke.clone()),
            stroke_width: props.stroke_width.unwrap_or(palette.country_stroke_width),
            class: props.class.clone(),
        }
    }

    fn attributes(&self) -> String {
        let mut attrs = format!(
            r#"fill="{}" stroke="{}" stroke-width="{}""#,
            escape_xml(&self.fill),
            escape_xml(&self.stroke),
            format_number(self.stroke_width)
        );
        if let Some(class) = &self.class {
            attrs.push_str(&format!(r#" class="{}""#, escape_xml(class)));
        }
        attrs
    }
}

/// 图元形状（输出图像坐标）
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum Shape {
    Path {
        rings: Vec<Vec<(f64, f64)>>,
        closed: bool,
    },
    Circle {
        cx: f64,
        cy: f64,
        r: f64,
    },
}

/// 一个要素对应一个图元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Primitive {
    pub id: Option<String>,
    pub shape: Shape,
    pub style: Style,
    pub title: String,
}

impl Primitive {
    /// SVG path 的 d 属性
    pub fn path_data(&self) -> Option<String> {
        let Shape::Path { rings, closed } = &self.shape else {
            return None;
        };

        let mut d = String::new();
        for ring in rings.iter().filter(|r| !r.is_empty()) {
            for (i, (x, y)) in ring.iter().enumerate() {
                d.push(if i == 0 { 'M' } else { 'L' });
                d.push_str(&format_number(*x));
                d.push(' ');
                d.push_str(&format_number(*y));
            }
            if *closed {
                d.push('Z');
            }
        }
        Some(d)
    }

    pub fn to_svg(&self) -> String {
        let title = format!("<title>{}</title>", escape_xml(&self.title));
        match &self.shape {
            Shape::Path { closed, .. } => {
                let fill_rule = if *closed { r#" fill-rule="evenodd""# } else { "" };
                format!(
                    r#"<path d="{}" {}{}>{}</path>"#,
                    self.path_data().unwrap_or_default(),
                    self.style.attributes(),
                    fill_rule,
                    title
                )
            }
            Shape::Circle { cx, cy, r } => format!(
                r#"<circle cx="{}" cy="{}" r="{}" {}>{}</circle>"#,
                format_number(*cx),
                format_number(*cy),
                format_number(*r),
                self.style.attributes(),
                title
            ),
        }
    }
}

/// 把要素集合转换为图元（保持要素顺序，后面的覆盖前面的）
pub fn emit_primitives(
    collection: &FeatureCollection,
    frame: &ViewFrame,
    width: f64,
    height: f64,
    intent: ZoomIntent,
    palette: &Palette,
) -> Result<Vec<Primitive>> {
    let to_image = |coord: (f64, f64)| frame.to_image(coord, width, height);
    let ring = |line: &LineString<f64>| -> Vec<(f64, f64)> {
        line.coords().map(|c| to_image((c.x, c.y))).collect()
    };

    collection
        .features
        .iter()
        .map(|feature| {
            let shape = match &feature.geometry {
                Geometry::Point(point) => {
                    let (cx, cy) = to_image((point.x(), point.y()));
                    Shape::Circle {
                        cx,
                        cy,
                        r: intent.point_radius(),
                    }
                }
                Geometry::LineString(line) => Shape::Path {
                    rings: vec![ring(line)],
                    closed: false,
                },
                Geometry::Polygon(polygon) => Shape::Path {
                    rings: std::iter::once(polygon.exterior())
                        .chain(polygon.interiors())
                        .map(ring)
                        .collect(),
                    closed: true,
                },
                Geometry::MultiPolygon(multi) => Shape::Path {
                    rings: multi
                        .iter()
                        .flat_map(|p| std::iter::once(p.exterior()).chain(p.interiors()))
                        .map(ring)
                        .collect(),
                    closed: true,
                },
                other => {
                    return Err(MapError::UnsupportedGeometry {
                        kind: geometry_kind(other),
                    });
                }
            };

            Ok(Primitive {
                id: feature.id.clone(),
                shape,
                style: Style::resolve(feature, palette),
                title: feature.title().to_string(),
            })
        })
        .collect()
}

/// 把要素集合转换为 SVG 图元字符串
pub fn emit(
    collection: &FeatureCollection,
    frame: &ViewFrame,
    width: f64,
    height: f64,
    intent: ZoomIntent,
    palette: &Palette,
) -> Result<Vec<String>> {
    Ok(emit_primitives(collection, frame, width, height, intent, palette)?
        .iter()
        .map(Primitive::to_svg)
        .collect())
}

/// 矢量图输出：可见窗口 + 有序图元
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SvgDocument {
    pub width: f64,
    pub height: f64,
    pub view_box: [f64; 4],
    pub elements: Vec<String>,
}

impl SvgDocument {
    pub fn new(width: f64, height: f64, view_box: ViewBox, elements: Vec<String>) -> Self {
        Self {
            width,
            height,
            view_box: view_box.to_array(),
            elements,
        }
    }

    pub fn view_box_attribute(&self) -> String {
        self.view_box
            .iter()
            .map(|v| format_number(*v))
            .collect::<Vec<_>>()
            .join(" ")
    }

    pub fn to_svg_string(&self) -> String {
        format!(
            r#"<svg xmlns="http://www.w3.org/2000/svg" width="{}" height="{}" viewBox="{}">{}</svg>"#,
            format_number(self.width),
            format_number(self.height),
            self.view_box_attribute(),
            self.elements.concat()
        )
    }
}
