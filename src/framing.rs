use serde::{Deserialize, Serialize};

use crate::bounds::{bounds_of_features, bounds_of_geometry, bounds_of_region};
use crate::dataset::Resolution;
use crate::error::Result;
use crate::types::BoundingBox;

/// 代表「欧盟」的保留代码（区域缩放）
pub const BLOC_CODE: &str = "eu";

/// 代表「全部」的保留代码（不缩放）
pub const WORLD_CODE: &str = "all";

/// 国家级缩放的留白比例
pub const COUNTRY_PADDING: (f64, f64) = (0.2, 0.2);

/// 区域/全部的留白比例
pub const WIDE_PADDING: (f64, f64) = (0.05, 0.05);

/// 边界框两个方向都退化时使用的最小范围
const MIN_EXTENT: f64 = 1.0;

/// 缩放意图
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ZoomIntent {
    Country,
    Bloc,
    World,
}

impl ZoomIntent {
    /// 每次选择或精度变化时重新计算
    ///
    /// - 关闭缩放或选择 `all` -> World
    /// - 选择 `eu` 或选中的国家不存在 -> Bloc
    /// - 其他 -> Country
    pub fn decide(requested: Option<&str>, effective: Option<&str>, zoom_enabled: bool) -> Self {
        let requested = requested.map(str::trim);

        if !zoom_enabled || requested.is_some_and(|c| c.eq_ignore_ascii_case(WORLD_CODE)) {
            return ZoomIntent::World;
        }

        if requested.is_some_and(|c| c.eq_ignore_ascii_case(BLOC_CODE)) || effective.is_none() {
            return ZoomIntent::Bloc;
        }

        ZoomIntent::Country
    }

    pub fn padding(self) -> (f64, f64) {
        match self {
            ZoomIntent::Country => COUNTRY_PADDING,
            ZoomIntent::Bloc | ZoomIntent::World => WIDE_PADDING,
        }
    }

    /// 城市点半径（输出图像单位）
    pub fn point_radius(self) -> f64 {
        match self {
            ZoomIntent::Country => 0.8,
            ZoomIntent::Bloc | ZoomIntent::World => 0.2,
        }
    }

    /// 未加留白的原始边界框
    pub fn raw_bounds(self, resolution: &Resolution) -> Result<BoundingBox> {
        let country = resolution
            .selection
            .as_deref()
            .and_then(|code| resolution.index.get(&resolution.collection, code));

        match (self, country) {
            (ZoomIntent::Country, Some(feature)) => {
                Ok(bounds_of_geometry(&feature.geometry)?.unwrap_or_else(BoundingBox::empty))
            }
            (ZoomIntent::World, _) => bounds_of_features(&resolution.collection.features),
            _ => Ok(bounds_of_region()),
        }
    }
}

/// 调整比例并加上留白后的渲染窗口
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct ViewFrame {
    pub bounds: BoundingBox,
}

impl ViewFrame {
    pub fn width(&self) -> f64 {
        self.bounds.width()
    }

    pub fn height(&self) -> f64 {
        self.bounds.height()
    }

    pub fn center(&self) -> (f64, f64) {
        self.bounds.center()
    }

    /// 投影坐标 -> 输出图像坐标（y 轴向下）
    pub fn to_image(&self, coord: (f64, f64), width: f64, height: f64) -> (f64, f64) {
        let x = (coord.0 - self.bounds.min_x) * width / self.width();
        let y = height - (coord.1 - self.bounds.min_y) * height / self.height();
        (x, y)
    }
}

/// 把边界框调整为输出宽高比，并在两个方向加上对称留白
pub fn frame(bbox: BoundingBox, width: f64, height: f64, pad_lon: f64, pad_lat: f64) -> ViewFrame {
    let aspect = width / height;
    let (center_x, center_y) = bbox.center();

    let (raw_w, raw_h) = match (bbox.width() > 0.0, bbox.height() > 0.0) {
        (true, true) => (bbox.width(), bbox.height()),
        (true, false) => (bbox.width(), bbox.width() / aspect),
        (false, true) => (bbox.height() * aspect, bbox.height()),
        (false, false) => (MIN_EXTENT * aspect, MIN_EXTENT),
    };

    // 较紧的方向保持不变，另一个方向扩展
    let (fit_w, fit_h) = fit_aspect(raw_w, raw_h, aspect);

    let gap_x = pad_lon * fit_w;
    let gap_y = pad_lat * fit_h;

    // 两个方向留白比例不同时再修正一次
    let (half_w, half_h) = {
        let (w, h) = fit_aspect(fit_w + 2.0 * gap_x, fit_h + 2.0 * gap_y, aspect);
        (w / 2.0, h / 2.0)
    };

    ViewFrame {
        bounds: BoundingBox::new(
            center_x - half_w,
            center_x + half_w,
            center_y - half_h,
            center_y + half_h,
        ),
    }
}

fn fit_aspect(w: f64, h: f64, aspect: f64) -> (f64, f64) {
    if aspect < w / h {
        (w, w / aspect)
    } else {
        (h * aspect, h)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dataset::{DatasetCatalog, DatasetResolver, Tier};
    use crate::projection::project_point;
    use crate::types::Palette;

    fn assert_close(a: f64, b: f64) {
        let tolerance = 1e-9 * a.abs().max(b.abs()).max(1.0);
        assert!((a - b).abs() <= tolerance, "{} != {}", a, b);
    }

    fn germany() -> BoundingBox {
        let (min_x, min_y) = project_point(5.866, 47.270);
        let (max_x, max_y) = project_point(15.042, 55.058);
        BoundingBox::new(min_x, max_x, min_y, max_y)
    }

    #[test]
    fn test_frame_keeps_aspect_and_center() {
        let boxes = [
            germany(),
            BoundingBox::new(0.0, 10.0, 0.0, 1.0),
            BoundingBox::new(-5.0, -4.0, 3.0, 30.0),
            BoundingBox::empty(),
        ];
        let outputs = [(200.0, 110.0), (100.0, 100.0), (90.0, 300.0)];

        for bbox in boxes {
            for (w, h) in outputs {
                for (pad_lon, pad_lat) in [(0.2, 0.2), (0.05, 0.05), (0.3, 0.0)] {
                    let framed = frame(bbox, w, h, pad_lon, pad_lat);
                    assert_close(framed.width() / framed.height(), w / h);
                    let (cx, cy) = framed.center();
                    let (ox, oy) = bbox.center();
                    assert_close(cx, ox);
                    assert_close(cy, oy);
                    assert!(framed.bounds.min_x <= bbox.min_x && framed.bounds.max_y >= bbox.max_y);
                }
            }
        }
    }

    #[test]
    fn test_frame_country_padding() {
        let raw = germany();
        let framed = frame(raw, 200.0, 110.0, 0.2, 0.2);

        // 德国比输出窄，高度方向是约束方向
        assert!(raw.width() / raw.height() < 200.0 / 110.0);
        assert_close(framed.height(), 1.4 * raw.height());
        assert_close(framed.width(), 1.4 * raw.height() * 200.0 / 110.0);
    }

    #[test]
    fn test_frame_wide_box() {
        let raw = BoundingBox::new(0.0, 100.0, 0.0, 10.0);
        let framed = frame(raw, 100.0, 100.0, 0.05, 0.05);
        assert_close(framed.width(), 110.0);
        assert_close(framed.height(), 110.0);
    }

    #[test]
    fn test_frame_degenerate_box() {
        let point = BoundingBox::from_point(3.0, 4.0);
        let framed = frame(point, 200.0, 100.0, 0.2, 0.2);
        assert!(framed.width() > 0.0 && framed.height() > 0.0);
        assert_close(framed.center().0, 3.0);
        assert_close(framed.center().1, 4.0);

        let flat = BoundingBox::new(0.0, 10.0, 5.0, 5.0);
        let framed = frame(flat, 100.0, 50.0, 0.0, 0.0);
        assert_close(framed.width(), 10.0);
        assert_close(framed.height(), 5.0);
    }

    #[test]
    fn test_to_image() {
        let framed = ViewFrame {
            bounds: BoundingBox::new(0.0, 100.0, 0.0, 50.0),
        };
        assert_eq!(framed.to_image((0.0, 0.0), 200.0, 100.0), (0.0, 100.0));
        assert_eq!(framed.to_image((100.0, 50.0), 200.0, 100.0), (200.0, 0.0));
        assert_eq!(framed.to_image((50.0, 25.0), 200.0, 100.0), (100.0, 50.0));
    }

    #[test]
    fn test_decide_intent() {
        assert_eq!(ZoomIntent::decide(Some("de"), Some("DE"), true), ZoomIntent::Country);
        assert_eq!(ZoomIntent::decide(Some("de"), None, true), ZoomIntent::Bloc);
        assert_eq!(ZoomIntent::decide(None, None, true), ZoomIntent::Bloc);
        assert_eq!(ZoomIntent::decide(Some("eu"), None, true), ZoomIntent::Bloc);
        assert_eq!(ZoomIntent::decide(Some("de"), Some("DE"), false), ZoomIntent::World);
    }

    #[test]
    fn test_everything_code_is_always_world() {
        for effective in [None, Some("DE")] {
            for zoom in [true, false] {
                assert_eq!(ZoomIntent::decide(Some("all"), effective, zoom), ZoomIntent::World);
                assert_eq!(ZoomIntent::decide(Some("ALL"), effective, zoom), ZoomIntent::World);
            }
        }
    }

    #[test]
    fn test_intent_constants() {
        assert_eq!(ZoomIntent::Country.padding(), (0.2, 0.2));
        assert_eq!(ZoomIntent::World.padding(), (0.05, 0.05));
        assert!(ZoomIntent::Country.point_radius() > ZoomIntent::Bloc.point_radius());
        assert_eq!(ZoomIntent::Bloc.point_radius(), ZoomIntent::World.point_radius());
    }

    #[test]
    fn test_raw_bounds_per_intent() {
        let mut resolver = DatasetResolver::new(DatasetCatalog::bundled(), Palette::default());
        let resolution = resolver.resolve(Tier::Low, Some("DE")).unwrap();

        let country = ZoomIntent::Country.raw_bounds(&resolution).unwrap();
        let bloc = ZoomIntent::Bloc.raw_bounds(&resolution).unwrap();
        let world = ZoomIntent::World.raw_bounds(&resolution).unwrap();

        assert_eq!(bloc, bounds_of_region());
        assert!(country.width() < world.width());
        let (bx, by) = project_point(13.404954, 52.520008);
        assert!(country.contains(bx, by));
        assert!(world.contains(bx, by));
    }
}
