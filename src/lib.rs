pub mod bounds;
pub mod cities;
pub mod dataset;
pub mod emitter;
pub mod engine;
pub mod error;
pub mod feature_index;
pub mod framing;
pub mod projection;
pub mod renderer;
pub mod types;
pub mod utils;
pub mod viewport;

use dataset::Tier;
use engine::MapEngine;
use error::MapError;
use types::MapOptions;
use viewport::{InputEvent, TouchPoint};
use wasm_bindgen::prelude::*;

/// 初始化 panic hook 和日志
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
    #[cfg(target_arch = "wasm32")]
    utils::init_logging();
}

/// JS 侧使用的地图对象
#[wasm_bindgen]
pub struct WorldMap {
    engine: MapEngine,
}

#[wasm_bindgen]
impl WorldMap {
    /// 从 JS 对象创建（`undefined` / `null` 使用默认配置）
    #[wasm_bindgen(constructor)]
    pub fn new(options: JsValue) -> Result<WorldMap, JsValue> {
        let options = if options.is_undefined() || options.is_null() {
            MapOptions::default()
        } else {
            serde_wasm_bindgen::from_value(options)
                .map_err(|e| MapError::InvalidOptions(e.to_string()))?
        };
        Ok(Self::with_options(options)?)
    }

    /// 从 JSON 字符串创建
    pub fn from_json(options_json: &str) -> Result<WorldMap, JsValue> {
        Ok(Self::with_options(MapOptions::from_json(options_json)?)?)
    }

    pub fn set_country(&mut self, country: Option<String>) -> Result<(), JsValue> {
        Ok(self.engine.set_country(country.as_deref())?)
    }

    pub fn set_tier(&mut self, tier: &str) -> Result<(), JsValue> {
        let tier: Tier = tier.parse()?;
        Ok(self.engine.set_tier(tier)?)
    }

    /// 实际生效的国家代码（当前精度下不存在时为 `undefined`）
    #[wasm_bindgen(getter)]
    pub fn country(&self) -> Option<String> {
        self.engine.effective_country().map(str::to_string)
    }

    #[wasm_bindgen(getter)]
    pub fn tier(&self) -> String {
        self.engine.tier().to_string()
    }

    /// `country` / `bloc` / `world`
    #[wasm_bindgen(getter)]
    pub fn intent(&self) -> String {
        match self.engine.intent() {
            framing::ZoomIntent::Country => "country",
            framing::ZoomIntent::Bloc => "bloc",
            framing::ZoomIntent::World => "world",
        }
        .to_string()
    }

    /// SVG 图元字符串数组
    pub fn render_svg_paths(&self) -> js_sys::Array {
        self.engine
            .svg_elements()
            .into_iter()
            .map(|element| JsValue::from_str(&element))
            .collect()
    }

    /// 完整的 `<svg>` 字符串
    pub fn render_svg(&self) -> String {
        self.engine.document().to_svg_string()
    }

    /// `{ width, height, view_box, elements }`
    pub fn render(&self) -> Result<JsValue, JsValue> {
        serde_wasm_bindgen::to_value(&self.engine.document())
            .map_err(|e| MapError::Serialization(e.to_string()).into())
    }

    /// MessagePack 编码的文档（用于 Worker 间传输）
    pub fn render_msgpack(&self) -> Result<Vec<u8>, JsValue> {
        let bytes = rmp_serde::to_vec_named(&self.engine.document()).map_err(MapError::from)?;
        Ok(bytes)
    }

    /// `[x, y, width, height]`
    pub fn view_box(&self) -> Vec<f64> {
        self.engine.view_box().to_array().to_vec()
    }

    pub fn set_element_size(&mut self, width: f64, height: f64) {
        self.engine.set_element_size(width, height);
    }

    pub fn on_pointer_down(&mut self, x: f64, y: f64) -> bool {
        self.engine.handle(&InputEvent::PointerDown { x, y })
    }

    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> bool {
        self.engine.handle(&InputEvent::PointerMove { x, y })
    }

    pub fn on_pointer_up(&mut self) -> bool {
        self.engine.handle(&InputEvent::PointerUp)
    }

    pub fn on_pointer_leave(&mut self) -> bool {
        self.engine.handle(&InputEvent::PointerLeave)
    }

    /// 触点坐标扁平排列：`[x1, y1, x2, y2, ...]`
    pub fn on_touch_start(&mut self, touches: &[f64]) -> bool {
        self.engine.handle(&InputEvent::TouchStart(touch_points(touches)))
    }

    pub fn on_touch_move(&mut self, touches: &[f64]) -> bool {
        self.engine.handle(&InputEvent::TouchMove(touch_points(touches)))
    }

    /// `touches` 为抬起后剩余的触点
    pub fn on_touch_end(&mut self, touches: &[f64]) -> bool {
        self.engine.handle(&InputEvent::TouchEnd(touch_points(touches)))
    }

    pub fn on_wheel(&mut self, x: f64, y: f64, delta_y: f64) -> bool {
        self.engine.handle(&InputEvent::Wheel { x, y, delta_y })
    }

    /// 当前可见窗口的 PNG
    pub fn snapshot_png(&self, width: u32, height: u32) -> Result<Vec<u8>, JsValue> {
        Ok(self.engine.snapshot_png(width, height)?)
    }
}

impl WorldMap {
    pub fn with_options(options: MapOptions) -> error::Result<Self> {
        Ok(Self {
            engine: MapEngine::new(options)?,
        })
    }

    pub fn engine(&self) -> &MapEngine {
        &self.engine
    }
}

/// 获取版本信息
#[wasm_bindgen]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

fn touch_points(flat: &[f64]) -> Vec<TouchPoint> {
    flat.chunks_exact(2)
        .map(|pair| TouchPoint::new(pair[0], pair[1]))
        .collect()
}
