use crate::dataset::{DatasetCatalog, DatasetResolver, Resolution, Tier};
use crate::emitter::{Primitive, SvgDocument, emit_primitives};
use crate::error::Result;
use crate::framing::{ViewFrame, ZoomIntent, frame};
use crate::renderer::MapRenderer;
use crate::types::{MapOptions, ViewBox};
use crate::utils::{time, time_end};
use crate::viewport::{InputEvent, ViewportController};

/// 一次选择/精度变化后计算出的完整场景
#[derive(Debug, Clone)]
pub struct Scene {
    pub resolution: Resolution,
    pub intent: ZoomIntent,
    pub frame: ViewFrame,
    pub primitives: Vec<Primitive>,
}

/// 地图引擎：数据层（选择、精度）+ 交互层（可见窗口）
pub struct MapEngine {
    options: MapOptions,
    resolver: DatasetResolver,
    scene: Scene,
    viewport: ViewportController,
}

impl MapEngine {
    /// 使用内置数据
    pub fn new(options: MapOptions) -> Result<Self> {
        Self::with_catalog(options, DatasetCatalog::bundled())
    }

    pub fn with_catalog(options: MapOptions, catalog: DatasetCatalog) -> Result<Self> {
        options.validate()?;

        let mut resolver = DatasetResolver::new(catalog, options.palette.clone());
        let scene = build_scene(&mut resolver, &options)?;
        let viewport = ViewportController::new(
            initial_view_box(&options),
            options.element_size(),
            options.wheel_step,
        );

        Ok(Self {
            options,
            resolver,
            scene,
            viewport,
        })
    }

    pub fn options(&self) -> &MapOptions {
        &self.options
    }

    pub fn scene(&self) -> &Scene {
        &self.scene
    }

    pub fn tier(&self) -> Tier {
        self.options.tier
    }

    /// 请求的国家代码（原样保存）
    pub fn requested_country(&self) -> Option<&str> {
        self.options.country.as_deref()
    }

    /// 当前数据中实际存在的国家代码
    pub fn effective_country(&self) -> Option<&str> {
        self.scene.resolution.selection.as_deref()
    }

    pub fn intent(&self) -> ZoomIntent {
        self.scene.intent
    }

    pub fn frame(&self) -> ViewFrame {
        self.scene.frame
    }

    pub fn view_box(&self) -> ViewBox {
        self.viewport.view_box()
    }

    pub fn viewport(&self) -> &ViewportController {
        &self.viewport
    }

    /// 修改选中的国家（`None` 表示不选）
    pub fn set_country(&mut self, country: Option<&str>) -> Result<()> {
        let mut options = self.options.clone();
        options.country = country.map(str::to_string);
        self.apply(options)
    }

    /// 修改数据精度
    pub fn set_tier(&mut self, tier: Tier) -> Result<()> {
        let mut options = self.options.clone();
        options.tier = tier;
        self.apply(options)
    }

    /// 同时修改国家和精度，只重新计算一次
    pub fn select(&mut self, country: Option<&str>, tier: Tier) -> Result<()> {
        let mut options = self.options.clone();
        options.country = country.map(str::to_string);
        options.tier = tier;
        self.apply(options)
    }

    pub fn set_element_size(&mut self, width: f64, height: f64) {
        self.viewport.set_element_size(width, height);
    }

    /// 交互事件只修改可见窗口
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        self.viewport.handle(event)
    }

    /// 重新计算失败时保持原来的场景不变
    fn apply(&mut self, options: MapOptions) -> Result<()> {
        let scene = build_scene(&mut self.resolver, &options)?;
        self.scene = scene;
        self.options = options;
        self.viewport.reset(initial_view_box(&self.options));
        Ok(())
    }

    pub fn svg_elements(&self) -> Vec<String> {
        self.scene.primitives.iter().map(Primitive::to_svg).collect()
    }

    pub fn document(&self) -> SvgDocument {
        SvgDocument::new(
            self.options.width,
            self.options.height,
            self.view_box(),
            self.svg_elements(),
        )
    }

    /// 当前可见窗口的 PNG 快照
    pub fn snapshot_png(&self, width: u32, height: u32) -> Result<Vec<u8>> {
        time("engine: snapshot");
        let mut renderer = MapRenderer::new(width, height, self.view_box())?;
        renderer.draw_background(&self.options.palette.background);
        renderer.draw_primitives(&self.scene.primitives);
        let png = renderer.encode_png();
        time_end("engine: snapshot");
        png
    }
}

/// 输出图像坐标系中，ViewFrame 正好对应整个画布
fn initial_view_box(options: &MapOptions) -> ViewBox {
    ViewBox::new(0.0, 0.0, options.width, options.height)
}

fn build_scene(resolver: &mut DatasetResolver, options: &MapOptions) -> Result<Scene> {
    time("engine: build_scene");

    let resolution = resolver.resolve(options.tier, options.country.as_deref())?;
    let intent = ZoomIntent::decide(
        options.country.as_deref(),
        resolution.selection.as_deref(),
        options.zoom_country,
    );

    let raw = intent.raw_bounds(&resolution)?;
    let (pad_lon, pad_lat) = intent.padding();
    let framed = frame(raw, options.width, options.height, pad_lon, pad_lat);

    let primitives = emit_primitives(
        &resolution.collection,
        &framed,
        options.width,
        options.height,
        intent,
        &options.palette,
    )?;

    time_end("engine: build_scene");
    log::debug!(
        "scene rebuilt: tier={} country={:?} intent={:?} primitives={}",
        options.tier,
        resolution.selection,
        intent,
        primitives.len()
    );

    Ok(Scene {
        resolution,
        intent,
        frame: framed,
        primitives,
    })
}
