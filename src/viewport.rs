//! 交互式平移/缩放状态机。
//!
//! 只修改可见窗口（ViewBox），不会重新投影、计算边界框或生成图元。
//! 坐标以元素左上角为原点，单位是屏幕像素。

use serde::{Deserialize, Serialize};

use crate::types::ViewBox;

/// 屏幕上的触点
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TouchPoint {
    pub x: f64,
    pub y: f64,
}

impl TouchPoint {
    pub fn new(x: f64, y: f64) -> Self {
        Self { x, y }
    }

    fn distance(&self, other: &TouchPoint) -> f64 {
        (self.x - other.x).hypot(self.y - other.y)
    }

    fn midpoint(&self, other: &TouchPoint) -> TouchPoint {
        TouchPoint::new((self.x + other.x) / 2.0, (self.y + other.y) / 2.0)
    }
}

/// 输入事件
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum InputEvent {
    PointerDown { x: f64, y: f64 },
    PointerMove { x: f64, y: f64 },
    PointerUp,
    PointerLeave,
    /// 当前所有触点
    TouchStart(Vec<TouchPoint>),
    TouchMove(Vec<TouchPoint>),
    /// 抬起后剩余的触点
    TouchEnd(Vec<TouchPoint>),
    /// `delta_y < 0` 放大，`delta_y > 0` 缩小
    Wheel { x: f64, y: f64, delta_y: f64 },
}

/// 手势状态
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum GestureState {
    Idle,
    Panning {
        last: TouchPoint,
    },
    /// 缩放总是相对于双指按下时的窗口，避免误差累积
    Pinching {
        start_distance: f64,
        start_view: ViewBox,
    },
}

/// 相对重置窗口最多放大的倍数
pub const MAX_ZOOM_IN: f64 = 1000.0;

/// 相对重置窗口最多缩小的倍数
pub const MAX_ZOOM_OUT: f64 = 10.0;

/// 可见窗口控制器
#[derive(Debug, Clone)]
pub struct ViewportController {
    view_box: ViewBox,
    /// 最近一次重置时的窗口，缩放范围以它为基准
    home: ViewBox,
    element_width: f64,
    element_height: f64,
    wheel_step: f64,
    state: GestureState,
}

impl ViewportController {
    pub fn new(view_box: ViewBox, element_size: (f64, f64), wheel_step: f64) -> Self {
        Self {
            view_box,
            home: view_box,
            element_width: element_size.0,
            element_height: element_size.1,
            wheel_step,
            state: GestureState::Idle,
        }
    }

    pub fn view_box(&self) -> ViewBox {
        self.view_box
    }

    pub fn state(&self) -> GestureState {
        self.state
    }

    /// 元素在页面上的像素尺寸（用于把屏幕位移换算成窗口位移）
    pub fn set_element_size(&mut self, width: f64, height: f64) {
        if width > 0.0 && height > 0.0 {
            self.element_width = width;
            self.element_height = height;
        }
    }

    /// 数据层变化后重置窗口，丢弃正在进行的手势
    pub fn reset(&mut self, view_box: ViewBox) {
        self.view_box = view_box;
        self.home = view_box;
        self.state = GestureState::Idle;
    }

    /// 处理一个输入事件，返回窗口是否变化
    pub fn handle(&mut self, event: &InputEvent) -> bool {
        let before = self.view_box;

        match (event, self.state) {
            (InputEvent::PointerDown { x, y }, GestureState::Idle) => {
                self.state = GestureState::Panning {
                    last: TouchPoint::new(*x, *y),
                };
            }
            (InputEvent::PointerMove { x, y }, GestureState::Panning { last }) => {
                self.drag_to(last, TouchPoint::new(*x, *y));
            }
            (InputEvent::PointerUp | InputEvent::PointerLeave, GestureState::Panning { .. }) => {
                self.state = GestureState::Idle;
            }
            (InputEvent::TouchStart(touches), GestureState::Idle | GestureState::Panning { .. })
                if touches.len() >= 2 =>
            {
                self.start_pinch(&touches[0], &touches[1]);
            }
            (InputEvent::TouchStart(touches), GestureState::Idle) if touches.len() == 1 => {
                self.state = GestureState::Panning { last: touches[0] };
            }
            (InputEvent::TouchMove(touches), GestureState::Panning { last })
                if touches.len() == 1 =>
            {
                self.drag_to(last, touches[0]);
            }
            (
                InputEvent::TouchMove(touches),
                GestureState::Pinching {
                    start_distance,
                    start_view,
                },
            ) if touches.len() >= 2 => {
                let distance = touches[0].distance(&touches[1]);
                let mid = touches[0].midpoint(&touches[1]);
                let factor = distance / start_distance;
                self.view_box = self.scale_around(start_view, self.fraction(mid), factor);
            }
            (InputEvent::TouchEnd(remaining), GestureState::Pinching { .. })
                if remaining.len() < 2 =>
            {
                self.state = GestureState::Idle;
            }
            (InputEvent::TouchEnd(remaining), GestureState::Panning { .. })
                if remaining.is_empty() =>
            {
                self.state = GestureState::Idle;
            }
            (InputEvent::Wheel { x, y, delta_y }, _) => {
                if *delta_y < 0.0 {
                    self.zoom_at(*x, *y, self.wheel_step);
                } else if *delta_y > 0.0 {
                    self.zoom_at(*x, *y, 1.0 / self.wheel_step);
                }
            }
            // 不属于当前手势的事件直接忽略
            _ => {}
        }

        self.view_box != before
    }

    /// 按屏幕像素平移
    pub fn pan_by(&mut self, dx: f64, dy: f64) {
        self.view_box.x -= dx * self.view_box.width / self.element_width;
        self.view_box.y -= dy * self.view_box.height / self.element_height;
    }

    /// 以屏幕上的点为中心缩放（factor > 1 放大），该点在屏幕上保持不动
    pub fn zoom_at(&mut self, x: f64, y: f64, factor: f64) {
        let fraction = self.fraction(TouchPoint::new(x, y));
        self.view_box = self.scale_around(self.view_box, fraction, factor);
    }

    fn drag_to(&mut self, last: TouchPoint, current: TouchPoint) {
        self.pan_by(current.x - last.x, current.y - last.y);
        self.state = GestureState::Panning { last: current };
    }

    fn start_pinch(&mut self, a: &TouchPoint, b: &TouchPoint) {
        let start_distance = a.distance(b);
        if start_distance > 0.0 {
            self.state = GestureState::Pinching {
                start_distance,
                start_view: self.view_box,
            };
        }
    }

    /// 屏幕点在元素内的相对位置
    fn fraction(&self, point: TouchPoint) -> (f64, f64) {
        (point.x / self.element_width, point.y / self.element_height)
    }

    /// 以相对位置为锚点缩放
    ///
    /// 宽高保持在重置窗口的 1/MAX_ZOOM_IN 到 MAX_ZOOM_OUT 倍之间
    fn scale_around(&self, view: ViewBox, (fx, fy): (f64, f64), factor: f64) -> ViewBox {
        if !(factor.is_finite() && factor > 0.0) {
            return view;
        }

        let min_width = self.home.width / MAX_ZOOM_IN;
        let max_width = self.home.width * MAX_ZOOM_OUT;
        let factor = factor.clamp(view.width / max_width, view.width / min_width);

        let anchor_x = view.x + fx * view.width;
        let anchor_y = view.y + fy * view.height;
        let width = view.width / factor;
        let height = view.height / factor;

        ViewBox::new(anchor_x - fx * width, anchor_y - fy * height, width, height)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn controller() -> ViewportController {
        ViewportController::new(ViewBox::new(0.0, 0.0, 200.0, 110.0), (400.0, 220.0), 1.1)
    }

    fn assert_view_close(a: ViewBox, b: ViewBox) {
        for (x, y) in a.to_array().iter().zip(b.to_array()) {
            assert!((x - y).abs() < 1e-9, "{:?} != {:?}", a, b);
        }
    }

    fn touch(x: f64, y: f64) -> TouchPoint {
        TouchPoint::new(x, y)
    }

    #[test]
    fn test_pan_scales_by_element_size() {
        let mut c = controller();
        c.handle(&InputEvent::PointerDown { x: 100.0, y: 100.0 });
        assert!(c.handle(&InputEvent::PointerMove { x: 140.0, y: 80.0 }));

        // 元素是 2 倍大小，40 像素对应 20 个单位
        assert_view_close(c.view_box(), ViewBox::new(-20.0, 10.0, 200.0, 110.0));
    }

    #[test]
    fn test_pan_round_trip() {
        let mut c = controller();
        c.zoom_at(120.0, 30.0, 3.7);
        let original = c.view_box();

        c.handle(&InputEvent::PointerDown { x: 10.0, y: 10.0 });
        c.handle(&InputEvent::PointerMove { x: 47.0, y: -13.0 });
        c.handle(&InputEvent::PointerMove { x: 10.0, y: 10.0 });
        c.handle(&InputEvent::PointerUp);

        assert_view_close(c.view_box(), original);
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_zoom_round_trip() {
        let mut c = controller();
        let original = c.view_box();
        c.zoom_at(123.0, 45.0, 2.5);
        assert!(c.view_box().width < original.width);
        c.zoom_at(123.0, 45.0, 1.0 / 2.5);
        assert_view_close(c.view_box(), original);
    }

    #[test]
    fn test_wheel_keeps_cursor_point_fixed() {
        let mut c = controller();
        let (cx, cy) = (300.0, 50.0);
        let under_cursor = |v: ViewBox| (v.x + cx / 400.0 * v.width, v.y + cy / 220.0 * v.height);

        let before = under_cursor(c.view_box());
        assert!(c.handle(&InputEvent::Wheel { x: cx, y: cy, delta_y: -100.0 }));
        let after = under_cursor(c.view_box());

        assert!((c.view_box().width - 200.0 / 1.1).abs() < 1e-9);
        assert!((before.0 - after.0).abs() < 1e-9 && (before.1 - after.1).abs() < 1e-9);

        c.handle(&InputEvent::Wheel { x: cx, y: cy, delta_y: 100.0 });
        assert_view_close(c.view_box(), ViewBox::new(0.0, 0.0, 200.0, 110.0));
        assert!(!c.handle(&InputEvent::Wheel { x: cx, y: cy, delta_y: 0.0 }));
    }

    #[test]
    fn test_pointer_leave_ends_pan() {
        let mut c = controller();
        c.handle(&InputEvent::PointerDown { x: 10.0, y: 10.0 });
        assert!(c.handle(&InputEvent::PointerMove { x: 30.0, y: 10.0 }));
        let panned = c.view_box();

        assert!(!c.handle(&InputEvent::PointerLeave));
        assert_eq!(c.state(), GestureState::Idle);
        assert!(!c.handle(&InputEvent::PointerMove { x: 90.0, y: 40.0 }));
        assert_eq!(c.view_box(), panned);
    }

    #[test]
    fn test_zoom_is_bounded() {
        let aspect = 200.0 / 110.0;
        let wheel = |c: &mut ViewportController, delta_y: f64| {
            for _ in 0..8000 {
                c.handle(&InputEvent::Wheel { x: 150.0, y: 60.0, delta_y });
            }
        };
        let assert_sane = |v: ViewBox| {
            assert!(v.to_array().iter().all(|n| n.is_finite()), "{:?}", v);
            assert!(v.width > 0.0 && v.height > 0.0, "{:?}", v);
            assert!((v.width / v.height - aspect).abs() < 1e-6, "{:?}", v);
        };

        let mut c = controller();
        wheel(&mut c, 1.0);
        assert_sane(c.view_box());
        assert!((c.view_box().width - 200.0 * MAX_ZOOM_OUT).abs() < 1e-6);

        let mut c = controller();
        wheel(&mut c, -1.0);
        assert_sane(c.view_box());
        assert!((c.view_box().width - 200.0 / MAX_ZOOM_IN).abs() < 1e-9);

        // 放大到极限后还能缩小回来
        wheel(&mut c, 1.0);
        assert_sane(c.view_box());
        assert!((c.view_box().width - 200.0 * MAX_ZOOM_OUT).abs() < 1e-6);
    }

    #[test]
    fn test_pinch_is_bounded() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart(vec![touch(100.0, 100.0), touch(101.0, 100.0)]));
        c.handle(&InputEvent::TouchMove(vec![touch(0.0, 100.0), touch(1e12, 100.0)]));
        assert!((c.view_box().width - 200.0 / MAX_ZOOM_IN).abs() < 1e-9);

        c.handle(&InputEvent::TouchMove(vec![touch(100.0, 100.0), touch(100.0 + 1e-12, 100.0)]));
        assert!((c.view_box().width - 200.0 * MAX_ZOOM_OUT).abs() < 1e-6);
        assert!(c.view_box().x.is_finite() && c.view_box().y.is_finite());
    }

    #[test]
    fn test_reset_moves_zoom_limits() {
        let mut c = controller();
        c.reset(ViewBox::new(0.0, 0.0, 20.0, 11.0));
        c.zoom_at(0.0, 0.0, 1e6);
        assert!((c.view_box().width - 20.0 / MAX_ZOOM_IN).abs() < 1e-12);
    }

    #[test]
    fn test_events_outside_gesture_are_ignored() {
        let mut c = controller();
        assert!(!c.handle(&InputEvent::PointerMove { x: 50.0, y: 50.0 }));
        assert!(!c.handle(&InputEvent::TouchMove(vec![touch(1.0, 1.0), touch(9.0, 9.0)])));
        assert!(!c.handle(&InputEvent::PointerUp));
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_single_touch_pans() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart(vec![touch(10.0, 10.0)]));
        c.handle(&InputEvent::TouchMove(vec![touch(30.0, 10.0)]));
        assert_view_close(c.view_box(), ViewBox::new(-10.0, 0.0, 200.0, 110.0));

        c.handle(&InputEvent::TouchEnd(vec![]));
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_pinch_is_relative_to_start() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart(vec![touch(100.0, 100.0), touch(200.0, 100.0)]));
        assert!(matches!(c.state(), GestureState::Pinching { .. }));

        // 中间帧不影响最终结果
        c.handle(&InputEvent::TouchMove(vec![touch(90.0, 100.0), touch(210.0, 100.0)]));
        c.handle(&InputEvent::TouchMove(vec![touch(70.0, 100.0), touch(230.0, 100.0)]));
        c.handle(&InputEvent::TouchMove(vec![touch(50.0, 100.0), touch(250.0, 100.0)]));
        let stepped = c.view_box();

        let mut direct = controller();
        direct.handle(&InputEvent::TouchStart(vec![touch(100.0, 100.0), touch(200.0, 100.0)]));
        direct.handle(&InputEvent::TouchMove(vec![touch(50.0, 100.0), touch(250.0, 100.0)]));

        assert_view_close(stepped, direct.view_box());
        assert!((stepped.width - 100.0).abs() < 1e-9);

        // 回到初始距离 -> 回到初始窗口
        c.handle(&InputEvent::TouchMove(vec![touch(100.0, 100.0), touch(200.0, 100.0)]));
        assert_view_close(c.view_box(), ViewBox::new(0.0, 0.0, 200.0, 110.0));
    }

    #[test]
    fn test_pinch_keeps_midpoint_fixed() {
        let mut c = controller();
        c.handle(&InputEvent::TouchStart(vec![touch(100.0, 50.0), touch(200.0, 150.0)]));
        c.handle(&InputEvent::TouchMove(vec![touch(50.0, 0.0), touch(250.0, 200.0)]));

        // 中点 (150, 100) 在元素中的相对位置不变
        let v = c.view_box();
        let start = ViewBox::new(0.0, 0.0, 200.0, 110.0);
        let world = |v: ViewBox| (v.x + 150.0 / 400.0 * v.width, v.y + 100.0 / 220.0 * v.height);
        let (ax, ay) = world(start);
        let (bx, by) = world(v);
        assert!((ax - bx).abs() < 1e-9 && (ay - by).abs() < 1e-9);
    }

    #[test]
    fn test_pinch_ends_below_two_touches() {
        let mut c = controller();
        c.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 });
        c.handle(&InputEvent::TouchStart(vec![touch(0.0, 0.0), touch(10.0, 0.0)]));
        assert!(matches!(c.state(), GestureState::Pinching { .. }));

        c.handle(&InputEvent::TouchEnd(vec![touch(0.0, 0.0)]));
        assert_eq!(c.state(), GestureState::Idle);

        // 重合的触点无法计算缩放比例
        c.handle(&InputEvent::TouchStart(vec![touch(5.0, 5.0), touch(5.0, 5.0)]));
        assert_eq!(c.state(), GestureState::Idle);
    }

    #[test]
    fn test_reset_drops_gesture() {
        let mut c = controller();
        c.handle(&InputEvent::PointerDown { x: 0.0, y: 0.0 });
        c.handle(&InputEvent::PointerMove { x: 50.0, y: 0.0 });

        c.reset(ViewBox::new(0.0, 0.0, 200.0, 110.0));
        assert_eq!(c.state(), GestureState::Idle);
        assert!(!c.handle(&InputEvent::PointerMove { x: 80.0, y: 0.0 }));
        assert_eq!(c.view_box(), ViewBox::new(0.0, 0.0, 200.0, 110.0));
    }
}
