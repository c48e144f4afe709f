use tiny_skia::Color;

/// console.time（非 wasm 环境下只打 trace 日志）
#[cfg(target_arch = "wasm32")]
pub fn time(label: &str) {
    web_sys::console::time_with_label(label);
}

#[cfg(target_arch = "wasm32")]
pub fn time_end(label: &str) {
    web_sys::console::time_end_with_label(label);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn time(label: &str) {
    log::trace!("{}: start", label);
}

#[cfg(not(target_arch = "wasm32"))]
pub fn time_end(label: &str) {
    log::trace!("{}: end", label);
}

/// 把 log 日志输出到浏览器 console（重复调用时忽略）
#[cfg(target_arch = "wasm32")]
pub fn init_logging() {
    if log::set_logger(&wasm_bindgen_console_logger::DEFAULT_LOGGER).is_ok() {
        log::set_max_level(log::LevelFilter::Info);
    }
}

/// 解析 hex 颜色为 tiny-skia Color，支持 #rgb 和 #rrggbb
pub fn parse_hex_color(hex: &str) -> Option<Color> {
    let hex = hex.trim().trim_start_matches('#');
    if !hex.is_ascii() {
        return None;
    }

    let channel = |s: &str| u8::from_str_radix(s, 16).ok();
    let (r, g, b) = match hex.len() {
        6 => (channel(&hex[0..2])?, channel(&hex[2..4])?, channel(&hex[4..6])?),
        3 => {
            let r = channel(&hex[0..1])?;
            let g = channel(&hex[1..2])?;
            let b = channel(&hex[2..3])?;
            (r * 17, g * 17, b * 17)
        }
        _ => return None,
    };

    Some(Color::from_rgba8(r, g, b, 255))
}

/// 转义 XML 文本和属性值
pub fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&apos;"),
            _ => out.push(c),
        }
    }
    out
}

/// 格式化 SVG 数值（最多 3 位小数，去掉多余的 0）
pub fn format_number(value: f64) -> String {
    let s = format!("{:.3}", value);
    let s = s.trim_end_matches('0').trim_end_matches('.');
    match s {
        "-0" | "" => "0".to_string(),
        _ => s.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_hex_color() {
        let color = parse_hex_color("#FF5733").unwrap();
        assert_eq!(color, Color::from_rgba8(255, 87, 51, 255));

        let short = parse_hex_color("#fff").unwrap();
        assert_eq!(short, Color::from_rgba8(255, 255, 255, 255));

        assert!(parse_hex_color("none").is_none());
        assert!(parse_hex_color("#12345").is_none());
    }

    #[test]
    fn test_escape_xml() {
        assert_eq!(escape_xml("Bosnia & <Herzegovina>"), "Bosnia &amp; &lt;Herzegovina&gt;");
        assert_eq!(escape_xml("\"Köln\""), "&quot;Köln&quot;");
    }

    #[test]
    fn test_format_number() {
        assert_eq!(format_number(1.0), "1");
        assert_eq!(format_number(0.1), "0.1");
        assert_eq!(format_number(12.34567), "12.346");
        assert_eq!(format_number(-0.0001), "0");
        assert_eq!(format_number(-2.5), "-2.5");
        assert_eq!(format_number(100.0), "100");
    }
}
