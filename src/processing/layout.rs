use serde::Deserialize;

/// How a frame is scaled onto the canvas.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum FitMode {
    /// Whole image visible, letterboxed on the short axis.
    #[default]
    Contain,
    /// Canvas fully covered, image cropped on the long axis.
    Cover,
}

/// Destination rectangle for a fitted image. Offsets may be negative when the
/// image overflows the canvas (cover).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Placement {
    pub x: i64,
    pub y: i64,
    pub width: u32,
    pub height: u32,
}

pub fn place(fit: FitMode, canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> Placement {
    let (width, height) = match fit {
        FitMode::Contain => resize_to_contain(canvas_w, canvas_h, src_w, src_h),
        FitMode::Cover => resize_to_cover(canvas_w, canvas_h, src_w, src_h),
    };
    let (x, y) = center_offset(width, height, canvas_w, canvas_h);
    Placement {
        x,
        y,
        width,
        height,
    }
}

/// Part of a placed image that lands on the canvas: the destination rectangle
/// in canvas pixels and the matching source rectangle in source pixels.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VisibleCrop {
    pub dst_x: u32,
    pub dst_y: u32,
    pub dst_width: u32,
    pub dst_height: u32,
    pub src_left: f64,
    pub src_top: f64,
    pub src_width: f64,
    pub src_height: f64,
}

impl VisibleCrop {
    pub fn is_whole_source(&self, src_w: u32, src_h: u32) -> bool {
        self.src_left == 0.0
            && self.src_top == 0.0
            && self.src_width == f64::from(src_w)
            && self.src_height == f64::from(src_h)
    }
}

/// Clip `placement` to the canvas. `None` when nothing of the image is visible.
pub fn visible_crop(
    placement: Placement,
    canvas_w: u32,
    canvas_h: u32,
    src_w: u32,
    src_h: u32,
) -> Option<VisibleCrop> {
    let (dst_x, dst_width, src_left, src_width) =
        clip_axis(placement.x, placement.width, canvas_w, src_w)?;
    let (dst_y, dst_height, src_top, src_height) =
        clip_axis(placement.y, placement.height, canvas_h, src_h)?;
    Some(VisibleCrop {
        dst_x,
        dst_y,
        dst_width,
        dst_height,
        src_left,
        src_top,
        src_width,
        src_height,
    })
}

fn clip_axis(offset: i64, extent: u32, canvas: u32, src: u32) -> Option<(u32, u32, f64, f64)> {
    let start = offset.max(0);
    let end = (offset + i64::from(extent)).min(i64::from(canvas));
    if end <= start || extent == 0 {
        return None;
    }
    let visible = (end - start) as u32;
    if visible == extent {
        return Some((start as u32, visible, 0.0, f64::from(src)));
    }
    let scale = f64::from(src) / f64::from(extent);
    let src_start = (start - offset) as f64 * scale;
    let src_len = f64::from(visible) * scale;
    Some((start as u32, visible, src_start, src_len))
}

pub fn resize_to_cover(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let cw = canvas_w.max(1) as f32;
    let ch = canvas_h.max(1) as f32;
    let img_ratio = iw / ih;
    if cw / ch > img_ratio {
        (canvas_w.max(1), scaled(cw / img_ratio))
    } else {
        (scaled(ch * img_ratio), canvas_h.max(1))
    }
}

pub fn resize_to_contain(canvas_w: u32, canvas_h: u32, src_w: u32, src_h: u32) -> (u32, u32) {
    let iw = src_w.max(1) as f32;
    let ih = src_h.max(1) as f32;
    let cw = canvas_w.max(1) as f32;
    let ch = canvas_h.max(1) as f32;
    let img_ratio = iw / ih;
    if cw / ch > img_ratio {
        (scaled(ch * img_ratio), canvas_h.max(1))
    } else {
        (canvas_w.max(1), scaled(cw / img_ratio))
    }
}

pub fn center_offset(inner_w: u32, inner_h: u32, outer_w: u32, outer_h: u32) -> (i64, i64) {
    let ox = (i64::from(outer_w) - i64::from(inner_w)) / 2;
    let oy = (i64::from(outer_h) - i64::from(inner_h)) / 2;
    (ox, oy)
}

fn scaled(value: f32) -> u32 {
    let value = if value.is_finite() { value } else { 1.0 };
    value.round().clamp(1.0, u32::MAX as f32) as u32
}
