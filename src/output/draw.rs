// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/output/draw.rs - 检测结果可视化
//
// 本文件根据 Apache 许可证第 2.0 版（以下简称“许可证”）授权使用；
// 除非遵守该许可证条款，否则您不得使用本文件。
// 您可通过以下网址获取许可证副本：
// http://www.apache.org/licenses/LICENSE-2.0
// 除非适用法律要求或书面同意，根据本许可协议分发的软件均按“原样”提供，
// 不附带任何形式的明示或暗示的保证或条件。
// 有关许可权限与限制的具体条款，请参阅本许可协议。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use ab_glyph::{FontVec, PxScale};
use image::{Rgb, RgbImage};
use imageproc::drawing::{draw_filled_rect_mut, draw_text_mut};
use tracing::{debug, warn};

use crate::detection::Detection;

// 文本渲染常量
const LABEL_FONT_SIZE: f32 = 20.0;
const LABEL_TEXT_HEIGHT: i32 = 24;
const LABEL_CHAR_WIDTH: f32 = 11.0; // 每字符平均宽度（粗略估计）
const LABEL_TEXT_VERTICAL_PADDING: i32 = 2;
const LABEL_COLOR: [u8; 3] = [153, 51, 255]; // 品红色

// 按顺序尝试的系统字体
const FONT_SEARCH_PATHS: &[&str] = &[
  "/usr/share/fonts/truetype/dejavu/DejaVuSans.ttf",
  "/usr/share/fonts/truetype/liberation/LiberationSans-Regular.ttf",
  "/usr/share/fonts/TTF/DejaVuSans.ttf",
];

/// 环境变量，指定标签字体文件路径
pub const FONT_ENV: &str = "HUOYAN_FONT";

/// 把检测框与标签画到图像上。
///
/// 没有可用字体时降级为只画边框，不画标签文本。
pub struct Draw {
  font_size: f32,
  label_text_height: i32,
  label_char_width: f32,
  label_text_vertical_padding: i32,
  font: Option<FontVec>,
  label_color: [u8; 3],
}

impl Default for Draw {
  fn default() -> Self {
    Self::new()
  }
}

impl Draw {
  pub fn new() -> Self {
    let font = Self::load_font();
    if font.is_none() {
      warn!("未找到可用字体，标签文本将被省略");
    }

    Self {
      font_size: LABEL_FONT_SIZE,
      label_text_height: LABEL_TEXT_HEIGHT,
      label_char_width: LABEL_CHAR_WIDTH,
      label_text_vertical_padding: LABEL_TEXT_VERTICAL_PADDING,
      label_color: LABEL_COLOR,
      font,
    }
  }

  fn load_font() -> Option<FontVec> {
    let env_path = std::env::var(FONT_ENV).ok();
    let candidates = env_path
      .iter()
      .map(String::as_str)
      .chain(FONT_SEARCH_PATHS.iter().copied());

    for path in candidates {
      if let Ok(data) = std::fs::read(path)
        && let Ok(font) = FontVec::try_from_vec(data)
      {
        debug!("加载标签字体: {}", path);
        return Some(font);
      }
    }
    None
  }

  /// 绘制全部检测结果。
  pub fn render(&self, image: &mut RgbImage, detections: &[Detection]) {
    for det in detections {
      self.draw_bbox_with_label(image, &det.bbox, &det.label(), det.score);
    }
  }

  // bbox 为归一化坐标 [x_min, y_min, x_max, y_max]
  fn draw_bbox_with_label(&self, image: &mut RgbImage, bbox: &[f32; 4], label: &str, score: f32) {
    let (w, h) = (image.width() as f32, image.height() as f32);
    if w < 1.0 || h < 1.0 {
      return;
    }

    let mut x_min = (bbox[0] * w).floor() as i32;
    let mut y_min = (bbox[1] * h).floor() as i32;
    let mut x_max = (bbox[2] * w).ceil() as i32;
    let mut y_max = (bbox[3] * h).ceil() as i32;

    x_min = x_min.clamp(0, w as i32 - 1);
    y_min = y_min.clamp(0, h as i32 - 1);
    x_max = x_max.clamp(0, w as i32 - 1);
    y_max = y_max.clamp(0, h as i32 - 1);

    // 退化框直接跳过
    if x_min >= x_max || y_min >= y_max {
      return;
    }

    let color = self.label_color;

    // 绘制边框（加粗为2像素）
    for thickness in 0..2 {
      let x_min_t = (x_min + thickness).min(w as i32 - 1);
      let y_min_t = (y_min + thickness).min(h as i32 - 1);
      let x_max_t = (x_max - thickness).max(0);
      let y_max_t = (y_max - thickness).max(0);

      for x in x_min_t..=x_max_t {
        if y_min_t >= 0 && (y_min_t as u32) < image.height() && (x as u32) < image.width() {
          *image.get_pixel_mut(x as u32, y_min_t as u32) = Rgb(color);
        }
        if y_max_t >= 0 && (y_max_t as u32) < image.height() && (x as u32) < image.width() {
          *image.get_pixel_mut(x as u32, y_max_t as u32) = Rgb(color);
        }
      }

      for y in y_min_t..=y_max_t {
        if x_min_t >= 0 && (x_min_t as u32) < image.width() && (y as u32) < image.height() {
          *image.get_pixel_mut(x_min_t as u32, y as u32) = Rgb(color);
        }
        if x_max_t >= 0 && (x_max_t as u32) < image.width() && (y as u32) < image.height() {
          *image.get_pixel_mut(x_max_t as u32, y as u32) = Rgb(color);
        }
      }
    }

    let Some(font) = &self.font else {
      return;
    };

    let text = format!("{} {:.2}", label, score);
    let scale = PxScale::from(self.font_size);
    let text_color = Rgb([255u8, 255u8, 255u8]); // 白色文本

    // 估算文本大小（粗略估计）
    let text_width = (text.len() as f32 * self.label_char_width) as i32;
    let text_height = self.label_text_height;

    // 标签背景在边框上方
    let label_x = x_min.max(0);
    let label_y = (y_min - text_height).max(0);

    let max_width = (w as i32 - label_x).max(0);
    let label_width = text_width.min(max_width) as u32;
    let label_height = text_height as u32;

    if label_width > 0 && label_height > 0 {
      let rect = imageproc::rect::Rect::at(label_x, label_y).of_size(label_width, label_height);
      draw_filled_rect_mut(image, rect, Rgb(color));

      draw_text_mut(
        image,
        text_color,
        label_x,
        label_y + self.label_text_vertical_padding,
        scale,
        font,
        &text,
      );
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::detection::Detection;

  fn blank(w: u32, h: u32) -> RgbImage {
    RgbImage::new(w, h)
  }

  #[test]
  fn draws_box_pixels() {
    let draw = Draw::new();
    let mut image = blank(100, 100);
    let det = Detection::new(0, 0.9, [0.2, 0.2, 0.8, 0.8]);
    draw.render(&mut image, std::slice::from_ref(&det));

    // 边框左上角应被着色
    assert_eq!(image.get_pixel(20, 20).0, LABEL_COLOR);
    // 框内部保持原样（中心点远离边框与标签）
    assert_eq!(image.get_pixel(50, 60).0, [0, 0, 0]);
  }

  #[test]
  fn degenerate_bbox_is_skipped() {
    let draw = Draw::new();
    let mut image = blank(50, 50);
    let det = Detection::new(0, 0.9, [0.5, 0.5, 0.5, 0.5]);
    draw.render(&mut image, std::slice::from_ref(&det));
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
  }

  #[test]
  fn out_of_range_bbox_is_clamped() {
    let draw = Draw::new();
    let mut image = blank(40, 40);
    let det = Detection::new(0, 0.9, [-0.5, -0.5, 1.5, 1.5]);
    // 不应 panic
    draw.render(&mut image, std::slice::from_ref(&det));
    assert_eq!(image.get_pixel(0, 39).0, LABEL_COLOR);
  }

  #[test]
  fn empty_detections_leave_image_untouched() {
    let draw = Draw::new();
    let mut image = blank(10, 10);
    draw.render(&mut image, &[]);
    assert!(image.pixels().all(|p| p.0 == [0, 0, 0]));
  }
}
