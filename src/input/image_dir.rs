// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/input/image_dir.rs - 图像目录输入
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

use std::path::{Path, PathBuf};

use image::RgbImage;
use tracing::{error, info};

use super::image_file::read_image_file;
use crate::result::Error;

const IMAGE_EXTENSIONS: &[&str] = &["jpg", "jpeg", "png", "bmp", "gif", "webp"];

/// 按文件名排序列出目录下的图像文件。
pub fn list_image_files(dir: &Path) -> Result<Vec<PathBuf>, Error> {
  let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)?
    .filter_map(|entry| entry.ok().map(|e| e.path()))
    .filter(|path| {
      path.is_file()
        && path
          .extension()
          .and_then(|ext| ext.to_str())
          .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_lowercase().as_str()))
          .unwrap_or(false)
    })
    .collect();
  // 处理顺序与输出命名都依赖这一排序
  paths.sort();
  Ok(paths)
}

/// 读取目录下全部图像。任何一张解码失败则整体失败，不产生部分结果。
pub fn read_image_dir(dir: &Path) -> Result<Vec<(PathBuf, RgbImage)>, Error> {
  let paths = list_image_files(dir)?;
  if paths.is_empty() {
    error!("目录 {} 中没有图像文件", dir.display());
    return Err(Error::InvalidInput);
  }
  info!("目录 {} 中找到 {} 张图像", dir.display(), paths.len());

  let mut images = Vec::with_capacity(paths.len());
  for path in paths {
    let image = read_image_file(&path).inspect_err(|_| {
      error!("无法读取图像: {}", path.display());
    })?;
    images.push((path, image));
  }
  Ok(images)
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_dir(name: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!("huoyan-dir-{}-{}", std::process::id(), name));
    std::fs::create_dir_all(&dir).unwrap();
    dir
  }

  fn write_png(dir: &Path, name: &str) {
    RgbImage::from_pixel(4, 4, image::Rgb([1, 2, 3]))
      .save(dir.join(name))
      .unwrap();
  }

  #[test]
  fn listing_is_sorted_and_filtered() {
    let dir = temp_dir("sorted");
    write_png(&dir, "b.png");
    write_png(&dir, "a.png");
    std::fs::write(dir.join("notes.txt"), "skip me").unwrap();

    let paths = list_image_files(&dir).unwrap();
    let names: Vec<_> = paths
      .iter()
      .map(|p| p.file_name().unwrap().to_str().unwrap())
      .collect();
    assert_eq!(names, ["a.png", "b.png"]);
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn empty_dir_is_invalid_input() {
    let dir = temp_dir("empty");
    assert_eq!(read_image_dir(&dir).unwrap_err().code(), -100);
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn one_bad_file_fails_the_whole_batch() {
    let dir = temp_dir("bad");
    write_png(&dir, "a.png");
    std::fs::write(dir.join("b.png"), b"broken").unwrap();
    write_png(&dir, "c.png");

    assert!(read_image_dir(&dir).is_err());
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn reads_all_images_in_order() {
    let dir = temp_dir("all");
    write_png(&dir, "2.png");
    write_png(&dir, "1.png");

    let images = read_image_dir(&dir).unwrap();
    assert_eq!(images.len(), 2);
    assert!(images[0].0.ends_with("1.png"));
    assert!(images[1].0.ends_with("2.png"));
    std::fs::remove_dir_all(&dir).ok();
  }
}
