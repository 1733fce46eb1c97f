// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/output/save_image_file.rs - 保存图像文件
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

use std::path::Path;

use image::RgbImage;
use tracing::info;

use crate::result::Error;

/// 把图像保存到文件，父目录不存在时自动创建。
/// 编码格式由扩展名决定。
pub fn save_image_file(image: &RgbImage, path: &Path) -> Result<(), Error> {
  if let Some(parent) = path.parent()
    && !parent.as_os_str().is_empty()
  {
    std::fs::create_dir_all(parent)?;
  }

  image.save(path)?;
  info!("保存图像到文件: {}", path.display());
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;
  use std::path::PathBuf;

  fn temp_dir(name: &str) -> PathBuf {
    std::env::temp_dir().join(format!("huoyan-save-{}-{}", std::process::id(), name))
  }

  #[test]
  fn creates_parent_directories() {
    let dir = temp_dir("nested");
    let path = dir.join("a/b/out.png");
    let image = RgbImage::from_pixel(4, 4, image::Rgb([5, 6, 7]));
    save_image_file(&image, &path).unwrap();
    assert!(path.is_file());
    std::fs::remove_dir_all(&dir).ok();
  }

  #[test]
  fn unknown_extension_is_image_error() {
    let dir = temp_dir("ext");
    std::fs::create_dir_all(&dir).unwrap();
    let image = RgbImage::new(2, 2);
    let err = save_image_file(&image, &dir.join("out.xyz")).unwrap_err();
    assert_eq!(err.code(), -20);
    std::fs::remove_dir_all(&dir).ok();
  }
}
