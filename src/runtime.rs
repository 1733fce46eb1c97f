// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/runtime.rs - 推理运行时边界
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

use crate::detection::Detection;
use crate::result::{Error, Precision};

pub mod engine_file;

#[cfg(feature = "ort_runtime")]
pub mod ort;
#[cfg(feature = "ort_runtime")]
pub use self::ort::{OrtEngine, OrtRuntime};

/// 传给检测调用的附加标志：调用方图像缓冲区的通道顺序。
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ColorOrder {
  #[default]
  Rgb,
  Bgr,
}

/// 已加载、可反复执行的引擎句柄。
///
/// 实现方负责预处理、推理与后处理，返回的检测结果按输入顺序排列，
/// 失败不得破坏引擎状态，调用方可以重试。
pub trait Engine {
  fn detect(&mut self, image: &RgbImage, order: ColorOrder) -> Result<Vec<Detection>, Error>;

  /// 批量检测，结果与输入一一对应、保持顺序。
  ///
  /// 默认实现逐张推理，任一失败则整批失败。
  fn detect_batch(
    &mut self,
    images: &[RgbImage],
    order: ColorOrder,
  ) -> Result<Vec<Vec<Detection>>, Error> {
    let mut results = Vec::with_capacity(images.len());
    for image in images {
      results.push(self.detect(image, order)?);
    }
    Ok(results)
  }
}

/// 外部推理运行时的窄接口。
///
/// 引擎构建与加载都经由这里完成，包装层不关心引擎文件的内部格式。
pub trait Runtime: Sized {
  type Engine: Engine;

  /// 创建运行时上下文。
  fn init() -> Result<Self, Error>;

  /// 从文件加载序列化引擎。
  fn load_engine(&mut self, path: &Path) -> Result<Self::Engine, Error>;

  /// 读取源模型，按目标精度编译并序列化引擎到 `output`。
  fn build_engine(
    &mut self,
    model: &Path,
    output: &Path,
    precision: Precision,
  ) -> Result<(), Error>;
}
