// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/detector.rs - 检测器生命周期
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
use tracing::{debug, info, warn};

use crate::classes::Classes;
use crate::detection::Detection;
use crate::result::Error;
use crate::runtime::{ColorOrder, Engine, Runtime};

/// 检测调用的抽象，任务驱动层只依赖这一接口。
pub trait Detect {
  fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, Error>;

  fn detect_batch(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, Error>;
}

/// 包装外部运行时的检测器。
///
/// 状态机: 未初始化 → 已初始化 → 引擎已加载。顺序错误的调用返回
/// `not initialized` / `not loaded` 而不改变状态；推理失败同样不破坏
/// 已加载的引擎，调用方可以重试。
pub struct Detector<R: Runtime> {
  runtime: Option<R>,
  engine: Option<R::Engine>,
  classes: Option<Classes>,
  color_order: ColorOrder,
}

impl<R: Runtime> Default for Detector<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Runtime> Detector<R> {
  pub fn new() -> Self {
    Detector {
      runtime: None,
      engine: None,
      classes: None,
      color_order: ColorOrder::default(),
    }
  }

  /// 创建底层运行时上下文，必须先于 `load_engine` 调用。
  pub fn init(&mut self) -> Result<(), Error> {
    self.runtime = Some(R::init()?);
    debug!("检测器初始化完成");
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.runtime.is_some()
  }

  /// 从文件加载序列化引擎。引擎句柄由检测器独占，直到进程结束或
  /// 下一次加载替换。
  pub fn load_engine(&mut self, path: &Path) -> Result<(), Error> {
    let runtime = self.runtime.as_mut().ok_or(Error::NotInitialized)?;
    self.engine = Some(runtime.load_engine(path)?);
    Ok(())
  }

  pub fn is_engine_loaded(&self) -> bool {
    self.engine.is_some()
  }

  /// 挂载类别名称列表，仅用于把类别编号翻译为显示名称。
  pub fn set_classes(&mut self, classes: Classes) {
    info!("挂载 {} 个类别名称", classes.len());
    self.classes = Some(classes);
  }

  pub fn set_color_order(&mut self, order: ColorOrder) {
    self.color_order = order;
  }

  /// 丢弃结果的预热调用，吸收运行时的一次性初始化开销。
  pub fn warm_up(&mut self, image: &RgbImage, rounds: usize) -> Result<(), Error> {
    for i in 0..rounds {
      debug!("预热推理 {}/{}", i + 1, rounds);
      self.run_detect(image)?;
    }
    Ok(())
  }

  fn run_detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, Error> {
    if self.runtime.is_none() {
      return Err(Error::NotInitialized);
    }
    let engine = self.engine.as_mut().ok_or(Error::NotLoaded)?;

    if image.width() == 0 || image.height() == 0 {
      return Err(Error::InvalidInput);
    }

    let mut detections = engine.detect(image, self.color_order)?;
    self.attach_names(&mut detections);
    Ok(detections)
  }

  fn run_detect_batch(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, Error> {
    if self.runtime.is_none() {
      return Err(Error::NotInitialized);
    }
    let engine = self.engine.as_mut().ok_or(Error::NotLoaded)?;

    if images.is_empty() || images.iter().any(|i| i.width() == 0 || i.height() == 0) {
      return Err(Error::InvalidInput);
    }

    let mut results = engine.detect_batch(images, self.color_order)?;
    for detections in &mut results {
      self.attach_names(detections);
    }
    Ok(results)
  }

  fn attach_names(&self, detections: &mut [Detection]) {
    let Some(classes) = &self.classes else {
      return;
    };
    for det in detections {
      match classes.name(det.class_id) {
        Ok(name) => det.class_name = Some(name.to_string()),
        Err(_) => {
          warn!("类别编号 {} 超出类别名称列表范围", det.class_id);
        }
      }
    }
  }
}

impl<R: Runtime> Detect for Detector<R> {
  fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, Error> {
    self.run_detect(image)
  }

  fn detect_batch(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, Error> {
    self.run_detect_batch(images)
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use crate::result::Precision;
  use std::path::PathBuf;

  // 记录调用的桩引擎
  struct StubEngine {
    fail_next: bool,
  }

  impl Engine for StubEngine {
    fn detect(&mut self, image: &RgbImage, _order: ColorOrder) -> Result<Vec<Detection>, Error> {
      if self.fail_next {
        self.fail_next = false;
        return Err(Error::RuntimeError("瞬时故障".into()));
      }
      // 编号取自图像宽度，便于断言顺序
      Ok(vec![Detection::new(
        image.width() - 1,
        0.5,
        [0.0, 0.0, 0.5, 0.5],
      )])
    }
  }

  struct StubRuntime;

  impl Runtime for StubRuntime {
    type Engine = StubEngine;

    fn init() -> Result<Self, Error> {
      Ok(StubRuntime)
    }

    fn load_engine(&mut self, path: &Path) -> Result<StubEngine, Error> {
      if path == PathBuf::from("/missing.engine") {
        return Err(Error::Filesystem(std::io::Error::from(
          std::io::ErrorKind::NotFound,
        )));
      }
      Ok(StubEngine { fail_next: false })
    }

    fn build_engine(&mut self, _: &Path, _: &Path, _: Precision) -> Result<(), Error> {
      Ok(())
    }
  }

  fn image(w: u32) -> RgbImage {
    RgbImage::new(w, 4)
  }

  #[test]
  fn detect_before_init_is_not_initialized() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    let err = detector.detect(&image(1)).unwrap_err();
    assert_eq!(err.code(), -90);
  }

  #[test]
  fn load_before_init_is_not_initialized() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    assert_eq!(
      detector.load_engine(Path::new("/x.engine")).unwrap_err().code(),
      -90
    );
  }

  #[test]
  fn detect_before_load_is_not_loaded() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    let err = detector.detect(&image(1)).unwrap_err();
    assert_eq!(err.code(), -80);
  }

  #[test]
  fn missing_engine_file_keeps_state() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    assert!(detector.load_engine(Path::new("/missing.engine")).is_err());
    assert!(!detector.is_engine_loaded());
    // 之后正常加载仍然可用
    detector.load_engine(Path::new("/ok.engine")).unwrap();
    assert!(detector.is_engine_loaded());
  }

  #[test]
  fn empty_image_is_invalid_input_and_retryable() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    detector.load_engine(Path::new("/ok.engine")).unwrap();

    let err = detector.detect(&RgbImage::new(0, 0)).unwrap_err();
    assert_eq!(err.code(), -100);
    // 状态未被破坏
    assert!(detector.detect(&image(1)).is_ok());
  }

  #[test]
  fn batch_preserves_input_order() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    detector.load_engine(Path::new("/ok.engine")).unwrap();

    let images: Vec<RgbImage> = (1..=4).map(image).collect();
    let results = detector.detect_batch(&images).unwrap();
    assert_eq!(results.len(), 4);
    for (i, dets) in results.iter().enumerate() {
      assert_eq!(dets[0].class_id as usize, i);
    }
  }

  #[test]
  fn empty_batch_is_invalid_input() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    detector.load_engine(Path::new("/ok.engine")).unwrap();
    assert_eq!(detector.detect_batch(&[]).unwrap_err().code(), -100);
  }

  #[test]
  fn class_names_are_attached() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    detector.load_engine(Path::new("/ok.engine")).unwrap();
    detector.set_classes(Classes::load(vec!["person".into(), "bicycle".into()]).unwrap());

    let detections = detector.detect(&image(2)).unwrap();
    assert_eq!(detections[0].class_name.as_deref(), Some("bicycle"));
  }

  #[test]
  fn transient_engine_failure_is_retryable() {
    let mut detector: Detector<StubRuntime> = Detector::new();
    detector.init().unwrap();
    detector.load_engine(Path::new("/ok.engine")).unwrap();
    if let Some(engine) = detector.engine.as_mut() {
      engine.fail_next = true;
    }
    assert!(detector.detect(&image(1)).is_err());
    assert!(detector.detect(&image(1)).is_ok());
  }
}
