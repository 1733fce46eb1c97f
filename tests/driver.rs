// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// tests/driver.rs - 任务驱动与批量输入的集成测试
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

use std::path::PathBuf;
use std::time::Duration;

use image::RgbImage;

use huoyan::detection::Detection;
use huoyan::detector::Detect;
use huoyan::result::Error;
use huoyan::task::{BatchTask, LiveTask, SingleShotTask, WARM_UP_ROUNDS};

/// 前几次调用人为变慢的桩检测器，模拟运行时的一次性初始化开销。
struct SlowStartDetector {
  calls: usize,
  slow_calls: usize,
  slow_delay: Duration,
}

impl SlowStartDetector {
  fn new(slow_calls: usize, slow_delay: Duration) -> Self {
    SlowStartDetector {
      calls: 0,
      slow_calls,
      slow_delay,
    }
  }
}

impl Detect for SlowStartDetector {
  fn detect(&mut self, image: &RgbImage) -> Result<Vec<Detection>, Error> {
    self.calls += 1;
    if self.calls <= self.slow_calls {
      std::thread::sleep(self.slow_delay);
    }
    Ok(vec![Detection::new(
      image.width(),
      0.5,
      [0.0, 0.0, 0.5, 0.5],
    )])
  }

  fn detect_batch(&mut self, images: &[RgbImage]) -> Result<Vec<Vec<Detection>>, Error> {
    images.iter().map(|image| self.detect(image)).collect()
  }
}

#[test]
fn single_shot_excludes_warm_up_from_timing() {
  let slow = Duration::from_millis(80);
  let mut detector = SlowStartDetector::new(WARM_UP_ROUNDS, slow);
  let image = RgbImage::new(4, 4);

  let (detections, elapsed) = SingleShotTask.run(&mut detector, &image).unwrap();
  assert_eq!(detections.len(), 1);
  // 预热吸收了慢调用，计时的那一次应该远快于 slow
  assert!(elapsed < slow / 2, "计时包含了预热: {:?}", elapsed);
  assert_eq!(detector.calls, WARM_UP_ROUNDS + 1);
}

#[test]
fn batch_returns_one_result_per_image_in_order() {
  let mut detector = SlowStartDetector::new(0, Duration::ZERO);
  let images: Vec<RgbImage> = (1..=5).map(|w| RgbImage::new(w, 2)).collect();

  let (results, _) = BatchTask.run(&mut detector, &images).unwrap();
  assert_eq!(results.len(), 5);
  for (i, detections) in results.iter().enumerate() {
    assert_eq!(detections[0].class_id as usize, i + 1);
  }
  // 预热 + 一次逐张批量
  assert_eq!(detector.calls, WARM_UP_ROUNDS + 5);
}

#[test]
fn batch_of_nothing_is_invalid_input() {
  let mut detector = SlowStartDetector::new(0, Duration::ZERO);
  let err = BatchTask.run(&mut detector, &[]).unwrap_err();
  assert_eq!(err.code(), -100);
}

#[test]
fn live_task_honors_frame_limit() {
  let mut detector = SlowStartDetector::new(0, Duration::ZERO);
  let frames = std::iter::repeat_with(|| Ok(RgbImage::new(4, 4)));
  let mut rendered = 0;

  let processed = LiveTask::default()
    .with_frame_limit(Some(7))
    .run(&mut detector, frames, |_, _| {
      rendered += 1;
      Ok(())
    })
    .unwrap();

  assert_eq!(processed, 7);
  assert_eq!(rendered, 7);
}

#[test]
fn live_task_stops_on_frame_error() {
  let mut detector = SlowStartDetector::new(0, Duration::ZERO);
  let frames = vec![
    Ok(RgbImage::new(4, 4)),
    Ok(RgbImage::new(4, 4)),
    Err(Error::RuntimeError("摄像头断开".into())),
    Ok(RgbImage::new(4, 4)),
  ];

  let processed = LiveTask::default()
    .run(&mut detector, frames.into_iter(), |_, _| Ok(()))
    .unwrap();

  // 出错前的两帧被处理，之后的帧不再读取
  assert_eq!(processed, 2);
}

struct FailingDetector;

impl Detect for FailingDetector {
  fn detect(&mut self, _: &RgbImage) -> Result<Vec<Detection>, Error> {
    Err(Error::RuntimeError("推理失败".into()))
  }

  fn detect_batch(&mut self, _: &[RgbImage]) -> Result<Vec<Vec<Detection>>, Error> {
    Err(Error::RuntimeError("推理失败".into()))
  }
}

#[test]
fn live_task_propagates_detect_error() {
  let mut detector = FailingDetector;
  let frames = vec![Ok(RgbImage::new(4, 4))];
  let result = LiveTask::default().run(&mut detector, frames.into_iter(), |_, _| Ok(()));
  assert_eq!(result.unwrap_err().code(), -30);
}

fn temp_dir(name: &str) -> PathBuf {
  let dir = std::env::temp_dir().join(format!("huoyan-it-{}-{}", std::process::id(), name));
  std::fs::create_dir_all(&dir).unwrap();
  dir
}

#[test]
fn directory_batch_is_all_or_nothing() {
  let dir = temp_dir("batch");
  RgbImage::from_pixel(4, 4, image::Rgb([9, 9, 9]))
    .save(dir.join("a.png"))
    .unwrap();
  std::fs::write(dir.join("b.png"), b"definitely not a png").unwrap();

  assert!(huoyan::input::read_image_dir(&dir).is_err());

  std::fs::remove_file(dir.join("b.png")).unwrap();
  let images = huoyan::input::read_image_dir(&dir).unwrap();
  assert_eq!(images.len(), 1);
  std::fs::remove_dir_all(&dir).ok();
}
