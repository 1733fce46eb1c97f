// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/task.rs - 任务驱动
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

use std::{
  thread,
  time::{Duration, Instant},
};

use image::RgbImage;
use tracing::{info, warn};

use crate::detection::Detection;
use crate::detector::Detect;
use crate::result::Error;

/// 计时前丢弃结果的预热推理次数
pub const WARM_UP_ROUNDS: usize = 2;

/// 单张图像任务：预热后做一次计时推理。
/// 返回的耗时只覆盖计时的那一次调用。
pub struct SingleShotTask;

impl SingleShotTask {
  pub fn run<D: Detect>(
    self,
    detector: &mut D,
    image: &RgbImage,
  ) -> Result<(Vec<Detection>, Duration), Error> {
    info!("开始任务...");
    for i in 0..WARM_UP_ROUNDS {
      info!("预热推理 {}/{}", i + 1, WARM_UP_ROUNDS);
      detector.detect(image)?;
    }

    let now = Instant::now();
    let detections = detector.detect(image)?;
    let elapsed = now.elapsed();
    info!("推理完成，耗时: {:.2?}", elapsed);

    Ok((detections, elapsed))
  }
}

/// 批量图像任务：用第一张图像预热，然后对整批做一次计时推理。
/// 结果与输入顺序一一对应。
pub struct BatchTask;

impl BatchTask {
  pub fn run<D: Detect>(
    self,
    detector: &mut D,
    images: &[RgbImage],
  ) -> Result<(Vec<Vec<Detection>>, Duration), Error> {
    info!("开始任务，共 {} 张图像...", images.len());
    let first = images.first().ok_or(Error::InvalidInput)?;
    for i in 0..WARM_UP_ROUNDS {
      info!("预热推理 {}/{}", i + 1, WARM_UP_ROUNDS);
      detector.detect(first)?;
    }

    let now = Instant::now();
    let results = detector.detect_batch(images)?;
    let elapsed = now.elapsed();
    info!("批量推理完成，耗时: {:.2?}", elapsed);

    Ok((results, elapsed))
  }
}

/// 连续帧任务：从输入迭代器取帧、推理、交给渲染回调，直到
/// 输入耗尽、达到帧数上限或收到中断信号。
#[derive(Default, Debug)]
pub struct LiveTask {
  frame_limit: Option<u64>,
}

impl LiveTask {
  pub fn with_frame_limit(mut self, frame_limit: Option<u64>) -> Self {
    self.frame_limit = frame_limit;
    self
  }

  /// 返回处理的帧数。取帧失败只结束循环，推理失败则整体失败。
  pub fn run<D, I, F>(self, detector: &mut D, input: I, mut render: F) -> Result<u64, Error>
  where
    D: Detect,
    I: Iterator<Item = Result<RgbImage, Error>>,
    F: FnMut(&mut RgbImage, &[Detection]) -> Result<(), Error>,
  {
    info!("开始任务...");
    let (tx, rx) = std::sync::mpsc::channel();

    // 同一进程内重复注册会失败，此时沿用已有的处理器
    if let Err(e) = ctrlc::set_handler(move || {
      info!("收到中断信号，准备退出...");
      let _ = tx.send(());
      thread::spawn(|| {
        thread::sleep(Duration::from_secs(30));
        warn!("强制退出程序");
        std::process::exit(1);
      });
    }) {
      warn!("无法注册中断处理器: {}", e);
    }

    let mut frame_index: u64 = 0;
    let mut now = Instant::now();
    for frame in input {
      let mut frame = match frame {
        Ok(frame) => frame,
        Err(e) => {
          warn!("取帧失败，结束任务循环: {}", e);
          break;
        }
      };

      frame_index += 1;
      info!("处理第 {} 帧图像", frame_index);
      let detections = detector.detect(&frame)?;
      let elapsed_a = now.elapsed();
      render(&mut frame, &detections)?;
      let elapsed_b = now.elapsed();
      now = Instant::now();
      info!("推理完成，耗时: {:.2?} / {:.2?}", elapsed_a, elapsed_b);

      if self.frame_limit.map(|n| frame_index >= n).unwrap_or(false) {
        info!("达到指定帧数 {}, 退出任务循环", frame_index);
        break;
      }
      if rx.try_recv().is_ok() {
        warn!("中断信号接收，退出任务循环");
        break;
      }
    }

    info!("任务完成，共处理 {} 帧", frame_index);
    Ok(frame_index)
  }
}
