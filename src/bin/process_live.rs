// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/bin/process_live.rs - 摄像头实时推理工具
//
// 本程序遵循 GNU Affero 通用公共许可证（AGPL）许可协议。
// 本程序的发布旨在提供实用价值，但不作任何形式的担保，
// 包括但不限于对适销性或特定用途适用性的默示担保。
// 更多详情请参阅 GNU 通用公共许可证。
//
// Copyright (C) 2026 Johann Li <me@qinka.pro>, Wareless Group

use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::info;

use huoyan::Classes;
use huoyan::detector::Detector;
use huoyan::input::CameraInput;
use huoyan::output::{Draw, GStreamerDisplay};
use huoyan::runtime::OrtRuntime;
use huoyan::task::LiveTask;

const DISPLAY_FPS: u64 = 30;

/// 摄像头实时检测，边推理边在窗口中显示
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 引擎文件路径
  #[arg(long, value_name = "ENGINE")]
  pub engine: PathBuf,
  /// 摄像头设备索引
  #[arg(long, value_name = "CAMERA", default_value_t = 0)]
  pub camera: usize,
  /// 类别名称文件（每行一个名称）
  #[arg(long, value_name = "CLASSES")]
  pub classes: Option<PathBuf>,
  /// 处理帧数上限，缺省时持续运行到中断
  #[arg(long, value_name = "FRAMES")]
  pub frames: Option<u64>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("引擎文件路径: {}", args.engine.display());
  info!("摄像头索引: {}", args.camera);

  let mut detector: Detector<OrtRuntime> = Detector::new();
  detector.init()?;
  detector.load_engine(&args.engine)?;
  if let Some(classes) = &args.classes {
    detector.set_classes(Classes::load_from_file(classes)?);
  }

  let camera = CameraInput::open(args.camera)?;
  let mut display = GStreamerDisplay::open(camera.width(), camera.height(), DISPLAY_FPS)?;
  let draw = Draw::new();

  let processed = LiveTask::default()
    .with_frame_limit(args.frames)
    .run(&mut detector, camera, |image, detections| {
      draw.render(image, detections);
      display.show(image)
    })?;

  info!("实时任务结束，共处理 {} 帧", processed);
  Ok(())
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn engine_is_required() {
    assert!(Args::try_parse_from(["process_live"]).is_err());
  }

  #[test]
  fn camera_defaults_to_zero() {
    let args = Args::try_parse_from(["process_live", "--engine", "m.engine"]).unwrap();
    assert_eq!(args.camera, 0);
    assert!(args.frames.is_none());
  }

  #[test]
  fn frames_bounds_the_loop() {
    let args =
      Args::try_parse_from(["process_live", "--engine", "m.engine", "--frames", "10"]).unwrap();
    assert_eq!(args.frames, Some(10));
  }
}
