// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/bin/process_image.rs - 单张图像推理工具
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
use huoyan::input::read_image_file;
use huoyan::output::{Draw, save_image_file};
use huoyan::runtime::OrtRuntime;
use huoyan::task::SingleShotTask;

/// 对单张图像做目标检测并保存可视化结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 引擎文件路径
  #[arg(long, value_name = "ENGINE")]
  pub engine: PathBuf,
  /// 输入图像路径
  #[arg(long, value_name = "INPUT")]
  pub input: PathBuf,
  /// 可视化结果输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 类别名称文件（每行一个名称）
  #[arg(long, value_name = "CLASSES")]
  pub classes: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("引擎文件路径: {}", args.engine.display());
  info!("输入图像: {}", args.input.display());
  info!("输出路径: {}", args.output.display());

  let mut detector: Detector<OrtRuntime> = Detector::new();
  detector.init()?;
  detector.load_engine(&args.engine)?;
  if let Some(classes) = &args.classes {
    detector.set_classes(Classes::load_from_file(classes)?);
  }

  let mut image = read_image_file(&args.input)?;

  let (detections, elapsed) = SingleShotTask.run(&mut detector, &image)?;
  info!("检测到 {} 个目标，推理耗时 {:.2?}", detections.len(), elapsed);
  for det in &detections {
    info!(
      "  {} {:.2} [{:.3}, {:.3}, {:.3}, {:.3}]",
      det.label(),
      det.score,
      det.bbox[0],
      det.bbox[1],
      det.bbox[2],
      det.bbox[3]
    );
  }

  Draw::new().render(&mut image, &detections);
  save_image_file(&image, &args.output)?;

  Ok(())
}
