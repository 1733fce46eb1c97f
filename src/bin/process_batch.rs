// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/bin/process_batch.rs - 批量图像推理工具
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
use huoyan::input::read_image_dir;
use huoyan::output::{Draw, save_image_file};
use huoyan::runtime::OrtRuntime;
use huoyan::task::BatchTask;

/// 对目录下的全部图像做一次批量检测并保存可视化结果
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 引擎文件路径
  #[arg(long, value_name = "ENGINE")]
  pub engine: PathBuf,
  /// 输入图像目录
  #[arg(long, value_name = "INPUTS")]
  pub inputs: PathBuf,
  /// 可视化结果输出目录
  #[arg(long, value_name = "OUTPUTS")]
  pub outputs: PathBuf,
  /// 类别名称文件（每行一个名称）
  #[arg(long, value_name = "CLASSES")]
  pub classes: Option<PathBuf>,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("引擎文件路径: {}", args.engine.display());
  info!("输入目录: {}", args.inputs.display());
  info!("输出目录: {}", args.outputs.display());

  let mut detector: Detector<OrtRuntime> = Detector::new();
  detector.init()?;
  detector.load_engine(&args.engine)?;
  if let Some(classes) = &args.classes {
    detector.set_classes(Classes::load_from_file(classes)?);
  }

  // 先完整读入，任何一张失败都在推理前中止
  let named_images = read_image_dir(&args.inputs)?;
  let images: Vec<_> = named_images.iter().map(|(_, image)| image.clone()).collect();

  let (results, elapsed) = BatchTask.run(&mut detector, &images)?;
  info!("批量推理完成，{} 张图像耗时 {:.2?}", images.len(), elapsed);

  // 推理全部成功后才开始写出
  let draw = Draw::new();
  for (((path, _), mut image), detections) in
    named_images.into_iter().zip(images).zip(results.iter())
  {
    info!("{}: {} 个目标", path.display(), detections.len());
    draw.render(&mut image, detections);
    let file_name = path.file_name().ok_or_else(|| {
      anyhow::anyhow!("无法获取文件名: {}", path.display())
    })?;
    save_image_file(&image, &args.outputs.join(file_name))?;
  }

  Ok(())
}
