// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/bin/build_engine.rs - 引擎构建工具
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

use huoyan::Precision;
use huoyan::builder::Builder;
use huoyan::runtime::OrtRuntime;

/// 把模型文件编译为引擎文件
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
pub struct Args {
  /// 模型文件路径
  #[arg(long, value_name = "MODEL")]
  pub model: PathBuf,
  /// 引擎输出路径
  #[arg(long, value_name = "OUTPUT")]
  pub output: PathBuf,
  /// 构建精度
  #[arg(long, value_enum, default_value_t = Precision::Fp32)]
  pub precision: Precision,
}

fn main() -> Result<()> {
  tracing_subscriber::fmt::init();

  let args = Args::parse();

  info!("模型文件路径: {}", args.model.display());
  info!("引擎输出路径: {}", args.output.display());
  info!("构建精度: {}", args.precision);

  let mut builder: Builder<OrtRuntime> = Builder::new();
  builder.init()?;
  builder.build_engine(&args.model, &args.output, args.precision)?;

  info!("引擎构建完成");
  Ok(())
}
