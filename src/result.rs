// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/result.rs - 结果码与精度定义
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

use clap::ValueEnum;
use thiserror::Error;

/// 固定的结果码枚举。
///
/// 所有对外接口统一返回这一组错误；`Display` 实现即结果码到人类可读
/// 描述的查表，`code()` 返回对应的数值结果码。
#[derive(Error, Debug)]
pub enum Error {
  /// 输入无效，通常意味着调用方的程序错误
  #[error("invalid input")]
  InvalidInput,
  /// 尚未初始化
  #[error("not initialized")]
  NotInitialized,
  /// 尚未加载引擎
  #[error("not loaded")]
  NotLoaded,
  /// 加载的模型有问题（例如输入输出绑定缺失、格式无效）
  #[error("model error: {0}")]
  ModelError(String),
  /// 文件系统错误（例如无法打开文件）
  #[error("filesystem error: {0}")]
  Filesystem(#[from] std::io::Error),
  /// 推理运行时内部错误
  #[error("runtime error: {0}")]
  RuntimeError(String),
  /// 图像编解码错误
  #[error("image error: {0}")]
  ImageError(#[from] image::ImageError),
  /// 其他错误
  #[error("other error: {0}")]
  Other(String),
}

impl Error {
  /// 数值结果码，0 为成功，负值为各类失败。
  pub fn code(&self) -> i32 {
    match self {
      Error::InvalidInput => -100,
      Error::NotInitialized => -90,
      Error::NotLoaded => -80,
      Error::ModelError(_) => -70,
      Error::Filesystem(_) => -50,
      Error::RuntimeError(_) => -30,
      Error::ImageError(_) => -20,
      Error::Other(_) => -10,
    }
  }
}

/// 引擎构建与推理的数值精度。
#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
pub enum Precision {
  /// 32 位浮点
  Fp32,
  /// 16 位浮点
  Fp16,
}

impl std::fmt::Display for Precision {
  fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
    match self {
      Precision::Fp32 => write!(f, "fp32"),
      Precision::Fp16 => write!(f, "fp16"),
    }
  }
}

impl Precision {
  /// 序列化到引擎文件时使用的字节值。
  pub fn as_byte(self) -> u8 {
    match self {
      Precision::Fp32 => 0,
      Precision::Fp16 => 1,
    }
  }

  pub fn from_byte(b: u8) -> Option<Self> {
    match b {
      0 => Some(Precision::Fp32),
      1 => Some(Precision::Fp16),
      _ => None,
    }
  }
}
