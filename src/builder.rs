// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/builder.rs - 引擎构建器
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

use tracing::info;

use crate::result::{Error, Precision};
use crate::runtime::Runtime;

/// 离线引擎构建器：把通用模型文件编译为可分发的引擎文件。
///
/// 与检测器同样的两段生命周期：`init` 之后才能 `build_engine`。
pub struct Builder<R: Runtime> {
  runtime: Option<R>,
}

impl<R: Runtime> Default for Builder<R> {
  fn default() -> Self {
    Self::new()
  }
}

impl<R: Runtime> Builder<R> {
  pub fn new() -> Self {
    Builder { runtime: None }
  }

  pub fn init(&mut self) -> Result<(), Error> {
    self.runtime = Some(R::init()?);
    Ok(())
  }

  pub fn is_initialized(&self) -> bool {
    self.runtime.is_some()
  }

  /// 读取 `model` 指向的模型文件，按 `precision` 编译并写出到 `output`。
  /// 构建可能耗时数分钟，由运行时自行输出进度日志。
  pub fn build_engine(
    &mut self,
    model: &Path,
    output: &Path,
    precision: Precision,
  ) -> Result<(), Error> {
    let runtime = self.runtime.as_mut().ok_or(Error::NotInitialized)?;
    info!(
      "开始构建引擎: {} -> {} ({})",
      model.display(),
      output.display(),
      precision
    );
    runtime.build_engine(model, output, precision)
  }
}
