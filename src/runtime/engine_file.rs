// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/runtime/engine_file.rs - 序列化引擎文件格式
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

use tracing::{debug, info};

use crate::result::{Error, Precision};

// 布局: magic(8) + precision(1) + 保留(3) + 模型长度 u64 LE + 模型字节
const MAGIC: [u8; 8] = *b"HUOYAN\0\x01";
const HEADER_LEN: usize = 8 + 1 + 3 + 8;

/// 引擎文件容器：构建精度加上经过校验的模型图。
///
/// 该格式只在运行时一侧使用，包装层把引擎文件当作不透明的二进制。
#[derive(Debug, Clone)]
pub struct EngineFile {
  pub precision: Precision,
  pub model: Vec<u8>,
}

impl EngineFile {
  pub fn new(precision: Precision, model: Vec<u8>) -> Self {
    EngineFile { precision, model }
  }

  pub fn encode(&self) -> Vec<u8> {
    let mut data = Vec::with_capacity(HEADER_LEN + self.model.len());
    data.extend_from_slice(&MAGIC);
    data.push(self.precision.as_byte());
    data.extend_from_slice(&[0u8; 3]);
    data.extend_from_slice(&(self.model.len() as u64).to_le_bytes());
    data.extend_from_slice(&self.model);
    data
  }

  pub fn decode(data: &[u8]) -> Result<Self, Error> {
    if data.len() < HEADER_LEN || data[..8] != MAGIC {
      return Err(Error::ModelError("不是有效的引擎文件".to_string()));
    }

    let precision = Precision::from_byte(data[8])
      .ok_or_else(|| Error::ModelError(format!("未知的精度标记: {}", data[8])))?;

    let mut len_bytes = [0u8; 8];
    len_bytes.copy_from_slice(&data[12..20]);
    let model_len = u64::from_le_bytes(len_bytes) as usize;
    if data.len() != HEADER_LEN + model_len {
      return Err(Error::ModelError(format!(
        "引擎文件长度不符: 期望 {}, 实际 {}",
        HEADER_LEN + model_len,
        data.len()
      )));
    }

    Ok(EngineFile {
      precision,
      model: data[HEADER_LEN..].to_vec(),
    })
  }

  pub fn read_from(path: &Path) -> Result<Self, Error> {
    let data = std::fs::read(path)?;
    debug!(
      "读取引擎文件 {} ({:.2} MB)",
      path.display(),
      data.len() as f64 / (1024.0 * 1024.0)
    );
    Self::decode(&data)
  }

  pub fn write_to(&self, path: &Path) -> Result<(), Error> {
    if let Some(parent) = path.parent()
      && !parent.as_os_str().is_empty()
    {
      std::fs::create_dir_all(parent)?;
    }
    std::fs::write(path, self.encode())?;
    info!(
      "序列化引擎已写入 {} (精度 {})",
      path.display(),
      self.precision
    );
    Ok(())
  }
}
