// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/classes.rs - 类别名称列表
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

use tracing::{info, warn};

use crate::result::Error;

/// 有序的类别名称列表，文件中的行序即类别编号。
#[derive(Debug, Clone, Default)]
pub struct Classes {
  names: Vec<String>,
}

impl Classes {
  /// 从文本文件加载类别名称，每行一个，空行跳过。
  pub fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self, Error> {
    let text = std::fs::read_to_string(path.as_ref())?;
    let names: Vec<String> = text
      .lines()
      .map(str::trim)
      .filter(|line| !line.is_empty())
      .map(String::from)
      .collect();
    info!("从 {} 加载了 {} 个类别", path.as_ref().display(), names.len());
    Self::load(names)
  }

  /// 使用给定名称列表构造，空列表视为无效输入。
  pub fn load(names: Vec<String>) -> Result<Self, Error> {
    if names.is_empty() {
      warn!("类别名称列表为空");
      return Err(Error::InvalidInput);
    }
    Ok(Classes { names })
  }

  /// 类别编号到名称的转换，越界视为无效输入。
  pub fn name(&self, class_id: u32) -> Result<&str, Error> {
    self
      .names
      .get(class_id as usize)
      .map(String::as_str)
      .ok_or(Error::InvalidInput)
  }

  pub fn len(&self) -> usize {
    self.names.len()
  }

  pub fn is_empty(&self) -> bool {
    self.names.is_empty()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  fn temp_file(name: &str, content: &str) -> std::path::PathBuf {
    let path = std::env::temp_dir().join(format!("huoyan-classes-{}-{}", std::process::id(), name));
    std::fs::write(&path, content).unwrap();
    path
  }

  #[test]
  fn load_from_file_keeps_order() {
    let path = temp_file("order.txt", "person\nbicycle\n\ncar\n");
    let classes = Classes::load_from_file(&path).unwrap();
    assert_eq!(classes.len(), 3);
    assert_eq!(classes.name(0).unwrap(), "person");
    assert_eq!(classes.name(2).unwrap(), "car");
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn empty_list_is_invalid_input() {
    let path = temp_file("empty.txt", "\n\n");
    let err = Classes::load_from_file(&path).unwrap_err();
    assert_eq!(err.code(), Error::InvalidInput.code());
    std::fs::remove_file(path).ok();
  }

  #[test]
  fn out_of_range_id_is_invalid_input() {
    let classes = Classes::load(vec!["person".into()]).unwrap();
    assert!(classes.name(1).is_err());
  }

  #[test]
  fn missing_file_is_filesystem_error() {
    let err = Classes::load_from_file("/nonexistent/coco.txt").unwrap_err();
    assert_eq!(err.code(), -50);
  }
}
