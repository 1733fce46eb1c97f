// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/detection.rs - 检测结果定义
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

/// 单个检测到的目标。
///
/// 边框使用归一化坐标，与输入图像的分辨率无关；`class_name` 仅在
/// 检测器挂载了类别名称列表后才会被填充。
#[derive(Debug, Clone)]
pub struct Detection {
  pub class_id: u32,
  pub class_name: Option<String>,
  pub score: f32,
  pub bbox: [f32; 4], // 归一化 [x_min, y_min, x_max, y_max]
}

impl Detection {
  pub fn new(class_id: u32, score: f32, bbox: [f32; 4]) -> Self {
    Detection {
      class_id,
      class_name: None,
      score,
      bbox,
    }
  }

  /// 显示用标签：有名称用名称，否则退回类别编号。
  pub fn label(&self) -> String {
    match &self.class_name {
      Some(name) => name.clone(),
      None => format!("#{}", self.class_id),
    }
  }
}
