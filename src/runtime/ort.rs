// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/runtime/ort.rs - ONNX Runtime 推理后端
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

use image::{RgbImage, imageops::FilterType};
use ort::session::Session;
use ort::value::Tensor;
use tracing::{debug, info};

use crate::detection::Detection;
use crate::result::{Error, Precision};
use crate::runtime::{ColorOrder, Engine, Runtime, engine_file::EngineFile};

// YoloV5 网络空间尺寸
const INPUT_W: u32 = 640;
const INPUT_H: u32 = 640;

const SCORE_THRESHOLD: f32 = 0.4;
const NMS_THRESHOLD: f32 = 0.4;

fn ort_err(e: ort::Error) -> Error {
  Error::RuntimeError(e.to_string())
}

/// ONNX Runtime 运行时上下文。
///
/// 环境由 `ort` 在首次创建会话时惰性初始化，这里不持有全局状态。
pub struct OrtRuntime;

impl Runtime for OrtRuntime {
  type Engine = OrtEngine;

  fn init() -> Result<Self, Error> {
    debug!("初始化 ONNX Runtime 上下文");
    Ok(OrtRuntime)
  }

  fn load_engine(&mut self, path: &Path) -> Result<OrtEngine, Error> {
    let file = EngineFile::read_from(path)?;
    info!("加载引擎: {} (精度 {})", path.display(), file.precision);
    OrtEngine::from_engine_file(file)
  }

  fn build_engine(
    &mut self,
    model: &Path,
    output: &Path,
    precision: Precision,
  ) -> Result<(), Error> {
    info!("读取模型文件: {}", model.display());
    let data = std::fs::read(model)?;
    debug!(
      "模型文件大小: {:.2} MB",
      data.len() as f64 / (1024.0 * 1024.0)
    );

    // 构建期完成一次完整的会话创建，校验模型图再序列化
    info!("按精度 {} 编译引擎", precision);
    Session::builder()
      .map_err(ort_err)?
      .commit_from_memory(&data)
      .map_err(|e| Error::ModelError(format!("源模型无效: {}", e)))?;

    EngineFile::new(precision, data).write_to(output)
  }
}

/// 已加载的 YoloV5 引擎。
///
/// 预处理、解码与 NMS 都发生在这里，包装层只拿到最终的检测结果。
pub struct OrtEngine {
  session: Session,
  input_name: String,
  precision: Precision,
}

impl OrtEngine {
  fn from_engine_file(file: EngineFile) -> Result<Self, Error> {
    let session = Session::builder()
      .map_err(ort_err)?
      .commit_from_memory(&file.model)
      .map_err(|e| Error::ModelError(format!("引擎中的模型图无效: {}", e)))?;

    if session.inputs.is_empty() || session.outputs.is_empty() {
      return Err(Error::ModelError("模型缺少输入或输出绑定".to_string()));
    }
    let input_name = session.inputs[0].name.clone();
    debug!("模型输入绑定: {}", input_name);

    Ok(OrtEngine {
      session,
      input_name,
      precision: file.precision,
    })
  }

  pub fn precision(&self) -> Precision {
    self.precision
  }
}

impl Engine for OrtEngine {
  fn detect(&mut self, image: &RgbImage, order: ColorOrder) -> Result<Vec<Detection>, Error> {
    if image.width() == 0 || image.height() == 0 {
      return Err(Error::InvalidInput);
    }

    debug!("设置模型输入");
    let tensor = preprocess(image, order)?;

    debug!("执行模型推理");
    let outputs = self
      .session
      .run(ort::inputs![self.input_name.as_str() => tensor])
      .map_err(ort_err)?;

    debug!("获取模型输出");
    let value = outputs
      .iter()
      .next()
      .map(|(_, value)| value)
      .ok_or_else(|| Error::ModelError("模型没有产生输出".to_string()))?;
    let (shape, data) = value.try_extract_tensor::<f32>().map_err(ort_err)?;

    let dims: &[i64] = shape;
    if dims.len() != 3 {
      return Err(Error::ModelError(format!("非预期的输出维度: {:?}", dims)));
    }
    decode_output(dims[1] as usize, dims[2] as usize, data)
  }
}

/// 缩放到网络输入尺寸并转为 NCHW 浮点张量，取值范围 [0, 1]。
fn preprocess(image: &RgbImage, order: ColorOrder) -> Result<ort::value::DynValue, Error> {
  let resized = image::imageops::resize(image, INPUT_W, INPUT_H, FilterType::Triangle);
  let raw = resized.as_raw();

  let size = (INPUT_W * INPUT_H) as usize;
  let mut data = vec![0f32; 3 * size];
  // BGR 缓冲区在此换回 RGB 平面顺序: 通道 0 与通道 2 的目标平面互换
  let (plane0, plane2) = match order {
    ColorOrder::Rgb => (0usize, 2usize),
    ColorOrder::Bgr => (2usize, 0usize),
  };
  for idx in 0..size {
    data[plane0 * size + idx] = raw[idx * 3] as f32 / 255.0;
    data[size + idx] = raw[idx * 3 + 1] as f32 / 255.0;
    data[plane2 * size + idx] = raw[idx * 3 + 2] as f32 / 255.0;
  }

  let tensor_shape = [1usize, 3, INPUT_H as usize, INPUT_W as usize];
  Ok(
    Tensor::from_array((tensor_shape, data.into_boxed_slice()))
      .map_err(ort_err)?
      .into_dyn(),
  )
}

/// 解码 YoloV5 检测头输出。
///
/// 每行布局为 [cx, cy, w, h, objectness, 各类别得分...]，最终得分为
/// objectness 与最高类别得分之积，阈值过滤后做贪心 NMS。
fn decode_output(num_boxes: usize, row_size: usize, data: &[f32]) -> Result<Vec<Detection>, Error> {
  if row_size < 6 || data.len() < num_boxes * row_size {
    return Err(Error::ModelError(format!(
      "输出张量大小不符: {} x {} (实际 {})",
      num_boxes,
      row_size,
      data.len()
    )));
  }

  let nr_classes = row_size - 5;
  let mut candidates = Vec::new();

  for i in 0..num_boxes {
    let row = &data[i * row_size..(i + 1) * row_size];

    let objectness = row[4];
    if objectness < SCORE_THRESHOLD {
      continue;
    }

    // 取得分最高的类别
    let mut max_score = 0f32;
    let mut max_idx = 0usize;
    for c in 0..nr_classes {
      if row[5 + c] > max_score {
        max_score = row[5 + c];
        max_idx = c;
      }
    }

    let score = objectness * max_score;
    if score < SCORE_THRESHOLD {
      continue;
    }

    let (cx, cy, w, h) = (row[0], row[1], row[2], row[3]);
    let x_min = ((cx - w / 2.0) / INPUT_W as f32).clamp(0.0, 1.0);
    let y_min = ((cy - h / 2.0) / INPUT_H as f32).clamp(0.0, 1.0);
    let x_max = ((cx + w / 2.0) / INPUT_W as f32).clamp(0.0, 1.0);
    let y_max = ((cy + h / 2.0) / INPUT_H as f32).clamp(0.0, 1.0);

    candidates.push(Detection::new(
      max_idx as u32,
      score,
      [x_min, y_min, x_max, y_max],
    ));
  }

  debug!("阈值过滤后剩余 {} 个候选框", candidates.len());
  Ok(nms(candidates, NMS_THRESHOLD))
}

fn iou(a: &[f32; 4], b: &[f32; 4]) -> f32 {
  let ix1 = a[0].max(b[0]);
  let iy1 = a[1].max(b[1]);
  let ix2 = a[2].min(b[2]);
  let iy2 = a[3].min(b[3]);
  let inter = (ix2 - ix1).max(0.0) * (iy2 - iy1).max(0.0);
  if inter == 0.0 {
    return 0.0;
  }
  let area_a = (a[2] - a[0]) * (a[3] - a[1]);
  let area_b = (b[2] - b[0]) * (b[3] - b[1]);
  inter / (area_a + area_b - inter)
}

/// 贪心非极大值抑制：按得分降序，抑制重叠过高的低分框。
fn nms(mut boxes: Vec<Detection>, iou_thresh: f32) -> Vec<Detection> {
  boxes.sort_unstable_by(|a, b| {
    b.score
      .partial_cmp(&a.score)
      .unwrap_or(std::cmp::Ordering::Equal)
  });

  let mut suppressed = vec![false; boxes.len()];
  let mut kept = Vec::new();

  for i in 0..boxes.len() {
    if suppressed[i] {
      continue;
    }
    for j in (i + 1)..boxes.len() {
      if !suppressed[j] && iou(&boxes[i].bbox, &boxes[j].bbox) > iou_thresh {
        suppressed[j] = true;
      }
    }
    kept.push(boxes[i].clone());
  }

  kept
}
