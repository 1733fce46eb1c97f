// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/input/v4l_camera.rs - V4L2 摄像头输入
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

use std::pin::Pin;

use image::RgbImage;
use tracing::info;
use v4l::FourCC;
use v4l::buffer::Type;
use v4l::io::mmap::Stream;
use v4l::io::traits::CaptureStream;
use v4l::prelude::*;
use v4l::video::Capture;

use crate::result::Error;

/// V4L2 摄像头输入。
///
/// v4l 库的 Stream 需要引用 Device，这里用 Pin<Box> 固定 Device 的
/// 内存位置，从而可以安全地创建引用它的 Stream。
pub struct CameraInput {
  device: Pin<Box<Device>>,
  stream: Option<Stream<'static>>,
  width: u32,
  height: u32,
}

impl CameraInput {
  /// 按设备索引打开摄像头（`/dev/video<index>`）。
  pub fn open(index: usize) -> Result<Self, Error> {
    let device = Box::pin(
      Device::new(index)
        .map_err(|e| Error::RuntimeError(format!("无法打开摄像头 {}: {}", index, e)))?,
    );

    let mut format = device
      .format()
      .map_err(|e| Error::RuntimeError(format!("无法获取视频格式: {}", e)))?;
    format.width = 640;
    format.height = 480;
    format.fourcc = FourCC::new(b"YUYV");
    let format = device
      .set_format(&format)
      .map_err(|e| Error::RuntimeError(format!("无法设置视频格式: {}", e)))?;

    let width = format.width;
    let height = format.height;
    info!("摄像头 {} 已打开: {}x{}", index, width, height);

    let mut source = Self {
      device,
      stream: None,
      width,
      height,
    };

    // SAFETY: device 被 Pin<Box> 固定，不会移动，引用始终有效；
    // Drop 顺序为 stream (Option::take) -> device。
    let device_ref: &Device = &source.device;
    let stream = unsafe {
      let device_static: &'static Device = std::mem::transmute(device_ref);
      Stream::with_buffers(device_static, Type::VideoCapture, 4)
        .map_err(|e| Error::RuntimeError(format!("无法创建捕获流: {}", e)))?
    };

    source.stream = Some(stream);
    Ok(source)
  }

  pub fn width(&self) -> u32 {
    self.width
  }

  pub fn height(&self) -> u32 {
    self.height
  }

  /// YUYV 转 RGB，每四字节覆盖两个像素。
  fn yuyv_to_rgb(yuyv: &[u8], width: u32, height: u32) -> Vec<u8> {
    let mut rgb = Vec::with_capacity((width * height * 3) as usize);

    for chunk in yuyv.chunks(4) {
      if chunk.len() < 4 {
        break;
      }

      let y0 = chunk[0] as f32;
      let u = chunk[1] as f32 - 128.0;
      let y1 = chunk[2] as f32;
      let v = chunk[3] as f32 - 128.0;

      let r = (y0 + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y0 - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y0 + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);

      let r = (y1 + 1.402 * v).clamp(0.0, 255.0) as u8;
      let g = (y1 - 0.344 * u - 0.714 * v).clamp(0.0, 255.0) as u8;
      let b = (y1 + 1.772 * u).clamp(0.0, 255.0) as u8;
      rgb.extend_from_slice(&[r, g, b]);
    }

    rgb
  }
}

impl Drop for CameraInput {
  fn drop(&mut self) {
    // stream 必须先于 device 释放
    self.stream.take();
  }
}

impl Iterator for CameraInput {
  type Item = Result<RgbImage, Error>;

  fn next(&mut self) -> Option<Self::Item> {
    let stream = self.stream.as_mut()?;

    match stream.next() {
      Ok((buffer, _meta)) => {
        let rgb_data = Self::yuyv_to_rgb(buffer, self.width, self.height);
        match RgbImage::from_raw(self.width, self.height, rgb_data) {
          Some(image) => Some(Ok(image)),
          None => Some(Err(Error::RuntimeError("无法创建 RGB 图像".into()))),
        }
      }
      Err(e) => Some(Err(Error::RuntimeError(format!("无法捕获帧: {}", e)))),
    }
  }
}
