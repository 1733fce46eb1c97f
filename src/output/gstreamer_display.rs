// 该文件是 Huoyan （火眼金睛） 项目的一部分。
// src/output/gstreamer_display.rs - GStreamer 窗口显示输出
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

use gstreamer::{self as gst, prelude::*};
use gstreamer_app as gst_app;
use image::RgbImage;
use tracing::{info, warn};

use crate::result::Error;

fn gst_err(context: &str, e: impl std::fmt::Display) -> Error {
  Error::RuntimeError(format!("{}: {}", context, e))
}

/// GStreamer 实时显示窗口。
///
/// appsrc 接收 RGB 帧，autovideosink 负责弹出窗口，
/// `sync=false` 保证帧到达即显示，不按时间戳限速。
pub struct GStreamerDisplay {
  pipeline: gst::Pipeline,
  appsrc: gst_app::AppSrc,
  fps: u64,
  frame_count: u64,
}

impl GStreamerDisplay {
  pub fn open(width: u32, height: u32, fps: u64) -> Result<Self, Error> {
    // 重复调用 init 是无害的空操作
    gst::init().map_err(|e| gst_err("GStreamer 初始化失败", e))?;

    let pipeline_desc = "appsrc name=src ! videoconvert ! autovideosink sync=false";
    let pipeline = gst::parse::launch(pipeline_desc)
      .map_err(|e| gst_err("无法创建显示管道", e))?
      .downcast::<gst::Pipeline>()
      .map_err(|_| Error::RuntimeError("无法创建显示管道".into()))?;

    let appsrc = pipeline
      .by_name("src")
      .ok_or_else(|| Error::RuntimeError("未找到 appsrc 元素".into()))?
      .downcast::<gst_app::AppSrc>()
      .map_err(|_| Error::RuntimeError("元素不是 appsrc".into()))?;

    let caps = gst::Caps::builder("video/x-raw")
      .field("format", "RGB")
      .field("width", width as i32)
      .field("height", height as i32)
      .field("framerate", gst::Fraction::new(fps as i32, 1))
      .build();

    appsrc.set_caps(Some(&caps));
    appsrc.set_format(gst::Format::Time);

    pipeline
      .set_state(gst::State::Playing)
      .map_err(|e| gst_err("无法启动显示管道", e))?;

    info!("显示窗口已打开: {}x{} @ {} fps", width, height, fps);

    Ok(GStreamerDisplay {
      pipeline,
      appsrc,
      fps,
      frame_count: 0,
    })
  }

  /// 推送一帧到显示窗口。
  pub fn show(&mut self, image: &RgbImage) -> Result<(), Error> {
    let data = image.as_raw();
    let mut buffer = gst::Buffer::with_size(data.len())
      .map_err(|e| gst_err("无法创建缓冲区", e))?;

    {
      let buffer_ref = buffer
        .get_mut()
        .ok_or_else(|| Error::RuntimeError("缓冲区不可写".into()))?;
      let mut buffer_map = buffer_ref
        .map_writable()
        .map_err(|e| gst_err("无法映射缓冲区", e))?;
      buffer_map.copy_from_slice(data);
    }

    let timestamp = (self.frame_count * 1_000_000_000) / self.fps;
    self.frame_count += 1;

    {
      let buffer_ref = buffer
        .get_mut()
        .ok_or_else(|| Error::RuntimeError("缓冲区不可写".into()))?;
      buffer_ref.set_pts(gst::ClockTime::from_nseconds(timestamp));
      buffer_ref.set_duration(gst::ClockTime::from_nseconds(1_000_000_000 / self.fps));
    }

    self
      .appsrc
      .push_buffer(buffer)
      .map_err(|e| Error::RuntimeError(format!("无法推送帧: {:?}", e)))?;
    Ok(())
  }
}

impl Drop for GStreamerDisplay {
  fn drop(&mut self) {
    let _ = self.appsrc.end_of_stream();
    if let Err(e) = self.pipeline.set_state(gst::State::Null) {
      warn!("无法停止显示管道: {}", e);
    }
    info!("显示窗口已关闭，共显示 {} 帧", self.frame_count);
  }
}
