use super::glyphs;
use super::{Camera, CameraError, CameraKind};
use crate::{err_ctx, Result};
use async_trait::async_trait;
use bytes::Bytes;
use image::{Rgb, RgbImage};
use std::io::Cursor;
use std::time::Duration;

const WIDTH: u32 = 100;
const HEIGHT: u32 = 30;

const BACKGROUND: Rgb<u8> = Rgb([73, 109, 137]);
const FOREGROUND: Rgb<u8> = Rgb([255, 255, 0]);

const LABEL: &str = "Sample photo";
const LABEL_POSITION: (u32, u32) = (10, 10);

/// Stands in for the Pi camera on machines without one
pub(crate) struct PlaceholderCamera {
    /// Imitates the warm up of the real camera, so that the bot behaves
    /// the same way with and without the camera
    warm_up: Duration,
}

impl PlaceholderCamera {
    pub(crate) fn new(warm_up: Duration) -> Self {
        Self { warm_up }
    }
}

#[async_trait]
impl Camera for PlaceholderCamera {
    fn kind(&self) -> CameraKind {
        CameraKind::Placeholder
    }

    async fn capture_jpeg(&self) -> Result<Bytes> {
        let jpeg = crate::util::tokio::spawn_blocking(render_jpeg).await?;

        tokio::time::sleep(self.warm_up).await;

        Ok(jpeg)
    }
}

fn render() -> RgbImage {
    let mut image = RgbImage::from_pixel(WIDTH, HEIGHT, BACKGROUND);
    glyphs::draw_text(&mut image, LABEL_POSITION, LABEL, FOREGROUND);
    image
}

pub(crate) fn render_jpeg() -> Result<Bytes> {
    let image = render();
    let mut jpeg = Cursor::new(Vec::new());

    image::write_buffer_with_format(
        &mut jpeg,
        image.as_raw(),
        image.width(),
        image.height(),
        image::ColorType::Rgb8,
        image::ImageFormat::Jpeg,
    )
    .map_err(err_ctx!(CameraError::EncodePlaceholder))?;

    Ok(jpeg.into_inner().into())
}
