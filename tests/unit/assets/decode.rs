use std::io::Cursor;

use super::*;

fn png_bytes(rgba: Vec<u8>, w: u32, h: u32) -> Vec<u8> {
    let img = image::RgbaImage::from_raw(w, h, rgba).unwrap();
    let mut buf = Vec::new();
    image::DynamicImage::ImageRgba8(img)
        .write_to(&mut Cursor::new(&mut buf), image::ImageFormat::Png)
        .unwrap();
    buf
}

#[test]
fn decode_image_png_dimensions_and_premul() {
    let bytes = png_bytes(vec![100, 50, 200, 128, 10, 20, 30, 0], 2, 1);
    let media = decode_image(&bytes).unwrap();
    assert_eq!((media.width(), media.height()), (2, 1));
    let px = media.rgba8_premul();
    assert_eq!(&px[0..4], &[50, 25, 100, 128]);
    assert_eq!(&px[4..8], &[0, 0, 0, 0]);
}

#[test]
fn decode_garbage_is_an_error() {
    assert!(decode_image(b"definitely not a png").is_err());
}

#[test]
fn missing_file_is_a_media_error() {
    let err = load_image_file(Path::new("/nonexistent/dotfx/image.png")).unwrap_err();
    assert!(matches!(err, DotfxError::Media(_)));
}
