use super::*;

#[test]
fn handle_rejects_mismatched_buffers() {
    assert!(MediaHandle::new(2, 2, Arc::new(vec![0; 15])).is_err());
    assert!(MediaHandle::new(0, 2, Arc::new(Vec::new())).is_err());
    let ok = MediaHandle::new(2, 2, Arc::new(vec![0; 16])).unwrap();
    assert_eq!(ok.size(), Vec2::new(2.0, 2.0));
}

#[test]
fn solid_fills_every_pixel() {
    let h = MediaHandle::solid(3, 1, [1, 2, 3, 4]).unwrap();
    assert_eq!(h.rgba8_premul().as_slice(), &[1, 2, 3, 4, 1, 2, 3, 4, 1, 2, 3, 4]);
}

#[test]
fn dynamic_sources_are_queried_per_frame() {
    let frame = MediaHandle::solid(1, 1, [255; 4]).unwrap();
    let src = MediaSource::Dynamic(Box::new(move |now| (now >= 100.0).then(|| frame.clone())));
    let mut loaded = src.load().unwrap();
    assert!(loaded.is_dynamic());
    assert!(loaded.current(50.0).is_none());
    assert!(loaded.current(150.0).is_some());
}

#[test]
fn missing_file_fails_to_load() {
    let src = MediaSource::File(PathBuf::from("/nonexistent/dotfx.png"));
    assert!(src.load().is_err());
}
