// loader.rs — 全景图后台加载（URL / 本地文件 / 内存位图）
//
// 加载在独立线程里完成，通过 channel 一次性回传结果。完成句柄携带
// "仍挂载" 标志：查看器卸载后结果直接丢弃，不会触碰已销毁的状态。

use crate::error::ViewerError;
use image::io::{Limits, Reader as ImageReader};
use image::{GenericImageView, RgbaImage};
use std::fmt;
use std::io::{BufReader, Cursor, Read};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc::{channel, Receiver, Sender, TryRecvError};
use std::sync::Arc;
use std::thread;

/// Placeholder shown when the host gives no panorama.
pub const DEFAULT_PANORAMA_URL: &str =
    "https://yourluxuryhometanger.com/wp-content/uploads/2025/04/P1079215-1140x760.jpg";

/// Upper bound on a remote download.
pub const MAX_DOWNLOAD_BYTES: u64 = 256 * 1024 * 1024;

/// Decoder limits. Header dimensions beyond these are rejected before any
/// pixel buffer is allocated.
pub const MAX_PANORAMA_SIDE: u32 = 32768;
pub const MAX_DECODE_BYTES: u64 = 1024 * 1024 * 1024;

// 等距柱状投影的常规要求，不满足时只记警告
pub const MIN_ASPECT_RATIO: f32 = 1.8;
pub const MAX_ASPECT_RATIO: f32 = 2.2;
pub const MIN_PANORAMA_WIDTH: u32 = 2048;
pub const MIN_PANORAMA_HEIGHT: u32 = 1024;

#[derive(Clone)]
pub enum PanoramaSource {
    Url(String),
    File(PathBuf),
    Bitmap(Arc<RgbaImage>),
}

impl PanoramaSource {
    /// `http(s)://` goes to the network, `file://` and bare paths to disk.
    pub fn parse(s: &str) -> Self {
        let s = s.trim();
        let lower = s.to_ascii_lowercase();
        if lower.starts_with("http://") || lower.starts_with("https://") {
            PanoramaSource::Url(s.to_string())
        } else if lower.starts_with("file://") {
            PanoramaSource::File(PathBuf::from(&s["file://".len()..]))
        } else {
            PanoramaSource::File(PathBuf::from(s))
        }
    }
}

impl Default for PanoramaSource {
    fn default() -> Self {
        PanoramaSource::Url(DEFAULT_PANORAMA_URL.to_string())
    }
}

impl fmt::Debug for PanoramaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanoramaSource::Url(u) => f.debug_tuple("Url").field(u).finish(),
            PanoramaSource::File(p) => f.debug_tuple("File").field(p).finish(),
            PanoramaSource::Bitmap(img) => write!(f, "Bitmap({}x{})", img.width(), img.height()),
        }
    }
}

impl fmt::Display for PanoramaSource {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanoramaSource::Url(u) => f.write_str(u),
            PanoramaSource::File(p) => write!(f, "{}", p.display()),
            PanoramaSource::Bitmap(img) => write!(f, "<bitmap {}x{}>", img.width(), img.height()),
        }
    }
}

pub type LoadOutcome = Result<Arc<RgbaImage>, ViewerError>;

/// Sending half of a load. Consumed by `complete`.
pub struct LoadCompleter {
    tx: Sender<LoadOutcome>,
    alive: Arc<AtomicBool>,
}

impl LoadCompleter {
    pub fn is_mounted(&self) -> bool {
        self.alive.load(Ordering::Acquire)
    }

    /// Delivers the outcome unless the owning viewer has been torn down.
    /// Returns whether the outcome was handed over.
    pub fn complete(self, outcome: LoadOutcome) -> bool {
        if !self.is_mounted() {
            log::debug!("viewer unmounted before panorama load finished, dropping result");
            return false;
        }
        self.tx.send(outcome).is_ok()
    }
}

/// Receiving half, owned by the viewer.
pub struct PendingLoad {
    rx: Receiver<LoadOutcome>,
    alive: Arc<AtomicBool>,
}

impl PendingLoad {
    pub fn new() -> (LoadCompleter, PendingLoad) {
        let (tx, rx) = channel();
        let alive = Arc::new(AtomicBool::new(true));
        (
            LoadCompleter {
                tx,
                alive: alive.clone(),
            },
            PendingLoad { rx, alive },
        )
    }

    /// Non-blocking poll. A completer dropped without an outcome counts as a failure.
    pub fn poll(&self) -> Option<LoadOutcome> {
        match self.rx.try_recv() {
            Ok(outcome) => Some(outcome),
            Err(TryRecvError::Empty) => None,
            Err(TryRecvError::Disconnected) => Some(Err(ViewerError::LoaderStopped)),
        }
    }

    /// Clears the mounted flag so a late completion is discarded.
    pub fn cancel(self) {
        self.alive.store(false, Ordering::Release);
    }
}

impl Drop for PendingLoad {
    fn drop(&mut self) {
        self.alive.store(false, Ordering::Release);
    }
}

/// Starts a background load; the result arrives through `completer`.
pub fn spawn_load(source: PanoramaSource, completer: LoadCompleter) {
    let spawned = thread::Builder::new()
        .name("panorama-loader".into())
        .spawn(move || {
            log::info!(
                "{}",
                crate::i18n::tr_with("log.loading_panorama", &[("source", source.to_string())])
            );
            let outcome = load_blocking(&source);
            match &outcome {
                Ok(img) => log::info!(
                    "{}",
                    crate::i18n::tr_with(
                        "log.panorama_loaded",
                        &[("w", img.width().to_string()), ("h", img.height().to_string())]
                    )
                ),
                Err(e) => log::error!("panorama load failed ({source}): {e}"),
            }
            completer.complete(outcome);
        });

    // 线程创建失败时 completer 已随闭包一起被丢弃，viewer 会在下一帧看到 Disconnected
    if let Err(e) = spawned {
        log::error!("could not start panorama loader thread: {e}");
    }
}

pub fn load_blocking(source: &PanoramaSource) -> LoadOutcome {
    let img = match source {
        PanoramaSource::Bitmap(img) => img.clone(),
        PanoramaSource::File(path) => {
            let file = std::fs::File::open(path).map_err(|source| ViewerError::Open {
                path: path.clone(),
                source,
            })?;
            Arc::new(decode(BufReader::new(file))?)
        }
        PanoramaSource::Url(url) => {
            let bytes = fetch(url)?;
            Arc::new(decode(Cursor::new(bytes))?)
        }
    };

    if img.width() == 0 || img.height() == 0 {
        return Err(ViewerError::EmptyImage);
    }
    for warning in inspect_panorama(img.width(), img.height()) {
        log::warn!("{source}: {warning}");
    }
    Ok(img)
}

/// Ways a decoded image falls short of a good equirectangular panorama.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum PanoramaWarning {
    AspectRatio(f32),
    LowResolution { width: u32, height: u32 },
}

impl fmt::Display for PanoramaWarning {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            PanoramaWarning::AspectRatio(r) => write!(
                f,
                "aspect ratio {r:.2}:1 is not close to 2:1, the panorama will look stretched"
            ),
            PanoramaWarning::LowResolution { width, height } => write!(
                f,
                "{width}x{height} is below {MIN_PANORAMA_WIDTH}x{MIN_PANORAMA_HEIGHT}, the panorama will look blurry"
            ),
        }
    }
}

pub fn inspect_panorama(width: u32, height: u32) -> Vec<PanoramaWarning> {
    let mut warnings = Vec::new();
    if height == 0 {
        return warnings;
    }
    let ratio = width as f32 / height as f32;
    if !(MIN_ASPECT_RATIO..=MAX_ASPECT_RATIO).contains(&ratio) {
        warnings.push(PanoramaWarning::AspectRatio(ratio));
    }
    if width < MIN_PANORAMA_WIDTH || height < MIN_PANORAMA_HEIGHT {
        warnings.push(PanoramaWarning::LowResolution { width, height });
    }
    warnings
}

fn fetch(url: &str) -> Result<Vec<u8>, ViewerError> {
    let resp = ureq::get(url).call().map_err(|e| ViewerError::Fetch {
        url: url.to_string(),
        source: Box::new(e),
    })?;

    read_capped(resp.into_reader(), url, MAX_DOWNLOAD_BYTES)
}

/// Reads the whole body, failing instead of truncating when it exceeds `limit`.
fn read_capped(reader: impl Read, url: &str, limit: u64) -> Result<Vec<u8>, ViewerError> {
    let mut bytes = Vec::new();
    reader
        .take(limit.saturating_add(1))
        .read_to_end(&mut bytes)
        .map_err(|source| ViewerError::Read {
            url: url.to_string(),
            source,
        })?;
    if bytes.len() as u64 > limit {
        return Err(ViewerError::TooLarge {
            url: url.to_string(),
            limit,
        });
    }
    Ok(bytes)
}

fn decode<R: std::io::BufRead + std::io::Seek>(reader: R) -> Result<RgbaImage, ViewerError> {
    let mut r = ImageReader::new(reader).with_guessed_format().map_err(image::ImageError::IoError)?;
    let mut limits = Limits::default();
    limits.max_image_width = Some(MAX_PANORAMA_SIDE);
    limits.max_image_height = Some(MAX_PANORAMA_SIDE);
    limits.max_alloc = Some(MAX_DECODE_BYTES);
    r.limits(limits);
    let img = r.decode()?;
    let (w, h) = img.dimensions();
    log::debug!("decoded panorama {w}x{h}");
    Ok(img.to_rgba8())
}

#[cfg(test)]
mod tests {
    use super::*;
    use image::Rgba;

    #[test]
    fn parse_sources() {
        assert!(matches!(PanoramaSource::parse("https://example.com/p.jpg"), PanoramaSource::Url(_)));
        assert!(matches!(PanoramaSource::parse("HTTP://example.com/p.jpg"), PanoramaSource::Url(_)));

        match PanoramaSource::parse("file:///tmp/pano.png") {
            PanoramaSource::File(p) => assert_eq!(p, PathBuf::from("/tmp/pano.png")),
            other => panic!("unexpected {other:?}"),
        }
        match PanoramaSource::parse("  rooms/salon.jpg ") {
            PanoramaSource::File(p) => assert_eq!(p, PathBuf::from("rooms/salon.jpg")),
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn loads_png_from_disk() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("pano.png");
        RgbaImage::from_pixel(8, 4, Rgba([10, 20, 30, 255])).save(&path).unwrap();

        let img = load_blocking(&PanoramaSource::File(path)).unwrap();
        assert_eq!(img.dimensions(), (8, 4));
        assert_eq!(img.get_pixel(3, 2), &Rgba([10, 20, 30, 255]));
    }

    #[test]
    fn missing_file_is_a_load_failure() {
        let err = load_blocking(&PanoramaSource::File("/definitely/not/here.jpg".into())).unwrap_err();
        assert_eq!(err.kind(), crate::error::ErrorKind::LoadFailure);
    }

    #[test]
    fn garbage_bytes_fail_to_decode() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("broken.jpg");
        std::fs::write(&path, b"not an image at all").unwrap();

        let err = load_blocking(&PanoramaSource::File(path)).unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)), "{err:?}");
    }

    #[test]
    fn empty_bitmap_is_rejected() {
        let src = PanoramaSource::Bitmap(Arc::new(RgbaImage::new(0, 0)));
        assert!(matches!(load_blocking(&src), Err(ViewerError::EmptyImage)));
    }

    #[test]
    fn completion_after_cancel_is_dropped() {
        let (completer, pending) = PendingLoad::new();
        pending.cancel();
        assert!(!completer.is_mounted());
        let img = Arc::new(RgbaImage::new(2, 1));
        assert!(!completer.complete(Ok(img)));
    }

    #[test]
    fn dropped_completer_surfaces_as_failure() {
        let (completer, pending) = PendingLoad::new();
        assert!(pending.poll().is_none());
        drop(completer);
        assert!(matches!(pending.poll(), Some(Err(ViewerError::LoaderStopped))));
    }

    /// PNG chunk with its CRC-32 trailer.
    fn png_chunk(kind: &[u8; 4], data: &[u8]) -> Vec<u8> {
        let mut crc = 0xffff_ffffu32;
        for &b in kind.iter().chain(data) {
            crc ^= b as u32;
            for _ in 0..8 {
                crc = if crc & 1 != 0 { (crc >> 1) ^ 0xedb8_8320 } else { crc >> 1 };
            }
        }
        let mut out = (data.len() as u32).to_be_bytes().to_vec();
        out.extend_from_slice(kind);
        out.extend_from_slice(data);
        out.extend_from_slice(&(!crc).to_be_bytes());
        out
    }

    #[test]
    fn oversized_header_is_a_decode_error() {
        let mut ihdr = Vec::new();
        ihdr.extend_from_slice(&40_000u32.to_be_bytes());
        ihdr.extend_from_slice(&40_000u32.to_be_bytes());
        ihdr.extend_from_slice(&[8, 6, 0, 0, 0]); // 8-bit RGBA

        let mut png = b"\x89PNG\r\n\x1a\n".to_vec();
        png.extend(png_chunk(b"IHDR", &ihdr));
        png.extend(png_chunk(b"IDAT", &[]));
        png.extend(png_chunk(b"IEND", &[]));

        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("huge.png");
        std::fs::write(&path, &png).unwrap();

        let err = load_blocking(&PanoramaSource::File(path)).unwrap_err();
        assert!(matches!(err, ViewerError::Decode(_)), "{err:?}");
        assert_eq!(err.kind(), crate::error::ErrorKind::LoadFailure);
    }

    #[test]
    fn body_over_the_cap_is_too_large() {
        let body = vec![7u8; 64];
        let err = read_capped(Cursor::new(&body), "https://example.com/p.jpg", 63).unwrap_err();
        assert!(matches!(err, ViewerError::TooLarge { limit: 63, .. }), "{err:?}");

        let ok = read_capped(Cursor::new(&body), "https://example.com/p.jpg", 64).unwrap();
        assert_eq!(ok.len(), 64);
    }

    #[test]
    fn equirectangular_4k_has_no_warnings() {
        assert!(inspect_panorama(4096, 2048).is_empty());
        assert!(inspect_panorama(2048, 1024).is_empty());
    }

    #[test]
    fn photo_proportions_and_small_sizes_are_flagged() {
        // 1140x760 的普通照片：比例不对，分辨率也不够
        let w = inspect_panorama(1140, 760);
        assert!(matches!(w[0], PanoramaWarning::AspectRatio(r) if (r - 1.5).abs() < 1e-3));
        assert_eq!(w[1], PanoramaWarning::LowResolution { width: 1140, height: 760 });

        assert_eq!(
            inspect_panorama(1600, 800),
            vec![PanoramaWarning::LowResolution { width: 1600, height: 800 }]
        );
        assert!(matches!(&inspect_panorama(8000, 2000)[..], [PanoramaWarning::AspectRatio(_)]));
    }

    #[test]
    fn spawned_load_delivers_bitmap() {
        let (completer, pending) = PendingLoad::new();
        spawn_load(PanoramaSource::Bitmap(Arc::new(RgbaImage::new(4, 2))), completer);

        let outcome = loop {
            if let Some(o) = pending.poll() {
                break o;
            }
            thread::sleep(std::time::Duration::from_millis(5));
        };
        assert_eq!(outcome.unwrap().dimensions(), (4, 2));
    }
}
