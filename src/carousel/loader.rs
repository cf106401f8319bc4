use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};
use std::thread;

use anyhow::ensure;
use image::RgbaImage;
use log::{info, warn};

const IMAGE_EXTENSIONS: [&str; 4] = ["jpg", "jpeg", "png", "webp"];

/// A successfully decoded plane texture.
pub struct LoadedImage {
    pub index: usize,
    pub image: RgbaImage,
}

struct LoadResult {
    index: usize,
    path: PathBuf,
    result: Result<RgbaImage, image::ImageError>,
}

/// Fire-and-forget image decoding.
///
/// One short-lived thread per image; results funnel through a channel that
/// the frame loop drains. The resolved count only ever grows, and decode
/// failures count toward completion too so a broken file cannot leave the
/// carousel waiting forever.
pub struct Loader {
    rx: Receiver<LoadResult>,
    total: usize,
    resolved: usize,
    ready: bool,
}

impl Loader {
    pub fn spawn(paths: Vec<PathBuf>) -> Self {
        let total = paths.len();
        let (tx, rx) = channel();

        for (index, path) in paths.into_iter().enumerate() {
            let tx = tx.clone();
            thread::spawn(move || {
                let result = image::open(&path).map(|decoded| decoded.to_rgba8());
                // The receiver is gone when the window already closed.
                let _ = tx.send(LoadResult {
                    index,
                    path,
                    result,
                });
            });
        }

        Loader {
            rx,
            total,
            resolved: 0,
            ready: false,
        }
    }

    /// Drain decode results that arrived since the previous frame. Flips
    /// the ready flag exactly once, when the last image resolves.
    pub fn poll(&mut self) -> Vec<LoadedImage> {
        let mut loaded = Vec::new();

        while let Ok(result) = self.rx.try_recv() {
            self.resolved += 1;
            match result.result {
                Ok(image) => loaded.push(LoadedImage {
                    index: result.index,
                    image,
                }),
                Err(err) => warn!("failed to decode {}: {err}", result.path.display()),
            }
        }

        if !self.ready && self.total > 0 && self.resolved >= self.total {
            self.ready = true;
            info!("all {} images resolved", self.total);
        }

        loaded
    }

    /// True once every image has either decoded or failed.
    pub fn is_ready(&self) -> bool {
        self.ready
    }

    pub fn resolved(&self) -> usize {
        self.resolved
    }

    pub fn total(&self) -> usize {
        self.total
    }
}

/// Collect the carousel's images from `dir`, in name order.
pub fn scan_images(dir: &Path) -> anyhow::Result<Vec<PathBuf>> {
    let mut paths: Vec<PathBuf> = std::fs::read_dir(dir)
        .map_err(|err| anyhow::anyhow!("reading image directory {}: {err}", dir.display()))?
        .filter_map(|entry| entry.ok())
        .map(|entry| entry.path())
        .filter(|path| {
            path.extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| IMAGE_EXTENSIONS.contains(&ext.to_ascii_lowercase().as_str()))
                .unwrap_or(false)
        })
        .collect();

    paths.sort();

    ensure!(!paths.is_empty(), "no images found in {}", dir.display());

    Ok(paths)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs::{self, File};
    use std::time::{Duration, Instant};

    fn temp_dir(name: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("ribbon-loader-{name}-{}", std::process::id()));
        let _ = fs::remove_dir_all(&dir);
        fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn drain_until_ready(loader: &mut Loader) -> Vec<LoadedImage> {
        let deadline = Instant::now() + Duration::from_secs(10);
        let mut loaded = Vec::new();
        while !loader.is_ready() {
            assert!(Instant::now() < deadline, "loader never completed");
            loaded.extend(loader.poll());
            thread::sleep(Duration::from_millis(5));
        }
        loaded
    }

    #[test]
    fn failures_count_toward_completion() {
        let mut loader = Loader::spawn(vec![
            PathBuf::from("/nonexistent/ribbon-a.jpg"),
            PathBuf::from("/nonexistent/ribbon-b.jpg"),
        ]);

        let loaded = drain_until_ready(&mut loader);
        assert!(loaded.is_empty());
        assert_eq!(loader.resolved(), 2);
        assert!(loader.is_ready());

        // The flag latches; further polls change nothing.
        assert!(loader.poll().is_empty());
        assert!(loader.is_ready());
    }

    #[test]
    fn undecodable_files_resolve_without_images() {
        let dir = temp_dir("garbage");
        fs::write(dir.join("not-an-image.png"), b"garbage").unwrap();

        let mut loader = Loader::spawn(vec![dir.join("not-an-image.png")]);
        let loaded = drain_until_ready(&mut loader);
        assert!(loaded.is_empty());
        assert_eq!(loader.resolved(), 1);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn scan_filters_and_sorts() {
        let dir = temp_dir("scan");
        for name in ["b.webp", "a.jpg", "notes.txt", "c.PNG"] {
            File::create(dir.join(name)).unwrap();
        }

        let paths = scan_images(&dir).unwrap();
        let names: Vec<_> = paths
            .iter()
            .map(|p| p.file_name().unwrap().to_str().unwrap())
            .collect();
        assert_eq!(names, ["a.jpg", "b.webp", "c.PNG"]);

        fs::remove_dir_all(&dir).unwrap();
    }

    #[test]
    fn empty_directory_is_an_error() {
        let dir = temp_dir("empty");
        assert!(scan_images(&dir).is_err());
        fs::remove_dir_all(&dir).unwrap();
    }
}
