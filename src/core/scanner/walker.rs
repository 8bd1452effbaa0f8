//! Directory walking implementation using walkdir.

use super::{filter::ImageFilter, ImageFile, ImageScanner, ScanResult};
use crate::error::ScanError;
use crate::events::{null_sender, Event, EventSender, ScanEvent, ScanProgress};
use std::path::{Path, PathBuf};
use tracing::debug;
use walkdir::{DirEntry, WalkDir};

/// Configuration for the directory scanner
#[derive(Debug, Clone, Default)]
pub struct ScanConfig {
    pub follow_symlinks: bool,
    /// Include hidden files and directories
    pub include_hidden: bool,
    /// Maximum directory depth (None = unlimited)
    pub max_depth: Option<usize>,
    /// Custom extensions to include (None = use defaults)
    pub extensions: Option<Vec<String>>,
}

/// Scanner implementation using the walkdir crate
pub struct WalkDirScanner {
    config: ScanConfig,
    filter: ImageFilter,
}

impl WalkDirScanner {
    pub fn new(config: ScanConfig) -> Self {
        let mut filter = ImageFilter::new().with_hidden(config.include_hidden);

        if let Some(ref extensions) = config.extensions {
            filter = filter.with_extensions(extensions.clone());
        }

        Self { config, filter }
    }

    fn is_hidden_dir(&self, entry: &DirEntry) -> bool {
        entry.depth() > 0
            && entry.file_type().is_dir()
            && entry
                .file_name()
                .to_str()
                .map(|name| name.starts_with('.'))
                .unwrap_or(false)
    }

    fn scan_directory(
        &self,
        root: &Path,
        events: &EventSender,
    ) -> Result<(Vec<ImageFile>, Vec<ScanError>), ScanError> {
        if !root.is_dir() {
            return Err(ScanError::DirectoryNotFound {
                path: root.to_path_buf(),
            });
        }

        let mut images = Vec::new();
        let mut errors = Vec::new();
        let mut directories_scanned = 0;

        let mut walker = WalkDir::new(root)
            .follow_links(self.config.follow_symlinks)
            .sort_by_file_name();

        if let Some(depth) = self.config.max_depth {
            walker = walker.max_depth(depth);
        }

        let entries = walker
            .into_iter()
            .filter_entry(|entry| self.config.include_hidden || !self.is_hidden_dir(entry));

        for entry_result in entries {
            let entry = match entry_result {
                Ok(entry) => entry,
                Err(e) => {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_default();
                    let error = match e.io_error().map(|io| io.kind()) {
                        Some(std::io::ErrorKind::PermissionDenied) => {
                            ScanError::PermissionDenied { path: path.clone() }
                        }
                        _ => ScanError::ReadDirectory {
                            path: path.clone(),
                            source: std::io::Error::other(e.to_string()),
                        },
                    };

                    events.send(Event::Scan(ScanEvent::Error {
                        path,
                        message: error.to_string(),
                    }));
                    errors.push(error);
                    continue;
                }
            };

            let path = entry.path();

            if entry.file_type().is_dir() {
                directories_scanned += 1;
                events.send(Event::Scan(ScanEvent::Progress(ScanProgress {
                    directories_scanned,
                    images_found: images.len(),
                    current_path: path.to_path_buf(),
                })));
                continue;
            }

            if !self.filter.should_include(path) {
                continue;
            }

            match entry.metadata() {
                Ok(metadata) => {
                    events.send(Event::Scan(ScanEvent::ImageFound {
                        path: path.to_path_buf(),
                    }));
                    images.push(ImageFile {
                        path: path.to_path_buf(),
                        size: metadata.len(),
                        format: self.filter.format_of(path),
                    });
                }
                Err(e) => {
                    let error = ScanError::ReadDirectory {
                        path: path.to_path_buf(),
                        source: std::io::Error::other(e.to_string()),
                    };
                    events.send(Event::Scan(ScanEvent::Error {
                        path: path.to_path_buf(),
                        message: error.to_string(),
                    }));
                    errors.push(error);
                }
            }
        }

        debug!(
            root = %root.display(),
            directories = directories_scanned,
            images = images.len(),
            "Scanned directory"
        );

        Ok((images, errors))
    }
}

impl ImageScanner for WalkDirScanner {
    fn scan(&self, paths: &[PathBuf]) -> Result<ScanResult, ScanError> {
        self.scan_with_events(paths, &null_sender())
    }

    fn scan_with_events(
        &self,
        paths: &[PathBuf],
        events: &EventSender,
    ) -> Result<ScanResult, ScanError> {
        events.send(Event::Scan(ScanEvent::Started {
            paths: paths.to_vec(),
        }));

        let mut all_images = Vec::new();
        let mut all_errors = Vec::new();

        for path in paths {
            match self.scan_directory(path, events) {
                Ok((images, errors)) => {
                    all_images.extend(images);
                    all_errors.extend(errors);
                }
                Err(e) => all_errors.push(e),
            }
        }

        events.send(Event::Scan(ScanEvent::Completed {
            total_images: all_images.len(),
        }));

        Ok(ScanResult {
            images: all_images,
            errors: all_errors,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use super::super::ImageFormat;
    use std::fs::{self, File};
    use tempfile::TempDir;

    fn touch(dir: &Path, name: &str) -> PathBuf {
        let path = dir.join(name);
        File::create(&path).unwrap();
        path
    }

    fn scan(dir: &TempDir, config: ScanConfig) -> ScanResult {
        WalkDirScanner::new(config)
            .scan(&[dir.path().to_path_buf()])
            .unwrap()
    }

    #[test]
    fn empty_directory_finds_nothing() {
        let dir = TempDir::new().unwrap();
        let result = scan(&dir, ScanConfig::default());

        assert!(result.images.is_empty());
        assert!(result.errors.is_empty());
    }

    #[test]
    fn finds_images_and_skips_other_files() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "home-dark.png");
        touch(dir.path(), "home-light.jpg");
        touch(dir.path(), "notes.txt");

        let result = scan(&dir, ScanConfig::default());

        assert_eq!(result.images.len(), 2);
        let formats: Vec<_> = result.images.iter().map(|i| i.format).collect();
        assert!(formats.contains(&ImageFormat::Png));
        assert!(formats.contains(&ImageFormat::Jpeg));
    }

    #[test]
    fn results_are_sorted_by_name() {
        let dir = TempDir::new().unwrap();
        touch(dir.path(), "c.png");
        touch(dir.path(), "a.png");
        touch(dir.path(), "b.png");

        let result = scan(&dir, ScanConfig::default());
        let names: Vec<_> = result.images.iter().map(|i| i.file_name()).collect();

        assert_eq!(names, vec!["a.png", "b.png", "c.png"]);
    }

    #[test]
    fn traverses_nested_directories() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("ios");
        fs::create_dir(&nested).unwrap();
        touch(dir.path(), "root.png");
        touch(&nested, "nested.png");

        assert_eq!(scan(&dir, ScanConfig::default()).images.len(), 2);
    }

    #[test]
    fn max_depth_limits_traversal() {
        let dir = TempDir::new().unwrap();
        let nested = dir.path().join("ios");
        fs::create_dir(&nested).unwrap();
        touch(dir.path(), "root.png");
        touch(&nested, "nested.png");

        let config = ScanConfig {
            max_depth: Some(1),
            ..Default::default()
        };
        assert_eq!(scan(&dir, config).images.len(), 1);
    }

    #[test]
    fn hidden_directories_are_skipped_by_default() {
        let dir = TempDir::new().unwrap();
        let hidden = dir.path().join(".thumbnails");
        fs::create_dir(&hidden).unwrap();
        touch(&hidden, "cached.png");
        touch(dir.path(), ".hidden.png");
        touch(dir.path(), "visible.png");

        assert_eq!(scan(&dir, ScanConfig::default()).images.len(), 1);

        let config = ScanConfig {
            include_hidden: true,
            ..Default::default()
        };
        assert_eq!(scan(&dir, config).images.len(), 3);
    }

    #[test]
    fn missing_directory_is_recorded_as_error() {
        let scanner = WalkDirScanner::new(ScanConfig::default());
        let result = scanner
            .scan(&[PathBuf::from("/nonexistent/screens/12345")])
            .unwrap();

        assert!(result.images.is_empty());
        assert!(matches!(
            result.errors.first(),
            Some(ScanError::DirectoryNotFound { .. })
        ));
    }
}
