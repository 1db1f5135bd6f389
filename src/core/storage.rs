use crate::core::locator::{VideoReference, sanitize_video_id};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::fs as std_fs;
use std::path::{Path, PathBuf};
use tokio::fs;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum FileType {
    Transcript,
    Summary,
    Comments,
    Thumbnail,
}

struct Layout {
    file_type: FileType,
    dir: &'static str,
    prefix: &'static str,
    suffix: &'static str,
}

const LAYOUTS: [Layout; 4] = [
    Layout {
        file_type: FileType::Transcript,
        dir: "transcripts",
        prefix: "transcript_",
        suffix: ".txt",
    },
    Layout {
        file_type: FileType::Summary,
        dir: "summaries",
        prefix: "summary_",
        suffix: ".md",
    },
    Layout {
        file_type: FileType::Comments,
        dir: "comments",
        prefix: "comments_",
        suffix: ".json",
    },
    Layout {
        file_type: FileType::Thumbnail,
        dir: "thumbnails",
        prefix: "",
        suffix: "_thumbnail.jpg",
    },
];

impl FileType {
    fn layout(self) -> &'static Layout {
        match self {
            FileType::Transcript => &LAYOUTS[0],
            FileType::Summary => &LAYOUTS[1],
            FileType::Comments => &LAYOUTS[2],
            FileType::Thumbnail => &LAYOUTS[3],
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            FileType::Transcript => "Transcript",
            FileType::Summary => "Summary",
            FileType::Comments => "Comments",
            FileType::Thumbnail => "Thumbnail",
        }
    }

    /// Whether the file can be shown in a text viewer.
    pub fn is_text(self) -> bool {
        !matches!(self, FileType::Thumbnail)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FileEntry {
    pub path: PathBuf,
    pub name: String,
    pub file_type: FileType,
    pub size: u64,
    pub modified: std::time::SystemTime,
}

impl FileEntry {
    pub fn video_id(&self) -> Option<String> {
        let layout = self.file_type.layout();
        self.name
            .strip_prefix(layout.prefix)
            .and_then(|rest| rest.strip_suffix(layout.suffix))
            .map(str::to_string)
    }
}

/// Saved transcripts, summaries, comment exports and thumbnails under one root.
#[derive(Debug, Clone)]
pub struct StorageService {
    root: PathBuf,
}

impl Default for StorageService {
    fn default() -> Self {
        Self::new(".")
    }
}

impl StorageService {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    fn dir(&self, file_type: FileType) -> PathBuf {
        self.root.join(file_type.layout().dir)
    }

    fn ensure_directories(&self) -> Result<()> {
        for layout in &LAYOUTS {
            ensure_directory(&self.dir(layout.file_type))?;
        }
        Ok(())
    }

    fn path_for(&self, file_type: FileType, video: &VideoReference) -> Result<PathBuf> {
        let sanitized = sanitize_video_id(video.as_str())?;
        let layout = file_type.layout();
        Ok(self
            .dir(file_type)
            .join(format!("{}{sanitized}{}", layout.prefix, layout.suffix)))
    }

    async fn write(&self, file_type: FileType, video: &VideoReference, content: &[u8]) -> Result<PathBuf> {
        self.ensure_directories()?;
        let path = self.path_for(file_type, video)?;
        fs::write(&path, content).await?;
        Ok(path)
    }

    pub fn transcript_exists(&self, video: &VideoReference) -> bool {
        self.path_for(FileType::Transcript, video)
            .map(|path| path.exists())
            .unwrap_or(false)
    }

    pub async fn save_transcript(&self, video: &VideoReference, lines: &[String]) -> Result<PathBuf> {
        self.write(FileType::Transcript, video, lines.join("\n").as_bytes())
            .await
    }

    pub async fn load_transcript(&self, video: &VideoReference) -> Result<String> {
        let path = self.path_for(FileType::Transcript, video)?;
        let content = fs::read_to_string(path).await?;
        Ok(content)
    }

    pub async fn save_summary(&self, video: &VideoReference, content: &str) -> Result<PathBuf> {
        self.write(FileType::Summary, video, content.as_bytes()).await
    }

    pub async fn save_comments<T: Serialize>(&self, video: &VideoReference, export: &T) -> Result<PathBuf> {
        let json = serde_json::to_vec_pretty(export)?;
        self.write(FileType::Comments, video, &json).await
    }

    pub async fn save_thumbnail(&self, video: &VideoReference, image: &[u8]) -> Result<PathBuf> {
        self.write(FileType::Thumbnail, video, image).await
    }

    /// All managed files, newest first.
    pub fn list_files(&self) -> Result<Vec<FileEntry>> {
        self.ensure_directories()?;
        let mut files = Vec::new();

        for layout in &LAYOUTS {
            let Ok(entries) = std_fs::read_dir(self.dir(layout.file_type)) else {
                continue;
            };

            for entry in entries {
                let entry = entry?;
                let path = entry.path();

                if let Some(name) = path.file_name().and_then(|n| n.to_str())
                    && name.starts_with(layout.prefix)
                    && name.ends_with(layout.suffix)
                {
                    let metadata = entry.metadata()?;
                    files.push(FileEntry {
                        name: name.to_string(),
                        path,
                        file_type: layout.file_type,
                        size: metadata.len(),
                        modified: metadata.modified()?,
                    });
                }
            }
        }

        files.sort_by(|a, b| b.modified.cmp(&a.modified));

        Ok(files)
    }

    pub fn delete_file(&self, path: &Path) -> Result<()> {
        self.ensure_directories()?;
        self.ensure_managed_path(path)?;
        std_fs::remove_file(path)?;
        Ok(())
    }

    fn ensure_managed_path(&self, path: &Path) -> Result<()> {
        let canonical = path
            .canonicalize()
            .map_err(|_| Error::custom("Target file does not exist or cannot be resolved"))?;

        let allowed = LAYOUTS.iter().any(|layout| {
            self.dir(layout.file_type)
                .canonicalize()
                .map(|base| canonical.starts_with(base))
                .unwrap_or(false)
        });

        if !allowed {
            return Err(Error::custom(
                "Refusing to operate on files outside managed directories",
            ));
        }

        Ok(())
    }
}

fn ensure_directory(path: &Path) -> Result<()> {
    std_fs::create_dir_all(path)?;

    #[cfg(unix)]
    {
        use std::os::unix::fs::PermissionsExt;

        let metadata = std_fs::metadata(path)?;
        let mut permissions = metadata.permissions();
        if permissions.mode() & 0o777 != 0o700 {
            permissions.set_mode(0o700);
            std_fs::set_permissions(path, permissions)?;
        }
    }

    Ok(())
}
