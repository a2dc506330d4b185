//! Writes extracted posts to disk as plain text.
//!
//! Two layouts share one per-post renderer: a single file with a run header,
//! or a directory holding one `NNN_slug.txt` file per post.

mod filename;

use std::fs;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use thiserror::Error;
use tracing::{debug, info, instrument};
use url::Url;

pub use filename::{
    FALLBACK_OUTPUT_NAME, collection_dir, default_output_name, ensure_txt_extension,
    post_file_name,
};

use crate::extract::ExtractedPost;
use crate::language::LanguageFilter;

const DELIMITER: &str =
    "================================================================================";

/// Errors produced while writing output.
#[derive(Debug, Error)]
pub enum OutputError {
    /// Creating or writing a file or directory failed.
    #[error("cannot write {path}: {source}")]
    Io {
        /// Path being written.
        path: PathBuf,
        /// Underlying I/O error.
        #[source]
        source: std::io::Error,
    },
}

impl OutputError {
    fn io(path: &Path, source: std::io::Error) -> Self {
        Self::Io {
            path: path.to_path_buf(),
            source,
        }
    }
}

/// Output layout.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OutputMode {
    /// Everything in the named file.
    OneFile,
    /// One file per post in a directory named after the output file's stem.
    #[default]
    PerPost,
}

/// Renders the block written for one post: a delimiter, the metadata lines,
/// a second delimiter, then the body.
#[must_use]
pub fn render_post(post: &ExtractedPost) -> String {
    let mut block = String::with_capacity(post.body_text.len() + 256);
    block.push_str(DELIMITER);
    block.push('\n');
    block.push_str(&format!("URL: {}\n", post.source_url));
    block.push_str(&format!("Title: {}\n", post.title));
    if let Some(date) = &post.published {
        block.push_str(&format!("Date: {date}\n"));
    }
    if let Some(code) = &post.language_code {
        block.push_str(&format!("Language: {code}\n"));
    }
    block.push_str(DELIMITER);
    block.push_str("\n\n");
    block.push_str(&post.body_text);
    block.push('\n');
    block
}

/// Writes a run's posts in the chosen layout.
#[derive(Debug, Clone)]
pub struct OutputWriter {
    path: PathBuf,
    mode: OutputMode,
    base_url: Url,
    language: LanguageFilter,
}

impl OutputWriter {
    /// Creates a writer. `path` is the output file name; in per-post mode the
    /// directory is derived from it.
    #[must_use]
    pub fn new(path: PathBuf, mode: OutputMode, base_url: Url, language: LanguageFilter) -> Self {
        Self {
            path,
            mode,
            base_url,
            language,
        }
    }

    /// Where the output lands: the file itself, or the per-post directory.
    #[must_use]
    pub fn destination(&self) -> PathBuf {
        match self.mode {
            OutputMode::OneFile => self.path.clone(),
            OutputMode::PerPost => collection_dir(&self.path),
        }
    }

    /// Writes every post and returns the destination path.
    ///
    /// # Errors
    ///
    /// Returns [`OutputError::Io`] when a file or directory cannot be written.
    #[instrument(skip(self, posts), fields(mode = ?self.mode, posts = posts.len()))]
    pub fn write(&self, posts: &[ExtractedPost]) -> Result<PathBuf, OutputError> {
        let destination = self.destination();
        match self.mode {
            OutputMode::OneFile => self.write_one_file(&destination, posts)?,
            OutputMode::PerPost => write_per_post(&destination, posts)?,
        }
        info!(path = %destination.display(), posts = posts.len(), "output written");
        Ok(destination)
    }

    fn header(&self, count: usize) -> String {
        format!(
            "Blog posts from: {}\nLanguage filter: {}\nGenerated: {}\nTotal posts: {count}\n\n",
            self.base_url,
            self.language,
            httpdate::fmt_http_date(SystemTime::now()),
        )
    }

    fn write_one_file(&self, path: &Path, posts: &[ExtractedPost]) -> Result<(), OutputError> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| OutputError::io(parent, e))?;
        }
        let file = fs::File::create(path).map_err(|e| OutputError::io(path, e))?;
        let mut writer = BufWriter::new(file);
        writer
            .write_all(self.header(posts.len()).as_bytes())
            .map_err(|e| OutputError::io(path, e))?;
        for post in posts {
            writer
                .write_all(render_post(post).as_bytes())
                .and_then(|()| writer.write_all(b"\n"))
                .map_err(|e| OutputError::io(path, e))?;
        }
        writer.flush().map_err(|e| OutputError::io(path, e))
    }
}

fn write_per_post(dir: &Path, posts: &[ExtractedPost]) -> Result<(), OutputError> {
    fs::create_dir_all(dir).map_err(|e| OutputError::io(dir, e))?;
    for (index, post) in posts.iter().enumerate() {
        let path = dir.join(post_file_name(index, post));
        fs::write(&path, render_post(post)).map_err(|e| OutputError::io(&path, e))?;
        debug!(path = %path.display(), "post written");
    }
    Ok(())
}
