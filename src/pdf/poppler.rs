//! Poppler-based rasterizer (`pdftoppm`)

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tokio::process::Command;

use super::{PageImage, PageRasterizer, RasterizeError};

/// Output file prefix inside the scratch directory
const PAGE_PREFIX: &str = "page";

/// Renders pages by running poppler's `pdftoppm`
pub struct PopplerRasterizer {
    /// Directory containing the poppler binaries; `None` uses `$PATH`
    poppler_path: Option<PathBuf>,
    dpi: u32,
}

impl PopplerRasterizer {
    pub fn new(poppler_path: Option<PathBuf>, dpi: u32) -> Self {
        Self { poppler_path, dpi }
    }

    fn binary(&self) -> PathBuf {
        match &self.poppler_path {
            Some(dir) => dir.join("pdftoppm"),
            None => PathBuf::from("pdftoppm"),
        }
    }
}

#[async_trait]
impl PageRasterizer for PopplerRasterizer {
    async fn rasterize(&self, pdf_data: &[u8]) -> Result<Vec<PageImage>, RasterizeError> {
        let scratch = tempfile::Builder::new().prefix("rasterize_").tempdir()?;
        let input = scratch.path().join("input.pdf");
        tokio::fs::write(&input, pdf_data).await?;

        let binary = self.binary();
        let output = Command::new(&binary)
            .arg("-png")
            .arg("-r")
            .arg(self.dpi.to_string())
            .arg(&input)
            .arg(scratch.path().join(PAGE_PREFIX))
            .output()
            .await
            .map_err(|e| {
                RasterizeError::NotAvailable(format!("Failed to run {}: {}", binary.display(), e))
            })?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            return Err(RasterizeError::RenderError(format!(
                "pdftoppm failed: {}",
                stderr.trim()
            )));
        }

        let mut pages = Vec::new();
        for (page, path) in collect_page_files(scratch.path()).await? {
            let data = tokio::fs::read(&path).await?;
            pages.push(PageImage { page, data });
        }

        tracing::debug!(pages = pages.len(), "Rasterized PDF with pdftoppm");
        Ok(pages)
    }
}

/// List `page-N.png` files in page order.
///
/// pdftoppm zero-pads page numbers depending on the page count, so ordering
/// is done on the parsed number rather than the file name.
async fn collect_page_files(dir: &Path) -> Result<Vec<(usize, PathBuf)>, RasterizeError> {
    let mut files = Vec::new();
    let mut entries = tokio::fs::read_dir(dir).await?;

    while let Some(entry) = entries.next_entry().await? {
        let path = entry.path();
        if let Some(page) = page_number(&path) {
            files.push((page, path));
        }
    }

    files.sort_by_key(|(page, _)| *page);
    Ok(files)
}

fn page_number(path: &Path) -> Option<usize> {
    if path.extension()?.to_str()? != "png" {
        return None;
    }
    let stem = path.file_stem()?.to_str()?;
    let number = stem.strip_prefix(PAGE_PREFIX)?.strip_prefix('-')?;
    number.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_page_number() {
        assert_eq!(page_number(Path::new("/tmp/x/page-1.png")), Some(1));
        assert_eq!(page_number(Path::new("/tmp/x/page-012.png")), Some(12));
        assert_eq!(page_number(Path::new("/tmp/x/input.pdf")), None);
        assert_eq!(page_number(Path::new("/tmp/x/page-a.png")), None);
    }

    #[tokio::test]
    async fn test_collect_page_files_orders_numerically() {
        let temp_dir = TempDir::new().unwrap();
        for name in ["page-10.png", "page-2.png", "page-1.png", "input.pdf"] {
            tokio::fs::write(temp_dir.path().join(name), b"x").await.unwrap();
        }

        let files = collect_page_files(temp_dir.path()).await.unwrap();
        let pages: Vec<usize> = files.iter().map(|(page, _)| *page).collect();
        assert_eq!(pages, vec![1, 2, 10]);
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let rasterizer = PopplerRasterizer::new(Some(PathBuf::from("/nonexistent/poppler")), 150);
        let result = rasterizer.rasterize(b"%PDF-1.4").await;
        assert!(matches!(result, Err(RasterizeError::NotAvailable(_))));
    }
}
