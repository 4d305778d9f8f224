use crate::domain::ports::Storage;
use crate::utils::error::Result;
use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
pub struct LocalStorage {
    base_path: String,
}

impl LocalStorage {
    pub fn new(base_path: String) -> Self {
        Self { base_path }
    }

    fn resolve(&self, path: &str) -> PathBuf {
        Path::new(&self.base_path).join(path)
    }
}

impl Storage for LocalStorage {
    async fn read_file(&self, path: &str) -> Result<Vec<u8>> {
        let data = fs::read(self.resolve(path))?;
        Ok(data)
    }

    async fn write_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(full_path, data)?;
        Ok(())
    }

    async fn append_file(&self, path: &str, data: &[u8]) -> Result<()> {
        let full_path = self.resolve(path);

        if let Some(parent) = full_path.parent() {
            fs::create_dir_all(parent)?;
        }

        let mut file = fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(full_path)?;
        file.write_all(data)?;
        Ok(())
    }

    async fn list_files(&self, dir: &str, extension: &str) -> Result<Vec<String>> {
        let full_dir = self.resolve(dir);
        if !full_dir.is_dir() {
            return Ok(Vec::new());
        }

        let mut files = Vec::new();
        for entry in fs::read_dir(&full_dir)? {
            let entry = entry?;
            if !entry.file_type()?.is_file() {
                continue;
            }
            let name = entry.file_name().to_string_lossy().to_string();
            // 隱藏檔（例如上架紀錄）不算商品
            if name.starts_with('.') {
                continue;
            }
            let matches = Path::new(&name)
                .extension()
                .and_then(|ext| ext.to_str())
                .map(|ext| ext.eq_ignore_ascii_case(extension))
                .unwrap_or(false);
            if matches {
                files.push(format!("{}/{}", dir.trim_end_matches('/'), name));
            }
        }

        files.sort();
        Ok(files)
    }

    async fn exists(&self, path: &str) -> bool {
        self.resolve(path).exists()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_write_creates_parent_directories() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage
            .write_file("output/prod_1/ebook.md", b"# Title")
            .await
            .unwrap();

        assert!(storage.exists("output/prod_1/ebook.md").await);
        assert_eq!(
            storage.read_file("output/prod_1/ebook.md").await.unwrap(),
            b"# Title".to_vec()
        );
    }

    #[tokio::test]
    async fn test_append_accumulates_lines() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage.append_file("logs/api.log", b"one\n").await.unwrap();
        storage.append_file("logs/api.log", b"two\n").await.unwrap();

        let content = storage.read_file("logs/api.log").await.unwrap();
        assert_eq!(String::from_utf8(content).unwrap(), "one\ntwo\n");
    }

    #[tokio::test]
    async fn test_list_files_filters_extension_and_hidden_files() {
        let temp_dir = TempDir::new().unwrap();
        let storage = LocalStorage::new(temp_dir.path().to_str().unwrap().to_string());

        storage.write_file("products/b.json", b"{}").await.unwrap();
        storage.write_file("products/a.json", b"{}").await.unwrap();
        storage.write_file("products/notes.txt", b"x").await.unwrap();
        storage
            .write_file("products/.uploaded.json", b"{}")
            .await
            .unwrap();

        let files = storage.list_files("products", "json").await.unwrap();
        assert_eq!(files, vec!["products/a.json", "products/b.json"]);

        let missing = storage.list_files("does_not_exist", "json").await.unwrap();
        assert!(missing.is_empty());
    }
}
