use std::path::{Path, PathBuf};

/// 載入 env 檔，例如 `GOOGLE_API_KEY="..."`。
/// 未指定路徑時尋找工作目錄（或上層目錄）中的 `.env`；已存在的環境變數不會被覆寫。
pub fn load_dotenv(env_file: Option<&Path>) -> Option<PathBuf> {
    let result = match env_file {
        Some(path) => dotenv::from_path(path).map(|()| path.to_path_buf()),
        None => dotenv::dotenv(),
    };

    match result {
        Ok(path) => {
            tracing::debug!("Loaded environment from {}", path.display());
            Some(path)
        }
        Err(e) if e.not_found() && env_file.is_none() => None,
        Err(e) => {
            tracing::warn!("⚠️ Ignoring env file: {}", e);
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_env_file_sets_variable() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "AA_DOTENV_TEST_KEY=\"YOUR_API_KEY_HERE\"").unwrap();

        assert_eq!(load_dotenv(Some(file.path())), Some(file.path().to_path_buf()));
        assert_eq!(
            std::env::var("AA_DOTENV_TEST_KEY").unwrap(),
            "YOUR_API_KEY_HERE"
        );
        std::env::remove_var("AA_DOTENV_TEST_KEY");
    }

    #[test]
    fn test_missing_env_file() {
        assert!(load_dotenv(Some(Path::new("/definitely/not/here/.env"))).is_none());
    }
}
