use crate::utils::error::{Result, TicketError};
use std::path::Path;
use url::Url;

pub trait Validate {
    fn validate(&self) -> Result<()>;
}

/// 匯入與打包共用的檔案檢查
///
/// `path` 不是既有檔案時回傳 [`TicketError::FileNotFoundError`]；
/// 副檔名 (不分大小寫) 不在 `allowed_extensions` 內時回傳 [`TicketError::InvalidFileTypeError`]
pub fn check_file<P: AsRef<Path>>(path: P, allowed_extensions: &[&str]) -> Result<()> {
    let path = path.as_ref();

    if !path.is_file() {
        return Err(TicketError::FileNotFoundError {
            path: path.to_path_buf(),
        });
    }

    let extension = path.extension().and_then(|ext| ext.to_str());
    let allowed = extension
        .map(|ext| {
            allowed_extensions
                .iter()
                .any(|candidate| candidate.eq_ignore_ascii_case(ext))
        })
        .unwrap_or(false);

    if !allowed {
        return Err(TicketError::InvalidFileTypeError {
            path: path.to_path_buf(),
            allowed: allowed_extensions.iter().map(|ext| ext.to_string()).collect(),
        });
    }

    Ok(())
}

/// 逐一檢查，遇到第一個錯誤即停止
pub fn check_files<P: AsRef<Path>>(paths: &[P], allowed_extensions: &[&str]) -> Result<()> {
    for path in paths {
        check_file(path, allowed_extensions)?;
    }
    Ok(())
}

/// 驗證連結是否為可用於 QR Code 的 http(s) 絕對網址
pub fn is_valid_link(candidate: &str) -> bool {
    match Url::parse(candidate.trim()) {
        Ok(url) => matches!(url.scheme(), "http" | "https") && url.host().is_some(),
        Err(_) => false,
    }
}

pub fn validate_path(field_name: &str, path: &str) -> Result<()> {
    if path.is_empty() {
        return Err(TicketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path cannot be empty".to_string(),
        });
    }

    if path.contains('\0') {
        return Err(TicketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: path.to_string(),
            reason: "Path contains null bytes".to_string(),
        });
    }

    Ok(())
}

pub fn validate_non_empty_string(field_name: &str, value: &str) -> Result<()> {
    if value.trim().is_empty() {
        return Err(TicketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Value cannot be empty or whitespace-only".to_string(),
        });
    }
    Ok(())
}

/// 分隔符號必須是單一 ASCII 字元 (csv 以位元組處理)
pub fn validate_delimiter(field_name: &str, value: char) -> Result<u8> {
    if !value.is_ascii() || value == '"' || value == '\n' || value == '\r' {
        return Err(TicketError::InvalidConfigValueError {
            field: field_name.to_string(),
            value: value.to_string(),
            reason: "Delimiter must be a single ASCII character other than quote or newline"
                .to_string(),
        });
    }
    Ok(value as u8)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_check_file_missing() {
        let dir = TempDir::new().unwrap();
        let err = check_file(dir.path().join("nope.csv"), &["csv"]).unwrap_err();
        assert!(matches!(err, TicketError::FileNotFoundError { .. }));
        assert_eq!(err.code(), 6);
    }

    #[test]
    fn test_check_file_directory_is_not_a_file() {
        let dir = TempDir::new().unwrap();
        let err = check_file(dir.path(), &["csv"]).unwrap_err();
        assert!(matches!(err, TicketError::FileNotFoundError { .. }));
    }

    #[test]
    fn test_check_file_extension() {
        let dir = TempDir::new().unwrap();
        let csv = dir.path().join("tickets.CSV");
        let txt = dir.path().join("tickets.txt");
        let bare = dir.path().join("tickets");
        for path in [&csv, &txt, &bare] {
            std::fs::write(path, "ticket_code\nA1\n").unwrap();
        }

        assert!(check_file(&csv, &["csv"]).is_ok());
        assert!(check_file(&txt, &["csv", "txt"]).is_ok());

        match check_file(&txt, &["csv"]).unwrap_err() {
            TicketError::InvalidFileTypeError { allowed, .. } => {
                assert_eq!(allowed, vec!["csv".to_string()])
            }
            other => panic!("unexpected error: {other:?}"),
        }
        assert!(matches!(
            check_file(&bare, &["csv"]),
            Err(TicketError::InvalidFileTypeError { .. })
        ));
    }

    #[test]
    fn test_check_files_stops_at_first_failure() {
        let dir = TempDir::new().unwrap();
        let good = dir.path().join("A1.pdf");
        std::fs::write(&good, b"%PDF").unwrap();
        let missing = dir.path().join("A2.pdf");

        assert!(check_files(&[&good], &["pdf"]).is_ok());
        assert!(matches!(
            check_files(&[&good, &missing], &["pdf"]),
            Err(TicketError::FileNotFoundError { .. })
        ));
    }

    #[test]
    fn test_is_valid_link() {
        assert!(is_valid_link("https://tickets.example.com/validate/A1"));
        assert!(is_valid_link("http://example.com"));
        assert!(!is_valid_link("N/A"));
        assert!(!is_valid_link("ftp://example.com/file"));
        assert!(!is_valid_link(""));
    }

    #[test]
    fn test_validate_delimiter() {
        assert_eq!(validate_delimiter("delimiter", ';').unwrap(), b';');
        assert_eq!(validate_delimiter("delimiter", '\t').unwrap(), b'\t');
        assert!(validate_delimiter("delimiter", '"').is_err());
        assert!(validate_delimiter("delimiter", '§').is_err());
    }

    #[test]
    fn test_validate_path() {
        assert!(validate_path("output_path", "./tickets").is_ok());
        assert!(validate_path("output_path", "").is_err());
    }
}
