//! Knowledge Reader - 단일 지식 파일 로더
//!
//! 파일 전체를 UTF-8 텍스트로 읽고, 수정 시각(mtime) 기반으로 변경을 감지합니다.
//! 파일이 없거나 읽을 수 없으면 빈 문서로 취급합니다 (에러로 전파하지 않음).

use std::path::{Path, PathBuf};
use std::time::SystemTime;

/// 지식 문서 (파일 내용 + 관측된 수정 시각)
///
/// 변경이 감지될 때마다 통째로 교체되며, 부분 수정되지 않습니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct KnowledgeDocument {
    pub text: String,
    pub modified: Option<SystemTime>,
}

impl KnowledgeDocument {
    /// 공백이 아닌 문자 수
    pub fn content_chars(&self) -> usize {
        self.text.chars().filter(|c| !c.is_whitespace()).count()
    }

    /// 답변에 쓸 만한 내용이 있는지 (공백 제외 10자 이상)
    pub fn has_content(&self) -> bool {
        self.content_chars() >= MIN_CONTENT_CHARS
    }
}

/// 지식 문서로 인정하는 최소 문자 수 (공백 제외)
pub const MIN_CONTENT_CHARS: usize = 10;

/// 지식 파일 리더
#[derive(Debug)]
pub struct KnowledgeReader {
    path: PathBuf,
    last_modified: Option<SystemTime>,
}

impl KnowledgeReader {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            last_modified: None,
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// 마지막으로 기록된 수정 시각
    pub fn last_modified(&self) -> Option<SystemTime> {
        self.last_modified
    }

    /// 현재 파일의 수정 시각 (없거나 접근 불가면 None)
    pub fn current_modified(&self) -> Option<SystemTime> {
        std::fs::metadata(&self.path)
            .and_then(|m| m.modified())
            .ok()
    }

    /// 기록된 수정 시각과 현재 수정 시각 비교
    ///
    /// 파일이 사라진 경우 현재 시각은 None 이므로,
    /// 이전에 기록이 있었다면 변경으로 판단합니다.
    pub fn has_changed(&self) -> bool {
        self.current_modified() != self.last_modified
    }

    /// 파일 전체 로드
    ///
    /// 수정 시각을 먼저 읽고 내용을 읽습니다. 그 사이 파일이 바뀌면
    /// 다음 `has_changed()` 에서 다시 감지됩니다.
    pub fn load(&mut self) -> KnowledgeDocument {
        let modified = self.current_modified();
        self.last_modified = modified;

        if modified.is_none() {
            tracing::warn!("Knowledge file not found: {}", self.path.display());
            return KnowledgeDocument::default();
        }

        match std::fs::read_to_string(&self.path) {
            Ok(text) => KnowledgeDocument { text, modified },
            Err(e) => {
                tracing::error!(
                    "Failed to read knowledge file {}: {}",
                    self.path.display(),
                    e
                );
                KnowledgeDocument {
                    text: String::new(),
                    modified,
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use tempfile::TempDir;

    #[test]
    fn test_missing_file_loads_empty() {
        let dir = TempDir::new().unwrap();
        let mut reader = KnowledgeReader::new(dir.path().join("missing.txt"));

        assert!(!reader.has_changed());
        let doc = reader.load();
        assert!(doc.text.is_empty());
        assert!(doc.modified.is_none());
        assert!(!doc.has_content());
    }

    #[test]
    fn test_load_and_change_detection() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "The capital of France is Paris.").unwrap();

        let mut reader = KnowledgeReader::new(&path);
        assert!(reader.has_changed());

        let doc = reader.load();
        assert_eq!(doc.text, "The capital of France is Paris.");
        assert!(!reader.has_changed());

        // 내용이 같아도 mtime 이 바뀌면 변경
        let file = std::fs::File::options().write(true).open(&path).unwrap();
        let later = doc.modified.unwrap() + Duration::from_secs(5);
        file.set_modified(later).unwrap();
        assert!(reader.has_changed());

        reader.load();
        assert!(!reader.has_changed());
    }

    #[test]
    fn test_deleted_file_resets_timestamp() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "Some knowledge content here.").unwrap();

        let mut reader = KnowledgeReader::new(&path);
        reader.load();
        assert!(reader.last_modified().is_some());

        std::fs::remove_file(&path).unwrap();
        assert!(reader.has_changed());

        let doc = reader.load();
        assert!(doc.text.is_empty());
        assert!(reader.last_modified().is_none());
        assert!(!reader.has_changed());
    }

    #[test]
    fn test_content_chars_ignores_whitespace() {
        let doc = KnowledgeDocument {
            text: "  a b c d e f g h i  \n".to_string(),
            modified: None,
        };
        assert_eq!(doc.content_chars(), 9);
        assert!(!doc.has_content());
    }
}
