//! Knowledge Base - 버전이 붙은 불변 스냅샷
//!
//! 문서 텍스트 + 청크 + 학습된 인덱스를 하나의 스냅샷으로 묶고,
//! 파일 변경이 감지될 때만 새 스냅샷을 만들어 통째로 교체합니다 (copy-on-write).
//! 요청은 시작 시 스냅샷 참조 하나를 잡고 끝까지 그것만 사용하므로
//! 재구축 중에도 찢어진 읽기가 생기지 않습니다.

use std::sync::{Arc, Mutex, PoisonError, RwLock};

use chrono::{DateTime, Utc};
use sha2::{Digest, Sha256};

use super::chunker::Chunker;
use super::index::{RetrievalResult, TfIdfIndex};
use super::reader::{KnowledgeDocument, KnowledgeReader};

// ============================================================================
// Snapshot
// ============================================================================

/// 인덱스 상태
#[derive(Debug, Clone)]
pub enum IndexState {
    /// 청크 없음 (파일 없음 또는 빈 파일)
    Empty,
    /// 청크는 있으나 학습 실패 (예: 불용어뿐인 어휘)
    Untrained,
    Trained(TfIdfIndex),
}

impl IndexState {
    pub fn label(&self) -> &'static str {
        match self {
            IndexState::Empty => "empty",
            IndexState::Untrained => "untrained",
            IndexState::Trained(_) => "trained",
        }
    }
}

/// 지식 스냅샷 (한 세대의 문서 + 청크 + 인덱스)
#[derive(Debug, Clone)]
pub struct KnowledgeSnapshot {
    pub generation: u64,
    pub document: KnowledgeDocument,
    pub chunks: Arc<[String]>,
    pub index: IndexState,
    pub loaded_at: DateTime<Utc>,
    /// 문서 내용 SHA-256 (hex)
    pub digest: String,
}

impl KnowledgeSnapshot {
    /// 아무것도 로드되지 않은 초기 스냅샷
    pub fn empty() -> Self {
        Self {
            generation: 0,
            document: KnowledgeDocument::default(),
            chunks: Arc::from(Vec::new()),
            index: IndexState::Empty,
            loaded_at: Utc::now(),
            digest: content_digest(""),
        }
    }

    /// 문서로부터 스냅샷 구축 (청킹 + 학습)
    pub fn build(
        generation: u64,
        document: KnowledgeDocument,
        chunker: &dyn Chunker,
        max_features: usize,
    ) -> Self {
        let chunks: Arc<[String]> = chunker.chunk(&document.text).into();
        tracing::info!("Loaded {} chunks", chunks.len());

        let index = if chunks.is_empty() {
            tracing::info!("No chunks available for training");
            IndexState::Empty
        } else {
            match TfIdfIndex::train(Arc::clone(&chunks), max_features) {
                Ok(index) => {
                    tracing::info!(
                        "TF-IDF index trained on {} chunks ({} features)",
                        index.chunk_count(),
                        index.vocabulary_size()
                    );
                    IndexState::Trained(index)
                }
                Err(e) => {
                    tracing::warn!("Error training TF-IDF: {}", e);
                    IndexState::Untrained
                }
            }
        };

        Self {
            generation,
            digest: content_digest(&document.text),
            document,
            chunks,
            index,
            loaded_at: Utc::now(),
        }
    }

    /// 질문과 관련된 청크 검색 (학습되지 않았으면 빈 결과)
    pub fn retrieve(&self, question: &str, top_k: usize) -> RetrievalResult {
        match &self.index {
            IndexState::Trained(index) => index.query(question, top_k),
            IndexState::Empty | IndexState::Untrained => vec![],
        }
    }

    pub fn text(&self) -> &str {
        &self.document.text
    }

    pub fn has_content(&self) -> bool {
        self.document.has_content()
    }
}

fn content_digest(text: &str) -> String {
    format!("{:x}", Sha256::digest(text.as_bytes()))
}

// ============================================================================
// KnowledgeBase
// ============================================================================

/// 프로세스 전역 지식 상태
///
/// 읽기는 `current()` 로 Arc 하나를 복제할 뿐이고,
/// 재구축은 reader 락으로 직렬화됩니다.
pub struct KnowledgeBase {
    reader: Mutex<KnowledgeReader>,
    chunker: Box<dyn Chunker>,
    max_features: usize,
    current: RwLock<Arc<KnowledgeSnapshot>>,
}

impl KnowledgeBase {
    pub fn new(reader: KnowledgeReader, chunker: Box<dyn Chunker>, max_features: usize) -> Self {
        Self {
            reader: Mutex::new(reader),
            chunker,
            max_features,
            current: RwLock::new(Arc::new(KnowledgeSnapshot::empty())),
        }
    }

    /// 현재 스냅샷 (staleness 검사 없음)
    pub fn current(&self) -> Arc<KnowledgeSnapshot> {
        let guard = self.current.read().unwrap_or_else(PoisonError::into_inner);
        Arc::clone(&guard)
    }

    /// 파일이 바뀌었으면 새 스냅샷으로 교체
    ///
    /// # Returns
    /// 교체가 일어났는지 여부
    pub fn refresh_if_changed(&self) -> bool {
        let mut reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);

        if !reader.has_changed() {
            return false;
        }

        tracing::info!(
            "Knowledge file changed, reloading: {}",
            reader.path().display()
        );
        let document = reader.load();
        let generation = self.current().generation + 1;
        let snapshot =
            KnowledgeSnapshot::build(generation, document, self.chunker.as_ref(), self.max_features);

        let mut current = self.current.write().unwrap_or_else(PoisonError::into_inner);
        *current = Arc::new(snapshot);
        true
    }

    /// staleness 검사 후 스냅샷 반환 (요청 시작 시 사용)
    pub fn snapshot(&self) -> Arc<KnowledgeSnapshot> {
        self.refresh_if_changed();
        self.current()
    }

    pub fn path(&self) -> std::path::PathBuf {
        let reader = self.reader.lock().unwrap_or_else(PoisonError::into_inner);
        reader.path().to_path_buf()
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::knowledge::chunker::default_chunker;
    use crate::knowledge::index::DEFAULT_MAX_FEATURES;
    use std::time::Duration;
    use tempfile::TempDir;

    fn base_for(path: &std::path::Path) -> KnowledgeBase {
        KnowledgeBase::new(
            KnowledgeReader::new(path),
            default_chunker(),
            DEFAULT_MAX_FEATURES,
        )
    }

    fn bump_mtime(path: &std::path::Path, secs: u64) {
        let file = std::fs::File::options().write(true).open(path).unwrap();
        let modified = file.metadata().unwrap().modified().unwrap();
        file.set_modified(modified + Duration::from_secs(secs)).unwrap();
    }

    #[test]
    fn test_missing_file_stays_empty() {
        let dir = TempDir::new().unwrap();
        let kb = base_for(&dir.path().join("knowledge.txt"));

        let snapshot = kb.snapshot();
        assert_eq!(snapshot.generation, 0);
        assert!(matches!(snapshot.index, IndexState::Empty));
        assert!(snapshot.retrieve("anything", 5).is_empty());
    }

    #[test]
    fn test_lazy_build_and_retrieve() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "The capital of France is Paris. Rust is a language.").unwrap();

        let kb = base_for(&path);
        let snapshot = kb.snapshot();

        assert_eq!(snapshot.generation, 1);
        assert!(matches!(snapshot.index, IndexState::Trained(_)));
        let results = snapshot.retrieve("capital of France", 5);
        assert_eq!(results.len(), 1);
        assert!(results[0].text.contains("Paris"));
    }

    #[test]
    fn test_unchanged_file_does_not_rebuild() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "Some stable knowledge content.").unwrap();

        let kb = base_for(&path);
        let first = kb.snapshot();
        assert!(!kb.refresh_if_changed());
        let second = kb.snapshot();

        assert!(Arc::ptr_eq(&first, &second));
    }

    #[test]
    fn test_mtime_change_rebuilds_even_with_same_content() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "Some stable knowledge content.").unwrap();

        let kb = base_for(&path);
        let first = kb.snapshot();

        bump_mtime(&path, 10);
        assert!(kb.refresh_if_changed());
        let second = kb.current();

        assert_eq!(second.generation, first.generation + 1);
        assert_eq!(second.digest, first.digest);
        assert_eq!(second.chunks, first.chunks);
    }

    #[test]
    fn test_old_snapshot_survives_rebuild() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "Apples grow on trees.").unwrap();

        let kb = base_for(&path);
        let held = kb.snapshot();

        std::fs::write(&path, "Bananas grow in bunches.").unwrap();
        bump_mtime(&path, 10);
        let fresh = kb.snapshot();

        // 요청이 잡고 있던 스냅샷은 그대로
        assert_eq!(held.retrieve("apples", 5).len(), 1);
        assert!(held.retrieve("bananas", 5).is_empty());
        assert_eq!(fresh.retrieve("bananas", 5).len(), 1);
    }

    #[test]
    fn test_stop_word_only_file_is_untrained() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "The and of it. Is a the.").unwrap();

        let kb = base_for(&path);
        let snapshot = kb.snapshot();

        assert!(matches!(snapshot.index, IndexState::Untrained));
        assert!(!snapshot.chunks.is_empty());
        assert!(snapshot.retrieve("the", 5).is_empty());
    }

    #[test]
    fn test_deleted_file_resets_to_empty() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("knowledge.txt");
        std::fs::write(&path, "Temporary knowledge content.").unwrap();

        let kb = base_for(&path);
        assert!(kb.snapshot().has_content());

        std::fs::remove_file(&path).unwrap();
        let snapshot = kb.snapshot();
        assert!(!snapshot.has_content());
        assert!(matches!(snapshot.index, IndexState::Empty));
    }
}
