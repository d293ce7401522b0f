//! 参考照片编码缓存
//!
//! 以存储文件名为键。存储文件名随每次上传重新生成，因此缓存项不会过期失效，
//! 只需在删除学生时主动移除。`None` 表示该照片中没有检测到人脸。

use std::sync::Arc;
use std::time::Duration;

use moka::future::Cache;
use tracing::debug;

use crate::config::CacheConfig;
use crate::recognition::Encoding;

pub type ReferenceEncoding = Option<Arc<Encoding>>;

#[derive(Clone)]
pub struct EncodingCache {
    inner: Cache<String, ReferenceEncoding>,
}

impl EncodingCache {
    pub fn new(max_capacity: u64, ttl_secs: u64) -> Self {
        let inner = Cache::builder()
            .max_capacity(max_capacity)
            .time_to_live(Duration::from_secs(ttl_secs))
            .build();

        debug!("EncodingCache initialized with max capacity: {}", max_capacity);
        Self { inner }
    }

    pub fn from_config(config: &CacheConfig) -> Self {
        Self::new(config.max_capacity, config.default_ttl)
    }

    pub async fn get(&self, photo_path: &str) -> Option<ReferenceEncoding> {
        self.inner.get(photo_path).await
    }

    pub async fn insert(&self, photo_path: String, encoding: ReferenceEncoding) {
        self.inner.insert(photo_path, encoding).await;
    }

    pub async fn invalidate(&self, photo_path: &str) {
        self.inner.invalidate(photo_path).await;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_caches_missing_face_distinctly_from_miss() {
        let cache = EncodingCache::new(100, 60);
        assert!(cache.get("a.png").await.is_none());

        cache.insert("a.png".into(), None).await;
        assert_eq!(cache.get("a.png").await, Some(None));

        let encoding = Arc::new(Encoding::new(vec![0.1, 0.2]));
        cache.insert("b.png".into(), Some(encoding.clone())).await;
        assert_eq!(cache.get("b.png").await, Some(Some(encoding)));
    }

    #[tokio::test]
    async fn test_invalidate() {
        let cache = EncodingCache::new(100, 60);
        cache.insert("a.png".into(), None).await;
        cache.invalidate("a.png").await;
        assert!(cache.get("a.png").await.is_none());
    }
}
