use crate::cache::EncodingCache;
use crate::config::{AppConfig, AttendanceConfig};
use crate::recognition::{FaceEncoder, OnnxFaceEncoder};
use crate::storage::{PhotoStore, Storage};
use std::sync::Arc;
use tracing::{debug, warn};

/// 各 worker 共享的组件
pub struct StartupContext {
    pub storage: Arc<dyn Storage>,
    pub photos: PhotoStore,
    pub encoder: Arc<dyn FaceEncoder>,
    pub cache: EncodingCache,
    pub attendance: AttendanceConfig,
}

/// 加载人脸模型；模型缺失时直接失败，不以降级模式启动
fn create_encoder(config: &AppConfig) -> Arc<dyn FaceEncoder> {
    let encoder = OnnxFaceEncoder::from_config(&config.recognition)
        .expect("Failed to load face recognition models");
    warn!(
        "Face models loaded (detector: {}, recognizer: {})",
        config.recognition.detector_model, config.recognition.recognizer_model
    );
    Arc::new(encoder)
}

/// 准备服务器启动的上下文
/// 包括存储、照片目录、人脸模型和编码缓存
pub async fn prepare_server_startup() -> StartupContext {
    let config = AppConfig::get();

    let storage = crate::storage::create_storage()
        .await
        .expect("Failed to create storage backend");
    warn!("Storage backend initialized and migrations completed");

    let photos = PhotoStore::from_config(&config.upload);
    photos
        .ensure_dir()
        .expect("Failed to create upload directory");
    warn!("Photo directory ready: {}", config.upload.dir);

    let encoder = create_encoder(config);

    let cache = EncodingCache::from_config(&config.cache);
    debug!(
        "Encoding cache ready (capacity: {}, ttl: {}s)",
        config.cache.max_capacity, config.cache.default_ttl
    );

    StartupContext {
        storage,
        photos,
        encoder,
        cache,
        attendance: config.attendance.clone(),
    }
}
