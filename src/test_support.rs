//! 测试共用的存储、照片目录和可预测的人脸编码器

use std::io::Cursor;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use actix_web::web;
use image::{ImageFormat, Rgb, RgbImage};
use tempfile::TempDir;

use crate::cache::EncodingCache;
use crate::config::{AttendanceConfig, DatabaseConfig, UploadConfig};
use crate::errors::Result;
use crate::models::students::entities::Student;
use crate::models::students::requests::NewStudent;
use crate::recognition::{Encoding, FaceEncoder, FaceLocation};
use crate::routes;
use crate::services::attendance::AttendanceMatcher;
use crate::storage::sea_orm_storage::SeaOrmStorage;
use crate::storage::{PhotoStore, Storage};
use crate::utils::{json_error_handler, path_error_handler, query_error_handler};

/// 在临时目录中创建 SQLite 存储并执行迁移
pub async fn test_storage(dir: &Path) -> SeaOrmStorage {
    let config = DatabaseConfig {
        url: dir.join("test.db").to_string_lossy().into_owned(),
        pool_size: 2,
        timeout: 5,
    };
    SeaOrmStorage::connect(&config)
        .await
        .expect("test database should open")
}

/// 第一行中红色分量大于 0 的每个像素视为一张人脸，编码为 `[r / 100, g / 100]`
pub struct StubEncoder;

impl FaceEncoder for StubEncoder {
    fn face_locations(&self, image: &RgbImage) -> Result<Vec<FaceLocation>> {
        if image.height() == 0 {
            return Ok(Vec::new());
        }
        Ok((0..image.width())
            .filter(|&x| image.get_pixel(x, 0)[0] > 0)
            .map(|x| FaceLocation {
                x: x as f32,
                y: 0.0,
                width: 1.0,
                height: 1.0,
                confidence: 1.0,
                landmarks: None,
            })
            .collect())
    }

    fn face_encodings(
        &self,
        image: &RgbImage,
        locations: &[FaceLocation],
    ) -> Result<Vec<Encoding>> {
        Ok(locations
            .iter()
            .map(|face| {
                let Rgb([r, g, _]) = *image.get_pixel(face.x as u32, 0);
                Encoding::new(vec![r as f32 / 100.0, g as f32 / 100.0])
            })
            .collect())
    }
}

/// 宽为像素数、高为 1 的 PNG
pub fn png_bytes(pixels: &[[u8; 3]]) -> Vec<u8> {
    let image = RgbImage::from_fn(pixels.len() as u32, 1, |x, _| Rgb(pixels[x as usize]));
    let mut bytes = Cursor::new(Vec::new());
    image
        .write_to(&mut bytes, ImageFormat::Png)
        .expect("png encoding should succeed");
    bytes.into_inner()
}

const BOUNDARY: &str = "----attendance-test-boundary";

/// multipart/form-data 请求体
#[derive(Default)]
pub struct MultipartBody {
    body: Vec<u8>,
}

impl MultipartBody {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(mut self, name: &str, value: &str) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"\r\n\r\n{value}\r\n"
            )
            .as_bytes(),
        );
        self
    }

    pub fn file(mut self, name: &str, filename: &str, content: &[u8]) -> Self {
        self.body.extend_from_slice(
            format!(
                "--{BOUNDARY}\r\nContent-Disposition: form-data; name=\"{name}\"; filename=\"{filename}\"\r\nContent-Type: application/octet-stream\r\n\r\n"
            )
            .as_bytes(),
        );
        self.body.extend_from_slice(content);
        self.body.extend_from_slice(b"\r\n");
        self
    }

    /// 返回 (Content-Type, 请求体)
    pub fn build(mut self) -> (String, Vec<u8>) {
        self.body
            .extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        (
            format!("multipart/form-data; boundary={BOUNDARY}"),
            self.body,
        )
    }
}

pub struct TestContext {
    pub dir: TempDir,
    pub storage: Arc<dyn Storage>,
    pub photos: PhotoStore,
    pub encoder: Arc<dyn FaceEncoder>,
    pub cache: EncodingCache,
    pub attendance: AttendanceConfig,
}

impl TestContext {
    pub async fn new() -> Self {
        let dir = tempfile::tempdir().expect("tempdir");
        let storage: Arc<dyn Storage> = Arc::new(test_storage(dir.path()).await);
        let photos = Self::photo_store(dir.path(), UploadConfig::default().max_size);
        photos.ensure_dir().expect("upload dir");

        Self {
            dir,
            storage,
            photos,
            encoder: Arc::new(StubEncoder),
            cache: EncodingCache::new(100, 60),
            attendance: AttendanceConfig::default(),
        }
    }

    fn photo_store(root: &Path, max_size: usize) -> PhotoStore {
        PhotoStore::new(
            root.join("uploads"),
            max_size,
            UploadConfig::default().allowed_types,
        )
    }

    pub fn upload_dir(&self) -> PathBuf {
        self.dir.path().join("uploads")
    }

    pub fn set_max_upload_size(&mut self, max_size: usize) {
        self.photos = Self::photo_store(self.dir.path(), max_size);
    }

    /// 与 main 中相同的 app data 和路由
    pub fn configure(&self, cfg: &mut web::ServiceConfig) {
        cfg.app_data(web::QueryConfig::default().error_handler(query_error_handler))
            .app_data(web::JsonConfig::default().error_handler(json_error_handler))
            .app_data(web::PathConfig::default().error_handler(path_error_handler))
            .app_data(web::Data::new(self.storage.clone()))
            .app_data(web::Data::new(self.photos.clone()))
            .app_data(web::Data::new(self.encoder.clone()))
            .app_data(web::Data::new(self.cache.clone()))
            .app_data(web::Data::new(self.attendance.clone()))
            .configure(routes::configure_routes);
    }

    /// 将照片写入上传目录，返回存储文件名
    pub fn write_photo(&self, pixels: &[[u8; 3]]) -> String {
        std::fs::create_dir_all(self.upload_dir()).expect("upload dir");
        let name = PhotoStore::generate_name(".png");
        std::fs::write(self.upload_dir().join(&name), png_bytes(pixels)).expect("write photo");
        name
    }

    pub async fn add_student(
        &self,
        name: &str,
        pixels: &[[u8; 3]],
        classroom_id: Option<i64>,
    ) -> Student {
        let photo_path = self.write_photo(pixels);
        self.storage
            .create_student(NewStudent {
                name: name.to_string(),
                photo_path,
                original_filename: format!("{}.png", name.to_lowercase()),
                classroom_id,
            })
            .await
            .expect("create student")
    }

    pub fn matcher(&self) -> AttendanceMatcher {
        AttendanceMatcher::new(
            self.storage.clone(),
            self.photos.clone(),
            self.encoder.clone(),
            self.cache.clone(),
        )
    }
}
