//! 名册与集体照的人脸匹配
//!
//! 每个学生最多提供一个参考编码（照片中的第一张脸）。集体照中的每张脸按名册顺序
//! 与全部参考编码比较，第一个匹配的学生记为出勤。

use std::collections::BTreeMap;
use std::path::PathBuf;
use std::sync::Arc;

use tracing::{info, warn};

use crate::cache::{EncodingCache, ReferenceEncoding};
use crate::errors::{AttendanceError, Result};
use crate::models::attendance::{entities::StudentPresence, responses::AttendanceResponse};
use crate::models::students::entities::Student;
use crate::recognition::{Encoding, FaceEncoder, load_image_file};
use crate::storage::{PhotoStore, Storage};

/// `candidate` 与各已知编码的匹配结果，距离等于容差也算匹配
pub fn compare_faces(known: &[&Encoding], candidate: &Encoding, tolerance: f32) -> Vec<bool> {
    known
        .iter()
        .map(|k| k.distance(candidate) <= tolerance)
        .collect()
}

/// 名册中每个学生的出勤标记，没有参考编码的学生永远不会匹配
pub fn mark_presence(
    references: &[Option<&Encoding>],
    detected: &[Encoding],
    tolerance: f32,
) -> Vec<bool> {
    let known: Vec<(usize, &Encoding)> = references
        .iter()
        .enumerate()
        .filter_map(|(idx, r)| r.map(|e| (idx, e)))
        .collect();
    let known_encodings: Vec<&Encoding> = known.iter().map(|(_, e)| *e).collect();

    let mut present = vec![false; references.len()];
    for candidate in detected {
        let matches = compare_faces(&known_encodings, candidate, tolerance);
        if let Some(first) = matches.iter().position(|&m| m) {
            present[known[first].0] = true;
        }
    }
    present
}

/// 集体照扫描结果
struct GroupScan {
    faces: usize,
    encodings: Vec<Encoding>,
}

pub struct AttendanceMatcher {
    storage: Arc<dyn Storage>,
    photos: PhotoStore,
    encoder: Arc<dyn FaceEncoder>,
    cache: EncodingCache,
}

impl AttendanceMatcher {
    pub fn new(
        storage: Arc<dyn Storage>,
        photos: PhotoStore,
        encoder: Arc<dyn FaceEncoder>,
        cache: EncodingCache,
    ) -> Self {
        Self {
            storage,
            photos,
            encoder,
            cache,
        }
    }

    /// 用已保存的集体照 `class_photo` 为教室 `classroom_id` 点名
    pub async fn take_attendance(
        &self,
        classroom_id: i64,
        class_photo: &str,
        tolerance: f32,
    ) -> Result<AttendanceResponse> {
        let classroom = self
            .storage
            .get_classroom_by_id(classroom_id)
            .await?
            .ok_or_else(|| AttendanceError::not_found(format!("Classroom {classroom_id} not found")))?;

        let students = self.storage.list_students(Some(classroom_id)).await?;

        let mut references = Vec::with_capacity(students.len());
        for student in &students {
            references.push(self.reference_encoding(student).await?);
        }

        let scan = self
            .scan_group_photo(class_photo, references.iter().any(Option::is_some))
            .await?;

        let borrowed: Vec<Option<&Encoding>> = references.iter().map(|r| r.as_deref()).collect();
        let present = mark_presence(&borrowed, &scan.encodings, tolerance);

        let mut presence = BTreeMap::new();
        let mut results = Vec::with_capacity(students.len());
        for ((student, reference), present) in students.into_iter().zip(&references).zip(present) {
            *presence.entry(student.name.clone()).or_insert(false) |= present;
            results.push(StudentPresence {
                id: student.id,
                name: student.name,
                present,
                has_reference: reference.is_some(),
            });
        }

        info!(
            classroom_id,
            students = results.len(),
            faces = scan.faces,
            present = results.iter().filter(|r| r.present).count(),
            "Attendance taken"
        );

        Ok(AttendanceResponse {
            classroom_id,
            classroom_name: classroom.name,
            class_photo_url: PhotoStore::public_url(class_photo),
            faces_detected: scan.faces,
            presence,
            students: results,
        })
    }

    /// 学生的参考编码，优先取缓存
    ///
    /// 照片缺失或无法解码时返回 `None` 且不写入缓存，修复文件后下次即可生效。
    async fn reference_encoding(&self, student: &Student) -> Result<ReferenceEncoding> {
        if let Some(cached) = self.cache.get(&student.photo_path).await {
            return Ok(cached);
        }

        let path = match self.photos.path_of(&student.photo_path) {
            Ok(path) => path,
            Err(e) => {
                warn!(student_id = student.id, "{}", e);
                return Ok(None);
            }
        };
        if !path.exists() {
            warn!(
                student_id = student.id,
                "Reference photo {} is missing",
                path.display()
            );
            return Ok(None);
        }

        let encoder = self.encoder.clone();
        let encoded = run_blocking(move || {
            let image = load_image_file(&path)?;
            encoder.encode_faces(&image)
        })
        .await;

        let reference = match encoded {
            Ok(encodings) => encodings.into_iter().next().map(Arc::new),
            Err(e @ (AttendanceError::ImageDecode(_) | AttendanceError::FileOperation(_))) => {
                warn!(student_id = student.id, "Unreadable reference photo: {}", e);
                return Ok(None);
            }
            Err(e) => return Err(e),
        };

        if reference.is_none() {
            warn!(
                student_id = student.id,
                "No face found in reference photo {}", student.photo_path
            );
        }
        self.cache
            .insert(student.photo_path.clone(), reference.clone())
            .await;
        Ok(reference)
    }

    async fn scan_group_photo(&self, class_photo: &str, encode: bool) -> Result<GroupScan> {
        let path: PathBuf = self.photos.path_of(class_photo)?;
        let encoder = self.encoder.clone();

        run_blocking(move || {
            let image = load_image_file(&path)?;
            let locations = encoder.face_locations(&image)?;
            let encodings = if encode && !locations.is_empty() {
                encoder.face_encodings(&image, &locations)?
            } else {
                Vec::new()
            };
            Ok(GroupScan {
                faces: locations.len(),
                encodings,
            })
        })
        .await
    }
}

/// 在阻塞线程池中执行编码计算
async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    actix_web::web::block(f)
        .await
        .map_err(|e| AttendanceError::encoder(format!("Blocking task failed: {e}")))?
}
