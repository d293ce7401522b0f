//! multipart 表单读取
//!
//! 文本字段读入内存，照片字段以流的方式写入上传目录，同时校验扩展名、
//! 魔术字节与大小。读取失败时已写入的照片会被删除。

use std::borrow::Cow;
use std::collections::HashMap;
use std::fs::File;
use std::io::Write;

use actix_multipart::{Field, Multipart};
use actix_web::HttpResponse;
use futures_util::TryStreamExt;
use futures_util::stream::StreamExt;

use crate::errors::AttendanceError;
use crate::models::{ApiResponse, ErrorCode};
use crate::storage::PhotoStore;
use crate::utils::validate_magic_bytes;

/// 文本字段的最大字节数
const MAX_TEXT_FIELD: usize = 64 * 1024;
/// 校验魔术字节所需的文件头长度（WebP 需要 12 字节）
const MAGIC_HEADER_LEN: usize = 12;

/// 已写入上传目录的照片
#[derive(Debug, Clone)]
pub struct SavedPhoto {
    pub stored_name: String,
    pub original_name: String,
    pub size: usize,
}

#[derive(Debug, Default)]
pub struct UploadForm {
    fields: HashMap<String, String>,
    pub photo: Option<SavedPhoto>,
}

impl UploadForm {
    /// 去除首尾空白后的文本字段，空字符串视为缺失
    pub fn field(&self, name: &str) -> Option<&str> {
        self.fields
            .get(name)
            .map(|v| v.trim())
            .filter(|v| !v.is_empty())
    }

    /// 删除已写入的照片
    pub fn discard(&mut self, store: &PhotoStore) {
        if let Some(photo) = self.photo.take()
            && let Err(e) = store.remove(&photo.stored_name)
        {
            tracing::warn!("{}", e);
        }
    }
}

/// 表单被拒绝的原因及对应错误码
#[derive(Debug)]
pub struct FormRejection {
    pub code: ErrorCode,
    pub error: AttendanceError,
}

impl FormRejection {
    fn new(code: ErrorCode, error: AttendanceError) -> Self {
        Self { code, error }
    }

    pub fn into_response(self) -> HttpResponse {
        ApiResponse::failure(self.code, &self.error)
    }
}

/// 读取整个表单，`photo_field` 为照片字段名
pub async fn read_form(
    mut payload: Multipart,
    photo_field: &str,
    store: &PhotoStore,
) -> Result<UploadForm, FormRejection> {
    let mut form = UploadForm::default();
    if let Err(rejection) = read_fields(&mut payload, photo_field, store, &mut form).await {
        form.discard(store);
        return Err(rejection);
    }
    Ok(form)
}

async fn read_fields(
    payload: &mut Multipart,
    photo_field: &str,
    store: &PhotoStore,
    form: &mut UploadForm,
) -> Result<(), FormRejection> {
    loop {
        let mut field = match payload.try_next().await {
            Ok(Some(field)) => field,
            Ok(None) => break,
            Err(e) => {
                return Err(FormRejection::new(
                    ErrorCode::BadRequest,
                    AttendanceError::validation(format!("Malformed multipart body: {e}")),
                ));
            }
        };

        let content_disposition = field.content_disposition();
        let name = content_disposition
            .and_then(|cd| cd.get_name())
            .unwrap_or_default()
            .to_string();
        let file_name = content_disposition
            .and_then(|cd| cd.get_filename())
            .map(|s| s.to_string());

        if name == photo_field {
            match file_name {
                // 浏览器在未选择文件时会提交空文件名
                Some(original_name) if !original_name.is_empty() => {
                    if form.photo.is_some() {
                        return Err(FormRejection::new(
                            ErrorCode::MultifileUploadNotAllowed,
                            AttendanceError::validation("Only one photo can be uploaded at a time"),
                        ));
                    }
                    let photo = save_photo(&mut field, original_name, store).await?;
                    form.photo = Some(photo);
                }
                _ => drain(&mut field).await?,
            }
        } else if file_name.is_some() {
            drain(&mut field).await?;
        } else {
            let value = read_text(&mut field, &name).await?;
            form.fields.insert(name, value);
        }
    }
    Ok(())
}

fn malformed(e: impl std::fmt::Display) -> FormRejection {
    FormRejection::new(
        ErrorCode::BadRequest,
        AttendanceError::validation(format!("Malformed multipart body: {e}")),
    )
}

async fn drain(field: &mut Field) -> Result<(), FormRejection> {
    while let Some(chunk) = field.next().await {
        chunk.map_err(malformed)?;
    }
    Ok(())
}

async fn read_text(field: &mut Field, name: &str) -> Result<String, FormRejection> {
    let mut data = Vec::new();
    while let Some(chunk) = field.next().await {
        let chunk = chunk.map_err(malformed)?;
        if data.len() + chunk.len() > MAX_TEXT_FIELD {
            return Err(FormRejection::new(
                ErrorCode::BadRequest,
                AttendanceError::validation(format!("Field '{name}' is too large")),
            ));
        }
        data.extend_from_slice(&chunk);
    }
    String::from_utf8(data).map_err(|_| {
        FormRejection::new(
            ErrorCode::BadRequest,
            AttendanceError::validation(format!("Field '{name}' is not valid UTF-8")),
        )
    })
}

/// 收齐文件头之前先缓存数据，校验通过后再写入文件
struct HeaderGate<'a> {
    extension: &'a str,
    head: Vec<u8>,
    passed: bool,
}

impl<'a> HeaderGate<'a> {
    fn new(extension: &'a str) -> Self {
        Self {
            extension,
            head: Vec::with_capacity(MAGIC_HEADER_LEN),
            passed: false,
        }
    }

    /// 返回当前可以写入的数据；文件头未收齐时为空
    fn feed<'c>(&mut self, chunk: &'c [u8]) -> Result<Cow<'c, [u8]>, FormRejection> {
        if self.passed {
            return Ok(Cow::Borrowed(chunk));
        }
        self.head.extend_from_slice(chunk);
        if self.head.len() < MAGIC_HEADER_LEN {
            return Ok(Cow::Borrowed(&[]));
        }
        self.check()?;
        Ok(Cow::Owned(std::mem::take(&mut self.head)))
    }

    /// 文件不足文件头长度时，用已收到的全部数据校验
    fn finish(mut self) -> Result<Vec<u8>, FormRejection> {
        if self.passed || self.head.is_empty() {
            return Ok(Vec::new());
        }
        self.check()?;
        Ok(self.head)
    }

    fn check(&mut self) -> Result<(), FormRejection> {
        if !validate_magic_bytes(&self.head, self.extension) {
            return Err(FormRejection::new(
                ErrorCode::FileTypeNotAllowed,
                AttendanceError::validation("文件内容与扩展名不匹配"),
            ));
        }
        self.passed = true;
        Ok(())
    }
}

async fn save_photo(
    field: &mut Field,
    original_name: String,
    store: &PhotoStore,
) -> Result<SavedPhoto, FormRejection> {
    let extension = store
        .allowed_extension(&original_name)
        .map_err(|e| FormRejection::new(ErrorCode::FileTypeNotAllowed, e))?;

    let upload_failed = |e: AttendanceError| FormRejection::new(ErrorCode::FileUploadFailed, e);

    store.ensure_dir().map_err(upload_failed)?;
    let stored_name = PhotoStore::generate_name(&extension);
    let file_path = store.path_of(&stored_name).map_err(upload_failed)?;
    let mut file = File::create(&file_path).map_err(|e| upload_failed(e.into()))?;

    let result = async {
        let mut total_size: usize = 0;
        let mut header = HeaderGate::new(&extension);
        while let Some(chunk) = field.next().await {
            let data = chunk.map_err(malformed)?;

            total_size += data.len();
            if total_size > store.max_size() {
                return Err(FormRejection::new(
                    ErrorCode::FileSizeExceeded,
                    AttendanceError::validation(format!(
                        "Photo exceeds the {} byte limit",
                        store.max_size()
                    )),
                ));
            }
            let ready = header.feed(&data)?;
            file.write_all(&ready).map_err(|e| upload_failed(e.into()))?;
        }

        if total_size == 0 {
            return Err(FormRejection::new(
                ErrorCode::BadRequest,
                AttendanceError::validation("Uploaded photo is empty"),
            ));
        }
        let rest = header.finish()?;
        file.write_all(&rest).map_err(|e| upload_failed(e.into()))?;
        Ok(total_size)
    }
    .await;

    match result {
        Ok(size) => Ok(SavedPhoto {
            stored_name,
            original_name,
            size,
        }),
        Err(rejection) => {
            drop(file);
            if let Err(e) = store.remove(&stored_name) {
                tracing::warn!("{}", e);
            }
            Err(rejection)
        }
    }
}
