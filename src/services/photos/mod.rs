pub mod download;

use actix_web::{HttpRequest, HttpResponse, Result as ActixResult};

pub struct PhotoService;

impl PhotoService {
    pub fn new_lazy() -> Self {
        Self
    }

    // 返回上传目录中的照片
    pub async fn serve_photo(
        &self,
        request: &HttpRequest,
        file_name: String,
    ) -> ActixResult<HttpResponse> {
        download::serve_photo(self, request, file_name).await
    }
}
