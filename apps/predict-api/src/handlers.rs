//! 路由与处理函数.

use std::sync::Arc;

use actix_multipart::Multipart;
use actix_web::{web, HttpResponse};
use brain_berry::batch::classify_images;
use brain_berry::consts::UPLOAD_FIELD;
use brain_berry::infer::Classifier;
use brain_berry::sink::ImagePrediction;
use futures::StreamExt;
use log::{debug, error, info};
use serde_json::json;

/// 所有 worker 共享的只读状态.
pub struct AppState {
    classifier: Arc<dyn Classifier>,
}

impl AppState {
    /// 以已加载的分类器构造.
    pub fn new(classifier: Arc<dyn Classifier>) -> Self {
        Self { classifier }
    }
}

/// 注册全部路由.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/predict", web::post().to(predict))
        .route("/health", web::get().to(health));
}

/// 读出所有名为 `file` 的表单字段, 保持上传顺序. 其他字段被忽略.
async fn collect_uploads(payload: &mut Multipart) -> actix_web::Result<Vec<Vec<u8>>> {
    let mut uploads = Vec::new();
    while let Some(field) = payload.next().await {
        let mut field = field?;
        if field.name() != Some(UPLOAD_FIELD) {
            debug!("Ignoring form field {:?}", field.name());
            continue;
        }
        let mut bytes = Vec::new();
        while let Some(chunk) = field.next().await {
            bytes.extend_from_slice(&chunk?);
        }
        uploads.push(bytes);
    }
    Ok(uploads)
}

/// `POST /predict`: 对一个或多个 DICOM 文件分类.
///
/// 总是返回与上传文件一一对应的 JSON 数组, 即使全部失败. 只有致命错误返回 500.
async fn predict(
    state: web::Data<AppState>,
    mut payload: Multipart,
) -> actix_web::Result<HttpResponse> {
    let uploads = collect_uploads(&mut payload).await?;
    let n = uploads.len();
    let classifier = Arc::clone(&state.classifier);

    let result = web::block(move || classify_images(classifier.as_ref(), &uploads)).await?;
    match result {
        Ok(records) => {
            info!(
                "Classified {n} upload(s), {} failed",
                records.iter().filter(|r| r.prediction().is_none()).count()
            );
            let body: Vec<ImagePrediction> = records.iter().map(ImagePrediction::from).collect();
            Ok(HttpResponse::Ok().json(body))
        }
        Err(e) => {
            error!("{e}");
            Ok(HttpResponse::InternalServerError().json(json!({ "error": e.to_string() })))
        }
    }
}

/// `GET /health`.
async fn health() -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::http::{header, StatusCode};
    use actix_web::{test, App};
    use brain_berry::error::InferenceError;
    use brain_berry::infer::{ClassLabel, FnClassifier};
    use brain_berry::transform::Tensor;
    use dicom_core::{DataElement, PrimitiveValue, VR};
    use dicom_dictionary_std::{tags, uids};
    use dicom_object::{FileMetaTableBuilder, InMemDicomObject};
    use serde_json::Value;

    const BOUNDARY: &str = "brainberryboundary";

    fn multipart_body(fields: &[(&str, &[u8])]) -> Vec<u8> {
        let mut body = Vec::new();
        for (i, (name, bytes)) in fields.iter().enumerate() {
            body.extend_from_slice(format!("--{BOUNDARY}\r\n").as_bytes());
            body.extend_from_slice(
                format!(
                    "Content-Disposition: form-data; name=\"{name}\"; filename=\"f{i}.dcm\"\r\n\
                     Content-Type: application/octet-stream\r\n\r\n"
                )
                .as_bytes(),
            );
            body.extend_from_slice(bytes);
            body.extend_from_slice(b"\r\n");
        }
        body.extend_from_slice(format!("--{BOUNDARY}--\r\n").as_bytes());
        body
    }

    fn predict_request(fields: &[(&str, &[u8])]) -> test::TestRequest {
        test::TestRequest::post()
            .uri("/predict")
            .insert_header((
                header::CONTENT_TYPE,
                format!("multipart/form-data; boundary={BOUNDARY}"),
            ))
            .set_payload(multipart_body(fields))
    }

    /// 一张 8 × 8 的最小 MR 切片.
    fn tiny_dicom(sop: &str) -> Vec<u8> {
        let mut obj = InMemDicomObject::new_empty();
        let put_str = |obj: &mut InMemDicomObject, tag, vr, v: &str| {
            obj.put(DataElement::new(tag, vr, PrimitiveValue::from(v)));
        };
        put_str(&mut obj, tags::SOP_CLASS_UID, VR::UI, uids::MR_IMAGE_STORAGE);
        put_str(&mut obj, tags::SOP_INSTANCE_UID, VR::UI, sop);
        put_str(&mut obj, tags::SERIES_INSTANCE_UID, VR::UI, "1.2.3");
        put_str(&mut obj, tags::PHOTOMETRIC_INTERPRETATION, VR::CS, "MONOCHROME2");
        for (tag, v) in [
            (tags::SAMPLES_PER_PIXEL, 1u16),
            (tags::ROWS, 8),
            (tags::COLUMNS, 8),
            (tags::BITS_ALLOCATED, 16),
            (tags::BITS_STORED, 16),
            (tags::HIGH_BIT, 15),
            (tags::PIXEL_REPRESENTATION, 0),
        ] {
            obj.put(DataElement::new(tag, VR::US, PrimitiveValue::from(v)));
        }
        obj.put(DataElement::new(
            tags::PIXEL_DATA,
            VR::OW,
            PrimitiveValue::U16((0..64u16).collect()),
        ));
        let file = obj
            .with_meta(
                FileMetaTableBuilder::new()
                    .transfer_syntax(uids::EXPLICIT_VR_LITTLE_ENDIAN)
                    .media_storage_sop_class_uid(uids::MR_IMAGE_STORAGE)
                    .media_storage_sop_instance_uid(sop),
            )
            .unwrap();
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tiny.dcm");
        file.write_to_file(&path).unwrap();
        std::fs::read(path).unwrap()
    }

    fn state_with<C: Classifier + 'static>(c: C) -> web::Data<AppState> {
        web::Data::new(AppState::new(Arc::new(c)))
    }

    fn always_brain() -> web::Data<AppState> {
        state_with(FnClassifier(|_: &Tensor| {
            Ok::<_, InferenceError>(ClassLabel::Brain)
        }))
    }

    #[actix_web::test]
    async fn test_health() {
        let app = test::init_service(App::new().app_data(always_brain()).configure(configure)).await;
        let req = test::TestRequest::get().uri("/health").to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body["status"], "ok");
    }

    #[actix_web::test]
    async fn test_predict_keeps_order_and_failures() {
        let app = test::init_service(App::new().app_data(always_brain()).configure(configure)).await;
        let good = tiny_dicom("1.2.3.1");
        let req = predict_request(&[
            ("file", good.as_slice()),
            ("comment", &b"ignored"[..]),
            ("file", &b"definitely not dicom"[..]),
        ])
        .to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let items = body.as_array().unwrap();
        assert_eq!(items.len(), 2);

        assert_eq!(items[0]["series_instance_uid"], "1.2.3");
        assert_eq!(items[0]["sop_instance_uid"], "1.2.3.1");
        assert_eq!(items[0]["prediction"], 1);
        assert!(items[0].get("error_msg").is_none());

        assert!(items[1]["prediction"].is_null());
        assert!(items[1]["sop_instance_uid"].is_null());
        assert!(!items[1]["error_msg"].as_str().unwrap().is_empty());
    }

    #[actix_web::test]
    async fn test_predict_no_files() {
        let app = test::init_service(App::new().app_data(always_brain()).configure(configure)).await;
        let req = predict_request(&[]).to_request();
        let body: Value = test::call_and_read_body_json(&app, req).await;
        assert_eq!(body, serde_json::json!([]));
    }

    #[actix_web::test]
    async fn test_predict_fatal_is_500() {
        let broken = state_with(FnClassifier(|t: &Tensor| {
            Err::<ClassLabel, _>(InferenceError::ShapeMismatch {
                expected: vec![1, 128, 128],
                found: t.shape().to_vec(),
            })
        }));
        let app = test::init_service(App::new().app_data(broken).configure(configure)).await;
        let good = tiny_dicom("1.2.3.9");
        let req = predict_request(&[("file", good.as_slice())]).to_request();

        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value = test::read_body_json(resp).await;
        assert!(body["error"].as_str().unwrap().contains("1.2.3.9"));
    }
}
