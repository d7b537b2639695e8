//! Typed endpoint wrappers used by the reading pages and the dashboards

use crate::error::ApiError;
use crate::gateway::{Endpoint, HttpGateway};
use crate::models::{
    Chapter, ChapterInput, Manga, MangaInput, MangaQuery, PaginatedResponse, Report,
    ReportRequest, Role, Stats, StoredUser, TranslationJob, TranslationSubmission,
};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::{json, Value};
use std::sync::Arc;

/// Accept a bare array, `{<key>: [...]}` or `{data: [...]}`
pub fn decode_list<T: DeserializeOwned>(value: Value, key: &str) -> Result<Vec<T>, ApiError> {
    let list = match value {
        Value::Array(_) => value,
        Value::Object(mut map) => match map.remove(key).or_else(|| map.remove("data")) {
            Some(list) => list,
            None => Value::Array(Vec::new()),
        },
        Value::Null => Value::Array(Vec::new()),
        other => other,
    };
    serde_json::from_value(list).map_err(ApiError::unexpected_payload)
}

/// Accept the entity itself or `{<key>: {...}}`
pub fn decode_entity<T: DeserializeOwned>(value: Value, key: &str) -> Result<T, ApiError> {
    let entity = match value {
        Value::Object(mut map) if map.get(key).map_or(false, Value::is_object) => {
            map.remove(key).unwrap_or_default()
        }
        other => other,
    };
    serde_json::from_value(entity).map_err(ApiError::unexpected_payload)
}

#[derive(Debug, Serialize)]
struct SearchParams<'a> {
    q: &'a str,
    page: u32,
}

#[derive(Debug, Serialize)]
struct PageParams<'a> {
    page: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    status: Option<&'a str>,
}

/// Public reading endpoints
#[derive(Clone)]
pub struct MangaApi {
    gateway: Arc<HttpGateway>,
}

impl MangaApi {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    pub async fn list(&self, query: &MangaQuery) -> Result<PaginatedResponse<Manga>, ApiError> {
        self.gateway.get_with_query("mangas", query).await
    }

    pub async fn search(&self, query: &str, page: u32) -> Result<PaginatedResponse<Manga>, ApiError> {
        let q = crate::helpers::normalize_search_query(query);
        self.gateway
            .get_with_query("mangas/search", &SearchParams { q: &q, page })
            .await
    }

    pub async fn detail(&self, id: &str) -> Result<Manga, ApiError> {
        let value = self.gateway.get_value(Endpoint::new("mangas").id(id)).await?;
        decode_entity(value, "manga")
    }

    pub async fn chapters(&self, manga_id: &str) -> Result<Vec<Chapter>, ApiError> {
        let value = self
            .gateway
            .get_value(Endpoint::new("mangas").id(manga_id).then("chapters"))
            .await?;
        decode_list(value, "chapters")
    }

    pub async fn chapter(&self, chapter_id: &str) -> Result<Chapter, ApiError> {
        let value = self
            .gateway
            .get_value(Endpoint::new("chapters").id(chapter_id))
            .await?;
        decode_entity(value, "chapter")
    }

    pub async fn follow(&self, manga_id: &str) -> Result<(), ApiError> {
        self.gateway
            .post::<Value, _>(Endpoint::new("mangas").id(manga_id).then("follow"), &json!({}))
            .await
            .map(|_| ())
    }

    pub async fn unfollow(&self, manga_id: &str) -> Result<(), ApiError> {
        self.gateway
            .delete(Endpoint::new("mangas").id(manga_id).then("follow"))
            .await
            .map(|_| ())
    }

    pub async fn following(&self) -> Result<Vec<Manga>, ApiError> {
        let value = self.gateway.get_value("users/me/following").await?;
        decode_list(value, "mangas")
    }

    pub async fn report(&self, report: &ReportRequest) -> Result<(), ApiError> {
        self.gateway
            .post::<Value, _>("reports", report)
            .await
            .map(|_| ())
    }
}

/// Uploader dashboard endpoints
#[derive(Clone)]
pub struct UploaderApi {
    gateway: Arc<HttpGateway>,
}

impl UploaderApi {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    pub async fn my_mangas(&self, page: u32) -> Result<PaginatedResponse<Manga>, ApiError> {
        self.gateway
            .get_with_query("uploader/mangas", &PageParams { page, status: None })
            .await
    }

    pub async fn create_manga(&self, input: &MangaInput) -> Result<Manga, ApiError> {
        let value = self.gateway.post::<Value, _>("mangas", input).await?;
        decode_entity(value, "manga")
    }

    pub async fn update_manga(&self, id: &str, input: &MangaInput) -> Result<Manga, ApiError> {
        let value = self
            .gateway
            .put::<Value, _>(Endpoint::new("mangas").id(id), input)
            .await?;
        decode_entity(value, "manga")
    }

    pub async fn delete_manga(&self, id: &str) -> Result<(), ApiError> {
        self.gateway.delete(Endpoint::new("mangas").id(id)).await.map(|_| ())
    }

    pub async fn create_chapter(
        &self,
        manga_id: &str,
        input: &ChapterInput,
    ) -> Result<Chapter, ApiError> {
        let value = self
            .gateway
            .post::<Value, _>(Endpoint::new("mangas").id(manga_id).then("chapters"), input)
            .await?;
        decode_entity(value, "chapter")
    }

    pub async fn update_chapter(&self, id: &str, input: &ChapterInput) -> Result<Chapter, ApiError> {
        let value = self
            .gateway
            .put::<Value, _>(Endpoint::new("chapters").id(id), input)
            .await?;
        decode_entity(value, "chapter")
    }

    pub async fn delete_chapter(&self, id: &str) -> Result<(), ApiError> {
        self.gateway.delete(Endpoint::new("chapters").id(id)).await.map(|_| ())
    }

    pub async fn submit_translation(
        &self,
        submission: &TranslationSubmission,
    ) -> Result<TranslationJob, ApiError> {
        let value = self
            .gateway
            .post::<Value, _>("translations", submission)
            .await?;
        decode_entity(value, "translation")
    }
}

/// Admin dashboard endpoints
#[derive(Clone)]
pub struct AdminApi {
    gateway: Arc<HttpGateway>,
}

impl AdminApi {
    pub fn new(gateway: Arc<HttpGateway>) -> Self {
        Self { gateway }
    }

    pub async fn statistics(&self) -> Result<Stats, ApiError> {
        let value = self.gateway.get_value("admin/statistics").await?;
        decode_entity(value, "stats")
    }

    pub async fn users(&self, page: u32) -> Result<PaginatedResponse<StoredUser>, ApiError> {
        self.gateway
            .get_with_query("admin/users", &PageParams { page, status: None })
            .await
    }

    pub async fn set_user_role(&self, user_id: &str, role: Role) -> Result<StoredUser, ApiError> {
        let value = self
            .gateway
            .patch::<Value, _>(Endpoint::new("admin/users").id(user_id).then("role"), &json!({ "role": role }))
            .await?;
        decode_entity(value, "user")
    }

    pub async fn reports(&self, status: Option<&str>, page: u32) -> Result<Vec<Report>, ApiError> {
        let value: Value = self
            .gateway
            .get_with_query("admin/reports", &PageParams { page, status })
            .await?;
        decode_list(value, "reports")
    }

    pub async fn resolve_report(&self, id: &str, note: Option<&str>) -> Result<(), ApiError> {
        self.gateway
            .patch::<Value, _>(
                Endpoint::new("admin/reports").id(id),
                &json!({ "status": "resolved", "note": note }),
            )
            .await
            .map(|_| ())
    }

    pub async fn translation_queue(&self) -> Result<Vec<TranslationJob>, ApiError> {
        let value = self.gateway.get_value("admin/translations").await?;
        decode_list(value, "translations")
    }

    pub async fn review_translation(&self, id: &str, approve: bool) -> Result<(), ApiError> {
        let status = if approve { "approved" } else { "rejected" };
        self.gateway
            .patch::<Value, _>(
                Endpoint::new("admin/translations").id(id),
                &json!({ "status": status }),
            )
            .await
            .map(|_| ())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_decode_list_shapes() {
        let bare: Vec<Chapter> =
            decode_list(json!([{"id": 1, "number": 1}]), "chapters").unwrap();
        assert_eq!(bare.len(), 1);

        let keyed: Vec<Chapter> = decode_list(
            json!({"chapters": [{"id": 1, "number": "1"}, {"id": 2, "number": "2"}]}),
            "chapters",
        )
        .unwrap();
        assert_eq!(keyed[1].id, "2");

        let data: Vec<Chapter> =
            decode_list(json!({"status": "ok", "data": [{"id": 3, "number": 3}]}), "chapters")
                .unwrap();
        assert_eq!(data[0].number, "3");

        let empty: Vec<Chapter> = decode_list(Value::Null, "chapters").unwrap();
        assert!(empty.is_empty());
    }

    #[test]
    fn test_decode_list_rejects_garbage() {
        let err = decode_list::<Chapter>(json!({"chapters": "nope"}), "chapters").unwrap_err();
        assert_eq!(err.kind, crate::error::ErrorKind::ServerRejected);
    }

    #[test]
    fn test_decode_entity_shapes() {
        let manga: Manga =
            decode_entity(json!({"manga": {"id": 5, "title": "Dandadan"}}), "manga").unwrap();
        assert_eq!(manga.title, "Dandadan");

        let manga: Manga = decode_entity(json!({"id": 6, "title": "Frieren"}), "manga").unwrap();
        assert_eq!(manga.id, "6");
    }
}
