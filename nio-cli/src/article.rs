//! Demo resources served by `nio serve`.

use async_trait::async_trait;
use axum::extract::{FromRequestParts, Path, Request};
use axum::http::request::Parts;
use axum::http::Method;
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use nio_client::{Ns, Rel};
use nio_gateway::{wrap, Extract, Extracted, Gateway, HandlerError, Requirement, Resource, User};
use serde_json::json;

const ARTICLE: &str = "article";

/// A single article, identified by its id.
#[derive(Debug, Clone)]
pub struct ArticleResource {
    pub id: String,
}

impl ArticleResource {
    pub fn link(&self) -> String {
        format!("/articles/{}", self.id)
    }
}

impl Resource for ArticleResource {
    fn requires(&self, method: &Method) -> Requirement {
        let rel = match *method {
            // axum answers HEAD with the GET handler
            Method::GET | Method::HEAD => Rel::new("article.get"),
            Method::POST => Rel::new("article.update"),
            _ => Rel::impossible(),
        };
        Requirement::new(ARTICLE, self.id.as_str(), rel)
    }
}

#[async_trait]
impl Extract for ArticleResource {
    async fn extract(parts: &mut Parts) -> anyhow::Result<Extracted<Self>> {
        let Path(id) = Path::<String>::from_request_parts(parts, &()).await?;
        Ok(Extracted::Resource(Self { id }))
    }
}

/// Site index, readable without a session.
#[derive(Debug, Clone, Copy)]
pub struct IndexResource;

impl Resource for IndexResource {
    fn requires(&self, _method: &Method) -> Requirement {
        Requirement::new("site", "root", "site.view")
    }

    fn is_public(&self) -> bool {
        true
    }
}

#[async_trait]
impl Extract for IndexResource {
    async fn extract(_parts: &mut Parts) -> anyhow::Result<Extracted<Self>> {
        Ok(Extracted::Resource(Self))
    }
}

async fn index(_request: Request, _resource: IndexResource, user: User) -> Result<Response, HandlerError> {
    if user.principal().is_anonymous() {
        return Ok(Json(json!({ "principal": user.principal(), "articles": [] })).into_response());
    }
    let articles = user.list(&Ns::new(ARTICLE), &Rel::new("article.get")).await?;
    Ok(Json(json!({ "principal": user.principal(), "articles": articles })).into_response())
}

async fn get_article(
    _request: Request,
    article: ArticleResource,
    user: User,
) -> Result<Response, HandlerError> {
    let can_update = user.has_rel("article.update").await?;
    Ok(Json(json!({
        "id": article.id,
        "link": article.link(),
        "principal": user.principal(),
        "can_update": can_update,
    }))
    .into_response())
}

async fn update_article(
    _request: Request,
    article: ArticleResource,
    user: User,
) -> Result<Response, HandlerError> {
    Ok(format!("Article id={} updated by {}", article.id, user.principal()).into_response())
}

pub fn router(gateway: Gateway) -> Router {
    Router::new()
        .route("/", get(wrap::<IndexResource, _, _>(gateway.clone(), index)))
        .route(
            "/articles/:id",
            get(wrap::<ArticleResource, _, _>(gateway.clone(), get_article))
                .post(wrap::<ArticleResource, _, _>(gateway, update_article)),
        )
}
