use actix_web::{web, HttpRequest, HttpResponse};
use pharmacy_shared::SuggestionsResponse;
use serde::Deserialize;
use tracing::debug;

use crate::error::AppError;
use crate::handlers::page;
use crate::services::catalog_service::SearchParams;
use crate::services::{CatalogService, SessionService};

#[derive(Debug, Deserialize)]
pub struct SuggestionQuery {
    #[serde(default)]
    pub q: String,
}

pub async fn home(
    req: HttpRequest,
    catalog_service: web::Data<CatalogService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let mut session = session_service.load(&req).await?;
    let home = catalog_service.home().await?;
    page(&session_service, &mut session, home).await
}

/// Plain listing: free-text and category only
pub async fn medicine_list(
    req: HttpRequest,
    query: web::Query<SearchParams>,
    catalog_service: web::Data<CatalogService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let params = SearchParams {
        q: query.q.clone(),
        category: query.category.clone(),
        page: query.page,
        ..SearchParams::default()
    };

    let mut session = session_service.load(&req).await?;
    let listing = catalog_service.search(&params).await?;
    page(&session_service, &mut session, listing).await
}

pub async fn search(
    req: HttpRequest,
    query: web::Query<SearchParams>,
    catalog_service: web::Data<CatalogService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    debug!("Advanced search: {:?}", query);

    let mut session = session_service.load(&req).await?;
    let results = catalog_service.search(&query).await?;
    page(&session_service, &mut session, results).await
}

pub async fn search_suggestions(
    query: web::Query<SuggestionQuery>,
    catalog_service: web::Data<CatalogService>,
) -> Result<HttpResponse, AppError> {
    let suggestions = catalog_service.suggestions(&query.q).await?;
    Ok(HttpResponse::Ok().json(SuggestionsResponse { suggestions }))
}

pub async fn medicine_detail(
    req: HttpRequest,
    path: web::Path<i64>,
    catalog_service: web::Data<CatalogService>,
    session_service: web::Data<SessionService>,
) -> Result<HttpResponse, AppError> {
    let medicine_id = path.into_inner();
    let mut session = session_service.load(&req).await?;
    let detail = catalog_service.detail(medicine_id).await?;
    page(&session_service, &mut session, detail).await
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::{http::StatusCode, test, App};
    use sqlx::postgres::PgPoolOptions;

    fn catalog() -> CatalogService {
        let pool = PgPoolOptions::new()
            .connect_lazy("postgres://localhost/pharmacy_unused")
            .expect("lazy pool");
        CatalogService::new(pool)
    }

    #[actix_web::test]
    async fn short_queries_get_no_suggestions() {
        let app = test::init_service(
            App::new()
                .app_data(web::Data::new(catalog()))
                .route("/api/search-suggestions/", web::get().to(search_suggestions)),
        )
        .await;

        for uri in ["/api/search-suggestions/?q=p", "/api/search-suggestions/"] {
            let req = test::TestRequest::get().uri(uri).to_request();
            let resp = test::call_service(&app, req).await;
            assert_eq!(resp.status(), StatusCode::OK);

            let body: SuggestionsResponse = test::read_body_json(resp).await;
            assert!(body.suggestions.is_empty());
        }
    }
}
