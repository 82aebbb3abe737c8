use axum::{
    middleware,
    routing::{delete, get, post, put},
    Router,
};

use crate::handlers;
use crate::shared::config;
use crate::system::auth::middleware::{require_admin, require_api_key, require_auth};

/// Portal routes. System routes (auth, users, keys) live in `system::api::routes`.
pub fn configure_routes() -> Router {
    Router::new()
        .merge(organization_routes())
        .merge(cpfr_routes())
        .merge(inventory_routes())
        .merge(notification_routes())
        .merge(integration_routes())
        .merge(partner_routes())
}

fn organization_routes() -> Router {
    Router::new()
        .route(
            "/api/organization",
            get(handlers::a001_organization::list_all).post(handlers::a001_organization::upsert),
        )
        .route(
            "/api/organization/:id",
            get(handlers::a001_organization::get_by_id)
                .delete(handlers::a001_organization::delete),
        )
        .route(
            "/api/organization-connections",
            get(handlers::a009_organization_connection::list)
                .post(handlers::a009_organization_connection::upsert),
        )
        .route(
            "/api/organization-connections/:id",
            get(handlers::a009_organization_connection::get_by_id)
                .delete(handlers::a009_organization_connection::delete),
        )
        .layer(middleware::from_fn(require_auth))
}

fn cpfr_routes() -> Router {
    Router::new()
        .route(
            "/api/cpfr/forecasts",
            get(handlers::a003_sales_forecast::list_all)
                .post(handlers::a003_sales_forecast::create),
        )
        .route(
            "/api/cpfr/forecasts/:id",
            get(handlers::a003_sales_forecast::get_by_id)
                .put(handlers::a003_sales_forecast::update)
                .delete(handlers::a003_sales_forecast::delete),
        )
        .route(
            "/api/cpfr/forecasts/:id/status",
            put(handlers::a003_sales_forecast::update_status),
        )
        .route(
            "/api/cpfr/purchase-orders",
            get(handlers::a004_purchase_order::list).post(handlers::a004_purchase_order::create),
        )
        .route(
            "/api/cpfr/purchase-orders/:id",
            get(handlers::a004_purchase_order::get_by_id)
                .put(handlers::a004_purchase_order::update)
                .delete(handlers::a004_purchase_order::delete),
        )
        .route(
            "/api/cpfr/invoices",
            get(handlers::a005_invoice::list).post(handlers::a005_invoice::create),
        )
        .route(
            "/api/cpfr/invoices/:id",
            get(handlers::a005_invoice::get_by_id)
                .put(handlers::a005_invoice::update)
                .delete(handlers::a005_invoice::delete),
        )
        .route(
            "/api/cpfr/shipments",
            get(handlers::a006_shipment::list).post(handlers::a006_shipment::create),
        )
        .route(
            "/api/cpfr/shipments/:id",
            get(handlers::a006_shipment::get_by_id)
                .put(handlers::a006_shipment::update)
                .delete(handlers::a006_shipment::delete),
        )
        .route(
            "/api/cpfr/shipments/:id/status",
            put(handlers::a006_shipment::update_status),
        )
        // Attachments of purchase orders and invoices
        .route(
            "/api/cpfr/documents/:owner/:id",
            get(handlers::documents::list)
                .post(handlers::documents::upload)
                .layer(upload_limit()),
        )
        .route(
            "/api/documents/:id/download",
            get(handlers::documents::download),
        )
        .route("/api/documents/:id", delete(handlers::documents::delete))
        .route(
            "/api/documents/extract",
            post(handlers::documents::extract).layer(upload_limit()),
        )
        .layer(middleware::from_fn(require_auth))
}

fn upload_limit() -> axum::extract::DefaultBodyLimit {
    handlers::documents::body_limit(config::get().storage.max_upload_mb)
}

fn inventory_routes() -> Router {
    Router::new()
        .route(
            "/api/product-sku",
            get(handlers::a002_product_sku::list_all).post(handlers::a002_product_sku::upsert),
        )
        .route(
            "/api/product-sku/:id",
            get(handlers::a002_product_sku::get_by_id).delete(handlers::a002_product_sku::delete),
        )
        .route(
            "/api/inventory/warehouses",
            get(handlers::a007_warehouse::list_all).post(handlers::a007_warehouse::upsert),
        )
        .route(
            "/api/inventory/warehouses/:id",
            get(handlers::a007_warehouse::get_by_id).delete(handlers::a007_warehouse::delete),
        )
        .route(
            "/api/inventory/production-files",
            get(handlers::a010_production_file::list)
                .post(handlers::a010_production_file::upload)
                .layer(upload_limit()),
        )
        .route(
            "/api/inventory/production-files/:id/download",
            get(handlers::a010_production_file::download),
        )
        .route(
            "/api/holidays/chinese/periods",
            get(handlers::holidays::chinese_periods),
        )
        .layer(middleware::from_fn(require_auth))
}

fn notification_routes() -> Router {
    let user_routes = Router::new()
        .route("/api/notifications", get(handlers::a008_notification::list))
        .route(
            "/api/notifications/unread-count",
            get(handlers::a008_notification::unread_count),
        )
        .route(
            "/api/notifications/read-all",
            post(handlers::a008_notification::mark_all_read),
        )
        .route(
            "/api/notifications/:id/read",
            post(handlers::a008_notification::mark_read),
        )
        .route(
            "/api/notifications/:id",
            delete(handlers::a008_notification::delete),
        )
        .layer(middleware::from_fn(require_auth));

    let admin_routes = Router::new()
        .route(
            "/api/admin/notifications",
            post(handlers::a008_notification::create),
        )
        .route(
            "/api/admin/notifications/bulk",
            post(handlers::a008_notification::create_bulk),
        )
        .layer(middleware::from_fn(require_admin));

    user_routes.merge(admin_routes)
}

fn integration_routes() -> Router {
    let translation = Router::new()
        .route("/api/translate", post(handlers::translation::translate))
        .route(
            "/api/translate/batch",
            post(handlers::translation::translate_batch),
        )
        .layer(middleware::from_fn(require_auth));

    let amazon = Router::new()
        .route("/api/amazon/config", get(handlers::amazon::config_status))
        .route("/api/amazon/reports", post(handlers::amazon::get_report))
        .route("/api/amazon/inventory", get(handlers::amazon::inventory))
        .route(
            "/api/amazon/inbound-shipments",
            get(handlers::amazon::inbound_shipments),
        )
        .route(
            "/api/amazon/inbound-shipments/items",
            get(handlers::amazon::inbound_shipment_items),
        )
        .route(
            "/api/amazon/financial-summary",
            get(handlers::amazon::financial_summary),
        )
        .route(
            "/api/u501/sync/start",
            post(handlers::usecases::u501_start_sync),
        )
        .route(
            "/api/u501/sync/:session_id/progress",
            get(handlers::usecases::u501_get_progress),
        )
        .layer(middleware::from_fn(require_admin));

    translation.merge(amazon)
}

fn partner_routes() -> Router {
    Router::new()
        .route(
            "/api/v1/partner/forecasts",
            get(handlers::partner::forecasts),
        )
        .route(
            "/api/v1/production-files",
            get(handlers::partner::production_files)
                .post(handlers::partner::upload_production_file)
                .layer(upload_limit()),
        )
        .route(
            "/api/v1/production-files/:id/download",
            get(handlers::partner::download_production_file),
        )
        .layer(middleware::from_fn(require_api_key))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request, http::StatusCode};
    use tower::ServiceExt;

    #[tokio::test]
    async fn production_file_routes_require_credentials() {
        for uri in [
            "/api/v1/production-files",
            "/api/v1/production-files/00000000-0000-0000-0000-000000000000/download",
            "/api/inventory/production-files",
        ] {
            let response = configure_routes()
                .oneshot(Request::get(uri).body(Body::empty()).unwrap())
                .await
                .unwrap();
            assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{}", uri);
        }
    }
}
