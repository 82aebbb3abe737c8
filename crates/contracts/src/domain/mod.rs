pub mod common;

pub mod a001_organization;
pub mod a002_product_sku;
pub mod a003_sales_forecast;
pub mod a004_purchase_order;
pub mod a005_invoice;
pub mod a006_shipment;
pub mod a007_warehouse;
pub mod a008_notification;
pub mod a009_organization_connection;
pub mod a010_production_file;
