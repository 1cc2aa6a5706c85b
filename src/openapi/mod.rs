use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi};
use utoipa_swagger_ui::SwaggerUi;

#[derive(OpenApi)]
#[openapi(
    info(
        title = "StockTrack API",
        version = "0.2.0",
        description = r#"
# StockTrack Warehouse Inventory API

Tracks products, the warehouses that hold them, and every stock movement in an
append-only purchase/sales ledger. Aggregate stock counts are kept consistent
with the ledger at all times: `warehouse.totalStock` equals the sum of that
warehouse's per-product `stock` values, and each relation's `stock` equals its
purchases minus its sales.

## Authentication

All endpoints except `/auth/*` and the health probes require a JWT issued by
`/auth/login`:

```
Authorization: Bearer <your-jwt-token>
```

Roles gate write access: `owner` can do everything, `manager` can read and
maintain products, `user` can only record purchases and sales.

## Error Handling

Failures return a single-field JSON body with the violated rule:

```json
{
  "error": "Stock not enough to do sales"
}
```
        "#,
        license(
            name = "MIT",
            url = "https://opensource.org/licenses/MIT"
        )
    ),
    servers(
        (url = "http://localhost:3000", description = "Local development")
    ),
    tags(
        (name = "Warehouses", description = "Warehouse management endpoints"),
        (name = "Products", description = "Product and stock allocation endpoints"),
        (name = "Stock movements", description = "Purchase and sales ledger endpoints"),
        (name = "Auth", description = "Registration and login endpoints"),
        (name = "Health", description = "Health check and metrics endpoints")
    ),
    paths(
        // Warehouses
        crate::handlers::warehouses::list_warehouses,
        crate::handlers::warehouses::list_active_warehouses,
        crate::handlers::warehouses::list_deleted_warehouses,
        crate::handlers::warehouses::get_warehouse,
        crate::handlers::warehouses::get_warehouse_products,
        crate::handlers::warehouses::create_warehouse,
        crate::handlers::warehouses::update_warehouse,
        crate::handlers::warehouses::delete_warehouse,

        // Products
        crate::handlers::products::list_products,
        crate::handlers::products::list_active_products,
        crate::handlers::products::list_deleted_products,
        crate::handlers::products::get_product,
        crate::handlers::products::create_product,
        crate::handlers::products::update_product,
        crate::handlers::products::delete_product,

        // Stock movements
        crate::handlers::purchases::record_purchase,
        crate::handlers::sales::record_sale,

        // Auth
        crate::handlers::auth::register,
        crate::handlers::auth::login,

        // Health
        crate::health::health_check,
        crate::health::readiness_check,
        crate::health::metrics,
    ),
    components(
        schemas(
            // Inputs
            crate::services::warehouses::WarehouseInput,
            crate::services::products::AllocationInput,
            crate::services::products::CreateProductInput,
            crate::services::products::UpdateProductInput,
            crate::services::stock::MovementInput,
            crate::services::users::RegisterInput,
            crate::services::users::LoginInput,

            // Responses
            crate::handlers::common::WarehouseResponse,
            crate::handlers::common::ProductResponse,
            crate::handlers::common::StockRelationResponse,
            crate::handlers::common::StockWithWarehouseResponse,
            crate::handlers::common::StockWithProductResponse,
            crate::handlers::common::ProductDetailResponse,
            crate::handlers::common::ProductCreatedResponse,
            crate::handlers::common::WarehouseDetailResponse,
            crate::handlers::common::MovementResponse,
            crate::handlers::warehouses::WarehouseDeletedResponse,
            crate::handlers::products::ProductDeletedResponse,
            crate::handlers::purchases::PurchaseResponse,
            crate::handlers::sales::SaleResponse,
            crate::handlers::auth::RegisterResponse,
            crate::handlers::auth::LoginResponse,

            // Shared vocabulary
            crate::auth::UserRole,
            crate::entities::stock_movement::MovementType,

            // Error types
            crate::errors::ErrorResponse
        )
    ),
    modifiers(&SecurityAddon)
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut utoipa::openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}

pub fn swagger_ui() -> SwaggerUi {
    SwaggerUi::new("/swagger-ui")
        .url("/api-docs/openapi.json", ApiDoc::openapi())
        .config(utoipa_swagger_ui::Config::from("/api-docs/openapi.json").try_it_out_enabled(true))
}
