use axum::http::HeaderValue;
use axum::routing::{delete, get, post, put};
use axum::Router;
use serde_json::{json, Value};
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config;
use crate::database::manager;
use crate::handlers;
use crate::middleware::jwt_auth_middleware;

pub fn app() -> Router {
    Router::new()
        // Public
        .route("/", get(root))
        .route("/health", get(health))
        .route("/auth/login", post(handlers::auth::login))
        // Protected API behind the JWT middleware; per-operation permission
        // checks run inside the handlers
        .merge(protected_routes())
        // Global middleware
        .layer(cors_layer())
        .layer(TraceLayer::new_for_http())
}

fn protected_routes() -> Router {
    Router::new()
        .merge(user_routes())
        .merge(role_routes())
        .merge(function_routes())
        .merge(category_routes())
        .merge(knowledge_base_routes())
        .route("/api/activity-logs/filter", get(handlers::activity_logs::get_activity_logs_paging))
        .layer(axum::middleware::from_fn(jwt_auth_middleware))
}

fn user_routes() -> Router {
    use handlers::users;

    Router::new()
        .route("/api/users", get(users::get_users).post(users::post_user))
        .route("/api/users/filter", get(users::get_users_paging))
        .route(
            "/api/users/:id",
            get(users::get_by_id).put(users::put_user).delete(users::delete_user),
        )
        .route("/api/users/:id/change-password", put(users::put_user_password))
        .route("/api/users/:id/menu", get(users::get_menu_by_user_permission))
        .route(
            "/api/users/:id/roles",
            get(users::get_user_roles)
                .post(users::post_user_roles)
                .delete(users::delete_user_roles),
        )
}

fn role_routes() -> Router {
    use handlers::roles;

    Router::new()
        .route("/api/roles", get(roles::get_roles).post(roles::post_role))
        .route("/api/roles/filter", get(roles::get_roles_paging))
        .route(
            "/api/roles/:id",
            get(roles::get_by_id).put(roles::put_role).delete(roles::delete_role),
        )
        .route(
            "/api/roles/:id/permissions",
            get(roles::get_permissions_by_role).put(roles::put_permissions_by_role),
        )
}

fn function_routes() -> Router {
    use handlers::functions;

    Router::new()
        .route("/api/functions", get(functions::get_functions).post(functions::post_function))
        .route("/api/functions/filter", get(functions::get_functions_paging))
        .route(
            "/api/functions/:id",
            get(functions::get_by_id)
                .put(functions::put_function)
                .delete(functions::delete_function),
        )
        .route(
            "/api/functions/:id/commands",
            get(functions::get_commands_in_function).post(functions::post_command_to_function),
        )
        .route(
            "/api/functions/:id/commands/:commandId",
            delete(functions::delete_command_in_function),
        )
        .route("/api/commands", get(functions::get_commands))
}

fn category_routes() -> Router {
    use handlers::categories;

    Router::new()
        .route("/api/categories", get(categories::get_categories).post(categories::post_category))
        .route("/api/categories/filter", get(categories::get_categories_paging))
        .route(
            "/api/categories/:id",
            get(categories::get_by_id)
                .put(categories::put_category)
                .delete(categories::delete_category),
        )
}

fn knowledge_base_routes() -> Router {
    use handlers::{attachments, comments, knowledge_bases, reports, votes};

    Router::new()
        .route(
            "/api/knowledge-bases",
            get(knowledge_bases::get_knowledge_bases).post(knowledge_bases::post_knowledge_base),
        )
        .route("/api/knowledge-bases/filter", get(knowledge_bases::get_knowledge_bases_paging))
        .route("/api/knowledge-bases/latest/:take", get(knowledge_bases::get_latest_knowledge_bases))
        .route("/api/knowledge-bases/popular/:take", get(knowledge_bases::get_popular_knowledge_bases))
        .route(
            "/api/knowledge-bases/:id",
            get(knowledge_bases::get_by_id)
                .put(knowledge_bases::put_knowledge_base)
                .delete(knowledge_bases::delete_knowledge_base),
        )
        .route("/api/knowledge-bases/:id/comments", post(comments::post_comment))
        .route("/api/knowledge-bases/:id/comments/filter", get(comments::get_comments_paging))
        .route(
            "/api/knowledge-bases/:id/comments/:commentId",
            get(comments::get_comment_by_id)
                .put(comments::put_comment)
                .delete(comments::delete_comment),
        )
        .route("/api/knowledge-bases/:id/votes", post(votes::post_vote))
        .route("/api/knowledge-bases/:id/votes/:userId", delete(votes::delete_vote))
        .route("/api/knowledge-bases/:id/reports", post(reports::post_report))
        .route("/api/knowledge-bases/:id/reports/filter", get(reports::get_reports_paging))
        .route("/api/knowledge-bases/:id/reports/:reportId", delete(reports::delete_report))
        .route(
            "/api/knowledge-bases/:id/attachments",
            get(attachments::get_attachments).post(attachments::post_attachment),
        )
        .route(
            "/api/knowledge-bases/:id/attachments/:attachmentId",
            delete(attachments::delete_attachment),
        )
}

fn cors_layer() -> CorsLayer {
    let origins: Vec<HeaderValue> = config::config()
        .security
        .cors_origins
        .iter()
        .filter_map(|o| o.parse().ok())
        .collect();

    if origins.is_empty() {
        CorsLayer::permissive()
    } else {
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    }
}

async fn root() -> axum::response::Json<Value> {
    let version = env!("CARGO_PKG_VERSION");

    axum::response::Json(json!({
        "name": "KS API",
        "version": version,
        "description": "Knowledge-base backend with role/permission based access control",
        "endpoints": {
            "home": "/ (public)",
            "login": "/auth/login (public - token acquisition)",
            "users": "/api/users (protected)",
            "roles": "/api/roles (protected)",
            "functions": "/api/functions (protected)",
            "commands": "/api/commands (protected)",
            "categories": "/api/categories (protected)",
            "knowledge_bases": "/api/knowledge-bases (protected)",
            "activity_logs": "/api/activity-logs/filter (protected)",
        }
    }))
}

async fn health() -> impl axum::response::IntoResponse {
    let now = chrono::Utc::now();

    match manager::health_check().await {
        Ok(_) => (
            axum::http::StatusCode::OK,
            axum::response::Json(json!({
                "status": "ok",
                "timestamp": now,
                "database": "ok"
            })),
        ),
        Err(e) => (
            axum::http::StatusCode::SERVICE_UNAVAILABLE,
            axum::response::Json(json!({
                "status": "degraded",
                "timestamp": now,
                "database_error": e.to_string()
            })),
        ),
    }
}
