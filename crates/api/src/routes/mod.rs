//! HTTP route handlers.
//!
//! Access control is applied by the auth gate before any handler runs; the
//! column on the right is the rule each path falls under.
//!
//! # Route Structure
//!
//! ```text
//! # Auth
//! POST /api/auth/signup                     - Create account            public
//! POST /api/auth/login                      - Login, set cookies        public
//! POST /api/auth/refresh                    - New access token          public (refresh cookie)
//! POST /api/auth/logout                     - Clear cookies             public
//! GET  /api/auth/check-email                - Email availability        public
//! GET  /api/auth/me                         - Current user              auth
//! PUT  /api/auth/me                         - Update profile            auth
//! PUT  /api/auth/password                   - Change password           auth
//!
//! # Social login
//! GET  /oauth2/authorization/{provider}     - Redirect to provider      public
//! GET  /login/oauth2/code/{provider}        - Provider callback         public
//!
//! # Catalog
//! GET  /api/item                            - Filtered listing          public
//! GET  /api/item/favorite                   - Caller's favorites        auth
//! GET  /api/item/cart                       - Caller's cart             auth
//! GET  /api/item/{id}                       - Item detail               public
//! POST /api/item/favorite/{id}              - Toggle favorite           auth
//! POST /api/item/cart/{id}                  - Toggle cart line          auth
//!
//! # Orders / addresses
//! POST /api/order                           - Checkout                  auth
//! GET  /api/order                           - Order history             auth
//! GET  /api/order/{id}                      - Order detail              auth
//! GET  /api/address                         - Address book              auth
//! POST /api/address                         - Add address               auth
//! PUT  /api/address/{id}                    - Edit address              auth
//! DELETE /api/address/{id}                  - Delete address            auth
//! PUT  /api/address/{id}/default            - Make default              auth
//!
//! # Board
//! GET  /api/board/list                      - Post listing              public
//! POST /api/board/write                     - New post (multipart)      auth
//! GET  /api/board/{no}                      - Post detail               public
//! PUT  /api/board/{no}                      - Edit post (multipart)     auth
//! DELETE /api/board/{no}                    - Delete post               auth
//! GET  /api/board/file/{fileNo}             - Download attachment       public
//! GET  /api/board/image/{fileNo}            - Inline image attachment   public
//! GET  /api/comments/board/{boardNo}        - Comments on a post        public
//! POST /api/comments/board/{boardNo}        - Add comment               auth
//! PUT  /api/comments/{coNo}                 - Edit comment              auth
//! DELETE /api/comments/{coNo}               - Delete comment            auth
//!
//! # Reviews / banners
//! GET  /api/review/{itemId}                 - Item reviews              public
//! POST /api/review/{itemId}                 - Add review                auth
//! PUT  /api/review/{reviewId}               - Edit review               auth
//! DELETE /api/review/{reviewId}             - Delete review             auth
//! GET  /api/banner                          - Active banners            public
//! GET  /api/banner/admin                    - All banners               ADMIN
//! GET  /api/banner/{id}                     - One banner                public
//! POST /api/banner                          - Create (multipart)        ADMIN
//! PUT  /api/banner/{id}                     - Update (multipart)        ADMIN
//! DELETE /api/banner/{id}                   - Delete                    ADMIN
//!
//! # Admin
//! GET  /api/admin/item                      - Listing                   ADMIN
//! POST /api/admin/item                      - Create (multipart)        ADMIN
//! GET  /api/admin/item/{itemId}             - Detail                    ADMIN
//! PUT  /api/admin/item/{itemId}             - Update (multipart)        ADMIN
//! DELETE /api/admin/item/{itemId}           - Delete                    ADMIN
//!
//! # Proxies
//! POST /api/payment/confirm                 - Confirm payment           auth
//! POST /api/payment/cancel                  - Cancel payment            auth
//! POST /api/ai/proxy                        - Chat relay                public
//! ```

pub mod addresses;
pub mod admin;
pub mod ai;
pub mod auth;
pub mod banners;
pub mod board;
pub mod comments;
pub mod form;
pub mod items;
pub mod oauth;
pub mod orders;
pub mod payment;
pub mod reviews;

use axum::{
    Router,
    routing::{get, post, put},
};

use crate::state::AppState;

/// Create the auth routes router.
pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(auth::signup))
        .route("/login", post(auth::login))
        .route("/refresh", post(auth::refresh))
        .route("/logout", post(auth::logout))
        .route("/check-email", get(auth::check_email))
        .route("/me", get(auth::me).put(auth::update_me))
        .route("/password", put(auth::change_password))
}

/// Create the social login routes router. These live outside `/api` so the
/// provider redirect URIs stay stable.
pub fn oauth_routes() -> Router<AppState> {
    Router::new()
        .route("/oauth2/authorization/{provider}", get(oauth::authorize))
        .route("/login/oauth2/code/{provider}", get(oauth::callback))
}

/// Create the catalog routes router.
pub fn item_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(items::list))
        .route("/favorite", get(items::favorites))
        .route("/cart", get(items::cart))
        .route("/{id}", get(items::detail))
        .route("/favorite/{id}", post(items::toggle_favorite))
        .route("/cart/{id}", post(items::toggle_cart))
}

/// Create the order routes router.
pub fn order_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(orders::list).post(orders::place))
        .route("/{id}", get(orders::detail))
}

/// Create the address routes router.
pub fn address_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(addresses::list).post(addresses::create))
        .route("/{id}", put(addresses::update).delete(addresses::delete))
        .route("/{id}/default", put(addresses::set_default))
}

/// Create the board routes router.
pub fn board_routes() -> Router<AppState> {
    Router::new()
        .route("/list", get(board::list))
        .route("/write", post(board::write))
        .route(
            "/{no}",
            get(board::detail).put(board::update).delete(board::delete),
        )
        .route("/file/{file_no}", get(board::download))
        .route("/image/{file_no}", get(board::image))
}

/// Create the comment routes router.
pub fn comment_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/board/{board_no}",
            get(comments::list).post(comments::create),
        )
        .route(
            "/{co_no}",
            put(comments::update).delete(comments::delete),
        )
}

/// Create the review routes router.
///
/// The single path parameter is the item id for reads and creates, and the
/// review id for updates and deletes.
pub fn review_routes() -> Router<AppState> {
    Router::new().route(
        "/{id}",
        get(reviews::list)
            .post(reviews::create)
            .put(reviews::update)
            .delete(reviews::delete),
    )
}

/// Create the banner routes router.
pub fn banner_routes() -> Router<AppState> {
    Router::new()
        .route("/", get(banners::list_active).post(banners::create))
        .route("/admin", get(banners::list_all))
        .route(
            "/{id}",
            get(banners::detail)
                .put(banners::update)
                .delete(banners::delete),
        )
}

/// Create the admin routes router.
pub fn admin_routes() -> Router<AppState> {
    Router::new()
        .route("/item", get(admin::list).post(admin::create))
        .route(
            "/item/{id}",
            get(admin::detail).put(admin::update).delete(admin::delete),
        )
}

/// Create the payment routes router.
pub fn payment_routes() -> Router<AppState> {
    Router::new()
        .route("/confirm", post(payment::confirm))
        .route("/cancel", post(payment::cancel))
}

/// Create the AI relay routes router.
pub fn ai_routes() -> Router<AppState> {
    Router::new().route("/proxy", post(ai::proxy))
}

/// Build the complete router.
pub fn routes() -> Router<AppState> {
    Router::new()
        .nest("/api/auth", auth_routes())
        .nest("/api/item", item_routes())
        .nest("/api/order", order_routes())
        .nest("/api/address", address_routes())
        .nest("/api/board", board_routes())
        .nest("/api/comments", comment_routes())
        .nest("/api/review", review_routes())
        .nest("/api/banner", banner_routes())
        .nest("/api/admin", admin_routes())
        .nest("/api/payment", payment_routes())
        .nest("/api/ai", ai_routes())
        .merge(oauth_routes())
}
