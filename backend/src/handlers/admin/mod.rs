//! Staff-only JSON API mounted under `/admin`

pub mod catalog;
pub mod contact;
pub mod dashboard;
pub mod feedback;
pub mod media;
pub mod orders;
pub mod settings;

use actix_web::web;

pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.route("/dashboard", web::get().to(dashboard::overview))
        // Categories
        .route("/categories", web::get().to(catalog::list_categories))
        .route("/categories", web::post().to(catalog::create_category))
        .route("/categories/{id}", web::put().to(catalog::update_category))
        .route("/categories/{id}", web::delete().to(catalog::delete_category))
        // Medicines and their gallery
        .route("/medicines", web::get().to(catalog::list_medicines))
        .route("/medicines", web::post().to(catalog::create_medicine))
        .route("/medicines/{id}", web::put().to(catalog::update_medicine))
        .route("/medicines/{id}", web::delete().to(catalog::delete_medicine))
        .route("/medicines/{id}/stock", web::put().to(catalog::update_stock))
        .route("/medicines/{id}/images", web::get().to(catalog::list_images))
        .route("/medicines/{id}/images", web::post().to(catalog::add_image))
        .route("/medicines/{id}/images/{image_id}/primary", web::post().to(catalog::set_primary_image))
        .route("/medicines/{id}/images/{image_id}", web::delete().to(catalog::delete_image))
        // Orders
        .route("/orders", web::get().to(orders::list_orders))
        .route("/orders", web::post().to(orders::create_order))
        .route("/orders/bulk-status", web::post().to(orders::bulk_update_status))
        .route("/orders/{id}", web::get().to(orders::get_order))
        .route("/orders/{id}", web::put().to(orders::update_order))
        .route("/orders/{id}", web::delete().to(orders::delete_order))
        .route("/orders/{id}/status", web::put().to(orders::update_status))
        // Feedback moderation
        .route("/feedbacks", web::get().to(feedback::list_feedbacks))
        .route("/feedbacks/{id}/action", web::post().to(feedback::feedback_action))
        // Media
        .route("/media", web::get().to(media::list_videos))
        .route("/media", web::post().to(media::create_video))
        .route("/media/{id}", web::get().to(media::get_video))
        .route("/media/{id}", web::put().to(media::update_video))
        .route("/media/{id}", web::delete().to(media::delete_video))
        // Site settings
        .route("/settings", web::get().to(settings::get_settings))
        .route("/settings", web::put().to(settings::update_settings))
        // Contact messages
        .route("/contact-messages", web::get().to(contact::list_messages))
        .route("/contact-messages/{id}/read", web::put().to(contact::mark_read));
}
