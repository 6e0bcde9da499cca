//! app.rs
use crate::handlers::{group_handler, message_handler, sms_handler, version_handler};
use actix_web::web;

pub fn init_app(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api")
            .service(
                web::scope("/sms")
                    .route("/send", web::post().to(sms_handler::send_sms_endpoint))
                    .route("/bulk", web::post().to(sms_handler::bulk_sms_endpoint))
                    .route(
                        "/template",
                        web::get().to(sms_handler::download_template_endpoint),
                    ),
            )
            .service(
                web::scope("/azure-ad")
                    .route("/groups", web::get().to(group_handler::list_groups_endpoint))
                    .route(
                        "/groups/{group_id}/members",
                        web::get().to(group_handler::group_members_endpoint),
                    )
                    .route(
                        "/send-sms",
                        web::post().to(group_handler::group_send_sms_endpoint),
                    ),
            )
            .service(
                web::scope("/messages")
                    .route("", web::get().to(message_handler::list_messages_endpoint))
                    .route(
                        "/stats",
                        web::get().to(message_handler::message_stats_endpoint),
                    )
                    .route(
                        "/delete",
                        web::delete().to(message_handler::delete_message_endpoint),
                    )
                    .route(
                        "/delete-all",
                        web::delete().to(message_handler::delete_all_messages_endpoint),
                    )
                    .route(
                        "/purge",
                        web::post().to(message_handler::purge_messages_endpoint),
                    ),
            )
            .service(
                web::scope("/version")
                    .route("", web::get().to(version_handler::version_endpoint)),
            ),
    );
}
