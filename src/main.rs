mod context;
mod core;
mod error;
mod handlers;
mod impls;
mod middlewares;
mod request;
mod response;
mod storer;

use actix_web::web::{delete, get, post, put, resource, scope, Data};
use actix_web::HttpServer;
use middlewares::jwt::Jwt;
use sqlx::postgres::PgPoolOptions;
use storer::LocalStorer;

#[actix_web::main]
async fn main() -> Result<(), std::io::Error> {
    dotenv::dotenv().ok();
    std::env::set_var("RUST_LOG", "actix_web=info,scholarship_backend=info");
    env_logger::init();
    let upload_path = dotenv::var("UPLOAD_PATH").expect("environment variable UPLOAD_PATH not been set");
    let jwt_secret = dotenv::var("JWT_SECRET").expect("environment variable JWT_SECRET not been set");
    let database_url = dotenv::var("DATABASE_URL").expect("environment variable DATABASE_URL not been set");
    let pool = PgPoolOptions::new()
        .max_connections(5)
        .connect(&database_url)
        .await
        .expect("failed to connect to database");
    HttpServer::new(move || {
        actix_web::App::new()
            .wrap(actix_web::middleware::Logger::default())
            .app_data(Data::new(pool.clone()))
            .app_data(Data::new(LocalStorer::new(&upload_path)))
            .service(
                scope("")
                    .service(resource("login/student").route(post().to(handlers::student_login)))
                    .service(resource("login/institute").route(post().to(handlers::institute_login)))
                    .service(resource("login/state").route(post().to(handlers::state_login)))
                    .service(resource("login/ministry").route(post().to(handlers::ministry_login)))
                    .service(resource("signup/student").route(post().to(handlers::student_register)))
                    .service(resource("institutes/register").route(post().to(handlers::institute::register)))
                    .service(resource("institutes/security_question").route(get().to(handlers::institute::security_question)))
                    .service(resource("institutes/reset_password").route(post().to(handlers::institute::reset_password)))
                    .service(resource("announcements").route(get().to(handlers::announcement::public_list)))
                    .service(resource("contact").route(post().to(handlers::contact::create)))
                    .service(
                        scope("")
                            .wrap(Jwt::new(jwt_secret.clone().into_bytes()))
                            .service(resource("logout").route(post().to(handlers::logout)))
                            .service(
                                scope("uploads")
                                    .route("", post().to(handlers::upload::create::<LocalStorer>))
                                    .route("", get().to(handlers::upload::fetch::<LocalStorer>)),
                            )
                            .service(
                                scope("student")
                                    .route("applications", post().to(handlers::student::submit))
                                    .route("applications", get().to(handlers::student::my_applications))
                                    .route("applications/{id}", get().to(handlers::student::detail)),
                            )
                            .service(
                                scope("institute")
                                    .route("application", get().to(handlers::institute::my_application))
                                    .route("application", put().to(handlers::institute::update_profile))
                                    .route("students", get().to(handlers::institute::students))
                                    .route("students/{id}", get().to(handlers::institute::student_detail))
                                    .route("students/{id}/verify", post().to(handlers::institute::verify_student))
                                    .route("students/{id}/reject", post().to(handlers::institute::reject_student)),
                            )
                            .service(
                                scope("state")
                                    .route("dashboard", get().to(handlers::state::dashboard))
                                    .route("students", get().to(handlers::state::students))
                                    .route("students/{id}", get().to(handlers::state::student_detail))
                                    .route("students/{id}/approve", post().to(handlers::state::approve_student))
                                    .route("students/{id}/reject", post().to(handlers::state::reject_student))
                                    .route("students/{id}/forward", post().to(handlers::state::forward_student))
                                    .route("students/{id}/approve_and_forward", post().to(handlers::state::approve_and_forward_student))
                                    .route("institutes", get().to(handlers::state::institutes))
                                    .route("institutes/{id}", get().to(handlers::state::institute_detail))
                                    .route("institutes/{id}/verify", post().to(handlers::state::verify_institute))
                                    .route("institutes/{id}/forward", post().to(handlers::state::forward_institute))
                                    .route("institutes/{id}/reject", post().to(handlers::state::reject_institute)),
                            )
                            .service(
                                scope("ministry")
                                    .route("dashboard", get().to(handlers::ministry::dashboard))
                                    .route("students", get().to(handlers::ministry::students))
                                    .route("students/{id}", get().to(handlers::ministry::student_detail))
                                    .route("students/{id}/approve", post().to(handlers::ministry::approve_student))
                                    .route("students/{id}/reject", post().to(handlers::ministry::reject_student))
                                    .route("institutes", get().to(handlers::ministry::institutes))
                                    .route("institutes/{id}", get().to(handlers::ministry::institute_detail))
                                    .route("institutes/{id}/approve", post().to(handlers::ministry::approve_institute))
                                    .route("institutes/{id}/reject", post().to(handlers::ministry::reject_institute))
                                    .route("contact_messages", get().to(handlers::contact::list))
                                    .route("contact_messages/{id}/read", post().to(handlers::contact::mark_read)),
                            )
                            .service(
                                scope("admin/announcements")
                                    .route("", get().to(handlers::announcement::admin_list))
                                    .route("", post().to(handlers::announcement::create))
                                    .route("{id}", put().to(handlers::announcement::update))
                                    .route("{id}", delete().to(handlers::announcement::delete)),
                            ),
                    ),
            )
    })
    .bind(("0.0.0.0", 8000))?
    .run()
    .await
}
